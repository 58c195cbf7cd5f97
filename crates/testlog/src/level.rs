//! crates/testlog/src/level.rs
//! Severity levels and the non-hierarchical level sets used for filtering.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseLevelError;

/// Severity of a recorded event, ordered from least to most severe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Level {
    /// Finest-grained tracing output.
    Trace,
    /// Debugging output.
    Debug,
    /// Informational output.
    Info,
    /// Something unexpected that did not stop the operation.
    Warn,
    /// A failure.
    Error,
}

impl Level {
    /// Every level in ascending order of severity.
    pub const ALL: [Self; 5] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
    ];

    /// Returns the upper-case name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring ASCII case and surrounding whitespace.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLevelError::new(text))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Self::Error
        } else if level == tracing::Level::WARN {
            Self::Warn
        } else if level == tracing::Level::INFO {
            Self::Info
        } else if level == tracing::Level::DEBUG {
            Self::Debug
        } else {
            Self::Trace
        }
    }
}

/// A set of enabled levels.
///
/// Membership is explicit: a set containing [`Level::Info`] says nothing about
/// [`Level::Warn`] or [`Level::Error`]. Callers enumerate every level they want
/// active, and the empty set disables everything.
///
/// # Examples
///
/// ```
/// use testlog::{Level, LevelSet};
///
/// let levels = LevelSet::of(&[Level::Warn, Level::Error]);
/// assert!(levels.contains(Level::Error));
/// assert!(!levels.contains(Level::Info));
/// assert_eq!(levels.iter().collect::<Vec<_>>(), [Level::Warn, Level::Error]);
/// ```
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct LevelSet(u8);

impl LevelSet {
    /// The set containing no levels.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The set containing every level.
    #[must_use]
    pub const fn all() -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < Level::ALL.len() {
            bits |= Level::ALL[index].bit();
            index += 1;
        }
        Self(bits)
    }

    /// Builds a set from a slice of levels.
    #[must_use]
    pub fn of(levels: &[Level]) -> Self {
        levels.iter().copied().collect()
    }

    /// Returns `true` when `level` is a member of the set.
    #[must_use]
    pub const fn contains(self, level: Level) -> bool {
        self.0 & level.bit() != 0
    }

    /// Adds `level` to the set.
    pub fn insert(&mut self, level: Level) {
        self.0 |= level.bit();
    }

    /// Removes `level` from the set.
    pub fn remove(&mut self, level: Level) {
        self.0 &= !level.bit();
    }

    /// Number of levels in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` when no level is enabled.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the members in ascending severity.
    pub const fn iter(self) -> LevelSetIter {
        LevelSetIter {
            set: self,
            next: 0,
        }
    }
}

impl fmt::Debug for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Level> for LevelSet {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        let mut set = Self::empty();
        set.extend(iter);
        set
    }
}

impl Extend<Level> for LevelSet {
    fn extend<I: IntoIterator<Item = Level>>(&mut self, iter: I) {
        for level in iter {
            self.insert(level);
        }
    }
}

impl<const N: usize> From<[Level; N]> for LevelSet {
    fn from(levels: [Level; N]) -> Self {
        levels.into_iter().collect()
    }
}

impl IntoIterator for LevelSet {
    type Item = Level;
    type IntoIter = LevelSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the members of a [`LevelSet`], created by [`LevelSet::iter`].
#[derive(Clone, Debug)]
pub struct LevelSetIter {
    set: LevelSet,
    next: usize,
}

impl Iterator for LevelSetIter {
    type Item = Level;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(level) = Level::ALL.get(self.next).copied() {
            self.next += 1;
            if self.set.contains(level) {
                return Some(level);
            }
        }
        None
    }
}

impl std::iter::FusedIterator for LevelSetIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_by_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!("INFO".parse::<Level>(), Ok(Level::Info));
        assert_eq!("warn".parse::<Level>(), Ok(Level::Warn));
        assert_eq!(" Error ".parse::<Level>(), Ok(Level::Error));
    }

    #[test]
    fn unknown_level_name_is_rejected() {
        let err = "LOUD".parse::<Level>().unwrap_err();
        assert_eq!(err.invalid_name(), "LOUD");
        assert!(err.to_string().contains("LOUD"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>(), Ok(level));
        }
    }

    #[test]
    fn tracing_levels_map_one_to_one() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Trace);
        assert_eq!(Level::from(tracing::Level::DEBUG), Level::Debug);
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn all_contains_every_level() {
        let all = LevelSet::all();
        assert_eq!(all.len(), 5);
        assert!(Level::ALL.iter().all(|level| all.contains(*level)));
    }

    #[test]
    fn empty_contains_nothing() {
        let empty = LevelSet::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.iter().count(), 0);
        assert_eq!(LevelSet::default(), empty);
    }

    #[test]
    fn membership_is_not_hierarchical() {
        let only_info = LevelSet::from([Level::Info]);
        assert!(only_info.contains(Level::Info));
        assert!(!only_info.contains(Level::Warn));
        assert!(!only_info.contains(Level::Error));
        assert!(!only_info.contains(Level::Debug));
    }

    #[test]
    fn insert_and_remove_update_membership() {
        let mut set = LevelSet::empty();
        set.insert(Level::Debug);
        set.insert(Level::Debug);
        assert_eq!(set.len(), 1);
        set.remove(Level::Debug);
        assert!(set.is_empty());
    }

    #[test]
    fn into_iter_yields_ascending_members() {
        let set = LevelSet::of(&[Level::Error, Level::Trace, Level::Info]);
        let collected: Vec<Level> = set.into_iter().collect();
        assert_eq!(collected, [Level::Trace, Level::Info, Level::Error]);
    }

    #[test]
    fn debug_lists_members() {
        let set = LevelSet::of(&[Level::Warn]);
        assert_eq!(format!("{set:?}"), "{Warn}");
    }
}
