//! crates/testlog/src/marker.rs
//! Markers and captured errors attached to log calls.

use std::error::Error;
use std::fmt;

/// Named tag attached to a log call for categorisation.
///
/// Markers may reference other markers, forming a small tree. They are opaque
/// to the recorder beyond storage and equality.
///
/// # Examples
///
/// ```
/// use testlog::Marker;
///
/// let audit = Marker::new("AUDIT").with_reference(Marker::new("SECURITY"));
/// assert!(audit.contains("SECURITY"));
/// assert!(!audit.contains("BILLING"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    name: String,
    references: Vec<Marker>,
}

impl Marker {
    /// Creates a marker without references.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            references: Vec::new(),
        }
    }

    /// Adds a child reference.
    #[must_use]
    pub fn with_reference(mut self, reference: Self) -> Self {
        self.references.push(reference);
        self
    }

    /// Returns the marker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directly referenced markers.
    #[must_use]
    pub fn references(&self) -> &[Self] {
        &self.references
    }

    /// Returns `true` if this marker or any marker it references, transitively,
    /// is named `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.name == name || self.references.iter().any(|child| child.contains(name))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((first, rest)) = self.references.split_first() {
            write!(f, " [ {first}")?;
            for reference in rest {
                write!(f, ", {reference}")?;
            }
            f.write_str(" ]")?;
        }
        Ok(())
    }
}

/// Value snapshot of an error attached to a log call.
///
/// The error's `Display` text and its `source()` chain are rendered when the
/// call is recorded, so captured events stay `Send + Sync` and compare by
/// value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapturedError {
    message: String,
    causes: Vec<String>,
}

impl CapturedError {
    /// Captures `error` together with its chain of sources.
    #[must_use]
    pub fn from_error<E: Error + ?Sized>(error: &E) -> Self {
        let causes = std::iter::successors(error.source(), |&cause| cause.source())
            .map(ToString::to_string)
            .collect();
        Self {
            message: error.to_string(),
            causes,
        }
    }

    /// Creates a captured error from a bare message with no causes.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Returns the top-level error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the rendered source chain, outermost cause first.
    #[must_use]
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
