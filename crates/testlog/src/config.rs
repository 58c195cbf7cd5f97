//! crates/testlog/src/config.rs
//! Properties-file configuration with environment overrides.
//!
//! Settings are read from `<source>.properties`, searched for in
//! `$CARGO_MANIFEST_DIR` and then the current directory. Any key can be
//! overridden through the environment: key `print.level` of source `testlog`
//! becomes `TESTLOG_PRINT_LEVEL`.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::level::Level;

/// Properties source consulted by the process-wide factory.
pub const SOURCE_NAME: &str = "testlog";

/// Key holding the default print threshold.
pub const PRINT_LEVEL_KEY: &str = "print.level";

/// Value of [`PRINT_LEVEL_KEY`] that disables printing.
pub const PRINT_LEVEL_OFF: &str = "OFF";

/// Key/value settings from a properties file, overridable per key from the
/// environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverridableProperties {
    source_name: String,
    source_file: Option<PathBuf>,
    properties: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl OverridableProperties {
    /// Loads `source_name` from the default search path with the process
    /// environment as overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if a properties file exists but cannot be
    /// read.
    pub fn load(source_name: &str) -> Result<Self, ConfigError> {
        Self::load_from(source_name, default_search_path(), env::vars())
    }

    /// Loads `source_name` from the first of `dirs` that contains the
    /// properties file, using `overrides` in place of the environment.
    ///
    /// A missing file is not an error; the result then only carries the
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file exists but cannot be read.
    pub fn load_from<D, P, O, K, V>(
        source_name: &str,
        dirs: D,
        overrides: O,
    ) -> Result<Self, ConfigError>
    where
        D: IntoIterator<Item = P>,
        P: AsRef<Path>,
        O: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let file_name = properties_file_name(source_name);
        let source_file = dirs
            .into_iter()
            .map(|dir| dir.as_ref().join(&file_name))
            .find(|candidate| candidate.is_file());

        let properties = match &source_file {
            Some(path) => {
                let text =
                    fs::read_to_string(path).map_err(|err| ConfigError::read(path.clone(), err))?;
                debug!(path = %path.display(), "loaded properties file");
                parse_properties(&text)
            }
            None => {
                trace!(file = %file_name, "no properties file found");
                HashMap::new()
            }
        };

        Ok(Self {
            source_name: source_name.to_owned(),
            source_file,
            properties,
            overrides: collect_pairs(overrides),
        })
    }

    /// Builds properties from in-memory maps.
    #[must_use]
    pub fn from_parts<P, O, K1, V1, K2, V2>(source_name: &str, properties: P, overrides: O) -> Self
    where
        P: IntoIterator<Item = (K1, V1)>,
        K1: Into<String>,
        V1: Into<String>,
        O: IntoIterator<Item = (K2, V2)>,
        K2: Into<String>,
        V2: Into<String>,
    {
        Self {
            source_name: source_name.to_owned(),
            source_file: None,
            properties: collect_pairs(properties),
            overrides: collect_pairs(overrides),
        }
    }

    /// Returns the override for `key` if set, else the file value, else
    /// `default`.
    #[must_use]
    pub fn property(&self, key: &str, default: &str) -> String {
        self.overrides
            .get(&self.override_key(key))
            .or_else(|| self.properties.get(key))
            .map_or_else(|| default.to_owned(), Clone::clone)
    }

    /// Environment variable name that overrides `key`.
    #[must_use]
    pub fn override_key(&self, key: &str) -> String {
        format!("{}_{}", self.source_name, key)
            .replace('.', "_")
            .to_ascii_uppercase()
    }

    /// Name of the properties file searched for.
    #[must_use]
    pub fn file_name(&self) -> String {
        properties_file_name(&self.source_name)
    }

    /// The properties file that was loaded, if one was found.
    #[must_use]
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Reads the print threshold from [`PRINT_LEVEL_KEY`].
    ///
    /// `OFF`, the default, yields `None`. Level names and `OFF` are matched
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPrintLevel`] for any other value.
    pub fn print_level(&self) -> Result<Option<Level>, ConfigError> {
        let value = self.property(PRINT_LEVEL_KEY, PRINT_LEVEL_OFF);
        let value = value.trim();
        if value.eq_ignore_ascii_case(PRINT_LEVEL_OFF) {
            return Ok(None);
        }
        value
            .parse::<Level>()
            .map(Some)
            .map_err(|source| ConfigError::InvalidPrintLevel {
                key: PRINT_LEVEL_KEY.to_owned(),
                file_name: self.file_name(),
                override_key: self.override_key(PRINT_LEVEL_KEY),
                source,
            })
    }
}

/// Parses the text of a properties file.
///
/// Lines starting with `#` or `!` and blank lines are skipped. The key ends at
/// the first unescaped `=`, `:` or whitespace; whitespace around that
/// separator is skipped and the rest of the line is the value. A line ending
/// in an odd number of backslashes continues on the next line, whose leading
/// whitespace is dropped. `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are
/// decoded and any other escaped character stands for itself. A key without
/// value maps to an empty string. Later duplicates win.
#[must_use]
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    logical_lines(text)
        .iter()
        .map(|line| split_entry(line))
        .collect()
}

fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;
    for raw in text.lines() {
        let trimmed = raw.trim_start();
        let mut line = match pending.take() {
            Some(mut joined) => {
                joined.push_str(trimmed);
                joined
            }
            None if trimmed.is_empty() || trimmed.starts_with(['#', '!']) => continue,
            None => trimmed.to_owned(),
        };
        if ends_with_continuation(&line) {
            line.pop();
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }
    lines.extend(pending);
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|&byte| byte == b'\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' || ch == ':' || ch.is_whitespace() {
            key_end = index;
            break;
        }
    }

    let rest = line[key_end..].trim_start();
    let value = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, str::trim_start);
    (unescape(&line[..key_end]), unescape(value))
}

fn unescape(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => decoded.push('\t'),
            Some('n') => decoded.push('\n'),
            Some('r') => decoded.push('\r'),
            Some('f') => decoded.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(unit) => decoded.push(unit),
                    None => {
                        decoded.push_str("\\u");
                        decoded.push_str(&hex);
                    }
                }
            }
            Some(other) => decoded.push(other),
            None => {}
        }
    }
    decoded
}

fn properties_file_name(source_name: &str) -> String {
    format!("{source_name}.properties")
}

fn default_search_path() -> Vec<PathBuf> {
    env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .into_iter()
        .chain(env::current_dir().ok())
        .collect()
}

fn collect_pairs<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}
