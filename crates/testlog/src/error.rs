//! crates/testlog/src/error.rs
//! Error types surfaced while parsing levels and loading configuration.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Error returned when a level name does not match any [`Level`](crate::Level).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown level name: \"{invalid_name}\"")]
pub struct ParseLevelError {
    invalid_name: String,
}

impl ParseLevelError {
    /// Creates a parse error that records the rejected name.
    #[must_use]
    pub fn new(invalid_name: &str) -> Self {
        Self {
            invalid_name: invalid_name.to_owned(),
        }
    }

    /// Returns the name that failed to parse.
    #[must_use]
    pub fn invalid_name(&self) -> &str {
        &self.invalid_name
    }
}

/// Misconfiguration detected while building the process-wide factory.
///
/// These errors occur once, on first access to
/// [`TestLoggerFactory::try_instance`](crate::TestLoggerFactory::try_instance),
/// and point at a broken test harness rather than at the code under test. The
/// value is cloneable so the cached failure can be handed to every caller.
#[derive(Clone, Debug, Error)]
pub enum ConfigError {
    /// The configured print level is neither a level name nor `OFF`.
    #[error(
        "invalid level name in property {key} of file {file_name} or environment variable {override_key}"
    )]
    InvalidPrintLevel {
        /// Property key that carried the value.
        key: String,
        /// Properties file name that was searched for.
        file_name: String,
        /// Environment variable that overrides the file.
        override_key: String,
        /// Underlying parse failure.
        #[source]
        source: ParseLevelError,
    },
    /// The properties file exists but could not be read.
    #[error("error reading file {}", path.display())]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: Arc<io::Error>,
    },
}

impl ConfigError {
    pub(crate) fn read(path: PathBuf, source: io::Error) -> Self {
        Self::Read {
            path,
            source: Arc::new(source),
        }
    }
}
