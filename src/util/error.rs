// LogWatch - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Per-source tail failures are not errors at this level: they are reported
// as `TerminationReason`s and never abort the supervisor.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for operations that stop the watcher as a whole.
#[derive(Debug)]
pub enum WatchError {
    /// Invocation or configuration was invalid; nothing was started.
    Config(ConfigError),

    /// A tailer thread could not be spawned.
    Spawn { path: PathBuf, source: io::Error },

    /// The interrupt handler could not be installed.
    Signal(SignalError),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Spawn { path, source } => write!(
                f,
                "Failed to start tailer for '{}': {source}",
                path.display()
            ),
            Self::Signal(e) => write!(f, "Signal error: {e}"),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Spawn { source, .. } => Some(source),
            Self::Signal(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to invocation and configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// The search term is empty.
    MissingTerm,

    /// No file paths were supplied.
    NoPaths,

    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTerm => write!(f, "a non-empty search term is required"),
            Self::NoPaths => write!(f, "at least one file path is required"),
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "'{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for WatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Signal errors
// ---------------------------------------------------------------------------

/// Errors related to interrupt handler registration.
#[derive(Debug)]
pub enum SignalError {
    /// A handler is already registered for this process.
    AlreadyInstalled,

    /// The platform refused the registration.
    Registration { source: ctrlc::Error },
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled => {
                write!(f, "an interrupt handler is already installed")
            }
            Self::Registration { source } => {
                write!(f, "could not register interrupt handler: {source}")
            }
        }
    }
}

impl std::error::Error for SignalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registration { source } => Some(source),
            Self::AlreadyInstalled => None,
        }
    }
}

impl From<ctrlc::Error> for SignalError {
    fn from(e: ctrlc::Error) -> Self {
        match e {
            ctrlc::Error::MultipleHandlers => Self::AlreadyInstalled,
            other => Self::Registration { source: other },
        }
    }
}

impl From<SignalError> for WatchError {
    fn from(e: SignalError) -> Self {
        Self::Signal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_spawn_error_preserves_source() {
        let err = WatchError::Spawn {
            path: PathBuf::from("app.log"),
            source: io::Error::new(io::ErrorKind::Other, "no threads left"),
        };
        assert!(err.to_string().contains("app.log"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_wraps_into_watch_error() {
        let err: WatchError = ConfigError::NoPaths.into();
        assert!(matches!(err, WatchError::Config(ConfigError::NoPaths)));
        assert_eq!(
            err.to_string(),
            "Configuration error: at least one file path is required"
        );
    }

    #[test]
    fn test_multiple_handlers_maps_to_already_installed() {
        let err = SignalError::from(ctrlc::Error::MultipleHandlers);
        assert!(matches!(err, SignalError::AlreadyInstalled));
    }

    #[test]
    fn test_signal_error_wraps_into_watch_error() {
        let err = WatchError::from(SignalError::AlreadyInstalled);
        assert!(matches!(err, WatchError::Signal(SignalError::AlreadyInstalled)));
        assert_eq!(
            err.to_string(),
            "Signal error: an interrupt handler is already installed"
        );
        assert!(err.source().is_some());
    }
}
