// LogWatch - platform/config.rs
//
// Config directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance. The file is optional: a missing file means
// defaults, and invalid values fall back to defaults with a warning.

use crate::core::model::OutputFormat;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Default location of config.toml, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    match ProjectDirs::from("", "", constants::APP_ID) {
        Some(dirs) => {
            let path = dirs.config_dir().join(constants::CONFIG_FILE_NAME);
            tracing::debug!(path = %path.display(), "Config path resolved");
            Some(path)
        }
        None => {
            tracing::debug!("Could not determine platform config directory");
            None
        }
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file still works with an older
/// binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[watch]` section.
    pub watch: WatchSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[watch]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Sleep after end-of-file before reading again (ms).
    pub poll_interval_ms: Option<u64>,
    /// Only report lines appended after startup.
    pub start_at_end: Option<bool>,
    /// Case-insensitive term matching.
    pub ignore_case: Option<bool>,
    /// Output format: "text" or "json".
    pub format: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from config.toml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub poll_interval_ms: u64,
    pub start_at_end: bool,
    pub ignore_case: bool,
    pub format: OutputFormat,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            start_at_end: false,
            ignore_case: false,
            format: OutputFormat::Text,
            log_level: None,
        }
    }
}

/// Check a poll interval against the configured bounds.
pub fn validate_poll_interval(field: &str, ms: u64) -> Result<u64, ConfigError> {
    if (constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS).contains(&ms) {
        Ok(ms)
    } else {
        Err(ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value: ms.to_string(),
            expected: format!(
                "{}-{} ms",
                constants::MIN_POLL_INTERVAL_MS,
                constants::MAX_POLL_INTERVAL_MS
            ),
        })
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load and validate config.toml at `path`.
///
/// Returns the validated config and a list of non-fatal warnings. A missing
/// file yields defaults with no warnings. An unreadable or unparseable file
/// is an error: the operator asked for this configuration and should know it
/// was not applied.
pub fn load_config(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return Ok((AppConfig::default(), Vec::new()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

/// Validate each field against named constants, accumulating warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings = Vec::new();

    // -- Watch: poll_interval_ms --
    if let Some(ms) = raw.watch.poll_interval_ms {
        match validate_poll_interval("[watch] poll_interval_ms", ms) {
            Ok(ms) => config.poll_interval_ms = ms,
            Err(e) => warnings.push(format!(
                "{e}. Using default ({}).",
                constants::DEFAULT_POLL_INTERVAL_MS
            )),
        }
    }

    if let Some(v) = raw.watch.start_at_end {
        config.start_at_end = v;
    }
    if let Some(v) = raw.watch.ignore_case {
        config.ignore_case = v;
    }

    // -- Watch: format --
    if let Some(ref format) = raw.watch.format {
        match format.parse::<OutputFormat>() {
            Ok(f) => config.format = f,
            Err(e) => warnings.push(format!("[watch] format: {e}. Using default (text).")),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    (config, warnings)
}
