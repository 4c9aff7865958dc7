// LogWatch - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogWatch";

/// Application identifier used for the config directory.
pub const APP_ID: &str = "LogWatch";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Tail limits
// =============================================================================

/// How long a tailer sleeps after catching up to the writer (ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Minimum user-configurable poll interval (ms).
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Maximum user-configurable poll interval (ms).
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000; // 60 s

/// Maximum accumulated size of the partial (unterminated) line buffer for a
/// single tailed file.
///
/// Guards against unbounded memory when a watched file produces no newlines
/// (binary content or a file opened by mistake). When exceeded the fragment
/// is discarded and the rest of that line is skipped.
pub const MAX_TAIL_PARTIAL_BYTES: usize = 2 * 1_024 * 1_024; // 2 MiB

// =============================================================================
// Exit codes
// =============================================================================

/// Every tailer ended cleanly (cancelled or source unavailable).
pub const EXIT_SUCCESS: u8 = 0;

/// At least one tailer ended with a read failure.
pub const EXIT_PARTIAL_FAILURE: u8 = 1;

/// Invalid invocation or configuration; no tailer was started.
pub const EXIT_CONFIG_ERROR: u8 = 2;

// =============================================================================
// Logging
// =============================================================================

/// Default log level. Kept at `warn` because stderr also carries the
/// per-source error stream.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
