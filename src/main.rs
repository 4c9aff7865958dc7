// LogWatch - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (CLI flags override file values)
// 3. Logging initialisation
// 4. Signal bridge installation and supervisor run

use clap::Parser;
use logwatch::app::cancel::CancellationToken;
use logwatch::app::signal::SignalBridge;
use logwatch::app::sink::WriterSink;
use logwatch::app::supervisor::{Supervisor, WatchConfig};
use logwatch::app::tail::TailConfig;
use logwatch::core::model::OutputFormat;
use logwatch::platform::config::{self, AppConfig};
use logwatch::util::error::{ConfigError, WatchError};
use logwatch::util::{self, constants};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// LogWatch - follow log files and report lines containing a search term.
///
/// Runs until interrupted (Ctrl-C). Matches are written to stdout as
/// `<path>: Matched: <line>`; per-file errors go to stderr.
#[derive(Parser, Debug)]
#[command(name = "logwatch", version, about)]
struct Cli {
    /// Text to search for (plain substring).
    term: String,

    /// Files to watch.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Delay after reaching end-of-file before reading again (ms).
    #[arg(short = 'i', long = "poll-interval-ms")]
    poll_interval_ms: Option<u64>,

    /// Only report lines appended after startup.
    #[arg(short = 'e', long = "from-end", overrides_with = "no_from_end")]
    from_end: bool,

    /// Read existing content, overriding `start_at_end = true` in config.
    #[arg(long = "no-from-end", overrides_with = "from_end")]
    no_from_end: bool,

    /// Match the term case-insensitively.
    #[arg(short = 'c', long = "ignore-case", overrides_with = "no_ignore_case")]
    ignore_case: bool,

    /// Match case-sensitively, overriding `ignore_case = true` in config.
    #[arg(long = "no-ignore-case", overrides_with = "ignore_case")]
    no_ignore_case: bool,

    /// Output format: text or json.
    #[arg(short = 'f', long = "format")]
    format: Option<OutputFormat>,

    /// Config file (defaults to the platform config directory).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

/// A `--flag` / `--no-flag` pair over a config value. The last one given wins;
/// with neither, the config value stands.
fn switch(on: bool, off: bool, file: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => file,
    }
}

/// Merge CLI flags over the file config. Flags always win.
fn resolve(cli: &Cli, file: AppConfig) -> Result<(WatchConfig, OutputFormat), ConfigError> {
    let poll_ms = match cli.poll_interval_ms {
        Some(ms) => config::validate_poll_interval("--poll-interval-ms", ms)?,
        None => file.poll_interval_ms,
    };

    let watch = WatchConfig {
        tail: TailConfig {
            poll_interval: Duration::from_millis(poll_ms),
            start_at_end: switch(cli.from_end, cli.no_from_end, file.start_at_end),
            ..Default::default()
        },
        ignore_case: switch(cli.ignore_case, cli.no_ignore_case, file.ignore_case),
    };
    Ok((watch, cli.format.unwrap_or(file.format)))
}

/// Exit code for an error that stopped the watcher as a whole.
fn exit_code(e: &WatchError) -> u8 {
    match e {
        // Nothing was started: bad invocation or environment.
        WatchError::Config(_) | WatchError::Signal(_) => constants::EXIT_CONFIG_ERROR,
        WatchError::Spawn { .. } => constants::EXIT_PARTIAL_FAILURE,
    }
}

fn fail(e: WatchError) -> ExitCode {
    tracing::error!(error = %e, "Watch aborted");
    eprintln!("Error: {e}");
    ExitCode::from(exit_code(&e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::default_config_path);
    let (file_config, warnings) = match config_path.as_deref().map(config::load_config) {
        Some(Ok(loaded)) => loaded,
        Some(Err(e)) => return fail(e.into()),
        None => (AppConfig::default(), Vec::new()),
    };

    util::logging::init(cli.debug, file_config.log_level.as_deref());
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        version = constants::APP_VERSION,
        files = cli.paths.len(),
        "LogWatch starting"
    );

    let (watch_config, format) = match resolve(&cli, file_config) {
        Ok(resolved) => resolved,
        Err(e) => return fail(e.into()),
    };

    let cancel = CancellationToken::new();
    if let Err(e) = SignalBridge::install(cancel.clone()) {
        return fail(e.into());
    }

    let sink = Arc::new(WriterSink::stdio(format));
    let supervisor = Supervisor::new(watch_config, sink);

    match supervisor.run_all(&cli.term, &cli.paths, &cancel) {
        Ok(report) => {
            for outcome in report.failed() {
                eprintln!("{}: {}", outcome.path.display(), outcome.reason);
            }
            ExitCode::from(report.status().code())
        }
        Err(e) => fail(e),
    }
}
