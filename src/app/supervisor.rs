// LogWatch - app/supervisor.rs
//
// Supervisor: starts one tailer thread per requested path, blocks until the
// cancellation token fires, then joins every tailer and aggregates their
// outcomes into a `WatchReport`.
//
// Architecture:
//   - Configuration arrives as an explicit `WatchConfig` at construction;
//     there is no process-global state.
//   - Tailers share nothing but the `CancellationToken` and the sink.
//   - A per-tailer failure is reported through the sink and recorded in the
//     report; it never stops the supervisor or sibling tailers.

use crate::app::cancel::CancellationToken;
use crate::app::sink::MatchSink;
use crate::app::tail::{TailConfig, Tailer};
use crate::core::matcher::Matcher;
use crate::core::model::{TailerOutcome, TerminationReason, WatchReport, WatchTarget};
use crate::util::error::{ConfigError, WatchError};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Settings shared by every tailer the supervisor starts.
#[derive(Debug, Clone, Default)]
pub struct WatchConfig {
    pub tail: TailConfig,
    /// Case-insensitive term matching.
    pub ignore_case: bool,
}

pub struct Supervisor {
    config: WatchConfig,
    sink: Arc<dyn MatchSink>,
}

struct Running {
    path: PathBuf,
    handle: JoinHandle<TerminationReason>,
}

impl Supervisor {
    pub fn new(config: WatchConfig, sink: Arc<dyn MatchSink>) -> Self {
        Self { config, sink }
    }

    /// Watch `paths` for lines containing `term` until `cancel` fires.
    ///
    /// Input is validated before any tailer starts. Returns once every
    /// started tailer has terminated.
    pub fn run_all(
        &self,
        term: &str,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<WatchReport, WatchError> {
        let matcher = Matcher::new(term, self.config.ignore_case)?;
        if paths.is_empty() {
            return Err(ConfigError::NoPaths.into());
        }
        let targets = build_targets(paths, &matcher);

        tracing::info!(
            term = matcher.term(),
            files = targets.len(),
            poll_ms = self.config.tail.poll_interval.as_millis() as u64,
            "Supervisor: starting tailers"
        );

        let mut running: Vec<Running> = Vec::with_capacity(targets.len());
        for (index, target) in targets.into_iter().enumerate() {
            let path = target.path.clone();
            match self.spawn_tailer(index, target, cancel) {
                Ok(handle) => running.push(Running { path, handle }),
                Err(source) => {
                    tracing::error!(file = %path.display(), error = %source, "Supervisor: spawn failed");
                    cancel.cancel();
                    join_all(running);
                    return Err(WatchError::Spawn { path, source });
                }
            }
        }

        cancel.wait();
        tracing::info!(
            tailers = running.len(),
            "Supervisor: cancellation received, waiting for tailers"
        );

        let report = WatchReport::new(join_all(running));
        tracing::info!(
            status = ?report.status(),
            failed = report.failed().count(),
            "Supervisor: all tailers stopped"
        );
        Ok(report)
    }

    fn spawn_tailer(
        &self,
        index: usize,
        target: WatchTarget,
        cancel: &CancellationToken,
    ) -> std::io::Result<JoinHandle<TerminationReason>> {
        let config = self.config.tail.clone();
        let sink = Arc::clone(&self.sink);
        let cancel = cancel.clone();
        thread::Builder::new()
            .name(format!("tail-{index}"))
            .spawn(move || Tailer::new(target, config).run(&cancel, sink.as_ref()))
    }
}

/// One target per distinct file, in first-seen order. Paths are compared in
/// canonical form when they resolve, so `a.log` and `./a.log` collapse; a
/// path that does not resolve yet is compared as given. Targets keep the
/// path the caller supplied.
fn build_targets(paths: &[PathBuf], matcher: &Matcher) -> Vec<WatchTarget> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut targets = Vec::with_capacity(paths.len());
    for path in paths {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            tracing::warn!(file = %path.display(), "Supervisor: duplicate path ignored");
            continue;
        }
        targets.push(WatchTarget::new(path.clone(), matcher.clone()));
    }
    targets
}

/// Join every tailer, converting a panicked thread into an outcome.
fn join_all(running: Vec<Running>) -> Vec<TailerOutcome> {
    running
        .into_iter()
        .map(|r| {
            let reason = r.handle.join().unwrap_or_else(|_| {
                tracing::error!(file = %r.path.display(), "Supervisor: tailer panicked");
                TerminationReason::Panicked
            });
            tracing::debug!(file = %r.path.display(), reason = %reason, "Supervisor: tailer joined");
            TailerOutcome {
                path: r.path,
                reason,
            }
        })
        .collect()
}
