// LogWatch - tests/e2e_watch.rs
//
// End-to-end tests for the supervisor, tailers, and sinks.
//
// These tests exercise real files written by a separate writer while the
// supervisor runs on its own thread: no mocks, no stubs. Shutdown always
// goes through the shared cancellation token, the same path the signal
// bridge uses.

use logwatch::app::cancel::CancellationToken;
use logwatch::app::sink::{ChannelSink, MatchSink, SinkMessage, WriterSink};
use logwatch::app::supervisor::{Supervisor, WatchConfig};
use logwatch::app::tail::TailConfig;
use logwatch::core::model::{
    ExitStatus, MatchEvent, OutputFormat, SourceNotice, TerminationReason, WatchReport,
};
use logwatch::util::error::WatchError;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

const POLL: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(5);

fn watch_config() -> WatchConfig {
    WatchConfig {
        tail: TailConfig {
            poll_interval: POLL,
            ..Default::default()
        },
        ignore_case: false,
    }
}

fn append(path: &Path, text: &str) {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    f.write_all(text.as_bytes()).unwrap();
    f.flush().unwrap();
}

/// Run the supervisor on a background thread with the given sink.
fn start(
    term: &str,
    paths: Vec<PathBuf>,
    sink: Arc<dyn MatchSink>,
) -> (
    CancellationToken,
    thread::JoinHandle<Result<WatchReport, WatchError>>,
) {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let term = term.to_string();
    let handle = thread::spawn(move || {
        Supervisor::new(watch_config(), sink).run_all(&term, &paths, &token)
    });
    (cancel, handle)
}

fn start_with_channel(
    term: &str,
    paths: Vec<PathBuf>,
) -> (
    CancellationToken,
    mpsc::Receiver<SinkMessage>,
    thread::JoinHandle<Result<WatchReport, WatchError>>,
) {
    let (sink, rx) = ChannelSink::new();
    let (cancel, handle) = start(term, paths, Arc::new(sink));
    (cancel, rx, handle)
}

/// Collect `count` match events, skipping notices.
fn collect_matches(rx: &mpsc::Receiver<SinkMessage>, count: usize) -> Vec<MatchEvent> {
    let mut events = Vec::with_capacity(count);
    while events.len() < count {
        match rx.recv_timeout(WAIT).expect("timed out waiting for matches") {
            SinkMessage::Match(e) => events.push(e),
            SinkMessage::Notice(_) => {}
        }
    }
    events
}

/// Drain for `within` and fail on any further match.
fn assert_quiet(rx: &mpsc::Receiver<SinkMessage>, within: Duration) {
    let deadline = Instant::now() + within;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(SinkMessage::Match(e)) => panic!("unexpected extra match: {e:?}"),
            Ok(SinkMessage::Notice(_)) => {}
            Err(_) => return,
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

/// Lines appended over time: only the ERROR line is reported, rendered in the
/// documented output format.
#[test]
fn e2e_single_file_reports_only_matching_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "");

    let (sink, rx) = ChannelSink::new();
    let (cancel, handle) = start("ERROR", vec![path.clone()], Arc::new(sink));

    append(&path, "INFO start\n");
    thread::sleep(POLL * 2);
    append(&path, "ERROR disk full\n");
    thread::sleep(POLL * 2);
    append(&path, "INFO ok\n");

    let events = collect_matches(&rx, 1);
    assert_eq!(events[0].line, "ERROR disk full");
    assert_eq!(events[0].path, path);
    assert_eq!(
        OutputFormat::Text.render(&events[0]),
        format!("{}: Matched: ERROR disk full\n", path.display())
    );
    assert_quiet(&rx, POLL * 5);

    cancel.cancel();
    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.status(), ExitStatus::Success);
}

/// Two files written concurrently: each match is attributed to its own path.
#[test]
fn e2e_two_files_attribute_matches_to_their_source() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.log");
    let b = dir.path().join("b.log");
    append(&a, "");
    append(&b, "");

    let (cancel, rx, handle) = start_with_channel("ERROR", vec![a.clone(), b.clone()]);

    let wa = {
        let a = a.clone();
        thread::spawn(move || append(&a, "ERROR a\n"))
    };
    let wb = {
        let b = b.clone();
        thread::spawn(move || append(&b, "ERROR b\n"))
    };
    wa.join().unwrap();
    wb.join().unwrap();

    let events = collect_matches(&rx, 2);
    let by_path: HashMap<_, _> = events
        .iter()
        .map(|e| (e.path.clone(), e.line.clone()))
        .collect();
    assert_eq!(by_path.get(&a).map(String::as_str), Some("ERROR a"));
    assert_eq!(by_path.get(&b).map(String::as_str), Some("ERROR b"));

    cancel.cancel();
    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.outcomes.len(), 2);
}

/// N files with disjoint matches yield exactly N x matches-per-file events,
/// each source in file order.
#[test]
fn e2e_many_files_keep_per_source_order() {
    const FILES: usize = 4;
    const LINES: usize = 25;

    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..FILES)
        .map(|i| dir.path().join(format!("svc{i}.log")))
        .collect();
    for p in &paths {
        append(p, "");
    }

    let (cancel, rx, handle) = start_with_channel("ERROR", paths.clone());

    let writers: Vec<_> = paths
        .iter()
        .cloned()
        .map(|p| {
            thread::spawn(move || {
                for n in 0..LINES {
                    append(&p, &format!("INFO noise {n}\nERROR {n}\n"));
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let events = collect_matches(&rx, FILES * LINES);
    assert_quiet(&rx, POLL * 5);

    for p in &paths {
        let lines: Vec<_> = events
            .iter()
            .filter(|e| &e.path == p)
            .map(|e| e.line.clone())
            .collect();
        let expected: Vec<_> = (0..LINES).map(|n| format!("ERROR {n}")).collect();
        assert_eq!(lines, expected, "wrong sequence for {}", p.display());
    }

    cancel.cancel();
    handle.join().unwrap().unwrap();
}

/// A missing path yields SourceUnavailable while siblings keep matching.
#[test]
fn e2e_missing_file_does_not_stop_siblings() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.log");
    let missing = dir.path().join("missing.log");
    append(&good, "");

    let (cancel, rx, handle) = start_with_channel("ERROR", vec![missing.clone(), good.clone()]);

    append(&good, "ERROR still watching\n");
    let event = loop {
        match rx.recv_timeout(WAIT).expect("timed out") {
            SinkMessage::Notice(SourceNotice::Unavailable { path, .. }) => {
                assert_eq!(path, missing);
            }
            SinkMessage::Notice(other) => panic!("unexpected notice: {other:?}"),
            SinkMessage::Match(e) => break e,
        }
    };
    assert_eq!(event.path, good);
    assert_eq!(event.line, "ERROR still watching");

    cancel.cancel();
    let report = handle.join().unwrap().unwrap();
    assert!(matches!(
        report.outcome_for(&missing),
        Some(TerminationReason::SourceUnavailable(_))
    ));
    assert!(matches!(
        report.outcome_for(&good),
        Some(TerminationReason::Cancelled)
    ));
    assert_eq!(report.status(), ExitStatus::Success);
    let ok: Vec<_> = report.succeeded().collect();
    assert!(ok.contains(&good.as_path()));
}

/// A path that opens but cannot be read ends in ReadFailure, turns the exit
/// status into a partial failure, and leaves siblings running.
#[cfg(unix)]
#[test]
fn e2e_read_failure_is_partial_failure() {
    let dir = TempDir::new().unwrap();
    // Opening a directory succeeds on Unix; reading it fails with EISDIR.
    let unreadable = dir.path().join("logs.d");
    std::fs::create_dir(&unreadable).unwrap();
    let good = dir.path().join("good.log");
    append(&good, "");

    let (cancel, rx, handle) =
        start_with_channel("ERROR", vec![unreadable.clone(), good.clone()]);

    append(&good, "ERROR sibling alive\n");
    let mut saw_read_failed = false;
    let event = loop {
        match rx.recv_timeout(WAIT).expect("timed out") {
            SinkMessage::Notice(SourceNotice::ReadFailed { path, .. }) => {
                assert_eq!(path, unreadable);
                saw_read_failed = true;
            }
            SinkMessage::Notice(other) => panic!("unexpected notice: {other:?}"),
            SinkMessage::Match(e) => break e,
        }
    };
    assert_eq!(event.path, good);
    assert_eq!(event.line, "ERROR sibling alive");

    cancel.cancel();
    let report = handle.join().unwrap().unwrap();
    // The notice may trail the sibling's match; the sink still holds it.
    saw_read_failed |= rx
        .try_iter()
        .any(|m| matches!(m, SinkMessage::Notice(SourceNotice::ReadFailed { .. })));
    assert!(saw_read_failed, "expected a ReadFailed notice");

    assert!(matches!(
        report.outcome_for(&unreadable),
        Some(TerminationReason::ReadFailure(_))
    ));
    assert!(matches!(
        report.outcome_for(&good),
        Some(TerminationReason::Cancelled)
    ));
    assert_eq!(report.status(), ExitStatus::PartialFailure);
    let failed: Vec<_> = report.failed().map(|o| o.path.clone()).collect();
    assert_eq!(failed, vec![unreadable]);
}

/// Cancellation stops every tailer within a poll interval, and the
/// supervisor only returns after all of them have reported.
#[test]
fn e2e_cancel_joins_every_tailer_promptly() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..3)
        .map(|i| {
            let p = dir.path().join(format!("idle{i}.log"));
            append(&p, "INFO idle\n");
            p
        })
        .collect();

    let (sink, _rx) = ChannelSink::new();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let config = WatchConfig {
        tail: TailConfig {
            poll_interval: Duration::from_millis(200),
            ..Default::default()
        },
        ignore_case: false,
    };
    let handle = {
        let paths = paths.clone();
        thread::spawn(move || Supervisor::new(config, Arc::new(sink)).run_all("ERROR", &paths, &token))
    };

    thread::sleep(Duration::from_millis(100));
    let fired_at = Instant::now();
    cancel.cancel();
    let report = handle.join().unwrap().unwrap();

    assert!(fired_at.elapsed() < Duration::from_secs(2));
    assert_eq!(report.outcomes.len(), 3);
    for p in &paths {
        assert!(matches!(
            report.outcome_for(p),
            Some(TerminationReason::Cancelled)
        ));
    }
}

/// The stdout-style sink renders the documented record format when driven by
/// a real supervisor.
#[test]
fn e2e_writer_sink_renders_text_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    append(&path, "INFO start\nERROR disk full\nINFO ok\n");

    let sink = Arc::new(WriterSink::new(OutputFormat::Text, Vec::new(), Vec::new()));
    let (cancel, handle) = start("ERROR", vec![path.clone()], sink.clone());

    // The file is read from the start; give the tailer a few polls.
    thread::sleep(POLL * 10);
    cancel.cancel();
    handle.join().unwrap().unwrap();

    let sink = Arc::try_unwrap(sink).ok().expect("supervisor released the sink");
    let (out, err) = sink.into_inner();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("{}: Matched: ERROR disk full\n", path.display())
    );
    assert!(err.is_empty());
}

/// Case-insensitive mode is honoured end to end.
#[test]
fn e2e_ignore_case() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.log");
    append(&path, "error lower\nINFO ok\nError Title\n");

    let (sink, rx) = ChannelSink::new();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let config = WatchConfig {
        ignore_case: true,
        ..watch_config()
    };
    let handle = {
        let path = path.clone();
        thread::spawn(move || {
            Supervisor::new(config, Arc::new(sink)).run_all("ERROR", &[path], &token)
        })
    };

    let lines: Vec<_> = collect_matches(&rx, 2).into_iter().map(|e| e.line).collect();
    assert_eq!(lines, vec!["error lower", "Error Title"]);

    cancel.cancel();
    handle.join().unwrap().unwrap();
}
