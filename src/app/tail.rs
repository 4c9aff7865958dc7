// LogWatch - app/tail.rs
//
// Tailer: follows one file, reports appended lines that contain the search
// term, and stops on cancellation or on the first unrecoverable error.
//
// Architecture:
//   - One `Tailer` per watched path, run on its own thread by the supervisor.
//   - The file is opened once and held for the tailer's lifetime; the handle
//     is dropped on every exit path, so nothing leaks past shutdown.
//   - End-of-file is "caught up", not an error: the tailer sleeps for the poll
//     interval on the cancellation token and then reads again from the same
//     position.
//
// Rules:
//   - Only terminated lines are matched. Bytes after the last '\n' stay in
//     the partial buffer until the terminator arrives.
//   - Cancellation is checked before every read and after every poll sleep,
//     so a tailer stops within one poll interval of the token firing.
//   - Truncation (file shorter than what we consumed) resets to offset 0 and
//     publishes a `SourceNotice::Reset`. Rotation by rename is not detected.
//   - MAX_TAIL_PARTIAL_BYTES bounds the partial buffer. Each read is capped
//     at one byte past the limit; an over-long fragment is dropped as soon as
//     it crosses the cap and the rest of that line is skipped in bounded
//     chunks.

use crate::app::cancel::CancellationToken;
use crate::app::sink::MatchSink;
use crate::core::model::{MatchEvent, SourceNotice, TerminationReason, WatchTarget};
use crate::util::constants::{DEFAULT_POLL_INTERVAL_MS, MAX_TAIL_PARTIAL_BYTES};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Per-tailer read behaviour.
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Sleep between reaching end-of-file and the next read attempt.
    pub poll_interval: Duration,
    /// Seek to the end on open so only newly appended lines are examined.
    pub start_at_end: bool,
    /// Upper bound on the buffered unterminated line.
    pub max_partial_bytes: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            start_at_end: false,
            max_partial_bytes: MAX_TAIL_PARTIAL_BYTES,
        }
    }
}

// =============================================================================
// Per-file state
// =============================================================================

/// Last observed read condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStatus {
    /// Not started yet.
    #[default]
    Idle,
    /// The last read returned a complete line.
    Streaming,
    /// Reached end-of-file; waiting for the writer.
    CaughtUp,
    /// Stopped on an open or read error.
    Failed,
}

/// Read cursor owned exclusively by one tailer.
#[derive(Debug, Clone, Default)]
pub struct TailState {
    /// Byte position just past the last complete line consumed.
    /// Non-decreasing except when a truncation resets it to zero.
    pub offset: u64,
    pub status: ReadStatus,
}

// =============================================================================
// Tailer
// =============================================================================

pub struct Tailer {
    target: WatchTarget,
    config: TailConfig,
    state: TailState,
    /// Set after an over-long fragment was dropped: the next terminated line
    /// is its tail end and must not be matched.
    skip_to_newline: bool,
}

impl Tailer {
    pub fn new(target: WatchTarget, config: TailConfig) -> Self {
        Self {
            target,
            config,
            state: TailState::default(),
            skip_to_newline: false,
        }
    }

    pub fn state(&self) -> &TailState {
        &self.state
    }

    /// Follow the target until cancelled or until an unrecoverable error.
    pub fn run(&mut self, cancel: &CancellationToken, sink: &dyn MatchSink) -> TerminationReason {
        let file = match File::open(&self.target.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(file = %self.target.path.display(), error = %e, "Tail: open failed");
                self.state.status = ReadStatus::Failed;
                sink.notify(&SourceNotice::Unavailable {
                    path: self.target.path.clone(),
                    error: e.to_string(),
                });
                return TerminationReason::SourceUnavailable(e);
            }
        };

        let mut reader = BufReader::new(file);
        if self.config.start_at_end {
            match reader.seek(SeekFrom::End(0)) {
                Ok(end) => self.state.offset = end,
                Err(e) => return self.read_failure(e, sink),
            }
        }

        tracing::info!(
            file = %self.target.path.display(),
            offset = self.state.offset,
            "Tail: started"
        );

        let reason = self.follow(&mut reader, cancel, sink);

        tracing::info!(
            file = %self.target.path.display(),
            offset = self.state.offset,
            reason = reason.label(),
            "Tail: stopped"
        );
        reason
    }

    fn follow(
        &mut self,
        reader: &mut BufReader<File>,
        cancel: &CancellationToken,
        sink: &dyn MatchSink,
    ) -> TerminationReason {
        // Bytes read since the last terminator. Survives poll sleeps so a
        // slow writer's line is reassembled rather than matched in pieces.
        let mut line: Vec<u8> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                return TerminationReason::Cancelled;
            }

            // Never pull more than one byte past the cap into `line`, so a
            // newline-free file cannot grow the buffer without bound.
            let limit = (self.config.max_partial_bytes + 1).saturating_sub(line.len()) as u64;
            if let Err(e) = reader.by_ref().take(limit).read_until(b'\n', &mut line) {
                return self.read_failure(e, sink);
            }

            if line.last() == Some(&b'\n') {
                self.state.status = ReadStatus::Streaming;
                self.state.offset += line.len() as u64;
                if self.skip_to_newline {
                    self.skip_to_newline = false;
                } else {
                    self.consume(&line, sink);
                }
                line.clear();
                continue;
            }

            if line.len() > self.config.max_partial_bytes {
                self.discard_partial(&mut line, sink);
                continue;
            }

            // End of file: anything left in `line` is an unterminated fragment.
            self.state.status = ReadStatus::CaughtUp;

            if let Err(e) = self.check_truncation(reader, &mut line, sink) {
                return self.read_failure(e, sink);
            }

            if cancel.wait_timeout(self.config.poll_interval) {
                return TerminationReason::Cancelled;
            }
        }
    }

    /// Apply the predicate to one terminated line and publish on a match.
    fn consume(&self, raw: &[u8], sink: &dyn MatchSink) {
        let decoded = String::from_utf8_lossy(raw);
        let text = decoded.strip_suffix('\n').unwrap_or(decoded.as_ref());
        let text = text.strip_suffix('\r').unwrap_or(text);

        if self.target.matcher.matches(text) {
            tracing::debug!(file = %self.target.path.display(), "Tail: match");
            sink.publish(MatchEvent::new(&self.target.path, text.to_string()));
        }
    }

    /// Drop a fragment that hit the cap. Only the first chunk of a line is
    /// reported; later chunks of the same line are dropped silently.
    fn discard_partial(&mut self, line: &mut Vec<u8>, sink: &dyn MatchSink) {
        if !self.skip_to_newline {
            tracing::warn!(
                file = %self.target.path.display(),
                bytes = line.len(),
                "Tail: unterminated line exceeds cap, discarding"
            );
            sink.notify(&SourceNotice::PartialDiscarded {
                path: self.target.path.clone(),
                bytes: line.len(),
            });
            self.skip_to_newline = true;
        }
        self.state.offset += line.len() as u64;
        line.clear();
    }

    /// Reset to the start of the file if it shrank below what we consumed.
    fn check_truncation(
        &mut self,
        reader: &mut BufReader<File>,
        line: &mut Vec<u8>,
        sink: &dyn MatchSink,
    ) -> io::Result<()> {
        let size = reader.get_ref().metadata()?.len();
        let consumed = self.state.offset + line.len() as u64;
        if size >= consumed {
            return Ok(());
        }

        tracing::info!(
            file = %self.target.path.display(),
            old_offset = consumed,
            new_size = size,
            "Tail: file truncated, resetting offset to 0"
        );
        reader.seek(SeekFrom::Start(0))?;
        sink.notify(&SourceNotice::Reset {
            path: self.target.path.clone(),
            offset: consumed,
            size,
        });
        self.state.offset = 0;
        line.clear();
        self.skip_to_newline = false;
        Ok(())
    }

    fn read_failure(&mut self, e: io::Error, sink: &dyn MatchSink) -> TerminationReason {
        tracing::debug!(file = %self.target.path.display(), error = %e, "Tail: read error");
        self.state.status = ReadStatus::Failed;
        sink.notify(&SourceNotice::ReadFailed {
            path: self.target.path.clone(),
            error: e.to_string(),
        });
        TerminationReason::ReadFailure(e)
    }
}
