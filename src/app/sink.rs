// LogWatch - app/sink.rs
//
// Match output. Tailers push `MatchEvent`s and `SourceNotice`s into a shared
// `MatchSink`; the sink decides how and where they are rendered.
//
// Every implementation must be safe to call from many tailer threads at once.
// `WriterSink` renders a record completely before taking the stream lock, so
// a record is written with a single `write_all` and never interleaves with
// another tailer's output. Locks are per stream: a slow stderr never blocks
// match output on stdout.

use crate::core::model::{MatchEvent, OutputFormat, SourceNotice};
use std::io::{self, Write};
use std::sync::{mpsc, Mutex, PoisonError};

// =============================================================================
// Trait
// =============================================================================

/// Consumer of tailer output.
pub trait MatchSink: Send + Sync {
    /// Render one match. Ownership of the event passes to the sink.
    fn publish(&self, event: MatchEvent);

    /// Report a per-source condition on the error stream.
    fn notify(&self, notice: &SourceNotice);
}

// =============================================================================
// WriterSink
// =============================================================================

/// Sink that writes matches to one stream and notices to another.
pub struct WriterSink<O: Write + Send, E: Write + Send> {
    format: OutputFormat,
    out: Mutex<O>,
    err: Mutex<E>,
}

impl WriterSink<io::Stdout, io::Stderr> {
    /// Matches to stdout, notices to stderr.
    pub fn stdio(format: OutputFormat) -> Self {
        Self::new(format, io::stdout(), io::stderr())
    }
}

impl<O: Write + Send, E: Write + Send> WriterSink<O, E> {
    pub fn new(format: OutputFormat, out: O, err: E) -> Self {
        Self {
            format,
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Consume the sink and return the underlying streams.
    pub fn into_inner(self) -> (O, E) {
        (
            self.out.into_inner().unwrap_or_else(PoisonError::into_inner),
            self.err.into_inner().unwrap_or_else(PoisonError::into_inner),
        )
    }
}

/// Write one pre-rendered record under the stream lock.
fn write_record<W: Write>(stream: &Mutex<W>, record: &str) -> io::Result<()> {
    let mut w = stream.lock().unwrap_or_else(PoisonError::into_inner);
    w.write_all(record.as_bytes())?;
    w.flush()
}

impl<O: Write + Send, E: Write + Send> MatchSink for WriterSink<O, E> {
    fn publish(&self, event: MatchEvent) {
        let record = self.format.render(&event);
        if let Err(e) = write_record(&self.out, &record) {
            tracing::warn!(
                file = %event.path.display(),
                error = %e,
                "Failed to write match to output stream"
            );
        }
    }

    fn notify(&self, notice: &SourceNotice) {
        let record = format!("{notice}\n");
        if let Err(e) = write_record(&self.err, &record) {
            tracing::warn!(
                file = %notice.path().display(),
                error = %e,
                "Failed to write notice to error stream"
            );
        }
    }
}

// =============================================================================
// ChannelSink
// =============================================================================

/// Messages forwarded by `ChannelSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkMessage {
    Match(MatchEvent),
    Notice(SourceNotice),
}

/// Sink that forwards everything over an mpsc channel, for callers that want
/// to consume matches programmatically.
pub struct ChannelSink {
    // `Sender` is only `Sync` on recent toolchains; the mutex keeps the sink
    // shareable on the crate's minimum supported Rust version.
    tx: Mutex<mpsc::Sender<SinkMessage>>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it.
    pub fn new() -> (Self, mpsc::Receiver<SinkMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }

    fn send(&self, msg: SinkMessage) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if tx.send(msg).is_err() {
            // Receiver dropped: nobody is listening any more.
            tracing::debug!("Sink channel closed; dropping message");
        }
    }
}

impl MatchSink for ChannelSink {
    fn publish(&self, event: MatchEvent) {
        self.send(SinkMessage::Match(event));
    }

    fn notify(&self, notice: &SourceNotice) {
        self.send(SinkMessage::Notice(notice.clone()));
    }
}
