//! stream/writer.rs
//!
//! Top-level write path: the open/write/close contract an archive writer drives,
//! plus the segment-change signal from the surrounding glue.
//!
//! Every write first consumes a pending segment boundary (closing the previous
//! frame), then ingests its bytes, flushing first if they would not fit.
use std::io::{self, Write};
use std::time::Instant;

use tracing::{trace, warn};

use crate::compression::SegmentClass;
use crate::config::WriterConfig;
use crate::stream::buffer::IngestBuffer;
use crate::stream::flusher::{FlushReason, FrameFlusher};
use crate::stream::io::{captured_bytes, open_output, CaptureBuffer, OutputSink};
use crate::stream::segment::SegmentTracker;
use crate::telemetry::{FrameRecord, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::{StreamError, UsageError};

/// Contract consumed by an archive writer.
pub trait ArchiveCallbacks {
    /// Must succeed before any write.
    fn open(&mut self) -> Result<(), StreamError>;

    /// Accepts all of `buf` or fails the whole call.
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    /// Invoked exactly once, even after errors.
    fn close(&mut self) -> Result<(), StreamError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    Open,
    Closed,
    /// A fatal error occurred; only `close` is accepted.
    Failed,
}

pub struct SplitWriter {
    state: WriterState,
    config: WriterConfig,
    tracker: SegmentTracker,
    buffer: IngestBuffer,
    flusher: Option<FrameFlusher>,
    pending_sink: Option<OutputSink>,
    sink: Option<Box<dyn Write + Send>>,
    capture: Option<CaptureBuffer>,
    counters: TelemetryCounters,
    timer: TelemetryTimer,
    frames: Vec<FrameRecord>,
}

impl SplitWriter {
    /// Validate `config` and allocate the ingest buffer. The sink is opened by `open`.
    pub fn new(sink: OutputSink, config: WriterConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self {
            state: WriterState::Idle,
            buffer: IngestBuffer::with_capacity(config.buffer_capacity),
            config,
            tracker: SegmentTracker::new(),
            flusher: None,
            pending_sink: Some(sink),
            sink: None,
            capture: None,
            counters: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
            frames: Vec::new(),
        })
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn tracker(&self) -> &SegmentTracker {
        &self.tracker
    }

    /// Bytes waiting in the ingest buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Class whose profile the live context currently carries.
    pub fn active_class(&self) -> Option<SegmentClass> {
        self.flusher
            .as_ref()
            .and_then(|f| f.context().configured())
            .map(|active| active.class)
    }

    /// Create the context and sink, and configure for the initial segment.
    pub fn open(&mut self) -> Result<(), StreamError> {
        if self.state != WriterState::Idle {
            return Err(UsageError::AlreadyOpen.into());
        }
        let result = self.open_inner();
        self.fail_on_error(result)?;
        self.state = WriterState::Open;
        Ok(())
    }

    fn open_inner(&mut self) -> Result<(), StreamError> {
        let sink = self.pending_sink.take().ok_or(UsageError::AlreadyOpen)?;
        let (writer, capture) = open_output(sink)?;
        self.sink = Some(writer);
        self.capture = capture;

        let mut flusher = FrameFlusher::new(self.config.profiles, self.config.class_policy)?;
        let start = Instant::now();
        flusher.reset_for_segment(self.tracker.current())?;
        self.timer.add_stage_time(Stage::Reset, start.elapsed());
        self.counters.add_reset();
        self.flusher = Some(flusher);
        Ok(())
    }

    /// Announce that the next write starts a new segment.
    pub fn declare_change(&mut self) -> Result<(), UsageError> {
        match self.state {
            WriterState::Closed => Err(UsageError::DeclareAfterClose),
            WriterState::Failed => Err(UsageError::StreamFailed),
            WriterState::Idle | WriterState::Open => {
                self.tracker.declare_change();
                Ok(())
            }
        }
    }

    /// Ingest one caller write. `buf` must be shorter than the buffer capacity.
    pub fn ingest(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        let result = self.ingest_inner(buf);
        self.fail_on_error(result)
    }

    fn ingest_inner(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.buffer.check_fits(buf.len())?;

        if self.tracker.consume_pending_boundary() {
            self.flush_with(FlushReason::Boundary)?;
        }
        if self.buffer.needs_flush_for(buf.len()) {
            self.flush_with(FlushReason::Mandatory)?;
        }

        let start = Instant::now();
        let pos = self.buffer.len();
        self.buffer.append(buf)?;
        self.timer.add_stage_time(Stage::Ingest, start.elapsed());
        self.counters.add_ingest(buf.len());
        trace!(bytes = buf.len(), pos, segment = self.tracker.current(), "ingested");
        Ok(buf.len())
    }

    /// Close the open frame now. A no-op apart from the context reset when nothing is buffered.
    pub fn flush_frame(&mut self) -> Result<(), StreamError> {
        if self.state == WriterState::Closed {
            return Ok(());
        }
        self.ensure_open()?;
        let result = self.flush_with(FlushReason::Explicit);
        self.fail_on_error(result)
    }

    fn flush_with(&mut self, reason: FlushReason) -> Result<(), StreamError> {
        let (flusher, sink) = match (self.flusher.as_mut(), self.sink.as_mut()) {
            (Some(f), Some(s)) => (f, s),
            _ => return Err(UsageError::NotOpen.into()),
        };

        let was_empty = self.buffer.is_empty();
        let outcome = flusher.flush(&mut self.buffer, sink.as_mut(), self.tracker.current(), reason)?;

        self.counters.add_flush(reason, was_empty);
        self.counters.add_reset();
        self.timer.add_stage_time(Stage::Reset, outcome.reset_time);
        if let Some(frame) = outcome.frame {
            self.timer.add_stage_time(Stage::Compress, outcome.compress_time);
            self.counters.add_frame(frame.class, frame.compressed_len);
            if self.config.record_frames {
                self.frames.push(frame);
            }
        }
        Ok(())
    }

    /// Final flush, then release the context and close the sink.
    ///
    /// Idempotent. On a failed stream nothing more is flushed and buffered bytes are dropped.
    pub fn close(&mut self) -> Result<(), StreamError> {
        match self.state {
            WriterState::Closed => Ok(()),
            WriterState::Idle => {
                self.pending_sink = None;
                self.finish_state();
                Ok(())
            }
            WriterState::Failed => {
                if !self.buffer.is_empty() {
                    warn!(discarded = self.buffer.len(), "closing failed stream, buffered bytes dropped");
                    self.counters.add_discard(self.buffer.len());
                }
                self.buffer.clear();
                self.release();
                self.finish_state();
                Ok(())
            }
            WriterState::Open => {
                let result = self.flush_with(FlushReason::Close).and_then(|()| {
                    match self.sink.as_mut() {
                        Some(sink) => sink.flush().map_err(StreamError::from),
                        None => Ok(()),
                    }
                });
                self.release();
                self.finish_state();
                result
            }
        }
    }

    /// Close if needed and return the final telemetry.
    pub fn finish(mut self) -> Result<TelemetrySnapshot, StreamError> {
        self.close()?;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snapshot = TelemetrySnapshot::from(&self.counters, &self.timer, &self.frames);
        if let Some(buf) = &self.capture {
            if let Ok(bytes) = captured_bytes(buf) {
                snapshot.attach_output(bytes);
            }
        }
        snapshot
    }

    fn ensure_open(&self) -> Result<(), UsageError> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Idle => Err(UsageError::NotOpen),
            WriterState::Closed => Err(UsageError::WriteAfterClose),
            WriterState::Failed => Err(UsageError::StreamFailed),
        }
    }

    fn fail_on_error<T>(&mut self, result: Result<T, StreamError>) -> Result<T, StreamError> {
        if let Err(e) = &result {
            if e.is_fatal() && self.state != WriterState::Closed {
                warn!(error = %e, "stream failed");
                self.state = WriterState::Failed;
            }
        }
        result
    }

    fn release(&mut self) {
        self.flusher = None;
        self.sink = None;
    }

    fn finish_state(&mut self) {
        self.timer.finish();
        self.state = WriterState::Closed;
    }
}

impl ArchiveCallbacks for SplitWriter {
    fn open(&mut self) -> Result<(), StreamError> {
        SplitWriter::open(self)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.ingest(buf)
    }

    fn close(&mut self) -> Result<(), StreamError> {
        SplitWriter::close(self)
    }
}

/// Byte-stream adapter. Each call ingests at most `capacity - 1` bytes, so
/// `write_all` splits large payloads within the current segment.
impl Write for SplitWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.buffer.capacity() - 1);
        Ok(self.ingest(&buf[..n])?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_frame()?;
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl Drop for SplitWriter {
    fn drop(&mut self) {
        if self.state == WriterState::Open {
            if let Err(e) = self.close() {
                warn!(error = %e, "close on drop failed");
            }
        }
    }
}
