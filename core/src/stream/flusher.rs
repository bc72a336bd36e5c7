//! stream/flusher.rs
//! Drains the ingest buffer through the compression context into the sink.
use std::io::Write;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compression::{ClassPolicy, CompressionContext, CompressionError, ProfileTable};
use crate::stream::buffer::IngestBuffer;
use crate::telemetry::FrameRecord;
use crate::types::StreamError;

/// Why a frame was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushReason {
    /// A declared segment change was consumed by a write.
    Boundary,
    /// The next write would not fit the buffer (within-segment split).
    Mandatory,
    /// Caller asked for it.
    Explicit,
    /// Stream shutdown.
    Close,
}

#[derive(Debug, Default)]
pub struct FlushOutcome {
    /// `None` when the buffer was empty and only the context was reset.
    pub frame: Option<FrameRecord>,
    pub compress_time: Duration,
    pub reset_time: Duration,
}

pub struct FrameFlusher {
    context: CompressionContext,
    profiles: ProfileTable,
    policy: ClassPolicy,
    next_sequence: u64,
}

impl FrameFlusher {
    pub fn new(profiles: ProfileTable, policy: ClassPolicy) -> Result<Self, CompressionError> {
        Ok(Self {
            context: CompressionContext::new()?,
            profiles,
            policy,
            next_sequence: 0,
        })
    }

    pub fn context(&self) -> &CompressionContext {
        &self.context
    }

    /// Frames closed so far.
    pub fn frames_emitted(&self) -> u64 {
        self.next_sequence
    }

    /// Reset the context to the profile of `segment`'s class.
    pub fn reset_for_segment(&mut self, segment: u64) -> Result<(), CompressionError> {
        let class = self.policy.class_of(segment);
        let profile = *self.profiles.lookup(class);
        self.context.reset_to(segment, class, &profile)
    }

    /// Close the open frame (if any bytes are buffered) and reconfigure for `segment`.
    ///
    /// The reset happens even when the buffer is empty so the context always
    /// matches the segment that governs the next write.
    pub fn flush(
        &mut self,
        buffer: &mut IngestBuffer,
        sink: &mut dyn Write,
        segment: u64,
        reason: FlushReason,
    ) -> Result<FlushOutcome, StreamError> {
        let mut outcome = FlushOutcome::default();

        if !buffer.is_empty() {
            let active = *self.context.configured().ok_or(CompressionError::NotConfigured)?;
            let start = Instant::now();
            let out = self.context.compress_frame(buffer.as_slice(), sink)?;
            outcome.compress_time = start.elapsed();

            let record = FrameRecord {
                sequence: self.next_sequence,
                segment: active.segment,
                class: active.class,
                reason,
                raw_len: out.raw_len,
                compressed_len: out.compressed_len,
            };
            self.next_sequence += 1;
            buffer.clear();

            debug!(
                sequence = record.sequence,
                segment = record.segment,
                class = %record.class,
                reason = ?reason,
                raw = record.raw_len,
                compressed = record.compressed_len,
                blocks = out.blocks,
                "frame closed"
            );
            outcome.frame = Some(record);
        }

        let start = Instant::now();
        self.reset_for_segment(segment)?;
        outcome.reset_time = start.elapsed();
        Ok(outcome)
    }
}
