//! telemetry/snapshot.rs
//!
//! Immutable view of a stream's counters, timings and closed frames.
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::compression::SegmentClass;
use crate::stream::FlushReason;
use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

/// One closed frame, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Zero-based position of the frame in the output.
    pub sequence: u64,
    /// Segment the context was configured for while this frame was compressed.
    pub segment: u64,
    pub class: SegmentClass,
    pub reason: FlushReason,
    pub raw_len: usize,
    pub compressed_len: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub frames_header: u64,
    pub frames_content: u64,
    pub bytes_ingested: u64,
    pub bytes_compressed: u64,
    pub bytes_discarded: u64,
    pub flushes_boundary: u64,
    pub flushes_mandatory: u64,
    pub flushes_explicit: u64,
    pub flushes_close: u64,
    pub flushes_empty: u64,
    pub context_resets: u64,
    pub compression_ratio: f64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
    pub frames: Vec<FrameRecord>,
    /// Captured output for `OutputSink::Memory`.
    #[serde(skip)]
    pub output: Option<Bytes>,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer, frames: &[FrameRecord]) -> Self {
        let elapsed = timer.elapsed();

        // Discarded bytes never reached a frame, so they stay out of the ratio.
        let retained = counters.bytes_retained();
        let compression_ratio = if retained > 0 {
            counters.bytes_compressed as f64 / retained as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_ingested as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            frames_header: counters.frames_header,
            frames_content: counters.frames_content,
            bytes_ingested: counters.bytes_ingested,
            bytes_compressed: counters.bytes_compressed,
            bytes_discarded: counters.bytes_discarded,
            flushes_boundary: counters.flushes_boundary,
            flushes_mandatory: counters.flushes_mandatory,
            flushes_explicit: counters.flushes_explicit,
            flushes_close: counters.flushes_close,
            flushes_empty: counters.flushes_empty,
            context_resets: counters.context_resets,
            compression_ratio,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
            frames: frames.to_vec(),
            output: None,
        }
    }

    pub fn attach_output(&mut self, buf: Vec<u8>) {
        self.output = Some(Bytes::from(buf));
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_header + self.frames_content
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    /// Internal consistency:
    /// - recorded frames (if any) match the frame counters and byte totals
    /// - `total_stage_time() <= elapsed`
    pub fn sanity_check(&self) -> bool {
        let frames_ok = self.frames.is_empty()
            || (self.frames.len() as u64 == self.frames_total()
                && self.frames.iter().map(|f| f.raw_len as u64).sum::<u64>() <= self.bytes_ingested
                && self.frames.iter().map(|f| f.compressed_len).sum::<u64>() == self.bytes_compressed);
        frames_ok && self.total_stage_time() <= self.elapsed
    }

    /// Frames compressed under `class`, in emission order.
    pub fn frames_of(&self, class: SegmentClass) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter().filter(move |f| f.class == class)
    }

    pub fn output_bytes(&self) -> u64 {
        self.bytes_compressed
    }
}
