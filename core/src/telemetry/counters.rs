//! telemetry/counters.rs
//! Mutable counters collected while a stream is written.
//!
//! Converted into an immutable `TelemetrySnapshot` on demand.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::compression::SegmentClass;
use crate::stream::FlushReason;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub frames_header: u64,
    pub frames_content: u64,
    pub bytes_ingested: u64,
    pub bytes_compressed: u64,
    /// Ingested bytes dropped unflushed when a failed stream was closed.
    pub bytes_discarded: u64,
    pub flushes_boundary: u64,
    pub flushes_mandatory: u64,
    pub flushes_explicit: u64,
    pub flushes_close: u64,
    /// Flushes that found the buffer empty and only reset the context.
    pub flushes_empty: u64,
    pub context_resets: u64,
}

impl TelemetryCounters {
    /// Record bytes accepted into the ingest buffer.
    pub fn add_ingest(&mut self, len: usize) {
        self.bytes_ingested += len as u64;
    }

    pub fn add_discard(&mut self, len: usize) {
        self.bytes_discarded += len as u64;
    }

    /// Ingested bytes that reached (or are still waiting for) a frame.
    pub fn bytes_retained(&self) -> u64 {
        self.bytes_ingested.saturating_sub(self.bytes_discarded)
    }

    /// Record one closed frame.
    pub fn add_frame(&mut self, class: SegmentClass, compressed_len: u64) {
        match class {
            SegmentClass::Header  => self.frames_header += 1,
            SegmentClass::Content => self.frames_content += 1,
        }
        self.bytes_compressed += compressed_len;
    }

    pub fn add_flush(&mut self, reason: FlushReason, empty: bool) {
        match reason {
            FlushReason::Boundary  => self.flushes_boundary += 1,
            FlushReason::Mandatory => self.flushes_mandatory += 1,
            FlushReason::Explicit  => self.flushes_explicit += 1,
            FlushReason::Close     => self.flushes_close += 1,
        }
        if empty {
            self.flushes_empty += 1;
        }
    }

    pub fn add_reset(&mut self) {
        self.context_resets += 1;
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_header + self.frames_content
    }

    /// Fold counters from another stream into this one.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.frames_header += other.frames_header;
        self.frames_content += other.frames_content;
        self.bytes_ingested += other.bytes_ingested;
        self.bytes_compressed += other.bytes_compressed;
        self.bytes_discarded += other.bytes_discarded;
        self.flushes_boundary += other.flushes_boundary;
        self.flushes_mandatory += other.flushes_mandatory;
        self.flushes_explicit += other.flushes_explicit;
        self.flushes_close += other.flushes_close;
        self.flushes_empty += other.flushes_empty;
        self.context_resets += other.context_resets;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
