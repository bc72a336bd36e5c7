//! stream/mod.rs
//! Segment-aligned dual-profile zstd writer.
//!
//! Layering, bottom-up:
//! - `segment`: declared vs. applied segment index
//! - `buffer`: fixed-capacity ingest buffer
//! - `flusher`: closes frames and reconfigures the context
//! - `io`: output sink normalization
//! - `writer`: the open/write/close contract used by archive writers

pub mod segment;
pub mod buffer;
pub mod flusher;
pub mod io;
pub mod writer;

pub use segment::SegmentTracker;
pub use buffer::IngestBuffer;
pub use flusher::{FlushOutcome, FlushReason, FrameFlusher};
pub use io::{open_output, OutputSink};
pub use writer::{ArchiveCallbacks, SplitWriter, WriterState};
