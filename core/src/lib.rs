//! tarzst-core
//!
//! Compression backend for streaming archive writers.
//! Splits one interleaved header/content byte stream into independently
//! terminated zstd frames, each compressed under its segment class's profile.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod types;

pub mod compression;
pub mod telemetry;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{ClassPolicy, CompressionProfile, ProfileTable, SearchStrategy, SegmentClass};
    pub use crate::config::WriterConfig;
    pub use crate::stream::{ArchiveCallbacks, FlushReason, OutputSink, SplitWriter, WriterState};
    pub use crate::telemetry::{FrameRecord, TelemetrySnapshot};
    pub use crate::types::{StreamError, UsageError};
}
