//! constants.rs
//! Sanity bounds shared by the ingest buffer and the configuration layer.

/// Smallest ingest buffer we accept. Anything smaller turns every write into a frame.
pub const MIN_BUFFER_CAPACITY: usize = 16;

/// Max ingest buffer sanity bound (32 MiB).
pub const MAX_BUFFER_CAPACITY: usize = 32 * 1024 * 1024;

/// Upper bound for internal zstd worker threads per context.
pub const MAX_WORKERS: u32 = 64;

/// zstd window log bounds (64-bit targets).
pub const WINDOW_LOG_MIN: u32 = 10;
pub const WINDOW_LOG_MAX: u32 = 31;
