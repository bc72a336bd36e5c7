/// Stable strategy IDs (u8), matching zstd's `ZSTD_strategy` numbering.
pub mod strategy_ids {
    pub const FAST: u8     = 1;
    pub const DFAST: u8    = 2;
    pub const GREEDY: u8   = 3;
    pub const LAZY: u8     = 4;
    pub const LAZY2: u8    = 5;
    pub const BTLAZY2: u8  = 6;
    pub const BTOPT: u8    = 7;
    pub const BTULTRA: u8  = 8;
    pub const BTULTRA2: u8 = 9;
}

/// Content profile defaults (arbitrary payload data).
pub const DEFAULT_CONTENT_LEVEL: i32 = 13;

/// Header profile defaults (small, highly regular metadata).
pub const DEFAULT_HEADER_LEVEL: i32 = 22;

/// Internal worker threads per context, both profiles.
pub const DEFAULT_WORKERS: u32 = 2;
