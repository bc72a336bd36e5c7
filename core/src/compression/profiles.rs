//! compression/profiles.rs
//! Profile table: segment class -> zstd tuning parameters.

use serde::{Deserialize, Serialize};

use crate::compression::constants::*;
use crate::compression::types::{SearchStrategy, SegmentClass};
use crate::config::ConfigError;
use crate::constants::{MAX_WORKERS, WINDOW_LOG_MAX, WINDOW_LOG_MIN};

/// Tuning parameters applied to the context on every reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionProfile {
    pub level: i32,
    pub strategy: SearchStrategy,
    /// Internal zstd worker threads. 0 keeps compression on the calling thread.
    #[serde(default = "default_workers")]
    pub workers: u32,
    /// Append a content checksum to every frame.
    #[serde(default)]
    pub checksum: bool,
    /// Explicit window log; `None` lets the level decide.
    #[serde(default)]
    pub window_log: Option<u32>,
}

fn default_workers() -> u32 {
    DEFAULT_WORKERS
}

impl CompressionProfile {
    pub fn content() -> Self {
        Self {
            level: DEFAULT_CONTENT_LEVEL,
            strategy: SearchStrategy::BtLazy2,
            workers: DEFAULT_WORKERS,
            checksum: false,
            window_log: None,
        }
    }

    pub fn header() -> Self {
        Self {
            level: DEFAULT_HEADER_LEVEL,
            strategy: SearchStrategy::BtUltra2,
            workers: DEFAULT_WORKERS,
            checksum: false,
            window_log: None,
        }
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    /// Range-check against what the linked zstd accepts.
    pub fn validate(&self, class: SegmentClass) -> Result<(), ConfigError> {
        let (min, max) = (zstd_safe::min_c_level(), zstd_safe::max_c_level());
        if self.level < min || self.level > max {
            return Err(ConfigError::LevelOutOfRange { class, level: self.level, min, max });
        }
        if self.workers > MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers { class, workers: self.workers, max: MAX_WORKERS });
        }
        if let Some(log) = self.window_log {
            if !(WINDOW_LOG_MIN..=WINDOW_LOG_MAX).contains(&log) {
                return Err(ConfigError::WindowLogOutOfRange { class, window_log: log });
            }
        }
        Ok(())
    }
}

/// Fixed mapping from segment class to profile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTable {
    #[serde(default = "CompressionProfile::header")]
    pub header: CompressionProfile,
    #[serde(default = "CompressionProfile::content")]
    pub content: CompressionProfile,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            header: CompressionProfile::header(),
            content: CompressionProfile::content(),
        }
    }
}

impl ProfileTable {
    /// Default profiles with worker counts sized to this machine (one core left free).
    pub fn dynamic() -> Self {
        let workers = (num_cpus::get().saturating_sub(1) as u32).min(MAX_WORKERS);
        Self {
            header: CompressionProfile::header().with_workers(workers),
            content: CompressionProfile::content().with_workers(workers),
        }
    }

    pub fn lookup(&self, class: SegmentClass) -> &CompressionProfile {
        match class {
            SegmentClass::Header  => &self.header,
            SegmentClass::Content => &self.content,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.header.validate(SegmentClass::Header)?;
        self.content.validate(SegmentClass::Content)
    }
}

/// Which parity of the segment index is treated as header.
///
/// The archive glue declares one change before each header and one before each
/// payload, so with a zero start the header segments land on odd indices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassPolicy {
    #[default]
    OddIsHeader,
    EvenIsHeader,
}

impl ClassPolicy {
    pub fn class_of(self, segment: u64) -> SegmentClass {
        let odd = segment % 2 == 1;
        match (self, odd) {
            (ClassPolicy::OddIsHeader, true) | (ClassPolicy::EvenIsHeader, false) => SegmentClass::Header,
            _ => SegmentClass::Content,
        }
    }
}
