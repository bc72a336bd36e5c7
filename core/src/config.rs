//! config.rs
//! Writer configuration: buffer sizing, profile table and class policy.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd_safe::CCtx;

use crate::compression::{ClassPolicy, ProfileTable, SegmentClass};
use crate::constants::{MAX_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("buffer capacity {have} outside {min}..={max}")]
    CapacityOutOfRange { have: usize, min: usize, max: usize },

    #[error("{class} level {level} outside {min}..={max}")]
    LevelOutOfRange { class: SegmentClass, level: i32, min: i32, max: i32 },

    #[error("{class} workers {workers} exceeds {max}")]
    TooManyWorkers { class: SegmentClass, workers: u32, max: u32 },

    #[error("{class} window log {window_log} out of range")]
    WindowLogOutOfRange { class: SegmentClass, window_log: u32 },

    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Ingest buffer size. A single write must stay below it.
    #[serde(default = "default_capacity")]
    pub buffer_capacity: usize,

    #[serde(default)]
    pub profiles: ProfileTable,

    #[serde(default)]
    pub class_policy: ClassPolicy,

    /// Keep a `FrameRecord` per closed frame in the telemetry snapshot.
    /// Off by default: the log grows by one record per frame for the life of the stream.
    #[serde(default)]
    pub record_frames: bool,
}

/// zstd's recommended streaming input size.
fn default_capacity() -> usize {
    CCtx::in_size()
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_capacity(),
            profiles: ProfileTable::default(),
            class_policy: ClassPolicy::default(),
            record_frames: false,
        }
    }
}

impl WriterConfig {
    pub fn new(buffer_capacity: usize) -> Self {
        Self { buffer_capacity, ..Self::default() }
    }

    pub fn with_profiles(mut self, profiles: ProfileTable) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_class_policy(mut self, policy: ClassPolicy) -> Self {
        self.class_policy = policy;
        self
    }

    pub fn with_frame_log(mut self, enabled: bool) -> Self {
        self.record_frames = enabled;
        self
    }

    /// Parse a JSON document; missing fields take their defaults. The result is validated.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: WriterConfig = serde_json::from_str(doc)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BUFFER_CAPACITY..=MAX_BUFFER_CAPACITY).contains(&self.buffer_capacity) {
            return Err(ConfigError::CapacityOutOfRange {
                have: self.buffer_capacity,
                min: MIN_BUFFER_CAPACITY,
                max: MAX_BUFFER_CAPACITY,
            });
        }
        self.profiles.validate()
    }
}
