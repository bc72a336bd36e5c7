//! compression/types.rs
//! Segment classes, zstd search strategies and compression errors.
use std::fmt;

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compression::constants::strategy_ids;

/// Semantic class of a caller-declared segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentClass {
    /// Archive metadata: small, highly regular.
    Header,
    /// Entry payload: arbitrary data.
    Content,
}

impl fmt::Display for SegmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentClass::Header  => "header",
            SegmentClass::Content => "content",
        };
        f.write_str(name)
    }
}

/// zstd match-finder strategy. Raw values mirror `ZSTD_strategy`.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    Fast     = strategy_ids::FAST,
    DFast    = strategy_ids::DFAST,
    Greedy   = strategy_ids::GREEDY,
    Lazy     = strategy_ids::LAZY,
    Lazy2    = strategy_ids::LAZY2,
    BtLazy2  = strategy_ids::BTLAZY2,
    BtOpt    = strategy_ids::BTOPT,
    BtUltra  = strategy_ids::BTULTRA,
    BtUltra2 = strategy_ids::BTULTRA2,
}

impl SearchStrategy {
    /// Resolve a raw strategy id, rejecting anything zstd does not define.
    pub fn from_raw(raw: u8) -> Result<Self, CompressionError> {
        Self::try_from_primitive(raw).map_err(|_| CompressionError::UnknownStrategy { raw })
    }

    pub fn to_zstd(self) -> zstd_safe::Strategy {
        use zstd_safe::zstd_sys::ZSTD_strategy::*;
        match self {
            SearchStrategy::Fast     => ZSTD_fast,
            SearchStrategy::DFast    => ZSTD_dfast,
            SearchStrategy::Greedy   => ZSTD_greedy,
            SearchStrategy::Lazy     => ZSTD_lazy,
            SearchStrategy::Lazy2    => ZSTD_lazy2,
            SearchStrategy::BtLazy2  => ZSTD_btlazy2,
            SearchStrategy::BtOpt    => ZSTD_btopt,
            SearchStrategy::BtUltra  => ZSTD_btultra,
            SearchStrategy::BtUltra2 => ZSTD_btultra2,
        }
    }
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompressionError {
    #[error("failed to allocate zstd compression context")]
    ContextInit,

    #[error("compression context has no profile applied")]
    NotConfigured,

    /// The engine rejected a parameter or failed mid-frame.
    #[error("zstd {op} failed: {name} (code {code})")]
    Engine { op: &'static str, code: usize, name: &'static str },

    #[error("unknown search strategy: {}", enum_name_or_hex::<SearchStrategy>(*raw))]
    UnknownStrategy { raw: u8 },
}

impl CompressionError {
    pub fn engine(op: &'static str, code: zstd_safe::ErrorCode) -> Self {
        CompressionError::Engine { op, code, name: zstd_safe::get_error_name(code) }
    }
}
