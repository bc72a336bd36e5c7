//! compression/context.rs
//!
//! Reusable zstd compression context.
//!
//! Design notes:
//! - Exactly one `CCtx` per stream, owned by the frame flusher.
//! - `reset_to` drops session and parameters, then applies one profile.
//! - `compress_frame` feeds the whole input in end-of-frame mode and drains
//!   until zstd reports nothing left, so no frame state survives the call.
use std::io::Write;

use tracing::{debug, trace};
use zstd_safe::{zstd_sys::ZSTD_EndDirective, CCtx, CParameter, InBuffer, OutBuffer, ResetDirective};

use crate::compression::profiles::CompressionProfile;
use crate::compression::types::{CompressionError, SegmentClass};
use crate::types::StreamError;

/// Segment and class the context is currently configured for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActiveProfile {
    pub segment: u64,
    pub class: SegmentClass,
    pub profile: CompressionProfile,
}

/// Result of one closed frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameOutput {
    pub raw_len: usize,
    pub compressed_len: u64,
    pub blocks: u32,
}

pub struct CompressionContext {
    cctx: CCtx<'static>,
    out: Vec<u8>,
    active: Option<ActiveProfile>,
}

impl CompressionContext {
    /// Allocate the context and its output block buffer.
    ///
    /// # Errors
    /// - `CompressionError::ContextInit` if zstd cannot allocate a context.
    pub fn new() -> Result<Self, CompressionError> {
        let cctx = CCtx::try_create().ok_or(CompressionError::ContextInit)?;
        Ok(Self {
            cctx,
            out: vec![0u8; CCtx::out_size()],
            active: None,
        })
    }

    /// Profile applied by the last successful reset, if any.
    pub fn configured(&self) -> Option<&ActiveProfile> {
        self.active.as_ref()
    }

    /// Fully reset session and parameters, then apply `profile`.
    ///
    /// On error the context is left unconfigured.
    pub fn reset_to(
        &mut self,
        segment: u64,
        class: SegmentClass,
        profile: &CompressionProfile,
    ) -> Result<(), CompressionError> {
        self.active = None;
        self.cctx
            .reset(ResetDirective::SessionAndParameters)
            .map_err(|code| CompressionError::engine("reset", code))?;

        self.set(CParameter::CompressionLevel(profile.level))?;
        self.set(CParameter::Strategy(profile.strategy.to_zstd()))?;
        self.set(CParameter::NbWorkers(profile.workers))?;
        self.set(CParameter::ChecksumFlag(profile.checksum))?;
        if let Some(log) = profile.window_log {
            self.set(CParameter::WindowLog(log))?;
        }

        debug!(
            segment,
            %class,
            level = profile.level,
            strategy = ?profile.strategy,
            workers = profile.workers,
            "compression context reset"
        );
        self.active = Some(ActiveProfile { segment, class, profile: *profile });
        Ok(())
    }

    fn set(&mut self, param: CParameter) -> Result<(), CompressionError> {
        self.cctx
            .set_parameter(param)
            .map(|_| ())
            .map_err(|code| CompressionError::engine("set_parameter", code))
    }

    /// Compress `data` into one self-terminated frame, writing every produced
    /// block to `sink` in order.
    ///
    /// Blocks already written stay in the sink if a later step fails; the caller
    /// must treat such a trailing frame as unusable.
    pub fn compress_frame(
        &mut self,
        data: &[u8],
        sink: &mut dyn Write,
    ) -> Result<FrameOutput, StreamError> {
        let mut input = InBuffer::around(data);
        let mut compressed_len = 0u64;
        let mut blocks = 0u32;

        loop {
            let (remaining, produced) = {
                let mut output = OutBuffer::around(self.out.as_mut_slice());
                let remaining = self
                    .cctx
                    .compress_stream2(&mut output, &mut input, ZSTD_EndDirective::ZSTD_e_end)
                    .map_err(|code| CompressionError::engine("compress_stream2", code))?;
                (remaining, output.pos())
            };

            if produced > 0 {
                sink.write_all(&self.out[..produced])?;
                compressed_len += produced as u64;
                blocks += 1;
            }
            trace!(written = produced, remaining, "compressed block");

            if remaining == 0 {
                break;
            }
        }

        Ok(FrameOutput { raw_len: data.len(), compressed_len, blocks })
    }
}
