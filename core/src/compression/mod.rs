//! compression/mod.rs
//! Segment-class profiles and the single reusable zstd context.
//!
//! Notes:
//! - One profile per segment class; the class is derived from the segment index parity.
//! - The context is reset with the next profile after every closed frame.
//! - Frames are always fully terminated before the context is reused.

pub mod constants;
pub mod types;
pub mod profiles;
pub mod context;

pub use constants::*;
pub use types::*;
pub use profiles::*;
pub use context::*;
