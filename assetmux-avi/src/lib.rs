//! Uncompressed AVI export
//!
//! This crate writes RIFF/AVI files from already-decoded animation frames,
//! an optional palette and PCM audio, with no external codec or muxer.
//!
//! # Features
//!
//! - Fixed-layout header records (AVIMAINHEADER, AVISTREAMHEADER,
//!   BITMAPINFOHEADER, WAVEFORMATEX) rendered field by field
//! - Generic RIFF list/chunk tree writer with size backpatching
//! - One `DIB ` video stream (`00db`) and one PCM audio stream (`01wb`)
//! - In-memory staging for destinations that cannot seek
//!
//! # Example
//!
//! ```no_run
//! use assetmux_avi::AviMuxer;
//!
//! let mut muxer = AviMuxer::default();
//! muxer.initialize_video_stream(64, 48, 10, 8, None)?;
//! for _ in 0..3 {
//!     muxer.add_video_frame(vec![0u8; 64 * 48])?;
//! }
//! muxer.write_to_path("animation.avi")?;
//! # Ok::<(), assetmux_avi::AviError>(())
//! ```

pub mod chunks;
pub mod encode;
mod error;
mod muxer;
mod palette;
pub mod staging;
pub mod types;
pub mod writer;

pub use chunks::{Body, ChunkType, FourCC, HeaderRecord, Node};
pub use encode::{Field, FieldType};
pub use error::{AviError, Result};
pub use muxer::{AviMuxer, MuxerConfig};
pub use palette::{ColorOrder, Palette};
pub use types::{AviFlags, BitmapFormat, FileHeader, Rect, StreamHeader, StreamType, WaveFormat};
pub use writer::{write_riff, WriterOptions};
