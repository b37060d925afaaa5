//! RGB palettes for 8-bit video streams
//!
//! The strf chunk stores palette entries as three bytes in red-green-blue
//! order. Game data usually stores four-byte entries, sometimes in
//! blue-green-red order, so [`Palette::from_padded`] normalises those.

use crate::error::{AviError, Result};

/// Component order of a source palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

/// A palette of 3-byte RGB entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    rgb: Vec<u8>,
}

impl Palette {
    /// Entry size in the encoded palette
    pub const ENTRY_SIZE: usize = 3;

    /// Wrap a buffer that is already 3-byte RGB entries
    pub fn from_rgb(rgb: Vec<u8>) -> Result<Self> {
        if rgb.len() % Self::ENTRY_SIZE != 0 {
            return Err(AviError::InvalidPalette(format!(
                "{} bytes is not a whole number of RGB entries",
                rgb.len()
            )));
        }
        Ok(Palette { rgb })
    }

    /// Read `entry_count` 4-byte entries, dropping the pad byte
    pub fn from_padded(data: &[u8], entry_count: usize, order: ColorOrder) -> Result<Self> {
        let needed = entry_count.checked_mul(4).ok_or_else(|| {
            AviError::InvalidPalette(format!("{} entries is too many", entry_count))
        })?;
        if data.len() < needed {
            return Err(AviError::InvalidPalette(format!(
                "need {} bytes for {} entries, have {}",
                needed,
                entry_count,
                data.len()
            )));
        }

        Ok(Self::collect(data[..needed].chunks_exact(4), order))
    }

    /// Read 3-byte entries in the given order
    pub fn from_packed(data: &[u8], order: ColorOrder) -> Result<Self> {
        if data.len() % Self::ENTRY_SIZE != 0 {
            return Err(AviError::InvalidPalette(format!(
                "{} bytes is not a whole number of 3-byte entries",
                data.len()
            )));
        }

        Ok(Self::collect(data.chunks_exact(3), order))
    }

    fn collect<'a>(entries: impl Iterator<Item = &'a [u8]>, order: ColorOrder) -> Self {
        let mut rgb = Vec::new();
        for entry in entries {
            match order {
                ColorOrder::Rgb => rgb.extend_from_slice(&[entry[0], entry[1], entry[2]]),
                ColorOrder::Bgr => rgb.extend_from_slice(&[entry[2], entry[1], entry[0]]),
            }
        }
        Palette { rgb }
    }

    pub fn entry_count(&self) -> usize {
        self.rgb.len() / Self::ENTRY_SIZE
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgb
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.rgb
    }
}
