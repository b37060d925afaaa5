//! AVI header records
//!
//! Each record holds its semantic fields and renders itself through
//! [`encode_fields`]. Fields that have no sensible default are `Option`s;
//! rendering a record with one of them unset fails with
//! [`AviError::IncompleteHeader`](crate::AviError::IncompleteHeader).
//! Derived values (block alignment, byte rate) are computed at render time.

use crate::chunks::FourCC;
use crate::encode::{encode_fields, encoded_len, Field, FieldType};
use crate::error::Result;
use crate::palette::Palette;
use std::fmt;
use std::io::Write;

/// Main AVI header (avih chunk, AVIMAINHEADER)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Frame interval in microseconds
    pub microseconds_per_frame: Option<u32>,
    /// Approximate maximum data rate
    pub max_bytes_per_sec: u32,
    /// Pad data to multiples of this value
    pub padding_granularity: u32,
    /// AVI flags
    pub flags: AviFlags,
    /// Total number of frames, caller supplied
    pub total_frames: u32,
    /// Initial frames (interleaved files only)
    pub initial_frames: u32,
    /// Number of streams
    pub streams: u32,
    /// Suggested buffer size, zero lets the player decide
    pub suggested_buffer_size: u32,
    /// Frame width in pixels
    pub width: Option<i32>,
    /// Frame height in pixels, negative for top-down
    pub height: Option<i32>,
    pub reserved: [u32; 4],
}

impl FileHeader {
    pub const RECORD: &'static str = "FileHeader";
    /// Encoded size in bytes
    pub const SIZE: usize = 56;

    /// Frame rate implied by the frame interval
    pub fn frame_rate(&self) -> Option<f64> {
        match self.microseconds_per_frame {
            Some(usec) if usec > 0 => Some(1_000_000.0 / usec as f64),
            _ => None,
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::u32("microseconds_per_frame", self.microseconds_per_frame),
            Field::u32("max_bytes_per_sec", self.max_bytes_per_sec),
            Field::u32("padding_granularity", self.padding_granularity),
            Field::u32("flags", self.flags.to_u32()),
            Field::u32("total_frames", self.total_frames),
            Field::u32("initial_frames", self.initial_frames),
            Field::u32("streams", self.streams),
            Field::u32("suggested_buffer_size", self.suggested_buffer_size),
            Field::i32("width", self.width),
            Field::i32("height", self.height),
            Field::u32("reserved0", self.reserved[0]),
            Field::u32("reserved1", self.reserved[1]),
            Field::u32("reserved2", self.reserved[2]),
            Field::u32("reserved3", self.reserved[3]),
        ]
    }

    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<()> {
        encode_fields(Self::RECORD, &self.fields(), sink)
    }

    pub fn render(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::SIZE);
        self.encode(&mut out)?;
        Ok(out)
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        FileHeader {
            microseconds_per_frame: None,
            max_bytes_per_sec: 0,
            padding_granularity: 1,
            flags: AviFlags::default(),
            total_frames: 0,
            initial_frames: 0,
            streams: 1,
            suggested_buffer_size: 0,
            width: None,
            height: None,
            reserved: [0; 4],
        }
    }
}

/// AVI header flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AviFlags {
    /// File has an index
    pub has_index: bool,
    /// File must use index
    pub must_use_index: bool,
    /// File is interleaved
    pub is_interleaved: bool,
    /// Trust chunk type for seeking
    pub trust_chunk_type: bool,
    /// File was captured
    pub was_captured: bool,
    /// File is copyrighted
    pub is_copyrighted: bool,
}

impl AviFlags {
    pub fn from_u32(value: u32) -> Self {
        AviFlags {
            has_index: (value & 0x10) != 0,
            must_use_index: (value & 0x20) != 0,
            is_interleaved: (value & 0x100) != 0,
            trust_chunk_type: (value & 0x800) != 0,
            was_captured: (value & 0x10000) != 0,
            is_copyrighted: (value & 0x20000) != 0,
        }
    }

    pub fn to_u32(self) -> u32 {
        [
            (self.has_index, 0x10),
            (self.must_use_index, 0x20),
            (self.is_interleaved, 0x100),
            (self.trust_chunk_type, 0x800),
            (self.was_captured, 0x10000),
            (self.is_copyrighted, 0x20000),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, bit)| acc | bit)
    }
}

/// Stream type carried in the strh chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Video,
    Audio,
}

impl StreamType {
    pub fn to_fourcc(self) -> FourCC {
        match self {
            StreamType::Video => FourCC(*b"vids"),
            StreamType::Audio => FourCC(*b"auds"),
        }
    }

    pub fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match fourcc.as_bytes() {
            b"vids" => Some(StreamType::Video),
            b"auds" => Some(StreamType::Audio),
            _ => None,
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamType::Video => "video",
            StreamType::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Destination rectangle of a stream, stored as four int16 values
///
/// Kept as `i32` so an oversized frame reports a field overflow at write
/// time instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Stream header (strh chunk, AVISTREAMHEADER)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Stream type (vids, auds, ...)
    pub stream_type: Option<StreamType>,
    /// Preferred handler FourCC
    pub handler: FourCC,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    /// Frames before this stream starts (interleaved files only)
    pub initial_frames: u32,
    /// Time scale
    pub scale: u32,
    /// Rate, samples per second = rate / scale
    pub rate: Option<u32>,
    pub start: u32,
    /// Frame count for video, zero for audio
    pub length: u32,
    pub suggested_buffer_size: u32,
    /// -1 selects the driver's default quality
    pub quality: i32,
    pub sample_size: u32,
    pub frame: Rect,
}

impl StreamHeader {
    pub const RECORD: &'static str = "StreamHeader";
    /// Encoded size in bytes
    pub const SIZE: usize = 56;

    pub fn new(stream_type: StreamType, rate: u32) -> Self {
        StreamHeader {
            stream_type: Some(stream_type),
            rate: Some(rate),
            ..Default::default()
        }
    }

    /// Samples (or frames) per second, informational only
    pub fn samples_per_second(&self) -> Option<f64> {
        match (self.rate, self.scale) {
            (Some(rate), scale) if scale > 0 => Some(rate as f64 / scale as f64),
            _ => None,
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::new(
                "stream_type",
                FieldType::U32,
                self.stream_type.map(|t| t.to_fourcc().to_le_u32() as i64),
            ),
            Field::u32("handler", self.handler.to_le_u32()),
            Field::u32("flags", self.flags),
            Field::u16("priority", self.priority),
            Field::u16("language", self.language),
            Field::u32("initial_frames", self.initial_frames),
            Field::u32("scale", self.scale),
            Field::u32("rate", self.rate),
            Field::u32("start", self.start),
            Field::u32("length", self.length),
            Field::u32("suggested_buffer_size", self.suggested_buffer_size),
            Field::i32("quality", self.quality),
            Field::u32("sample_size", self.sample_size),
            Field::new("frame_left", FieldType::I16, Some(self.frame.left.into())),
            Field::new("frame_top", FieldType::I16, Some(self.frame.top.into())),
            Field::new("frame_right", FieldType::I16, Some(self.frame.right.into())),
            Field::new("frame_bottom", FieldType::I16, Some(self.frame.bottom.into())),
        ]
    }

    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<()> {
        encode_fields(Self::RECORD, &self.fields(), sink)
    }

    pub fn render(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::SIZE);
        self.encode(&mut out)?;
        Ok(out)
    }
}

impl Default for StreamHeader {
    fn default() -> Self {
        StreamHeader {
            stream_type: None,
            handler: FourCC(*b"DIB "),
            flags: 0,
            priority: 0,
            language: 0,
            initial_frames: 0,
            scale: 1,
            rate: None,
            start: 0,
            length: 0,
            suggested_buffer_size: 0,
            quality: -1,
            sample_size: 0,
            frame: Rect::default(),
        }
    }
}

/// Video format (strf chunk of a video stream, BITMAPINFOHEADER)
///
/// An optional RGB palette follows the fixed fields with no length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapFormat {
    /// Width in pixels
    pub width: Option<i32>,
    /// Height in pixels, negative for top-down
    pub height: Option<i32>,
    /// Always 1
    pub planes: u16,
    pub bit_count: Option<u16>,
    /// Zero for uncompressed RGB
    pub compression: u32,
    /// May be zero for uncompressed bitmaps
    pub image_size: u32,
    pub x_pels_per_meter: u32,
    pub y_pels_per_meter: u32,
    pub colors_used: u32,
    pub colors_important: u32,
    pub palette: Option<Palette>,
}

impl BitmapFormat {
    pub const RECORD: &'static str = "BitmapFormat";
    /// Size of the fixed fields, also the first field's value
    pub const STRUCTURE_SIZE: u32 = 0x28;

    pub fn is_top_down(&self) -> bool {
        self.height.is_some_and(|h| h < 0)
    }

    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::u32("structure_size", Self::STRUCTURE_SIZE),
            Field::i32("width", self.width),
            Field::i32("height", self.height),
            Field::u16("planes", self.planes),
            Field::u16("bit_count", self.bit_count),
            Field::u32("compression", self.compression),
            Field::u32("image_size", self.image_size),
            Field::u32("x_pels_per_meter", self.x_pels_per_meter),
            Field::u32("y_pels_per_meter", self.y_pels_per_meter),
            Field::u32("colors_used", self.colors_used),
            Field::u32("colors_important", self.colors_important),
        ]
    }

    /// Encoded size including the palette
    pub fn encoded_len(&self) -> usize {
        encoded_len(&self.fields()) + self.palette.as_ref().map_or(0, |p| p.as_bytes().len())
    }

    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<()> {
        encode_fields(Self::RECORD, &self.fields(), sink)?;
        if let Some(palette) = &self.palette {
            sink.write_all(palette.as_bytes())?;
        }
        Ok(())
    }

    pub fn render(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out)?;
        Ok(out)
    }
}

impl Default for BitmapFormat {
    fn default() -> Self {
        BitmapFormat {
            width: None,
            height: None,
            planes: 1,
            bit_count: None,
            compression: 0,
            image_size: 0,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
            palette: None,
        }
    }
}

/// Audio format (strf chunk of an audio stream, PCM WAVEFORMATEX)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFormat {
    /// 1 = WAVE_FORMAT_PCM
    pub format_tag: u16,
    pub channels: Option<u16>,
    pub samples_per_sec: Option<u32>,
    pub bits_per_sample: Option<u16>,
    /// Size of extra format bytes, zero for PCM
    pub extra_size: u16,
}

impl WaveFormat {
    pub const RECORD: &'static str = "WaveFormat";
    /// Encoded size in bytes
    pub const SIZE: usize = 18;
    pub const PCM: u16 = 1;

    /// Channel count times bits per sample
    ///
    /// Existing exports were written with this value; it is not divided
    /// down to bytes.
    pub fn block_align(&self) -> Option<i64> {
        Some(i64::from(self.channels?) * i64::from(self.bits_per_sample?))
    }

    /// Sample rate times block alignment
    pub fn avg_bytes_per_sec(&self) -> Option<i64> {
        Some(i64::from(self.samples_per_sec?) * self.block_align()?)
    }

    pub fn fields(&self) -> Vec<Field> {
        vec![
            Field::u16("format_tag", self.format_tag),
            Field::u16("channels", self.channels),
            Field::u32("samples_per_sec", self.samples_per_sec),
            Field::new("avg_bytes_per_sec", FieldType::U32, self.avg_bytes_per_sec()),
            Field::new("block_align", FieldType::U16, self.block_align()),
            Field::u16("bits_per_sample", self.bits_per_sample),
            Field::u16("extra_size", self.extra_size),
        ]
    }

    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<()> {
        encode_fields(Self::RECORD, &self.fields(), sink)
    }

    pub fn render(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::SIZE);
        self.encode(&mut out)?;
        Ok(out)
    }
}

impl Default for WaveFormat {
    fn default() -> Self {
        WaveFormat {
            format_tag: Self::PCM,
            channels: None,
            samples_per_sec: None,
            bits_per_sample: None,
            extra_size: 0,
        }
    }
}
