//! RIFF identifiers and the chunk tree

use crate::error::{AviError, Result};
use crate::types::{BitmapFormat, FileHeader, StreamHeader, WaveFormat};
use std::fmt;
use std::io::Write;

/// FourCC (Four Character Code) identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The tag as a little-endian dword, so encoding it back yields the
    /// literal ASCII bytes
    pub fn to_le_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", self)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(bytes: &[u8; 4]) -> Self {
        FourCC(*bytes)
    }
}

impl TryFrom<&str> for FourCC {
    type Error = AviError;

    fn try_from(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| AviError::InvalidFourCC(s.to_string()))?;
        Ok(FourCC(bytes))
    }
}

/// Well-known chunk IDs
pub mod chunk_ids {
    use super::FourCC;

    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const LIST: FourCC = FourCC(*b"LIST");
    pub const AVI: FourCC = FourCC(*b"AVI ");
    pub const HDRL: FourCC = FourCC(*b"hdrl");
    pub const AVIH: FourCC = FourCC(*b"avih");
    pub const STRL: FourCC = FourCC(*b"strl");
    pub const STRH: FourCC = FourCC(*b"strh");
    pub const STRF: FourCC = FourCC(*b"strf");
    pub const MOVI: FourCC = FourCC(*b"movi");
}

/// Stream number of the video stream
pub const VIDEO_STREAM_ID: u8 = 0;
/// Stream number of the audio stream
pub const AUDIO_STREAM_ID: u8 = 1;

/// Kind of data held in a movi chunk, the last two characters of its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    VideoUncompressed,
    Audio,
}

impl ChunkType {
    fn two_cc(self) -> [u8; 2] {
        match self {
            ChunkType::VideoUncompressed => *b"db",
            ChunkType::Audio => *b"wb",
        }
    }
}

/// Tag of a data chunk: two ASCII digits of stream number, then the type
pub fn stream_chunk_id(stream: u8, chunk_type: ChunkType) -> FourCC {
    let [a, b] = chunk_type.two_cc();
    FourCC([b'0' + (stream / 10) % 10, b'0' + stream % 10, a, b])
}

/// A header record that renders itself into a chunk payload
#[derive(Debug, Clone, Copy)]
pub enum HeaderRecord<'a> {
    File(&'a FileHeader),
    Stream(&'a StreamHeader),
    Bitmap(&'a BitmapFormat),
    Wave(&'a WaveFormat),
}

impl HeaderRecord<'_> {
    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<()> {
        match self {
            HeaderRecord::File(h) => h.encode(sink),
            HeaderRecord::Stream(h) => h.encode(sink),
            HeaderRecord::Bitmap(h) => h.encode(sink),
            HeaderRecord::Wave(h) => h.encode(sink),
        }
    }
}

/// Payload of a tree node
#[derive(Debug, Clone)]
pub enum Body<'a> {
    /// Raw sample data, size known up front
    Bytes(&'a [u8]),
    /// Header record, size measured after encoding
    Record(HeaderRecord<'a>),
    /// Nested children, written as a LIST
    List(Vec<Node<'a>>),
    /// Nothing; the node is skipped entirely
    Absent,
}

/// A named node of the RIFF tree
///
/// The tree borrows frame data and header records from their owner, so
/// building it copies no sample bytes.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    pub id: FourCC,
    pub body: Body<'a>,
}

impl<'a> Node<'a> {
    pub fn list(id: FourCC, children: Vec<Node<'a>>) -> Self {
        Node {
            id,
            body: Body::List(children),
        }
    }

    pub fn bytes(id: FourCC, data: &'a [u8]) -> Self {
        Node {
            id,
            body: Body::Bytes(data),
        }
    }

    pub fn record(id: FourCC, record: HeaderRecord<'a>) -> Self {
        Node {
            id,
            body: Body::Record(record),
        }
    }

    /// A record chunk that is skipped when `record` is `None`
    pub fn optional_record(id: FourCC, record: Option<HeaderRecord<'a>>) -> Self {
        Node {
            id,
            body: record.map_or(Body::Absent, Body::Record),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.body, Body::Absent)
    }

    pub fn children(&self) -> &[Node<'a>] {
        match &self.body {
            Body::List(children) => children,
            _ => &[],
        }
    }
}
