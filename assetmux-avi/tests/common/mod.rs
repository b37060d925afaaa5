//! Standalone RIFF reader used to check written files.
//!
//! Independent of the crate's writer: it walks tags and sizes from raw bytes
//! and asserts that every list's recorded size matches the children found
//! inside it.

#![allow(dead_code)]

use assetmux_avi::{
    AviFlags, BitmapFormat, FileHeader, FourCC, Palette, Rect, StreamHeader, StreamType,
    WaveFormat,
};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

#[derive(Debug, Clone)]
pub enum Parsed {
    List {
        /// `RIFF` or `LIST`
        tag: [u8; 4],
        list_type: [u8; 4],
        size: u32,
        children: Vec<Parsed>,
    },
    Chunk {
        id: [u8; 4],
        size: u32,
        data: Vec<u8>,
    },
}

impl Parsed {
    pub fn id(&self) -> &[u8; 4] {
        match self {
            Parsed::List { list_type, .. } => list_type,
            Parsed::Chunk { id, .. } => id,
        }
    }

    pub fn children(&self) -> &[Parsed] {
        match self {
            Parsed::List { children, .. } => children,
            Parsed::Chunk { .. } => &[],
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Parsed::Chunk { data, .. } => data,
            Parsed::List { .. } => panic!("{:?} is a list", FourCC(*self.id())),
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            Parsed::List { size, .. } | Parsed::Chunk { size, .. } => *size,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Parsed::List { .. })
    }

    /// Direct children with the given id or list type
    pub fn find_all(&self, id: &[u8; 4]) -> Vec<&Parsed> {
        self.children().iter().filter(|c| c.id() == id).collect()
    }

    pub fn find(&self, id: &[u8; 4]) -> &Parsed {
        self.children()
            .iter()
            .find(|c| c.id() == id)
            .unwrap_or_else(|| panic!("no child {:?}", FourCC(*id)))
    }

    /// Bytes this node occupies including its 8-byte header and any pad
    pub fn framed_len(&self, word_aligned: bool) -> usize {
        let size = self.size() as usize;
        let pad = if word_aligned { size % 2 } else { 0 };
        8 + size + pad
    }
}

/// Parse a whole file; the root must be a RIFF list spanning every byte
pub fn parse_riff(bytes: &[u8], word_aligned: bool) -> Parsed {
    let mut cursor = Cursor::new(bytes);
    let root = parse_node(&mut cursor, bytes.len() as u64, word_aligned);
    assert_eq!(cursor.position() as usize, bytes.len(), "trailing bytes after RIFF");
    match &root {
        Parsed::List { tag, .. } => assert_eq!(tag, b"RIFF"),
        Parsed::Chunk { .. } => panic!("root is not a RIFF list"),
    }
    root
}

fn parse_node(cursor: &mut Cursor<&[u8]>, limit: u64, word_aligned: bool) -> Parsed {
    let mut tag = [0u8; 4];
    cursor.read_exact(&mut tag).expect("tag");
    let size = cursor.read_u32::<LittleEndian>().expect("size");
    let content_start = cursor.position();
    let content_end = content_start + size as u64;
    assert!(
        content_end <= limit,
        "{:?} size {} runs past its parent",
        FourCC(tag),
        size
    );

    let node = if &tag == b"RIFF" || &tag == b"LIST" {
        let mut list_type = [0u8; 4];
        cursor.read_exact(&mut list_type).expect("list type");

        let mut children = Vec::new();
        while cursor.position() < content_end {
            children.push(parse_node(cursor, content_end, word_aligned));
        }
        assert_eq!(
            cursor.position(),
            content_end,
            "children of {:?} do not fill its recorded size",
            FourCC(list_type)
        );

        Parsed::List {
            tag,
            list_type,
            size,
            children,
        }
    } else {
        let mut data = vec![0u8; size as usize];
        cursor.read_exact(&mut data).expect("chunk data");
        Parsed::Chunk { id: tag, size, data }
    };

    if word_aligned && size % 2 != 0 {
        let pad = cursor.read_u8().expect("pad byte");
        assert_eq!(pad, 0);
    }

    node
}

pub fn parse_file_header(data: &[u8]) -> FileHeader {
    let mut r = Cursor::new(data);
    FileHeader {
        microseconds_per_frame: Some(r.read_u32::<LittleEndian>().unwrap()),
        max_bytes_per_sec: r.read_u32::<LittleEndian>().unwrap(),
        padding_granularity: r.read_u32::<LittleEndian>().unwrap(),
        flags: AviFlags::from_u32(r.read_u32::<LittleEndian>().unwrap()),
        total_frames: r.read_u32::<LittleEndian>().unwrap(),
        initial_frames: r.read_u32::<LittleEndian>().unwrap(),
        streams: r.read_u32::<LittleEndian>().unwrap(),
        suggested_buffer_size: r.read_u32::<LittleEndian>().unwrap(),
        width: Some(r.read_i32::<LittleEndian>().unwrap()),
        height: Some(r.read_i32::<LittleEndian>().unwrap()),
        reserved: [
            r.read_u32::<LittleEndian>().unwrap(),
            r.read_u32::<LittleEndian>().unwrap(),
            r.read_u32::<LittleEndian>().unwrap(),
            r.read_u32::<LittleEndian>().unwrap(),
        ],
    }
}

pub fn parse_stream_header(data: &[u8]) -> StreamHeader {
    let mut r = Cursor::new(data);
    let mut fourcc = [0u8; 4];
    r.read_exact(&mut fourcc).unwrap();
    let stream_type = StreamType::from_fourcc(FourCC(fourcc));
    r.read_exact(&mut fourcc).unwrap();
    let handler = FourCC(fourcc);

    StreamHeader {
        stream_type,
        handler,
        flags: r.read_u32::<LittleEndian>().unwrap(),
        priority: r.read_u16::<LittleEndian>().unwrap(),
        language: r.read_u16::<LittleEndian>().unwrap(),
        initial_frames: r.read_u32::<LittleEndian>().unwrap(),
        scale: r.read_u32::<LittleEndian>().unwrap(),
        rate: Some(r.read_u32::<LittleEndian>().unwrap()),
        start: r.read_u32::<LittleEndian>().unwrap(),
        length: r.read_u32::<LittleEndian>().unwrap(),
        suggested_buffer_size: r.read_u32::<LittleEndian>().unwrap(),
        quality: r.read_i32::<LittleEndian>().unwrap(),
        sample_size: r.read_u32::<LittleEndian>().unwrap(),
        frame: Rect {
            left: r.read_i16::<LittleEndian>().unwrap().into(),
            top: r.read_i16::<LittleEndian>().unwrap().into(),
            right: r.read_i16::<LittleEndian>().unwrap().into(),
            bottom: r.read_i16::<LittleEndian>().unwrap().into(),
        },
    }
}

pub fn parse_bitmap_format(data: &[u8]) -> BitmapFormat {
    let mut r = Cursor::new(data);
    let structure_size = r.read_u32::<LittleEndian>().unwrap();
    assert_eq!(structure_size, BitmapFormat::STRUCTURE_SIZE);

    let format = BitmapFormat {
        width: Some(r.read_i32::<LittleEndian>().unwrap()),
        height: Some(r.read_i32::<LittleEndian>().unwrap()),
        planes: r.read_u16::<LittleEndian>().unwrap(),
        bit_count: Some(r.read_u16::<LittleEndian>().unwrap()),
        compression: r.read_u32::<LittleEndian>().unwrap(),
        image_size: r.read_u32::<LittleEndian>().unwrap(),
        x_pels_per_meter: r.read_u32::<LittleEndian>().unwrap(),
        y_pels_per_meter: r.read_u32::<LittleEndian>().unwrap(),
        colors_used: r.read_u32::<LittleEndian>().unwrap(),
        colors_important: r.read_u32::<LittleEndian>().unwrap(),
        palette: None,
    };

    let rest = &data[structure_size as usize..];
    BitmapFormat {
        palette: (!rest.is_empty()).then(|| Palette::from_rgb(rest.to_vec()).unwrap()),
        ..format
    }
}

pub fn parse_wave_format(data: &[u8]) -> WaveFormat {
    let mut r = Cursor::new(data);
    let format_tag = r.read_u16::<LittleEndian>().unwrap();
    let channels = r.read_u16::<LittleEndian>().unwrap();
    let samples_per_sec = r.read_u32::<LittleEndian>().unwrap();
    let _avg_bytes_per_sec = r.read_u32::<LittleEndian>().unwrap();
    let _block_align = r.read_u16::<LittleEndian>().unwrap();
    let bits_per_sample = r.read_u16::<LittleEndian>().unwrap();
    let extra_size = r.read_u16::<LittleEndian>().unwrap();

    WaveFormat {
        format_tag,
        channels: Some(channels),
        samples_per_sec: Some(samples_per_sec),
        bits_per_sample: Some(bits_per_sample),
        extra_size,
    }
}
