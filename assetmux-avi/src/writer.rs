//! Recursive RIFF tree writer
//!
//! Sizes are not computed ahead of time. Lists and record chunks get a zero
//! placeholder, their content is written, and the measured length is
//! patched in by seeking back. Raw byte chunks know their length up front
//! and are written in one pass.

use crate::chunks::{chunk_ids, Body, FourCC, HeaderRecord, Node};
use crate::encode::FieldType;
use crate::error::{AviError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Seek, SeekFrom, Write};
use tracing::{debug, trace};

/// Tree writer options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterOptions {
    /// Append a zero byte after odd-length chunk payloads
    ///
    /// The pad byte is not part of the chunk's recorded size but is part of
    /// the enclosing list's size.
    pub word_align: bool,
}

/// Write `form` as the root `RIFF` list and return the number of bytes written
///
/// `form.id` becomes the RIFF form type (e.g. `AVI `). A root that is not a
/// list fails with [`AviError::NotAList`] before anything is written.
pub fn write_riff<W: Write + Seek>(
    sink: &mut W,
    form: &Node<'_>,
    options: WriterOptions,
) -> Result<u64> {
    let Body::List(children) = &form.body else {
        return Err(AviError::NotAList(form.id));
    };

    let start = sink.stream_position()?;
    write_list(sink, chunk_ids::RIFF, form.id, children, options)?;
    let end = sink.stream_position()?;
    Ok(end - start)
}

/// Write one node at the current position
pub fn write_node<W: Write + Seek>(
    sink: &mut W,
    node: &Node<'_>,
    options: WriterOptions,
) -> Result<()> {
    match &node.body {
        Body::Absent => {
            trace!(chunk = %node.id, "skipping absent chunk");
            Ok(())
        }
        Body::List(children) => write_list(sink, chunk_ids::LIST, node.id, children, options),
        Body::Bytes(data) => write_bytes_chunk(sink, node.id, data, options),
        Body::Record(record) => write_record_chunk(sink, node.id, record, options),
    }
}

fn write_list<W: Write + Seek>(
    sink: &mut W,
    tag: FourCC,
    list_type: FourCC,
    children: &[Node<'_>],
    options: WriterOptions,
) -> Result<()> {
    sink.write_all(tag.as_bytes())?;
    let size_pos = sink.stream_position()?;
    sink.write_u32::<LittleEndian>(0)?;

    let content_start = sink.stream_position()?;
    sink.write_all(list_type.as_bytes())?;

    for child in children {
        write_node(sink, child, options)?;
    }

    let end = sink.stream_position()?;
    let size = end - content_start;
    backpatch_size(sink, size_pos, size, end)?;
    debug!(%tag, %list_type, offset = size_pos - 4, size, "list written");

    Ok(())
}

fn write_bytes_chunk<W: Write + Seek>(
    sink: &mut W,
    id: FourCC,
    data: &[u8],
    options: WriterOptions,
) -> Result<()> {
    let size = checked_size(data.len() as u64)?;

    sink.write_all(id.as_bytes())?;
    sink.write_u32::<LittleEndian>(size)?;
    sink.write_all(data)?;
    write_pad(sink, data.len() as u64, options)?;

    trace!(chunk = %id, size, "data chunk written");
    Ok(())
}

fn write_record_chunk<W: Write + Seek>(
    sink: &mut W,
    id: FourCC,
    record: &HeaderRecord<'_>,
    options: WriterOptions,
) -> Result<()> {
    sink.write_all(id.as_bytes())?;
    let size_pos = sink.stream_position()?;
    sink.write_u32::<LittleEndian>(0)?;

    let content_start = sink.stream_position()?;
    record.encode(sink)?;

    let end = sink.stream_position()?;
    let size = end - content_start;
    backpatch_size(sink, size_pos, size, end)?;
    write_pad(sink, size, options)?;

    trace!(chunk = %id, size, "record chunk written");
    Ok(())
}

fn backpatch_size<W: Write + Seek>(sink: &mut W, size_pos: u64, size: u64, resume: u64) -> Result<()> {
    let size = checked_size(size)?;
    sink.seek(SeekFrom::Start(size_pos))?;
    sink.write_u32::<LittleEndian>(size)?;
    sink.seek(SeekFrom::Start(resume))?;
    Ok(())
}

fn write_pad<W: Write>(sink: &mut W, payload_len: u64, options: WriterOptions) -> Result<()> {
    if options.word_align && payload_len % 2 != 0 {
        sink.write_u8(0)?;
    }
    Ok(())
}

fn checked_size(size: u64) -> Result<u32> {
    u32::try_from(size).map_err(|_| AviError::FieldOverflow {
        field: "chunk_size",
        value: i64::try_from(size).unwrap_or(i64::MAX),
        field_type: FieldType::U32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WaveFormat;
    use std::io::Cursor;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn written(form: &Node<'_>, options: WriterOptions) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let len = write_riff(&mut cursor, form, options).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(len as usize, bytes.len());
        bytes
    }

    #[test]
    fn test_empty_form() {
        let form = Node::list(FourCC(*b"TEST"), Vec::new());
        let bytes = written(&form, WriterOptions::default());
        assert_eq!(bytes, b"RIFF\x04\x00\x00\x00TEST");
    }

    #[test]
    fn test_bytes_chunk_unpadded() {
        let data = [0xAAu8; 3];
        let form = Node::list(FourCC(*b"TEST"), vec![Node::bytes(FourCC(*b"data"), &data)]);
        let bytes = written(&form, WriterOptions::default());

        assert_eq!(bytes.len(), 12 + 8 + 3);
        assert_eq!(le_u32(&bytes, 4), 4 + 8 + 3);
        assert_eq!(&bytes[12..16], b"data");
        assert_eq!(le_u32(&bytes, 16), 3);
        assert_eq!(&bytes[20..], &[0xAA; 3]);
    }

    #[test]
    fn test_bytes_chunk_word_aligned() {
        let data = [0xAAu8; 3];
        let form = Node::list(FourCC(*b"TEST"), vec![Node::bytes(FourCC(*b"data"), &data)]);
        let bytes = written(&form, WriterOptions { word_align: true });

        assert_eq!(bytes.len(), 12 + 8 + 4);
        assert_eq!(le_u32(&bytes, 4), 4 + 8 + 4);
        assert_eq!(le_u32(&bytes, 16), 3);
        assert_eq!(bytes[23], 0);
    }

    #[test]
    fn test_nested_list_sizes() {
        let a = [1u8; 10];
        let b = [2u8; 6];
        let form = Node::list(
            FourCC(*b"TEST"),
            vec![
                Node::list(FourCC(*b"innr"), vec![Node::bytes(FourCC(*b"aaaa"), &a)]),
                Node::bytes(FourCC(*b"bbbb"), &b),
            ],
        );
        let bytes = written(&form, WriterOptions::default());

        // RIFF(12) + LIST(12) + aaaa(8+10) + bbbb(8+6)
        assert_eq!(bytes.len(), 12 + 12 + 18 + 14);
        assert_eq!(le_u32(&bytes, 4), (bytes.len() - 8) as u32);
        assert_eq!(&bytes[12..16], b"LIST");
        assert_eq!(le_u32(&bytes, 16), 4 + 18);
        assert_eq!(&bytes[20..24], b"innr");
    }

    #[test]
    fn test_record_chunk_is_backpatched() {
        let wave = WaveFormat {
            channels: Some(1),
            samples_per_sec: Some(11025),
            bits_per_sample: Some(8),
            ..Default::default()
        };
        let form = Node::list(
            FourCC(*b"TEST"),
            vec![Node::record(FourCC(*b"strf"), HeaderRecord::Wave(&wave))],
        );
        let bytes = written(&form, WriterOptions::default());

        assert_eq!(&bytes[12..16], b"strf");
        assert_eq!(le_u32(&bytes, 16) as usize, WaveFormat::SIZE);
        assert_eq!(&bytes[20..], wave.render().unwrap().as_slice());
    }

    #[test]
    fn test_absent_chunk_emits_nothing() {
        let data = [7u8; 2];
        let form = Node::list(
            FourCC(*b"TEST"),
            vec![
                Node::optional_record(FourCC(*b"strf"), None),
                Node::bytes(FourCC(*b"data"), &data),
            ],
        );
        let bytes = written(&form, WriterOptions::default());
        assert_eq!(bytes.len(), 12 + 10);
        assert_eq!(&bytes[12..16], b"data");
    }

    #[test]
    fn test_writes_at_current_offset() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all(b"prefix").unwrap();

        let form = Node::list(FourCC(*b"TEST"), Vec::new());
        write_riff(&mut cursor, &form, WriterOptions::default()).unwrap();

        let bytes = cursor.into_inner();
        assert_eq!(&bytes[..6], b"prefix");
        assert_eq!(le_u32(&bytes, 10), 4);
    }

    #[test]
    fn test_incomplete_record_fails() {
        let wave = WaveFormat::default();
        let form = Node::list(
            FourCC(*b"TEST"),
            vec![Node::record(FourCC(*b"strf"), HeaderRecord::Wave(&wave))],
        );
        let mut cursor = Cursor::new(Vec::new());
        let err = write_riff(&mut cursor, &form, WriterOptions::default()).unwrap_err();
        assert!(matches!(err, AviError::IncompleteHeader { .. }));
    }

    #[test]
    fn test_non_list_root_is_rejected() {
        let data = [1u8, 2, 3, 4];
        let form = Node::bytes(FourCC(*b"AVI "), &data);

        let mut cursor = Cursor::new(Vec::new());
        let err = write_riff(&mut cursor, &form, WriterOptions::default()).unwrap_err();
        assert!(matches!(err, AviError::NotAList(id) if id == FourCC(*b"AVI ")));
        assert!(cursor.into_inner().is_empty());
    }
}
