//! Forward-only destinations
//!
//! The tree writer needs to seek back for size backpatching. Pipes, sockets
//! and other append-only sinks get the whole tree staged in memory first
//! and flushed with a single write.

use crate::chunks::Node;
use crate::error::Result;
use crate::writer::{write_riff, WriterOptions};
use std::io::{Cursor, Write};

/// Render `form` into an in-memory buffer
pub fn render_riff(form: &Node<'_>, options: WriterOptions) -> Result<Vec<u8>> {
    let mut staging = Cursor::new(Vec::new());
    write_riff(&mut staging, form, options)?;
    Ok(staging.into_inner())
}

/// Render `form` in memory, then copy it to `sink` in one write
pub fn write_riff_streaming<W: Write>(
    sink: &mut W,
    form: &Node<'_>,
    options: WriterOptions,
) -> Result<u64> {
    let staged = render_riff(form, options)?;
    sink.write_all(&staged)?;
    sink.flush()?;
    Ok(staged.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::FourCC;
    use std::io;

    /// Sink that accepts bytes but has no notion of position
    struct AppendOnly(Vec<u8>);

    impl Write for AppendOnly {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_streaming_matches_seekable_output() {
        let data = [9u8; 5];
        let form = Node::list(FourCC(*b"TEST"), vec![Node::bytes(FourCC(*b"data"), &data)]);

        let mut sink = AppendOnly(Vec::new());
        let written = write_riff_streaming(&mut sink, &form, WriterOptions::default()).unwrap();

        let staged = render_riff(&form, WriterOptions::default()).unwrap();
        assert_eq!(written as usize, staged.len());
        assert_eq!(sink.0, staged);
    }
}
