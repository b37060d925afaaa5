//! AVI muxer
//!
//! [`AviMuxer`] collects one uncompressed video stream and one PCM audio
//! stream in memory and writes them as a single non-interleaved file:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'
//!     'avih'
//!     LIST 'strl' ('strh' vids, 'strf' BITMAPINFOHEADER [+ palette])
//!     LIST 'strl' ('strh' auds, 'strf' WAVEFORMATEX)
//!   LIST 'movi'
//!     '00db' ... '01wb' ...
//! ```
//!
//! A stream that was never initialized contributes no `strl` list and no
//! data chunks.

use crate::chunks::{
    chunk_ids, stream_chunk_id, ChunkType, FourCC, HeaderRecord, Node, AUDIO_STREAM_ID,
    VIDEO_STREAM_ID,
};
use crate::error::{AviError, Result};
use crate::palette::Palette;
use crate::staging;
use crate::types::{BitmapFormat, FileHeader, Rect, StreamHeader, StreamType, WaveFormat};
use crate::writer::{write_riff, WriterOptions};
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tracing::{debug, info, trace, warn};

const MICROSECONDS_PER_SECOND: u32 = 1_000_000;

/// Muxer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxerConfig {
    /// Store heights negated so players read rows top-down
    pub top_down: bool,
    /// Pad odd-length chunks to a word boundary
    pub word_align: bool,
    /// avih padding granularity
    pub padding_granularity: u32,
    /// Handler FourCC written into each stream header
    pub stream_handler: FourCC,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        MuxerConfig {
            top_down: true,
            word_align: false,
            padding_granularity: 1,
            stream_handler: FourCC(*b"DIB "),
        }
    }
}

impl MuxerConfig {
    #[must_use]
    pub fn top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }

    #[must_use]
    pub fn word_align(mut self, word_align: bool) -> Self {
        self.word_align = word_align;
        self
    }

    #[must_use]
    pub fn padding_granularity(mut self, granularity: u32) -> Self {
        self.padding_granularity = granularity;
        self
    }

    #[must_use]
    pub fn stream_handler(mut self, handler: FourCC) -> Self {
        self.stream_handler = handler;
        self
    }

    fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            word_align: self.word_align,
        }
    }
}

#[derive(Debug, Clone)]
struct VideoStream {
    header: StreamHeader,
    format: BitmapFormat,
}

#[derive(Debug, Clone)]
struct AudioStream {
    header: StreamHeader,
    format: WaveFormat,
}

/// In-memory AVI assembler
#[derive(Debug, Clone)]
pub struct AviMuxer {
    config: MuxerConfig,
    file_header: FileHeader,
    video: Option<VideoStream>,
    audio: Option<AudioStream>,
    video_frames: Vec<Vec<u8>>,
    audio_chunks: Vec<Vec<u8>>,
}

impl Default for AviMuxer {
    fn default() -> Self {
        Self::new(MuxerConfig::default())
    }
}

impl AviMuxer {
    pub fn new(config: MuxerConfig) -> Self {
        let file_header = FileHeader {
            padding_granularity: config.padding_granularity,
            ..Default::default()
        };

        AviMuxer {
            config,
            file_header,
            video: None,
            audio: None,
            video_frames: Vec::new(),
            audio_chunks: Vec::new(),
        }
    }

    /// Set up the video stream
    ///
    /// Every frame added later must be `width * height * bits_per_pixel / 8`
    /// bytes; this is not checked. The frame interval is `1_000_000 / fps`
    /// truncated to whole microseconds. Calling this again replaces the
    /// stream headers but keeps frames already added.
    pub fn initialize_video_stream(
        &mut self,
        width: i32,
        height: i32,
        fps: u32,
        bits_per_pixel: u16,
        palette: Option<Palette>,
    ) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(AviError::InvalidDimensions { width, height });
        }
        if fps == 0 {
            return Err(AviError::InvalidFrameRate(fps));
        }
        if self.video.is_some() {
            warn!("video stream initialized twice, replacing its headers");
        }

        let stored_height = if self.config.top_down { -height } else { height };

        let mut header = StreamHeader::new(StreamType::Video, fps);
        header.handler = self.config.stream_handler;
        header.frame = Rect {
            left: 0,
            top: 0,
            right: width,
            bottom: stored_height,
        };

        let format = BitmapFormat {
            width: Some(width),
            height: Some(stored_height),
            bit_count: Some(bits_per_pixel),
            palette,
            ..Default::default()
        };

        let interval = MICROSECONDS_PER_SECOND / fps;
        self.file_header.microseconds_per_frame = Some(interval);
        self.file_header.width = Some(width);
        self.file_header.height = Some(stored_height);

        debug!(
            width,
            height = stored_height,
            fps,
            bits_per_pixel,
            microseconds_per_frame = interval,
            palette_entries = format.palette.as_ref().map_or(0, Palette::entry_count),
            "video stream initialized"
        );

        self.video = Some(VideoStream { header, format });
        Ok(())
    }

    /// Set up the PCM audio stream
    ///
    /// Channel count and bit depth are taken as given.
    pub fn initialize_audio_stream(
        &mut self,
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> Result<()> {
        if self.audio.is_some() {
            warn!("audio stream initialized twice, replacing its headers");
        }

        let mut header = StreamHeader::new(StreamType::Audio, sample_rate);
        header.handler = self.config.stream_handler;

        let format = WaveFormat {
            channels: Some(channels),
            samples_per_sec: Some(sample_rate),
            bits_per_sample: Some(bits_per_sample),
            ..Default::default()
        };

        debug!(channels, sample_rate, bits_per_sample, "audio stream initialized");

        self.audio = Some(AudioStream { header, format });
        Ok(())
    }

    /// Append one uncompressed frame and bump the video stream length
    pub fn add_video_frame(&mut self, frame: impl Into<Vec<u8>>) -> Result<()> {
        let video = self
            .video
            .as_mut()
            .ok_or(AviError::UninitializedStream(StreamType::Video))?;

        let frame = frame.into();
        video.header.length += 1;
        trace!(index = self.video_frames.len(), size = frame.len(), "video frame added");
        self.video_frames.push(frame);
        Ok(())
    }

    /// Append one block of PCM samples
    ///
    /// The audio stream length is left untouched.
    pub fn add_audio_chunk(&mut self, pcm: impl Into<Vec<u8>>) -> Result<()> {
        if self.audio.is_none() {
            return Err(AviError::UninitializedStream(StreamType::Audio));
        }

        let pcm = pcm.into();
        trace!(index = self.audio_chunks.len(), size = pcm.len(), "audio chunk added");
        self.audio_chunks.push(pcm);
        Ok(())
    }

    /// Write the container to a seekable destination at its current position
    ///
    /// Returns the number of bytes written. On error the destination holds
    /// a partial, unplayable file.
    pub fn write<W: Write + Seek>(&self, dest: &mut W) -> Result<u64> {
        let file_header = self.file_header_for_write();
        let form = self.build_tree(&file_header);
        let written = write_riff(dest, &form, self.config.writer_options())?;
        self.log_written(written);
        Ok(written)
    }

    /// Write to a destination that cannot seek, staging in memory first
    pub fn write_streaming<W: Write>(&self, dest: &mut W) -> Result<u64> {
        let file_header = self.file_header_for_write();
        let form = self.build_tree(&file_header);
        let written = staging::write_riff_streaming(dest, &form, self.config.writer_options())?;
        self.log_written(written);
        Ok(written)
    }

    /// Render the whole container into memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let file_header = self.file_header_for_write();
        let form = self.build_tree(&file_header);
        staging::render_riff(&form, self.config.writer_options())
    }

    /// Write to `path` through a temporary sibling file
    ///
    /// The file only appears at `path` once it has been completely written.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        let partial = Path::new(&partial);

        let result = self.write_file(partial);
        match result {
            Ok(written) => {
                fs::rename(partial, path)?;
                debug!(path = %path.display(), "AVI file saved");
                Ok(written)
            }
            Err(e) => {
                let _ = fs::remove_file(partial);
                Err(e)
            }
        }
    }

    fn write_file(&self, path: &Path) -> Result<u64> {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = self.write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(written)
    }

    fn file_header_for_write(&self) -> FileHeader {
        FileHeader {
            streams: self.stream_count(),
            ..self.file_header.clone()
        }
    }

    fn build_tree<'a>(&'a self, file_header: &'a FileHeader) -> Node<'a> {
        let mut hdrl = vec![Node::record(chunk_ids::AVIH, HeaderRecord::File(file_header))];

        if let Some(video) = &self.video {
            hdrl.push(Node::list(
                chunk_ids::STRL,
                vec![
                    Node::record(chunk_ids::STRH, HeaderRecord::Stream(&video.header)),
                    Node::record(chunk_ids::STRF, HeaderRecord::Bitmap(&video.format)),
                ],
            ));
        }

        if let Some(audio) = &self.audio {
            hdrl.push(Node::list(
                chunk_ids::STRL,
                vec![
                    Node::record(chunk_ids::STRH, HeaderRecord::Stream(&audio.header)),
                    Node::record(chunk_ids::STRF, HeaderRecord::Wave(&audio.format)),
                ],
            ));
        }

        let video_id = stream_chunk_id(VIDEO_STREAM_ID, ChunkType::VideoUncompressed);
        let audio_id = stream_chunk_id(AUDIO_STREAM_ID, ChunkType::Audio);
        let movi = self
            .video_frames
            .iter()
            .map(|frame| Node::bytes(video_id, frame))
            .chain(self.audio_chunks.iter().map(|pcm| Node::bytes(audio_id, pcm)))
            .collect();

        Node::list(
            chunk_ids::AVI,
            vec![
                Node::list(chunk_ids::HDRL, hdrl),
                Node::list(chunk_ids::MOVI, movi),
            ],
        )
    }

    fn log_written(&self, written: u64) {
        info!(
            bytes = written,
            streams = self.stream_count(),
            video_frames = self.video_frames.len(),
            audio_chunks = self.audio_chunks.len(),
            "AVI written"
        );
    }

    pub fn config(&self) -> &MuxerConfig {
        &self.config
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    /// Caller-owned header fields such as `total_frames`
    ///
    /// `streams` is recomputed on every write.
    pub fn file_header_mut(&mut self) -> &mut FileHeader {
        &mut self.file_header
    }

    pub fn video_stream_header(&self) -> Option<&StreamHeader> {
        self.video.as_ref().map(|v| &v.header)
    }

    pub fn bitmap_format(&self) -> Option<&BitmapFormat> {
        self.video.as_ref().map(|v| &v.format)
    }

    pub fn audio_stream_header(&self) -> Option<&StreamHeader> {
        self.audio.as_ref().map(|a| &a.header)
    }

    pub fn wave_format(&self) -> Option<&WaveFormat> {
        self.audio.as_ref().map(|a| &a.format)
    }

    pub fn video_frame_count(&self) -> usize {
        self.video_frames.len()
    }

    pub fn audio_chunk_count(&self) -> usize {
        self.audio_chunks.len()
    }

    /// Number of initialized streams
    pub fn stream_count(&self) -> u32 {
        u32::from(self.video.is_some()) + u32::from(self.audio.is_some())
    }
}
