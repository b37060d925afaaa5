//! assetmux - write decoded animation frames to an uncompressed AVI file.

use anyhow::{bail, Context};
use assetmux_avi::{AviError, AviMuxer, ColorOrder, MuxerConfig, Palette};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Layout of the palette file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PaletteOrder {
    /// 3-byte red, green, blue entries
    Rgb,
    /// 3-byte blue, green, red entries
    Bgr,
    /// 4-byte red, green, blue, pad entries
    Rgbx,
    /// 4-byte blue, green, red, pad entries
    Bgrx,
}

impl PaletteOrder {
    fn load(self, data: &[u8]) -> assetmux_avi::Result<Palette> {
        let padded = matches!(self, PaletteOrder::Rgbx | PaletteOrder::Bgrx);
        if padded && data.len() % 4 != 0 {
            return Err(AviError::InvalidPalette(format!(
                "{} bytes is not a whole number of 4-byte entries",
                data.len()
            )));
        }

        match self {
            PaletteOrder::Rgb => Palette::from_packed(data, ColorOrder::Rgb),
            PaletteOrder::Bgr => Palette::from_packed(data, ColorOrder::Bgr),
            PaletteOrder::Rgbx => Palette::from_padded(data, data.len() / 4, ColorOrder::Rgb),
            PaletteOrder::Bgrx => Palette::from_padded(data, data.len() / 4, ColorOrder::Bgr),
        }
    }
}

/// Command-line arguments for the assetmux tool.
#[derive(Parser, Debug)]
#[command(name = "assetmux")]
#[command(version)]
#[command(about = "Write raw animation frames and PCM audio to an uncompressed AVI")]
#[command(long_about = "Writes raw, already-decoded frames (and optionally PCM audio) \n\
    into a non-interleaved RIFF/AVI file.\n\n\
    EXAMPLES:\n    \
    assetmux --frames frames/ --width 64 --height 48 --fps 10 -o anim.avi\n    \
    assetmux --frames frames/ --width 320 --height 200 --fps 12 \\\n        \
    --palette pal.bin --palette-order bgrx -o anim.avi\n    \
    assetmux --frames f0.raw f1.raw --width 8 --height 8 --fps 5 \\\n        \
    --audio sound.pcm --sample-rate 11025 -o anim.avi")]
struct Args {
    /// Frame files, or a single directory holding them
    #[arg(long, num_args = 1.., required = true)]
    frames: Vec<PathBuf>,

    /// Frame width in pixels
    #[arg(long)]
    width: i32,

    /// Frame height in pixels
    #[arg(long)]
    height: i32,

    /// Frames per second
    #[arg(long)]
    fps: u32,

    /// Bits per pixel
    #[arg(long, default_value = "8")]
    bpp: u16,

    /// Palette file for 8-bit frames
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Entry layout of the palette file
    #[arg(long, value_enum, default_value = "rgb", requires = "palette")]
    palette_order: PaletteOrder,

    /// PCM files, each written as one audio chunk
    #[arg(long, num_args = 1..)]
    audio: Vec<PathBuf>,

    /// Audio channel count
    #[arg(long, default_value = "1")]
    channels: u16,

    /// Audio sample rate in Hz
    #[arg(long, default_value = "22050")]
    sample_rate: u32,

    /// Bits per audio sample
    #[arg(long, default_value = "8")]
    bits: u16,

    /// Record the number of frames written in the main header
    #[arg(long)]
    total_frames: bool,

    /// Pad odd-length chunks to an even size
    #[arg(long)]
    word_align: bool,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Size every frame file must have.
    fn frame_size(&self) -> anyhow::Result<u64> {
        if self.width <= 0 || self.height <= 0 {
            bail!("Invalid frame size {}x{}", self.width, self.height);
        }
        let bits = u64::from(self.width.unsigned_abs())
            * u64::from(self.height.unsigned_abs())
            * u64::from(self.bpp);
        if bits % 8 != 0 {
            bail!(
                "{}x{} at {} bpp is not a whole number of bytes",
                self.width,
                self.height,
                self.bpp
            );
        }
        Ok(bits / 8)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let summary = run(&args)?;

    println!("Wrote {}", args.output.display());
    println!("  Streams:      {}", summary.streams);
    println!("  Video frames: {}", summary.video_frames);
    println!("  Audio chunks: {}", summary.audio_chunks);
    println!("  Size:         {} bytes", summary.bytes);

    Ok(())
}

/// What ended up in the written file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Summary {
    streams: u32,
    video_frames: usize,
    audio_chunks: usize,
    bytes: u64,
}

fn run(args: &Args) -> anyhow::Result<Summary> {
    let frame_size = args.frame_size()?;
    let frame_paths = collect_inputs(&args.frames)?;
    if frame_paths.is_empty() {
        bail!("No frame files found");
    }
    debug!(count = frame_paths.len(), frame_size, "frame files collected");

    let palette = match &args.palette {
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("Failed to read palette {}", path.display()))?;
            let palette = args
                .palette_order
                .load(&data)
                .with_context(|| format!("Invalid palette {}", path.display()))?;
            debug!(entries = palette.entry_count(), "palette loaded");
            Some(palette)
        }
        None => None,
    };

    let config = MuxerConfig::default().word_align(args.word_align);
    let mut muxer = AviMuxer::new(config);
    muxer
        .initialize_video_stream(args.width, args.height, args.fps, args.bpp, palette)
        .context("Failed to set up video stream")?;

    for path in &frame_paths {
        let frame = read_frame(path, frame_size)?;
        muxer.add_video_frame(frame)?;
    }

    if !args.audio.is_empty() {
        muxer
            .initialize_audio_stream(args.channels, args.sample_rate, args.bits)
            .context("Failed to set up audio stream")?;
        for path in collect_inputs(&args.audio)? {
            let pcm = fs::read(&path)
                .with_context(|| format!("Failed to read audio {}", path.display()))?;
            muxer.add_audio_chunk(pcm)?;
        }
    }

    if args.total_frames {
        muxer.file_header_mut().total_frames = u32::try_from(muxer.video_frame_count())
            .context("Too many frames for the main header")?;
    }

    let bytes = muxer
        .write_to_path(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), bytes, "done");

    Ok(Summary {
        streams: muxer.stream_count(),
        video_frames: muxer.video_frame_count(),
        audio_chunks: muxer.audio_chunk_count(),
        bytes,
    })
}

/// Expand a single directory argument into its files, sorted.
///
/// Explicit file lists are kept in the order given.
fn collect_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    match paths {
        [dir] if dir.is_dir() => {
            let mut files = Vec::new();
            let entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to list {}", dir.display()))?;
            for entry in entries {
                let path = entry?.path();
                if path.is_file() {
                    files.push(path);
                }
            }
            files.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
            Ok(files)
        }
        _ => Ok(paths.to_vec()),
    }
}

/// Numeric file stems sort by value and come before everything else.
fn natural_key(path: &Path) -> (bool, u64, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match stem.parse::<u64>() {
        Ok(n) => (false, n, name),
        Err(_) => (true, 0, name),
    }
}

fn read_frame(path: &Path, expected: u64) -> anyhow::Result<Vec<u8>> {
    let frame =
        fs::read(path).with_context(|| format!("Failed to read frame {}", path.display()))?;
    if frame.len() as u64 != expected {
        bail!(
            "Frame {} is {} bytes, expected {}",
            path.display(),
            frame.len(),
            expected
        );
    }
    Ok(frame)
}
