use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fileforged")]
#[command(author, version, about = "Disk-space-aware batch file converter")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert files (and the contents of ZIP archives) to one format
    Convert {
        /// Target format (png, jpg, webp, tiff, mp4, webm, mkv, mp3, wav, pdf, ocrpdf)
        #[arg(short, long)]
        to: String,

        /// Quality for jpg/webp output (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,

        /// ffmpeg preset for video output (ultrafast, fast, medium, slow)
        #[arg(long)]
        preset: Option<String>,

        /// OCR language code
        #[arg(long)]
        ocr_lang: Option<String>,

        /// Hand the files over instead of copying them; they are deleted
        #[arg(long)]
        consume: bool,

        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show which formats can be converted to which
    Formats {
        /// Only show targets for this source extension
        #[arg(long)]
        from: Option<String>,
    },

    /// List recently produced outputs
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
