use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP upload endpoint
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,

        /// Directory for uploads and their artifacts (overrides server.upload_dir)
        #[arg(short, long)]
        upload_dir: Option<PathBuf>,
    },

    /// Run the pipeline on a single local video file
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Print the artifact report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the pipeline on every video file in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,
    },

    /// Check that ffmpeg and whisper can be started
    Check,

    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "mediaflow.toml")]
        output: PathBuf,
    },
}
