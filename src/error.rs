use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stage '{stage}' failed: `{command}` {exit}")]
    ExternalTool {
        stage: String,
        command: String,
        exit: String,
    },

    #[error("Stage '{stage}' could not start `{command}`: {source}")]
    Spawn {
        stage: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stage '{stage}' timed out after {after:?}: `{command}`")]
    Timeout {
        stage: String,
        command: String,
        after: Duration,
    },

    #[error("Stage '{stage}' did not produce expected artifact: {}", path.display())]
    MissingArtifact { stage: String, path: PathBuf },

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Failed to store upload: {0}")]
    UploadStorage(#[source] std::io::Error),

    #[error("Job queue closed")]
    QueueClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl MediaflowError {
    /// Name of the pipeline stage that produced this error, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::ExternalTool { stage, .. }
            | Self::Spawn { stage, .. }
            | Self::Timeout { stage, .. }
            | Self::MissingArtifact { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MediaflowError>;
