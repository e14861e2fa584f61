// External tool execution
//
// - Commands: builders producing structured `MediaCommand`s
// - Runner: spawning, deadlines and exit-status interpretation

pub mod commands;
pub mod runner;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use runner::*;

use crate::error::{MediaflowError, Result};

/// Captured streams of a command that exited successfully
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Seam between pipeline stages and the operating system
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` on behalf of `stage`, failing unless it exits with status zero
    async fn run(&self, stage: &str, command: &MediaCommand) -> Result<CommandOutput>;
}

/// Fail with `MissingArtifact` unless `path` exists on disk.
pub async fn ensure_artifact(stage: &str, path: &Path) -> Result<()> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(MediaflowError::MissingArtifact {
            stage: stage.to_string(),
            path: path.to_path_buf(),
        }),
        Err(e) => Err(MediaflowError::Io(e)),
    }
}
