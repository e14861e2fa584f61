use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaflowError, Result};
use super::{CommandOutput, CommandRunner, MediaCommand};

/// Lines of stderr kept in error reports
const STDERR_TAIL_LINES: usize = 20;

/// Runs commands as child processes of this server.
///
/// Children are killed when their future is dropped, which covers both an
/// expired deadline and a client that disconnects mid-pipeline.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, stage: &str, command: &MediaCommand) -> Result<CommandOutput> {
        debug!("[{}] {}: {}", stage, command.description, command);

        let child = Command::new(&command.binary_path)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MediaflowError::Spawn {
                stage: stage.to_string(),
                command: command.to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    warn!("[{}] {} exceeded {:?}, killed", stage, command.binary_path, limit);
                    return Err(MediaflowError::Timeout {
                        stage: stage.to_string(),
                        command: command.to_string(),
                        after: limit,
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(MediaflowError::ExternalTool {
                stage: stage.to_string(),
                command: command.to_string(),
                exit: describe_exit(output.status, &stderr),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn describe_exit(status: ExitStatus, stderr: &str) -> String {
    let status = match status.code() {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    };

    let lines: Vec<&str> = stderr.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return status;
    }
    let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
    format!("{}: {}", status, tail.join("\n"))
}
