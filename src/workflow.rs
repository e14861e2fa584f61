use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, RetentionPolicy};
use crate::error::{MediaflowError, Result};
use crate::media::{CommandRunner, MediaCommand, MediaCommandBuilder, ProcessRunner};
use crate::paths;
use crate::stage::{default_stages, Stage};
use crate::transcribe::TranscriberCommandBuilder;

/// One file written by a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub stage: String,
    pub path: PathBuf,
}

/// Outcome of a successful pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub input: PathBuf,
    pub final_path: PathBuf,
    /// Artifacts in creation order; under `final-only` retention only the final file remains
    pub artifacts: Vec<Artifact>,
}

pub struct Workflow {
    stages: Vec<Box<dyn Stage>>,
    runner: Arc<dyn CommandRunner>,
    retention: RetentionPolicy,
    preflight: Vec<MediaCommand>,
}

impl Workflow {
    pub fn new(config: &Config) -> Self {
        let runner = Arc::new(ProcessRunner::new(config.pipeline.stage_timeout()));
        let preflight = vec![
            MediaCommandBuilder::new(&config.media.binary_path).version_check(),
            TranscriberCommandBuilder::new(&config.transcriber).availability_check(),
        ];

        Self::with_stages(default_stages(config), runner, config.pipeline.retention)
            .with_preflight(preflight)
    }

    pub fn with_stages(
        stages: Vec<Box<dyn Stage>>,
        runner: Arc<dyn CommandRunner>,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            stages,
            runner,
            retention,
            preflight: Vec::new(),
        }
    }

    pub fn with_preflight(mut self, commands: Vec<MediaCommand>) -> Self {
        self.preflight = commands;
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn stage_suffixes(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.suffix()).collect()
    }

    /// Check that every external tool can be started
    pub async fn check_availability(&self) -> Result<()> {
        for command in &self.preflight {
            self.runner.run("preflight", command).await?;
            info!("{} is available", command.binary_path);
        }
        Ok(())
    }

    /// Run every stage over `input`, threading each output into the next stage
    pub async fn process<P: AsRef<Path>>(&self, input: P) -> Result<PipelineOutput> {
        self.process_observed(input, |_, _, _| {}).await
    }

    /// Like [`Workflow::process`], calling `observer(index, total, stage)` before each stage starts
    pub async fn process_observed<P, F>(&self, input: P, mut observer: F) -> Result<PipelineOutput>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize, &str) + Send,
    {
        let input = input.as_ref();
        if !fs::try_exists(input).await? {
            return Err(MediaflowError::FileNotFound(input.display().to_string()));
        }
        info!("Processing {}", input.display());

        let mut current = input.to_path_buf();
        let mut artifacts = Vec::new();
        let total = self.stages.len();

        for (index, stage) in self.stages.iter().enumerate() {
            observer(index + 1, total, stage.name());
            let output = stage.run(&current, self.runner.as_ref()).await.map_err(|e| {
                warn!("Stage '{}' failed on {}: {}", stage.name(), current.display(), e);
                e
            })?;

            artifacts.extend(output.artifacts.into_iter().map(|path| Artifact {
                stage: stage.name().to_string(),
                path,
            }));
            current = output.output;
        }

        if self.retention == RetentionPolicy::FinalOnly {
            artifacts = remove_intermediates(artifacts, &current).await;
        }

        info!("Pipeline finished: {}", current.display());
        Ok(PipelineOutput {
            input: input.to_path_buf(),
            final_path: current,
            artifacts,
        })
    }

    /// Process every media file under `input_dir`, continuing past failures
    pub async fn process_directory<P: AsRef<Path>>(
        &self,
        input_dir: P,
    ) -> Result<Vec<(PathBuf, Result<PipelineOutput>)>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(MediaflowError::Config("Input path is not a directory".to_string()));
        }

        // collected up front so files written by this run are not picked up
        let suffixes = self.stage_suffixes();
        let video_files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| paths::is_media_file(path) && !paths::is_derived(path, &suffixes))
            .collect();

        info!("Found {} video files to process", video_files.len());

        let mut results = Vec::with_capacity(video_files.len());
        for video_path in video_files {
            let result = self.process(&video_path).await;
            match &result {
                Ok(output) => info!("Successfully processed: {}", output.final_path.display()),
                Err(e) => warn!("Failed to process {}: {}", video_path.display(), e),
            }
            results.push((video_path, result));
        }

        Ok(results)
    }
}

async fn remove_intermediates(artifacts: Vec<Artifact>, final_path: &Path) -> Vec<Artifact> {
    let mut kept = Vec::new();
    for artifact in artifacts {
        if artifact.path == final_path {
            kept.push(artifact);
            continue;
        }
        if let Err(e) = fs::remove_file(&artifact.path).await {
            warn!("Could not remove {}: {}", artifact.path.display(), e);
            kept.push(artifact);
        }
    }
    kept
}
