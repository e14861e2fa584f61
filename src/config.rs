use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{MediaflowError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the upload endpoint listens on
    pub bind: String,
    /// Directory receiving uploads; every stage writes its artifacts next to the upload
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of pipelines allowed to run at once; further uploads wait in a queue
    pub max_concurrent_jobs: usize,
    /// Deadline for a single external tool invocation, in seconds (0 disables)
    pub stage_timeout_secs: u64,
    /// What to do with intermediate artifacts after a successful run
    pub retention: RetentionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionPolicy {
    /// Keep every intermediate artifact for inspection
    #[default]
    Keep,
    /// Remove intermediate artifacts once the final file exists
    FinalOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Audio filter for the loudness normalization stage
    pub loudness_filter: String,
    /// Video filter for the brightness/contrast stage
    pub brightness_filter: String,
    /// Audio filter for the noise removal stage
    pub denoise_filter: String,
    /// Additional encoding options appended to every re-encoding command
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub encoding_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the speech-to-text binary (openai-whisper CLI)
    pub binary_path: String,
    /// Model size passed to `--model`
    pub model: String,
    /// Spoken language passed to `--language`
    pub language: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            stage_timeout_secs: 3600,
            retention: RetentionPolicy::Keep,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            loudness_filter: "loudnorm".to_string(),
            brightness_filter: "eq=brightness=0.06:contrast=1.2".to_string(),
            denoise_filter: "highpass=f=200, lowpass=f=3000".to_string(),
            encoding_options: vec![
                // "-preset".to_string(), "medium".to_string(),
                // "-crf".to_string(), "23".to_string(),
            ],
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "small".to_string(),
            language: "English".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        match self.stage_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MediaflowError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| MediaflowError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MediaflowError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| MediaflowError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_concurrent_jobs == 0 {
            return Err(MediaflowError::Config(
                "pipeline.max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.media.binary_path.trim().is_empty()
            || self.transcriber.binary_path.trim().is_empty()
        {
            return Err(MediaflowError::Config("tool binary paths must not be empty".to_string()));
        }
        Ok(())
    }
}
