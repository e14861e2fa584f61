//! The four transformations applied to an uploaded video.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::media::{ensure_artifact, CommandRunner, MediaCommand, MediaCommandBuilder};
use crate::paths;
use crate::transcribe::TranscriberCommandBuilder;

pub const AUDIO_SUFFIX: &str = "audio-enhanced";
pub const BRIGHTNESS_SUFFIX: &str = "brightness";
pub const SUBTITLE_SUFFIX: &str = "subtitled";
pub const NOISE_SUFFIX: &str = "denoised";

/// Files a stage left on disk; `output` feeds the next stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub output: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

impl StageOutput {
    fn single(output: PathBuf) -> Self {
        Self { artifacts: vec![output.clone()], output }
    }
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Suffix inserted into the name of the video this stage produces
    fn suffix(&self) -> &str;

    async fn run(&self, input: &Path, runner: &dyn CommandRunner) -> Result<StageOutput>;
}

#[derive(Debug, Clone)]
enum Filter {
    Audio(String),
    Video { filter: String, options: Vec<String> },
}

/// Single ffmpeg invocation applying one filter
#[derive(Debug, Clone)]
pub struct FilterStage {
    name: &'static str,
    suffix: &'static str,
    description: &'static str,
    filter: Filter,
    builder: MediaCommandBuilder,
}

impl FilterStage {
    pub fn audio_enhance(config: &Config) -> Self {
        Self {
            name: "audio",
            suffix: AUDIO_SUFFIX,
            description: "Loudness normalization",
            filter: Filter::Audio(config.media.loudness_filter.clone()),
            builder: MediaCommandBuilder::new(&config.media.binary_path),
        }
    }

    pub fn brightness(config: &Config) -> Self {
        Self {
            name: "brightness",
            suffix: BRIGHTNESS_SUFFIX,
            description: "Brightness/contrast correction",
            filter: Filter::Video {
                filter: config.media.brightness_filter.clone(),
                options: config.media.encoding_options.clone(),
            },
            builder: MediaCommandBuilder::new(&config.media.binary_path),
        }
    }

    pub fn noise_removal(config: &Config) -> Self {
        Self {
            name: "noise",
            suffix: NOISE_SUFFIX,
            description: "Noise band-pass filtering",
            filter: Filter::Audio(config.media.denoise_filter.clone()),
            builder: MediaCommandBuilder::new(&config.media.binary_path),
        }
    }

    pub fn command(&self, input: &Path, output: &Path) -> MediaCommand {
        match &self.filter {
            Filter::Audio(filter) => {
                self.builder.audio_filter(self.description, input, output, filter)
            }
            Filter::Video { filter, options } => {
                self.builder.video_filter(self.description, input, output, filter, options)
            }
        }
    }
}

#[async_trait]
impl Stage for FilterStage {
    fn name(&self) -> &str {
        self.name
    }

    fn suffix(&self) -> &str {
        self.suffix
    }

    async fn run(&self, input: &Path, runner: &dyn CommandRunner) -> Result<StageOutput> {
        let output = paths::derive(input, self.suffix)?;
        info!("{}: {} -> {}", self.description, input.display(), output.display());

        runner.run(self.name, &self.command(input, &output)).await?;
        ensure_artifact(self.name, &output).await?;

        Ok(StageOutput::single(output))
    }
}

/// Speech-to-text followed by burning the generated track into the video
#[derive(Debug, Clone)]
pub struct SubtitleStage {
    transcriber: TranscriberCommandBuilder,
    media: MediaCommandBuilder,
    encoding_options: Vec<String>,
}

impl SubtitleStage {
    pub fn new(config: &Config) -> Self {
        Self {
            transcriber: TranscriberCommandBuilder::new(&config.transcriber),
            media: MediaCommandBuilder::new(&config.media.binary_path),
            encoding_options: config.media.encoding_options.clone(),
        }
    }
}

#[async_trait]
impl Stage for SubtitleStage {
    fn name(&self) -> &str {
        "subtitle"
    }

    fn suffix(&self) -> &str {
        SUBTITLE_SUFFIX
    }

    async fn run(&self, input: &Path, runner: &dyn CommandRunner) -> Result<StageOutput> {
        let srt_path = paths::subtitle_path(input)?;
        let output = paths::derive(input, SUBTITLE_SUFFIX)?;
        let video_dir = match input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        info!("Generating subtitles for {}", input.display());
        runner
            .run(self.name(), &self.transcriber.generate_subtitles(input, video_dir))
            .await?;

        // burn-in must never start without the track on disk
        ensure_artifact(self.name(), &srt_path).await?;

        info!("Burning {} into {}", srt_path.display(), output.display());
        let burn = self.media.burn_subtitles(
            input,
            srt_path.as_path(),
            output.as_path(),
            &self.encoding_options,
        );
        runner.run(self.name(), &burn).await?;
        ensure_artifact(self.name(), &output).await?;

        Ok(StageOutput {
            output: output.clone(),
            artifacts: vec![srt_path, output],
        })
    }
}

/// The fixed stage order: audio, brightness, subtitle, noise
pub fn default_stages(config: &Config) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(FilterStage::audio_enhance(config)),
        Box::new(FilterStage::brightness(config)),
        Box::new(SubtitleStage::new(config)),
        Box::new(FilterStage::noise_removal(config)),
    ]
}
