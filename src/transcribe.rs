use std::path::Path;

use crate::config::TranscriberConfig;
use crate::media::MediaCommand;
use crate::paths::SUBTITLE_EXTENSION;

/// Builder for speech-to-text invocations (openai-whisper CLI)
#[derive(Debug, Clone)]
pub struct TranscriberCommandBuilder {
    binary_path: String,
    model: String,
    language: String,
}

impl TranscriberCommandBuilder {
    pub fn new(config: &TranscriberConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        }
    }

    /// Transcribe `video_path`, writing `<stem>.srt` into `output_dir`
    pub fn generate_subtitles<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        output_dir: Q,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle generation")
            .path(video_path)
            .arg("--model")
            .arg(&self.model)
            .arg("--language")
            .arg(&self.language)
            .arg("--output_format")
            .arg(SUBTITLE_EXTENSION)
            .arg("--output_dir")
            .path(output_dir)
    }

    pub fn availability_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Availability check").arg("--help")
    }
}
