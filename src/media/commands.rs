use std::fmt;
use std::path::Path;

/// External tool invocation as a program plus discrete arguments.
///
/// Arguments are handed to the process-spawn API as separate tokens, never
/// through a shell, so file names need no shell quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add a path argument
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").path(path)
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.path(path)
    }

    /// Fail instead of replacing an existing output file
    pub fn no_overwrite(self) -> Self {
        self.arg("-n")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Add audio filter
    pub fn audio_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-af").arg(filter)
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary_path)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Builder for the ffmpeg invocations of the pipeline
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Apply an audio filter, keeping the video stream untouched
    pub fn audio_filter<P: AsRef<Path>>(
        &self,
        description: &str,
        input_path: P,
        output_path: P,
        filter: &str,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, description)
            .no_overwrite()
            .input(input_path)
            .audio_filter(filter)
            .copy_video()
            .output(output_path)
    }

    /// Apply a video filter, re-encoding the video stream
    pub fn video_filter<P: AsRef<Path>>(
        &self,
        description: &str,
        input_path: P,
        output_path: P,
        filter: &str,
        additional_options: &[String],
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, description)
            .no_overwrite()
            .input(input_path)
            .video_filter(filter)
            .args(additional_options.iter().cloned())
            .output(output_path)
    }

    /// Build subtitle burn-in command
    pub fn burn_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        additional_options: &[String],
    ) -> MediaCommand {
        let filter = format!("subtitles={}", escape_filter_value(subtitle_path.as_ref()));
        self.video_filter(
            "Subtitle burn-in",
            video_path,
            output_path,
            &filter,
            additional_options,
        )
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

/// Characters that end or quote a filter option value
const OPTION_SPECIAL: [char; 3] = ['\\', '\'', ':'];

/// Characters that separate filters, chains or link labels in a filter graph
const GRAPH_SPECIAL: [char; 6] = ['\\', '\'', '[', ']', ',', ';'];

/// Escape a path for use as an ffmpeg filter option value.
///
/// ffmpeg unescapes a `-vf` argument twice: once when splitting the graph into
/// filters, then once more when splitting a filter's arguments into options.
pub fn escape_filter_value(path: &Path) -> String {
    let option = escape_with(&path.to_string_lossy(), &OPTION_SPECIAL);
    escape_with(&option, &GRAPH_SPECIAL)
}

fn escape_with(raw: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
