//! Stand-in ffmpeg and whisper executables for end-to-end tests.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use mediaflow::config::Config;
use tempfile::TempDir;
use walkdir::WalkDir;

/// How the fake speech-to-text tool behaves
#[derive(Debug, Clone, Copy)]
pub enum Whisper {
    /// Writes `<stem>.srt` into `--output_dir` and exits 0
    Works,
    /// Prints a diagnostic and exits 2
    Fails,
    /// Exits 0 without writing anything
    Silent,
}

pub struct FakeTools {
    pub root: TempDir,
    pub uploads: PathBuf,
    pub log: PathBuf,
    ffmpeg: PathBuf,
    whisper: PathBuf,
}

const FFMPEG: &str = r#"#!/bin/sh
echo "ffmpeg $*" >> "__LOG__"
if [ "$1" = "-version" ]; then echo "ffmpeg version fake"; exit 0; fi
input=""
prev=""
keep=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then input="$arg"; fi
  if [ "$arg" = "-n" ]; then keep=1; fi
  prev="$arg"
done
if [ -n "$keep" ] && [ -e "$prev" ]; then
  echo "File '$prev' already exists. Exiting." >&2
  exit 1
fi
cp "$input" "$prev"
"#;

/// Prepended to the fake ffmpeg body when overlap detection is on
const OVERLAP_GUARD: &str = r#"if ! mkdir "__LOG__.lock" 2>/dev/null; then
  echo overlap >> "__LOG__.overlap"
fi
sleep 0.2
"#;

const OVERLAP_RELEASE: &str = r#"rmdir "__LOG__.lock" 2>/dev/null
"#;

const WHISPER_WORKS: &str = r#"#!/bin/sh
echo "whisper $*" >> "__LOG__"
if [ "$1" = "--help" ]; then exit 0; fi
video="$1"
outdir=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "--output_dir" ]; then outdir="$arg"; fi
  prev="$arg"
done
base=$(basename "$video")
printf '1\n00:00:00,000 --> 00:00:01,000\nhello\n' > "$outdir/${base%.*}.srt"
"#;

const WHISPER_FAILS: &str = r#"#!/bin/sh
echo "whisper $*" >> "__LOG__"
echo "RuntimeError: model failed to load" >&2
exit 2
"#;

const WHISPER_SILENT: &str = r#"#!/bin/sh
echo "whisper $*" >> "__LOG__"
exit 0
"#;

impl FakeTools {
    pub fn new(whisper: Whisper) -> Self {
        Self::build(whisper, false)
    }

    /// Fake ffmpeg that records when two invocations overlap in time
    pub fn detecting_overlap() -> Self {
        Self::build(Whisper::Works, true)
    }

    fn build(whisper: Whisper, detect_overlap: bool) -> Self {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let log = root.path().join("invocations.log");

        let whisper_script = match whisper {
            Whisper::Works => WHISPER_WORKS,
            Whisper::Fails => WHISPER_FAILS,
            Whisper::Silent => WHISPER_SILENT,
        };
        let ffmpeg_script = if detect_overlap {
            let (shebang, body) = FFMPEG.split_once('\n').unwrap();
            format!("{}\n{}{}{}", shebang, OVERLAP_GUARD, body, OVERLAP_RELEASE)
        } else {
            FFMPEG.to_string()
        };
        let ffmpeg = write_script(root.path(), "ffmpeg", &ffmpeg_script, &log);
        let whisper = write_script(root.path(), "whisper", whisper_script, &log);

        Self { root, uploads, log, ffmpeg, whisper }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.media.binary_path = self.ffmpeg.to_string_lossy().into_owned();
        config.transcriber.binary_path = self.whisper.to_string_lossy().into_owned();
        config.server.upload_dir = self.uploads.clone();
        config.pipeline.stage_timeout_secs = 30;
        config
    }

    /// Tool names in invocation order
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(|line| line.split_whitespace().next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn invocation_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn overlapped(&self) -> bool {
        self.log.with_extension("log.overlap").exists()
    }

    /// Names of all files under the upload directory, job directories included
    pub fn upload_names(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.uploads)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Job directories created directly under the upload directory
    pub fn job_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.uploads)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        dirs
    }

    pub fn place_video(&self, name: &str) -> PathBuf {
        let path = self.uploads.join(name);
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }
}

fn write_script(dir: &Path, name: &str, template: &str, log: &Path) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, template.replace("__LOG__", &log.to_string_lossy())).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}
