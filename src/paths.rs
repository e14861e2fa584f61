//! Derivation of artifact paths.
//!
//! Every stage writes next to its input: `dir/name.mp4` becomes
//! `dir/name-{suffix}.mp4`, and the subtitle track of `dir/name.mp4` lives at
//! `dir/name.srt`.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{MediaflowError, Result};

/// Extensions accepted as pipeline input, compared case-insensitively.
pub const MEDIA_EXTENSIONS: [&str; 6] = ["mp4", "mov", "mkv", "avi", "webm", "m4v"];

pub const SUBTITLE_EXTENSION: &str = "srt";

/// Returns the media extension of `path` with its original casing.
fn media_extension(path: &Path) -> Result<&str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .ok_or_else(|| MediaflowError::UnsupportedFormat(path.display().to_string()))
}

fn media_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| MediaflowError::UnsupportedFormat(path.display().to_string()))
}

pub fn is_media_file(path: &Path) -> bool {
    media_extension(path).is_ok()
}

/// Derive the output path of a stage: `dir/name.ext` -> `dir/name-{suffix}.ext`.
pub fn derive<P: AsRef<Path>>(path: P, suffix: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    let ext = media_extension(path)?;
    let stem = media_stem(path)?;
    Ok(path.with_file_name(format!("{}-{}.{}", stem, suffix, ext)))
}

/// Path of the subtitle track the speech-to-text tool writes for `video`.
pub fn subtitle_path<P: AsRef<Path>>(video: P) -> Result<PathBuf> {
    let video = video.as_ref();
    media_extension(video)?;
    let stem = media_stem(video)?;
    Ok(video.with_file_name(format!("{}.{}", stem, SUBTITLE_EXTENSION)))
}

/// True when the file stem ends with a prefix of the stage chain.
///
/// `suffixes` is the ordered list of stage suffixes. A pipeline output carries
/// them cumulatively (`-a`, `-a-b`, `-a-b-c`...), so a lone later suffix such
/// as `holiday-b` is an ordinary source name.
pub fn is_derived(path: &Path, suffixes: &[&str]) -> bool {
    let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
        return false;
    };

    let mut chain = String::new();
    suffixes.iter().any(|suffix| {
        chain.push('-');
        chain.push_str(suffix);
        stem.len() > chain.len() && stem.ends_with(&chain)
    })
}

/// Name of the directory holding one upload and everything derived from it.
pub fn job_dir_name(unix_millis: i64) -> String {
    format!("{}-{}", unix_millis, Uuid::new_v4().simple())
}

/// Storage name for an upload: `{unix_millis}-{original}`.
pub fn upload_file_name(unix_millis: i64, original: Option<&str>) -> String {
    let name = original
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty() && name.chars().any(|c| c != '.'));

    match name {
        Some(name) => format!("{}-{}", unix_millis, name),
        None => format!("{}-upload-{}.mp4", unix_millis, Uuid::new_v4()),
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}
