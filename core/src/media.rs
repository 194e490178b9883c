//! Local video discovery and upload naming.
use std::path::{Path, PathBuf};

use crate::error::StreamError;

/// Extensions offered in the source picker and accepted for upload.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "flv", "mkv", "mov"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// File names of the videos directly inside `dir`, sorted.
pub fn list_videos(dir: &Path) -> Result<Vec<String>, StreamError> {
    let pattern = format!(
        "{}{}*",
        glob::Pattern::escape(&dir.to_string_lossy()),
        std::path::MAIN_SEPARATOR
    );

    let entries = glob::glob_with(
        &pattern,
        glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        },
    )
    .map_err(|e| StreamError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|p| p.is_file() && is_video_file(p))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    names.sort();
    Ok(names)
}

/// Reduce a client-supplied upload name to a bare video file name.
pub fn sanitize_upload_name(raw: &str) -> Result<String, StreamError> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return Err(StreamError::InvalidUpload(format!(
            "unusable file name '{raw}'"
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(StreamError::InvalidUpload(
            "file name contains control characters".into(),
        ));
    }
    if !is_video_file(Path::new(name)) {
        return Err(StreamError::InvalidUpload(format!(
            "'{name}' is not one of: {}",
            VIDEO_EXTENSIONS.join(", ")
        )));
    }
    Ok(name.to_string())
}

/// Resolve a picker selection against the media directory.
///
/// Absolute paths are kept as given; relative ones are joined onto `media_dir`.
pub fn resolve_source(media_dir: &Path, source: &Path) -> Result<PathBuf, StreamError> {
    let path = if source.is_absolute() {
        source.to_path_buf()
    } else {
        media_dir.join(source)
    };
    if !path.is_file() {
        return Err(StreamError::SourceNotFound(path.display().to_string()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_only_video_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mkv", "a.mp4", "notes.txt", "C.MOV", ".hidden.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.mp4")).unwrap();

        let names = list_videos(dir.path()).unwrap();
        assert_eq!(names, vec!["C.MOV", "a.mp4", "b.mkv"]);
    }

    #[test]
    fn lists_in_directory_with_glob_metacharacters() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("clips [2024]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("intro.flv"), b"x").unwrap();

        assert_eq!(list_videos(&dir).unwrap(), vec!["intro.flv"]);
    }

    #[test]
    fn sanitize_keeps_last_component() {
        assert_eq!(sanitize_upload_name("../../etc/clip.mp4").unwrap(), "clip.mp4");
        assert_eq!(sanitize_upload_name(r"C:\Users\me\talk.mov").unwrap(), "talk.mov");
    }

    #[test]
    fn sanitize_rejects_bad_names() {
        assert!(sanitize_upload_name("").is_err());
        assert!(sanitize_upload_name("dir/").is_err());
        assert!(sanitize_upload_name("..").is_err());
        assert!(sanitize_upload_name("script.sh").is_err());
        assert!(sanitize_upload_name("a\nb.mp4").is_err());
    }

    #[test]
    fn resolve_source_joins_relative_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("v.mp4"), b"x").unwrap();

        let resolved = resolve_source(dir.path(), Path::new("v.mp4")).unwrap();
        assert_eq!(resolved, dir.path().join("v.mp4"));

        let err = resolve_source(dir.path(), Path::new("missing.mp4")).unwrap_err();
        assert!(matches!(err, StreamError::SourceNotFound(_)));
    }
}
