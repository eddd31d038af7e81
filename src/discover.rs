//! Expansion of directory inputs into media files.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Expand `path` into the files to process.
///
/// A directory is walked recursively; a file (or a path that does not exist)
/// is returned unchanged.
pub fn expand_input(path: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if path.is_dir() {
        discover_media(path, extensions)
    } else {
        vec![path.to_path_buf()]
    }
}

/// Every file below `dir` whose extension is in `extensions`, sorted.
pub fn discover_media(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_media_file(path, extensions))
        .collect();

    files.sort();
    debug!("Found {} media files in {}", files.len(), dir.display());
    files
}

/// Case-insensitive extension check. Entries may carry a leading dot.
pub fn is_media_file(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["mkv".to_string(), ".avi".to_string()]
    }

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("/m/a.mkv"), &exts()));
        assert!(is_media_file(Path::new("/m/a.AVI"), &exts()));
        assert!(!is_media_file(Path::new("/m/a.srt"), &exts()));
        assert!(!is_media_file(Path::new("/m/README"), &exts()));
    }

    #[test]
    fn test_discover_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("season1")).unwrap();
        fs::write(dir.path().join("season1/e02.mkv"), b"").unwrap();
        fs::write(dir.path().join("season1/e01.avi"), b"").unwrap();
        fs::write(dir.path().join("season1/e01.srt"), b"").unwrap();
        fs::write(dir.path().join("movie.mkv"), b"").unwrap();

        let found = discover_media(dir.path(), &exts());
        assert_eq!(
            found,
            [
                dir.path().join("movie.mkv"),
                dir.path().join("season1/e01.avi"),
                dir.path().join("season1/e02.mkv"),
            ]
        );
    }

    #[test]
    fn test_expand_file_unchanged() {
        let path = Path::new("/does/not/exist.mkv");
        assert_eq!(expand_input(path, &exts()), [path.to_path_buf()]);
    }
}
