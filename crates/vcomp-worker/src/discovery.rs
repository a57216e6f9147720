//! Source discovery and the existing-output check.

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use vcomp_models::batch::is_source_file;

/// Every source file under `input_dir`, recursively, in a stable order.
///
/// Entries are sorted by file name within each directory, so the order only
/// depends on the filesystem state. Unreadable entries are logged and skipped.
pub fn find_sources(input_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(input_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", input_dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Whether `output_dir` already holds an entry whose stem is `stem`, whatever
/// its extension or kind.
pub fn output_has_stem(output_dir: &Path, stem: &str) -> io::Result<bool> {
    for entry in std::fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.file_stem().is_some_and(|s| s.to_string_lossy() == stem) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_find_sources_recursive_and_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("b.mkv"));
        touch(&root.join("a.MKV"));
        touch(&root.join("notes.txt"));
        touch(&root.join("clip.mp4"));
        touch(&root.join("season/ep02.mkv"));
        touch(&root.join("season/ep01.Mkv"));
        fs::create_dir_all(root.join("folder.mkv")).unwrap();

        let found: Vec<String> = find_sources(root)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(found, vec!["a.MKV", "b.mkv", "season/ep01.Mkv", "season/ep02.mkv"]);
    }

    #[test]
    fn test_find_sources_is_deterministic() {
        let dir = TempDir::new().unwrap();
        for name in ["z.mkv", "m.mkv", "a.mkv"] {
            touch(&dir.path().join(name));
        }
        assert_eq!(find_sources(dir.path()), find_sources(dir.path()));
    }

    #[test]
    fn test_output_has_stem_ignores_extension() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("movie.avi"));

        assert!(output_has_stem(dir.path(), "movie").unwrap());
        assert!(!output_has_stem(dir.path(), "mov").unwrap());
        assert!(!output_has_stem(dir.path(), "movie.avi").unwrap());
    }

    #[test]
    fn test_output_has_stem_matches_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("extras")).unwrap();

        assert!(output_has_stem(dir.path(), "extras").unwrap());
    }

    #[test]
    fn test_output_has_stem_missing_dir() {
        assert!(output_has_stem(Path::new("/nonexistent/vcomp-out"), "movie").is_err());
    }
}
