//! Expansion of directory references into the files they contain

use std::cmp::Ordering;
use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Visible files, including symlinks to files
fn is_listed_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_dir() || is_hidden(entry) {
        return false;
    }
    !(entry.path_is_symlink() && entry.path().is_dir())
}

/// Replace a directory reference by its files.
///
/// Directories are walked top-down. Hidden files are skipped, hidden
/// directories are still entered, and symlinked directories are not
/// followed. Within a directory, files come first by name, then each
/// subdirectory in name order. A reference that is not a directory, or a
/// directory without any visible file, is returned as is.
pub fn extend_directory(reference: &str) -> Vec<String> {
    let path = Path::new(reference);
    if !path.is_dir() {
        return vec![reference.to_string()];
    }

    let walker = WalkDir::new(path)
        .sort_by(|a, b| {
            match (a.file_type().is_dir(), b.file_type().is_dir()) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => a.file_name().cmp(b.file_name()),
            }
        })
        .into_iter();

    let mut paths = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if is_listed_file(&entry) => {
                paths.push(entry.path().to_string_lossy().into_owned());
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable entry under {}: {}", reference, e),
        }
    }

    if paths.is_empty() {
        return vec![reference.to_string()];
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn path_of(root: &Path, rel: &str) -> String {
        root.join(rel).to_string_lossy().into_owned()
    }

    #[test]
    fn test_sorted_without_hidden() {
        let temp = TempDir::new().unwrap();
        for name in ["b.py", "a.py", ".hidden.py"] {
            fs::write(temp.path().join(name), "").unwrap();
        }

        let root = temp.path().to_string_lossy().into_owned();
        assert_eq!(
            extend_directory(&root),
            vec![path_of(temp.path(), "a.py"), path_of(temp.path(), "b.py")]
        );
    }

    #[test]
    fn test_top_down_order() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(temp.path().join("another")).unwrap();
        fs::write(temp.path().join("z.sh"), "").unwrap();
        fs::write(temp.path().join("sub/x.sh"), "").unwrap();
        fs::write(temp.path().join("sub/deeper/y.sh"), "").unwrap();
        fs::write(temp.path().join("another/w.sh"), "").unwrap();
        fs::write(temp.path().join(".git/config"), "").unwrap();

        let root = temp.path().to_string_lossy().into_owned();
        let expanded = extend_directory(&root);
        assert_eq!(
            expanded,
            vec![
                path_of(temp.path(), "z.sh"),
                path_of(temp.path(), ".git/config"),
                path_of(temp.path(), "another/w.sh"),
                path_of(temp.path(), "sub/x.sh"),
                path_of(temp.path(), "sub/deeper/y.sh"),
            ]
        );

        let mut deduped = expanded.clone();
        deduped.dedup();
        assert_eq!(deduped, expanded);
    }

    #[test]
    fn test_hidden_directories_are_entered() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".sub")).unwrap();
        fs::write(temp.path().join("a.py"), "").unwrap();
        fs::write(temp.path().join(".sub/x.py"), "").unwrap();
        fs::write(temp.path().join(".sub/.skipped.py"), "").unwrap();

        let root = temp.path().to_string_lossy().into_owned();
        assert_eq!(
            extend_directory(&root),
            vec![path_of(temp.path(), "a.py"), path_of(temp.path(), ".sub/x.py")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("real")).unwrap();
        fs::write(temp.path().join("real/t.py"), "").unwrap();
        fs::write(temp.path().join("b.py"), "").unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("b.py"), temp.path().join("c.py")).unwrap();

        let root = temp.path().to_string_lossy().into_owned();
        assert_eq!(
            extend_directory(&root),
            vec![
                path_of(temp.path(), "b.py"),
                path_of(temp.path(), "c.py"),
                path_of(temp.path(), "real/t.py"),
            ]
        );
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(extend_directory("/does/not/exist"), vec!["/does/not/exist"]);

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.py");
        fs::write(&file, "").unwrap();
        let file = file.to_string_lossy().into_owned();
        assert_eq!(extend_directory(&file), vec![file.clone()]);

        let empty = temp.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let empty = empty.to_string_lossy().into_owned();
        assert_eq!(extend_directory(&empty), vec![empty.clone()]);
    }
}
