//! Spoken file paths

use std::path::PathBuf;

use directories::BaseDirs;

/// Expand a leading `~` to the home directory
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw != "~" && !raw.starts_with("~/") {
        return PathBuf::from(raw);
    }

    let Some(dirs) = BaseDirs::new() else {
        return PathBuf::from(raw);
    };
    let home = dirs.home_dir();

    raw.strip_prefix("~/")
        .map_or_else(|| home.to_path_buf(), |rest| home.join(rest))
}

/// Expanded path if it exists on disk
#[must_use]
pub fn resolve_existing(raw: &str) -> Option<PathBuf> {
    if raw.trim().is_empty() {
        return None;
    }
    let path = expand_path(raw);
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_untouched() {
        assert_eq!(expand_path(" /tmp/notes.txt "), PathBuf::from("/tmp/notes.txt"));
        assert_eq!(expand_path("report~1.txt"), PathBuf::from("report~1.txt"));
    }

    #[test]
    fn test_tilde_expansion() {
        let Some(dirs) = BaseDirs::new() else {
            return;
        };
        assert_eq!(expand_path("~"), dirs.home_dir());
        assert_eq!(expand_path("~/notes.txt"), dirs.home_dir().join("notes.txt"));
    }

    #[test]
    fn test_resolve_existing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("todo.txt");
        std::fs::write(&file, "milk").unwrap();

        assert_eq!(resolve_existing(file.to_str().unwrap()), Some(file));
        assert!(resolve_existing(dir.path().join("missing.txt").to_str().unwrap()).is_none());
        assert!(resolve_existing("  ").is_none());
    }
}
