//! Note path keys.
//!
//! The tag index and search results identify a note by a string key. Keys are
//! derived lexically: the data root is stripped, `.` and `..` components are
//! resolved without touching the filesystem, and components are joined with
//! `/` on every platform. Keys are never case-folded and symlinks are never
//! followed, so two spellings of the same file only share a key when the caller
//! canonicalizes them first.

use std::path::{Component, Path, PathBuf};

/// Extensions recognised as notes when no configuration overrides them.
pub const DEFAULT_NOTE_EXTENSIONS: &[&str] = &["md", "txt"];

/// 以純字面方式正規化路徑。 / Lexically normalises a path, resolving `.` and `..`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns the key identifying `path` within the data root.
///
/// Relative inputs are interpreted relative to `root`. Paths outside the root
/// keep their full normalised form.
pub fn note_key(root: &Path, path: &Path) -> String {
    let absolute = if path.is_relative() {
        root.join(path)
    } else {
        path.to_path_buf()
    };
    let root = normalize(root);
    let absolute = normalize(&absolute);
    match absolute.strip_prefix(&root) {
        Ok(relative) => to_key(relative),
        Err(_) => to_key(&absolute),
    }
}

/// Joins the components of `path` with `/`.
pub fn to_key(path: &Path) -> String {
    let mut key = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => key.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => key.push('/'),
            Component::CurDir => {}
            Component::ParentDir => push_segment(&mut key, ".."),
            Component::Normal(part) => push_segment(&mut key, &part.to_string_lossy()),
        }
    }
    key
}

fn push_segment(key: &mut String, segment: &str) {
    if !key.is_empty() && !key.ends_with('/') {
        key.push('/');
    }
    key.push_str(segment);
}

/// Exact, case-sensitive check that the file name ends in `.<ext>`.
///
/// A bare `.md` counts as a note, unlike `Path::extension`, which treats it as
/// a dot-file with no extension.
pub fn is_note_file<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    extensions.iter().any(|candidate| {
        let ext = candidate.as_ref().trim_start_matches('.');
        !ext.is_empty()
            && name
                .strip_suffix(ext)
                .is_some_and(|stem| stem.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn keys_are_root_relative_and_slash_separated() {
        let root = Path::new("/data/notes");
        assert_eq!(note_key(root, Path::new("/data/notes/work/a.md")), "work/a.md");
        assert_eq!(note_key(root, Path::new("work/./b.md")), "work/b.md");
        assert_eq!(
            note_key(root, Path::new("/data/notes/work/../c.txt")),
            "c.txt"
        );
    }

    #[test]
    fn keys_outside_root_stay_absolute() {
        let root = Path::new("/data/notes");
        assert_eq!(note_key(root, Path::new("/tmp/x.md")), "/tmp/x.md");
    }

    #[test]
    fn keys_keep_case() {
        let root = Path::new("/data");
        assert_ne!(
            note_key(root, Path::new("Readme.md")),
            note_key(root, Path::new("README.md"))
        );
    }

    #[test]
    fn note_extensions_are_case_sensitive() {
        assert!(is_note_file(Path::new("a.md"), DEFAULT_NOTE_EXTENSIONS));
        assert!(is_note_file(Path::new("dir/b.txt"), DEFAULT_NOTE_EXTENSIONS));
        assert!(!is_note_file(Path::new("c.png"), DEFAULT_NOTE_EXTENSIONS));
        assert!(!is_note_file(Path::new("D.MD"), DEFAULT_NOTE_EXTENSIONS));
        assert!(!is_note_file(Path::new("md"), DEFAULT_NOTE_EXTENSIONS));
        assert!(is_note_file(Path::new("e.org"), &[".org"]));
    }

    #[test]
    fn bare_extension_file_names_are_notes() {
        assert!(is_note_file(Path::new(".md"), DEFAULT_NOTE_EXTENSIONS));
        assert!(is_note_file(Path::new("dir/.txt"), DEFAULT_NOTE_EXTENSIONS));
        assert!(is_note_file(Path::new("a.tar.md"), DEFAULT_NOTE_EXTENSIONS));
        assert!(!is_note_file(Path::new(".mdx"), DEFAULT_NOTE_EXTENSIONS));
        assert!(!is_note_file(Path::new("notmd"), DEFAULT_NOTE_EXTENSIONS));
        assert!(!is_note_file(Path::new("a.md"), &[""]));
    }
}
