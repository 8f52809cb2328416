use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::store::NoteSource;

/// 供語法標示使用的筆記內容。 / Note text as handed to the highlighter.
///
/// Newlines are normalised to `\n`, so `\r\n` and lone `\r` files scan the
/// same way. Editing and dirty tracking belong to the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    path: PathBuf,
    contents: String,
}

impl Note {
    /// 透過儲存協作者載入筆記。 / Loads a note through the given source.
    pub fn open(source: &impl NoteSource, path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = source.read_text(path)?;
        Ok(Self::from_text(path, text))
    }

    /// Wraps text the caller already holds, e.g. an unsaved editor buffer.
    pub fn from_text(path: impl Into<PathBuf>, text: impl AsRef<str>) -> Self {
        Self {
            path: path.into(),
            contents: normalize_newlines(text.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.contents.split('\n')
    }
}

fn normalize_newlines(input: &str) -> String {
    if !input.contains('\r') {
        return input.to_string();
    }
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                result.push('\n');
            }
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsNoteStore;
    use std::fs;

    #[test]
    fn open_normalises_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.md");
        fs::write(&path, b"# title\r\nbody\r\n").unwrap();

        let note = Note::open(&FsNoteStore::new(), &path).unwrap();
        assert_eq!(note.contents(), "# title\nbody\n");
        assert_eq!(note.path(), path.as_path());
    }

    #[test]
    fn open_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = Note::open(&FsNoteStore::new(), dir.path().join("gone.md")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }

    #[test]
    fn lone_carriage_returns_become_newlines() {
        let note = Note::from_text("a.md", "a\rb\r\nc");
        assert_eq!(note.lines().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn lines_keep_trailing_empty_line() {
        let note = Note::from_text("a.md", "a\nb\n");
        assert_eq!(note.lines().collect::<Vec<_>>(), vec!["a", "b", ""]);
    }
}
