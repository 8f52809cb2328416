use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use walkdir::WalkDir;

use crate::error::StoreError;
use crate::note_path::{is_note_file, DEFAULT_NOTE_EXTENSIONS};

/// 目錄列舉所產生的項目。 / One entry produced by a recursive directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Lazy recursive listing. Per-entry failures surface as `Err` items.
pub type NoteEntries<'a> = Box<dyn Iterator<Item = Result<NoteEntry, StoreError>> + 'a>;

/// 提供目錄列舉與文字讀取的協作者。 / Collaborator supplying directory listings and note text.
pub trait NoteSource {
    /// Lists `root` recursively. Fails up front when `root` itself cannot be enumerated.
    fn list_files(&self, root: &Path) -> Result<NoteEntries<'_>, StoreError>;

    fn read_text(&self, path: &Path) -> Result<String, StoreError>;
}

/// 寫入文字的協作者。 / Collaborator persisting text.
pub trait NoteSink {
    fn write_text(&self, path: &Path, contents: &str) -> Result<(), StoreError>;
}

/// 以本機檔案系統實作的筆記儲存。 / Note store backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    extensions: Vec<String>,
    default_extension: String,
}

impl Default for FsNoteStore {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_NOTE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            default_extension: DEFAULT_NOTE_EXTENSIONS[0].to_string(),
        }
    }
}

impl FsNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the recognised note extensions. `default_extension` is
    /// appended by [`FsNoteStore::create_note`] to names without one.
    pub fn with_extensions<I, S>(extensions: I, default_extension: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        let default_extension = default_extension.into().trim_start_matches('.').to_string();
        let mut store = Self::default();
        if !extensions.is_empty() {
            store.extensions = extensions;
        }
        if store.extensions.contains(&default_extension) {
            store.default_extension = default_extension;
        } else {
            store.default_extension = store.extensions[0].clone();
        }
        store
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    pub fn is_note(&self, path: &Path) -> bool {
        is_note_file(path, &self.extensions)
    }

    /// 在目錄中建立空白筆記。 / Creates an empty note inside `dir`.
    ///
    /// Names without a recognised extension receive the default one. Never
    /// overwrites an existing file.
    pub fn create_note(&self, dir: &Path, name: &str) -> Result<PathBuf, StoreError> {
        let mut file_name = name.trim().to_string();
        if file_name.is_empty() {
            return Err(StoreError::from_io(
                dir,
                io::Error::new(io::ErrorKind::InvalidInput, "note name is empty"),
            ));
        }
        if !self.is_note(Path::new(&file_name)) {
            file_name.push('.');
            file_name.push_str(&self.default_extension);
        }
        let path = dir.join(file_name);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| StoreError::from_io(&path, err))?;
        log::debug!("created note {}", path.display());
        Ok(path)
    }

    /// 建立資料夾（含缺少的上層目錄）。 / Creates a folder, including missing parents.
    pub fn create_folder(&self, dir: &Path, name: &str) -> Result<PathBuf, StoreError> {
        let path = dir.join(name.trim());
        if path.exists() {
            return Err(StoreError::AlreadyExists { path });
        }
        fs::create_dir_all(&path).map_err(|err| StoreError::from_io(&path, err))?;
        Ok(path)
    }

    /// Copies an external text file into `target_dir`, re-encoded as UTF-8.
    pub fn import_note(
        &self,
        source: &Path,
        target_dir: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, StoreError> {
        let text = self.read_text(source)?;
        let file_name = source.file_name().ok_or_else(|| {
            StoreError::from_io(
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
            )
        })?;
        let target = target_dir.join(file_name);
        if !overwrite && target.exists() {
            return Err(StoreError::AlreadyExists { path: target });
        }
        self.write_text(&target, &text)?;
        Ok(target)
    }

    /// Writes the text of the note at `path` to `destination`.
    pub fn export_note(&self, path: &Path, destination: &Path) -> Result<(), StoreError> {
        let text = self.read_text(path)?;
        self.write_text(destination, &text)
    }
}

impl NoteSource for FsNoteStore {
    fn list_files(&self, root: &Path) -> Result<NoteEntries<'_>, StoreError> {
        fs::read_dir(root).map_err(|err| StoreError::from_io(root, err))?;
        let root = root.to_path_buf();
        let walker = WalkDir::new(root.clone())
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| match entry {
                Ok(entry) => Ok(NoteEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                }),
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone());
                    Err(StoreError::from_io(path, io::Error::from(err)))
                }
            });
        Ok(Box::new(walker))
    }

    fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        let bytes = fs::read(path).map_err(|err| StoreError::from_io(path, err))?;
        decode_text(&bytes).ok_or_else(|| StoreError::Decode {
            path: path.to_path_buf(),
        })
    }
}

impl NoteSink for FsNoteStore {
    fn write_text(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        write_atomic(path, contents.as_bytes())
    }
}

/// 先寫入暫存檔再重新命名，避免部分寫入。 / Writes through a temporary sibling plus rename so readers never see a partial file.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| StoreError::from_io(parent, err))?;
    }
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    {
        let mut tmp_file =
            File::create(&tmp_path).map_err(|err| StoreError::from_io(&tmp_path, err))?;
        let written = tmp_file
            .write_all(data)
            .and_then(|()| tmp_file.sync_all());
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::from_io(path, err));
        }
    }
    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::from_io(path, err)
    })
}

/// Decodes UTF-8 (optionally BOM-prefixed) or BOM-marked UTF-16 bytes.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return None;
        }
        return Some(text.into_owned());
    }
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}
