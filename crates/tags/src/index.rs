use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jihou_core::{note_key, FsNoteStore, NoteSink, NoteSource, StoreError};

use crate::error::{InvalidTagReason, TagError};
use crate::persist::{self, FileTagMap, TAGS_FILE_NAME};

/// 標籤變更通知。 / Notified after every effective tag-index mutation.
pub trait TagObserver {
    fn on_tags_changed(&mut self, vocabulary: &BTreeSet<String>, file_tags: &FileTagMap);
}

impl<F> TagObserver for F
where
    F: FnMut(&BTreeSet<String>, &FileTagMap),
{
    fn on_tags_changed(&mut self, vocabulary: &BTreeSet<String>, file_tags: &FileTagMap) {
        self(vocabulary, file_tags)
    }
}

/// 檔案與標籤的雙向索引。 / Two-way index between note keys and tags.
///
/// `file_tags` maps a note key to its tags; `tag_files` is the inverse and its
/// keys are the tag vocabulary, so a declared tag with no files is a key with
/// an empty set. Both maps change together inside every mutating method.
/// Files left without tags are dropped from `file_tags`.
pub struct TagIndex {
    path: PathBuf,
    root: PathBuf,
    file_tags: FileTagMap,
    tag_files: BTreeMap<String, BTreeSet<String>>,
    autosave: bool,
    sink: Arc<dyn NoteSink + Send + Sync>,
    observers: Vec<Box<dyn TagObserver + Send>>,
}

impl fmt::Debug for TagIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagIndex")
            .field("path", &self.path)
            .field("file_tags", &self.file_tags)
            .field("vocabulary", &self.tag_files.keys().collect::<Vec<_>>())
            .field("autosave", &self.autosave)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl TagIndex {
    /// Creates an empty index persisted at `path`. Keys are relative to the
    /// directory holding `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            root,
            file_tags: FileTagMap::new(),
            tag_files: BTreeMap::new(),
            autosave: false,
            sink: Arc::new(FsNoteStore::new()),
            observers: Vec::new(),
        }
    }

    /// 載入 `<data_root>/.tags.json`。 / Loads the index stored under a data root.
    pub fn open(data_root: impl AsRef<Path>) -> Self {
        Self::load(data_root.as_ref().join(TAGS_FILE_NAME))
    }

    /// Loads the index at `path`. A missing, unreadable or corrupt file yields
    /// an empty index; the failure is logged, never returned.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load_strict(path.clone()) {
            Ok(index) => index,
            Err(err) => {
                log::warn!("starting with an empty tag index: {err}");
                Self::empty(path)
            }
        }
    }

    /// Like [`TagIndex::load`] but reports read and parse failures.
    pub fn load_strict(path: impl Into<PathBuf>) -> Result<Self, TagError> {
        let mut index = Self::empty(path);
        let contents = match FsNoteStore::new().read_text(&index.path) {
            Ok(contents) => contents,
            Err(StoreError::NotFound { .. }) => return Ok(index),
            Err(source) => {
                return Err(TagError::Read {
                    path: index.path.clone(),
                    source,
                })
            }
        };
        let stored = persist::decode(&contents).map_err(|source| TagError::Corrupt {
            path: index.path.clone(),
            source,
        })?;
        for (file, tags) in stored {
            let key = index.key_for(Path::new(&file));
            for tag in tags {
                if let Ok(tag) = clean_tag(&tag) {
                    index.insert_pair(&key, &tag);
                }
            }
        }
        log::info!(
            "loaded tag index {} ({} files, {} tags)",
            index.path.display(),
            index.file_tags.len(),
            index.tag_files.len()
        );
        Ok(index)
    }

    /// Saves after every effective mutation when enabled.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Replaces the writer used by [`TagIndex::save`].
    pub fn with_sink(mut self, sink: Arc<dyn NoteSink + Send + Sync>) -> Self {
        self.sink = sink;
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn TagObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// Normalised key under which `file` is indexed.
    pub fn key_for(&self, file: &Path) -> String {
        note_key(&self.root, file)
    }

    /// Filesystem path of an indexed key.
    pub fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// 宣告尚未使用的標籤。 / Adds a tag to the vocabulary without attaching it to a file.
    pub fn declare_tag(&mut self, tag: &str) -> Result<bool, TagError> {
        let tag = clean_tag(tag)?;
        if self.tag_files.contains_key(&tag) {
            return Ok(false);
        }
        self.tag_files.insert(tag, BTreeSet::new());
        self.notify();
        Ok(true)
    }

    /// 為檔案加上標籤。 / Attaches `tag` to `file`; returns `false` when already attached.
    pub fn add_tag(&mut self, file: impl AsRef<Path>, tag: &str) -> Result<bool, TagError> {
        let tag = clean_tag(tag)?;
        let key = self.key_for(file.as_ref());
        if !self.insert_pair(&key, &tag) {
            return Ok(false);
        }
        self.after_mutation()?;
        Ok(true)
    }

    /// 移除檔案上的標籤。 / Detaches `tag` from `file`; returns `false` when it was not attached.
    ///
    /// The tag stays in the vocabulary.
    pub fn remove_tag(&mut self, file: impl AsRef<Path>, tag: &str) -> Result<bool, TagError> {
        let tag = tag.trim();
        let key = self.key_for(file.as_ref());
        let removed = match self.file_tags.get_mut(&key) {
            Some(tags) => tags.remove(tag),
            None => false,
        };
        if !removed {
            return Ok(false);
        }
        self.drop_file_if_untagged(&key);
        if let Some(files) = self.tag_files.get_mut(tag) {
            files.remove(&key);
        }
        self.after_mutation()?;
        Ok(true)
    }

    /// 重新命名標籤；若新名稱已存在則合併。 / Renames `old` to `new` everywhere, merging into `new` when it already exists.
    ///
    /// Returns `false` when `old` is not in the vocabulary.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<bool, TagError> {
        let new = clean_tag(new)?;
        let old = old.trim();
        if old == new {
            return Err(TagError::invalid(old, InvalidTagReason::SameName));
        }
        let Some(files) = self.tag_files.remove(old) else {
            return Ok(false);
        };
        for key in &files {
            if let Some(tags) = self.file_tags.get_mut(key) {
                tags.remove(old);
                tags.insert(new.clone());
            }
        }
        self.tag_files.entry(new).or_default().extend(files);
        self.after_mutation()?;
        Ok(true)
    }

    /// 刪除標籤並自所有檔案移除。 / Removes `tag` from the vocabulary and from every file.
    pub fn delete_tag(&mut self, tag: &str) -> Result<bool, TagError> {
        let tag = tag.trim();
        let Some(files) = self.tag_files.remove(tag) else {
            return Ok(false);
        };
        for key in &files {
            if let Some(tags) = self.file_tags.get_mut(key) {
                tags.remove(tag);
            }
            self.drop_file_if_untagged(key);
        }
        self.after_mutation()?;
        Ok(true)
    }

    /// Moves the tags of `old` to `new` after the note was renamed or moved.
    pub fn rename_file(
        &mut self,
        old: impl AsRef<Path>,
        new: impl AsRef<Path>,
    ) -> Result<bool, TagError> {
        let old_key = self.key_for(old.as_ref());
        let new_key = self.key_for(new.as_ref());
        if old_key == new_key {
            return Ok(false);
        }
        let Some(tags) = self.file_tags.remove(&old_key) else {
            return Ok(false);
        };
        for tag in &tags {
            if let Some(files) = self.tag_files.get_mut(tag) {
                files.remove(&old_key);
                files.insert(new_key.clone());
            }
        }
        self.file_tags.entry(new_key).or_default().extend(tags);
        self.after_mutation()?;
        Ok(true)
    }

    /// Drops every tag of a deleted note. The tags stay in the vocabulary.
    pub fn forget_file(&mut self, file: impl AsRef<Path>) -> Result<bool, TagError> {
        let key = self.key_for(file.as_ref());
        let Some(tags) = self.file_tags.remove(&key) else {
            return Ok(false);
        };
        for tag in &tags {
            if let Some(files) = self.tag_files.get_mut(tag) {
                files.remove(&key);
            }
        }
        self.after_mutation()?;
        Ok(true)
    }

    /// 取得帶有標籤的所有檔案鍵值。 / Keys of every file carrying `tag`; empty for unknown tags.
    pub fn files_for_tag(&self, tag: &str) -> BTreeSet<String> {
        self.tag_files.get(tag.trim()).cloned().unwrap_or_default()
    }

    pub fn tags_for_file(&self, file: impl AsRef<Path>) -> BTreeSet<String> {
        let key = self.key_for(file.as_ref());
        self.file_tags.get(&key).cloned().unwrap_or_default()
    }

    /// Every known tag in sorted order, including declared but unused ones.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.tag_files.keys().map(String::as_str)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tag_files.contains_key(tag.trim())
    }

    pub fn file_tags(&self) -> &FileTagMap {
        &self.file_tags
    }

    pub fn is_empty(&self) -> bool {
        self.tag_files.is_empty()
    }

    /// 將完整索引寫回磁碟。 / Serialises the whole file→tags map and writes it out.
    pub fn save(&self) -> Result<(), TagError> {
        let payload = persist::encode(&self.file_tags).map_err(|source| TagError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        self.sink
            .write_text(&self.path, &payload)
            .map_err(|source| TagError::Write {
                path: self.path.clone(),
                source,
            })?;
        log::debug!(
            "saved tag index {} ({} files)",
            self.path.display(),
            self.file_tags.len()
        );
        Ok(())
    }

    /// Checks that the inverse index mirrors `file_tags` and that every
    /// attached tag is in the vocabulary.
    pub fn is_consistent(&self) -> bool {
        let forward_ok = self.file_tags.iter().all(|(key, tags)| {
            !tags.is_empty()
                && tags.iter().all(|tag| {
                    self.tag_files
                        .get(tag)
                        .map_or(false, |files| files.contains(key))
                })
        });
        let inverse_ok = self.tag_files.iter().all(|(tag, files)| {
            files.iter().all(|key| {
                self.file_tags
                    .get(key)
                    .map_or(false, |tags| tags.contains(tag))
            })
        });
        forward_ok && inverse_ok
    }

    fn insert_pair(&mut self, key: &str, tag: &str) -> bool {
        let inserted = self
            .file_tags
            .entry(key.to_string())
            .or_default()
            .insert(tag.to_string());
        self.tag_files
            .entry(tag.to_string())
            .or_default()
            .insert(key.to_string());
        inserted
    }

    fn drop_file_if_untagged(&mut self, key: &str) {
        if self.file_tags.get(key).map_or(false, BTreeSet::is_empty) {
            self.file_tags.remove(key);
        }
    }

    fn after_mutation(&mut self) -> Result<(), TagError> {
        self.notify();
        if self.autosave {
            self.save()?;
        }
        Ok(())
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let vocabulary: BTreeSet<String> = self.tag_files.keys().cloned().collect();
        for observer in &mut self.observers {
            observer.on_tags_changed(&vocabulary, &self.file_tags);
        }
    }
}

fn clean_tag(tag: &str) -> Result<String, TagError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(TagError::invalid(tag, InvalidTagReason::Empty));
    }
    Ok(trimmed.to_string())
}
