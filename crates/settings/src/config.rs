use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jihou_core::{normalize, write_atomic, FsNoteStore, StoreError, DEFAULT_NOTE_EXTENSIONS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_dir::{copy_tree, fallback_data_dir};

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config: {0}")]
    Write(#[source] StoreError),
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("data directory {to} cannot live inside {from}")]
    NestedDataDir { from: PathBuf, to: PathBuf },
}

/// 應用程式設定（`config.json`）。 / Contents of `config.json`.
///
/// Keys this version does not know are kept in `extra` and written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default = "default_extensions")]
    pub note_extensions: Vec<String>,
    #[serde(default = "default_extension")]
    pub default_extension: String,
    #[serde(default)]
    pub tags: TagPreferences,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_NOTE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_extension() -> String {
    DEFAULT_NOTE_EXTENSIONS[0].to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            note_extensions: default_extensions(),
            default_extension: default_extension(),
            tags: TagPreferences::default(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn sanitize(&mut self) {
        let mut extensions: Vec<String> = Vec::new();
        for ext in &self.note_extensions {
            let ext = clean_extension(ext);
            if !ext.is_empty() && !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
        if extensions.is_empty() {
            extensions = default_extensions();
        }
        self.note_extensions = extensions;

        let preferred = clean_extension(&self.default_extension);
        self.default_extension = if self.note_extensions.contains(&preferred) {
            preferred
        } else {
            self.note_extensions[0].clone()
        };
    }

    /// Note store recognising the configured extensions.
    pub fn note_store(&self) -> FsNoteStore {
        FsNoteStore::with_extensions(
            self.note_extensions.iter().cloned(),
            self.default_extension.clone(),
        )
    }
}

fn clean_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPreferences {
    /// Save `.tags.json` after every tag mutation.
    #[serde(default = "default_true")]
    pub autosave: bool,
}

impl Default for TagPreferences {
    fn default() -> Self {
        Self { autosave: true }
    }
}

#[derive(Debug)]
pub struct ConfigStore {
    app_dir: PathBuf,
    path: PathBuf,
    data: AppConfig,
}

impl ConfigStore {
    pub fn new(app_dir: impl Into<PathBuf>, config: AppConfig) -> Self {
        let app_dir = app_dir.into();
        let mut store = Self {
            path: app_dir.join(CONFIG_FILE_NAME),
            app_dir,
            data: config,
        };
        store.sanitize();
        store
    }

    /// Loads `<app_dir>/config.json`.
    ///
    /// A missing file yields the defaults, which are written out straight
    /// away. A file that cannot be read or parsed also yields the defaults but
    /// is left untouched on disk. Failures are logged, never returned.
    pub fn load(app_dir: impl Into<PathBuf>) -> Self {
        let app_dir = app_dir.into();
        let path = app_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let store = Self::new(app_dir, AppConfig::new(PathBuf::new()));
            if let Err(err) = store.save() {
                log::warn!("{err}");
            }
            return store;
        }

        match Self::load_strict(&app_dir) {
            Ok(store) => store,
            Err(err) => {
                log::warn!("{err}; using default configuration");
                Self::new(app_dir, AppConfig::new(PathBuf::new()))
            }
        }
    }

    /// Like [`ConfigStore::load`] but reports unreadable or malformed files.
    /// A missing file still yields the defaults and is not written.
    pub fn load_strict(app_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let app_dir = app_dir.into();
        let path = app_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::new(app_dir, AppConfig::new(PathBuf::new())));
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let data: AppConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(Self::new(app_dir, data))
    }

    pub fn config(&self) -> &AppConfig {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data.data_dir
    }

    /// Unknown key lookup, for settings this version does not model.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.extra.get(key)
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), ConfigError>
    where
        F: FnMut(&mut AppConfig),
    {
        op(&mut self.data);
        self.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.app_dir).map_err(|source| ConfigError::CreateDir {
            path: self.app_dir.clone(),
            source,
        })?;
        let mut payload =
            serde_json::to_string_pretty(&self.data).map_err(|source| ConfigError::Serialize {
                path: self.path.clone(),
                source,
            })?;
        payload.push('\n');
        write_atomic(&self.path, payload.as_bytes()).map_err(ConfigError::Write)
    }

    /// Returns the data directory, relocating it when the configured one is
    /// missing. See [`ConfigStore::resolve_data_dir_with`].
    pub fn resolve_data_dir(&mut self) -> Result<PathBuf, ConfigError> {
        let fallback = fallback_data_dir(&self.app_dir);
        self.resolve_data_dir_with(&fallback)
    }

    /// 若設定的資料目錄不存在，改用 `fallback` 並寫回設定。
    /// / Keeps the configured directory when it exists. Otherwise creates
    /// `fallback`, records it and saves the config.
    pub fn resolve_data_dir_with(&mut self, fallback: &Path) -> Result<PathBuf, ConfigError> {
        if !self.data.data_dir.as_os_str().is_empty() && self.data.data_dir.is_dir() {
            return Ok(self.data.data_dir.clone());
        }
        fs::create_dir_all(fallback).map_err(|source| ConfigError::CreateDir {
            path: fallback.to_path_buf(),
            source,
        })?;
        log::info!("using data directory {}", fallback.display());
        self.data.data_dir = fallback.to_path_buf();
        self.save()?;
        Ok(self.data.data_dir.clone())
    }

    /// Points the config at `new_dir`. With `copy_existing`, the current data
    /// directory's contents are copied over first.
    pub fn change_data_dir(
        &mut self,
        new_dir: impl Into<PathBuf>,
        copy_existing: bool,
    ) -> Result<(), ConfigError> {
        let new_dir = new_dir.into();
        let current = self.data.data_dir.clone();
        let same = normalize(&current) == normalize(&new_dir);
        if copy_existing && !same && current.is_dir() {
            if normalize(&new_dir).starts_with(normalize(&current)) {
                return Err(ConfigError::NestedDataDir {
                    from: current,
                    to: new_dir,
                });
            }
            copy_tree(&current, &new_dir).map_err(|source| ConfigError::Copy {
                from: current.clone(),
                to: new_dir.clone(),
                source,
            })?;
            log::info!(
                "copied data from {} to {}",
                current.display(),
                new_dir.display()
            );
        }
        self.data.data_dir = new_dir;
        self.save()
    }

    fn sanitize(&mut self) {
        if self.data.data_dir.as_os_str().is_empty() {
            self.data.data_dir = self.app_dir.join("data");
        }
        self.data.sanitize();
    }
}
