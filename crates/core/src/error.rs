use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// 所有元件共用的錯誤分類。 / Error taxonomy shared by every note-core component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    /// Content is not UTF-8 (or BOM-marked UTF-16) text.
    DecodeError,
    DiskFull,
    InvalidTag,
    CorruptIndex,
    /// Any OS failure that fits none of the kinds above.
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::PermissionDenied => "permission-denied",
            ErrorKind::DecodeError => "decode-error",
            ErrorKind::DiskFull => "disk-full",
            ErrorKind::InvalidTag => "invalid-tag",
            ErrorKind::CorruptIndex => "corrupt-index",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文件儲存層的錯誤，皆攜帶路徑與底層 OS 錯誤。 / Document-store failure carrying the path and the underlying OS error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: not found", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: permission denied", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: content is not valid text", path.display())]
    Decode { path: PathBuf },
    #[error("{}: no space left on device", path.display())]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Classifies an `io::Error` raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound { path, source },
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied { path, source },
            io::ErrorKind::StorageFull => StoreError::DiskFull { path, source },
            io::ErrorKind::InvalidData => StoreError::Decode { path },
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists { path },
            _ => StoreError::Io { path, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            StoreError::Decode { .. } => ErrorKind::DecodeError,
            StoreError::DiskFull { .. } => ErrorKind::DiskFull,
            StoreError::AlreadyExists { .. } | StoreError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StoreError::NotFound { path, .. }
            | StoreError::PermissionDenied { path, .. }
            | StoreError::Decode { path }
            | StoreError::DiskFull { path, .. }
            | StoreError::AlreadyExists { path }
            | StoreError::Io { path, .. } => path,
        }
    }

    /// 底層作業系統錯誤文字（若有）。 / Raw OS error text, when one exists.
    pub fn os_message(&self) -> Option<String> {
        match self {
            StoreError::NotFound { source, .. }
            | StoreError::PermissionDenied { source, .. }
            | StoreError::DiskFull { source, .. }
            | StoreError::Io { source, .. } => Some(source.to_string()),
            StoreError::Decode { .. } | StoreError::AlreadyExists { .. } => None,
        }
    }
}
