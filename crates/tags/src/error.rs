use std::fmt;
use std::path::PathBuf;

use jihou_core::{ErrorKind, StoreError};
use thiserror::Error;

/// Why a tag name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTagReason {
    Empty,
    /// Rename target equals the source.
    SameName,
}

impl fmt::Display for InvalidTagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidTagReason::Empty => write!(f, "tag is empty"),
            InvalidTagReason::SameName => write!(f, "new name equals the old name"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("invalid tag '{tag}': {reason}")]
    InvalidTag {
        tag: String,
        reason: InvalidTagReason,
    },
    #[error("failed to read tag index {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
    #[error("tag index {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize tag index {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write tag index {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl TagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TagError::InvalidTag { .. } => ErrorKind::InvalidTag,
            TagError::Corrupt { .. } => ErrorKind::CorruptIndex,
            TagError::Read { source, .. } | TagError::Write { source, .. } => source.kind(),
            TagError::Serialize { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid(tag: &str, reason: InvalidTagReason) -> Self {
        TagError::InvalidTag {
            tag: tag.to_string(),
            reason,
        }
    }
}
