//! Persistent tag index for notes.
//!
//! Tags live in `<data root>/.tags.json`. The index keeps the file→tags map
//! and its tag→files inverse in step, treats an unreadable index file as empty,
//! and reports write failures to the caller.

mod error;
mod index;
mod persist;
mod shared;

pub use error::{InvalidTagReason, TagError};
pub use index::{TagIndex, TagObserver};
pub use persist::{FileTagMap, TAGS_FILE_NAME};
pub use shared::SharedTagIndex;
