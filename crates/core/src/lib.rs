//! Shared building blocks for the JiHou note core: the error taxonomy, note
//! path keys, and the document store collaborators that the highlighter, the
//! search engine and the tag index read through.

pub mod document;
pub mod error;
pub mod note_path;
pub mod store;

pub use document::Note;
pub use error::{ErrorKind, StoreError};
pub use note_path::{is_note_file, normalize, note_key, to_key, DEFAULT_NOTE_EXTENSIONS};
pub use store::{
    decode_text, write_atomic, FsNoteStore, NoteEntries, NoteEntry, NoteSink, NoteSource,
};
