//! `.tags.json` encoding.
//!
//! ```json
//! { "file_tags": { "notes/a.md": ["draft", "work"] } }
//! ```
//!
//! Unknown top-level fields are ignored and a missing `file_tags` key reads as
//! an empty map. Tag arrays are written sorted because the sets are ordered.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const TAGS_FILE_NAME: &str = ".tags.json";

pub type FileTagMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Default, Deserialize)]
struct TagFile {
    #[serde(default)]
    file_tags: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct TagFileRef<'a> {
    file_tags: &'a FileTagMap,
}

/// Parses the persisted document. Tags are returned as stored; the index
/// trims them and drops empties.
pub(crate) fn decode(contents: &str) -> Result<BTreeMap<String, Vec<String>>, serde_json::Error> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let file: TagFile = serde_json::from_str(contents)?;
    Ok(file.file_tags)
}

pub(crate) fn encode(file_tags: &FileTagMap) -> Result<String, serde_json::Error> {
    let mut payload = serde_json::to_string_pretty(&TagFileRef { file_tags })?;
    payload.push('\n');
    Ok(payload)
}
