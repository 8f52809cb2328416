use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use jihou_core::{ErrorKind, NoteSink, StoreError};
use jihou_tags::{TagError, TagIndex, TAGS_FILE_NAME};
use tempfile::tempdir;

struct FullDisk;

impl NoteSink for FullDisk {
    fn write_text(&self, path: &Path, _contents: &str) -> Result<(), StoreError> {
        Err(StoreError::from_io(
            path,
            io::Error::new(io::ErrorKind::StorageFull, "no space left on device"),
        ))
    }
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempdir().expect("tempdir");
    let index = TagIndex::open(dir.path());
    assert!(index.is_empty());
    assert_eq!(index.path(), dir.path().join(TAGS_FILE_NAME));
}

#[test]
fn corrupt_file_loads_empty_but_strict_load_reports_it() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(TAGS_FILE_NAME);
    fs::write(&path, "{ \"file_tags\": { \"a.md\": [").unwrap();

    let index = TagIndex::load(&path);
    assert!(index.is_empty());

    let err = TagIndex::load_strict(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptIndex);
}

#[test]
fn save_then_load_round_trips_as_sets() {
    let dir = tempdir().expect("tempdir");
    let mut index = TagIndex::open(dir.path());
    index.add_tag(dir.path().join("a.md"), "work").unwrap();
    index.add_tag(dir.path().join("a.md"), "draft").unwrap();
    index.add_tag("sub/b.txt", "work").unwrap();
    index.add_tag("c.md", "gone").unwrap();
    index.remove_tag("c.md", "gone").unwrap();
    index.rename_tag("draft", "review").unwrap();
    index.add_tag("d.md", "tmp").unwrap();
    index.delete_tag("tmp").unwrap();
    index.save().unwrap();

    let reloaded = TagIndex::open(dir.path());
    assert_eq!(reloaded.file_tags(), index.file_tags());
    assert_eq!(
        reloaded.files_for_tag("work"),
        ["a.md", "sub/b.txt"]
            .iter()
            .map(|key| key.to_string())
            .collect::<BTreeSet<_>>()
    );
    assert!(reloaded.is_consistent());
}

#[test]
fn saved_file_uses_sorted_arrays_under_file_tags() {
    let dir = tempdir().expect("tempdir");
    let mut index = TagIndex::open(dir.path());
    index.add_tag("a.md", "zeta").unwrap();
    index.add_tag("a.md", "alpha").unwrap();
    index.save().unwrap();

    let raw = fs::read_to_string(dir.path().join(TAGS_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "file_tags": { "a.md": ["alpha", "zeta"] } })
    );
}

#[test]
fn absolute_keys_from_older_files_are_normalised() {
    let dir = tempdir().expect("tempdir");
    let absolute = dir.path().join("notes").join("a.md");
    let mut file_tags = serde_json::Map::new();
    file_tags.insert(
        absolute.to_string_lossy().into_owned(),
        serde_json::json!(["x", "  ", " y "]),
    );
    file_tags.insert("empty.md".to_string(), serde_json::json!([]));
    let payload = serde_json::json!({
        "file_tags": file_tags,
        "window": { "width": 800 }
    });
    fs::write(dir.path().join(TAGS_FILE_NAME), payload.to_string()).unwrap();

    let index = TagIndex::open(dir.path());
    let expected: BTreeSet<String> = ["x", "y"].iter().map(|tag| tag.to_string()).collect();
    assert_eq!(index.tags_for_file("notes/a.md"), expected);
    assert!(!index.file_tags().contains_key("empty.md"));
    assert!(index.is_consistent());
}

#[test]
fn write_failures_are_surfaced_and_mutation_is_kept() {
    let dir = tempdir().expect("tempdir");
    let mut index = TagIndex::open(dir.path())
        .with_sink(Arc::new(FullDisk))
        .with_autosave(true);

    let err = index.add_tag("a.md", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DiskFull);
    assert!(matches!(err, TagError::Write { .. }));
    assert!(index.tags_for_file("a.md").contains("x"));
    assert!(index.save().is_err());
    assert!(!dir.path().join(TAGS_FILE_NAME).exists());
}

#[test]
fn autosave_persists_each_mutation() {
    let dir = tempdir().expect("tempdir");
    let mut index = TagIndex::open(dir.path()).with_autosave(true);
    index.add_tag("a.md", "x").unwrap();
    assert!(TagIndex::open(dir.path()).tags_for_file("a.md").contains("x"));

    index.rename_tag("x", "y").unwrap();
    let reloaded = TagIndex::open(dir.path());
    assert!(reloaded.tags_for_file("a.md").contains("y"));
    assert!(!reloaded.contains_tag("x"));
}

#[test]
fn vocabulary_covers_every_file_tag_across_mutation_sequences() {
    let files = ["a.md", "b.md", "c/d.txt", "e.md"];
    let tags = ["red", "green", "blue", "x"];
    let mut index = TagIndex::empty("/root/.tags.json");
    let mut seed: u64 = 0x5eed;

    for _ in 0..500 {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let pick = (seed >> 33) as usize;
        let file = files[pick % files.len()];
        let tag = tags[(pick / 7) % tags.len()];
        let other = tags[(pick / 31) % tags.len()];
        let _ = match pick % 5 {
            0 | 1 => index.add_tag(file, tag),
            2 => index.remove_tag(file, tag),
            3 => index.rename_tag(tag, other),
            _ => index.delete_tag(tag),
        };

        let vocabulary: BTreeSet<&str> = index.vocabulary().collect();
        for file_tags in index.file_tags().values() {
            for tag in file_tags {
                assert!(vocabulary.contains(tag.as_str()), "{tag} missing");
            }
        }
        assert!(index.is_consistent());
    }
}
