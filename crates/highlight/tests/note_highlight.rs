use std::fs;

use jihou_core::{FsNoteStore, Note};
use jihou_highlight::{paint, MarkdownScanner, StyleClass, StyledSpan};
use tempfile::tempdir;

fn span(start: usize, length: usize, style: StyleClass) -> StyledSpan {
    StyledSpan {
        start,
        length,
        style,
    }
}

#[test]
fn scans_a_note_loaded_from_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("plan.md");
    fs::write(&path, "# Title\r\n- item with `code`\r\nplain\r\n").unwrap();

    let note = Note::open(&FsNoteStore::new(), &path).expect("open");
    let spans = MarkdownScanner::new().scan_text(note.contents());

    assert_eq!(spans.len(), 4);
    assert_eq!(spans[0], vec![span(0, 7, StyleClass::Heading1)]);
    assert_eq!(
        spans[1],
        vec![
            span(12, 6, StyleClass::Code),
            span(0, 2, StyleClass::ListItem),
        ]
    );
    assert!(spans[2].is_empty());
    assert!(spans[3].is_empty());
}

#[test]
fn sink_sees_every_line_of_a_buffered_note() {
    let note = Note::from_text("/notes/draft.md", "## Plan\r\n1. ship [it](http://x)\r\n");

    let mut seen = Vec::new();
    let mut record = |index: usize, line: &str, spans: &[StyledSpan]| {
        seen.push((index, line.to_string(), paint(line.len(), spans)));
    };
    MarkdownScanner::new().scan_into(note.contents(), &mut record);

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].1, "## Plan");
    assert_eq!(seen[0].2.len(), 1);
    assert_eq!(seen[0].2[0].style, StyleClass::Heading2);

    let styles: Vec<_> = seen[1].2.iter().map(|run| run.style).collect();
    assert_eq!(styles, vec![StyleClass::ListItem, StyleClass::Link]);
    assert_eq!(seen[1].2[1].range, 8..22);
    assert!(seen[2].2.is_empty());
}
