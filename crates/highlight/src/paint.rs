use std::ops::Range;

use crate::markdown::{StyleClass, StyledSpan};

/// A non-overlapping styled run produced by [`paint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintedRun {
    pub range: Range<usize>,
    pub style: StyleClass,
}

/// Resolves overlapping spans the way a renderer applies them in order: each
/// span overwrites whatever earlier spans set on its bytes. Adjacent bytes with
/// the same final style are merged into one run; unstyled bytes are omitted.
pub fn paint(line_len: usize, spans: &[StyledSpan]) -> Vec<PaintedRun> {
    let mut cells: Vec<Option<StyleClass>> = vec![None; line_len];
    for span in spans {
        let start = span.start.min(line_len);
        let end = span.end().min(line_len);
        for cell in &mut cells[start..end] {
            *cell = Some(span.style);
        }
    }

    let mut runs = Vec::new();
    let mut index = 0;
    while index < line_len {
        let Some(style) = cells[index] else {
            index += 1;
            continue;
        };
        let start = index;
        while index < line_len && cells[index] == Some(style) {
            index += 1;
        }
        runs.push(PaintedRun {
            range: start..index,
            style,
        });
    }
    runs
}
