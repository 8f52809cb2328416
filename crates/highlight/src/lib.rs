//! Markdown structural highlighting for the note editor.

mod markdown;
mod paint;
mod theme;

pub use markdown::{scan_line, split_lines, MarkdownScanner, ScanSink, StyleClass, StyledSpan};
pub use paint::{paint, PaintedRun};
pub use theme::{
    parse_highlight_palette, Color, ColorParseError, HighlightPalette, HighlightStyle,
    ThemeParseError,
};
