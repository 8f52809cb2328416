use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Style class attached to a scanned span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleClass {
    Heading1,
    Heading2,
    Bold,
    Italic,
    Code,
    Link,
    ListItem,
}

impl StyleClass {
    pub const ALL: [StyleClass; 7] = [
        StyleClass::Heading1,
        StyleClass::Heading2,
        StyleClass::Bold,
        StyleClass::Italic,
        StyleClass::Code,
        StyleClass::Link,
        StyleClass::ListItem,
    ];

    /// Key used for this class in palette overrides.
    pub fn key(self) -> &'static str {
        match self {
            StyleClass::Heading1 => "heading1",
            StyleClass::Heading2 => "heading2",
            StyleClass::Bold => "bold",
            StyleClass::Italic => "italic",
            StyleClass::Code => "code",
            StyleClass::Link => "link",
            StyleClass::ListItem => "list_item",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.key() == key)
    }
}

/// A styled region of one line. Offsets are UTF-8 byte offsets within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyledSpan {
    pub start: usize,
    pub length: usize,
    pub style: StyleClass,
}

impl StyledSpan {
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

// Declaration order is scan order. Every rule runs over the whole line, so a
// `**bold**` run is also picked up by the single-asterisk italic rule.
const RULE_PATTERNS: &[(&str, StyleClass)] = &[
    (r"^\s*#\s+.+$", StyleClass::Heading1),
    (r"^\s*##\s+.+$", StyleClass::Heading2),
    (r"\*\*(.+?)\*\*", StyleClass::Bold),
    (r"__(.+?)__", StyleClass::Bold),
    (r"\*(.+?)\*", StyleClass::Italic),
    (r"_(.+?)_", StyleClass::Italic),
    (r"`(.+?)`", StyleClass::Code),
    (r"\[(.+?)\]\((.+?)\)", StyleClass::Link),
    (r"^\s*[\*\-\+]\s+", StyleClass::ListItem),
    (r"^\s*\d+\.\s+", StyleClass::ListItem),
];

#[derive(Debug)]
struct ScanRule {
    regex: Regex,
    style: StyleClass,
}

static RULES: Lazy<Vec<ScanRule>> = Lazy::new(|| {
    RULE_PATTERNS
        .iter()
        .map(|(pattern, style)| ScanRule {
            regex: Regex::new(pattern).expect("built-in markdown rule should compile"),
            style: *style,
        })
        .collect()
});

/// Receives the spans of each scanned line, e.g. a live-highlighting view.
pub trait ScanSink {
    fn on_content_scanned(&mut self, line_index: usize, line: &str, spans: &[StyledSpan]);
}

impl<F> ScanSink for F
where
    F: FnMut(usize, &str, &[StyledSpan]),
{
    fn on_content_scanned(&mut self, line_index: usize, line: &str, spans: &[StyledSpan]) {
        self(line_index, line, spans)
    }
}

/// Line-oriented Markdown scanner.
///
/// Stateless: each line is scanned on its own, so multi-line constructs such as
/// fenced code blocks are not recognised. Unterminated markers simply produce
/// no span.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownScanner;

impl MarkdownScanner {
    pub fn new() -> Self {
        Self
    }

    /// Returns the spans of one line in scan order (rule order, then position).
    pub fn scan_line(&self, line: &str) -> Vec<StyledSpan> {
        let mut spans = Vec::new();
        if line.is_empty() {
            return spans;
        }
        for rule in RULES.iter() {
            for found in rule.regex.find_iter(line) {
                if found.start() == found.end() {
                    continue;
                }
                spans.push(StyledSpan {
                    start: found.start(),
                    length: found.end() - found.start(),
                    style: rule.style,
                });
            }
        }
        spans
    }

    pub fn scan<'a, I>(&self, lines: I) -> Vec<Vec<StyledSpan>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines.into_iter().map(|line| self.scan_line(line)).collect()
    }

    /// Splits `text` into lines and scans each one.
    pub fn scan_text(&self, text: &str) -> Vec<Vec<StyledSpan>> {
        self.scan(split_lines(text))
    }

    /// Scans `text` and pushes every line's spans to `sink`.
    pub fn scan_into<S>(&self, text: &str, sink: &mut S)
    where
        S: ScanSink + ?Sized,
    {
        for (index, line) in split_lines(text).enumerate() {
            let spans = self.scan_line(line);
            sink.on_content_scanned(index, line, &spans);
        }
    }
}

/// Splits on `\n`, dropping a trailing `\r` from each line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

pub fn scan_line(line: &str) -> Vec<StyledSpan> {
    MarkdownScanner.scan_line(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles(line: &str) -> Vec<(usize, usize, StyleClass)> {
        scan_line(line)
            .into_iter()
            .map(|span| (span.start, span.length, span.style))
            .collect()
    }

    #[test]
    fn headings_cover_the_whole_line() {
        assert_eq!(styles("# Title"), vec![(0, 7, StyleClass::Heading1)]);
        assert_eq!(styles("  # Indented"), vec![(0, 12, StyleClass::Heading1)]);
        assert_eq!(styles("## Sub"), vec![(0, 6, StyleClass::Heading2)]);
    }

    #[test]
    fn bare_hash_space_is_not_a_heading() {
        assert!(styles("# ").is_empty());
        assert!(styles("#").is_empty());
        assert!(styles("#tag").is_empty());
    }

    #[test]
    fn double_asterisk_also_records_italic() {
        assert_eq!(
            styles("**bold**"),
            vec![(0, 8, StyleClass::Bold), (0, 7, StyleClass::Italic)]
        );
        assert_eq!(
            styles("__init__"),
            vec![(0, 8, StyleClass::Bold), (0, 7, StyleClass::Italic)]
        );
    }

    #[test]
    fn inline_rules_find_every_match() {
        assert_eq!(
            styles("use `a` or `b`"),
            vec![(4, 3, StyleClass::Code), (11, 3, StyleClass::Code)]
        );
        assert_eq!(
            styles("see [docs](https://example.com) now"),
            vec![(4, 27, StyleClass::Link)]
        );
        assert_eq!(styles("an *em* word"), vec![(3, 4, StyleClass::Italic)]);
    }

    #[test]
    fn list_markers_cover_marker_and_spacing() {
        assert_eq!(styles("- item"), vec![(0, 2, StyleClass::ListItem)]);
        assert_eq!(styles("  + item"), vec![(0, 4, StyleClass::ListItem)]);
        assert_eq!(styles("12.  twelve"), vec![(0, 5, StyleClass::ListItem)]);
        assert!(styles("-item").is_empty());
        assert!(styles("1.item").is_empty());
    }

    #[test]
    fn list_item_with_bold_keeps_both_spans() {
        let spans = styles("* **done** task");
        assert!(spans.contains(&(0, 2, StyleClass::ListItem)));
        assert!(spans.contains(&(2, 8, StyleClass::Bold)));
    }

    #[test]
    fn unterminated_markers_produce_nothing() {
        assert!(styles("a * b").is_empty());
        assert!(styles("open `code").is_empty());
        assert!(styles("[text](missing").is_empty());
        assert!(styles("").is_empty());
    }

    #[test]
    fn scanning_is_repeatable() {
        let text = "# A\n* **b** `c`\n[d](e)\r\nplain";
        let scanner = MarkdownScanner::new();
        assert_eq!(scanner.scan_text(text), scanner.scan_text(text));
        assert_eq!(scanner.scan_text(text).len(), 4);
    }

    #[test]
    fn offsets_are_bytes_within_the_line() {
        assert_eq!(styles("é `x`"), vec![(3, 3, StyleClass::Code)]);
    }

    #[test]
    fn scan_into_reports_each_line() {
        let mut seen = Vec::new();
        let mut sink = |index: usize, line: &str, spans: &[StyledSpan]| {
            seen.push((index, line.to_string(), spans.len()));
        };
        MarkdownScanner::new().scan_into("# h\r\nplain", &mut sink);
        assert_eq!(
            seen,
            vec![(0, "# h".to_string(), 1), (1, "plain".to_string(), 0)]
        );
    }

    #[test]
    fn style_keys_round_trip() {
        for class in StyleClass::ALL {
            assert_eq!(StyleClass::from_key(class.key()), Some(class));
        }
        assert_eq!(StyleClass::from_key("keyword"), None);
    }
}
