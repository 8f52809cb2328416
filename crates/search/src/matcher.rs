use regex::{Regex, RegexBuilder};

/// First occurrence of a query inside one note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMatch {
    pub start: usize,
    pub end: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// The matched text with the note's own casing.
    pub matched: String,
    pub line_text: String,
}

/// Case-insensitive literal substring matcher.
///
/// Queries normally compile to an escaped regex. A query too large for the
/// regex size limit is matched by lowercasing both sides instead, so every
/// non-blank query is accepted.
#[derive(Clone, Debug)]
pub struct QueryMatcher {
    query: String,
    strategy: Strategy,
}

#[derive(Clone, Debug)]
enum Strategy {
    Regex(Regex),
    Folded(String),
}

impl QueryMatcher {
    /// Builds a matcher for the trimmed query. Returns `None` when nothing is
    /// left after trimming.
    pub fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let strategy = match build_regex(query) {
            Ok(regex) => Strategy::Regex(regex),
            Err(err) => {
                log::debug!("matching query by case folding: {err}");
                Strategy::Folded(fold_case(query).0)
            }
        };
        Some(Self {
            query: query.to_string(),
            strategy,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find_range(text).is_some()
    }

    pub fn find_first(&self, text: &str) -> Option<TextMatch> {
        let (start, end) = self.find_range(text)?;
        let index = LineIndex::new(text);
        let (line, column) = index.line_and_column(start);
        Some(TextMatch {
            start,
            end,
            line,
            column,
            matched: text[start..end].to_string(),
            line_text: index.line_text(line),
        })
    }

    fn find_range(&self, text: &str) -> Option<(usize, usize)> {
        match &self.strategy {
            Strategy::Regex(regex) => regex.find(text).map(|found| (found.start(), found.end())),
            Strategy::Folded(needle) => {
                let (folded, origins) = fold_case(text);
                let folded_start = folded.find(needle.as_str())?;
                let start = origins[folded_start];
                let last = origins[folded_start + needle.len() - 1];
                let end = last + text[last..].chars().next().map_or(0, char::len_utf8);
                Some((start, end))
            }
        }
    }
}

fn build_regex(query: &str) -> Result<Regex, regex::Error> {
    let mut builder = RegexBuilder::new(&regex::escape(query));
    builder.case_insensitive(true);
    builder.build()
}

/// Lowercases `text` char by char. The second value maps every byte of the
/// folded string to the start of the source char it came from.
fn fold_case(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut origins = Vec::with_capacity(text.len());
    for (offset, ch) in text.char_indices() {
        for lower in ch.to_lowercase() {
            folded.push(lower);
            origins.extend(std::iter::repeat(offset).take(lower.len_utf8()));
        }
    }
    (folded, origins)
}

struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { text, starts }
    }

    fn line_and_column(&self, index: usize) -> (usize, usize) {
        let pos = match self.starts.binary_search(&index) {
            Ok(line_zero) => line_zero,
            Err(insert) => insert.saturating_sub(1),
        };
        let line_start = self.starts.get(pos).copied().unwrap_or(0);
        let column = self.text[line_start..index].chars().count() + 1;
        (pos + 1, column)
    }

    fn line_text(&self, line: usize) -> String {
        let zero_based = line.saturating_sub(1);
        let start = self.starts.get(zero_based).copied().unwrap_or(0);
        let end = self
            .starts
            .get(zero_based + 1)
            .copied()
            .unwrap_or(self.text.len());
        self.text[start..end]
            .trim_end_matches(|c| c == '\n' || c == '\r')
            .to_string()
    }
}
