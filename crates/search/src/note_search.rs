use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jihou_core::{is_note_file, note_key, NoteEntries, NoteSource, DEFAULT_NOTE_EXTENSIONS};

use crate::matcher::QueryMatcher;
use crate::SearchError;

/// Cooperative cancellation flag shared between a search and its caller.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One note containing the query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub path: PathBuf,
    /// Path relative to the search root, `/`-separated.
    pub relative: String,
    pub matched: String,
    pub line: usize,
    pub column: usize,
    pub line_text: String,
}

/// Counters describing a finished or abandoned search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub files_visited: usize,
    pub files_matched: usize,
    pub files_skipped: usize,
    pub cancelled: bool,
}

/// Lazy search over every note under a root.
///
/// Nothing is read until the iterator is polled. Each `next` call reads notes
/// in sorted walk order until one matches, so a consumer that stops early
/// leaves the rest of the tree untouched. Unreadable notes are logged and
/// skipped. The cancellation token is checked before every file visit.
pub struct NoteSearch<'a, S: NoteSource + ?Sized> {
    source: &'a S,
    root: PathBuf,
    entries: Option<NoteEntries<'a>>,
    matcher: Option<QueryMatcher>,
    extensions: Vec<String>,
    cancel: CancellationToken,
    summary: SearchSummary,
}

impl<'a, S: NoteSource + ?Sized> NoteSearch<'a, S> {
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_extensions<I, E>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn summary(&self) -> SearchSummary {
        self.summary
    }
}

impl<S: NoteSource + ?Sized> fmt::Debug for NoteSearch<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteSearch")
            .field("root", &self.root)
            .field("query", &self.matcher.as_ref().map(QueryMatcher::query))
            .field("extensions", &self.extensions)
            .field("summary", &self.summary)
            .finish()
    }
}

impl<S: NoteSource + ?Sized> Iterator for NoteSearch<'_, S> {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        let matcher = self.matcher.as_ref()?;
        loop {
            if self.cancel.is_cancelled() {
                if self.entries.is_some() {
                    log::debug!("search under {} cancelled", self.root.display());
                    self.summary.cancelled = true;
                }
                self.entries = None;
                return None;
            }

            let entry = match self.entries.as_mut()?.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    log::warn!("search skipped an entry: {err}");
                    self.summary.files_skipped += 1;
                    continue;
                }
                None => {
                    self.entries = None;
                    return None;
                }
            };
            if entry.is_dir || !is_note_file(&entry.path, &self.extensions) {
                continue;
            }

            self.summary.files_visited += 1;
            log::debug!("searching {}", entry.path.display());
            let text = match self.source.read_text(&entry.path) {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("search skipped {}: {err}", entry.path.display());
                    self.summary.files_skipped += 1;
                    continue;
                }
            };

            if let Some(found) = matcher.find_first(&text) {
                self.summary.files_matched += 1;
                return Some(SearchResult {
                    relative: note_key(&self.root, &entry.path),
                    path: entry.path,
                    matched: found.matched,
                    line: found.line,
                    column: found.column,
                    line_text: found.line_text,
                });
            }
        }
    }
}

/// Starts a search for `query` under `root`.
///
/// A query that is empty after trimming yields an empty search without
/// touching the source. Otherwise the root is enumerated up front so a missing
/// or unreadable root fails here; individual notes are only read on demand.
pub fn search<'a, S>(
    source: &'a S,
    root: impl AsRef<Path>,
    query: &str,
) -> Result<NoteSearch<'a, S>, SearchError>
where
    S: NoteSource + ?Sized,
{
    let root = root.as_ref().to_path_buf();
    let matcher = QueryMatcher::new(query);
    let entries = match matcher {
        Some(_) => Some(source.list_files(&root).map_err(SearchError::Root)?),
        None => None,
    };
    Ok(NoteSearch {
        source,
        root,
        entries,
        matcher,
        extensions: DEFAULT_NOTE_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
        cancel: CancellationToken::new(),
        summary: SearchSummary::default(),
    })
}
