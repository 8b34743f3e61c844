//! Query side of the advisory search.
//!
//! [`LoadedIndex`] is produced by loading the artifact the indexer wrote;
//! a [`QueryRunner`] cannot be built without one. The runner reads `q` from
//! the page location, evaluates it against the four advisory fields and
//! assigns the rendered list into the page's result element.

pub mod page;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use page::{HtmlPage, Page};

use search_core::index::missing_searchable_field;
use search_core::persist::{load_artifact, parse_artifact};
use search_core::{InvertedIndex, Query, SearchResult, SEARCHABLE_FIELDS};
use std::path::Path;
use thiserror::Error;

/// Element the result list is written into.
pub const DEFAULT_TARGET_ID: &str = "search-result";

#[derive(Error, Debug)]
pub enum QueryError {
    /// No usable index: artifact missing, malformed or incompatible
    #[error("search unavailable: {0}")]
    IndexNotLoaded(String),

    /// Page has no element with the target id
    #[error("render target #{0} not found")]
    RenderTargetMissing(String),
}

impl From<search_core::Error> for QueryError {
    fn from(err: search_core::Error) -> Self {
        match err {
            search_core::Error::IndexNotLoaded(msg) => QueryError::IndexNotLoaded(msg),
            other => QueryError::IndexNotLoaded(other.to_string()),
        }
    }
}

/// Handle to an index that is known to be loaded and queryable.
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    index: InvertedIndex,
}

impl LoadedIndex {
    pub fn load(path: &Path, global_name: &str) -> Result<Self, QueryError> {
        Self::from_index(load_artifact(path, global_name)?)
    }

    pub fn from_source(source: &str, global_name: &str) -> Result<Self, QueryError> {
        Self::from_index(parse_artifact(source, global_name)?)
    }

    /// Index held by a script global; `None` when the global is undefined.
    pub fn from_global(global_name: &str, value: Option<InvertedIndex>) -> Result<Self, QueryError> {
        let index = value.ok_or_else(|| QueryError::IndexNotLoaded(format!("`{global_name}` is not defined")))?;
        Self::from_index(index)
    }

    /// Rejects indexes of another version or lacking one of the searchable fields.
    pub fn from_index(index: InvertedIndex) -> Result<Self, QueryError> {
        index.ensure_supported()?;
        if let Some(missing) = missing_searchable_field(&index.fields) {
            return Err(QueryError::IndexNotLoaded(format!("index has no `{missing}` field")));
        }
        Ok(Self { index })
    }

    pub fn num_docs(&self) -> usize { self.index.num_docs() }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub target_id: String,
    pub href_prefix: String,
    pub href_suffix: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target_id: DEFAULT_TARGET_ID.to_string(),
            href_prefix: "/advisories/".to_string(),
            href_suffix: ".html".to_string(),
        }
    }
}

/// Result of one search, kept separate from errors so callers can tell
/// "no results" from "search unavailable".
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub term: String,
    pub results: Vec<SearchResult>,
    pub fragment: String,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool { self.results.is_empty() }
}

pub struct QueryRunner {
    index: LoadedIndex,
    config: RunnerConfig,
}

impl QueryRunner {
    pub fn new(index: LoadedIndex, config: RunnerConfig) -> Self {
        Self { index, config }
    }

    /// Lowercase `term` and match it against the searchable fields only.
    pub fn search(&self, term: &str) -> Vec<SearchResult> {
        let query = Query::parse(&term.to_lowercase()).in_fields(SEARCHABLE_FIELDS);
        self.index.index.search(&query)
    }

    /// Search for the `q` of `location` and write the list into `page`.
    pub fn run<P: Page + ?Sized>(&self, location: &str, page: &mut P) -> Result<SearchOutcome, QueryError> {
        let term = query_term(location);
        let results = self.search(&term);
        let fragment = render_results(&results, &self.config);
        page.set_inner_html(&self.config.target_id, &fragment)?;
        if results.is_empty() {
            tracing::warn!(%term, "no results");
        } else {
            tracing::debug!(%term, hits = results.len(), "rendered results");
        }
        Ok(SearchOutcome { term, results, fragment })
    }
}

/// Value of the `q` parameter in a URL, a `?...` string or a bare query
/// string. Missing `q` is the empty term.
pub fn query_term(location: &str) -> String {
    let without_fragment = location.split('#').next().unwrap_or_default();
    let query = match without_fragment.split_once('?') {
        Some((_, q)) => q,
        None if without_fragment.contains("://") || without_fragment.starts_with('/') => "",
        None => without_fragment,
    };
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// `<li><a href=PREFIX{ref}SUFFIX>{ref}</a></li>` per result, in order.
pub fn render_results(results: &[SearchResult], config: &RunnerConfig) -> String {
    let mut html = String::new();
    for result in results {
        let doc_ref = escape_html(&result.doc_ref);
        html.push_str(&format!(
            "<li><a href={}{}{}>{}</a></li>",
            config.href_prefix, doc_ref, config.href_suffix, doc_ref
        ));
    }
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
