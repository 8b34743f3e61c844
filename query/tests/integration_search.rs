use query::{HtmlPage, LoadedIndex, QueryError, QueryRunner, RunnerConfig};
use search_core::builder::build_index;
use search_core::document::parse_documents;
use search_core::persist::save_artifact;
use search_core::BuildOptions;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DOCS: &str = r#"[
    {"ident": "CVE-1", "title": "SQL Injection in Widget", "aliases": "", "keywords": "sql,injection", "package": "widget"},
    {"ident": "CVE-2", "title": "XSS in Gadget", "aliases": "", "keywords": "xss", "package": "gadget"}
]"#;

const PAGE: &str = r#"<html><body><form><input name="q"></form><ul id="search-result"></ul></body></html>"#;

fn build_tiny_index(dir: &Path) -> std::path::PathBuf {
    let docs = parse_documents(DOCS).unwrap();
    let index = build_index(&docs, BuildOptions::default()).unwrap();
    let path = dir.join("search-index.js");
    save_artifact(&path, "SEARCH_INDEX", &index).unwrap();
    path
}

fn runner(dir: &Path) -> QueryRunner {
    let path = build_tiny_index(dir);
    let index = LoadedIndex::load(&path, "SEARCH_INDEX").unwrap();
    QueryRunner::new(index, RunnerConfig::default())
}

#[test]
fn search_renders_matching_advisory() {
    let dir = tempdir().unwrap();
    let runner = runner(dir.path());
    let mut page = HtmlPage::new(PAGE);

    let outcome = runner.run("https://example.org/search.html?q=widget", &mut page).unwrap();
    assert_eq!(outcome.term, "widget");
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].doc_ref, "CVE-1");
    assert_eq!(outcome.fragment, "<li><a href=/advisories/CVE-1.html>CVE-1</a></li>");
    assert!(page
        .as_str()
        .contains(r#"<ul id="search-result"><li><a href=/advisories/CVE-1.html>CVE-1</a></li></ul>"#));
}

#[test]
fn uppercase_query_matches() {
    let dir = tempdir().unwrap();
    let runner = runner(dir.path());
    let outcome = runner.run("?q=GADGET", &mut HtmlPage::new(PAGE)).unwrap();
    let refs: Vec<&str> = outcome.results.iter().map(|r| r.doc_ref.as_str()).collect();
    assert_eq!(refs, vec!["CVE-2"]);
}

#[test]
fn missing_q_renders_empty_list() {
    let dir = tempdir().unwrap();
    let runner = runner(dir.path());
    let mut page = HtmlPage::new(PAGE);
    let outcome = runner.run("https://example.org/search.html", &mut page).unwrap();
    assert!(outcome.is_empty());
    assert_eq!(outcome.fragment, "");
    assert_eq!(page.as_str(), PAGE);
}

#[test]
fn missing_render_target_is_reported() {
    let dir = tempdir().unwrap();
    let runner = runner(dir.path());
    let mut page = HtmlPage::new("<html><body><ul id=\"results\"></ul></body></html>");
    let err = runner.run("?q=widget", &mut page).unwrap_err();
    assert!(matches!(err, QueryError::RenderTargetMissing(ref id) if id == "search-result"));
    assert_eq!(page.as_str(), "<html><body><ul id=\"results\"></ul></body></html>");
}

#[test]
fn absent_artifact_is_index_not_loaded() {
    let dir = tempdir().unwrap();
    let err = LoadedIndex::load(&dir.path().join("search-index.js"), "SEARCH_INDEX").unwrap_err();
    assert!(matches!(err, QueryError::IndexNotLoaded(_)));
}

#[test]
fn artifact_for_other_global_is_index_not_loaded() {
    let dir = tempdir().unwrap();
    let path = build_tiny_index(dir.path());
    let source = fs::read_to_string(&path).unwrap();
    let err = LoadedIndex::from_source(&source, "idx").unwrap_err();
    assert!(matches!(err, QueryError::IndexNotLoaded(ref m) if m.contains("SEARCH_INDEX")));
}

#[test]
fn custom_link_shape() {
    let dir = tempdir().unwrap();
    let path = build_tiny_index(dir.path());
    let index = LoadedIndex::load(&path, "SEARCH_INDEX").unwrap();
    let config = RunnerConfig { target_id: "hits".into(), href_prefix: "/a/".into(), href_suffix: "/".into() };
    let runner = QueryRunner::new(index, config);
    let mut page = HtmlPage::new("<ol id=hits></ol>");
    runner.run("q=sql", &mut page).unwrap();
    assert_eq!(page.as_str(), "<ol id=hits><li><a href=/a/CVE-1/>CVE-1</a></li></ol>");
}
