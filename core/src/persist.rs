use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

/// Global binding the artifact defines unless configured otherwise.
pub const DEFAULT_GLOBAL_NAME: &str = "SEARCH_INDEX";

lazy_static! {
    static ref IDENT: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid regex");
    static ref ASSIGNMENT: Regex =
        Regex::new(r"^\s*(?:var|let|const)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*").expect("valid regex");
}

pub fn validate_global_name(name: &str) -> Result<()> {
    if IDENT.is_match(name) {
        Ok(())
    } else {
        Err(Error::Config(format!("`{name}` is not a valid script identifier")))
    }
}

/// Render the index as `var NAME = <json>;`.
pub fn render_artifact(global_name: &str, index: &InvertedIndex) -> Result<String> {
    validate_global_name(global_name)?;
    let json = serde_json::to_string(index).map_err(|e| Error::Config(format!("cannot serialize index: {e}")))?;
    Ok(format!("var {global_name} = {json};\n"))
}

/// Write the artifact through a temporary sibling so a failed write leaves no partial file.
pub fn save_artifact(path: &Path, global_name: &str, index: &InvertedIndex) -> Result<()> {
    let body = render_artifact(global_name, index)?;
    let write_failure = |source: std::io::Error| Error::WriteFailure { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(write_failure)?;
    }
    let tmp = tmp_path(path);
    if let Err(source) = fs::write(&tmp, body.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(write_failure(source));
    }
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_failure(source));
    }
    tracing::info!(path = %path.display(), bytes = body.len(), "artifact written");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Parse artifact source defining `global_name`.
pub fn parse_artifact(source: &str, global_name: &str) -> Result<InvertedIndex> {
    let caps = ASSIGNMENT
        .captures(source)
        .ok_or_else(|| Error::not_loaded("artifact does not start with a variable assignment"))?;
    let name = &caps[1];
    if name != global_name {
        return Err(Error::not_loaded(format!("artifact defines `{name}`, expected `{global_name}`")));
    }
    let rest = &source[caps.get(0).map_or(0, |m| m.end())..];
    let json = rest.trim_end();
    let json = json.strip_suffix(';').unwrap_or(json);
    let index: InvertedIndex =
        serde_json::from_str(json).map_err(|e| Error::not_loaded(format!("`{global_name}` is not a search index: {e}")))?;
    index.ensure_supported()?;
    Ok(index)
}

pub fn load_artifact(path: &Path, global_name: &str) -> Result<InvertedIndex> {
    let source = fs::read_to_string(path)
        .map_err(|e| Error::not_loaded(format!("cannot read {}: {e}", path.display())))?;
    let index = parse_artifact(&source, global_name)?;
    tracing::debug!(path = %path.display(), num_docs = index.num_docs(), "artifact loaded");
    Ok(index)
}
