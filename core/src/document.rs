use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One entry of the site's document list.
///
/// Only `ident` is required. Every other attribute is kept as raw JSON and
/// read as text on demand, so unregistered fields ride along without ever
/// reaching the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub ident: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Document {
    pub fn new(ident: impl Into<String>) -> Self {
        Self { ident: ident.into(), attributes: BTreeMap::new() }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Text of a field; empty when the field is absent or null.
    pub fn field_text(&self, name: &str) -> String {
        self.attributes.get(name).map(value_text).unwrap_or_default()
    }
}

/// Arrays are joined with spaces, scalars rendered as written.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Parse a JSON array of documents from text or raw bytes.
pub fn parse_documents(raw: impl AsRef<[u8]>) -> Result<Vec<Document>> {
    let docs: Vec<Document> = serde_json::from_slice(raw.as_ref()).map_err(|e| Error::malformed(e.to_string()))?;
    if let Some(pos) = docs.iter().position(|d| d.ident.trim().is_empty()) {
        return Err(Error::malformed(format!("document {pos} has an empty `ident`")));
    }
    Ok(docs)
}

/// Read and parse the document collection at `path`.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let raw = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => Error::InputNotFound { path: path.to_path_buf(), source },
        _ => Error::malformed(format!("{}: {source}", path.display())),
    })?;
    parse_documents(&raw).map_err(|e| match e {
        Error::MalformedInput(msg) => Error::malformed(format!("{}: {msg}", path.display())),
        other => other,
    })
}
