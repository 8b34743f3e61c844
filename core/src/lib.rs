//! Indexing engine behind the static-site advisory search.
//!
//! Documents are tokenized per field, weighted with TF-IDF and stored in an
//! [`InvertedIndex`] that serializes into a script-loadable artifact.

pub mod builder;
pub mod document;
pub mod error;
pub mod index;
pub mod persist;
pub mod tokenizer;

pub use builder::{BuildOptions, IndexBuilder};
pub use document::{load_documents, Document};
pub use error::{Error, Result};
pub use index::{searchable_fields_with, FieldSpec, InvertedIndex, Posting, Query, SearchResult};

/// Positional identifier assigned to a document in collection order.
pub type DocId = u32;
/// Index into [`InvertedIndex::fields`].
pub type FieldId = u16;

/// Attribute holding the externally meaningful document identifier.
pub const REF_FIELD: &str = "ident";

/// Fields registered for matching when nothing else is configured.
pub const SEARCHABLE_FIELDS: [&str; 4] = ["title", "aliases", "keywords", "package"];

/// Serialized index layout version.
pub const INDEX_VERSION: u32 = 1;
