use crate::tokenizer::query_terms;
use crate::{DocId, FieldId, INDEX_VERSION, SEARCHABLE_FIELDS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 { 1.0 }

impl FieldSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), boost: default_boost() }
    }

    pub fn boosted(name: impl Into<String>, boost: f32) -> Self {
        Self { name: name.into(), boost }
    }
}

/// The four advisory fields, unboosted.
pub fn default_fields() -> Vec<FieldSpec> {
    SEARCHABLE_FIELDS.iter().map(|name| FieldSpec::new(*name)).collect()
}

/// The four advisory fields with `extra` applied: a known name replaces its
/// boost, any other name is appended.
pub fn searchable_fields_with(extra: &[FieldSpec]) -> Vec<FieldSpec> {
    let mut fields = default_fields();
    for spec in extra {
        match fields.iter_mut().find(|f| f.name == spec.name) {
            Some(field) => field.boost = spec.boost,
            None => fields.push(spec.clone()),
        }
    }
    fields
}

/// First searchable field missing from `fields`, if any.
pub fn missing_searchable_field(fields: &[FieldSpec]) -> Option<&'static str> {
    SEARCHABLE_FIELDS.iter().copied().find(|name| !fields.iter().any(|f| f.name == *name))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: FieldId,
    pub weight: f32, // normalized tf-idf weight within the field
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub version: u32,
    pub fields: Vec<FieldSpec>,
    /// `ident` of each document, indexed by `DocId`
    pub refs: Vec<String>,
    pub postings: BTreeMap<String, Vec<Posting>>, // postings sorted by (doc_id, field)
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self { version: INDEX_VERSION, fields: default_fields(), refs: Vec::new(), postings: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "ref")]
    pub doc_ref: String,
    pub score: f32,
}

/// Structured query: every term must match in at least one allowed field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub terms: Vec<String>,
    /// `None` searches every indexed field
    pub fields: Option<Vec<String>>,
}

impl Query {
    /// Build a query from free text. Hyphenated words stay single terms.
    pub fn parse(text: &str) -> Self {
        Self { terms: query_terms(text), fields: None }
    }

    pub fn in_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn num_docs(&self) -> usize { self.refs.len() }

    /// Fails unless the layout version is one this build reads.
    pub fn ensure_supported(&self) -> crate::Result<()> {
        if self.version != INDEX_VERSION {
            return Err(crate::Error::not_loaded(format!(
                "index version {} is not supported (expected {INDEX_VERSION})",
                self.version
            )));
        }
        Ok(())
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.iter().position(|f| f.name == name).map(|i| i as FieldId)
    }

    /// Rank documents for `query`. Fields the index does not know are ignored.
    pub fn search(&self, query: &Query) -> Vec<SearchResult> {
        if query.is_empty() {
            return Vec::new();
        }
        let allowed: Vec<bool> = match &query.fields {
            Some(names) => self.fields.iter().map(|f| names.iter().any(|n| *n == f.name)).collect(),
            None => vec![true; self.fields.len()],
        };

        let mut scores: HashMap<DocId, (f32, usize)> = HashMap::new();
        for term in &query.terms {
            let Some(postings) = self.postings.get(term) else { return Vec::new() };
            let mut per_doc: HashMap<DocId, f32> = HashMap::new();
            for p in postings {
                let field = p.field as usize;
                if !allowed.get(field).copied().unwrap_or(false) { continue; }
                let boost = self.fields[field].boost;
                *per_doc.entry(p.doc_id).or_insert(0.0) += p.weight * boost;
            }
            for (doc_id, contrib) in per_doc {
                let entry = scores.entry(doc_id).or_insert((0.0, 0));
                entry.0 += contrib;
                entry.1 += 1;
            }
        }

        let mut scored: Vec<(DocId, f32)> = scores
            .into_iter()
            .filter(|(_, (_, matched))| *matched == query.terms.len())
            .map(|(doc_id, (score, _))| (doc_id, score))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        tracing::debug!(terms = ?query.terms, hits = scored.len(), "query evaluated");

        scored
            .into_iter()
            .filter_map(|(doc_id, score)| {
                self.refs.get(doc_id as usize).map(|r| SearchResult { doc_ref: r.clone(), score })
            })
            .collect()
    }
}
