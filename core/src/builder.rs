use crate::document::Document;
use crate::error::{Error, Result};
use crate::index::{default_fields, FieldSpec, InvertedIndex, Posting};
use crate::tokenizer::tokenize;
use crate::{DocId, FieldId, INDEX_VERSION};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub fields: Vec<FieldSpec>,
    /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
    pub smoothed_idf: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { fields: default_fields(), smoothed_idf: false }
    }
}

/// Accumulates documents in collection order and produces an [`InvertedIndex`].
pub struct IndexBuilder {
    options: BuildOptions,
    refs: Vec<String>,
    doc_id_map: HashMap<String, DocId>,
    // term -> (doc, field, raw tf), pushed in doc order
    postings_raw: BTreeMap<String, Vec<(DocId, FieldId, u32)>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::with_options(BuildOptions::default())
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self { options, refs: Vec::new(), doc_id_map: HashMap::new(), postings_raw: BTreeMap::new() }
    }

    pub fn len(&self) -> usize { self.refs.len() }

    pub fn is_empty(&self) -> bool { self.refs.is_empty() }

    /// Add one document; returns its positional id.
    pub fn add(&mut self, doc: &Document) -> Result<DocId> {
        if self.doc_id_map.contains_key(&doc.ident) {
            return Err(Error::malformed(format!("duplicate ident `{}`", doc.ident)));
        }
        let doc_id = self.refs.len() as DocId;
        self.doc_id_map.insert(doc.ident.clone(), doc_id);
        self.refs.push(doc.ident.clone());

        for (field_id, field) in self.options.fields.iter().enumerate() {
            let mut tf_counts: BTreeMap<String, u32> = BTreeMap::new();
            for (term, _pos) in tokenize(&doc.field_text(&field.name)) {
                *tf_counts.entry(term).or_insert(0) += 1;
            }
            for (term, tf_raw) in tf_counts {
                self.postings_raw.entry(term).or_default().push((doc_id, field_id as FieldId, tf_raw));
            }
        }
        tracing::debug!(ident = %doc.ident, doc_id, "indexed document");
        Ok(doc_id)
    }

    pub fn add_all<'a, I>(&mut self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        for doc in docs {
            self.add(doc)?;
        }
        Ok(())
    }

    /// Compute normalized TF-IDF weights and freeze the index.
    pub fn build(self) -> InvertedIndex {
        let n = self.refs.len().max(1) as f32;
        let num_fields = self.options.fields.len();

        // First pass: tf-idf per posting and per-(doc, field) norms
        let mut norms: HashMap<(DocId, FieldId), f32> = HashMap::new();
        let mut weighted: BTreeMap<String, Vec<(DocId, FieldId, f32)>> = BTreeMap::new();
        for (term, plist) in self.postings_raw {
            let df_t = distinct_docs(&plist).max(1) as f32;
            let idf = if self.options.smoothed_idf { (1.0 + n / df_t).ln() } else { (n / df_t).ln() };
            let mut out = Vec::with_capacity(plist.len());
            for (doc_id, field, tf_raw) in plist {
                let tf = if tf_raw > 0 { 1.0 + (tf_raw as f32).ln() } else { 0.0 };
                let tfidf = tf * idf;
                *norms.entry((doc_id, field)).or_insert(0.0) += tfidf * tfidf;
                out.push((doc_id, field, tfidf));
            }
            weighted.insert(term, out);
        }
        for norm in norms.values_mut() {
            *norm = norm.sqrt();
            if *norm == 0.0 { *norm = 1.0; }
        }

        // Second pass: normalize within each field
        let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for (term, plist) in weighted {
            let mut out: Vec<Posting> = plist
                .into_iter()
                .map(|(doc_id, field, tfidf)| Posting { doc_id, field, weight: tfidf / norms[&(doc_id, field)] })
                .collect();
            out.sort_by_key(|p| (p.doc_id, p.field));
            postings.insert(term, out);
        }

        tracing::info!(num_docs = self.refs.len(), num_terms = postings.len(), num_fields, "index built");
        InvertedIndex { version: INDEX_VERSION, fields: self.options.fields, refs: self.refs, postings }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn distinct_docs(plist: &[(DocId, FieldId, u32)]) -> usize {
    let mut count = 0;
    let mut last = None;
    for (doc_id, _, _) in plist {
        if last != Some(*doc_id) {
            count += 1;
            last = Some(*doc_id);
        }
    }
    count
}

/// Build an index over `docs` with the given options.
pub fn build_index(docs: &[Document], options: BuildOptions) -> Result<InvertedIndex> {
    let mut builder = IndexBuilder::with_options(options);
    builder.add_all(docs)?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisory(ident: &str, title: &str, keywords: &str, package: &str) -> Document {
        Document::new(ident)
            .with_field("title", title)
            .with_field("aliases", "")
            .with_field("keywords", keywords)
            .with_field("package", package)
    }

    #[test]
    fn assigns_positional_ids_in_order() {
        let mut builder = IndexBuilder::new();
        assert_eq!(builder.add(&advisory("CVE-9", "b", "", "")).unwrap(), 0);
        assert_eq!(builder.add(&advisory("CVE-1", "a", "", "")).unwrap(), 1);
        let index = builder.build();
        assert_eq!(index.refs, vec!["CVE-9".to_string(), "CVE-1".to_string()]);
    }

    #[test]
    fn duplicate_ident_is_rejected() {
        let mut builder = IndexBuilder::new();
        builder.add(&advisory("CVE-1", "first", "", "")).unwrap();
        let err = builder.add(&advisory("CVE-1", "second", "", "")).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(ref m) if m.contains("CVE-1")));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn weights_are_normalized_per_field() {
        let docs = vec![advisory("CVE-1", "sql injection", "", "widget"), advisory("CVE-2", "xss", "", "gadget")];
        let index = build_index(&docs, BuildOptions { smoothed_idf: true, ..Default::default() }).unwrap();
        let package_field = index.field_id("package").unwrap();
        let widget = &index.postings["widget"];
        assert_eq!(widget.len(), 1);
        assert_eq!(widget[0].field, package_field);
        // sole term in its field
        assert!((widget[0].weight - 1.0).abs() < 1e-6);
    }

    #[test]
    fn postings_sorted_by_doc_then_field() {
        let docs = vec![
            advisory("A", "ruby", "ruby", ""),
            advisory("B", "python", "ruby", "ruby"),
        ];
        let index = build_index(&docs, BuildOptions::default()).unwrap();
        let term = crate::tokenizer::query_terms("ruby").remove(0);
        let keys: Vec<(DocId, FieldId)> = index.postings[&term].iter().map(|p| (p.doc_id, p.field)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 2), (1, 2), (1, 3)]);
    }
}
