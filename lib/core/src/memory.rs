// In-memory corpus: inverted index for counting, per-document values for faceting
use crate::{Corpus, DocId, DocSet, Error, FacetBucket, Query, Result};
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct CorpusIndex {
    doc_count: u32,
    fields: AHashSet<String>,
    // field -> normalized term -> doc ids (ascending)
    postings: AHashMap<String, AHashMap<String, Vec<DocId>>>,
    // field -> doc ids holding any value (ascending)
    field_docs: AHashMap<String, Vec<DocId>>,
    // field -> doc id -> distinct raw values
    doc_values: AHashMap<String, AHashMap<DocId, Vec<String>>>,
}

fn as_document(doc: &Value) -> Result<&serde_json::Map<String, Value>> {
    doc.as_object()
        .ok_or_else(|| Error::InvalidDocument(format!("expected a JSON object, got {}", doc)))
}

impl CorpusIndex {
    fn insert(&mut self, doc: &Value) -> Result<DocId> {
        let object = as_document(doc)?;

        let doc_id = self.doc_count;
        for (field, value) in object {
            let values = scalar_values(value);
            if values.is_empty() {
                continue;
            }
            self.fields.insert(field.clone());
            push_id(self.field_docs.entry(field.clone()).or_default(), doc_id);

            let terms = self.postings.entry(field.clone()).or_default();
            let stored = self
                .doc_values
                .entry(field.clone())
                .or_default()
                .entry(doc_id)
                .or_default();

            for raw in values {
                push_id(terms.entry(Query::normalize_term(&raw)).or_default(), doc_id);
                if !stored.contains(&raw) {
                    stored.push(raw);
                }
            }
        }
        self.doc_count += 1;
        Ok(doc_id)
    }

    fn resolve(&self, query: &Query) -> DocSet {
        match query {
            Query::MatchAll => DocSet::range(self.doc_count),
            Query::Term { field, value } => self
                .postings
                .get(field)
                .and_then(|terms| terms.get(&Query::normalize_term(value)))
                .map(|ids| DocSet::from_sorted(ids.clone()))
                .unwrap_or_default(),
            Query::Exists { field } => self
                .field_docs
                .get(field)
                .map(|ids| DocSet::from_sorted(ids.clone()))
                .unwrap_or_default(),
            Query::And(clauses) => {
                let mut result = DocSet::range(self.doc_count);
                for clause in clauses {
                    if result.is_empty() {
                        break;
                    }
                    result = result.intersect(&self.resolve(clause));
                }
                result
            }
        }
    }

    fn facet(&self, field: &str, query: Option<&Query>, domain: &DocSet, limit: usize) -> Result<Vec<FacetBucket>> {
        if !self.fields.contains(field) {
            return Err(Error::FieldNotFound(field.to_string()));
        }
        let Some(values) = self.doc_values.get(field) else {
            return Ok(Vec::new());
        };

        let scope = match query {
            Some(q) => self.resolve(q).intersect(domain),
            None => domain.clone(),
        };

        let mut counts: AHashMap<&str, u64> = AHashMap::new();
        for doc_id in scope.iter() {
            if let Some(doc_values) = values.get(&doc_id) {
                for v in doc_values {
                    *counts.entry(v.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut buckets: Vec<FacetBucket> = counts
            .into_iter()
            .map(|(value, count)| FacetBucket::new(value, count))
            .collect();
        buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        buckets.truncate(limit);
        Ok(buckets)
    }
}

fn push_id(ids: &mut Vec<DocId>, doc_id: DocId) {
    if ids.last() != Some(&doc_id) {
        ids.push(doc_id);
    }
}

fn scalar_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_array() && !v.is_object())
            .flat_map(scalar_values)
            .collect(),
        Value::Null | Value::Object(_) => Vec::new(),
    }
}

/// A corpus of JSON documents held in memory.
///
/// Each top-level key of a document is a field. Strings, numbers, booleans
/// and arrays of those are indexed; nested objects are ignored.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    index: Arc<RwLock<CorpusIndex>>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents<I>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let corpus = Self::new();
        corpus.add_documents(documents)?;
        Ok(corpus)
    }

    /// Index one document and return its id
    pub fn add_document(&self, document: &Value) -> Result<DocId> {
        self.index.write().insert(document)
    }

    /// Index a batch of documents under a single write lock.
    ///
    /// The batch is all or nothing: it is rejected before anything is indexed
    /// if any document is not a JSON object.
    pub fn add_documents<I>(&self, documents: I) -> Result<usize>
    where
        I: IntoIterator<Item = Value>,
    {
        let documents: Vec<Value> = documents.into_iter().collect();
        for document in &documents {
            as_document(document)?;
        }

        let mut index = self.index.write();
        for document in &documents {
            index.insert(document)?;
        }
        debug!("Indexed {} documents ({} total)", documents.len(), index.doc_count);
        Ok(documents.len())
    }

    /// Register a field in the schema even if no document holds it yet
    pub fn declare_field(&self, name: &str) {
        self.index.write().fields.insert(name.to_string());
    }

    /// Load newline-delimited JSON documents. Blank lines are skipped.
    pub fn load_jsonl<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut documents = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let document: Value = serde_json::from_str(&line).map_err(|e| {
                Error::Serialization(format!("{}:{}: {}", path.display(), line_no + 1, e))
            })?;
            documents.push(document);
        }
        let added = self.add_documents(documents)?;
        info!("Loaded {} documents from {:?}", added, path);
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.index.read().doc_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Known field names, sorted
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.index.read().fields.iter().cloned().collect();
        fields.sort();
        fields
    }
}

impl Corpus for MemoryCorpus {
    fn resolve(&self, query: &Query) -> Result<DocSet> {
        Ok(self.index.read().resolve(query))
    }

    fn resolve_all(&self, queries: &[Query]) -> Result<DocSet> {
        let index = self.index.read();
        let mut domain = index.resolve(&Query::MatchAll);
        for query in queries {
            domain = domain.intersect(&index.resolve(query));
        }
        Ok(domain)
    }

    fn count(&self, query: &Query, domain: &DocSet) -> Result<u64> {
        let matching = self.index.read().resolve(query);
        Ok(matching.intersection_len(domain) as u64)
    }

    fn facet_top_values(
        &self,
        field: &str,
        query: Option<&Query>,
        domain: &DocSet,
        limit: usize,
    ) -> Result<Vec<FacetBucket>> {
        self.index.read().facet(field, query, domain, limit)
    }

    fn field_exists(&self, name: &str) -> bool {
        self.index.read().fields.contains(name)
    }

    fn total_document_count(&self) -> Result<u64> {
        Ok(u64::from(self.index.read().doc_count))
    }
}
