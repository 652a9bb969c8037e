use std::collections::HashMap;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::ircore::{DocId, TermOffset};
use crate::ircore::error::{EvalError, Result};
use crate::ircore::index::{IndexReader, TermVector, TermVectorEntry};
use crate::ircore::utils::binary_search::lower_bound;
use crate::ircore::utils::serialize::{read_file, write_file};

type Positions = Vec<TermOffset>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    doc_id: DocId,
    term_frequency: u32,
    positions: Positions,
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Positions) -> Self {
        Posting {
            doc_id,
            term_frequency: positions.len() as u32,
            positions,
        }
    }
    pub fn get_doc_id(&self) -> DocId {
        self.doc_id
    }
    pub fn get_term_frequency(&self) -> u32 {
        self.term_frequency
    }
    pub fn get_positions(&self) -> &Positions {
        &self.positions
    }
}

type PostingsList = HashMap<String, Vec<Posting>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FieldIndex {
    // term -> postings, ordered by doc id
    postings_lists: PostingsList,
    // number of times a term occurs in the field over the collection
    total_term_freq: HashMap<String, u64>,
    // field length of a document, measured in tokens
    document_length: HashMap<DocId, u32>,
    total_document_length: u64,
    // doc-term list, for term vectors
    #[serde(skip)]
    doc_terms: HashMap<DocId, Vec<String>>,
}

/// In-memory positional index over fielded, already tokenized documents.
/// Document ids start from 1.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryIndex {
    fields: HashMap<String, FieldIndex>,
    // value doc_id - 1 is used as vector index
    external_ids: Vec<String>,
    #[serde(skip)]
    internal_ids: HashMap<String, DocId>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut index: MemoryIndex = read_file(path)?;
        index.rebuild();
        Ok(index)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        write_file(path, self)
    }

    fn next_doc_id(&self) -> DocId {
        self.external_ids.len() as DocId + 1
    }

    /// Adds a document given as (field, text) pairs. The text is already
    /// tokenized: tokens are separated by whitespace. Positions start at 1.
    pub fn add_document(&mut self, external_id: &str, fields: &[(&str, &str)]) -> Result<DocId> {
        if self.internal_ids.contains_key(external_id) {
            return Err(EvalError::index(format!("duplicate external document id {}", external_id)));
        }
        let doc_id = self.next_doc_id();
        self.external_ids.push(external_id.to_string());
        self.internal_ids.insert(external_id.to_string(), doc_id);
        for (field, text) in fields {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let field_index = self.fields.entry(field.to_string()).or_default();
            // update field length, a repeated field continues where the last one ended
            let doc_length = field_index.document_length.entry(doc_id).or_insert(0);
            let base_offset = *doc_length;
            *doc_length += tokens.len() as u32;
            field_index.total_document_length += tokens.len() as u64;
            // build position index
            for (seq, token) in tokens.iter().enumerate() {
                let term_offset = base_offset + seq as TermOffset + 1;
                let postings = field_index.postings_lists.entry(token.to_string()).or_insert_with(Vec::new);
                match postings.last_mut() {
                    Some(post) if post.doc_id == doc_id => {
                        post.term_frequency += 1;
                        post.positions.push(term_offset);
                    },
                    _ => {
                        postings.push(Posting::new(doc_id, vec![term_offset]));
                        field_index.doc_terms.entry(doc_id).or_insert_with(Vec::new).push(token.to_string());
                    },
                }
                *field_index.total_term_freq.entry(token.to_string()).or_insert(0) += 1;
            }
        }
        Ok(doc_id)
    }

    // Rebuild lookup tables after load from index file
    fn rebuild(&mut self) {
        self.internal_ids = self.external_ids.iter()
            .enumerate()
            .map(|(seq, ext)| (ext.clone(), seq as DocId + 1))
            .collect();
        for field_index in self.fields.values_mut() {
            field_index.doc_terms.clear();
            for (term, postings) in &field_index.postings_lists {
                for posting in postings {
                    field_index.doc_terms.entry(posting.doc_id)
                        .or_insert_with(Vec::new)
                        .push(term.clone());
                }
            }
        }
    }

    fn check_doc_id(&self, doc: DocId) -> Result<()> {
        if doc >= 1 && (doc as usize) <= self.external_ids.len() {
            Ok(())
        }else{
            Err(EvalError::index(format!("document id {} out of range", doc)))
        }
    }
}

impl IndexReader for MemoryIndex {
    fn get_document_count(&self) -> usize {
        self.external_ids.len()
    }

    fn get_internal_docid(&self, external_id: &str) -> Result<DocId> {
        self.internal_ids.get(external_id)
            .copied()
            .ok_or_else(|| EvalError::index(format!("unknown external document id {}", external_id)))
    }

    fn get_external_docid(&self, doc: DocId) -> Result<String> {
        self.check_doc_id(doc)?;
        Ok(self.external_ids[doc as usize - 1].clone())
    }

    fn get_field_length(&self, field: &str, doc: DocId) -> Result<u64> {
        self.check_doc_id(doc)?;
        Ok(self.fields.get(field)
            .and_then(|f| f.document_length.get(&doc))
            .map_or(0, |&len| len as u64))
    }

    fn get_sum_of_field_lengths(&self, field: &str) -> Result<u64> {
        Ok(self.fields.get(field).map_or(0, |f| f.total_document_length))
    }

    fn get_field_doc_count(&self, field: &str) -> Result<usize> {
        Ok(self.fields.get(field).map_or(0, |f| f.document_length.len()))
    }

    fn get_total_term_freq(&self, term: &str, field: &str) -> Result<u64> {
        Ok(self.fields.get(field)
            .and_then(|f| f.total_term_freq.get(term))
            .copied()
            .unwrap_or(0))
    }

    fn get_document_frequency(&self, term: &str, field: &str) -> Result<usize> {
        Ok(self.fields.get(field)
            .and_then(|f| f.postings_lists.get(term))
            .map_or(0, |postings| postings.len()))
    }

    fn get_postings(&self, term: &str, field: &str) -> Result<Vec<Posting>> {
        Ok(self.fields.get(field)
            .and_then(|f| f.postings_lists.get(term))
            .cloned()
            .unwrap_or_default())
    }

    fn get_term_vector(&self, doc: DocId, field: &str) -> Result<TermVector> {
        self.check_doc_id(doc)?;
        let mut entries = vec![];
        if let Some(field_index) = self.fields.get(field) {
            if let Some(terms) = field_index.doc_terms.get(&doc) {
                for term in terms {
                    let postings = field_index.postings_lists.get(term)
                        .ok_or_else(|| EvalError::index(format!("no postings for {}.{}", term, field)))?;
                    let at = lower_bound(postings, 0, postings.len(), doc, |p| p.doc_id);
                    let posting = postings.get(at)
                        .filter(|p| p.doc_id == doc)
                        .ok_or_else(|| EvalError::index(format!("{} missing from postings of {}", doc, term)))?;
                    entries.push(TermVectorEntry {
                        stem: term.clone(),
                        term_frequency: posting.term_frequency,
                        total_term_frequency: field_index.total_term_freq.get(term).copied().unwrap_or(0),
                    });
                }
            }
        }
        entries.sort_by(|a, b| a.stem.cmp(&b.stem));
        Ok(TermVector { doc_id: doc, field: field.to_string(), entries })
    }
}
