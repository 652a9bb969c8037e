pub mod pl;
pub mod jsonlines;

pub use pl::{MemoryIndex, Posting};
use crate::ircore::DocId;
use crate::ircore::error::Result;

/// One entry of a document term vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVectorEntry {
    pub stem: String,
    // occurrences in this document
    pub term_frequency: u32,
    // occurrences in the whole collection
    pub total_term_frequency: u64,
}

/// Terms of one (document, field), ordered by stem.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVector {
    pub doc_id: DocId,
    pub field: String,
    pub entries: Vec<TermVectorEntry>,
}

impl TermVector {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only access to the index. Query trees, scorers and feedback get it
/// passed in explicitly; nothing reaches for a global handle.
pub trait IndexReader {
    // get: total number of documents in the collection
    fn get_document_count(&self) -> usize;
    // get: internal id for an external document id
    fn get_internal_docid(&self, external_id: &str) -> Result<DocId>;
    // get: external id for an internal document id
    fn get_external_docid(&self, doc: DocId) -> Result<String>;
    // get: length of a field in one document, measured in tokens
    fn get_field_length(&self, field: &str, doc: DocId) -> Result<u64>;
    // get: total length of a field over the collection
    fn get_sum_of_field_lengths(&self, field: &str) -> Result<u64>;
    // get: number of documents having the field
    fn get_field_doc_count(&self, field: &str) -> Result<usize>;
    // get: collection term frequency (ctf) of a term in a field
    fn get_total_term_freq(&self, term: &str, field: &str) -> Result<u64>;
    // get: number of documents whose field contains the term (df)
    fn get_document_frequency(&self, term: &str, field: &str) -> Result<usize>;
    // get: postings of a term in a field, ordered by document id
    fn get_postings(&self, term: &str, field: &str) -> Result<Vec<Posting>>;
    // get: term vector of a document field
    fn get_term_vector(&self, doc: DocId, field: &str) -> Result<TermVector>;
}
