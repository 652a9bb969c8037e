use crate::ircore::{DocId, TermOffset};
use crate::ircore::index::Posting;

/// Inverted list of one IOP node: postings ordered by strictly increasing
/// document id, positions strictly increasing within a posting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvList {
    field: String,
    postings: Vec<Posting>,
    // documents with at least one posting
    df: usize,
    // occurrences over all postings
    ctf: u64,
}

impl InvList {
    pub fn new(field: &str) -> Self {
        InvList {
            field: field.to_string(),
            ..Self::default()
        }
    }

    // leaf list pulled from the index, with the index's own statistics
    pub fn with_stats(field: &str, postings: Vec<Posting>, df: usize, ctf: u64) -> Self {
        InvList {
            field: field.to_string(),
            postings,
            df,
            ctf,
        }
    }

    pub fn append_posting(&mut self, doc_id: DocId, positions: Vec<TermOffset>) {
        debug_assert!(self.postings.last().map_or(true, |p| p.get_doc_id() < doc_id));
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        if positions.is_empty() {
            return;
        }
        self.df += 1;
        self.ctf += positions.len() as u64;
        self.postings.push(Posting::new(doc_id, positions));
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn df(&self) -> usize {
        self.df
    }

    pub fn ctf(&self) -> u64 {
        self.ctf
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
