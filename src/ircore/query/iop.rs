use crate::ircore::{DocId, TermOffset};
use crate::ircore::error::Result;
use crate::ircore::index::{IndexReader, Posting};
use crate::ircore::model::RetrievalModel;
use crate::ircore::query::invlist::InvList;
use crate::ircore::query::iterator::{DocIterator, match_min};
use crate::ircore::utils::binary_search::lower_bound;

/// Evaluated IOP node: its inverted list plus a document cursor and a
/// location cursor into the current posting. The list is built once at
/// initialization; the cursors are the only state that moves.
#[derive(Debug, Clone)]
pub struct IopIter {
    list: InvList,
    // index of the current posting, list.len() once exhausted
    doc: usize,
    // index into the positions of the current posting
    loc: usize,
}

impl IopIter {
    pub fn new(list: InvList) -> Self {
        IopIter { list, doc: 0, loc: 0 }
    }

    pub fn list(&self) -> &InvList {
        &self.list
    }

    pub fn field(&self) -> &str {
        self.list.field()
    }

    pub fn df(&self) -> usize {
        self.list.df()
    }

    pub fn ctf(&self) -> u64 {
        self.list.ctf()
    }

    pub fn current_posting(&self) -> Option<&Posting> {
        self.list.postings().get(self.doc)
    }

    pub fn current_tf(&self) -> Option<u32> {
        self.current_posting().map(|p| p.get_term_frequency())
    }

    pub fn loc_current(&self) -> Option<TermOffset> {
        self.current_posting().and_then(|p| p.get_positions().get(self.loc).copied())
    }

    pub fn loc_advance(&mut self) {
        self.loc += 1;
    }
}

impl DocIterator for IopIter {
    fn has_match(&mut self, _model: &RetrievalModel) -> bool {
        self.doc < self.list.len()
    }

    fn current_match(&self) -> Option<DocId> {
        self.current_posting().map(|p| p.get_doc_id())
    }

    fn advance_past(&mut self, docid: DocId) {
        let postings = self.list.postings();
        let mut next = lower_bound(postings, self.doc, postings.len(), docid, |p| p.get_doc_id());
        if next < postings.len() && postings[next].get_doc_id() == docid {
            next += 1;
        }
        self.doc = next;
        self.loc = 0;
    }

    fn advance_to(&mut self, docid: DocId) {
        let postings = self.list.postings();
        self.doc = lower_bound(postings, self.doc, postings.len(), docid, |p| p.get_doc_id());
        self.loc = 0;
    }
}

// leaf: the term's postings as stored in the index
pub fn term(index: &dyn IndexReader, term: &str, field: &str) -> Result<IopIter> {
    let postings = index.get_postings(term, field)?;
    let df = index.get_document_frequency(term, field)?;
    let ctf = index.get_total_term_freq(term, field)?;
    log::debug!("{}.{}: df {} ctf {}", term, field, df, ctf);
    Ok(IopIter::new(InvList::with_stats(field, postings, df, ctf)))
}

// #SYN: every document any argument matches, positions merged
pub fn syn(args: &mut [IopIter], field: &str, model: &RetrievalModel) -> IopIter {
    let mut list = InvList::new(field);
    while let Some(docid) = match_min(args, model) {
        let mut positions: Vec<TermOffset> = vec![];
        for arg in args.iter_mut() {
            if arg.current_match() == Some(docid) {
                if let Some(posting) = arg.current_posting() {
                    positions.extend_from_slice(posting.get_positions());
                }
            }
            arg.advance_past(docid);
        }
        positions.sort_unstable();
        positions.dedup();
        list.append_posting(docid, positions);
    }
    IopIter::new(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ircore::index::MemoryIndex;

    fn sample_index() -> MemoryIndex {
        let mut idx = MemoryIndex::new();
        idx.add_document("d1", &[("body", "a b a c")]).unwrap();
        idx.add_document("d2", &[("body", "c c")]).unwrap();
        idx.add_document("d3", &[("body", "b a")]).unwrap();
        idx
    }

    #[test]
    fn test_term_cursor() {
        let idx = sample_index();
        let model = RetrievalModel::UnrankedBoolean;
        let mut it = term(&idx, "a", "body").unwrap();
        assert_eq!(it.df(), 2);
        assert_eq!(it.ctf(), 3);
        assert!(it.has_match(&model));
        assert_eq!(it.current_match(), Some(1));
        assert_eq!(it.current_tf(), Some(2));
        assert_eq!(it.loc_current(), Some(1));
        it.loc_advance();
        assert_eq!(it.loc_current(), Some(3));
        it.loc_advance();
        assert_eq!(it.loc_current(), None);
        // moving to a later document resets the location cursor
        it.advance_to(2);
        assert_eq!(it.current_match(), Some(3));
        assert_eq!(it.loc_current(), Some(2));
        // never rewinds
        it.advance_to(1);
        assert_eq!(it.current_match(), Some(3));
        it.advance_past(3);
        assert!(!it.has_match(&model));
        assert_eq!(it.current_match(), None);
    }

    #[test]
    fn test_advance_past_keeps_later_documents() {
        let idx = sample_index();
        let mut it = term(&idx, "c", "body").unwrap();
        it.advance_past(2);
        assert_eq!(it.current_match(), None);
        let mut it = term(&idx, "b", "body").unwrap();
        it.advance_past(2);
        assert_eq!(it.current_match(), Some(3));
    }

    #[test]
    fn test_syn_union() {
        let idx = sample_index();
        let model = RetrievalModel::UnrankedBoolean;
        let mut args = vec![term(&idx, "a", "body").unwrap(), term(&idx, "c", "body").unwrap()];
        let it = syn(&mut args, "body", &model);
        let postings = it.list().postings();
        assert_eq!(postings.len(), 3);
        assert_eq!(postings[0], Posting::new(1, vec![1, 3, 4]));
        assert_eq!(postings[1], Posting::new(2, vec![1, 2]));
        assert_eq!(postings[2], Posting::new(3, vec![2]));
        assert_eq!(it.ctf(), 6);
        assert_eq!(it.df(), 3);
    }
}
