use crate::ircore::DocId;
use crate::ircore::model::RetrievalModel;

/// Document-at-a-time cursor shared by every operator. Cursors only move
/// forward during one evaluation.
pub trait DocIterator {
    // whether a current match exists; combinators may move their arguments forward to find one
    fn has_match(&mut self, model: &RetrievalModel) -> bool;
    // document of the current match, valid after has_match returned true
    fn current_match(&self) -> Option<DocId>;
    // move every argument positioned at or before docid past it
    fn advance_past(&mut self, docid: DocId);
    // move every argument to the first document >= docid
    fn advance_to(&mut self, docid: DocId);
}

/// match-all: the document every argument is positioned at. Lagging
/// arguments are moved forward until they agree or one runs out.
pub fn match_all<T: DocIterator>(args: &mut [T], model: &RetrievalModel) -> Option<DocId> {
    let (first, rest) = args.split_first_mut()?;
    loop {
        if !first.has_match(model) {
            return None;
        }
        let doc_0 = first.current_match()?;
        let mut found = true;
        for arg in rest.iter_mut() {
            arg.advance_to(doc_0);
            if !arg.has_match(model) {
                return None;
            }
            let doc_i = arg.current_match()?;
            if doc_i != doc_0 {
                first.advance_to(doc_i);
                found = false;
                break;
            }
        }
        if found {
            return Some(doc_0);
        }
    }
}

/// match-min: the smallest document any argument still matches.
pub fn match_min<T: DocIterator>(args: &mut [T], model: &RetrievalModel) -> Option<DocId> {
    let mut min_doc: Option<DocId> = None;
    for arg in args.iter_mut() {
        if !arg.has_match(model) {
            continue;
        }
        if let Some(doc) = arg.current_match() {
            min_doc = Some(min_doc.map_or(doc, |min| min.min(doc)));
        }
    }
    min_doc
}

/// match-first: the current document of the only argument.
pub fn match_first<T: DocIterator>(arg: &mut T, model: &RetrievalModel) -> Option<DocId> {
    if arg.has_match(model) {
        arg.current_match()
    }else{
        None
    }
}
