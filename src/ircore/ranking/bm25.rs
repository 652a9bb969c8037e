use crate::ircore::model::Bm25Params;

// The BM25 term score
// idf * tf_weight * user_weight
//   idf: max(0, ln((N - df + 0.5) / (df + 0.5)))
//   tf_weight: tf / (tf + k1*((1-b) + b*doclen/avg_doclen))
//   user_weight: (k3+1)*qtf / (k3+1), qtf is always 1
pub struct Bm25TermStats {
    // total number of documents
    pub doc_count: f64,
    // number of documents containing the term
    pub df: f64,
    // term frequency in the current document
    pub tf: f64,
    pub doc_length: f64,
    pub avg_doc_length: f64,
}

// clamped at 0 so that terms in more than half of the collection never count against a document
pub fn idf(doc_count: f64, df: f64) -> f64 {
    let rsj_weight = ((doc_count - df + 0.5) / (df + 0.5)).ln();
    if rsj_weight > 0.0 { rsj_weight } else { 0.0 }
}

pub fn tf_weight(params: &Bm25Params, tf: f64, doc_length: f64, avg_doc_length: f64) -> f64 {
    tf / (tf + params.k_1 * ((1.0 - params.b) + params.b * doc_length / avg_doc_length))
}

pub fn user_weight(params: &Bm25Params) -> f64 {
    let qtf = 1.0;
    (params.k_3 + 1.0) * qtf / (params.k_3 + 1.0)
}

pub fn term_score(params: &Bm25Params, stats: &Bm25TermStats) -> f64 {
    idf(stats.doc_count, stats.df)
        * tf_weight(params, stats.tf, stats.doc_length, stats.avg_doc_length)
        * user_weight(params)
}
