use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use crate::ircore::DocId;
use crate::ircore::cfg::FeedbackParams;
use crate::ircore::error::Result;
use crate::ircore::index::IndexReader;
use crate::ircore::ranking::ScoreList;
use crate::ircore::ranking::lmd;

// Pseudo-relevance feedback
// For every candidate term t from the term vectors of the top fb_docs documents:
//   score(t) = sum over feedback documents d of p(t|d) * score(d) * ln(1 / p(t|C))
//   p(t|C): ctf / total field length
//   p(t|d): (tf + mu * p(t|C)) / (doclen + mu), tf is 0 for documents without t
// The fb_terms best terms form a #wand query weighted by their scores.
pub fn expand_query(index: &dyn IndexReader, initial: &ScoreList, params: &FeedbackParams, default_field: &str) -> Result<String> {
    let field = params.field.as_str();
    let collection_length = index.get_sum_of_field_lengths(field)? as f64;
    let fb_docs = initial.top(params.docs);

    let mut doc_lengths = Vec::with_capacity(fb_docs.len());
    // p(t|C), filled on first sight of a term
    let mut p_collection: HashMap<String, f64> = HashMap::new();
    let mut present_in: HashMap<String, HashSet<DocId>> = HashMap::new();
    // term ordered, so that equal scores keep term order after the stable sort below
    let mut candidates: BTreeMap<String, f64> = BTreeMap::new();

    for doc in fb_docs {
        let doc_length = index.get_field_length(field, doc.docid)? as f64;
        doc_lengths.push(doc_length);
        let term_vector = index.get_term_vector(doc.docid, field)?;
        for entry in &term_vector.entries {
            if entry.stem.contains('.') || entry.stem.contains(',') {
                continue;
            }
            let p_c = *p_collection.entry(entry.stem.clone())
                .or_insert_with(|| lmd::p_mle(entry.total_term_frequency as f64, collection_length));
            let p_d = lmd::dirichlet(entry.term_frequency as f64, p_c, doc_length, params.mu);
            *candidates.entry(entry.stem.clone()).or_insert(0.0) += p_d * doc.score * (1.0 / p_c).ln();
            present_in.entry(entry.stem.clone()).or_default().insert(doc.docid);
        }
    }

    for (term, score) in candidates.iter_mut() {
        let p_c = match p_collection.get(term) {
            Some(&p_c) => p_c,
            None => continue,
        };
        for (doc, &doc_length) in fb_docs.iter().zip(&doc_lengths) {
            if present_in.get(term).map_or(false, |docs| docs.contains(&doc.docid)) {
                continue;
            }
            let p_d = lmd::dirichlet(0.0, p_c, doc_length, params.mu);
            *score += p_d * doc.score * (1.0 / p_c).ln();
        }
    }

    let mut ranked: Vec<(String, f64)> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(params.terms);
    log::debug!("{} expansion terms from {} feedback documents", ranked.len(), fb_docs.len());

    let suffix = if field == default_field { String::new() } else { format!(".{}", field) };
    let mut expansion = String::from("#wand (");
    for (term, weight) in &ranked {
        expansion.push_str(&format!(" {:.4} {}{}", weight, term, suffix));
    }
    expansion.push_str(" )");
    Ok(expansion)
}

/// Final query of a feedback run: the user query under the model's
/// default operator, mixed with the expansion query.
pub fn combine(query: &str, default_operator: &str, expansion: &str, orig_weight: f64) -> String {
    format!("#wand ( {:.4} {}({}) {:.4} {} )", orig_weight, default_operator, query, 1.0 - orig_weight, expansion)
}
