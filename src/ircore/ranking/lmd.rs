use crate::ircore::model::IndriParams;

// LMD - language modeling with Dirichlet smoothing
// p(t|d) = (tf + mu * p_mle) / (doclen + mu)
//   p_mle: ctf / total length of the field over the collection
// Indri interpolates it with the collection model:
// (1 - lambda) * p(t|d) + lambda * p_mle
pub fn p_mle(ctf: f64, collection_length: f64) -> f64 {
    if collection_length > 0.0 { ctf / collection_length } else { 0.0 }
}

pub fn dirichlet(tf: f64, p_mle: f64, doc_length: f64, mu: f64) -> f64 {
    (tf + mu * p_mle) / (doc_length + mu)
}

// tf is 0 for the default score of a document the term does not occur in
pub fn indri_score(params: &IndriParams, tf: f64, p_mle: f64, doc_length: f64) -> f64 {
    (1.0 - params.lambda) * dirichlet(tf, p_mle, doc_length, params.mu) + params.lambda * p_mle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indri_score() {
        let params = IndriParams { lambda: 0.4, mu: 2.0 };
        let p = p_mle(3.0, 12.0);
        assert_eq!(p, 0.25);
        let matched = indri_score(&params, 2.0, p, 4.0);
        assert!((matched - (0.6 * 2.5 / 6.0 + 0.4 * 0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_default_score_at_tf_zero() {
        let params = IndriParams { lambda: 0.2, mu: 1500.0 };
        let p = p_mle(7.0, 10_000.0);
        let default = (1.0 - 0.2) * (1500.0 * p) / (300.0 + 1500.0) + 0.2 * p;
        assert!((indri_score(&params, 0.0, p, 300.0) - default).abs() < 1e-15);
        // the matched formula converges to the default one as tf goes to 0
        let near_zero = indri_score(&params, 1e-9, p, 300.0);
        assert!((near_zero - default).abs() < 1e-9);
        assert_eq!(p_mle(1.0, 0.0), 0.0);
    }
}
