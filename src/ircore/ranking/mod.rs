pub mod bm25;
pub mod lmd;

use std::cmp::Ordering;
use crate::ircore::DocId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocScore {
    pub docid: DocId,
    pub score: f64,
}

/// Result of one query evaluation: (document, score) pairs, filled in
/// document order and then sorted once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreList {
    scores: Vec<DocScore>,
}

impl ScoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, docid: DocId, score: f64) {
        self.scores.push(DocScore { docid, score });
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, rank: usize) -> Option<&DocScore> {
        self.scores.get(rank)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocScore> {
        self.scores.iter()
    }

    // the first n entries in current order
    pub fn top(&self, n: usize) -> &[DocScore] {
        &self.scores[..n.min(self.scores.len())]
    }

    // descending score, ties by ascending document id
    pub fn sort(&mut self) {
        self.scores.sort_by(|a, b| {
            b.score.partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.docid.cmp(&b.docid))
        });
    }
}

impl<'a> IntoIterator for &'a ScoreList {
    type Item = &'a DocScore;
    type IntoIter = std::slice::Iter<'a, DocScore>;
    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_score_list() {
        let mut scores = ScoreList::new();
        scores.add(4, 0.5);
        scores.add(1, 0.25);
        scores.add(3, 0.5);
        scores.add(2, 1.0);
        scores.sort();
        let order: Vec<DocId> = scores.iter().map(|s| s.docid).collect();
        assert_eq!(order, vec![2, 3, 4, 1]);
        // sorting is idempotent
        let once = scores.clone();
        scores.sort();
        assert_eq!(scores, once);
        assert_eq!(scores.top(2).len(), 2);
        assert_eq!(scores.top(10).len(), 4);
        assert_eq!(scores.get(0), Some(&DocScore { docid: 2, score: 1.0 }));
    }
}
