use crate::ircore::TermOffset;
use crate::ircore::model::RetrievalModel;
use crate::ircore::query::invlist::InvList;
use crate::ircore::query::iop::IopIter;
use crate::ircore::query::iterator::{DocIterator, match_all};

/// Distance constraint over one location per operand.
pub trait Proximity {
    // None when the tuple satisfies the constraint, otherwise the operand to move
    fn mismatch(&self, cur: &[TermOffset]) -> Option<usize>;
    // location written to the synthesized posting for a satisfying tuple
    fn recorded(&self, cur: &[TermOffset]) -> TermOffset;
}

/// #NEAR/n: operands in order, each within n positions after the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Near {
    pub distance: u32,
}

/// #WINDOW/n: operands in any order, all within a span smaller than n.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub distance: u32,
}

impl Proximity for Near {
    fn mismatch(&self, cur: &[TermOffset]) -> Option<usize> {
        for i in 1..cur.len() {
            let gap = cur[i] as i64 - cur[i - 1] as i64;
            if !(0..=self.distance as i64).contains(&gap) {
                // move the smaller of the offending pair
                return Some(if cur[i] < cur[i - 1] { i } else { i - 1 });
            }
        }
        None
    }

    fn recorded(&self, cur: &[TermOffset]) -> TermOffset {
        cur.last().copied().unwrap_or_default()
    }
}

impl Proximity for Window {
    fn mismatch(&self, cur: &[TermOffset]) -> Option<usize> {
        let mut min_index = 0;
        let mut min = TermOffset::MAX;
        let mut max = TermOffset::MIN;
        for (i, &loc) in cur.iter().enumerate() {
            if loc < min {
                min = loc;
                min_index = i;
            }
            if loc > max {
                max = loc;
            }
        }
        if cur.is_empty() || max - min < self.distance {
            None
        }else{
            Some(min_index)
        }
    }

    fn recorded(&self, cur: &[TermOffset]) -> TermOffset {
        cur.iter().copied().max().unwrap_or_default()
    }
}

/// Builds the inverted list of a proximity operator from its operands.
///
/// For every document all operands match, one location cursor per operand
/// starts at its first position. A satisfying tuple is recorded and every
/// cursor moves on; otherwise only the operand named by `mismatch` moves.
/// The scan of a document stops once the locations are used up or a cursor
/// that has to move is exhausted. The last tuple is checked once more
/// afterwards unless the scan stopped while moving all cursors after a match.
pub fn synthesize<P: Proximity>(op: &P, args: &mut [IopIter], field: &str, model: &RetrievalModel) -> IopIter {
    let mut list = InvList::new(field);
    if args.is_empty() {
        return IopIter::new(list);
    }
    while let Some(docid) = match_all(args, model) {
        let mut total_locs: i64 = -(args.len() as i64);
        let mut cur: Vec<TermOffset> = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            total_locs += arg.current_tf().unwrap_or(0) as i64;
            arg.advance_to(docid);
            cur.push(arg.loc_current().unwrap_or_default());
            arg.loc_advance();
        }

        let mut advanced: i64 = 0;
        let mut positions: Vec<TermOffset> = vec![];
        let mut from_auto_break = false;
        while advanced < total_locs {
            match op.mismatch(&cur) {
                None => {
                    positions.push(op.recorded(&cur));
                    for (i, arg) in args.iter_mut().enumerate() {
                        match arg.loc_current() {
                            Some(loc) => {
                                cur[i] = loc;
                                arg.loc_advance();
                                advanced += 1;
                            },
                            None => {
                                advanced = total_locs;
                                from_auto_break = true;
                                break;
                            },
                        }
                    }
                },
                Some(i) => {
                    let arg = &mut args[i];
                    match arg.loc_current() {
                        Some(loc) => {
                            cur[i] = loc;
                            arg.loc_advance();
                            advanced += 1;
                        },
                        None => break,
                    }
                },
            }
        }
        if !from_auto_break && op.mismatch(&cur).is_none() {
            positions.push(op.recorded(&cur));
        }

        list.append_posting(docid, positions);
        args[0].advance_past(docid);
    }
    log::debug!("{} documents after proximity match on {}", list.df(), field);
    IopIter::new(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ircore::DocId;
    use crate::ircore::index::Posting;

    fn iter_over(postings: &[(DocId, Vec<TermOffset>)]) -> IopIter {
        let mut list = InvList::new("body");
        for (doc, positions) in postings {
            list.append_posting(*doc, positions.clone());
        }
        IopIter::new(list)
    }

    fn run<P: Proximity>(op: &P, mut args: Vec<IopIter>) -> Vec<Posting> {
        let model = RetrievalModel::UnrankedBoolean;
        synthesize(op, &mut args, "body", &model).list().postings().to_vec()
    }

    #[test]
    fn test_near_ordered_pairs() {
        let args = vec![iter_over(&[(1, vec![1, 4])]), iter_over(&[(1, vec![2, 5])])];
        assert_eq!(run(&Near { distance: 1 }, args), vec![Posting::new(1, vec![2, 5])]);
    }

    #[test]
    fn test_near_order_matters() {
        let args = vec![iter_over(&[(1, vec![5])]), iter_over(&[(1, vec![4])])];
        assert!(run(&Near { distance: 3 }, args).is_empty());
        let args = vec![iter_over(&[(1, vec![4])]), iter_over(&[(1, vec![5])])];
        assert_eq!(run(&Near { distance: 3 }, args), vec![Posting::new(1, vec![5])]);
    }

    #[test]
    fn test_near_gap_bound() {
        let args = vec![iter_over(&[(1, vec![1])]), iter_over(&[(1, vec![4])])];
        assert!(run(&Near { distance: 2 }, args).is_empty());
        let args = vec![iter_over(&[(1, vec![1])]), iter_over(&[(1, vec![4])])];
        assert_eq!(run(&Near { distance: 3 }, args), vec![Posting::new(1, vec![4])]);
        // a gap of 0 satisfies the bound
        assert_eq!(Near { distance: 1 }.mismatch(&[3, 3]), None);
        assert_eq!(Near { distance: 1 }.mismatch(&[3, 6]), Some(0));
        assert_eq!(Near { distance: 1 }.mismatch(&[6, 3]), Some(1));
    }

    #[test]
    fn test_near_skips_unmatched_documents() {
        let args = vec![
            iter_over(&[(1, vec![1]), (2, vec![3]), (4, vec![7, 9])]),
            iter_over(&[(2, vec![9]), (3, vec![1]), (4, vec![8, 20])]),
            iter_over(&[(2, vec![10]), (4, vec![9, 21])]),
        ];
        assert_eq!(run(&Near { distance: 1 }, args), vec![Posting::new(4, vec![9])]);
    }

    #[test]
    fn test_near_match_then_exhausted() {
        // the match moves every cursor, the first one runs out: no recheck of the last tuple
        let args = vec![iter_over(&[(1, vec![1])]), iter_over(&[(1, vec![2, 3])])];
        assert_eq!(run(&Near { distance: 2 }, args), vec![Posting::new(1, vec![2])]);
    }

    #[test]
    fn test_window_span_boundary() {
        // span 3 is not smaller than 3
        let args = vec![iter_over(&[(1, vec![1])]), iter_over(&[(1, vec![2])]), iter_over(&[(1, vec![4])])];
        assert!(run(&Window { distance: 3 }, args).is_empty());
        let args = vec![iter_over(&[(1, vec![1])]), iter_over(&[(1, vec![2])]), iter_over(&[(1, vec![3])])];
        assert_eq!(run(&Window { distance: 3 }, args), vec![Posting::new(1, vec![3])]);
        let args = vec![iter_over(&[(1, vec![1])]), iter_over(&[(1, vec![2])]), iter_over(&[(1, vec![4])])];
        assert_eq!(run(&Window { distance: 4 }, args), vec![Posting::new(1, vec![4])]);
    }

    #[test]
    fn test_window_any_order() {
        let args = vec![iter_over(&[(1, vec![10, 30])]), iter_over(&[(1, vec![8, 29])])];
        assert_eq!(run(&Window { distance: 3 }, args), vec![Posting::new(1, vec![10, 30])]);
    }

    #[test]
    fn test_proximity_output_feeds_outer_operator() {
        let model = RetrievalModel::UnrankedBoolean;
        let mut inner = vec![iter_over(&[(1, vec![1, 6]), (2, vec![4])]), iter_over(&[(1, vec![2, 7]), (2, vec![9])])];
        let near = synthesize(&Near { distance: 1 }, &mut inner, "body", &model);
        assert_eq!(near.list().postings(), &[Posting::new(1, vec![2, 7])]);
        let outer = vec![near, iter_over(&[(1, vec![9])])];
        assert_eq!(run(&Window { distance: 3 }, outer), vec![Posting::new(1, vec![9])]);
    }
}
