use crate::ircore::DocId;
use crate::ircore::error::{EvalError, Result};
use crate::ircore::index::IndexReader;
use crate::ircore::model::RetrievalModel;
use crate::ircore::query::Operator;
use crate::ircore::query::iop::IopIter;
use crate::ircore::query::iterator::{DocIterator, match_all, match_first, match_min};
use crate::ircore::ranking::bm25::{self, Bm25TermStats};
use crate::ircore::ranking::lmd;

/// Scoring side of an SOP node.
pub trait Scorer: DocIterator {
    // score of the current match
    fn score(&mut self, model: &RetrievalModel) -> Result<f64>;
    // score for a document the node does not match, language models only
    fn default_score(&mut self, model: &RetrievalModel, docid: DocId) -> Result<f64>;
}

/// #SCORE: turns the inverted list of one IOP node into scores.
pub struct ScoreOp<'a> {
    arg: IopIter,
    index: &'a dyn IndexReader,
    // per-field statistics, fixed for the whole evaluation
    doc_count: f64,
    avg_doc_length: f64,
    p_mle: f64,
}

impl<'a> ScoreOp<'a> {
    pub fn new(arg: IopIter, index: &'a dyn IndexReader) -> Result<Self> {
        let field = arg.field().to_string();
        let total_length = index.get_sum_of_field_lengths(&field)? as f64;
        let field_docs = index.get_field_doc_count(&field)? as f64;
        let avg_doc_length = if field_docs > 0.0 { total_length / field_docs } else { 0.0 };
        let p_mle = lmd::p_mle(arg.ctf() as f64, total_length);
        Ok(ScoreOp {
            doc_count: index.get_document_count() as f64,
            avg_doc_length,
            p_mle,
            arg,
            index,
        })
    }

    fn doc_length(&self, docid: DocId) -> Result<f64> {
        Ok(self.index.get_field_length(self.arg.field(), docid)? as f64)
    }
}

impl<'a> DocIterator for ScoreOp<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        match_first(&mut self.arg, model).is_some()
    }

    fn current_match(&self) -> Option<DocId> {
        self.arg.current_match()
    }

    fn advance_past(&mut self, docid: DocId) {
        self.arg.advance_past(docid);
    }

    fn advance_to(&mut self, docid: DocId) {
        self.arg.advance_to(docid);
    }
}

impl<'a> Scorer for ScoreOp<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        let (docid, tf) = match (self.arg.current_match(), self.arg.current_tf()) {
            (Some(docid), Some(tf)) => (docid, tf as f64),
            _ => return Ok(0.0),
        };
        match model {
            RetrievalModel::UnrankedBoolean => Ok(1.0),
            RetrievalModel::RankedBoolean => Ok(tf),
            RetrievalModel::Bm25(params) => {
                let stats = Bm25TermStats {
                    doc_count: self.doc_count,
                    df: self.arg.df() as f64,
                    tf,
                    doc_length: self.doc_length(docid)?,
                    avg_doc_length: self.avg_doc_length,
                };
                Ok(bm25::term_score(params, &stats))
            },
            RetrievalModel::Indri(params) => {
                Ok(lmd::indri_score(params, tf, self.p_mle, self.doc_length(docid)?))
            },
        }
    }

    fn default_score(&mut self, model: &RetrievalModel, docid: DocId) -> Result<f64> {
        match model {
            RetrievalModel::Indri(params) => {
                Ok(lmd::indri_score(params, 0.0, self.p_mle, self.doc_length(docid)?))
            },
            _ => Err(EvalError::unsupported(model.name(), Operator::Score.name())),
        }
    }
}

/// Arguments of a combinator plus the document they currently agree on.
pub struct Args<'a> {
    nodes: Vec<SopNode<'a>>,
    matching: Option<DocId>,
}

impl<'a> Args<'a> {
    pub fn new(nodes: Vec<SopNode<'a>>) -> Self {
        Args { nodes, matching: None }
    }

    fn match_all(&mut self, model: &RetrievalModel) -> bool {
        self.matching = match_all(&mut self.nodes, model);
        self.matching.is_some()
    }

    fn match_min(&mut self, model: &RetrievalModel) -> bool {
        self.matching = match_min(&mut self.nodes, model);
        self.matching.is_some()
    }

    fn advance_past(&mut self, docid: DocId) {
        for node in self.nodes.iter_mut() {
            node.advance_past(docid);
        }
        self.matching = None;
    }

    fn advance_to(&mut self, docid: DocId) {
        for node in self.nodes.iter_mut() {
            node.advance_to(docid);
        }
        self.matching = None;
    }

    // score of every argument positioned at the current match, None for the others
    fn scores(&mut self, model: &RetrievalModel) -> Result<Vec<Option<f64>>> {
        let mut scores = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter_mut() {
            if self.matching.is_some() && node.has_match(model) && node.current_match() == self.matching {
                scores.push(Some(node.score(model)?));
            }else{
                scores.push(None);
            }
        }
        Ok(scores)
    }

    // arguments missing the current match fall back to their default score
    fn scores_or_default(&mut self, model: &RetrievalModel, docid: DocId) -> Result<Vec<f64>> {
        let scores = self.scores(model)?;
        let mut filled = Vec::with_capacity(scores.len());
        for (node, score) in self.nodes.iter_mut().zip(scores) {
            match score {
                Some(s) => filled.push(s),
                None => filled.push(node.default_score(model, docid)?),
            }
        }
        Ok(filled)
    }

    fn default_scores(&mut self, model: &RetrievalModel, docid: DocId) -> Result<Vec<f64>> {
        self.nodes.iter_mut()
            .map(|node| node.default_score(model, docid))
            .collect()
    }
}

fn geometric_mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let product: f64 = scores.iter().product();
    product.powf(1.0 / scores.len() as f64)
}

fn weighted_product(weights: &[f64], scores: &[f64]) -> f64 {
    weights.iter().zip(scores).map(|(w, s)| s.powf(*w)).product()
}

fn weighted_sum(weights: &[f64], scores: &[f64]) -> f64 {
    weights.iter().zip(scores).map(|(w, s)| w * s).sum()
}

// each weight over the total; all-zero weights count as equal weights
fn normalize(weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.into_iter().map(|w| w / total).collect()
    }else{
        let uniform = 1.0 / weights.len() as f64;
        weights.into_iter().map(|_| uniform).collect()
    }
}

/// #AND: match-all, except under Indri where missing arguments are scored
/// with their default score.
pub struct AndOp<'a> {
    args: Args<'a>,
}

impl<'a> AndOp<'a> {
    pub fn new(nodes: Vec<SopNode<'a>>) -> Self {
        AndOp { args: Args::new(nodes) }
    }
}

impl<'a> DocIterator for AndOp<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        if model.is_language_model() {
            self.args.match_min(model)
        }else{
            self.args.match_all(model)
        }
    }

    fn current_match(&self) -> Option<DocId> {
        self.args.matching
    }

    fn advance_past(&mut self, docid: DocId) {
        self.args.advance_past(docid);
    }

    fn advance_to(&mut self, docid: DocId) {
        self.args.advance_to(docid);
    }
}

impl<'a> Scorer for AndOp<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        let docid = match self.args.matching {
            Some(docid) => docid,
            None => return Ok(0.0),
        };
        match model {
            RetrievalModel::UnrankedBoolean => Ok(1.0),
            RetrievalModel::RankedBoolean => {
                let scores = self.args.scores(model)?;
                Ok(scores.into_iter().flatten().fold(f64::MAX, f64::min))
            },
            RetrievalModel::Indri(_) => {
                let scores = self.args.scores_or_default(model, docid)?;
                Ok(geometric_mean(&scores))
            },
            RetrievalModel::Bm25(_) => Err(EvalError::unsupported(model.name(), Operator::And.name())),
        }
    }

    fn default_score(&mut self, model: &RetrievalModel, docid: DocId) -> Result<f64> {
        if !model.is_language_model() {
            return Err(EvalError::unsupported(model.name(), Operator::And.name()));
        }
        let scores = self.args.default_scores(model, docid)?;
        Ok(geometric_mean(&scores))
    }
}

/// #OR: match-min boolean disjunction.
pub struct OrOp<'a> {
    args: Args<'a>,
}

impl<'a> OrOp<'a> {
    pub fn new(nodes: Vec<SopNode<'a>>) -> Self {
        OrOp { args: Args::new(nodes) }
    }
}

impl<'a> DocIterator for OrOp<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        self.args.match_min(model)
    }

    fn current_match(&self) -> Option<DocId> {
        self.args.matching
    }

    fn advance_past(&mut self, docid: DocId) {
        self.args.advance_past(docid);
    }

    fn advance_to(&mut self, docid: DocId) {
        self.args.advance_to(docid);
    }
}

impl<'a> Scorer for OrOp<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        if self.args.matching.is_none() {
            return Ok(0.0);
        }
        match model {
            RetrievalModel::UnrankedBoolean => Ok(1.0),
            RetrievalModel::RankedBoolean => {
                let scores = self.args.scores(model)?;
                Ok(scores.into_iter().flatten().fold(0.0, f64::max))
            },
            _ => Err(EvalError::unsupported(model.name(), Operator::Or.name())),
        }
    }

    fn default_score(&mut self, model: &RetrievalModel, _docid: DocId) -> Result<f64> {
        Err(EvalError::unsupported(model.name(), Operator::Or.name()))
    }
}

/// #SUM: BM25 sum over the arguments matching the current document.
pub struct SumOp<'a> {
    args: Args<'a>,
}

impl<'a> SumOp<'a> {
    pub fn new(nodes: Vec<SopNode<'a>>) -> Self {
        SumOp { args: Args::new(nodes) }
    }
}

impl<'a> DocIterator for SumOp<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        self.args.match_min(model)
    }

    fn current_match(&self) -> Option<DocId> {
        self.args.matching
    }

    fn advance_past(&mut self, docid: DocId) {
        self.args.advance_past(docid);
    }

    fn advance_to(&mut self, docid: DocId) {
        self.args.advance_to(docid);
    }
}

impl<'a> Scorer for SumOp<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        match model {
            RetrievalModel::Bm25(_) => {
                let scores = self.args.scores(model)?;
                Ok(scores.into_iter().flatten().sum())
            },
            _ => Err(EvalError::unsupported(model.name(), Operator::Sum.name())),
        }
    }

    fn default_score(&mut self, model: &RetrievalModel, _docid: DocId) -> Result<f64> {
        Err(EvalError::unsupported(model.name(), Operator::Sum.name()))
    }
}

/// #WAND: weighted geometric mean under Indri.
pub struct WAndOp<'a> {
    args: Args<'a>,
    // normalized, one per argument
    weights: Vec<f64>,
}

impl<'a> WAndOp<'a> {
    pub fn new(weighted: Vec<(f64, SopNode<'a>)>) -> Self {
        let (weights, nodes): (Vec<f64>, Vec<SopNode<'a>>) = weighted.into_iter().unzip();
        WAndOp { args: Args::new(nodes), weights: normalize(weights) }
    }
}

impl<'a> DocIterator for WAndOp<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        if model.is_language_model() {
            self.args.match_min(model)
        }else{
            self.args.match_all(model)
        }
    }

    fn current_match(&self) -> Option<DocId> {
        self.args.matching
    }

    fn advance_past(&mut self, docid: DocId) {
        self.args.advance_past(docid);
    }

    fn advance_to(&mut self, docid: DocId) {
        self.args.advance_to(docid);
    }
}

impl<'a> Scorer for WAndOp<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        if !model.is_language_model() {
            return Err(EvalError::unsupported(model.name(), Operator::WAnd.name()));
        }
        match self.args.matching {
            Some(docid) => {
                let scores = self.args.scores_or_default(model, docid)?;
                Ok(weighted_product(&self.weights, &scores))
            },
            None => Ok(0.0),
        }
    }

    fn default_score(&mut self, model: &RetrievalModel, docid: DocId) -> Result<f64> {
        if !model.is_language_model() {
            return Err(EvalError::unsupported(model.name(), Operator::WAnd.name()));
        }
        let scores = self.args.default_scores(model, docid)?;
        Ok(weighted_product(&self.weights, &scores))
    }
}

/// #WSUM: weighted arithmetic mean under Indri.
pub struct WSumOp<'a> {
    args: Args<'a>,
    weights: Vec<f64>,
}

impl<'a> WSumOp<'a> {
    pub fn new(weighted: Vec<(f64, SopNode<'a>)>) -> Self {
        let (weights, nodes): (Vec<f64>, Vec<SopNode<'a>>) = weighted.into_iter().unzip();
        WSumOp { args: Args::new(nodes), weights: normalize(weights) }
    }
}

impl<'a> DocIterator for WSumOp<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        self.args.match_min(model)
    }

    fn current_match(&self) -> Option<DocId> {
        self.args.matching
    }

    fn advance_past(&mut self, docid: DocId) {
        self.args.advance_past(docid);
    }

    fn advance_to(&mut self, docid: DocId) {
        self.args.advance_to(docid);
    }
}

impl<'a> Scorer for WSumOp<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        if !model.is_language_model() {
            return Err(EvalError::unsupported(model.name(), Operator::WSum.name()));
        }
        match self.args.matching {
            Some(docid) => {
                let scores = self.args.scores_or_default(model, docid)?;
                Ok(weighted_sum(&self.weights, &scores))
            },
            None => Ok(0.0),
        }
    }

    fn default_score(&mut self, model: &RetrievalModel, docid: DocId) -> Result<f64> {
        if !model.is_language_model() {
            return Err(EvalError::unsupported(model.name(), Operator::WSum.name()));
        }
        let scores = self.args.default_scores(model, docid)?;
        Ok(weighted_sum(&self.weights, &scores))
    }
}

/// Initialized SOP node, the runtime counterpart of a scoring query node.
pub enum SopNode<'a> {
    Score(ScoreOp<'a>),
    And(AndOp<'a>),
    Or(OrOp<'a>),
    Sum(SumOp<'a>),
    WAnd(WAndOp<'a>),
    WSum(WSumOp<'a>),
}

macro_rules! dispatch {
    ($node:expr, $op:ident => $call:expr) => {
        match $node {
            SopNode::Score($op) => $call,
            SopNode::And($op) => $call,
            SopNode::Or($op) => $call,
            SopNode::Sum($op) => $call,
            SopNode::WAnd($op) => $call,
            SopNode::WSum($op) => $call,
        }
    };
}

impl<'a> DocIterator for SopNode<'a> {
    fn has_match(&mut self, model: &RetrievalModel) -> bool {
        dispatch!(self, op => op.has_match(model))
    }

    fn current_match(&self) -> Option<DocId> {
        dispatch!(self, op => op.current_match())
    }

    fn advance_past(&mut self, docid: DocId) {
        dispatch!(self, op => op.advance_past(docid))
    }

    fn advance_to(&mut self, docid: DocId) {
        dispatch!(self, op => op.advance_to(docid))
    }
}

impl<'a> Scorer for SopNode<'a> {
    fn score(&mut self, model: &RetrievalModel) -> Result<f64> {
        dispatch!(self, op => op.score(model))
    }

    fn default_score(&mut self, model: &RetrievalModel, docid: DocId) -> Result<f64> {
        dispatch!(self, op => op.default_score(model, docid))
    }
}
