use crate::ircore::cfg::{Params, require};
use crate::ircore::error::{EvalError, Result};
use crate::ircore::query::Operator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k_1: f64,
    pub k_3: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndriParams {
    pub lambda: f64,
    pub mu: f64,
}

/// Selects the match predicate and scoring formula of every operator.
/// Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrievalModel {
    UnrankedBoolean,
    RankedBoolean,
    Bm25(Bm25Params),
    Indri(IndriParams),
}

impl RetrievalModel {
    pub fn from_params(params: &Params) -> Result<Self> {
        let name = params.retrieval_algorithm()?;
        match name.to_lowercase().as_str() {
            "unrankedboolean" => Ok(RetrievalModel::UnrankedBoolean),
            "rankedboolean" => Ok(RetrievalModel::RankedBoolean),
            "bm25" => Ok(RetrievalModel::Bm25(Bm25Params {
                k_1: *require(&params.bm25.k_1, "bm25.k_1")?,
                k_3: *require(&params.bm25.k_3, "bm25.k_3")?,
                b: *require(&params.bm25.b, "bm25.b")?,
            })),
            "indri" => {
                let lambda = *require(&params.indri.lambda, "indri.lambda")?;
                if !(0.0..=1.0).contains(&lambda) {
                    return Err(EvalError::invalid("indri.lambda", "must be within [0, 1]"));
                }
                Ok(RetrievalModel::Indri(IndriParams {
                    lambda,
                    mu: *require(&params.indri.mu, "indri.mu")?,
                }))
            },
            _ => Err(EvalError::UnknownModel(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean => "UnrankedBoolean",
            RetrievalModel::RankedBoolean => "RankedBoolean",
            RetrievalModel::Bm25(_) => "BM25",
            RetrievalModel::Indri(_) => "Indri",
        }
    }

    // operator every top-level query is wrapped in
    pub fn default_operator(&self) -> &'static str {
        match self {
            RetrievalModel::UnrankedBoolean | RetrievalModel::RankedBoolean => "#or",
            RetrievalModel::Bm25(_) => "#sum",
            RetrievalModel::Indri(_) => "#and",
        }
    }

    pub fn is_language_model(&self) -> bool {
        matches!(self, RetrievalModel::Indri(_))
    }

    /// Operator x model dispatch table. Proximity and union operators only
    /// build inverted lists and work under every model.
    pub fn supports(&self, op: Operator) -> bool {
        use RetrievalModel::*;
        match op {
            Operator::Term | Operator::Syn | Operator::Near | Operator::Window => true,
            Operator::Score => true,
            Operator::And => matches!(self, UnrankedBoolean | RankedBoolean | Indri(_)),
            Operator::Or => matches!(self, UnrankedBoolean | RankedBoolean),
            Operator::Sum => matches!(self, Bm25(_)),
            Operator::WAnd | Operator::WSum => matches!(self, Indri(_)),
        }
    }

    pub fn check_supports(&self, op: Operator) -> Result<()> {
        if self.supports(op) {
            Ok(())
        }else{
            Err(EvalError::unsupported(self.name(), op.name()))
        }
    }
}
