pub mod invlist;
pub mod iterator;
pub mod iop;
pub mod proximity;
pub mod sop;
pub mod parser;

use std::fmt;
use crate::ircore::error::{EvalError, Result};
use crate::ircore::index::IndexReader;
use crate::ircore::model::RetrievalModel;
use crate::ircore::query::iop::IopIter;
use crate::ircore::query::proximity::{Near, Window};
use crate::ircore::query::sop::{AndOp, OrOp, ScoreOp, SopNode, SumOp, WAndOp, WSumOp};

pub use parser::QryParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Term,
    Syn,
    Near,
    Window,
    Score,
    And,
    Or,
    Sum,
    WAnd,
    WSum,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Term => "#TERM",
            Operator::Syn => "#SYN",
            Operator::Near => "#NEAR",
            Operator::Window => "#WINDOW",
            Operator::Score => "#SCORE",
            Operator::And => "#AND",
            Operator::Or => "#OR",
            Operator::Sum => "#SUM",
            Operator::WAnd => "#WAND",
            Operator::WSum => "#WSUM",
        }
    }

    // IOP operators produce an inverted list, SOP operators produce scores
    pub fn is_iop(&self) -> bool {
        matches!(self, Operator::Term | Operator::Syn | Operator::Near | Operator::Window)
    }
}

/// Shape of a parsed query. Immutable: evaluation state lives in the
/// `SopNode` tree built by `initialize`, so one `Qry` can be evaluated
/// any number of times.
#[derive(Debug, Clone, PartialEq)]
pub enum Qry {
    Term { term: String, field: String },
    Syn(Vec<Qry>),
    Near { distance: u32, args: Vec<Qry> },
    Window { distance: u32, args: Vec<Qry> },
    Score(Box<Qry>),
    And(Vec<Qry>),
    Or(Vec<Qry>),
    Sum(Vec<Qry>),
    WAnd(Vec<(f64, Qry)>),
    WSum(Vec<(f64, Qry)>),
}

impl Qry {
    pub fn term(term: &str, field: &str) -> Self {
        Qry::Term { term: term.to_string(), field: field.to_string() }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Qry::Term { .. } => Operator::Term,
            Qry::Syn(_) => Operator::Syn,
            Qry::Near { .. } => Operator::Near,
            Qry::Window { .. } => Operator::Window,
            Qry::Score(_) => Operator::Score,
            Qry::And(_) => Operator::And,
            Qry::Or(_) => Operator::Or,
            Qry::Sum(_) => Operator::Sum,
            Qry::WAnd(_) => Operator::WAnd,
            Qry::WSum(_) => Operator::WSum,
        }
    }

    pub fn is_iop(&self) -> bool {
        self.operator().is_iop()
    }

    /// Builds the runtime tree for one evaluation under `model`. IOP nodes
    /// materialize their inverted lists here; SOP nodes wrap IOP arguments
    /// in #SCORE, and so does the root when it is an IOP node.
    pub fn initialize<'a>(&self, model: &RetrievalModel, index: &'a dyn IndexReader) -> Result<SopNode<'a>> {
        model.check_supports(self.operator())?;
        match self {
            Qry::Term { .. } | Qry::Syn(_) | Qry::Near { .. } | Qry::Window { .. } => {
                model.check_supports(Operator::Score)?;
                Ok(SopNode::Score(ScoreOp::new(self.initialize_iop(model, index)?, index)?))
            },
            Qry::Score(arg) => {
                if !arg.is_iop() {
                    return Err(EvalError::malformed(format!("{} needs an inverted list argument, got {}", Operator::Score.name(), arg)));
                }
                Ok(SopNode::Score(ScoreOp::new(arg.initialize_iop(model, index)?, index)?))
            },
            Qry::And(args) => Ok(SopNode::And(AndOp::new(initialize_args(self.operator(), args, model, index)?))),
            Qry::Or(args) => Ok(SopNode::Or(OrOp::new(initialize_args(self.operator(), args, model, index)?))),
            Qry::Sum(args) => Ok(SopNode::Sum(SumOp::new(initialize_args(self.operator(), args, model, index)?))),
            Qry::WAnd(args) => Ok(SopNode::WAnd(WAndOp::new(initialize_weighted(self.operator(), args, model, index)?))),
            Qry::WSum(args) => Ok(SopNode::WSum(WSumOp::new(initialize_weighted(self.operator(), args, model, index)?))),
        }
    }

    fn initialize_iop(&self, model: &RetrievalModel, index: &dyn IndexReader) -> Result<IopIter> {
        model.check_supports(self.operator())?;
        match self {
            Qry::Term { term, field } => iop::term(index, term, field),
            Qry::Syn(args) => {
                let (field, mut iters) = initialize_iop_args(self.operator(), args, model, index)?;
                Ok(iop::syn(&mut iters, &field, model))
            },
            Qry::Near { distance, args } => {
                let (field, mut iters) = initialize_iop_args(self.operator(), args, model, index)?;
                Ok(proximity::synthesize(&Near { distance: *distance }, &mut iters, &field, model))
            },
            Qry::Window { distance, args } => {
                let (field, mut iters) = initialize_iop_args(self.operator(), args, model, index)?;
                Ok(proximity::synthesize(&Window { distance: *distance }, &mut iters, &field, model))
            },
            _ => Err(EvalError::malformed(format!("{} is not an inverted list operator", self.operator().name()))),
        }
    }
}

// arguments of an IOP operator: IOP nodes over one common field
fn initialize_iop_args(op: Operator, args: &[Qry], model: &RetrievalModel, index: &dyn IndexReader) -> Result<(String, Vec<IopIter>)> {
    if args.is_empty() {
        return Err(EvalError::malformed(format!("{} has no arguments", op.name())));
    }
    let mut iters = Vec::with_capacity(args.len());
    for arg in args {
        if !arg.is_iop() {
            return Err(EvalError::malformed(format!("{} needs inverted list arguments, got {}", op.name(), arg)));
        }
        iters.push(arg.initialize_iop(model, index)?);
    }
    let field = iters[0].field().to_string();
    if let Some(other) = iters.iter().find(|it| it.field() != field) {
        return Err(EvalError::malformed(format!("{} mixes fields {} and {}", op.name(), field, other.field())));
    }
    Ok((field, iters))
}

fn initialize_args<'a>(op: Operator, args: &[Qry], model: &RetrievalModel, index: &'a dyn IndexReader) -> Result<Vec<SopNode<'a>>> {
    if args.is_empty() {
        return Err(EvalError::malformed(format!("{} has no arguments", op.name())));
    }
    args.iter().map(|arg| arg.initialize(model, index)).collect()
}

fn initialize_weighted<'a>(op: Operator, args: &[(f64, Qry)], model: &RetrievalModel, index: &'a dyn IndexReader) -> Result<Vec<(f64, SopNode<'a>)>> {
    if args.is_empty() {
        return Err(EvalError::malformed(format!("{} has no arguments", op.name())));
    }
    if args.iter().any(|(w, _)| !w.is_finite() || *w < 0.0) {
        return Err(EvalError::malformed(format!("{} weights must be non-negative numbers", op.name())));
    }
    let mut nodes = Vec::with_capacity(args.len());
    for (weight, arg) in args {
        nodes.push((*weight, arg.initialize(model, index)?));
    }
    Ok(nodes)
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[Qry]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for arg in args {
        write!(f, " {}", arg)?;
    }
    write!(f, " )")
}

fn write_weighted(f: &mut fmt::Formatter<'_>, name: &str, args: &[(f64, Qry)]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (weight, arg) in args {
        write!(f, " {} {}", weight, arg)?;
    }
    write!(f, " )")
}

// Renders back to the query grammar, #SCORE stays implicit.
impl fmt::Display for Qry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qry::Term { term, field } => write!(f, "{}.{}", term, field),
            Qry::Syn(args) => write_args(f, "#syn", args),
            Qry::Near { distance, args } => write_args(f, &format!("#near/{}", distance), args),
            Qry::Window { distance, args } => write_args(f, &format!("#window/{}", distance), args),
            Qry::Score(arg) => write!(f, "{}", arg),
            Qry::And(args) => write_args(f, "#and", args),
            Qry::Or(args) => write_args(f, "#or", args),
            Qry::Sum(args) => write_args(f, "#sum", args),
            Qry::WAnd(args) => write_weighted(f, "#wand", args),
            Qry::WSum(args) => write_weighted(f, "#wsum", args),
        }
    }
}
