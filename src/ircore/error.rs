use std::io;
use thiserror::Error;

/// Everything that can abort query evaluation.
///
/// Configuration problems (`UnknownModel`, `MissingParameter`, `InvalidParameter`)
/// are raised before the first query runs. Query problems (`UnsupportedCombination`,
/// `MalformedQuery`) abort the run at the offending query. Index problems are
/// never masked.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unknown retrieval model: {0}")]
    UnknownModel(String),

    #[error("required parameter missing: {0}")]
    MissingParameter(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{model} doesn't support the {operator} operator")]
    UnsupportedCombination { model: String, operator: String },

    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("index access failure: {0}")]
    IndexAccess(String),

    #[error("parameter file error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("index file error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    pub fn unsupported(model: &str, operator: &str) -> Self {
        EvalError::UnsupportedCombination {
            model: model.to_string(),
            operator: operator.to_string(),
        }
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        EvalError::MalformedQuery(msg.into())
    }

    pub fn index<S: Into<String>>(msg: S) -> Self {
        EvalError::IndexAccess(msg.into())
    }

    pub fn missing<S: Into<String>>(name: S) -> Self {
        EvalError::MissingParameter(name.into())
    }

    pub fn invalid<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        EvalError::InvalidParameter { name: name.into(), reason: reason.into() }
    }
}
