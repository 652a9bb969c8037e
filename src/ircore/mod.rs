pub mod error;
pub mod cfg;
pub mod model;
pub mod index;
pub mod tokenizer;
pub mod query;
pub mod ranking;
pub mod feedback;
pub mod trec;
pub mod engine;
pub mod utils;

pub type DocId = u32;
pub type TermOffset = u32;

// field used by bare query terms and by query expansion unless configured
pub const DEFAULT_FIELD: &str = "body";
