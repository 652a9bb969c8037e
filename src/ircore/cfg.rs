use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use crate::ircore::error::{EvalError, Result};
use crate::ircore::DEFAULT_FIELD;
use crate::ircore::query::parser::is_text_field;

#[derive(Serialize, Deserialize, PartialEq, Debug, Default, Clone)]
pub struct Bm25Cfg {
    pub k_1: Option<f64>,
    pub k_3: Option<f64>,
    pub b: Option<f64>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Default, Clone)]
pub struct IndriCfg {
    pub lambda: Option<f64>,
    pub mu: Option<f64>,
}

/// Parameter file of one batch run.
///
/// Every key is optional at the serde level so that a missing key is
/// reported by name rather than as a YAML decoding failure.
#[derive(Serialize, Deserialize, PartialEq, Debug, Default, Clone)]
pub struct Params {
    pub index_path: Option<String>,
    pub query_file_path: Option<String>,
    pub trec_eval_output_path: Option<String>,
    pub retrieval_algorithm: Option<String>,
    #[serde(default)]
    pub bm25: Bm25Cfg,
    #[serde(default)]
    pub indri: IndriCfg,
    #[serde(default)]
    pub fb: bool,
    pub fb_docs: Option<usize>,
    pub fb_terms: Option<usize>,
    pub fb_mu: Option<f64>,
    pub fb_orig_weight: Option<f64>,
    pub fb_initial_ranking_file: Option<String>,
    pub fb_expansion_query_file: Option<String>,
    pub fb_field: Option<String>,
    pub default_field: Option<String>,
    pub run_tag: Option<String>,
    pub trec_eval_output_length: Option<usize>,
}

/// Settings of pseudo-relevance feedback, present only when `fb` is on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackParams {
    pub docs: usize,
    pub terms: usize,
    pub mu: f64,
    pub orig_weight: f64,
    pub field: String,
    pub initial_ranking_file: Option<String>,
    pub expansion_query_file: Option<String>,
}

impl Params {
    pub fn from_str(params_str: &str) -> Result<Self> {
        let mut params: Params = serde_yaml::from_str(params_str)?;
        // field names are matched lower-cased, like `.field` suffixes in queries
        params.default_field = params.default_field.map(|f| f.to_lowercase());
        params.fb_field = params.fb_field.map(|f| f.to_lowercase());
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let params_str = fs::read_to_string(path)?;
        Self::from_str(&params_str)
    }

    // the four keys without which no run can start
    fn validate(&self) -> Result<()> {
        require(&self.index_path, "index_path")?;
        require(&self.query_file_path, "query_file_path")?;
        require(&self.trec_eval_output_path, "trec_eval_output_path")?;
        require(&self.retrieval_algorithm, "retrieval_algorithm")?;
        check_field(self.default_field(), "default_field")?;
        Ok(())
    }

    pub fn index_path(&self) -> Result<&str> {
        require(&self.index_path, "index_path").map(|s| s.as_str())
    }

    pub fn query_file_path(&self) -> Result<&str> {
        require(&self.query_file_path, "query_file_path").map(|s| s.as_str())
    }

    pub fn trec_eval_output_path(&self) -> Result<&str> {
        require(&self.trec_eval_output_path, "trec_eval_output_path").map(|s| s.as_str())
    }

    pub fn retrieval_algorithm(&self) -> Result<&str> {
        require(&self.retrieval_algorithm, "retrieval_algorithm").map(|s| s.as_str())
    }

    pub fn default_field(&self) -> &str {
        self.default_field.as_deref().unwrap_or(DEFAULT_FIELD)
    }

    pub fn run_tag(&self) -> &str {
        self.run_tag.as_deref().unwrap_or("run-1")
    }

    pub fn output_length(&self) -> usize {
        self.trec_eval_output_length.unwrap_or(100)
    }

    pub fn feedback(&self) -> Result<Option<FeedbackParams>> {
        if !self.fb {
            return Ok(None);
        }
        let orig_weight = *require(&self.fb_orig_weight, "fb_orig_weight")?;
        if !(0.0..=1.0).contains(&orig_weight) {
            return Err(EvalError::invalid("fb_orig_weight", "must be within [0, 1]"));
        }
        let field = self.fb_field.clone().unwrap_or_else(|| DEFAULT_FIELD.to_string());
        check_field(&field, "fb_field")?;
        Ok(Some(FeedbackParams {
            docs: *require(&self.fb_docs, "fb_docs")?,
            terms: *require(&self.fb_terms, "fb_terms")?,
            mu: *require(&self.fb_mu, "fb_mu")?,
            orig_weight,
            field,
            initial_ranking_file: self.fb_initial_ranking_file.clone(),
            expansion_query_file: self.fb_expansion_query_file.clone(),
        }))
    }
}

fn check_field(field: &str, name: &str) -> Result<()> {
    if is_text_field(field) {
        Ok(())
    }else{
        Err(EvalError::invalid(name, format!("unknown field {}", field)))
    }
}

pub fn require<'a, T>(value: &'a Option<T>, name: &str) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EvalError::missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_syntax() {
        let params_str =
"index_path: idx/toy.idx
query_file_path: queries.txt
trec_eval_output_path: out/run.teIn
retrieval_algorithm: BM25
bm25:
  k_1: 1.2
  k_3: 0
  b: 0.75
";
        let params = Params::from_str(params_str).unwrap();
        assert_eq!(params.retrieval_algorithm().unwrap(), "BM25");
        assert_eq!(params.bm25, Bm25Cfg { k_1: Some(1.2), k_3: Some(0.0), b: Some(0.75) });
        assert_eq!(params.default_field(), "body");
        assert_eq!(params.run_tag(), "run-1");
        assert_eq!(params.output_length(), 100);
        assert_eq!(params.feedback().unwrap(), None);
    }

    #[test]
    fn test_missing_required_key() {
        let params_str =
"index_path: idx/toy.idx
query_file_path: queries.txt
retrieval_algorithm: indri
";
        match Params::from_str(params_str) {
            Err(EvalError::MissingParameter(name)) => assert_eq!(name, "trec_eval_output_path"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_feedback_params() {
        let params_str =
"index_path: idx/toy.idx
query_file_path: queries.txt
trec_eval_output_path: run.teIn
retrieval_algorithm: indri
fb: true
fb_docs: 10
fb_terms: 5
fb_mu: 0
fb_orig_weight: 0.5
";
        let params = Params::from_str(params_str).unwrap();
        let fb = params.feedback().unwrap().unwrap();
        assert_eq!(fb.docs, 10);
        assert_eq!(fb.terms, 5);
        assert_eq!(fb.field, "body");
        assert_eq!(fb.initial_ranking_file, None);

        let mut incomplete = params.clone();
        incomplete.fb_terms = None;
        assert!(matches!(incomplete.feedback(), Err(EvalError::MissingParameter(_))));

        let mut title = params.clone();
        title.fb_field = Some("title".to_string());
        assert_eq!(title.feedback().unwrap().unwrap().field, "title");

        let mut unknown_field = params.clone();
        unknown_field.fb_field = Some("abstract".to_string());
        match unknown_field.feedback() {
            Err(EvalError::InvalidParameter { name, .. }) => assert_eq!(name, "fb_field"),
            other => panic!("unexpected {:?}", other),
        }

        let mut out_of_range = params;
        out_of_range.fb_orig_weight = Some(1.5);
        assert!(matches!(out_of_range.feedback(), Err(EvalError::InvalidParameter { .. })));
    }

    #[test]
    fn test_unknown_default_field() {
        let params_str =
"index_path: idx/toy.idx
query_file_path: queries.txt
trec_eval_output_path: run.teIn
retrieval_algorithm: indri
default_field: abstract
";
        match Params::from_str(params_str) {
            Err(EvalError::InvalidParameter { name, .. }) => assert_eq!(name, "default_field"),
            other => panic!("unexpected {:?}", other),
        }
        let params = Params::from_str(&params_str.replace("abstract", "Title")).unwrap();
        assert_eq!(params.default_field(), "title");
    }
}
