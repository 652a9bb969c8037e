use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use crate::ircore::DocId;
use crate::ircore::cfg::{FeedbackParams, Params};
use crate::ircore::error::{EvalError, Result};
use crate::ircore::feedback;
use crate::ircore::index::IndexReader;
use crate::ircore::model::RetrievalModel;
use crate::ircore::query::{Qry, QryParser};
use crate::ircore::query::iterator::DocIterator;
use crate::ircore::query::sop::Scorer;
use crate::ircore::ranking::ScoreList;
use crate::ircore::trec;

/// Evaluates queries against one index under one retrieval model.
pub struct Engine<'a> {
    index: &'a dyn IndexReader,
    model: RetrievalModel,
    parser: QryParser,
}

impl<'a> Engine<'a> {
    pub fn new(index: &'a dyn IndexReader, model: RetrievalModel, default_field: &str) -> Self {
        Engine {
            index,
            model,
            parser: QryParser::new(default_field),
        }
    }

    pub fn model(&self) -> &RetrievalModel {
        &self.model
    }

    pub fn doc_count(&self) -> usize {
        self.index.get_document_count()
    }

    pub fn external_id(&self, docid: DocId) -> Result<String> {
        self.index.get_external_docid(docid)
    }

    /// Wraps the query in the model's default operator, parses and evaluates it.
    /// A query left without terms gives an empty result.
    pub fn process_query(&self, query: &str) -> Result<ScoreList> {
        let wrapped = format!("{}({})", self.model.default_operator(), query);
        match self.parser.parse(&wrapped)? {
            Some(qry) => {
                log::info!("    --> {}", qry);
                self.evaluate(&qry)
            },
            None => {
                log::warn!("no query terms left in {}", query);
                Ok(ScoreList::new())
            },
        }
    }

    // document-at-a-time scan of the whole tree
    pub fn evaluate(&self, qry: &Qry) -> Result<ScoreList> {
        let mut root = qry.initialize(&self.model, self.index)?;
        let mut scores = ScoreList::new();
        while root.has_match(&self.model) {
            let docid = match root.current_match() {
                Some(docid) => docid,
                None => break,
            };
            let score = root.score(&self.model)?;
            scores.add(docid, score);
            root.advance_past(docid);
        }
        scores.sort();
        Ok(scores)
    }

    pub fn expand_query(&self, initial: &ScoreList, fb: &FeedbackParams) -> Result<String> {
        feedback::expand_query(self.index, initial, fb, self.parser.default_field())
    }

    /// Runs one query with pseudo-relevance feedback. The feedback documents
    /// come from `initial` when given, otherwise from running the query.
    /// Returns the final ranking and the expansion query.
    pub fn process_query_with_feedback(&self, query: &str, fb: &FeedbackParams,
                                       initial: Option<&ScoreList>) -> Result<(ScoreList, String)> {
        let expansion = match initial {
            Some(ranking) => self.expand_query(ranking, fb)?,
            None => self.expand_query(&self.process_query(query)?, fb)?,
        };
        log::debug!("expansion: {}", expansion);
        let combined = feedback::combine(query, self.model.default_operator(), &expansion, fb.orig_weight);
        Ok((self.process_query(&combined)?, expansion))
    }

    /// Batch run over the query file named in `params`: writes the run file
    /// and, with feedback on, the expansion query file.
    pub fn process_query_file(&self, params: &Params) -> Result<()> {
        let fb = params.feedback()?;
        let rankings: HashMap<String, ScoreList> = match fb.as_ref().and_then(|f| f.initial_ranking_file.as_ref()) {
            Some(path) => trec::load_ranking(Path::new(path), self.index)?,
            None => HashMap::new(),
        };
        let mut expansion_writer = match fb.as_ref().and_then(|f| f.expansion_query_file.as_ref()) {
            Some(path) => Some(BufWriter::new(create_file(Path::new(path))?)),
            None => None,
        };

        let input = BufReader::new(File::open(params.query_file_path()?)?);
        let mut output = BufWriter::new(create_file(Path::new(params.trec_eval_output_path()?))?);
        let mut query_count = 0;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                log::warn!("blank line in query file skipped");
                continue;
            }
            let (qid, query) = trec::split_query_line(&line)?;
            log::info!("Query {}", line);

            let scores = match &fb {
                Some(fb) => {
                    let initial = if fb.initial_ranking_file.is_some() {
                        let ranking = rankings.get(qid).ok_or_else(|| EvalError::invalid(
                            "fb_initial_ranking_file", format!("no ranking for query {}", qid)))?;
                        Some(ranking)
                    }else{
                        None
                    };
                    let (scores, expansion) = self.process_query_with_feedback(query, fb, initial)?;
                    if let Some(writer) = expansion_writer.as_mut() {
                        writeln!(writer, "{}: {}", qid, expansion)?;
                    }
                    scores
                },
                None => self.process_query(query)?,
            };
            trec::write_run(&mut output, qid, &scores, self.index, params.output_length(), params.run_tag())?;
            query_count += 1;
        }
        output.flush()?;
        if let Some(writer) = expansion_writer.as_mut() {
            writer.flush()?;
        }
        log::info!("{} queries processed", query_count);
        Ok(())
    }
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ircore::index::MemoryIndex;
    use crate::ircore::model::{Bm25Params, IndriParams};

    // 3 documents, 21 body tokens
    fn toy_index() -> MemoryIndex {
        let mut idx = MemoryIndex::new();
        idx.add_document("d1", &[("body", "the cat sat on the mat")]).unwrap();
        idx.add_document("d2", &[("body", "the dog chased the cat dog")]).unwrap();
        idx.add_document("d3", &[("body", "a bird sat on a wire near the fence")]).unwrap();
        idx
    }

    fn assert_ranking(scores: &ScoreList, expected: &[(DocId, f64)]) {
        assert_eq!(scores.len(), expected.len());
        for (actual, (docid, score)) in scores.iter().zip(expected) {
            assert_eq!(actual.docid, *docid);
            assert!((actual.score - score).abs() < 1e-6, "doc {}: {} vs {}", docid, actual.score, score);
        }
    }

    #[test]
    fn test_bm25_ranking() {
        let idx = toy_index();
        let model = RetrievalModel::Bm25(Bm25Params { k_1: 1.2, k_3: 0.0, b: 0.75 });
        let engine = Engine::new(&idx, model, "body");
        let scores = engine.process_query("mat dog wire").unwrap();
        assert_ranking(&scores, &[(2, 0.332631), (1, 0.246605), (3, 0.207894)]);
        // df above N/2, idf clamped to 0
        let scores = engine.process_query("cat").unwrap();
        assert_ranking(&scores, &[(1, 0.0), (2, 0.0)]);
    }

    #[test]
    fn test_indri_ranking() {
        let idx = toy_index();
        let model = RetrievalModel::Indri(IndriParams { lambda: 0.4, mu: 10.0 });
        let engine = Engine::new(&idx, model, "body");
        let scores = engine.process_query("cat sat").unwrap();
        assert_ranking(&scores, &[(1, 0.111310), (2, 0.090641), (3, 0.082462)]);
    }

    #[test]
    fn test_boolean_rankings() {
        let idx = toy_index();
        let engine = Engine::new(&idx, RetrievalModel::UnrankedBoolean, "body");
        assert_ranking(&engine.process_query("#and(cat sat)").unwrap(), &[(1, 1.0)]);
        assert_ranking(&engine.process_query("#near/1(the cat)").unwrap(), &[(1, 1.0), (2, 1.0)]);
        let engine = Engine::new(&idx, RetrievalModel::RankedBoolean, "body");
        // #or(the cat): max of tf
        assert_ranking(&engine.process_query("the cat").unwrap(), &[(1, 2.0), (2, 2.0), (3, 1.0)]);
        assert!(engine.process_query("-- !!").unwrap().is_empty());
        assert!(matches!(engine.process_query("#sum(cat)"), Err(EvalError::UnsupportedCombination { .. })));
    }

    #[test]
    fn test_feedback_with_initial_ranking() {
        let idx = toy_index();
        let model = RetrievalModel::Indri(IndriParams { lambda: 0.4, mu: 10.0 });
        let engine = Engine::new(&idx, model, "body");
        let fb = FeedbackParams {
            docs: 1,
            terms: 3,
            mu: 0.0,
            orig_weight: 0.5,
            field: "body".to_string(),
            initial_ranking_file: None,
            expansion_query_file: None,
        };
        let mut initial = ScoreList::new();
        initial.add(2, 1.0);
        let (scores, expansion) = engine.process_query_with_feedback("cat", &fb, Some(&initial)).unwrap();
        // with mu 0, p(t|d) = tf / doclen
        let weight = |tf: f64, ctf: f64| tf / 6.0 * (21.0 / ctf).ln();
        assert_eq!(expansion, format!("#wand ( {:.4} dog {:.4} chased {:.4} the )",
            weight(2.0, 2.0), weight(1.0, 1.0), weight(2.0, 5.0)));
        assert_eq!(scores.len(), 3);
        assert_eq!(scores.get(0).map(|s| s.docid), Some(2));
    }

    #[test]
    fn test_feedback_with_zero_weight_expansion() {
        let mut idx = MemoryIndex::new();
        idx.add_document("d1", &[("body", "apple pie"), ("title", "pie")]).unwrap();
        idx.add_document("d2", &[("body", "apple tart")]).unwrap();
        let model = RetrievalModel::Indri(IndriParams { lambda: 0.4, mu: 10.0 });
        let engine = Engine::new(&idx, model, "body");
        let fb = FeedbackParams {
            docs: 2,
            terms: 5,
            mu: 10.0,
            orig_weight: 0.5,
            field: "title".to_string(),
            initial_ranking_file: None,
            expansion_query_file: None,
        };
        // pie is the whole title field: p(pie|C) = 1 weighs it 0
        let (scores, expansion) = engine.process_query_with_feedback("apple", &fb, None).unwrap();
        assert_eq!(expansion, "#wand ( 0.0000 pie.title )");
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| s.score.is_finite() && s.score > 0.0));
        assert_eq!(engine.process_query(&expansion).unwrap().len(), 1);
    }

    #[test]
    fn test_process_query_file() {
        let idx = toy_index();
        let dir = tempfile::tempdir().unwrap();
        let query_path = dir.path().join("queries.txt");
        std::fs::write(&query_path, "1:mat dog wire\n\n2:zebra\n").unwrap();
        let run_path = dir.path().join("out/run.teIn");
        let params = Params::from_str(&format!(
"index_path: unused
query_file_path: {}
trec_eval_output_path: {}
retrieval_algorithm: bm25
bm25:
  k_1: 1.2
  k_3: 0
  b: 0.75
trec_eval_output_length: 2
run_tag: toy
", query_path.display(), run_path.display())).unwrap();
        let engine = Engine::new(&idx, RetrievalModel::from_params(&params).unwrap(), params.default_field());
        engine.process_query_file(&params).unwrap();
        let run = std::fs::read_to_string(&run_path).unwrap();
        let lines: Vec<&str> = run.lines().collect();
        assert_eq!(lines, vec![
            "1 Q0 d2 1 0.332630638731 toy",
            "1 Q0 d1 2 0.246605473542 toy",
            "2 Q0 dummy 1 0 toy",
        ]);

        std::fs::write(&query_path, "mat dog wire\n").unwrap();
        assert!(matches!(engine.process_query_file(&params), Err(EvalError::MalformedQuery(_))));
    }

    #[test]
    fn test_process_query_file_with_feedback() {
        let idx = toy_index();
        let dir = tempfile::tempdir().unwrap();
        let query_path = dir.path().join("queries.txt");
        std::fs::write(&query_path, "7:cat\n").unwrap();
        let ranking_path = dir.path().join("initial.teIn");
        std::fs::write(&ranking_path, "7 Q0 d2 1 1.0 run-1\n").unwrap();
        let expansion_path = dir.path().join("expansion.qry");
        let run_path = dir.path().join("run.teIn");
        let params = Params::from_str(&format!(
"index_path: unused
query_file_path: {}
trec_eval_output_path: {}
retrieval_algorithm: Indri
indri:
  lambda: 0.4
  mu: 10
fb: true
fb_docs: 1
fb_terms: 2
fb_mu: 0
fb_orig_weight: 0.5
fb_initial_ranking_file: {}
fb_expansion_query_file: {}
", query_path.display(), run_path.display(), ranking_path.display(), expansion_path.display())).unwrap();
        let engine = Engine::new(&idx, RetrievalModel::from_params(&params).unwrap(), params.default_field());
        engine.process_query_file(&params).unwrap();
        let expansion = std::fs::read_to_string(&expansion_path).unwrap();
        assert!(expansion.starts_with("7: #wand ( "));
        assert!(expansion.contains(" dog ") && expansion.contains(" chased "));
        let run = std::fs::read_to_string(&run_path).unwrap();
        // cat, dog and chased only occur in d1 and d2
        assert_eq!(run.lines().count(), 2);
        assert!(run.starts_with("7 Q0 d2 1 "));

        // a query missing from the initial ranking aborts the run
        std::fs::write(&query_path, "8:cat\n").unwrap();
        assert!(matches!(engine.process_query_file(&params), Err(EvalError::InvalidParameter { .. })));
    }
}
