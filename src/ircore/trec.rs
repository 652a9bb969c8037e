use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use crate::ircore::error::{EvalError, Result};
use crate::ircore::index::IndexReader;
use crate::ircore::ranking::ScoreList;

/// Splits a query file line `qid:query` at the first ':'.
pub fn split_query_line(line: &str) -> Result<(&str, &str)> {
    line.split_once(':')
        .map(|(qid, query)| (qid.trim(), query.trim()))
        .ok_or_else(|| EvalError::malformed(format!("missing ':' in query line {}", line)))
}

/// Writes the run lines of one query: `qid Q0 docid rank score run_tag`
/// for at most `length` results, or a single dummy line when there are none.
pub fn write_run<W: Write>(out: &mut W, qid: &str, scores: &ScoreList, index: &dyn IndexReader,
                           length: usize, run_tag: &str) -> Result<()> {
    let top = scores.top(length);
    if top.is_empty() {
        writeln!(out, "{} Q0 dummy 1 0 {}", qid, run_tag)?;
        return Ok(());
    }
    for (rank, doc) in top.iter().enumerate() {
        let external_id = index.get_external_docid(doc.docid)?;
        writeln!(out, "{} Q0 {} {} {:.12} {}", qid, external_id, rank + 1, doc.score, run_tag)?;
    }
    Ok(())
}

/// Reads an initial ranking in run file format, grouped by query id.
/// Documents keep the order they appear in.
pub fn read_ranking<R: BufRead>(reader: R, index: &dyn IndexReader) -> Result<HashMap<String, ScoreList>> {
    let mut rankings: HashMap<String, ScoreList> = HashMap::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(EvalError::invalid("fb_initial_ranking_file",
                format!("line {} has {} fields", line_no + 1, fields.len())));
        }
        let score: f64 = fields[4].parse()
            .map_err(|_| EvalError::invalid("fb_initial_ranking_file",
                format!("line {}: bad score {}", line_no + 1, fields[4])))?;
        let docid = index.get_internal_docid(fields[2])?;
        rankings.entry(fields[0].to_string()).or_default().add(docid, score);
    }
    Ok(rankings)
}

pub fn load_ranking(path: &Path, index: &dyn IndexReader) -> Result<HashMap<String, ScoreList>> {
    let file = File::open(path)?;
    read_ranking(BufReader::new(file), index)
}
