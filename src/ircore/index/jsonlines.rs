use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde_json::Value;
use crate::ircore::error::Result;
use crate::ircore::index::MemoryIndex;
use crate::ircore::tokenizer;

/// Key holding the external document id, every other string value is a field.
pub const ID_KEY: &str = "id";

/// Adds one document per line of `{"id": "...", "<field>": "<text>", ...}`.
/// Field text goes through the same normalization as query terms. Lines that
/// are not JSON objects with a string id are skipped with a warning.
pub fn read_documents<R: BufRead>(reader: R, index: &mut MemoryIndex) -> Result<usize> {
    let mut count = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = match serde_json::from_str::<Value>(&line) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("line {}: {}", n + 1, e);
                continue;
            },
        };
        let (external_id, object) = match (&value[ID_KEY], value.as_object()) {
            (Value::String(id), Some(object)) => (id, object),
            _ => {
                log::warn!("line {}: no string \"{}\"", n + 1, ID_KEY);
                continue;
            },
        };
        let fields: Vec<(String, String)> = object.iter()
            .filter(|(key, _)| key.as_str() != ID_KEY)
            .filter_map(|(key, v)| v.as_str().map(|text| (key.to_lowercase(), tokenizer::analyze(text).join(" "))))
            .collect();
        let field_refs: Vec<(&str, &str)> = fields.iter().map(|(f, t)| (f.as_str(), t.as_str())).collect();
        index.add_document(external_id, &field_refs)?;
        count += 1;
    }
    Ok(count)
}

pub fn build_index(corpus: &Path) -> Result<MemoryIndex> {
    let mut index = MemoryIndex::new();
    let count = read_documents(BufReader::new(File::open(corpus)?), &mut index)?;
    log::info!("{} documents indexed from {}", count, corpus.display());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ircore::index::IndexReader;

    #[test]
    fn test_read_documents() {
        let text = r#"
{"id": "GX01", "body": "The Cat sat, on the mat.", "title": "Cats", "rank": 3}
not json
{"body": "no id here"}
{"id": "GX02", "body": "a dog"}
"#;
        let mut idx = MemoryIndex::new();
        assert_eq!(read_documents(text.as_bytes(), &mut idx).unwrap(), 2);
        assert_eq!(idx.get_document_count(), 2);
        assert_eq!(idx.get_external_docid(2).unwrap(), "GX02");
        assert_eq!(idx.get_field_length("body", 1).unwrap(), 6);
        assert_eq!(idx.get_total_term_freq("the", "body").unwrap(), 2);
        assert_eq!(idx.get_document_frequency("cats", "title").unwrap(), 1);
        // non-string values are not fields
        assert_eq!(idx.get_field_doc_count("rank").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_id_fails() {
        let text = "{\"id\": \"a\", \"body\": \"x\"}\n{\"id\": \"a\", \"body\": \"y\"}\n";
        let mut idx = MemoryIndex::new();
        assert!(read_documents(text.as_bytes(), &mut idx).is_err());
    }

    #[test]
    fn test_build_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.jsonl");
        std::fs::write(&corpus, "{\"id\": \"d1\", \"body\": \"apple pie\"}\n").unwrap();
        let index = build_index(&corpus).unwrap();
        let path = dir.path().join("toy.idx");
        index.save_to(&path).unwrap();
        let loaded = MemoryIndex::load_from(&path).unwrap();
        assert_eq!(loaded.get_postings("pie", "body").unwrap().len(), 1);
        assert!(build_index(&dir.path().join("missing.jsonl")).is_err());
    }
}
