use unicode_segmentation::UnicodeSegmentation;

// Query terms are matched against an index built from lower-cased words.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

pub fn parse_tokens(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}

// normalize + split one raw query term into index terms
pub fn analyze(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    parse_tokens(&normalized).into_iter().map(String::from).collect()
}

#[test]
fn test_parse_tokens() {
    let text = "Quarrel sir! no, sir!";
    let normalized = normalize(text);
    let tokens = parse_tokens(&normalized);
    assert_eq!(tokens, vec!["quarrel", "sir", "no", "sir"]);
}

#[test]
fn test_analyze() {
    assert_eq!(analyze("Apple"), vec!["apple"]);
    assert_eq!(analyze("e-mail"), vec!["e", "mail"]);
    assert!(analyze("--").is_empty());
}
