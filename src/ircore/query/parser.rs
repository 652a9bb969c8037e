use std::collections::HashSet;
use once_cell::sync::Lazy;
use crate::ircore::DEFAULT_FIELD;
use crate::ircore::error::{EvalError, Result};
use crate::ircore::query::Qry;
use crate::ircore::tokenizer;

// fields a term may name with a `.field` suffix
static TEXT_FIELDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["body", "title", "url", "inlink", "keywords"].into_iter().collect()
});

/// Whether `field` may be searched, either as the default field or as a `.field` suffix.
pub fn is_text_field(field: &str) -> bool {
    TEXT_FIELDS.contains(field.to_lowercase().as_str())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = vec![];
    let mut word = String::new();
    for c in text.chars() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if !word.is_empty() {
                tokens.push(Token::Word(std::mem::take(&mut word)));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {},
            }
        }else{
            word.push(c);
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum OpKind {
    And,
    Or,
    Sum,
    Syn,
    Near(u32),
    Window(u32),
    WAnd,
    WSum,
}

impl OpKind {
    fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        let (op, distance) = match lower.split_once('/') {
            Some((op, n)) => {
                let distance: u32 = n.parse()
                    .map_err(|_| EvalError::malformed(format!("bad distance in {}", name)))?;
                (op, Some(distance))
            },
            None => (lower.as_str(), None),
        };
        match (op, distance) {
            ("#and", None) => Ok(OpKind::And),
            ("#or", None) => Ok(OpKind::Or),
            ("#sum", None) => Ok(OpKind::Sum),
            ("#syn", None) => Ok(OpKind::Syn),
            ("#wand", None) => Ok(OpKind::WAnd),
            ("#wsum", None) => Ok(OpKind::WSum),
            ("#near", Some(n)) => Ok(OpKind::Near(n)),
            ("#window", Some(n)) => Ok(OpKind::Window(n)),
            ("#near", None) | ("#window", None) => Err(EvalError::malformed(format!("{} needs a distance", name))),
            _ => Err(EvalError::malformed(format!("unknown operator {}", name))),
        }
    }

    fn is_weighted(&self) -> bool {
        matches!(self, OpKind::WAnd | OpKind::WSum)
    }

    // weights of unweighted operators are ignored
    fn build(self, weighted: Vec<(f64, Qry)>) -> Qry {
        let plain = |weighted: Vec<(f64, Qry)>| -> Vec<Qry> {
            weighted.into_iter().map(|(_, q)| q).collect()
        };
        match self {
            OpKind::And => Qry::And(plain(weighted)),
            OpKind::Or => Qry::Or(plain(weighted)),
            OpKind::Sum => Qry::Sum(plain(weighted)),
            OpKind::Syn => Qry::Syn(plain(weighted)),
            OpKind::Near(distance) => Qry::Near { distance, args: plain(weighted) },
            OpKind::Window(distance) => Qry::Window { distance, args: plain(weighted) },
            OpKind::WAnd => Qry::WAnd(weighted),
            OpKind::WSum => Qry::WSum(weighted),
        }
    }
}

/// Recursive-descent parser for the query grammar:
///
/// ```text
/// query    := operator '(' args ')' | term
/// operator := #and | #or | #sum | #syn | #wand | #wsum | #near/n | #window/n
/// args     := query* | (weight query)*     -- weighted for #wand and #wsum
/// term     := word | word.field
/// ```
///
/// Operator names are case-insensitive. Terms are normalized like the index;
/// a term that normalizes to several words becomes `#near/1` over them and
/// one that normalizes to nothing is dropped, together with its weight.
pub struct QryParser {
    default_field: String,
}

impl Default for QryParser {
    fn default() -> Self {
        QryParser::new(DEFAULT_FIELD)
    }
}

impl QryParser {
    pub fn new(default_field: &str) -> Self {
        QryParser { default_field: default_field.to_string() }
    }

    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// None when every term of the query was dropped.
    pub fn parse(&self, text: &str) -> Result<Option<Qry>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(EvalError::malformed("empty query"));
        }
        let mut pos = 0;
        let qry = self.parse_query(&tokens, &mut pos)?;
        if pos < tokens.len() {
            return Err(EvalError::malformed(format!("unexpected trailing input in {}", text)));
        }
        Ok(qry)
    }

    fn parse_query(&self, tokens: &[Token], pos: &mut usize) -> Result<Option<Qry>> {
        let word = match tokens.get(*pos) {
            Some(Token::Word(word)) => word,
            Some(Token::Open) => return Err(EvalError::malformed("unexpected '('")),
            Some(Token::Close) => return Err(EvalError::malformed("unexpected ')'")),
            None => return Err(EvalError::malformed("missing ')'")),
        };
        *pos += 1;
        if !word.starts_with('#') {
            return Ok(self.parse_term(word));
        }

        let kind = OpKind::from_name(word)?;
        if tokens.get(*pos) != Some(&Token::Open) {
            return Err(EvalError::malformed(format!("{} must be followed by '('", word)));
        }
        *pos += 1;
        let mut args = vec![];
        while !self.at_close(tokens, pos) {
            let weight = if kind.is_weighted() {
                let weight = self.parse_weight(tokens, pos)?;
                if self.at_close(tokens, pos) {
                    return Err(EvalError::malformed(format!("{} weight {} has no argument", word, weight)));
                }
                weight
            }else{
                1.0
            };
            if let Some(arg) = self.parse_query(tokens, pos)? {
                args.push((weight, arg));
            }
        }
        let qry = if args.is_empty() { None } else { Some(kind.build(args)) };
        // consume ')'
        *pos += 1;
        Ok(qry)
    }

    fn at_close(&self, tokens: &[Token], pos: &usize) -> bool {
        tokens.get(*pos) == Some(&Token::Close)
    }

    fn parse_weight(&self, tokens: &[Token], pos: &mut usize) -> Result<f64> {
        match tokens.get(*pos) {
            Some(Token::Word(word)) => {
                let weight: f64 = word.parse()
                    .map_err(|_| EvalError::malformed(format!("expected a weight, got {}", word)))?;
                *pos += 1;
                Ok(weight)
            },
            _ => Err(EvalError::malformed("expected a weight")),
        }
    }

    fn parse_term(&self, word: &str) -> Option<Qry> {
        let (text, field) = match word.rsplit_once('.') {
            Some((text, field)) if is_text_field(field) => {
                (text, field.to_lowercase())
            },
            _ => (word, self.default_field.clone()),
        };
        let mut terms = tokenizer::analyze(text);
        match terms.len() {
            0 => {
                log::debug!("term {} dropped", word);
                None
            },
            1 => terms.pop().map(|term| Qry::Term { term, field }),
            _ => Some(Qry::Near {
                distance: 1,
                args: terms.into_iter().map(|term| Qry::Term { term, field: field.clone() }).collect(),
            }),
        }
    }
}
