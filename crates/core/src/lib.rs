//! kashi core types.
//!
//! Everything here is plain data shared between the engine and its frontends,
//! serialized with the same camelCase field names the frontends expect.

pub mod tokens;

pub use tokens::{Position, Token, TokenId, TokenType, TokenUpdate};

use serde::{Deserialize, Serialize};

/// One input line, tokens in reading order.
pub type ParsedLine = Vec<Token>;

/// The result of parsing a whole text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub parsed_lines: Vec<ParsedLine>,
    /// Every token of `parsed_lines`, flattened in order.
    pub all_tokens: Vec<Token>,
    /// The kanji tokens of `all_tokens`, in order.
    pub kanji_tokens: Vec<Token>,
    /// Translations aligned by index to `parsed_lines`. May be shorter than `parsed_lines` or empty.
    #[serde(default)]
    pub line_translations: Vec<String>,
}

impl ParseResult {
    /// Builds a result from lines, deriving the flat collections from them.
    pub fn from_lines(parsed_lines: Vec<ParsedLine>, line_translations: Vec<String>) -> Self {
        let (all_tokens, kanji_tokens) = flatten(&parsed_lines);
        Self {
            parsed_lines,
            all_tokens,
            kanji_tokens,
            line_translations,
        }
    }

    /// Re-derives `all_tokens` and `kanji_tokens` from `parsed_lines`.
    pub fn rederive(&mut self) {
        let (all_tokens, kanji_tokens) = flatten(&self.parsed_lines);
        self.all_tokens = all_tokens;
        self.kanji_tokens = kanji_tokens;
    }
}

/// Flattens lines into (all tokens, kanji tokens), both in document order.
pub fn flatten(lines: &[ParsedLine]) -> (Vec<Token>, Vec<Token>) {
    let mut all_tokens = Vec::new();
    let mut kanji_tokens = Vec::new();
    for token in lines.iter().flatten() {
        all_tokens.push(token.clone());
        if token.token_type() == TokenType::Kanji {
            kanji_tokens.push(token.clone());
        }
    }
    (all_tokens, kanji_tokens)
}

/// A single multiple-choice answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn correct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_correct: true,
        }
    }

    pub fn wrong(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_correct: false,
        }
    }
}
