//! Contains `Document`, the single owner of the current parse result.

use crate::{ParseResult, Token, TokenId, TokenUpdate};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedDocument = Arc<RwLock<Document>>;

/// The current parse result along with its generation.
///
/// The generation changes whenever the whole result is replaced, which lets late writers detect
/// that the tokens they were working with no longer exist.
#[derive(Debug, Clone, Default)]
pub struct Document {
    result: ParseResult,
    generation: u64,
}

impl Document {
    pub fn new(result: ParseResult) -> Self {
        Self {
            result,
            generation: 0,
        }
    }

    pub fn shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the whole result, starting a new generation.
    pub fn replace(&mut self, result: ParseResult) -> u64 {
        self.result = result;
        self.generation += 1;
        tracing::debug!("Document replaced, now at generation {}", self.generation);
        self.generation
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.result
            .parsed_lines
            .iter()
            .flatten()
            .find(|t| t.id() == id)
    }

    /// The text of the given line.
    pub fn line_context(&self, line: usize) -> String {
        self.result
            .parsed_lines
            .get(line)
            .map(|tokens| tokens.iter().map(Token::text).collect())
            .unwrap_or_default()
    }

    /// Updates the token with the given id, returns whether it was found.
    ///
    /// The lines are the source of truth, the flat collections are derived from them again
    /// after the update.
    pub fn update_token(&mut self, id: TokenId, update: &TokenUpdate) -> bool {
        let Some(token) = self
            .result
            .parsed_lines
            .iter_mut()
            .flatten()
            .find(|t| t.id() == id)
        else {
            tracing::warn!("No token {id} in document");
            return false;
        };
        token.apply(update);
        self.result.rederive();
        true
    }

    /// Kanji tokens with duplicate texts removed, first occurrence wins.
    pub fn unique_kanji(&self) -> Vec<Token> {
        crate::quiz::unique_kanji(&self.result.kanji_tokens)
    }
}
