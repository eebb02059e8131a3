//! The optional pass that lets the AI oracle improve a locally parsed document.

use crate::{
    error::OracleError,
    oracle::{Credentials, Oracle, OracleToken, Refinement},
    ParseResult, ParsedLine, Position, Token, TokenId,
};
use std::collections::HashSet;

/// Runs the oracle over a parsed document and reconciles its answer with the local result.
///
/// Without an oracle or usable credentials this is a pass-through.
pub struct RefinementCoordinator<'a> {
    oracle: Option<&'a dyn Oracle>,
    credentials: Option<&'a Credentials>,
}

impl<'a> RefinementCoordinator<'a> {
    pub fn new(oracle: &'a dyn Oracle, credentials: &'a Credentials) -> Self {
        Self {
            oracle: Some(oracle),
            credentials: Some(credentials),
        }
    }

    pub fn disabled() -> Self {
        Self {
            oracle: None,
            credentials: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.oracle.is_some() && self.credentials.map(Credentials::is_usable).unwrap_or_default()
    }

    /// Produces the final result. Oracle failures keep the local lines.
    ///
    /// The flat collections are always derived from the final lines.
    pub async fn run(&self, raw_text: &str, local_lines: Vec<ParsedLine>) -> ParseResult {
        let (Some(oracle), Some(credentials)) = (self.oracle, self.credentials) else {
            return ParseResult::from_lines(local_lines, vec![]);
        };
        if !credentials.is_usable() {
            tracing::debug!("Skipping refinement, no usable credentials");
            return ParseResult::from_lines(local_lines, vec![]);
        }

        tracing::info!("Refining {} lines", local_lines.len());
        let refined = match oracle.refine(credentials, raw_text, &local_lines).await {
            Ok(refinement) => reconcile(refinement, &local_lines),
            Err(err) => Err(err),
        };
        match refined {
            Ok((lines, Some(translations))) => {
                tracing::info!("Refinement replaced the document");
                ParseResult::from_lines(lines, translations)
            }
            Ok((lines, None)) => {
                tracing::info!("Refinement replaced the document (no translations)");
                ParseResult::from_lines(lines, vec![])
            }
            Err(err) => {
                tracing::warn!("Refinement failed, keeping the local result: {err}");
                ParseResult::from_lines(local_lines, vec![])
            }
        }
    }
}

// the new lines, and the translations if the oracle sent any
type Reconciled = (Vec<ParsedLine>, Option<Vec<String>>);

fn reconcile(refinement: Refinement, local_lines: &[ParsedLine]) -> Result<Reconciled, OracleError> {
    let (oracle_lines, translations) = match refinement {
        Refinement::Refined {
            parsed_lines,
            translations,
        } => (parsed_lines, Some(translations)),
        Refinement::Legacy { parsed_lines } => (parsed_lines, None),
    };
    let local_is_empty = local_lines.iter().all(Vec::is_empty);
    let oracle_is_empty = oracle_lines.iter().all(Vec::is_empty);
    if oracle_is_empty && !local_is_empty {
        return Err(OracleError::Malformed(
            "refined document has no tokens".to_string(),
        ));
    }
    Ok((normalize(oracle_lines), translations))
}

/// Turns oracle tokens into proper tokens.
///
/// Missing or repeated ids are replaced with fresh ones and positions are reassigned in order.
fn normalize(oracle_lines: Vec<Vec<OracleToken>>) -> Vec<ParsedLine> {
    let mut seen = HashSet::new();
    let mut index = 0;
    let mut lines = Vec::with_capacity(oracle_lines.len());
    for (line_idx, oracle_line) in oracle_lines.into_iter().enumerate() {
        let mut line = Vec::with_capacity(oracle_line.len());
        for oracle_token in oracle_line {
            if oracle_token.text.is_empty() {
                tracing::trace!("Dropping empty token from oracle");
                continue;
            }
            let id = match oracle_token.id {
                Some(id) if seen.insert(id) => id,
                _ => {
                    let id = TokenId::new();
                    seen.insert(id);
                    id
                }
            };
            let position = Position {
                line: line_idx,
                index,
            };
            index += 1;
            let token = Token::new(oracle_token.text, oracle_token.token_type, position)
                .with_id(id)
                .with_reading(oracle_token.reading.unwrap_or_default())
                .with_romaji(oracle_token.romaji.unwrap_or_default())
                .with_definition(oracle_token.definition);
            line.push(token);
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{testing::FakeOracle, TokenType};

    fn local_lines() -> Vec<ParsedLine> {
        vec![vec![
            Token::new("忘れた", TokenType::Kanji, Position { line: 0, index: 0 })
                .with_reading("わすれた"),
            Token::new("物", TokenType::Kanji, Position { line: 0, index: 1 }).with_reading("ぶつ"),
        ]]
    }

    fn oracle_token(text: &str, reading: Option<&str>) -> OracleToken {
        OracleToken {
            id: None,
            text: text.to_string(),
            token_type: TokenType::Kanji,
            reading: reading.map(str::to_string),
            romaji: None,
            definition: None,
        }
    }

    #[tokio::test]
    async fn disabled_is_pass_through() {
        let lines = local_lines();
        let result = RefinementCoordinator::disabled()
            .run("忘れた物", lines.clone())
            .await;
        assert_eq!(result.parsed_lines, lines);
        assert_eq!(result.all_tokens.len(), 2);
        assert_eq!(result.kanji_tokens.len(), 2);
    }

    #[tokio::test]
    async fn blank_credentials_skip_oracle() {
        let oracle = FakeOracle::default();
        let credentials = Credentials::new("  ");
        let coordinator = RefinementCoordinator::new(&oracle, &credentials);
        assert!(!coordinator.is_enabled());
        let lines = local_lines();
        let result = coordinator.run("忘れた物", lines.clone()).await;
        assert_eq!(result.parsed_lines, lines);
        assert_eq!(oracle.refine_calls(), 0);
    }

    #[tokio::test]
    async fn refined_shape_replaces_lines_and_translations() {
        let lines = local_lines();
        let kept_id = lines[0][0].id();
        let mut kept = oracle_token("忘れた", Some("わすれた"));
        kept.id = Some(kept_id);
        let oracle = FakeOracle::with_refinement(Ok(Refinement::Refined {
            parsed_lines: vec![vec![kept, oracle_token("物", Some("もの"))]],
            translations: vec!["The thing I forgot".to_string()],
        }));
        let credentials = Credentials::new("key");
        let result = RefinementCoordinator::new(&oracle, &credentials)
            .run("忘れた物", lines)
            .await;

        assert_eq!(oracle.refine_calls(), 1);
        assert_eq!(result.line_translations, &["The thing I forgot"]);
        assert_eq!(result.all_tokens[0].id(), kept_id);
        assert_eq!(result.all_tokens[1].reading(), "もの");
        assert_eq!(result.kanji_tokens[1].reading(), "もの");
        assert_eq!(result.all_tokens[1].position(), Position { line: 0, index: 1 });
    }

    #[tokio::test]
    async fn legacy_shape_leaves_translations_empty() {
        let oracle = FakeOracle::with_refinement(Ok(Refinement::Legacy {
            parsed_lines: vec![vec![oracle_token("忘れた物", Some("わすれたもの"))]],
        }));
        let credentials = Credentials::new("key");
        let result = RefinementCoordinator::new(&oracle, &credentials)
            .run("忘れた物", local_lines())
            .await;
        assert_eq!(result.parsed_lines.len(), 1);
        assert_eq!(result.all_tokens.len(), 1);
        assert_eq!(result.all_tokens[0].reading(), "わすれたもの");
        assert!(result.line_translations.is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_local_lines() {
        let oracle = FakeOracle::with_refinement(Err(OracleError::Timeout(
            std::time::Duration::from_secs(30),
        )));
        let credentials = Credentials::new("key");
        let lines = local_lines();
        let result = RefinementCoordinator::new(&oracle, &credentials)
            .run("忘れた物", lines.clone())
            .await;
        assert_eq!(result, ParseResult::from_lines(lines, vec![]));
    }

    #[tokio::test]
    async fn empty_refinement_is_rejected() {
        let oracle = FakeOracle::with_refinement(Ok(Refinement::Refined {
            parsed_lines: vec![vec![]],
            translations: vec!["?".to_string()],
        }));
        let credentials = Credentials::new("key");
        let lines = local_lines();
        let result = RefinementCoordinator::new(&oracle, &credentials)
            .run("忘れた物", lines.clone())
            .await;
        assert_eq!(result.parsed_lines, lines);
        assert!(result.line_translations.is_empty());
    }

    #[test]
    fn normalize_fixes_ids_and_positions() {
        let id = TokenId::new();
        let mut first = oracle_token("火", None);
        first.id = Some(id);
        let mut duplicate = oracle_token("水", Some("みず"));
        duplicate.id = Some(id);
        let lines = normalize(vec![
            vec![first, oracle_token("", None)],
            vec![duplicate],
        ]);

        assert_eq!(lines[0].len(), 1);
        assert_eq!(lines[0][0].id(), id);
        // missing reading defaults to the text
        assert_eq!(lines[0][0].reading(), "火");
        assert_ne!(lines[1][0].id(), id);
        assert_eq!(lines[1][0].position(), Position { line: 1, index: 1 });
    }
}
