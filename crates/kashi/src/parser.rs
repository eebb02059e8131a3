//! The entry point that turns raw text into a `ParseResult`.

use crate::{
    annotator,
    oracle::{Credentials, Oracle},
    reading::{ReadingService, ReadingTarget},
    refinement::RefinementCoordinator,
    ParseResult, ParsedLine,
};
use std::sync::Arc;

/// Per-invocation settings for [`Parser::parse`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub use_ai: bool,
    pub credentials: Option<Credentials>,
}

impl ParseOptions {
    pub fn local() -> Self {
        Self::default()
    }

    pub fn with_ai(credentials: Credentials) -> Self {
        Self {
            use_ai: true,
            credentials: Some(credentials),
        }
    }
}

/// Parses text with a reading service and, optionally, an oracle for the refinement pass.
#[derive(Clone)]
pub struct Parser {
    reading_service: Arc<dyn ReadingService>,
    oracle: Option<Arc<dyn Oracle>>,
}

impl Parser {
    pub fn new(reading_service: Arc<dyn ReadingService>) -> Self {
        Self {
            reading_service,
            oracle: None,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Parses the text line by line.
    ///
    /// Blank lines are dropped. Failures of the reading service or the oracle never surface here,
    /// they only make the result less informative.
    pub async fn parse(&self, raw_text: &str, options: &ParseOptions) -> ParseResult {
        let lines = split_lines(raw_text);
        tracing::info!("Parsing {} lines", lines.len());

        let mut parsed_lines = Vec::<ParsedLine>::with_capacity(lines.len());
        let mut index = 0;
        for (line_idx, line) in lines.into_iter().enumerate() {
            let parsed =
                annotator::annotate_line(self.reading_service.as_ref(), line, line_idx, index).await;
            index += parsed.len();
            parsed_lines.push(parsed);
        }
        tracing::info!("Annotated {index} tokens");

        let coordinator = match (&self.oracle, &options.credentials) {
            (Some(oracle), Some(credentials)) if options.use_ai => {
                RefinementCoordinator::new(oracle.as_ref(), credentials)
            }
            (None, _) if options.use_ai => {
                tracing::warn!("Refinement requested but no oracle is configured");
                RefinementCoordinator::disabled()
            }
            _ => RefinementCoordinator::disabled(),
        };
        coordinator.run(raw_text, parsed_lines).await
    }

    /// The hiragana reading of the text, or the text itself if it can't be converted.
    pub async fn reading(&self, text: &str) -> String {
        self.convert(text, ReadingTarget::Hiragana).await
    }

    /// The romaji of the text, or the text itself if it can't be converted.
    pub async fn romaji(&self, text: &str) -> String {
        self.convert(text, ReadingTarget::Romaji).await
    }

    async fn convert(&self, text: &str, target: ReadingTarget) -> String {
        match self.reading_service.convert(text, target).await {
            Ok(converted) if !converted.is_empty() => converted,
            Ok(_) => text.to_string(),
            Err(err) => {
                tracing::warn!("Failed to convert '{text}' to {target:?}: {err}");
                text.to_string()
            }
        }
    }
}

// keeps the text of each line verbatim apart from a trailing carriage return
fn split_lines(raw_text: &str) -> Vec<&str> {
    raw_text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}
