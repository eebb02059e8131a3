//! Turns segmented spans into tokens with readings.

use crate::{
    reading::{ReadingService, ReadingTarget},
    segmenter::{Segmenter, Span},
    ParsedLine, Position, Token, TokenType,
};

/// Creates a token from a span, asking the reading service for what it needs.
///
/// Conversion failures are logged and the reading and romaji default to the text.
pub async fn annotate<R>(reading_service: &R, span: Span<'_>, position: Position) -> Token
where
    R: ReadingService + ?Sized,
{
    let Span { text, token_type } = span;
    let token = Token::new(text, token_type, position);
    match token_type {
        TokenType::Kanji | TokenType::Katakana => {
            let Some(reading) = convert(reading_service, text, ReadingTarget::Hiragana).await
            else {
                return token;
            };
            let token = token.with_reading(reading);
            match convert(reading_service, text, ReadingTarget::Romaji).await {
                Some(romaji) => token.with_romaji(romaji),
                None => token,
            }
        }
        TokenType::Hiragana => match convert(reading_service, text, ReadingTarget::Romaji).await {
            Some(romaji) => token.with_romaji(romaji),
            None => token,
        },
        TokenType::Latin | TokenType::Number | TokenType::Punctuation => token,
    }
}

async fn convert<R>(reading_service: &R, text: &str, target: ReadingTarget) -> Option<String>
where
    R: ReadingService + ?Sized,
{
    match reading_service.convert(text, target).await {
        Ok(converted) if !converted.is_empty() => Some(converted),
        Ok(_) => {
            tracing::warn!("Empty {target:?} conversion for '{text}'");
            None
        }
        Err(err) => {
            tracing::warn!("Failed to convert '{text}' to {target:?}: {err}");
            None
        }
    }
}

/// Segments and annotates a line.
///
/// Spans are annotated one at a time, in order. `start_index` is the document-wide index of the
/// line's first token.
pub async fn annotate_line<R>(
    reading_service: &R,
    line: &str,
    line_idx: usize,
    start_index: usize,
) -> ParsedLine
where
    R: ReadingService + ?Sized,
{
    let mut tokens = Vec::new();
    for span in Segmenter::new(line) {
        let position = Position {
            line: line_idx,
            index: start_index + tokens.len(),
        };
        tracing::trace!("annotating {span:?} at {position:?}");
        tokens.push(annotate(reading_service, span, position).await);
    }
    tokens
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::ConversionError,
        testing::{lyrics_dictionary, BrokenService},
    };
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    /// Records the calls it receives.
    #[derive(Default)]
    struct RecordingService {
        calls: Mutex<Vec<(String, ReadingTarget)>>,
        count: AtomicUsize,
    }

    #[async_trait]
    impl ReadingService for RecordingService {
        async fn convert(
            &self,
            text: &str,
            target: ReadingTarget,
        ) -> Result<String, ConversionError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push((text.to_string(), target));
            Ok(format!("<{text}>"))
        }
    }

    #[tokio::test]
    async fn annotates_kanji_with_reading_and_romaji() {
        let tokens = annotate_line(&lyrics_dictionary(), "忘れた物", 0, 0).await;
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text(), "忘れた");
        assert_eq!(tokens[0].reading(), "わすれた");
        assert_eq!(tokens[0].romaji(), "wasureta");
        assert_eq!(tokens[1].text(), "物");
        assert_eq!(tokens[1].reading(), "もの");
        assert_eq!(tokens[1].romaji(), "mono");
    }

    #[tokio::test]
    async fn falls_back_to_text() {
        let tokens = annotate_line(&BrokenService, "空、とソラabc", 3, 10).await;
        for token in &tokens {
            assert_eq!(token.reading(), token.text());
            assert_eq!(token.romaji(), token.text());
        }
        let positions = tokens.iter().map(|t| t.position()).collect::<Vec<_>>();
        assert_eq!(
            positions,
            (10..15)
                .map(|index| Position { line: 3, index })
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn only_asks_for_what_is_needed() {
        let service = RecordingService::default();
        let tokens = annotate_line(&service, "空、とソラabc 1", 0, 0).await;
        let calls = service.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            &[
                ("空".to_string(), ReadingTarget::Hiragana),
                ("空".to_string(), ReadingTarget::Romaji),
                ("と".to_string(), ReadingTarget::Romaji),
                ("ソラ".to_string(), ReadingTarget::Hiragana),
                ("ソラ".to_string(), ReadingTarget::Romaji),
            ]
        );
        assert_eq!(service.count.load(Ordering::SeqCst), 5);
        // hiragana keeps its own text as the reading
        assert_eq!(tokens[2].reading(), "と");
        assert_eq!(tokens[2].romaji(), "<と>");
    }

    #[tokio::test]
    async fn kanji_reading_failure_skips_romaji() {
        let tokens = annotate_line(&lyrics_dictionary(), "桜", 0, 0).await;
        assert_eq!(tokens[0].reading(), "桜");
        assert_eq!(tokens[0].romaji(), "桜");
    }
}
