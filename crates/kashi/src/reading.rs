//! Reading services convert Japanese text to its hiragana reading or romaji.

use crate::{error::ConversionError, is_kanji};
use async_trait::async_trait;
use ichiran::{Alternative, IchiranCli};
use std::{collections::HashMap, path::Path, sync::Arc};
use wana_kana::ConvertJapanese;

/// What to convert text into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingTarget {
    Hiragana,
    Romaji,
}

/// A service that knows how to read Japanese text.
///
/// Implementations are not assumed to be re-entrant, the annotator calls them strictly in order.
#[async_trait]
pub trait ReadingService: Send + Sync {
    async fn convert(&self, text: &str, target: ReadingTarget) -> Result<String, ConversionError>;
}

#[async_trait]
impl<T: ReadingService + ?Sized> ReadingService for Arc<T> {
    async fn convert(&self, text: &str, target: ReadingTarget) -> Result<String, ConversionError> {
        (**self).convert(text, target).await
    }
}

/// Converts kana only, using wana_kana. Text with kanji in it is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct KanaConverter;

#[async_trait]
impl ReadingService for KanaConverter {
    async fn convert(&self, text: &str, target: ReadingTarget) -> Result<String, ConversionError> {
        if text.chars().any(is_kanji) {
            return Err(ConversionError::Unsupported(text.to_string()));
        }
        Ok(kana_to(text, target))
    }
}

fn kana_to(text: &str, target: ReadingTarget) -> String {
    match target {
        ReadingTarget::Hiragana => text.to_hiragana(),
        ReadingTarget::Romaji => text.to_romaji(),
    }
}

/// Reads kanji by looking them up in a word-to-reading table, longest match first.
///
/// Entries may contain kana, e.g. `忘れ => わすれ`, which lets a single entry cover
/// a stem together with its okurigana.
#[derive(Debug, Clone, Default)]
pub struct DictionaryConverter {
    readings: HashMap<String, String>,
    // length of the longest entry in chars
    longest_entry: usize,
}

impl DictionaryConverter {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let readings = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect::<HashMap<_, _>>();
        let longest_entry = readings
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or_default();
        Self {
            readings,
            longest_entry,
        }
    }

    /// Loads a JSON object of `{ "word": "reading" }` pairs.
    pub fn from_json_file(path: &Path) -> Result<Self, ConversionError> {
        let contents = std::fs::read_to_string(path)?;
        let readings = serde_json::from_str::<HashMap<String, String>>(&contents)?;
        tracing::info!(
            "Loaded {} readings from {}",
            readings.len(),
            path.display()
        );
        Ok(Self::new(readings))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    fn read_hiragana(&self, text: &str) -> Result<String, ConversionError> {
        let chars = text.chars().collect::<Vec<_>>();
        let mut hiragana = String::new();
        // non-kanji are converted a run at a time so that wana_kana sees long vowel marks in context
        let mut kana_run = String::new();
        let mut idx = 0;
        while idx < chars.len() {
            if !is_kanji(chars[idx]) {
                kana_run.push(chars[idx]);
                idx += 1;
                continue;
            }
            let longest = self.longest_entry.min(chars.len() - idx);
            let found = (1..=longest).rev().find_map(|len| {
                let candidate = chars[idx..idx + len].iter().collect::<String>();
                self.readings.get(&candidate).map(|reading| (len, reading))
            });
            let Some((len, reading)) = found else {
                tracing::debug!("No reading for {} in {text}", chars[idx]);
                return Err(ConversionError::Unsupported(text.to_string()));
            };
            hiragana.push_str(&kana_run.to_hiragana());
            kana_run.clear();
            hiragana.push_str(reading);
            idx += len;
        }
        hiragana.push_str(&kana_run.to_hiragana());
        Ok(hiragana)
    }
}

#[async_trait]
impl ReadingService for DictionaryConverter {
    async fn convert(&self, text: &str, target: ReadingTarget) -> Result<String, ConversionError> {
        let hiragana = self.read_hiragana(text)?;
        Ok(match target {
            ReadingTarget::Hiragana => hiragana,
            ReadingTarget::Romaji => hiragana.to_romaji(),
        })
    }
}

/// Reads text with the ichiran CLI, using the kana of its best segmentation.
#[derive(Clone)]
pub struct IchiranConverter {
    cli: Arc<IchiranCli>,
}

impl IchiranConverter {
    pub fn new(cli: IchiranCli) -> Self {
        Self { cli: Arc::new(cli) }
    }
}

#[async_trait]
impl ReadingService for IchiranConverter {
    async fn convert(&self, text: &str, target: ReadingTarget) -> Result<String, ConversionError> {
        let cli = Arc::clone(&self.cli);
        let owned = text.to_string();
        let segments = tokio::task::spawn_blocking(move || cli.segment(&owned, Some(1)))
            .await
            .map_err(|err| ConversionError::Service(err.to_string()))?
            .map_err(|err| ConversionError::Service(err.to_string()))?;

        let mut kana = String::new();
        for segment in segments {
            match segment {
                ichiran::Segment::Segmentations(segmentations) => {
                    // the first segmentation is the one ichiran scores best
                    let Some(best) = segmentations.into_iter().next() else {
                        continue;
                    };
                    for word in best.words {
                        match word.alternatives.into_iter().next() {
                            Some(Alternative::WordInfo(wi)) => kana.push_str(&wi.kana),
                            Some(Alternative::CompoundWordInfo(cwi)) => {
                                for component in cwi.components {
                                    kana.push_str(&component.kana);
                                }
                            }
                            None => {}
                        }
                    }
                }
                ichiran::Segment::Other(other) => kana.push_str(&other),
            }
        }
        let hiragana = replace_invisible_characters(&kana).to_hiragana();
        if hiragana.is_empty() {
            return Err(ConversionError::Empty(text.to_string()));
        }
        Ok(match target {
            ReadingTarget::Hiragana => hiragana,
            ReadingTarget::Romaji => hiragana.to_romaji(),
        })
    }
}

fn replace_invisible_characters(s: &str) -> String {
    s.replace("\u{200b}", "").replace("\u{200c}", "")
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn dictionary() -> DictionaryConverter {
        DictionaryConverter::new([
            ("忘", "わす"),
            ("物", "もの"),
            ("食べ物", "たべもの"),
            ("食", "た"),
        ])
    }

    #[tokio::test]
    async fn kana_converter_reads_kana() {
        let hiragana = KanaConverter
            .convert("サクラ", ReadingTarget::Hiragana)
            .await
            .unwrap();
        assert_eq!(hiragana, "さくら");
        let romaji = KanaConverter
            .convert("さくら", ReadingTarget::Romaji)
            .await
            .unwrap();
        assert_eq!(romaji, "sakura");
    }

    #[tokio::test]
    async fn kana_converter_rejects_kanji() {
        let res = KanaConverter.convert("桜", ReadingTarget::Hiragana).await;
        assert!(matches!(res, Err(ConversionError::Unsupported(_))));
    }

    #[tokio::test]
    async fn dictionary_reads_okurigana() {
        let reading = dictionary()
            .convert("忘れた", ReadingTarget::Hiragana)
            .await
            .unwrap();
        assert_eq!(reading, "わすれた");
        let romaji = dictionary()
            .convert("忘れた", ReadingTarget::Romaji)
            .await
            .unwrap();
        assert_eq!(romaji, "wasureta");
    }

    #[tokio::test]
    async fn dictionary_prefers_longest_match() {
        let reading = dictionary()
            .convert("食べ物", ReadingTarget::Hiragana)
            .await
            .unwrap();
        assert_eq!(reading, "たべもの");
    }

    #[tokio::test]
    async fn dictionary_fails_on_unknown_kanji() {
        let res = dictionary().convert("空", ReadingTarget::Hiragana).await;
        assert!(matches!(res, Err(ConversionError::Unsupported(_))));
    }

    #[tokio::test]
    async fn loads_dictionary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"空": "そら", "夜": "よる", "": "x"}}"#).unwrap();
        let dictionary = DictionaryConverter::from_json_file(file.path()).unwrap();
        assert_eq!(dictionary.len(), 2);
        let reading = dictionary
            .convert("夜空", ReadingTarget::Hiragana)
            .await
            .unwrap();
        assert_eq!(reading, "よるそら");
    }

    #[test]
    fn rejects_malformed_dictionary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["空", "そら"]"#).unwrap();
        let res = DictionaryConverter::from_json_file(file.path());
        assert!(matches!(res, Err(ConversionError::DictionaryFormat(_))));
    }

    #[test]
    fn missing_dictionary_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = DictionaryConverter::from_json_file(&dir.path().join("missing.json"));
        assert!(matches!(res, Err(ConversionError::Dictionary(_))));
    }

    #[test]
    fn ignores_empty_entries() {
        let dictionary = DictionaryConverter::new([("", "a"), ("空", ""), ("空", "そら")]);
        assert_eq!(dictionary.len(), 1);
    }
}
