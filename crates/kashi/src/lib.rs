//! Provides all of kashi's core functionality.
//!
//! Text flows through the [`segmenter`], then the [`annotator`] attaches readings using a
//! [`reading::ReadingService`], after which the [`refinement`] pass may let an [`oracle::Oracle`]
//! replace the result. The [`quiz`] functions and the [`verification::VerificationSession`] work on
//! the resulting tokens.

pub mod annotator;
pub mod document;
pub mod error;
pub mod oracle;
pub mod parser;
pub mod quiz;
pub mod reading;
pub mod refinement;
pub mod segmenter;
#[cfg(test)]
mod testing;
pub mod verification;

pub use kashi_core::{
    AnswerOption, ParseResult, ParsedLine, Position, Token, TokenId, TokenType, TokenUpdate,
};
pub use oracle::Credentials;
pub use parser::{ParseOptions, Parser};

use std::ops::RangeInclusive;

// CJK Unified Ideographs and Extension A, the latter has a lot of characters used in names
const KANJI_RANGES: [RangeInclusive<char>; 2] = ['\u{4E00}'..='\u{9FFF}', '\u{3400}'..='\u{4DBF}'];
const HIRAGANA_RANGE: RangeInclusive<char> = '\u{3040}'..='\u{309F}';
const KATAKANA_RANGE: RangeInclusive<char> = '\u{30A0}'..='\u{30FF}';

pub fn is_kanji(c: char) -> bool {
    // the iteration mark as in 時々 acts like the kanji before it
    c == '々' || KANJI_RANGES.iter().any(|range| range.contains(&c))
}

pub fn is_hiragana(c: char) -> bool {
    HIRAGANA_RANGE.contains(&c)
}

pub fn is_katakana(c: char) -> bool {
    KATAKANA_RANGE.contains(&c)
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || ('Ａ'..='Ｚ').contains(&c) || ('ａ'..='ｚ').contains(&c)
}

/// Classifies a single character. Everything that isn't anything else is punctuation.
pub fn classify(c: char) -> TokenType {
    if is_kanji(c) {
        TokenType::Kanji
    } else if is_hiragana(c) {
        TokenType::Hiragana
    } else if is_katakana(c) {
        TokenType::Katakana
    } else if is_digit(c) {
        TokenType::Number
    } else if is_latin(c) {
        TokenType::Latin
    } else {
        TokenType::Punctuation
    }
}

pub struct StandardisedReading {
    pub hiragana: String,
    pub standardised: String,
}

pub fn standardise_reading(text: &str) -> StandardisedReading {
    use wana_kana::ConvertJapanese;
    let hiragana = text.trim().to_hiragana();
    let standardised = hiragana.replace("づ", "ず").replace("ぢ", "じ");
    StandardisedReading {
        hiragana,
        standardised,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recognises_kanji() {
        assert!(!is_kanji('k'));
        assert!(!is_kanji('え'));
        assert!(is_kanji('考'));
        assert!(is_kanji('々'));
        // extension A
        assert!(is_kanji('㐂'));
    }

    #[test]
    fn classifies_characters() {
        assert_eq!(classify('食'), TokenType::Kanji);
        assert_eq!(classify('べ'), TokenType::Hiragana);
        assert_eq!(classify('カ'), TokenType::Katakana);
        assert_eq!(classify('ー'), TokenType::Katakana);
        assert_eq!(classify('7'), TokenType::Number);
        assert_eq!(classify('７'), TokenType::Number);
        assert_eq!(classify('a'), TokenType::Latin);
        assert_eq!(classify('Ｚ'), TokenType::Latin);
        assert_eq!(classify('。'), TokenType::Punctuation);
        assert_eq!(classify(' '), TokenType::Punctuation);
        assert_eq!(classify('♪'), TokenType::Punctuation);
        assert_eq!(classify('é'), TokenType::Punctuation);
    }

    #[test]
    fn standardises_readings() {
        let reading = standardise_reading("ツヅク");
        assert_eq!(reading.hiragana, "つづく");
        assert_eq!(reading.standardised, "つずく");
    }
}
