//! Contains `Segmenter`, an Iterator that groups the characters of a line into typed spans.
//!
//! Characters of the same type are grouped together, except that hiragana directly following
//! kanji is merged into the kanji span so that e.g. 食べた stays one unit.

use crate::{classify, TokenType};

/// A run of characters of one type, before any reading is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub token_type: TokenType,
}

// the type of the currently open group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupType {
    Plain(TokenType),
    // kanji that has absorbed trailing hiragana
    Mixed,
}

impl GroupType {
    fn token_type(self) -> TokenType {
        match self {
            Self::Plain(token_type) => token_type,
            Self::Mixed => TokenType::Kanji,
        }
    }

    // whether the next character joins the group
    fn absorbs(self, next: TokenType) -> bool {
        match (self, next) {
            (Self::Plain(TokenType::Kanji) | Self::Mixed, TokenType::Hiragana) => true,
            (Self::Plain(current), next) => current == next,
            (Self::Mixed, _) => false,
        }
    }

    fn after(self, next: TokenType) -> Self {
        match (self, next) {
            (Self::Plain(TokenType::Kanji), TokenType::Hiragana) => Self::Mixed,
            (group, _) => group,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    idx: usize,
    s: &'a str,
}

impl<'a> Segmenter<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { idx: 0, s }
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start_idx = self.idx;
        let mut chars = self.s.get(start_idx..)?.chars();
        let first = chars.next()?;
        let mut group = GroupType::Plain(classify(first));
        self.idx += first.len_utf8();

        for c in chars {
            let char_type = classify(c);
            if !group.absorbs(char_type) {
                break;
            }
            group = group.after(char_type);
            self.idx += c.len_utf8();
        }

        Some(Span {
            text: &self.s[start_idx..self.idx],
            token_type: group.token_type(),
        })
    }
}

/// Segments a line into spans.
pub fn segment(line: &str) -> Vec<Span<'_>> {
    Segmenter::new(line).collect()
}
