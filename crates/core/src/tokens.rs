//! Contains the `Token` type and its parts.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a token, stable for the token's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(Uuid);

impl TokenId {
    /// Creates a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

/// The kind of characters a token consists of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Kanji,
    Hiragana,
    Katakana,
    Latin,
    Number,
    Punctuation,
}

impl TokenType {
    /// Whether the reading of this type of text has to be looked up.
    pub fn needs_reading(self) -> bool {
        matches!(self, Self::Kanji | Self::Katakana)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Kanji => "kanji",
            Self::Hiragana => "hiragana",
            Self::Katakana => "katakana",
            Self::Latin => "latin",
            Self::Number => "number",
            Self::Punctuation => "punctuation",
        };
        f.write_str(s)
    }
}

/// Where a token is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line number among the kept lines.
    pub line: usize,
    /// Position within the flattened token sequence of the whole document.
    pub index: usize,
}

/// The atomic unit of text.
///
/// The id, text and type never change after creation. The reading and romaji are never empty,
/// they default to the text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    id: TokenId,
    text: String,
    #[serde(rename = "type")]
    token_type: TokenType,
    reading: String,
    romaji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    position: Position,
}

impl Token {
    /// Creates a token with a fresh id whose reading and romaji are the text itself.
    pub fn new(text: impl Into<String>, token_type: TokenType, position: Position) -> Self {
        let text = text.into();
        Self {
            id: TokenId::new(),
            reading: text.clone(),
            romaji: text.clone(),
            text,
            token_type,
            definition: None,
            notes: None,
            position,
        }
    }

    /// Sets the reading. An empty reading is ignored.
    pub fn with_reading(mut self, reading: impl Into<String>) -> Self {
        set_nonempty(&mut self.reading, reading.into());
        self
    }

    /// Sets the romaji. An empty romaji is ignored.
    pub fn with_romaji(mut self, romaji: impl Into<String>) -> Self {
        set_nonempty(&mut self.romaji, romaji.into());
        self
    }

    pub fn with_definition(mut self, definition: Option<String>) -> Self {
        self.definition = definition.filter(|d| !d.is_empty());
        self
    }

    pub fn with_id(mut self, id: TokenId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn reading(&self) -> &str {
        &self.reading
    }

    pub fn romaji(&self) -> &str {
        &self.romaji
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_kanji(&self) -> bool {
        self.token_type == TokenType::Kanji
    }

    /// Whether the reading says something the text itself doesn't.
    pub fn has_distinct_reading(&self) -> bool {
        !self.reading.is_empty() && self.reading != self.text
    }

    /// Applies the set fields of the update. Empty readings and romaji are ignored.
    pub fn apply(&mut self, update: &TokenUpdate) {
        if let Some(reading) = &update.reading {
            set_nonempty(&mut self.reading, reading.clone());
        }
        if let Some(romaji) = &update.romaji {
            set_nonempty(&mut self.romaji, romaji.clone());
        }
        if let Some(definition) = &update.definition {
            self.definition = Some(definition.clone());
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }
}

fn set_nonempty(field: &mut String, value: String) {
    if !value.is_empty() {
        *field = value;
    }
}

/// The fields of a token that may change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
    pub reading: Option<String>,
    pub romaji: Option<String>,
    pub definition: Option<String>,
    pub notes: Option<String>,
}
