//! Builds quiz material out of kanji tokens: queues, difficulty orderings and answer options.

use crate::{standardise_reading, AnswerOption, Token, TokenType};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Unique kanji tokens driving one practice session.
pub type QuizQueue = Vec<Token>;

pub const DEFAULT_OPTION_COUNT: usize = 4;

/// Readings used to fill up answer options when the text itself doesn't have enough kanji.
pub const COMMON_READINGS: [&str; 24] = [
    "かん", "じ", "がく", "せい", "にほん", "ご", "ひと", "くに", "やま", "かわ", "みず", "ひ",
    "つき", "た", "うえ", "した", "なか", "そと", "まえ", "うしろ", "みぎ", "ひだり", "おお", "ちい",
];

/// Kanji tokens with duplicate texts removed, first occurrence wins.
pub fn unique_kanji(tokens: &[Token]) -> Vec<Token> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|t| t.is_kanji() && seen.insert(t.text()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyOrder {
    #[default]
    Easy,
    Hard,
}

/// Unique kanji ordered from easiest to hardest, or the other way around.
///
/// Kanji that appear more often are considered easier, ties go to the shorter reading.
pub fn sort_by_difficulty(tokens: &[Token], order: DifficultyOrder) -> Vec<Token> {
    let mut frequency = HashMap::<&str, usize>::new();
    for token in tokens {
        *frequency.entry(token.text()).or_default() += 1;
    }

    let mut unique = unique_kanji(tokens);
    unique.sort_by(|a, b| {
        let frequency_a = frequency.get(a.text()).copied().unwrap_or_default();
        let frequency_b = frequency.get(b.text()).copied().unwrap_or_default();
        frequency_b
            .cmp(&frequency_a)
            .then_with(|| a.reading().chars().count().cmp(&b.reading().chars().count()))
    });
    if order == DifficultyOrder::Hard {
        unique.reverse();
    }
    unique
}

/// Wrong readings for a quiz item, at most `count` of them.
///
/// Readings of other kanji in the text come first, then common readings.
pub fn generate_distractors<R>(
    correct_reading: &str,
    count: usize,
    all_tokens: &[Token],
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let mut document_readings = all_tokens
        .iter()
        .filter(|t| t.is_kanji() && t.has_distinct_reading())
        .map(Token::reading)
        .collect::<Vec<_>>();
    document_readings.shuffle(rng);
    let mut common_readings = COMMON_READINGS.to_vec();
    common_readings.shuffle(rng);

    let mut distractors = Vec::with_capacity(count);
    for reading in document_readings.into_iter().chain(common_readings) {
        if distractors.len() >= count {
            break;
        }
        if reading != correct_reading && !distractors.iter().any(|d| d == reading) {
            distractors.push(reading.to_string());
        }
    }
    distractors
}

/// The token's reading and distractors, shuffled. `count` includes the correct answer.
pub fn generate_answer_options(
    token: &Token,
    all_tokens: &[Token],
    count: usize,
) -> Vec<AnswerOption> {
    generate_answer_options_with_rng(token, all_tokens, count, &mut rand::rng())
}

pub fn generate_answer_options_with_rng<R>(
    token: &Token,
    all_tokens: &[Token],
    count: usize,
    rng: &mut R,
) -> Vec<AnswerOption>
where
    R: Rng + ?Sized,
{
    let correct_reading = token.reading();
    let distractors =
        generate_distractors(correct_reading, count.saturating_sub(1), all_tokens, rng);
    let mut options = std::iter::once(AnswerOption::correct(correct_reading))
        .chain(distractors.into_iter().map(AnswerOption::wrong))
        .collect::<Vec<_>>();
    options.shuffle(rng);
    options
}

/// Kanji tokens with a reading worth asking about.
pub fn playable_kanji(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|t| t.is_kanji() && t.has_distinct_reading())
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOptions {
    pub shuffle: bool,
    /// The maximum queue length. `Some(0)` means no limit, like `None`.
    pub limit: Option<usize>,
    /// Kanji texts to leave out, e.g. ones already mastered.
    pub exclude: HashSet<String>,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            shuffle: true,
            limit: None,
            exclude: HashSet::new(),
        }
    }
}

pub fn create_quiz_queue(tokens: &[Token], options: &QuizOptions) -> QuizQueue {
    create_quiz_queue_with_rng(tokens, options, &mut rand::rng())
}

pub fn create_quiz_queue_with_rng<R>(
    tokens: &[Token],
    options: &QuizOptions,
    rng: &mut R,
) -> QuizQueue
where
    R: Rng + ?Sized,
{
    let playable = playable_kanji(tokens)
        .into_iter()
        .filter(|t| !options.exclude.contains(t.text()))
        .collect::<Vec<_>>();
    let mut queue = unique_kanji(&playable);
    if options.shuffle {
        queue.shuffle(rng);
    }
    if let Some(limit) = options.limit.filter(|&limit| limit > 0) {
        queue.truncate(limit);
    }
    queue
}

/// Tokens grouped by their type.
pub fn group_by_type(tokens: &[Token]) -> HashMap<TokenType, Vec<&Token>> {
    let mut groups = HashMap::<TokenType, Vec<&Token>>::new();
    for token in tokens {
        groups.entry(token.token_type()).or_default().push(token);
    }
    groups
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_tokens: usize,
    pub kanji_count: usize,
    pub unique_kanji_count: usize,
    pub hiragana_count: usize,
    pub katakana_count: usize,
    /// Latin, numbers and punctuation.
    pub other_count: usize,
}

pub fn get_stats(tokens: &[Token]) -> Stats {
    let groups = group_by_type(tokens);
    let count = |token_type: TokenType| groups.get(&token_type).map(Vec::len).unwrap_or_default();
    Stats {
        total_tokens: tokens.len(),
        kanji_count: count(TokenType::Kanji),
        unique_kanji_count: unique_kanji(tokens).len(),
        hiragana_count: count(TokenType::Hiragana),
        katakana_count: count(TokenType::Katakana),
        other_count: count(TokenType::Latin)
            + count(TokenType::Number)
            + count(TokenType::Punctuation),
    }
}

/// Checks a typed answer against the token's reading. Romaji answers are accepted.
pub fn check_answer(token: &Token, answer: &str) -> bool {
    if answer.trim().is_empty() {
        return false;
    }
    standardise_reading(answer).standardised == standardise_reading(token.reading()).standardised
}
