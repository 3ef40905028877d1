//! crates/bizchinese_core/src/analysis.rs
//!
//! Rules around turning pasted text into a list of words to study. The LLM
//! call itself lives behind `VocabularyExtractionService`; everything here is
//! deterministic.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::domain::Word;

pub const MIN_TEXT_CHARS: usize = 20;
pub const MAX_TEXT_CHARS: usize = 10_000;
/// Only this much of the text is sent to the model.
pub const PROMPT_TEXT_CHARS: usize = 2_000;
pub const MAX_SUGGESTED_WORDS: usize = 30;
/// Words at or above this score are treated as already known.
pub const MASTERED_THRESHOLD: i32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// The text is Chinese: pull its words out.
    Extract,
    /// The text describes a need in another language: suggest words for it.
    Recommend,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("Text is required")]
    Missing,
    #[error("Text must be at least 20 characters")]
    TooShort,
    #[error("Text must be less than 10,000 characters")]
    TooLong,
}

pub fn validate_text(text: &str) -> Result<(), TextError> {
    let len = text.chars().count();
    if text.trim().is_empty() {
        Err(TextError::Missing)
    } else if len < MIN_TEXT_CHARS {
        Err(TextError::TooShort)
    } else if len > MAX_TEXT_CHARS {
        Err(TextError::TooLong)
    } else {
        Ok(())
    }
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// True when more than 30% of the characters are CJK ideographs.
pub fn is_chinese_text(text: &str) -> bool {
    let total = text.chars().count();
    let chinese = text.chars().filter(|c| is_cjk(*c)).count();
    total > 0 && chinese as f64 > total as f64 * 0.3
}

pub fn detect_mode(text: &str) -> AnalysisMode {
    if is_chinese_text(text) {
        AnalysisMode::Extract
    } else {
        AnalysisMode::Recommend
    }
}

pub fn extraction_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(PROMPT_TEXT_CHARS).collect();
    format!(
        "You are a Chinese language expert. Extract all unique Chinese words/phrases from the following text that would be useful for a language learner.\n\n\
Rules:\n\
1. Return ONLY Chinese words, one per line\n\
2. Include 2-4 character words (avoid single characters unless they are standalone words)\n\
3. Include common phrases and business terms\n\
4. Do not include punctuation or numbers\n\
5. Maximum 30 words\n\n\
Text:\n{}\n\n\
Chinese words (one per line):",
        excerpt
    )
}

pub fn recommendation_prompt(description: &str) -> String {
    format!(
        "You are a Chinese language teacher. Based on the user's learning needs, recommend the most useful Chinese words/phrases.\n\n\
User's request: \"{}\"\n\n\
Rules:\n\
1. Return ONLY Chinese words/phrases, one per line\n\
2. Include 2-4 character words that are commonly used\n\
3. Focus on practical, high-frequency vocabulary\n\
4. Choose words relevant to the user's described scenario\n\
5. Maximum 30 words\n\
6. Do not include any explanation, just the Chinese words\n\n\
Chinese words (one per line):",
        description
    )
}

fn word_line_regex() -> Option<&'static Regex> {
    static WORD_LINE: OnceLock<Option<Regex>> = OnceLock::new();
    WORD_LINE
        .get_or_init(|| Regex::new(r"^[\u{4e00}-\u{9fff}]+$").ok())
        .as_ref()
}

fn is_word_line(line: &str) -> bool {
    match word_line_regex() {
        Some(re) => re.is_match(line),
        None => line.chars().all(is_cjk),
    }
}

/// Keeps the lines of a model response that are purely Chinese characters.
pub fn parse_word_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && is_word_line(line))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedWord {
    pub id: i32,
    pub chinese: String,
    pub pinyin: String,
    pub english: String,
    pub frequency: usize,
}

/// Dictionary words found in the extraction that the user has not mastered,
/// most frequent first.
pub fn rank_new_words(
    extracted: &[String],
    matched: &[Word],
    mastered_word_ids: &HashSet<i32>,
) -> Vec<SuggestedWord> {
    let mut words: Vec<SuggestedWord> = matched
        .iter()
        .filter(|w| !mastered_word_ids.contains(&w.id))
        .map(|w| SuggestedWord {
            id: w.id,
            chinese: w.chinese.clone(),
            pinyin: w.pinyin.clone(),
            english: w.english.clone(),
            frequency: extracted.iter().filter(|e| **e == w.chinese).count(),
        })
        .collect();
    words.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    words.truncate(MAX_SUGGESTED_WORDS);
    words
}

pub fn suggested_course_title(mode: AnalysisMode, text: &str, today: NaiveDate) -> String {
    let date = today.format("%Y-%m-%d");
    match mode {
        AnalysisMode::Extract => format!("Custom Course - {}", date),
        AnalysisMode::Recommend => {
            let head: String = text.chars().take(30).collect();
            format!("{}... - {}", head, date)
        }
    }
}
