//! Core data model types for hifz.
//!
//! These are the value types that the whole engine passes around: how a unit
//! (ayah) and its words are addressed, what a scoring result looks like, and
//! what a live recognition tick carries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Address of one unit (ayah) of the source text.
///
/// Ordered by `(surah, ayah)`, which is also reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitKey {
    pub surah: u16,
    pub ayah: u16,
}

impl UnitKey {
    pub fn new(surah: u16, ayah: u16) -> Self {
        Self { surah, ayah }
    }

    /// Key of the word at a 1-based `position` within this unit.
    pub fn word_key(&self, position: usize) -> String {
        format!("{}:{}:{}", self.surah, self.ayah, position)
    }

    /// Returns `true` if `word_key` addresses a word inside this unit.
    pub fn owns(&self, word_key: &str) -> bool {
        word_key
            .rsplit_once(':')
            .map(|(unit, _)| unit == self.to_string())
            .unwrap_or(false)
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

impl FromStr for UnitKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (surah, ayah) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| KeyError::MissingSeparator(s.to_string()))?;
        let surah = parse_component(s, surah)?;
        let ayah = parse_component(s, ayah)?;
        Ok(Self { surah, ayah })
    }
}

fn parse_component(raw: &str, part: &str) -> Result<u16, KeyError> {
    match part.parse::<u16>() {
        Ok(0) | Err(_) => Err(KeyError::InvalidComponent {
            key: raw.to_string(),
            component: part.to_string(),
        }),
        Ok(n) => Ok(n),
    }
}

impl TryFrom<String> for UnitKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UnitKey> for String {
    fn from(key: UnitKey) -> Self {
        key.to_string()
    }
}

/// Split a word key (`"surah:ayah:position"`) into its unit and 1-based position.
pub fn parse_word_key(key: &str) -> Result<(UnitKey, usize), KeyError> {
    let (unit, position) = key
        .rsplit_once(':')
        .ok_or_else(|| KeyError::MissingSeparator(key.to_string()))?;
    let unit: UnitKey = unit.parse()?;
    match position.parse::<usize>() {
        Ok(0) | Err(_) => Err(KeyError::InvalidComponent {
            key: key.to_string(),
            component: position.to_string(),
        }),
        Ok(n) => Ok((unit, n)),
    }
}

/// One immutable word of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Stable key, `"surah:ayah:position"`.
    pub key: String,
    /// Display text, possibly with diacritics.
    pub text: String,
    pub is_first_in_unit: bool,
    pub is_unit_end: bool,
}

/// A unit and its ordered words, as supplied by the word source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub key: UnitKey,
    pub words: Vec<Word>,
}

impl Unit {
    /// Build a unit from display texts, deriving keys and boundary flags.
    pub fn from_texts<S: AsRef<str>>(key: UnitKey, texts: &[S]) -> Self {
        let last = texts.len().saturating_sub(1);
        let words = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Word {
                key: key.word_key(i + 1),
                text: text.as_ref().to_string(),
                is_first_in_unit: i == 0,
                is_unit_end: i == last,
            })
            .collect();
        Self { key, words }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|w| w.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A memorization passage: its units in reading order and the page each is
/// rendered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub name: String,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub pages: BTreeMap<UnitKey, u16>,
}

impl Passage {
    pub fn unit(&self, key: &UnitKey) -> Option<&Unit> {
        self.units.iter().find(|u| u.key == *key)
    }

    /// Page of `key`, or 0 when the layout does not say.
    pub fn page_of(&self, key: &UnitKey) -> u16 {
        self.pages.get(key).copied().unwrap_or(0)
    }

    /// Range from the first to the last unit, if there are any.
    pub fn full_range(&self) -> Option<UnitRange> {
        let first = self.units.iter().map(|u| u.key).min()?;
        let last = self.units.iter().map(|u| u.key).max()?;
        Some(UnitRange::new(first, last))
    }

    pub fn word_count(&self) -> usize {
        self.units.iter().map(Unit::len).sum()
    }
}

/// Inclusive span of units a session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRange {
    pub start: UnitKey,
    pub end: UnitKey,
}

impl UnitRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(start: UnitKey, end: UnitKey) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.start <= *key && *key <= self.end
    }
}

/// Per-word classification produced by the scoring collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    Correct,
    Wrong,
    Skipped,
}

impl WordStatus {
    pub fn is_mistake(self) -> bool {
        !matches!(self, WordStatus::Correct)
    }
}

impl FromStr for WordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correct" | "ok" => Ok(WordStatus::Correct),
            "wrong" | "mistake" => Ok(WordStatus::Wrong),
            "skipped" | "missed" => Ok(WordStatus::Skipped),
            other => Err(format!("unknown word status: {other}")),
        }
    }
}

/// Kind of recitation mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MistakeKind {
    Wrong,
    Skipped,
    Added,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
}

/// A single mistake inside a scoring result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    /// 0-based index into the unit's word list.
    pub word_index: usize,
    pub kind: MistakeKind,
    pub severity: Severity,
    /// What the reciter actually said.
    #[serde(default)]
    pub recited_text: String,
    /// What the text says.
    #[serde(default)]
    pub correct_text: String,
}

/// Outcome of scoring one recitation of one unit.
///
/// A value object: the engine reads and indexes into it, never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Monotonic identifier stamped when the scoring request was created.
    pub sequence: u64,
    pub correct_words: u32,
    #[serde(default)]
    pub mistakes: Vec<Mistake>,
    /// 0–100.
    pub accuracy: f64,
    /// One status per word of the unit, in word order.
    pub statuses: Vec<WordStatus>,
}

impl ComparisonResult {
    /// Build a result for a unit of `total_words` words from its mistake list.
    ///
    /// Words named by a `Wrong` or `Skipped` mistake get that status; all
    /// others are correct. `Added` mistakes do not mark a reference word.
    pub fn from_mistakes(sequence: u64, total_words: usize, mistakes: Vec<Mistake>) -> Self {
        let mut statuses = vec![WordStatus::Correct; total_words];
        for m in &mistakes {
            let status = match m.kind {
                MistakeKind::Wrong => WordStatus::Wrong,
                MistakeKind::Skipped => WordStatus::Skipped,
                MistakeKind::Added => continue,
            };
            if let Some(slot) = statuses.get_mut(m.word_index) {
                *slot = status;
            }
        }
        let correct_words = statuses.iter().filter(|s| !s.is_mistake()).count() as u32;
        let accuracy = if total_words == 0 {
            0.0
        } else {
            correct_words as f64 * 100.0 / total_words as f64
        };
        Self {
            sequence,
            correct_words,
            mistakes,
            accuracy,
            statuses,
        }
    }

    /// Recited text for the mistake at `word_index`, if the scorer reported one.
    pub fn recited_at(&self, word_index: usize) -> Option<&str> {
        self.mistakes
            .iter()
            .find(|m| m.word_index == word_index && !m.recited_text.is_empty())
            .map(|m| m.recited_text.as_str())
    }
}

/// Historical difficulty of a word, supplied by the review-history collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaknessLevel {
    Weak,
    Moderate,
    Strong,
    #[default]
    Unknown,
}

impl FromStr for WeaknessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weak" => Ok(WeaknessLevel::Weak),
            "moderate" => Ok(WeaknessLevel::Moderate),
            "strong" => Ok(WeaknessLevel::Strong),
            "unknown" => Ok(WeaknessLevel::Unknown),
            other => Err(format!("unknown weakness level: {other}")),
        }
    }
}

/// One tick of live recognition output for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveOverlaySignal {
    /// Unit the recognizer was aligned to when this tick was produced.
    pub unit: UnitKey,
    #[serde(default)]
    pub correct_keys: BTreeSet<String>,
    #[serde(default)]
    pub mistake_keys: BTreeSet<String>,
    /// Word the recognizer is currently aligned to.
    #[serde(default)]
    pub current_key: Option<String>,
    /// Key -> recited text, shown instead of the reference text in tooltips.
    #[serde(default)]
    pub mistake_details: BTreeMap<String, String>,
    #[serde(default)]
    pub is_listening: bool,
}

impl LiveOverlaySignal {
    /// An empty, non-listening tick for `unit`.
    pub fn idle(unit: UnitKey) -> Self {
        Self {
            unit,
            correct_keys: BTreeSet::new(),
            mistake_keys: BTreeSet::new(),
            current_key: None,
            mistake_details: BTreeMap::new(),
            is_listening: false,
        }
    }
}
