//! TOML passage and session scenario parser.
//!
//! Loads passages from TOML files and directories, validates them, and
//! replays recorded session scenarios into a [`Session`].

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::engine::{Session, SessionEvent};
use crate::model::{
    ComparisonResult, LiveOverlaySignal, Mistake, Passage, Unit, UnitKey, UnitRange,
    WeaknessLevel, WordStatus,
};
use crate::policy::{HideAction, ModeSetting, SessionHideConfig};

/// Intermediate TOML structure for parsing passage files.
#[derive(Debug, Deserialize)]
struct TomlPassageFile {
    passage: TomlPassageHeader,
    #[serde(default)]
    units: Vec<TomlUnit>,
}

#[derive(Debug, Deserialize)]
struct TomlPassageHeader {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlUnit {
    key: String,
    #[serde(default)]
    page: Option<u16>,
    #[serde(default)]
    words: Vec<String>,
}

/// Parse a single TOML file into a `Passage`.
pub fn parse_passage(path: &Path) -> Result<Passage> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read passage file: {}", path.display()))?;

    parse_passage_str(&content, path)
}

/// Parse a TOML string into a `Passage` (useful for testing).
pub fn parse_passage_str(content: &str, source_path: &Path) -> Result<Passage> {
    let parsed: TomlPassageFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut units = Vec::with_capacity(parsed.units.len());
    let mut pages = BTreeMap::new();
    for u in parsed.units {
        let key: UnitKey = u
            .key
            .parse()
            .with_context(|| format!("invalid unit in {}", source_path.display()))?;
        if let Some(page) = u.page {
            pages.insert(key, page);
        }
        units.push(Unit::from_texts(key, u.words.as_slice()));
    }

    Ok(Passage {
        id: parsed.passage.id,
        name: parsed.passage.name,
        units,
        pages,
    })
}

/// Recursively load all `.toml` passage files from a directory.
pub fn load_passage_directory(dir: &Path) -> Result<Vec<Passage>> {
    let mut passages = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            passages.extend(load_passage_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_passage(&path) {
                Ok(passage) => passages.push(passage),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(passages)
}

/// Load one passage file, or every passage under a directory.
pub fn load_passages(path: &Path) -> Result<Vec<Passage>> {
    if path.is_dir() {
        load_passage_directory(path)
    } else {
        Ok(vec![parse_passage(path)?])
    }
}

/// A warning from passage validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The unit concerned (if applicable).
    pub unit: Option<UnitKey>,
    /// Warning message.
    pub message: String,
}

/// Validate a passage for common issues.
pub fn validate_passage(passage: &Passage) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if passage.units.is_empty() {
        warnings.push(ValidationWarning {
            unit: None,
            message: "passage has no units".into(),
        });
    }

    // Check for duplicate unit keys
    let mut seen = HashSet::new();
    for unit in &passage.units {
        if !seen.insert(unit.key) {
            warnings.push(ValidationWarning {
                unit: Some(unit.key),
                message: format!("duplicate unit key: {}", unit.key),
            });
        }
    }

    for unit in &passage.units {
        if unit.is_empty() {
            warnings.push(ValidationWarning {
                unit: Some(unit.key),
                message: "unit has no words".into(),
            });
        }
        if !passage.pages.contains_key(&unit.key) {
            warnings.push(ValidationWarning {
                unit: Some(unit.key),
                message: "unit has no page number".into(),
            });
        }
    }

    // Reading order and page order
    for pair in passage.units.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.key < prev.key {
            warnings.push(ValidationWarning {
                unit: Some(next.key),
                message: format!("unit {} listed after {}, out of reading order", next.key, prev.key),
            });
        }
        if let (Some(a), Some(b)) = (passage.pages.get(&prev.key), passage.pages.get(&next.key)) {
            if b < a {
                warnings.push(ValidationWarning {
                    unit: Some(next.key),
                    message: format!("page decreases from {a} to {b}"),
                });
            }
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Session scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlScenarioFile {
    #[serde(default)]
    current: Option<UnitKey>,
    #[serde(default)]
    config: TomlScenarioConfig,
    #[serde(default)]
    live: Option<LiveOverlaySignal>,
    #[serde(default)]
    weakness: BTreeMap<String, WeaknessLevel>,
    #[serde(default)]
    results: Vec<TomlResult>,
}

#[derive(Debug, Deserialize)]
struct TomlScenarioConfig {
    #[serde(default)]
    hide_mode: Option<String>,
    #[serde(default)]
    hide_difficulty: Option<i32>,
    #[serde(default = "default_true")]
    is_hidden: bool,
    #[serde(default)]
    manually_revealed: Vec<String>,
    #[serde(default)]
    range_start: Option<UnitKey>,
    #[serde(default)]
    range_end: Option<UnitKey>,
}

fn default_true() -> bool {
    true
}

impl Default for TomlScenarioConfig {
    fn default() -> Self {
        Self {
            hide_mode: None,
            hide_difficulty: None,
            is_hidden: true,
            manually_revealed: Vec::new(),
            range_start: None,
            range_end: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TomlResult {
    unit: UnitKey,
    sequence: u64,
    statuses: Vec<WordStatus>,
    #[serde(default)]
    accuracy: Option<f64>,
    #[serde(default)]
    mistakes: Vec<Mistake>,
}

/// A recorded session state: configuration, position, results and the
/// latest live tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// `None` falls back to the configured default.
    pub hide_mode: Option<ModeSetting>,
    pub hide_difficulty: Option<i32>,
    pub is_hidden: bool,
    pub manually_revealed: Vec<String>,
    pub range_start: Option<UnitKey>,
    pub range_end: Option<UnitKey>,
    pub current: Option<UnitKey>,
    pub live: Option<LiveOverlaySignal>,
    pub weakness: BTreeMap<String, WeaknessLevel>,
    pub results: Vec<(UnitKey, ComparisonResult)>,
}

/// Parse a session scenario file.
pub fn parse_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;

    parse_scenario_str(&content, path)
}

/// Parse a TOML string into a `Scenario`.
pub fn parse_scenario_str(content: &str, source_path: &Path) -> Result<Scenario> {
    let parsed: TomlScenarioFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let results = parsed
        .results
        .into_iter()
        .map(|r| {
            let correct_words = r.statuses.iter().filter(|s| !s.is_mistake()).count() as u32;
            let accuracy = r.accuracy.unwrap_or_else(|| {
                if r.statuses.is_empty() {
                    0.0
                } else {
                    correct_words as f64 * 100.0 / r.statuses.len() as f64
                }
            });
            (
                r.unit,
                ComparisonResult {
                    sequence: r.sequence,
                    correct_words,
                    mistakes: r.mistakes,
                    accuracy,
                    statuses: r.statuses,
                },
            )
        })
        .collect();

    let config = parsed.config;
    Ok(Scenario {
        hide_mode: config.hide_mode.map(ModeSetting::from),
        hide_difficulty: config.hide_difficulty,
        is_hidden: config.is_hidden,
        manually_revealed: config.manually_revealed,
        range_start: config.range_start,
        range_end: config.range_end,
        current: parsed.current,
        live: parsed.live,
        weakness: parsed.weakness,
        results,
    })
}

impl Scenario {
    /// Rebuild the session this scenario describes by feeding it through the
    /// session reducer.
    pub fn replay(
        &self,
        passage: Passage,
        default_mode: &ModeSetting,
        default_difficulty: i32,
    ) -> Result<Session> {
        let full = passage
            .full_range()
            .with_context(|| format!("passage '{}' has no units", passage.id))?;
        let range = UnitRange::new(
            self.range_start.unwrap_or(full.start),
            self.range_end.unwrap_or(full.end),
        );
        let mode = self.hide_mode.clone().unwrap_or_else(|| default_mode.clone());
        let mut session = Session::new(passage, SessionHideConfig::new(mode, range));

        let mut events = vec![
            SessionEvent::Hide(HideAction::SetDifficulty(
                self.hide_difficulty.unwrap_or(default_difficulty),
            )),
            SessionEvent::Hide(HideAction::SetHidden(self.is_hidden)),
        ];
        if let Some(current) = self.current {
            if !range.contains(&current) {
                tracing::warn!(%current, "current unit outside the session range, staying at the start");
            }
            events.push(SessionEvent::Seek(current));
        }
        events.extend(
            self.manually_revealed
                .iter()
                .map(|key| SessionEvent::Hide(HideAction::RevealWord(key.clone()))),
        );
        events.extend(self.results.iter().map(|(unit, result)| SessionEvent::Scored {
            unit: *unit,
            result: result.clone(),
        }));
        events.extend(self.live.clone().map(SessionEvent::Signal));

        for event in events {
            session.apply(event);
        }
        Ok(session)
    }
}
