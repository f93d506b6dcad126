//! Per-session store of the latest scoring result for each unit.
//!
//! Results are keyed by the unit they were requested for, never by "most
//! recent", so a result that arrives after the user has moved on still lands
//! on its own unit.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{ComparisonResult, Unit, UnitKey};

/// What [`ResultAccumulator::record`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First result for this unit.
    Stored,
    /// Replaced an earlier result for this unit.
    Replaced { previous_sequence: u64 },
    /// A newer result for this unit is already stored; nothing changed.
    Superseded { current_sequence: u64 },
    /// This result's sequence number was already folded in; nothing changed.
    AlreadyFolded,
}

/// Mistake and correct word keys derived from every stored result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySets {
    pub mistake_keys: BTreeSet<String>,
    pub correct_keys: BTreeSet<String>,
    /// Key -> recited text, for mistakes where the scorer reported one.
    pub mistake_details: BTreeMap<String, String>,
}

impl KeySets {
    pub fn is_empty(&self) -> bool {
        self.mistake_keys.is_empty() && self.correct_keys.is_empty()
    }
}

/// Latest [`ComparisonResult`] per unit, for one session.
#[derive(Debug, Clone, Default)]
pub struct ResultAccumulator {
    results: BTreeMap<UnitKey, ComparisonResult>,
    folded: BTreeSet<u64>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result` for `unit`, replacing any result with a lower sequence
    /// number.
    ///
    /// A result whose sequence number was recorded before is ignored, even if
    /// it has since been replaced. A result older than the stored one is
    /// folded in without being stored.
    pub fn record(&mut self, unit: UnitKey, result: ComparisonResult) -> RecordOutcome {
        if !self.folded.insert(result.sequence) {
            tracing::debug!(%unit, sequence = result.sequence, "result already folded in");
            return RecordOutcome::AlreadyFolded;
        }
        if let Some(stored) = self.results.get(&unit) {
            if stored.sequence > result.sequence {
                tracing::debug!(
                    %unit,
                    sequence = result.sequence,
                    current = stored.sequence,
                    "result arrived after a newer one, keeping the newer"
                );
                return RecordOutcome::Superseded {
                    current_sequence: stored.sequence,
                };
            }
        }
        match self.results.insert(unit, result) {
            Some(previous) => RecordOutcome::Replaced {
                previous_sequence: previous.sequence,
            },
            None => RecordOutcome::Stored,
        }
    }

    pub fn get(&self, unit: &UnitKey) -> Option<&ComparisonResult> {
        self.results.get(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitKey> {
        self.results.keys()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Forget everything. Only an explicit session reset does this.
    pub fn reset(&mut self) {
        self.results.clear();
        self.folded.clear();
    }

    /// Project every stored result onto word keys.
    ///
    /// `units` supplies the current word list for each unit. Statuses that
    /// point past the end of that list, and results for units missing from
    /// it, are skipped: they refer to an older snapshot of the text.
    pub fn derive_key_sets<'a, I>(&self, units: I) -> KeySets
    where
        I: IntoIterator<Item = &'a Unit>,
    {
        let by_key: BTreeMap<UnitKey, &Unit> = units.into_iter().map(|u| (u.key, u)).collect();
        let mut sets = KeySets::default();

        for (unit_key, result) in &self.results {
            let Some(unit) = by_key.get(unit_key) else {
                tracing::debug!(unit = %unit_key, "no word list for stored result, skipping");
                continue;
            };
            let mut stale = 0usize;
            for (index, status) in result.statuses.iter().enumerate() {
                let Some(word) = unit.words.get(index) else {
                    stale += 1;
                    continue;
                };
                if status.is_mistake() {
                    sets.mistake_keys.insert(word.key.clone());
                    if let Some(recited) = result.recited_at(index) {
                        sets.mistake_details
                            .insert(word.key.clone(), recited.to_string());
                    }
                } else {
                    sets.correct_keys.insert(word.key.clone());
                }
            }
            if stale > 0 {
                tracing::debug!(
                    unit = %unit_key,
                    stale,
                    words = unit.len(),
                    "result references words past the end of the unit"
                );
            }
        }

        sets
    }
}
