//! Trait definitions for the engine's external collaborators.
//!
//! Scoring is asynchronous and lives behind [`ScoringClient`]; historical
//! weakness is a synchronous lookup behind [`WeaknessLookup`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::{ComparisonResult, UnitKey, WeaknessLevel};

// ---------------------------------------------------------------------------
// Scoring collaborator
// ---------------------------------------------------------------------------

/// Backend that turns a recited transcript into a [`ComparisonResult`].
#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Score one recitation of one unit.
    ///
    /// The returned result should carry `request.sequence`; the driver
    /// overwrites it either way.
    async fn score(&self, request: &ScoreRequest) -> Result<ComparisonResult, ScoringError>;
}

/// Request to score a recitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Unit the user was reciting when the request was made.
    pub unit: UnitKey,
    /// Final transcript from the recognizer.
    pub transcript: String,
    /// Reference words of the unit, in order.
    pub reference: Vec<String>,
    /// Monotonic identifier assigned when the request was created.
    pub sequence: u64,
}

// ---------------------------------------------------------------------------
// Weakness collaborator
// ---------------------------------------------------------------------------

/// Per-word difficulty derived from long-term review history.
pub trait WeaknessLookup {
    fn weakness(&self, key: &str) -> WeaknessLevel;
}

/// No review history: every word is `Unknown`.
pub struct NoHistory;

impl WeaknessLookup for NoHistory {
    fn weakness(&self, _: &str) -> WeaknessLevel {
        WeaknessLevel::Unknown
    }
}

impl WeaknessLookup for HashMap<String, WeaknessLevel> {
    fn weakness(&self, key: &str) -> WeaknessLevel {
        self.get(key).copied().unwrap_or_default()
    }
}

impl WeaknessLookup for BTreeMap<String, WeaknessLevel> {
    fn weakness(&self, key: &str) -> WeaknessLevel {
        self.get(key).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_words_are_unknown() {
        let mut history = HashMap::new();
        history.insert("1:1:1".to_string(), WeaknessLevel::Weak);
        assert_eq!(history.weakness("1:1:1"), WeaknessLevel::Weak);
        assert_eq!(history.weakness("1:1:2"), WeaknessLevel::Unknown);
        assert_eq!(NoHistory.weakness("1:1:1"), WeaknessLevel::Unknown);
    }

    #[test]
    fn score_request_serde_roundtrip() {
        let request = ScoreRequest {
            unit: UnitKey::new(1, 2),
            transcript: "الحمد لله".into(),
            reference: vec!["ٱلْحَمْدُ".into(), "لِلَّهِ".into()],
            sequence: 4,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"unit\":\"1:2\""));
        let back: ScoreRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
