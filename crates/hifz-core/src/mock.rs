//! Mock scoring collaborator for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScoringError;
use crate::model::{ComparisonResult, Mistake, MistakeKind, Severity, UnitKey};
use crate::traits::{ScoreRequest, ScoringClient};
use crate::words::normalize;

/// A scoring client that aligns the transcript to the reference word by word.
///
/// Words are compared after diacritic stripping, so a recognizer transcript
/// without harakat scores as correct. Individual units can be made slow or
/// unavailable to exercise the driver.
#[derive(Default)]
pub struct MockScorer {
    /// Unit -> artificial latency.
    delays: HashMap<UnitKey, Duration>,
    /// Unit -> failure message; requests for these units fail as unavailable.
    failures: HashMap<UnitKey, String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ScoreRequest>>,
}

impl MockScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response for `unit` by `delay`.
    pub fn with_delay(mut self, unit: UnitKey, delay: Duration) -> Self {
        self.delays.insert(unit, delay);
        self
    }

    /// Fail every request for `unit`.
    pub fn failing(mut self, unit: UnitKey, message: &str) -> Self {
        self.failures.insert(unit, message.to_string());
        self
    }

    /// Get the number of calls made to this scorer.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this scorer.
    pub fn last_request(&self) -> Option<ScoreRequest> {
        self.last_request.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Positional word alignment of `transcript` against `reference`.
///
/// Missing trailing words are `Skipped`, surplus words are `Added` with an
/// index past the end of the reference.
pub fn align(reference: &[String], transcript: &str) -> Vec<Mistake> {
    let recited: Vec<&str> = transcript.split_whitespace().collect();
    let mut mistakes = Vec::new();

    for (index, expected) in reference.iter().enumerate() {
        match recited.get(index) {
            Some(said) if normalize(said) == normalize(expected) => {}
            Some(said) => mistakes.push(Mistake {
                word_index: index,
                kind: MistakeKind::Wrong,
                severity: Severity::Major,
                recited_text: said.to_string(),
                correct_text: expected.clone(),
            }),
            None => mistakes.push(Mistake {
                word_index: index,
                kind: MistakeKind::Skipped,
                severity: Severity::Major,
                recited_text: String::new(),
                correct_text: expected.clone(),
            }),
        }
    }
    for (index, extra) in recited.iter().enumerate().skip(reference.len()) {
        mistakes.push(Mistake {
            word_index: index,
            kind: MistakeKind::Added,
            severity: Severity::Minor,
            recited_text: extra.to_string(),
            correct_text: String::new(),
        });
    }
    mistakes
}

#[async_trait]
impl ScoringClient for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ComparisonResult, ScoringError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut slot) = self.last_request.lock() {
            *slot = Some(request.clone());
        }

        if let Some(delay) = self.delays.get(&request.unit) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failures.get(&request.unit) {
            return Err(ScoringError::Unavailable {
                unit: request.unit,
                message: message.clone(),
            });
        }
        if request.transcript.trim().is_empty() {
            return Err(ScoringError::Rejected {
                unit: request.unit,
                message: "empty transcript".into(),
            });
        }

        let mistakes = align(&request.reference, &request.transcript);
        Ok(ComparisonResult::from_mistakes(
            request.sequence,
            request.reference.len(),
            mistakes,
        ))
    }
}
