//! Merging the static hiding decision with live and historical signals.
//!
//! Precedence, highest first:
//! 1. keys classified by the live signal of this tick are shown;
//! 2. keys classified by any earlier scoring result in the session are shown;
//! 3. while listening, `weak` words of the unit being recited are shown;
//! 4. everything else keeps the policy decision.
//!
//! The recognizer's cursor (`current_key`) never reveals a word. It only marks
//! a word that is already visible.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::accumulator::KeySets;
use crate::model::{LiveOverlaySignal, WeaknessLevel};
use crate::policy::{Anchor, HideMode, RecallTrigger, Resolution};
use crate::traits::WeaknessLookup;

/// Final classification of one word. Every word is in exactly one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordState {
    Hidden,
    /// Hidden, but showing its first letter.
    Hinted,
    Mistake,
    Correct,
    /// Plain visible text.
    Revealed,
}

impl WordState {
    pub fn is_visible(self) -> bool {
        !matches!(self, WordState::Hidden | WordState::Hinted)
    }
}

/// One word of a render plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub key: String,
    pub state: WordState,
    pub is_current: bool,
}

/// The complete, authoritative render instruction for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub mode: Option<HideMode>,
    /// Every word in reading order.
    pub entries: Vec<PlanEntry>,
    pub hidden: BTreeSet<String>,
    pub hinted: BTreeSet<String>,
    pub mistakes: BTreeSet<String>,
    pub correct: BTreeSet<String>,
    pub revealed: BTreeSet<String>,
    /// Cursor marker, set only when the cursor word is visible.
    pub current: Option<String>,
    /// Key -> recited text for mistake tooltips.
    pub mistake_details: BTreeMap<String, String>,
    pub unit_hidden: bool,
    pub anchor: Option<Anchor>,
    pub trigger: Option<RecallTrigger>,
}

impl RenderPlan {
    pub fn state_of(&self, key: &str) -> Option<WordState> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.state)
    }

    /// Number of words in each state: hidden, hinted, mistake, correct, revealed.
    pub fn counts(&self) -> [usize; 5] {
        [
            self.hidden.len(),
            self.hinted.len(),
            self.mistakes.len(),
            self.correct.len(),
            self.revealed.len(),
        ]
    }

    fn set_for(&mut self, state: WordState) -> &mut BTreeSet<String> {
        match state {
            WordState::Hidden => &mut self.hidden,
            WordState::Hinted => &mut self.hinted,
            WordState::Mistake => &mut self.mistakes,
            WordState::Correct => &mut self.correct,
            WordState::Revealed => &mut self.revealed,
        }
    }
}

/// Classify every key of `resolution`.
pub fn merge(
    resolution: &Resolution,
    live: Option<&LiveOverlaySignal>,
    accumulated: &KeySets,
    weakness: &dyn WeaknessLookup,
) -> RenderPlan {
    let mut plan = RenderPlan {
        mode: resolution.mode,
        entries: Vec::with_capacity(resolution.keys.len()),
        hidden: BTreeSet::new(),
        hinted: BTreeSet::new(),
        mistakes: BTreeSet::new(),
        correct: BTreeSet::new(),
        revealed: BTreeSet::new(),
        current: None,
        mistake_details: BTreeMap::new(),
        unit_hidden: resolution.unit_hidden,
        anchor: resolution.anchor.clone(),
        trigger: resolution.trigger,
    };

    for key in &resolution.keys {
        let state = classify(key, resolution, live, accumulated, weakness);
        if state == WordState::Mistake {
            let detail = live
                .and_then(|l| l.mistake_details.get(key))
                .or_else(|| accumulated.mistake_details.get(key));
            if let Some(text) = detail {
                plan.mistake_details.insert(key.clone(), text.clone());
            }
        }
        plan.set_for(state).insert(key.clone());
        plan.entries.push(PlanEntry {
            key: key.clone(),
            state,
            is_current: false,
        });
    }

    let cursor = live.and_then(|l| l.current_key.as_deref());
    if let Some(cursor) = cursor {
        if let Some(entry) = plan
            .entries
            .iter_mut()
            .find(|e| e.key == cursor && e.state.is_visible())
        {
            entry.is_current = true;
            plan.current = Some(entry.key.clone());
        }
    }

    plan
}

fn classify(
    key: &str,
    resolution: &Resolution,
    live: Option<&LiveOverlaySignal>,
    accumulated: &KeySets,
    weakness: &dyn WeaknessLookup,
) -> WordState {
    if let Some(live) = live {
        if live.mistake_keys.contains(key) {
            return WordState::Mistake;
        }
        if live.correct_keys.contains(key) {
            return WordState::Correct;
        }
    }
    if accumulated.mistake_keys.contains(key) {
        return WordState::Mistake;
    }
    if accumulated.correct_keys.contains(key) {
        return WordState::Correct;
    }
    if let Some(live) = live {
        if live.is_listening
            && live.unit.owns(key)
            && weakness.weakness(key) == WeaknessLevel::Weak
        {
            return WordState::Revealed;
        }
    }
    if resolution.hinted.contains(key) {
        WordState::Hinted
    } else if resolution.hidden.contains(key) {
        WordState::Hidden
    } else {
        WordState::Revealed
    }
}
