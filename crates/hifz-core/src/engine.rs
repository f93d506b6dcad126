//! Session orchestration and the rendering contract.
//!
//! [`resolve`] is the one function the rendering layer calls: it runs the
//! hide-policy resolver, projects accumulated results, and merges the live
//! signal. [`Session`] owns the mutable state of one memorization session and
//! changes it only through [`Session::apply`].

use std::collections::BTreeMap;

use crate::accumulator::{KeySets, RecordOutcome, ResultAccumulator};
use crate::model::{ComparisonResult, LiveOverlaySignal, Passage, Unit, UnitKey};
use crate::navigation::{NavState, Navigator, PagedUnit, Transition};
use crate::overlay::{merge, RenderPlan};
use crate::policy::{resolve_hidden, HideAction, HideMode, SessionHideConfig};
use crate::traits::{ScoreRequest, WeaknessLookup};

/// Resolve the final render plan for `unit`.
///
/// `context` holds neighbouring units shown alongside it. The returned plan is
/// a complete partition of every supplied word key; callers must not apply
/// any hiding logic of their own.
pub fn resolve(
    unit: &Unit,
    context: &[Unit],
    config: &SessionHideConfig,
    live: Option<&LiveOverlaySignal>,
    accumulator: &ResultAccumulator,
    weakness: &dyn WeaknessLookup,
) -> RenderPlan {
    let resolution = resolve_hidden(unit, context, config);
    let key_sets = accumulator.derive_key_sets(std::iter::once(unit).chain(context));
    merge(&resolution, live, &key_sets, weakness)
}

/// Everything that can change a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Hide(HideAction),
    /// A recognition tick. Stored against the unit it names; ticks kept for
    /// other units stop listening and lose their cursor.
    Signal(LiveOverlaySignal),
    /// A scoring result for the unit it was requested for.
    Scored {
        unit: UnitKey,
        result: ComparisonResult,
    },
    Next,
    Previous,
    Seek(UnitKey),
    /// Start over: drop results, reveals and live signals.
    Reset,
}

/// What [`Session::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Config { version: u64 },
    Signal { unit: UnitKey },
    Recorded(RecordOutcome),
    Navigated(Transition),
    Reset,
}

/// State of one memorization session over a passage.
#[derive(Debug, Clone)]
pub struct Session {
    passage: Passage,
    config: SessionHideConfig,
    accumulator: ResultAccumulator,
    navigator: Navigator,
    live: BTreeMap<UnitKey, LiveOverlaySignal>,
    next_sequence: u64,
}

impl Session {
    pub fn new(passage: Passage, config: SessionHideConfig) -> Self {
        let navigator = Navigator::new(layout(&passage), &config.unit_range);
        Self {
            passage,
            config,
            accumulator: ResultAccumulator::new(),
            navigator,
            live: BTreeMap::new(),
            next_sequence: 1,
        }
    }

    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    pub fn config(&self) -> &SessionHideConfig {
        &self.config
    }

    pub fn accumulator(&self) -> &ResultAccumulator {
        &self.accumulator
    }

    pub fn current(&self) -> Option<UnitKey> {
        self.navigator.current_key()
    }

    pub fn nav_state(&self) -> NavState {
        self.navigator.state()
    }

    pub fn live_signal(&self, unit: &UnitKey) -> Option<&LiveOverlaySignal> {
        self.live.get(unit)
    }

    /// Hand out the next result sequence number.
    pub fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Build a scoring request for `unit`, stamped with a fresh sequence number.
    ///
    /// Returns `None` if the passage has no such unit.
    pub fn score_request(&mut self, unit: UnitKey, transcript: String) -> Option<ScoreRequest> {
        let reference = self
            .passage
            .unit(&unit)?
            .words
            .iter()
            .map(|w| w.text.clone())
            .collect();
        Some(ScoreRequest {
            unit,
            transcript,
            reference,
            sequence: self.next_sequence(),
        })
    }

    /// Apply one event.
    pub fn apply(&mut self, event: SessionEvent) -> Applied {
        match event {
            SessionEvent::Hide(action) => {
                let range_change = matches!(action, HideAction::SetRange(_));
                self.config = self.config.reduce(action);
                if range_change {
                    self.rebuild_navigator();
                }
                Applied::Config {
                    version: self.config.version,
                }
            }
            SessionEvent::Signal(signal) => {
                let unit = signal.unit;
                if Some(unit) != self.current() {
                    tracing::debug!(%unit, "signal for a unit that is not on screen");
                }
                // only the newest tick can be listening or tracking
                for (key, stale) in self.live.iter_mut() {
                    if *key != unit {
                        stale.is_listening = false;
                        stale.current_key = None;
                    }
                }
                self.live.insert(unit, signal);
                Applied::Signal { unit }
            }
            SessionEvent::Scored { unit, result } => {
                self.next_sequence = self.next_sequence.max(result.sequence.saturating_add(1));
                let outcome = self.accumulator.record(unit, result);
                tracing::debug!(%unit, ?outcome, "scoring result recorded");
                Applied::Recorded(outcome)
            }
            SessionEvent::Next => self.navigated(|n| n.next()),
            SessionEvent::Previous => self.navigated(|n| n.previous()),
            SessionEvent::Seek(key) => self.navigated(|n| n.seek(key)),
            SessionEvent::Reset => {
                self.accumulator.reset();
                self.live.clear();
                self.config = self.config.reduce(HideAction::ClearRevealed);
                Applied::Reset
            }
        }
    }

    fn navigated(&mut self, step: impl FnOnce(&mut Navigator) -> Transition) -> Applied {
        let transition = step(&mut self.navigator);
        if transition.clears_reveals() {
            self.config = self.config.reduce(HideAction::ClearRevealed);
        }
        Applied::Navigated(transition)
    }

    fn rebuild_navigator(&mut self) {
        let current = self.current();
        self.navigator = Navigator::new(layout(&self.passage), &self.config.unit_range);
        if let Some(key) = current {
            self.navigator.reposition(key);
        }
    }

    /// Units rendered with the current one: its neighbours under
    /// `context_recall`, nothing otherwise.
    fn context_units(&self) -> Vec<Unit> {
        if self.config.hide_mode.mode() != Some(HideMode::ContextRecall) {
            return Vec::new();
        }
        let (prev, next) = self.navigator.neighbours();
        [prev, next]
            .into_iter()
            .flatten()
            .filter_map(|key| self.passage.unit(&key).cloned())
            .collect()
    }

    /// Render plan for the current unit.
    pub fn render(&self, weakness: &dyn WeaknessLookup) -> Option<RenderPlan> {
        let key = self.current()?;
        let unit = self.passage.unit(&key)?;
        let context = self.context_units();
        Some(resolve(
            unit,
            &context,
            &self.config,
            self.live.get(&key),
            &self.accumulator,
            weakness,
        ))
    }

    /// Mistake and correct keys across every unit of the session range.
    pub fn key_sets(&self) -> KeySets {
        let range = self.config.unit_range;
        self.accumulator.derive_key_sets(
            self.passage
                .units
                .iter()
                .filter(|u| range.contains(&u.key)),
        )
    }
}

fn layout(passage: &Passage) -> Vec<PagedUnit> {
    passage
        .units
        .iter()
        .map(|u| PagedUnit {
            key: u.key,
            page: passage.page_of(&u.key),
        })
        .collect()
}
