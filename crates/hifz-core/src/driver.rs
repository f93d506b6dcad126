//! Async session driver.
//!
//! Pumps [`DriverEvent`]s from a channel through [`Session::apply`] in arrival
//! order while scoring requests run concurrently. A scoring result is recorded
//! against the unit it was requested for, however far the user has moved on.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc;

use crate::accumulator::RecordOutcome;
use crate::engine::{Applied, Session, SessionEvent};
use crate::error::ScoringError;
use crate::model::{ComparisonResult, LiveOverlaySignal, UnitKey};
use crate::overlay::RenderPlan;
use crate::policy::HideAction;
use crate::traits::{NoHistory, ScoreRequest, ScoringClient, WeaknessLookup};

/// Input to a running [`SessionDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Hide(HideAction),
    Signal(LiveOverlaySignal),
    /// The recognizer produced a final transcript for `unit`.
    Recited { unit: UnitKey, transcript: String },
    Next,
    Previous,
    Seek(UnitKey),
    /// Stop taking events; in-flight scoring still completes.
    Finish,
}

/// Callbacks fired as the driver makes progress.
pub trait SessionObserver: Send + Sync {
    fn on_plan(&self, plan: &RenderPlan);
    fn on_recorded(&self, unit: &UnitKey, outcome: RecordOutcome);
    fn on_scoring_error(&self, error: &ScoringError);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_plan(&self, _: &RenderPlan) {}
    fn on_recorded(&self, _: &UnitKey, _: RecordOutcome) {}
    fn on_scoring_error(&self, _: &ScoringError) {}
}

type Scoring = BoxFuture<'static, (ScoreRequest, Result<ComparisonResult, ScoringError>)>;

/// Owns a [`Session`] while it is live.
pub struct SessionDriver {
    session: Session,
    scorer: Arc<dyn ScoringClient>,
    weakness: Arc<dyn WeaknessLookup + Send + Sync>,
    observer: Arc<dyn SessionObserver>,
}

impl SessionDriver {
    pub fn new(session: Session, scorer: Arc<dyn ScoringClient>) -> Self {
        Self {
            session,
            scorer,
            weakness: Arc::new(NoHistory),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_weakness(mut self, weakness: Arc<dyn WeaknessLookup + Send + Sync>) -> Self {
        self.weakness = weakness;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run until [`DriverEvent::Finish`] arrives (or every sender is dropped)
    /// and all in-flight scoring has settled, then hand back the session.
    pub async fn run(mut self, mut events: mpsc::Receiver<DriverEvent>) -> Session {
        let mut in_flight: FuturesUnordered<Scoring> = FuturesUnordered::new();
        let mut accepting = true;

        tracing::info!(scorer = self.scorer.name(), "session driver started");
        self.emit_plan();

        loop {
            tokio::select! {
                event = events.recv(), if accepting => match event {
                    Some(DriverEvent::Finish) | None => {
                        tracing::debug!(pending = in_flight.len(), "intake closed, draining");
                        accepting = false;
                    }
                    Some(event) => self.handle(event, &mut in_flight),
                },
                Some((request, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.settle(request, outcome);
                }
                else => break,
            }
        }

        tracing::info!(
            results = self.session.accumulator().len(),
            "session driver finished"
        );
        self.session
    }

    fn handle(&mut self, event: DriverEvent, in_flight: &mut FuturesUnordered<Scoring>) {
        let event = match event {
            DriverEvent::Recited { unit, transcript } => {
                self.start_scoring(unit, transcript, in_flight);
                return;
            }
            DriverEvent::Hide(action) => SessionEvent::Hide(action),
            DriverEvent::Signal(signal) => SessionEvent::Signal(signal),
            DriverEvent::Next => SessionEvent::Next,
            DriverEvent::Previous => SessionEvent::Previous,
            DriverEvent::Seek(key) => SessionEvent::Seek(key),
            DriverEvent::Finish => return,
        };
        self.session.apply(event);
        self.emit_plan();
    }

    fn start_scoring(
        &mut self,
        unit: UnitKey,
        transcript: String,
        in_flight: &mut FuturesUnordered<Scoring>,
    ) {
        let Some(request) = self.session.score_request(unit, transcript) else {
            tracing::warn!(%unit, "recitation for a unit outside the passage, ignoring");
            return;
        };
        tracing::debug!(%unit, sequence = request.sequence, "scoring request started");
        let scorer = Arc::clone(&self.scorer);
        in_flight.push(
            async move {
                let outcome = scorer.score(&request).await;
                (request, outcome)
            }
            .boxed(),
        );
    }

    fn settle(&mut self, request: ScoreRequest, outcome: Result<ComparisonResult, ScoringError>) {
        match outcome {
            Ok(mut result) => {
                result.sequence = request.sequence;
                let applied = self.session.apply(SessionEvent::Scored {
                    unit: request.unit,
                    result,
                });
                if let Applied::Recorded(outcome) = applied {
                    self.observer.on_recorded(&request.unit, outcome);
                }
                self.emit_plan();
            }
            Err(e) => {
                tracing::warn!(
                    unit = %request.unit,
                    sequence = request.sequence,
                    transient = e.is_transient(),
                    "scoring failed: {e}"
                );
                self.observer.on_scoring_error(&e);
            }
        }
    }

    fn emit_plan(&self) {
        if let Some(plan) = self.session.render(self.weakness.as_ref()) {
            self.observer.on_plan(&plan);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::mock::{align, MockScorer};
    use crate::model::{Passage, Unit, UnitRange, WordStatus};
    use crate::policy::{HideMode, SessionHideConfig};

    #[derive(Default)]
    struct Recorder {
        plans: Mutex<Vec<RenderPlan>>,
        recorded: Mutex<Vec<(UnitKey, RecordOutcome)>>,
        errors: Mutex<Vec<UnitKey>>,
    }

    impl SessionObserver for Recorder {
        fn on_plan(&self, plan: &RenderPlan) {
            self.plans.lock().unwrap().push(plan.clone());
        }
        fn on_recorded(&self, unit: &UnitKey, outcome: RecordOutcome) {
            self.recorded.lock().unwrap().push((*unit, outcome));
        }
        fn on_scoring_error(&self, error: &ScoringError) {
            self.errors.lock().unwrap().push(error.unit());
        }
    }

    /// Scorer whose latency depends on the request's sequence number.
    struct BySequence(HashMap<u64, Duration>);

    #[async_trait]
    impl ScoringClient for BySequence {
        fn name(&self) -> &str {
            "by-sequence"
        }

        async fn score(&self, request: &ScoreRequest) -> Result<ComparisonResult, ScoringError> {
            if let Some(delay) = self.0.get(&request.sequence) {
                tokio::time::sleep(*delay).await;
            }
            Ok(ComparisonResult::from_mistakes(
                request.sequence,
                request.reference.len(),
                align(&request.reference, &request.transcript),
            ))
        }
    }

    fn session() -> Session {
        let units = vec![
            Unit::from_texts(UnitKey::new(1, 1), &["بِسْمِ", "ٱللَّهِ"]),
            Unit::from_texts(UnitKey::new(1, 2), &["ٱلْحَمْدُ", "لِلَّهِ"]),
        ];
        let pages = units.iter().map(|u| (u.key, 1)).collect::<BTreeMap<_, _>>();
        let passage = Passage {
            id: "t".into(),
            name: "T".into(),
            units,
            pages,
        };
        let range = UnitRange::new(UnitKey::new(1, 1), UnitKey::new(1, 2));
        Session::new(passage, SessionHideConfig::new(HideMode::FullHide, range))
    }

    #[tokio::test(start_paused = true)]
    async fn slow_result_lands_on_its_unit_after_navigation() {
        let first = UnitKey::new(1, 1);
        let scorer = Arc::new(MockScorer::new().with_delay(first, Duration::from_secs(2)));
        let recorder = Arc::new(Recorder::default());
        let driver = SessionDriver::new(session(), scorer.clone()).with_observer(recorder.clone());

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(driver.run(rx));
        tx.send(DriverEvent::Recited {
            unit: first,
            transcript: "بسم الكتاب".into(),
        })
        .await
        .unwrap();
        tx.send(DriverEvent::Next).await.unwrap();
        tx.send(DriverEvent::Finish).await.unwrap();

        let session = handle.await.unwrap();
        assert_eq!(session.current(), Some(UnitKey::new(1, 2)));
        let stored = session.accumulator().get(&first).expect("result for 1:1");
        assert_eq!(stored.statuses.len(), 2);
        assert!(session.accumulator().get(&UnitKey::new(1, 2)).is_none());
        assert_eq!(scorer.call_count(), 1);
        assert_eq!(
            recorder.recorded.lock().unwrap().as_slice(),
            &[(first, RecordOutcome::Stored)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn newer_attempt_wins_when_older_settles_last() {
        let unit = UnitKey::new(1, 1);
        let scorer = Arc::new(BySequence(HashMap::from([(1, Duration::from_secs(3))])));
        let recorder = Arc::new(Recorder::default());
        let driver = SessionDriver::new(session(), scorer).with_observer(recorder.clone());

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(driver.run(rx));
        for transcript in ["بسم الكتاب", "بسم الله"] {
            tx.send(DriverEvent::Recited {
                unit,
                transcript: transcript.into(),
            })
            .await
            .unwrap();
        }
        tx.send(DriverEvent::Finish).await.unwrap();

        let session = handle.await.unwrap();
        assert_eq!(
            recorder.recorded.lock().unwrap().as_slice(),
            &[
                (unit, RecordOutcome::Stored),
                (unit, RecordOutcome::Superseded { current_sequence: 2 }),
            ]
        );
        let stored = session.accumulator().get(&unit).expect("result for 1:1");
        assert_eq!(stored.sequence, 2);
        assert_eq!(stored.statuses, vec![WordStatus::Correct; 2]);

        let plans = recorder.plans.lock().unwrap();
        let last = plans.last().unwrap();
        assert!(last.mistakes.is_empty());
        assert_eq!(last.correct.len(), 2);
    }

    #[tokio::test]
    async fn scoring_failure_is_not_fatal() {
        let unit = UnitKey::new(1, 1);
        let scorer = Arc::new(MockScorer::new().failing(unit, "offline"));
        let recorder = Arc::new(Recorder::default());
        let driver = SessionDriver::new(session(), scorer).with_observer(recorder.clone());

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(driver.run(rx));
        tx.send(DriverEvent::Recited {
            unit,
            transcript: "بسم الله".into(),
        })
        .await
        .unwrap();
        tx.send(DriverEvent::Hide(HideAction::RevealWord("1:1:1".into())))
            .await
            .unwrap();
        drop(tx);

        let session = handle.await.unwrap();
        assert!(session.accumulator().is_empty());
        assert_eq!(recorder.errors.lock().unwrap().as_slice(), &[unit]);
        let plans = recorder.plans.lock().unwrap();
        assert!(plans.len() >= 2);
        assert!(plans.last().unwrap().revealed.contains("1:1:1"));
    }

    #[tokio::test]
    async fn unknown_unit_recitation_is_ignored() {
        let scorer = Arc::new(MockScorer::new());
        let driver = SessionDriver::new(session(), scorer.clone());
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(driver.run(rx));
        tx.send(DriverEvent::Recited {
            unit: UnitKey::new(9, 9),
            transcript: "x".into(),
        })
        .await
        .unwrap();
        tx.send(DriverEvent::Finish).await.unwrap();
        let session = handle.await.unwrap();
        assert!(session.accumulator().is_empty());
        assert_eq!(scorer.call_count(), 0);
    }
}
