//! The scenario player.
//!
//! A playback is accepted or declined synchronously: the single-flight lock is
//! taken before the first `.await`, so a second request arriving before the
//! first message has even been emitted is declined. For the `async` entry
//! points that moment is the first poll of the returned future, not the call;
//! [`Player::spawn_play`] decides at call time. Once accepted, messages
//! are emitted strictly in authored order. For each one the player waits out
//! its delay, resolves the text against the parameter store *as it is at that
//! moment*, and appends the entry to the sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use linesim_core::{
    DEFAULT_TIME_LABEL, EntryId, ParameterStore, PlaybackState, Scenario, ScenarioId,
    TranscriptEntry,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::guard::{PlaybackGuard, PlaybackLock};
use crate::pacer::{PaceOutcome, Pacer, TokioPacer};
use crate::transcript::TranscriptSink;

/// Default channel capacity for playback notifications.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Result of a play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Every message was emitted.
    Completed {
        /// Number of entries appended.
        emitted: usize,
    },
    /// The playback was cancelled part-way.
    Cancelled {
        /// Number of entries appended before cancellation.
        emitted: usize,
    },
    /// Another playback was in flight; nothing happened.
    Declined,
}

impl PlayOutcome {
    /// Returns `true` unless the request was declined.
    pub fn was_accepted(self) -> bool {
        !matches!(self, Self::Declined)
    }
}

/// Lifecycle notification published by a [`Player`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A playback was accepted and is now in flight.
    Started {
        /// Scenario being played.
        scenario_id: ScenarioId,
        /// Per-run correlation id.
        playback_id: Uuid,
    },
    /// A playback ended.
    ///
    /// Published before the single-flight lock is released, so a subscriber
    /// always sees a run's `Finished` before the next run's `Started`.
    Finished {
        /// Scenario that was played.
        scenario_id: ScenarioId,
        /// Per-run correlation id.
        playback_id: Uuid,
        /// How it ended.
        outcome: PlayOutcome,
    },
}

/// State of one accepted playback.
///
/// Dropping it clears the published cancel token and then releases the
/// single-flight lock, whichever way the playback ends.
struct Run {
    cancel: CancellationToken,
    playback_id: Uuid,
    cancel_slot: Arc<Mutex<Option<CancellationToken>>>,
    _guard: PlaybackGuard,
}

impl Drop for Run {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.cancel_slot.lock() {
            slot.take();
        }
    }
}

/// Replays scenarios into a transcript sink, one at a time.
///
/// Cloning creates a new handle to the same player: clones share the
/// single-flight lock, the entry id counter and the sink.
#[derive(Clone)]
pub struct Player {
    lock: PlaybackLock,
    sink: Arc<dyn TranscriptSink>,
    pacer: Arc<dyn Pacer>,
    next_entry_id: Arc<AtomicU64>,
    current_cancel: Arc<Mutex<Option<CancellationToken>>>,
    events: broadcast::Sender<PlaybackEvent>,
    default_time_label: Arc<str>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state())
            .field("next_entry_id", &self.next_entry_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Create a player that paces with real tokio timers.
    pub fn new(sink: Arc<dyn TranscriptSink>) -> Self {
        Self::with_pacer(sink, Arc::new(TokioPacer))
    }

    /// Create a player with a custom pacer.
    pub fn with_pacer(sink: Arc<dyn TranscriptSink>, pacer: Arc<dyn Pacer>) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            lock: PlaybackLock::new(),
            sink,
            pacer,
            next_entry_id: Arc::new(AtomicU64::new(1)),
            current_cancel: Arc::new(Mutex::new(None)),
            events,
            default_time_label: Arc::from(DEFAULT_TIME_LABEL),
        }
    }

    /// Label used for messages that carry no time label of their own.
    #[must_use]
    pub fn with_default_time_label(mut self, label: impl Into<String>) -> Self {
        self.default_time_label = Arc::from(label.into());
        self
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.lock.state()
    }

    /// Subscribe to playback lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Play `scenario` to completion.
    ///
    /// Returns [`PlayOutcome::Declined`] without side effects if another
    /// playback is in flight. The decision is made when the returned future
    /// is first polled; a future that is never polled neither plays nor holds
    /// the lock. Use [`Player::spawn_play`] to decide at call time.
    pub async fn play(&self, scenario: &Scenario, params: &ParameterStore) -> PlayOutcome {
        self.play_with_cancel(scenario, params, CancellationToken::new())
            .await
    }

    /// Play `scenario`, stopping early if `cancel` fires.
    ///
    /// Like [`Player::play`], accepts or declines on first poll.
    pub async fn play_with_cancel(
        &self,
        scenario: &Scenario,
        params: &ParameterStore,
        cancel: CancellationToken,
    ) -> PlayOutcome {
        let Some(run) = self.begin(&scenario.id, cancel) else {
            return PlayOutcome::Declined;
        };
        self.drive(run, scenario, params).await
    }

    /// Accept or decline synchronously, then run the playback on a tokio task.
    ///
    /// Returns `None` if another playback is in flight.
    pub fn spawn_play(
        &self,
        scenario: Arc<Scenario>,
        params: ParameterStore,
    ) -> Option<JoinHandle<PlayOutcome>> {
        let run = self.begin(&scenario.id, CancellationToken::new())?;
        let player = self.clone();
        Some(tokio::spawn(async move {
            player.drive(run, &scenario, &params).await
        }))
    }

    /// Cancel the in-flight playback, if any.
    ///
    /// Returns `true` if a playback was signalled.
    pub fn stop(&self) -> bool {
        let token = self
            .current_cancel
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned());
        match token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            },
            _ => false,
        }
    }

    fn begin(&self, scenario_id: &ScenarioId, cancel: CancellationToken) -> Option<Run> {
        let Some(guard) = self.lock.try_acquire() else {
            debug!(scenario = %scenario_id, "playback already in flight; request declined");
            return None;
        };
        if let Ok(mut slot) = self.current_cancel.lock() {
            *slot = Some(cancel.clone());
        }

        let playback_id = Uuid::new_v4();
        let _ = self.events.send(PlaybackEvent::Started {
            scenario_id: scenario_id.clone(),
            playback_id,
        });
        Some(Run {
            cancel,
            playback_id,
            cancel_slot: Arc::clone(&self.current_cancel),
            _guard: guard,
        })
    }

    async fn drive(&self, run: Run, scenario: &Scenario, params: &ParameterStore) -> PlayOutcome {
        let span = info_span!(
            "playback",
            playback_id = %run.playback_id,
            scenario = %scenario.id
        );
        let playback_id = run.playback_id;
        let outcome = self
            .emit_all(&run.cancel, scenario, params)
            .instrument(span)
            .await;

        let _ = self.events.send(PlaybackEvent::Finished {
            scenario_id: scenario.id.clone(),
            playback_id,
            outcome,
        });
        drop(run);
        outcome
    }

    async fn emit_all(
        &self,
        cancel: &CancellationToken,
        scenario: &Scenario,
        params: &ParameterStore,
    ) -> PlayOutcome {
        info!(
            label = %scenario.label,
            messages = scenario.messages.len(),
            "playback started"
        );

        let mut emitted: usize = 0;
        for (index, message) in scenario.messages.iter().enumerate() {
            if cancel.is_cancelled() {
                return cancelled(emitted);
            }
            if message.delay_ms > 0
                && self
                    .pacer
                    .pause(Duration::from_millis(message.delay_ms), cancel)
                    .await
                    == PaceOutcome::Cancelled
            {
                return cancelled(emitted);
            }

            let text = params.resolve(message.text.as_deref()).await;
            if cancel.is_cancelled() {
                return cancelled(emitted);
            }

            let entry = TranscriptEntry {
                id: EntryId(self.next_entry_id.fetch_add(1, Ordering::Relaxed)),
                text,
                time_label: message.time_label_or(&self.default_time_label).to_owned(),
                scenario_id: scenario.id.clone(),
                emitted_at: Utc::now(),
            };
            debug!(index, entry_id = %entry.id, delay_ms = message.delay_ms, "message emitted");
            self.sink.append(entry).await;
            emitted = emitted.saturating_add(1);
        }

        info!(emitted, "playback finished");
        PlayOutcome::Completed { emitted }
    }
}

fn cancelled(emitted: usize) -> PlayOutcome {
    info!(emitted, "playback cancelled");
    PlayOutcome::Cancelled { emitted }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use linesim_core::{MessageTemplate, ParameterSet};
    use tokio::time::Instant;

    use super::*;
    use crate::transcript::Transcript;

    /// Sink that records the (paused) tokio instant of every append.
    #[derive(Default)]
    struct TimedSink {
        appended: StdMutex<Vec<(Instant, TranscriptEntry)>>,
    }

    impl TimedSink {
        fn texts(&self) -> Vec<String> {
            self.appended
                .lock()
                .unwrap()
                .iter()
                .map(|(_, e)| e.text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl TranscriptSink for TimedSink {
        async fn append(&self, entry: TranscriptEntry) {
            self.appended.lock().unwrap().push((Instant::now(), entry));
        }
    }

    /// Pacer that records requested delays and returns immediately.
    #[derive(Default)]
    struct CountingPacer {
        requested: StdMutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> PaceOutcome {
            self.requested.lock().unwrap().push(delay);
            if cancel.is_cancelled() {
                PaceOutcome::Cancelled
            } else {
                PaceOutcome::Elapsed
            }
        }
    }

    fn params() -> ParameterStore {
        ParameterStore::new(
            ParameterSet::new()
                .with("user_name", "James")
                .with("shop_name", "Grand Hotel"),
        )
    }

    fn two_step() -> Scenario {
        Scenario::new("s1", "Two step")
            .with_message(MessageTemplate::new("A").with_delay_ms(100))
            .with_message(MessageTemplate::new("B").with_delay_ms(50))
    }

    #[tokio::test(start_paused = true)]
    async fn emits_in_order_with_cumulative_delays() {
        let sink = Arc::new(TimedSink::default());
        let player = Player::new(sink.clone());

        let start = Instant::now();
        let outcome = player.play(&two_step(), &params()).await;

        assert_eq!(outcome, PlayOutcome::Completed { emitted: 2 });
        let appended = sink.appended.lock().unwrap();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0].1.text, "A");
        assert_eq!(appended[1].1.text, "B");
        assert!(appended[0].0.duration_since(start) >= Duration::from_millis(100));
        assert!(appended[1].0.duration_since(start) >= Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn second_play_is_declined_while_playing() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        let scenario = Arc::new(two_step());

        let first = player.spawn_play(Arc::clone(&scenario), params());
        assert!(first.is_some());
        assert_eq!(player.state(), PlaybackState::Playing);

        let other = Scenario::new("s2", "Other").with_message(MessageTemplate::new("X"));
        assert_eq!(player.play(&other, &params()).await, PlayOutcome::Declined);
        assert!(player.spawn_play(Arc::new(other), params()).is_none());

        let outcome = first.unwrap().await.unwrap();
        assert_eq!(outcome, PlayOutcome::Completed { emitted: 2 });
        assert_eq!(transcript.texts().await, vec!["A", "B"]);
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn parameter_edits_apply_to_pending_messages_only() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        let store = params();
        let scenario = Arc::new(
            Scenario::new("greet", "Greeting")
                .with_message(MessageTemplate::new("Hi {user_name}"))
                .with_message(MessageTemplate::new("Bye {user_name}").with_delay_ms(1_000)),
        );

        let mut rx = transcript.subscribe();
        let handle = player.spawn_play(scenario, store.clone()).unwrap();

        // Wait for the first message, then edit before the second is due.
        let _ = rx.recv().await.unwrap();
        store.set("user_name", "Alice").await.unwrap();

        handle.await.unwrap();
        assert_eq!(transcript.texts().await, vec!["Hi James", "Bye Alice"]);
    }

    #[tokio::test]
    async fn empty_scenario_completes_and_returns_to_idle() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));

        let outcome = player.play(&Scenario::new("empty", "Empty"), &params()).await;

        assert_eq!(outcome, PlayOutcome::Completed { emitted: 0 });
        assert_eq!(player.state(), PlaybackState::Idle);
        assert!(transcript.is_empty().await);
        assert!(player.play(&two_step(), &params()).await.was_accepted());
    }

    #[tokio::test]
    async fn zero_delay_skips_the_pacer() {
        let pacer = Arc::new(CountingPacer::default());
        let player = Player::with_pacer(Arc::new(TimedSink::default()), pacer.clone());
        let scenario = Scenario::new("s", "S")
            .with_message(MessageTemplate::new("now"))
            .with_message(MessageTemplate::new("later").with_delay_ms(20))
            .with_message(MessageTemplate::new("now again"));

        player.play(&scenario, &params()).await;

        assert_eq!(
            *pacer.requested.lock().unwrap(),
            vec![Duration::from_millis(20)]
        );
    }

    #[tokio::test]
    async fn entries_get_unique_increasing_ids_and_labels() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        let scenario = Scenario::new("s", "S")
            .with_message(MessageTemplate::new("a").with_time_label("09:00"))
            .with_message(MessageTemplate::new("b"));

        player.play(&scenario, &params()).await;
        player.play(&scenario, &params()).await;

        let entries = transcript.entries().await;
        let ids: Vec<u64> = entries.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(entries[0].time_label, "09:00");
        assert_eq!(entries[1].time_label, "Just now");
        assert_eq!(entries[0].scenario_id, ScenarioId::new("s"));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_during_playback_keeps_state_and_later_messages() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        let mut rx = transcript.subscribe();

        let handle = player.spawn_play(Arc::new(two_step()), params()).unwrap();
        let _ = rx.recv().await.unwrap();

        assert_eq!(transcript.clear().await, 1);
        assert_eq!(player.state(), PlaybackState::Playing);

        handle.await.unwrap();
        assert_eq!(transcript.texts().await, vec!["B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_and_releases_lock() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        let scenario = Scenario::new("long", "Long")
            .with_message(MessageTemplate::new("first"))
            .with_message(MessageTemplate::new("never").with_delay_ms(60_000));

        let mut rx = transcript.subscribe();
        let handle = player.spawn_play(Arc::new(scenario), params()).unwrap();
        let _ = rx.recv().await.unwrap();

        assert!(player.stop());
        let outcome = handle.await.unwrap();

        assert_eq!(outcome, PlayOutcome::Cancelled { emitted: 1 });
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(transcript.texts().await, vec!["first"]);
        assert!(!player.stop());
    }

    #[tokio::test]
    async fn pre_cancelled_token_emits_nothing() {
        let transcript = Transcript::new();
        let player = Player::new(Arc::new(transcript.clone()));
        let token = CancellationToken::new();
        token.cancel();

        let outcome = player.play_with_cancel(&two_step(), &params(), token).await;

        assert_eq!(outcome, PlayOutcome::Cancelled { emitted: 0 });
        assert!(transcript.is_empty().await);
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn play_decides_on_first_poll() {
        let player = Player::new(Arc::new(Transcript::new()));
        let scenario = two_step();
        let store = params();

        let pending = player.play(&scenario, &store);
        assert_eq!(player.state(), PlaybackState::Idle);

        let spawned = player.spawn_play(Arc::new(two_step()), params()).unwrap();
        assert_eq!(pending.await, PlayOutcome::Declined);
        assert_eq!(spawned.await.unwrap(), PlayOutcome::Completed { emitted: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_playback_future_releases_lock() {
        let player = Player::new(Arc::new(Transcript::new()));
        let scenario = two_step();
        let store = params();

        {
            let fut = player.play(&scenario, &store);
            tokio::pin!(fut);
            let _ = tokio::time::timeout(Duration::from_millis(10), &mut fut).await;
            assert_eq!(player.state(), PlaybackState::Playing);
        }

        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn lifecycle_events_bracket_the_run() {
        let player = Player::new(Arc::new(Transcript::new()));
        let mut rx = player.subscribe();

        player.play(&two_step(), &params()).await;

        let started = rx.recv().await.unwrap();
        let finished = rx.recv().await.unwrap();
        let PlaybackEvent::Started { playback_id, .. } = started else {
            panic!("expected start event, got {started:?}");
        };
        assert_eq!(
            finished,
            PlaybackEvent::Finished {
                scenario_id: ScenarioId::new("s1"),
                playback_id,
                outcome: PlayOutcome::Completed { emitted: 2 },
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn finished_is_published_before_the_next_start() {
        fn describe(event: &PlaybackEvent) -> String {
            match event {
                PlaybackEvent::Started { scenario_id, .. } => format!("start {scenario_id}"),
                PlaybackEvent::Finished { scenario_id, .. } => format!("finish {scenario_id}"),
            }
        }

        for _ in 0..20 {
            let player = Player::new(Arc::new(Transcript::new()));
            let mut rx = player.subscribe();
            let one = Arc::new(Scenario::new("one", "One").with_message(MessageTemplate::new("a")));
            let first = player.spawn_play(one, params()).unwrap();

            // Grab the lock the moment it is released.
            let racer = player.clone();
            let second = tokio::spawn(async move {
                loop {
                    let two = Arc::new(Scenario::new("two", "Two"));
                    if let Some(handle) = racer.spawn_play(two, params()) {
                        return handle.await.unwrap();
                    }
                    tokio::task::yield_now().await;
                }
            });
            first.await.unwrap();
            second.await.unwrap();

            let mut seen = Vec::new();
            while let Ok(event) = rx.try_recv() {
                seen.push(describe(&event));
            }
            assert_eq!(seen, vec!["start one", "finish one", "start two", "finish two"]);
        }
    }

    #[tokio::test]
    async fn configured_default_time_label() {
        let transcript = Transcript::new();
        let player =
            Player::new(Arc::new(transcript.clone())).with_default_time_label("剛剛");
        let scenario = Scenario::new("s", "S")
            .with_message(MessageTemplate::new("a"))
            .with_message(MessageTemplate::new("b").with_time_label("11:30"));

        player.play(&scenario, &params()).await;

        let labels: Vec<String> = transcript
            .entries()
            .await
            .into_iter()
            .map(|e| e.time_label)
            .collect();
        assert_eq!(labels, vec!["剛剛", "11:30"]);
    }

    #[tokio::test]
    async fn missing_text_emits_empty_message() {
        let sink = Arc::new(TimedSink::default());
        let player = Player::new(sink.clone());
        let scenario = Scenario::new("s", "S").with_message(MessageTemplate::default());

        player.play(&scenario, &params()).await;

        assert_eq!(sink.texts(), vec![String::new()]);
    }
}
