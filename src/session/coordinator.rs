use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{interval, Duration, MissedTickBehavior};
use uuid::Uuid;

use crate::session::gesture::GestureDebouncer;
use crate::session::queue::{AdvanceTrigger, MediaQueue, QueueUpdate};
use crate::session::resolver;
use crate::session::sampler::ExpressionSampler;
use crate::session::state_machine::SessionStateMachine;
use crate::session::timers::SessionTimers;
use crate::session::types::{PhaseEvent, SessionIn, SessionOut};
use crate::shared::config::SessionTuning;
use crate::shared::entities::{FrameObservation, MoodDecision, SessionPhase};
use crate::shared::ports::{
    DetectorPort, FrameSourcePort, MediaSearchPort, PlaybackPort, SessionObserverPort,
    SessionSnapshot,
};

const OBSERVER_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// External capabilities the session consumes, injected at spawn.
pub struct SessionPorts {
    pub frames: Arc<dyn FrameSourcePort>,
    pub detector: Arc<dyn DetectorPort>,
    pub search: Arc<dyn MediaSearchPort>,
    pub playback: Arc<dyn PlaybackPort>,
    pub observer: Arc<dyn SessionObserverPort>,
}

#[derive(Clone)]
pub struct SessionHandle {
    pub tx_in: UnboundedSender<SessionIn>,
}

impl SessionHandle {
    /// External skip signal, same semantics as an accepted gesture.
    pub fn skip(&self) {
        let _ = self.tx_in.send(SessionIn::SkipRequested);
    }

    /// Natural end-of-track notification from the playback surface.
    pub fn track_ended(&self) {
        let _ = self.tx_in.send(SessionIn::TrackEnded);
    }

    pub fn shutdown(&self) {
        let _ = self.tx_in.send(SessionIn::Shutdown);
    }
}

/// Single owning task for all session state. Every mutation of the sample
/// buffer, phase, track queue and cursor happens inside `run`, so no
/// locking is needed anywhere in the engine.
pub struct SessionCoordinator {
    session_id: String,
    tuning: SessionTuning,
    state_machine: SessionStateMachine,
    sampler: ExpressionSampler,
    gesture: GestureDebouncer,
    queue: MediaQueue,
    timers: SessionTimers,
    frames: Arc<dyn FrameSourcePort>,
    detector: Arc<dyn DetectorPort>,
    playback: Arc<dyn PlaybackPort>,
    observer: Arc<dyn SessionObserverPort>,
    session_out_tx: UnboundedSender<SessionOut>,
    tx_in: UnboundedSender<SessionIn>,
    last_decision: Option<MoodDecision>,
    models_loaded: bool,
}

impl SessionCoordinator {
    pub fn spawn(
        tuning: SessionTuning,
        ports: SessionPorts,
        session_out_tx: UnboundedSender<SessionOut>,
    ) -> SessionHandle {
        let (tx_in, rx_in) = tokio::sync::mpsc::unbounded_channel();
        let session_id = Uuid::new_v4().to_string();
        log::info!("[session {}] spawned", session_id);
        let mut s = Self {
            session_id,
            gesture: GestureDebouncer::new(tuning.gesture_cooldown),
            queue: MediaQueue::new(ports.search, tuning.skip_debounce),
            tuning,
            state_machine: SessionStateMachine::new(),
            sampler: ExpressionSampler::new(),
            timers: SessionTimers::new(),
            frames: ports.frames,
            detector: ports.detector,
            playback: ports.playback,
            observer: ports.observer,
            session_out_tx,
            tx_in: tx_in.clone(),
            last_decision: None,
            models_loaded: false,
        };
        tokio::spawn(async move {
            s.run(rx_in).await;
        });
        SessionHandle { tx_in }
    }

    async fn run(&mut self, mut rx: UnboundedReceiver<SessionIn>) {
        match self.detector.load_models().await {
            Ok(()) => {
                let _ = self.tx_in.send(SessionIn::ModelsReady);
            }
            Err(err) => {
                let _ = self.tx_in.send(SessionIn::ModelLoadFailed {
                    reason: err.to_string(),
                });
            }
        }

        let mut detect_tick = interval(self.tuning.detection_interval);
        // Overlong detector calls make the next poll drop, never queue up:
        // at most one classification is in flight at any time.
        detect_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut observer_tick = interval(OBSERVER_TICK_INTERVAL);
        observer_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                maybe_ev = rx.recv() => {
                    let Some(ev) = maybe_ev else { break; };
                    if !self.handle_event(ev).await {
                        break;
                    }
                }
                _ = detect_tick.tick(), if self.polling_active() => {
                    self.poll_detector().await;
                }
                _ = observer_tick.tick() => {
                    self.notify_observer();
                }
            }
        }

        self.teardown();
    }

    fn polling_active(&self) -> bool {
        self.models_loaded && self.state_machine.phase() != SessionPhase::Idle
    }

    /// Returns false when the session should shut down.
    async fn handle_event(&mut self, ev: SessionIn) -> bool {
        match ev {
            SessionIn::ModelsReady => {
                log::info!("[session {}] detector models ready", self.session_id);
                self.models_loaded = true;
                self.apply_phase_event(&PhaseEvent::ModelsReady);
            }
            SessionIn::ModelLoadFailed { reason } => {
                log::error!(
                    "[session {}] detector model load failed: {}",
                    self.session_id,
                    reason
                );
                self.models_loaded = false;
                self.apply_phase_event(&PhaseEvent::ModelLoadFailed);
                self.emit(SessionOut::ModelLoadFailed { reason });
            }
            SessionIn::Observation(observation) => {
                self.handle_observation(observation, Instant::now()).await;
            }
            SessionIn::WindowElapsed => self.handle_window_elapsed().await,
            SessionIn::SkipRequested => {
                self.trigger_reanalysis(PhaseEvent::SkipRequested, Instant::now())
                    .await;
            }
            SessionIn::TrackEnded => {
                self.advance_queue(AdvanceTrigger::TrackEnded, Instant::now())
                    .await;
            }
            SessionIn::Shutdown => return false,
        }
        true
    }

    async fn poll_detector(&mut self) {
        let frame = match self.frames.capture().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(err) => {
                log::debug!(
                    "[session {}] frame capture unavailable: {:#}",
                    self.session_id,
                    err
                );
                return;
            }
        };
        // Classification is awaited here, inside the poll arm, so at most
        // one call is ever in flight; the result rejoins the event stream
        // like every other input.
        match self.detector.detect_frame(frame).await {
            Ok(Some(observation)) => {
                let _ = self.tx_in.send(SessionIn::Observation(observation));
            }
            // No face in frame; nothing to record.
            Ok(None) => {}
            Err(err) => {
                log::warn!(
                    "[session {}] detection failed, frame skipped: {}",
                    self.session_id,
                    err
                );
            }
        }
    }

    async fn handle_observation(&mut self, observation: FrameObservation, now: Instant) {
        match self.state_machine.phase() {
            SessionPhase::Analyzing => {
                let sample = observation.sample(now);
                self.sampler.record(SessionPhase::Analyzing, sample);
                log::debug!(
                    "[session {}] sampled {} ({:.2}), {} in window",
                    self.session_id,
                    sample.mood,
                    sample.intensity,
                    self.sampler.len()
                );
            }
            SessionPhase::WaitingForGesture => {
                if self.gesture.evaluate(
                    &observation.landmarks,
                    SessionPhase::WaitingForGesture,
                    now,
                ) {
                    log::info!("[session {}] gesture accepted", self.session_id);
                    self.trigger_reanalysis(PhaseEvent::GestureAccepted, now).await;
                }
            }
            SessionPhase::Idle => {}
        }
    }

    async fn handle_window_elapsed(&mut self) {
        if self.state_machine.phase() != SessionPhase::Analyzing {
            return;
        }
        let decision = resolver::resolve(self.sampler.samples());
        log::info!(
            "[session {}] window closed after {} samples: {} ({:.2})",
            self.session_id,
            self.sampler.len(),
            decision.mood,
            decision.intensity
        );
        self.apply_phase_event(&PhaseEvent::WindowElapsed);
        self.last_decision = Some(decision);
        self.emit(SessionOut::MoodResolved { decision });

        match self.queue.on_mood_decision(&decision).await {
            Ok(QueueUpdate::NowPlaying(track)) => {
                self.playback.play(&track);
                self.emit(SessionOut::NowPlaying { track });
            }
            Ok(QueueUpdate::Empty(mood)) => {
                log::warn!("[session {}] no tracks matched {}", self.session_id, mood);
                self.playback.stop();
                self.emit(SessionOut::EmptyResultSet { mood });
            }
            Err(err) => {
                log::error!("[session {}] track search failed: {}", self.session_id, err);
                self.emit(SessionOut::SearchFailed {
                    mood: decision.mood,
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Gesture/skip path: advance the queue (debounced at the queue layer)
    /// and start a full re-analysis, not just a song change. Ignored
    /// outside the waiting phase, including during the initial analysis.
    async fn trigger_reanalysis(&mut self, event: PhaseEvent, now: Instant) {
        if self.state_machine.phase() != SessionPhase::WaitingForGesture {
            log::debug!(
                "[session {}] skip ignored in phase {:?}",
                self.session_id,
                self.state_machine.phase()
            );
            return;
        }
        self.advance_queue(AdvanceTrigger::Skip, now).await;
        self.apply_phase_event(&event);
    }

    async fn advance_queue(&mut self, trigger: AdvanceTrigger, now: Instant) {
        let mood = self.queue.mood();
        match self.queue.advance(trigger, now).await {
            Ok(Some(QueueUpdate::NowPlaying(track))) => {
                self.playback.play(&track);
                self.emit(SessionOut::NowPlaying { track });
            }
            Ok(Some(QueueUpdate::Empty(mood))) => {
                log::warn!("[session {}] no tracks matched {}", self.session_id, mood);
                self.playback.stop();
                self.emit(SessionOut::EmptyResultSet { mood });
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("[session {}] track search failed: {}", self.session_id, err);
                if let Some(mood) = mood {
                    self.emit(SessionOut::SearchFailed {
                        mood,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    fn apply_phase_event(&mut self, event: &PhaseEvent) -> bool {
        let commands = self.state_machine.process_event(event);
        if commands.is_empty() {
            return false;
        }
        self.state_machine.apply_commands(&commands);
        let phase = self.state_machine.phase();
        log::info!("[session {}] phase -> {:?}", self.session_id, phase);
        match phase {
            SessionPhase::Analyzing => self.enter_analyzing(),
            SessionPhase::WaitingForGesture => self.enter_waiting(),
            SessionPhase::Idle => self.enter_idle(),
        }
        true
    }

    fn enter_analyzing(&mut self) {
        self.sampler.clear();
        self.timers
            .start_window(self.tx_in.clone(), self.tuning.analysis_window);
    }

    fn enter_waiting(&mut self) {
        self.sampler.clear();
        self.timers.stop_window();
        self.gesture.reset();
    }

    fn enter_idle(&mut self) {
        self.sampler.clear();
        self.timers.stop_window();
        self.playback.stop();
    }

    fn notify_observer(&self) {
        let snapshot = SessionSnapshot {
            phase: self.state_machine.phase(),
            decision: self.last_decision,
            elapsed_secs: self.timers.window_elapsed_secs(),
            now_playing: self.queue.current().cloned(),
        };
        self.observer.on_tick(snapshot);
    }

    fn emit(&self, out: SessionOut) {
        let _ = self.session_out_tx.send(out);
    }

    fn teardown(&mut self) {
        self.timers.stop_window();
        self.playback.stop();
        log::info!("[session {}] torn down", self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::shared::entities::{
        ExpressionScores, Frame, LandmarkSet, Mood, Point, Track,
    };
    use crate::shared::error::{DetectorError, SearchError};
    use crate::shared::ports::observer::NoopObserver;
    use crate::shared::ports::PortFuture;

    struct DummyFrames;

    impl FrameSourcePort for DummyFrames {
        fn capture(&self) -> PortFuture<anyhow::Result<Option<Frame>>> {
            Box::pin(async { Ok(Some(Frame { data: vec![0; 4] })) })
        }
    }

    /// Classifies every frame as the configured mood; raises no hands.
    struct DummyDetector {
        mood: &'static str,
        intensity: f32,
        fail_load: bool,
    }

    fn face_landmarks() -> LandmarkSet {
        let p = |x, y| Point { x, y };
        LandmarkSet::new(
            vec![p(40.0, 100.0), p(60.0, 100.0), p(50.0, 120.0)],
            p(40.0, 100.0),
            p(60.0, 100.0),
            p(50.0, 120.0),
        )
        .expect("valid landmarks")
    }

    impl DetectorPort for DummyDetector {
        fn load_models(&self) -> PortFuture<Result<(), DetectorError>> {
            let fail = self.fail_load;
            Box::pin(async move {
                if fail {
                    Err(DetectorError::ModelLoad("weights missing".to_string()))
                } else {
                    Ok(())
                }
            })
        }

        fn detect_frame(
            &self,
            _frame: Frame,
        ) -> PortFuture<Result<Option<FrameObservation>, DetectorError>> {
            let observation = FrameObservation {
                expressions: ExpressionScores::from_labels([(self.mood, self.intensity)]),
                landmarks: face_landmarks(),
            };
            Box::pin(async move { Ok(Some(observation)) })
        }
    }

    struct ScriptedSearch {
        responses: Mutex<Vec<Result<Vec<Track>, SearchError>>>,
        requested: Mutex<Vec<Mood>>,
    }

    impl MediaSearchPort for ScriptedSearch {
        fn search(&self, mood: Mood) -> PortFuture<Result<Vec<Track>, SearchError>> {
            self.requested.lock().unwrap().push(mood);
            let mut responses = self.responses.lock().unwrap();
            let result = if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            };
            Box::pin(async move { result })
        }
    }

    #[derive(Default)]
    struct RecordingPlayback {
        played: Mutex<Vec<String>>,
    }

    impl PlaybackPort for RecordingPlayback {
        fn play(&self, track: &Track) {
            self.played.lock().unwrap().push(track.id.clone());
        }

        fn stop(&self) {}
    }

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("title-{id}"),
            artist: "artist".to_string(),
        }
    }

    fn tuning() -> SessionTuning {
        SessionTuning {
            analysis_window: Duration::from_secs(10),
            detection_interval: Duration::from_millis(200),
            gesture_cooldown: Duration::from_secs(2),
            skip_debounce: Duration::from_secs(10),
        }
    }

    fn drain(rx: &mut UnboundedReceiver<SessionOut>) -> Vec<SessionOut> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_resolves_mood_plays_and_reanalyzes_on_skip() {
        let search = Arc::new(ScriptedSearch {
            responses: Mutex::new(vec![
                Ok(vec![track("a"), track("b")]),
                Ok(vec![track("c"), track("d")]),
            ]),
            requested: Mutex::new(Vec::new()),
        });
        let playback = Arc::new(RecordingPlayback::default());
        let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = SessionCoordinator::spawn(
            tuning(),
            SessionPorts {
                frames: Arc::new(DummyFrames),
                detector: Arc::new(DummyDetector {
                    mood: "happy",
                    intensity: 0.9,
                    fail_load: false,
                }),
                search: search.clone(),
                playback: playback.clone(),
                observer: Arc::new(NoopObserver),
            },
            out_tx,
        );

        // First analysis window closes and the dominant mood starts music.
        tokio::time::sleep(Duration::from_secs(11)).await;
        let events = drain(&mut out_rx);
        assert!(events.iter().any(|ev| matches!(
            ev,
            SessionOut::MoodResolved { decision } if decision.mood == Mood::Happy
        )));
        assert!(events
            .iter()
            .any(|ev| *ev == SessionOut::NowPlaying { track: track("a") }));

        // Skip advances the queue and starts a fresh analysis.
        handle.skip();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let events = drain(&mut out_rx);
        assert!(events
            .iter()
            .any(|ev| *ev == SessionOut::NowPlaying { track: track("b") }));

        // The re-analysis resolves again and replaces the queue wholesale.
        tokio::time::sleep(Duration::from_secs(11)).await;
        let events = drain(&mut out_rx);
        assert!(events
            .iter()
            .any(|ev| *ev == SessionOut::NowPlaying { track: track("c") }));
        assert_eq!(
            search.requested.lock().unwrap().clone(),
            vec![Mood::Happy, Mood::Happy]
        );
        assert_eq!(
            playback.played.lock().unwrap().clone(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_search_surfaces_empty_result_set_without_retry_loop() {
        let search = Arc::new(ScriptedSearch {
            responses: Mutex::new(vec![Ok(Vec::new())]),
            requested: Mutex::new(Vec::new()),
        });
        let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = SessionCoordinator::spawn(
            tuning(),
            SessionPorts {
                frames: Arc::new(DummyFrames),
                detector: Arc::new(DummyDetector {
                    mood: "sad",
                    intensity: 0.6,
                    fail_load: false,
                }),
                search: search.clone(),
                playback: Arc::new(RecordingPlayback::default()),
                observer: Arc::new(NoopObserver),
            },
            out_tx,
        );

        tokio::time::sleep(Duration::from_secs(12)).await;
        let events = drain(&mut out_rx);
        assert!(events
            .iter()
            .any(|ev| *ev == SessionOut::EmptyResultSet { mood: Mood::Sad }));
        // Exactly one fetch: no retry loop on an empty result.
        assert_eq!(search.requested.lock().unwrap().len(), 1);

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn model_load_failure_is_terminal_idle() {
        let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = SessionCoordinator::spawn(
            tuning(),
            SessionPorts {
                frames: Arc::new(DummyFrames),
                detector: Arc::new(DummyDetector {
                    mood: "happy",
                    intensity: 0.9,
                    fail_load: true,
                }),
                search: Arc::new(ScriptedSearch {
                    responses: Mutex::new(Vec::new()),
                    requested: Mutex::new(Vec::new()),
                }),
                playback: Arc::new(RecordingPlayback::default()),
                observer: Arc::new(NoopObserver),
            },
            out_tx,
        );

        tokio::time::sleep(Duration::from_secs(12)).await;
        let events = drain(&mut out_rx);
        assert!(events
            .iter()
            .any(|ev| matches!(ev, SessionOut::ModelLoadFailed { .. })));
        // No window ever opens, so no decision and no playback.
        assert!(!events
            .iter()
            .any(|ev| matches!(ev, SessionOut::MoodResolved { .. })));

        handle.shutdown();
    }
}
