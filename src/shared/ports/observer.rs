use serde::Serialize;

use crate::shared::entities::{MoodDecision, SessionPhase, Track};

/// Read-only view of the session handed to the presentation layer once per
/// second. Nothing here feeds back into the engine.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub decision: Option<MoodDecision>,
    /// Seconds elapsed in the current analysis window; zero outside it.
    pub elapsed_secs: u64,
    pub now_playing: Option<Track>,
}

pub trait SessionObserverPort: Send + Sync {
    fn on_tick(&self, snapshot: SessionSnapshot);
}

pub struct NoopObserver;

impl SessionObserverPort for NoopObserver {
    fn on_tick(&self, _snapshot: SessionSnapshot) {}
}
