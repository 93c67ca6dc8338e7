use crate::shared::entities::{FrameObservation, Mood, MoodDecision, SessionPhase, Track};

/// Events delivered into the session event loop (detector poll loop,
/// timers, playback surface, presentation controls).
#[derive(Debug)]
pub enum SessionIn {
    /// Detector models finished loading.
    ModelsReady,
    /// Detector models failed to load; the session cannot proceed.
    ModelLoadFailed { reason: String },
    /// Validated per-frame detector output.
    Observation(FrameObservation),
    /// The analysis window timer fired.
    WindowElapsed,
    /// External skip signal, same semantics as an accepted gesture.
    SkipRequested,
    /// Natural end of the current track reported by the playback surface.
    TrackEnded,
    /// Tear the session down, cancelling timers and polling.
    Shutdown,
}

/// Notifications from the session to the outer layer. User-visible
/// conditions only; playback itself goes through `PlaybackPort`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOut {
    MoodResolved {
        decision: MoodDecision,
    },
    NowPlaying {
        track: Track,
    },
    /// The decision was valid but no tracks matched the mood. Distinct
    /// from a search failure.
    EmptyResultSet {
        mood: Mood,
    },
    SearchFailed {
        mood: Mood,
        reason: String,
    },
    ModelLoadFailed {
        reason: String,
    },
}

/// Inputs to the pure phase transition function. The coordinator
/// translates `SessionIn` (plus gesture debouncing) into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    ModelsReady,
    ModelLoadFailed,
    WindowElapsed,
    GestureAccepted,
    SkipRequested,
}

/// Pure transition relation. No phase is ever skipped: from `Idle` only
/// `Analyzing` is reachable, from `Analyzing` only `WaitingForGesture`,
/// from `WaitingForGesture` only `Analyzing`. A model-load failure drops
/// any phase back to `Idle`, terminal until restart.
pub fn next_session_phase(phase: SessionPhase, event: &PhaseEvent) -> SessionPhase {
    use SessionPhase::*;
    match (phase, event) {
        (_, PhaseEvent::ModelLoadFailed) => Idle,
        (Idle, PhaseEvent::ModelsReady) => Analyzing,
        (Analyzing, PhaseEvent::WindowElapsed) => WaitingForGesture,
        (WaitingForGesture, PhaseEvent::GestureAccepted) => Analyzing,
        (WaitingForGesture, PhaseEvent::SkipRequested) => Analyzing,
        // Skip/gesture outside the waiting phase is ignored, as is a stray
        // window timeout outside analysis.
        (current, _) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_only_reaches_analyzing() {
        for event in [
            PhaseEvent::WindowElapsed,
            PhaseEvent::GestureAccepted,
            PhaseEvent::SkipRequested,
        ] {
            assert_eq!(
                next_session_phase(SessionPhase::Idle, &event),
                SessionPhase::Idle
            );
        }
        assert_eq!(
            next_session_phase(SessionPhase::Idle, &PhaseEvent::ModelsReady),
            SessionPhase::Analyzing
        );
    }

    #[test]
    fn analyzing_only_reaches_waiting_for_gesture() {
        for event in [
            PhaseEvent::ModelsReady,
            PhaseEvent::GestureAccepted,
            PhaseEvent::SkipRequested,
        ] {
            assert_eq!(
                next_session_phase(SessionPhase::Analyzing, &event),
                SessionPhase::Analyzing
            );
        }
        assert_eq!(
            next_session_phase(SessionPhase::Analyzing, &PhaseEvent::WindowElapsed),
            SessionPhase::WaitingForGesture
        );
    }

    #[test]
    fn waiting_only_reaches_analyzing() {
        for event in [PhaseEvent::ModelsReady, PhaseEvent::WindowElapsed] {
            assert_eq!(
                next_session_phase(SessionPhase::WaitingForGesture, &event),
                SessionPhase::WaitingForGesture
            );
        }
        assert_eq!(
            next_session_phase(
                SessionPhase::WaitingForGesture,
                &PhaseEvent::GestureAccepted
            ),
            SessionPhase::Analyzing
        );
        assert_eq!(
            next_session_phase(SessionPhase::WaitingForGesture, &PhaseEvent::SkipRequested),
            SessionPhase::Analyzing
        );
    }

    #[test]
    fn model_load_failure_is_terminal_from_any_phase() {
        for phase in [
            SessionPhase::Idle,
            SessionPhase::Analyzing,
            SessionPhase::WaitingForGesture,
        ] {
            assert_eq!(
                next_session_phase(phase, &PhaseEvent::ModelLoadFailed),
                SessionPhase::Idle
            );
        }
    }
}
