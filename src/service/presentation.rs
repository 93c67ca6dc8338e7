use serde_json::json;

use crate::shared::entities::Track;
use crate::shared::ports::{PlaybackPort, SessionObserverPort, SessionSnapshot};

/// Playback surface for headless runs: announces the track that would be
/// embedded by a real player.
pub struct LogPlayback;

impl PlaybackPort for LogPlayback {
    fn play(&self, track: &Track) {
        log::info!(
            "[playback] now playing: {} - {} (https://www.youtube.com/watch?v={})",
            track.title,
            track.artist,
            track.id
        );
    }

    fn stop(&self) {
        log::info!("[playback] stopped");
    }
}

/// Observer that mirrors each per-second snapshot into the debug log as a
/// JSON line, the shape a UI would consume.
pub struct LogObserver;

impl SessionObserverPort for LogObserver {
    fn on_tick(&self, snapshot: SessionSnapshot) {
        let payload = json!({
            "phase": snapshot.phase,
            "decision": snapshot.decision,
            "elapsedSec": snapshot.elapsed_secs,
            "nowPlaying": snapshot.now_playing.as_ref().map(|track| json!({
                "id": track.id,
                "title": track.title,
            })),
        });
        log::debug!("[observer] {}", payload);
    }
}
