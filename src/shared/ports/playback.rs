use crate::shared::entities::Track;

/// Playback surface: receives the current track and play/stop intent.
/// "Ended" flows back into the session as an event, not through this trait.
pub trait PlaybackPort: Send + Sync {
    fn play(&self, track: &Track);
    fn stop(&self);
}
