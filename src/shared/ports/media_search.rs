use super::PortFuture;
use crate::shared::entities::{Mood, Track};
use crate::shared::error::SearchError;

/// Media search boundary: a mood keyword in, a ranked (possibly empty)
/// track list out. Network or quota failures surface as `SearchError`,
/// never as an empty success.
pub trait MediaSearchPort: Send + Sync {
    fn search(&self, mood: Mood) -> PortFuture<Result<Vec<Track>, SearchError>>;
}
