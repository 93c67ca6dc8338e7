use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::shared::entities::{Mood, MoodDecision, Track};
use crate::shared::error::SearchError;
use crate::shared::ports::MediaSearchPort;

/// What caused a cursor advance. Skip-triggered advances are debounced at
/// this layer, independently of the gesture cooldown; natural end-of-track
/// advances are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    Skip,
    TrackEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueUpdate {
    NowPlaying(Track),
    /// The fetch succeeded but matched nothing. Surfaced, never looped on.
    Empty(Mood),
}

/// Ordered candidate tracks for the current mood with a play cursor.
/// The list is replaced wholesale on each mood change or exhaustion.
pub struct MediaQueue {
    search: Arc<dyn MediaSearchPort>,
    skip_debounce: Duration,
    tracks: Vec<Track>,
    cursor: usize,
    mood: Option<Mood>,
    last_skip_advance: Option<Instant>,
}

impl MediaQueue {
    pub fn new(search: Arc<dyn MediaSearchPort>, skip_debounce: Duration) -> Self {
        Self {
            search,
            skip_debounce,
            tracks: Vec::new(),
            cursor: 0,
            mood: None,
            last_skip_advance: None,
        }
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    pub fn mood(&self) -> Option<Mood> {
        self.mood
    }

    /// Replaces the queue with a fresh ranked list for the decided mood and
    /// rewinds the cursor. On a search failure the existing queue is left
    /// untouched.
    pub async fn on_mood_decision(
        &mut self,
        decision: &MoodDecision,
    ) -> Result<QueueUpdate, SearchError> {
        let mood = decision.mood;
        let tracks = self.search.search(mood).await?;
        self.mood = Some(mood);
        self.tracks = tracks;
        self.cursor = 0;
        match self.current() {
            Some(track) => Ok(QueueUpdate::NowPlaying(track.clone())),
            None => Ok(QueueUpdate::Empty(mood)),
        }
    }

    /// Moves the cursor forward, refetching a fresh list for the *current*
    /// mood when the queue is exhausted. Returns `None` when the advance
    /// was suppressed (skip debounce, or no decision has been made yet).
    pub async fn advance(
        &mut self,
        trigger: AdvanceTrigger,
        now: Instant,
    ) -> Result<Option<QueueUpdate>, SearchError> {
        let Some(mood) = self.mood else {
            return Ok(None);
        };

        if trigger == AdvanceTrigger::Skip {
            if let Some(last) = self.last_skip_advance {
                if now.duration_since(last) < self.skip_debounce {
                    return Ok(None);
                }
            }
        }

        let at_end = self.tracks.is_empty() || self.cursor + 1 >= self.tracks.len();
        if at_end {
            let tracks = self.search.search(mood).await?;
            self.tracks = tracks;
            self.cursor = 0;
        } else {
            self.cursor += 1;
        }

        if trigger == AdvanceTrigger::Skip {
            self.last_skip_advance = Some(now);
        }

        match self.current() {
            Some(track) => Ok(Some(QueueUpdate::NowPlaying(track.clone()))),
            None => Ok(Some(QueueUpdate::Empty(mood))),
        }
    }
}
