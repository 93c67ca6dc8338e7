use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Closed set of coarse expression labels used throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Fearful,
    Neutral,
    Surprised,
    Disgusted,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Fearful,
        Mood::Neutral,
        Mood::Surprised,
        Mood::Disgusted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Fearful => "fearful",
            Mood::Neutral => "neutral",
            Mood::Surprised => "surprised",
            Mood::Disgusted => "disgusted",
        }
    }

    /// Maps a raw classifier label onto the closed set, tolerating the
    /// synonym spellings seen from detector backends.
    pub fn from_label(raw: &str) -> Option<Mood> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "happy" | "joy" | "joyful" => Some(Mood::Happy),
            "sad" | "sadness" => Some(Mood::Sad),
            "angry" | "anger" => Some(Mood::Angry),
            "fearful" | "fear" => Some(Mood::Fearful),
            "neutral" | "calm" => Some(Mood::Neutral),
            "surprised" | "surprise" => Some(Mood::Surprised),
            "disgusted" | "disgust" => Some(Mood::Disgusted),
            _ => None,
        }
    }

    fn index(self) -> usize {
        Mood::ALL.iter().position(|m| *m == self).unwrap_or(4)
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of the session. Playback and gesture-waiting are one
/// observable period; the currently playing track is queue state, not a
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Analyzing,
    WaitingForGesture,
}

/// One classification accepted from the detector during an analysis window.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionSample {
    pub mood: Mood,
    /// Confidence score, always in [0,1].
    pub intensity: f32,
    pub at: Instant,
}

/// The collapsed result of one completed analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoodDecision {
    pub mood: Mood,
    pub intensity: f32,
}

/// Playable media item returned by the search capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque external media identifier.
    pub id: String,
    pub title: String,
    pub artist: String,
}

/// Raw captured frame handed to the detector. The engine treats the
/// contents as opaque; only the adapters interpret them.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Facial landmark geometry for one detected face. The full point list is
/// kept for the gesture test; the eye/nose points serve as the scale
/// reference.
#[derive(Debug, Clone)]
pub struct LandmarkSet {
    points: Vec<Point>,
    left_eye: Point,
    right_eye: Point,
    nose: Point,
}

impl LandmarkSet {
    /// Validates raw detector geometry once at the boundary. Rejects an
    /// empty point list or non-finite reference coordinates so downstream
    /// logic never re-checks shape.
    pub fn new(
        points: Vec<Point>,
        left_eye: Point,
        right_eye: Point,
        nose: Point,
    ) -> Option<LandmarkSet> {
        if points.is_empty() {
            return None;
        }
        let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
        if !points.iter().all(finite) || ![left_eye, right_eye, nose].iter().all(finite) {
            return None;
        }
        Some(LandmarkSet {
            points,
            left_eye,
            right_eye,
            nose,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Average vertical position of the two eye reference points.
    pub fn eye_line(&self) -> f32 {
        (self.left_eye.y + self.right_eye.y) / 2.0
    }

    pub fn nose(&self) -> Point {
        self.nose
    }
}

/// Per-mood classifier scores, clamped to [0,1] at construction.
#[derive(Debug, Clone)]
pub struct ExpressionScores {
    scores: [f32; Mood::ALL.len()],
}

impl ExpressionScores {
    /// Builds the score table from raw (label, score) pairs. Unknown labels
    /// are dropped; scores are clamped and NaN collapses to zero.
    pub fn from_labels<'a>(raw: impl IntoIterator<Item = (&'a str, f32)>) -> ExpressionScores {
        let mut scores = [0.0f32; Mood::ALL.len()];
        for (label, score) in raw {
            if let Some(mood) = Mood::from_label(label) {
                let score = if score.is_nan() { 0.0 } else { score };
                scores[mood.index()] = score.clamp(0.0, 1.0);
            }
        }
        ExpressionScores { scores }
    }

    pub fn get(&self, mood: Mood) -> f32 {
        self.scores[mood.index()]
    }

    /// The highest-scoring mood; neutral when every score is zero. Ties go
    /// to the earlier label in the closed-set declaration order.
    pub fn dominant(&self) -> (Mood, f32) {
        let mut best = Mood::Neutral;
        let mut best_score = 0.0f32;
        for mood in Mood::ALL {
            let score = self.get(mood);
            if score > best_score {
                best = mood;
                best_score = score;
            }
        }
        (best, best_score)
    }
}

/// Validated detector payload for one processed frame: expression scores
/// plus landmark geometry. This is the only shape that crosses the detector
/// boundary.
#[derive(Debug, Clone)]
pub struct FrameObservation {
    pub expressions: ExpressionScores,
    pub landmarks: LandmarkSet,
}

impl FrameObservation {
    /// Collapses the per-frame score table into the single sample the
    /// analysis buffer stores.
    pub fn sample(&self, at: Instant) -> ExpressionSample {
        let (mood, intensity) = self.expressions.dominant();
        ExpressionSample {
            mood,
            intensity,
            at,
        }
    }
}
