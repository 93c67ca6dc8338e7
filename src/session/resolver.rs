use crate::shared::entities::{ExpressionSample, Mood, MoodDecision};

/// Fallback decision for an empty window (no face seen for the whole
/// analysis period).
pub const DEFAULT_DECISION: MoodDecision = MoodDecision {
    mood: Mood::Neutral,
    intensity: 0.5,
};

/// Collapses a window of noisy per-frame classifications into one
/// decision: majority vote by occurrence count, ties broken by first
/// appearance in the buffer, intensity taken as the maximum observed for
/// the winning mood (not an average).
pub fn resolve(samples: &[ExpressionSample]) -> MoodDecision {
    if samples.is_empty() {
        return DEFAULT_DECISION;
    }

    // Tallies kept in first-seen order so count ties resolve
    // deterministically to the earlier mood.
    let mut tallies: Vec<(Mood, usize, f32)> = Vec::new();
    for sample in samples {
        match tallies.iter_mut().find(|(mood, _, _)| *mood == sample.mood) {
            Some((_, count, max_intensity)) => {
                *count += 1;
                if sample.intensity > *max_intensity {
                    *max_intensity = sample.intensity;
                }
            }
            None => tallies.push((sample.mood, 1, sample.intensity)),
        }
    }

    let mut winner = tallies[0];
    for tally in &tallies[1..] {
        if tally.1 > winner.1 {
            winner = *tally;
        }
    }

    MoodDecision {
        mood: winner.0,
        intensity: winner.2,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn sample(mood: Mood, intensity: f32) -> ExpressionSample {
        ExpressionSample {
            mood,
            intensity,
            at: Instant::now(),
        }
    }

    #[test]
    fn empty_buffer_yields_neutral_default() {
        assert_eq!(resolve(&[]), DEFAULT_DECISION);
    }

    #[test]
    fn majority_wins_with_max_intensity_not_average() {
        let decision = resolve(&[
            sample(Mood::Happy, 0.3),
            sample(Mood::Happy, 0.9),
            sample(Mood::Sad, 0.4),
        ]);
        assert_eq!(decision.mood, Mood::Happy);
        assert_eq!(decision.intensity, 0.9);
    }

    #[test]
    fn never_fabricates_an_absent_mood() {
        let samples = [
            sample(Mood::Surprised, 0.2),
            sample(Mood::Angry, 0.8),
            sample(Mood::Surprised, 0.5),
        ];
        let decision = resolve(&samples);
        assert!(samples.iter().any(|s| s.mood == decision.mood));
    }

    #[test]
    fn count_ties_break_to_first_seen() {
        let decision = resolve(&[
            sample(Mood::Sad, 0.4),
            sample(Mood::Happy, 0.9),
            sample(Mood::Happy, 0.2),
            sample(Mood::Sad, 0.6),
        ]);
        assert_eq!(decision.mood, Mood::Sad);
        assert_eq!(decision.intensity, 0.6);
    }

    #[test]
    fn winning_intensity_ignores_losing_moods() {
        let decision = resolve(&[
            sample(Mood::Neutral, 0.3),
            sample(Mood::Neutral, 0.4),
            sample(Mood::Fearful, 0.99),
        ]);
        assert_eq!(decision.mood, Mood::Neutral);
        assert_eq!(decision.intensity, 0.4);
    }
}
