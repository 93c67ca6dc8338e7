use std::time::{Duration, Instant};

use crate::shared::entities::{LandmarkSet, SessionPhase};

/// Debounced "hands raised above head" detector. The geometric test reuses
/// face geometry purely as a scale reference: a point counts as a raised
/// hand when it sits above the eye line by more than the nose-to-eye
/// vertical distance.
pub struct GestureDebouncer {
    cooldown: Duration,
    last_accepted: Option<Instant>,
}

impl GestureDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: None,
        }
    }

    /// Returns true when a gesture is recognized and accepted. Acceptance
    /// requires the waiting phase and an expired cooldown; it resets the
    /// cooldown clock, so frames that keep satisfying the geometry do not
    /// double-fire.
    pub fn evaluate(&mut self, landmarks: &LandmarkSet, phase: SessionPhase, now: Instant) -> bool {
        if phase != SessionPhase::WaitingForGesture {
            return false;
        }
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.cooldown {
                return false;
            }
        }
        if !hands_above_eyes(landmarks) {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }

    /// Clears the cooldown clock on entry to a new waiting phase so the
    /// first gesture there is never suppressed by a stale timestamp.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

// Image coordinates grow downward: "above" means smaller y.
fn hands_above_eyes(landmarks: &LandmarkSet) -> bool {
    let eye_line = landmarks.eye_line();
    let reach = landmarks.nose().y - eye_line;
    landmarks
        .points()
        .iter()
        .any(|point| point.y < eye_line - reach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::entities::Point;

    fn face_with_extra_point(extra_y: f32) -> LandmarkSet {
        let p = |x, y| Point { x, y };
        // Eyes at y=100, nose at y=120: a raised hand must sit above y=80.
        LandmarkSet::new(
            vec![p(40.0, 100.0), p(60.0, 100.0), p(50.0, 120.0), p(55.0, extra_y)],
            p(40.0, 100.0),
            p(60.0, 100.0),
            p(50.0, 120.0),
        )
        .expect("valid landmarks")
    }

    #[test]
    fn geometry_requires_point_above_eye_line_by_nose_distance() {
        assert!(hands_above_eyes(&face_with_extra_point(70.0)));
        assert!(!hands_above_eyes(&face_with_extra_point(90.0)));
        assert!(!hands_above_eyes(&face_with_extra_point(130.0)));
    }

    #[test]
    fn accepted_only_while_waiting_for_gesture() {
        let mut debouncer = GestureDebouncer::new(Duration::from_secs(2));
        let raised = face_with_extra_point(10.0);
        let now = Instant::now();
        assert!(!debouncer.evaluate(&raised, SessionPhase::Analyzing, now));
        assert!(!debouncer.evaluate(&raised, SessionPhase::Idle, now));
        assert!(debouncer.evaluate(&raised, SessionPhase::WaitingForGesture, now));
    }

    #[test]
    fn two_valid_frames_inside_cooldown_fire_once() {
        let mut debouncer = GestureDebouncer::new(Duration::from_secs(2));
        let raised = face_with_extra_point(10.0);
        let t0 = Instant::now();
        assert!(debouncer.evaluate(&raised, SessionPhase::WaitingForGesture, t0));
        assert!(!debouncer.evaluate(
            &raised,
            SessionPhase::WaitingForGesture,
            t0 + Duration::from_millis(500)
        ));
    }

    #[test]
    fn frames_past_cooldown_fire_twice() {
        let mut debouncer = GestureDebouncer::new(Duration::from_secs(2));
        let raised = face_with_extra_point(10.0);
        let t0 = Instant::now();
        assert!(debouncer.evaluate(&raised, SessionPhase::WaitingForGesture, t0));
        assert!(debouncer.evaluate(
            &raised,
            SessionPhase::WaitingForGesture,
            t0 + Duration::from_millis(2_100)
        ));
    }

    #[test]
    fn reset_clears_the_cooldown_clock() {
        let mut debouncer = GestureDebouncer::new(Duration::from_secs(2));
        let raised = face_with_extra_point(10.0);
        let t0 = Instant::now();
        assert!(debouncer.evaluate(&raised, SessionPhase::WaitingForGesture, t0));
        debouncer.reset();
        assert!(debouncer.evaluate(
            &raised,
            SessionPhase::WaitingForGesture,
            t0 + Duration::from_millis(100)
        ));
    }
}
