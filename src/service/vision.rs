use std::collections::HashMap;

use reqwest::multipart;
use serde::Deserialize;

use crate::shared::config::{self, VisionConfig};
use crate::shared::entities::{
    ExpressionScores, Frame, FrameObservation, LandmarkSet, Point,
};
use crate::shared::error::DetectorError;
use crate::shared::ports::{DetectorPort, FrameSourcePort, PortFuture};

#[derive(Deserialize)]
struct DetectResponse {
    faces: Option<Vec<FaceDetection>>,
}

#[derive(Deserialize)]
struct FaceDetection {
    score: Option<f32>,
    expressions: HashMap<String, f32>,
    landmarks: Vec<Point>,
    left_eye: Point,
    right_eye: Point,
    nose: Point,
}

/// HTTP client for an external face-analysis service. When no endpoint is
/// configured, detection degrades to a deterministic neutral observation
/// so the rest of the stack keeps working.
pub struct HttpVisionDetector {
    cfg: VisionConfig,
}

impl HttpVisionDetector {
    pub fn from_config(cfg: VisionConfig) -> Self {
        Self { cfg }
    }

    async fn probe_models(url: String) -> Result<(), DetectorError> {
        let client = super::http_client(config::timeouts().vision_http)
            .map_err(|e| DetectorError::ModelLoad(format!("vision client error: {e}")))?;
        let resp = client
            .get(format!("{}/healthz", url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| DetectorError::ModelLoad(format!("vision http error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DetectorError::ModelLoad(format!(
                "vision http status {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }

    async fn analyze(
        url: String,
        min_face_score: f32,
        frame: Frame,
    ) -> Result<Option<FrameObservation>, DetectorError> {
        let client = super::http_client(config::timeouts().vision_http)
            .map_err(|e| DetectorError::Detection(format!("vision client error: {e}")))?;

        let part = multipart::Part::bytes(frame.data)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| DetectorError::Detection(format!("vision request error: {e}")))?;
        let form = multipart::Form::new().part("frame", part);

        let resp = client
            .post(format!("{}/detect", url.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DetectorError::Timeout
                } else {
                    DetectorError::Detection(format!("vision http error: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DetectorError::Detection(format!(
                "vision http status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let response: DetectResponse = resp
            .json()
            .await
            .map_err(|e| DetectorError::Detection(format!("vision response parse error: {e}")))?;

        let Some(face) = best_face(response.faces.unwrap_or_default(), min_face_score) else {
            return Ok(None);
        };
        observation_from_face(face).map(Some)
    }
}

fn best_face(faces: Vec<FaceDetection>, min_face_score: f32) -> Option<FaceDetection> {
    faces
        .into_iter()
        .filter(|face| face.score.unwrap_or(0.0) >= min_face_score)
        .max_by(|a, b| {
            a.score
                .unwrap_or(0.0)
                .total_cmp(&b.score.unwrap_or(0.0))
        })
}

fn observation_from_face(face: FaceDetection) -> Result<FrameObservation, DetectorError> {
    let expressions = ExpressionScores::from_labels(
        face.expressions
            .iter()
            .map(|(label, score)| (label.as_str(), *score)),
    );
    let landmarks = LandmarkSet::new(face.landmarks, face.left_eye, face.right_eye, face.nose)
        .ok_or_else(|| DetectorError::Detection("invalid landmark geometry".to_string()))?;
    Ok(FrameObservation {
        expressions,
        landmarks,
    })
}

/// Neutral mid-confidence observation used when no detector endpoint is
/// configured. The synthetic face never satisfies the gesture geometry.
fn dummy_observation() -> FrameObservation {
    let p = |x, y| Point { x, y };
    let landmarks = LandmarkSet::new(
        vec![p(260.0, 200.0), p(380.0, 200.0), p(320.0, 260.0)],
        p(260.0, 200.0),
        p(380.0, 200.0),
        p(320.0, 260.0),
    )
    .expect("static dummy landmarks are valid");
    FrameObservation {
        expressions: ExpressionScores::from_labels([("neutral", 0.5)]),
        landmarks,
    }
}

impl DetectorPort for HttpVisionDetector {
    fn load_models(&self) -> PortFuture<Result<(), DetectorError>> {
        let url = self.cfg.detector_url.clone();
        Box::pin(async move {
            match url {
                Some(url) => Self::probe_models(url).await,
                None => Ok(()),
            }
        })
    }

    fn detect_frame(
        &self,
        frame: Frame,
    ) -> PortFuture<Result<Option<FrameObservation>, DetectorError>> {
        let url = self.cfg.detector_url.clone();
        let min_face_score = self.cfg.min_face_score;
        Box::pin(async move {
            match url {
                Some(url) => Self::analyze(url, min_face_score, frame).await,
                None => Ok(Some(dummy_observation())),
            }
        })
    }
}

/// Pulls single-frame snapshots from an HTTP camera endpoint (IP webcam
/// style).
pub struct HttpFrameSource {
    url: String,
}

impl HttpFrameSource {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl FrameSourcePort for HttpFrameSource {
    fn capture(&self) -> PortFuture<anyhow::Result<Option<Frame>>> {
        let url = self.url.clone();
        Box::pin(async move {
            let client = super::http_client(config::timeouts().vision_http)?;
            let resp = client.get(&url).send().await?;
            if !resp.status().is_success() {
                anyhow::bail!("camera http status {}", resp.status().as_u16());
            }
            let data = resp.bytes().await?.to_vec();
            if data.is_empty() {
                return Ok(None);
            }
            Ok(Some(Frame { data }))
        })
    }
}

/// Stand-in frame source for headless runs: a flat gray 640x480 luma
/// buffer, enough for the dummy detector path.
pub struct SyntheticFrameSource;

impl FrameSourcePort for SyntheticFrameSource {
    fn capture(&self) -> PortFuture<anyhow::Result<Option<Frame>>> {
        Box::pin(async {
            Ok(Some(Frame {
                data: vec![0x80; 640 * 480],
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::entities::Mood;

    fn face(score: f32) -> FaceDetection {
        let p = |x, y| Point { x, y };
        FaceDetection {
            score: Some(score),
            expressions: HashMap::from([("happy".to_string(), 0.8)]),
            landmarks: vec![p(0.0, 1.0), p(2.0, 1.0)],
            left_eye: p(0.0, 1.0),
            right_eye: p(2.0, 1.0),
            nose: p(1.0, 2.0),
        }
    }

    #[test]
    fn best_face_filters_below_threshold() {
        assert!(best_face(vec![face(0.3)], 0.5).is_none());
        let picked = best_face(vec![face(0.6), face(0.9)], 0.5).expect("face above threshold");
        assert_eq!(picked.score, Some(0.9));
    }

    #[test]
    fn observation_from_face_maps_expressions() {
        let observation = observation_from_face(face(0.9)).expect("valid face");
        assert_eq!(observation.expressions.dominant().0, Mood::Happy);
    }

    #[test]
    fn observation_from_face_rejects_empty_landmarks() {
        let mut bad = face(0.9);
        bad.landmarks = Vec::new();
        assert!(observation_from_face(bad).is_err());
    }

    #[test]
    fn dummy_observation_is_neutral_and_gesture_free() {
        let observation = dummy_observation();
        assert_eq!(observation.expressions.dominant(), (Mood::Neutral, 0.5));
        let eye_line = observation.landmarks.eye_line();
        let reach = observation.landmarks.nose().y - eye_line;
        assert!(observation
            .landmarks
            .points()
            .iter()
            .all(|point| point.y >= eye_line - reach));
    }
}
