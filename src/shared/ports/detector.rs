use anyhow::Result;

use super::PortFuture;
use crate::shared::entities::{Frame, FrameObservation};
use crate::shared::error::DetectorError;

/// Frame delivery boundary (webcam or equivalent). `None` means no frame is
/// currently available; that is not an error.
pub trait FrameSourcePort: Send + Sync {
    fn capture(&self) -> PortFuture<Result<Option<Frame>>>;
}

/// The opaque face/expression classifier. `detect_frame` returns `None`
/// when no face is found; callers tolerate absence without erroring.
pub trait DetectorPort: Send + Sync {
    fn load_models(&self) -> PortFuture<Result<(), DetectorError>>;
    fn detect_frame(&self, frame: Frame)
        -> PortFuture<Result<Option<FrameObservation>, DetectorError>>;
}
