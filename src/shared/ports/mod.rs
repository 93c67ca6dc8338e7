use std::future::Future;
use std::pin::Pin;

pub mod detector;
pub mod media_search;
pub mod observer;
pub mod playback;

pub type PortFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub use detector::{DetectorPort, FrameSourcePort};
pub use media_search::MediaSearchPort;
pub use observer::{SessionObserverPort, SessionSnapshot};
pub use playback::PlaybackPort;
