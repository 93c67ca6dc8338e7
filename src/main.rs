use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use moodtune_backend::service::presentation::{LogObserver, LogPlayback};
use moodtune_backend::service::search::{StaticCatalog, YoutubeSearch};
use moodtune_backend::service::vision::{
    HttpFrameSource, HttpVisionDetector, SyntheticFrameSource,
};
use moodtune_backend::session::{SessionCoordinator, SessionOut, SessionPorts};
use moodtune_backend::shared::ports::{FrameSourcePort, MediaSearchPort};
use moodtune_backend::shared::{config, logging};

/// Wires the session engine to its adapters and bridges stdin commands
/// (`skip`, `ended`, `quit`) into session events the way a playback
/// surface would, until ctrl-c or EOF.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let tuning = config::session_tuning().clone();
    let vision_cfg = config::vision_config().clone();
    let search_cfg = config::search_config().clone();

    let frames: Arc<dyn FrameSourcePort> = match vision_cfg.camera_url.as_ref() {
        Some(url) => Arc::new(HttpFrameSource::new(url.clone())),
        None => {
            log::warn!("[main] CAMERA_URL not set, using synthetic frames");
            Arc::new(SyntheticFrameSource)
        }
    };
    if vision_cfg.detector_url.is_none() {
        log::warn!("[main] DETECTOR_URL not set, detector runs in dummy mode");
    }
    let search: Arc<dyn MediaSearchPort> = if search_cfg.api_key.is_some() {
        Arc::new(YoutubeSearch::from_config(search_cfg))
    } else {
        log::warn!("[main] YOUTUBE_API_KEY not set, using the static catalog");
        Arc::new(StaticCatalog)
    };

    let (session_out_tx, mut session_out_rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = SessionCoordinator::spawn(
        tuning,
        SessionPorts {
            frames,
            detector: Arc::new(HttpVisionDetector::from_config(vision_cfg)),
            search,
            playback: Arc::new(LogPlayback),
            observer: Arc::new(LogObserver),
        },
        session_out_tx,
    );

    tokio::spawn(async move {
        while let Some(out) = session_out_rx.recv().await {
            match out {
                SessionOut::MoodResolved { decision } => {
                    log::info!(
                        "[main] mood resolved: {} ({:.0}%)",
                        decision.mood,
                        decision.intensity * 100.0
                    );
                }
                SessionOut::NowPlaying { track } => {
                    log::info!("[main] queued up: {} - {}", track.title, track.artist);
                }
                SessionOut::EmptyResultSet { mood } => {
                    log::warn!("[main] no tracks matched mood {}, show your hands to retry", mood);
                }
                SessionOut::SearchFailed { mood, reason } => {
                    log::error!("[main] search for {} failed: {} (retry with 'skip')", mood, reason);
                }
                SessionOut::ModelLoadFailed { reason } => {
                    log::error!("[main] detector unavailable: {} (restart to retry)", reason);
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break; };
                match line.trim() {
                    "" => {}
                    "skip" => handle.skip(),
                    "ended" => handle.track_ended(),
                    "quit" | "exit" => break,
                    other => log::warn!("[main] unknown command: {}", other),
                }
            }
        }
    }

    handle.shutdown();
    Ok(())
}
