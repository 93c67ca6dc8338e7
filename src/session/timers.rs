use std::time::{Duration, Instant};

use tokio::sync::{mpsc::UnboundedSender, oneshot};

use super::types::SessionIn;

/// Scoped timers owned by the session. Each phase owns at most one window
/// timer; starting a new one always cancels and replaces any prior
/// instance so a stale timer can never fire after a phase change.
pub struct SessionTimers {
    window_stop: Option<oneshot::Sender<()>>,
    window_started: Option<Instant>,
}

impl SessionTimers {
    pub fn new() -> Self {
        Self {
            window_stop: None,
            window_started: None,
        }
    }

    pub fn start_window(&mut self, tx: UnboundedSender<SessionIn>, duration: Duration) {
        self.stop_window();
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.window_stop = Some(stop_tx);
        self.window_started = Some(Instant::now());
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    let _ = tx.send(SessionIn::WindowElapsed);
                }
                _ = &mut stop_rx => {}
            }
        });
    }

    pub fn stop_window(&mut self) {
        if let Some(stop) = self.window_stop.take() {
            let _ = stop.send(());
        }
        self.window_started = None;
    }

    /// Whole seconds since the current window opened; zero when no window
    /// is running. Display-only, read by the observer tick.
    pub fn window_elapsed_secs(&self) -> u64 {
        self.window_started
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }
}

impl Default for SessionTimers {
    fn default() -> Self {
        Self::new()
    }
}
