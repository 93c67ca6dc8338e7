//! Adapters implementing the engine's ports: vision (face analysis +
//! frame capture), search (track retrieval) and presentation (playback,
//! observer). HTTP and fallback policies live here, never in the engine.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

pub mod presentation;
pub mod search;
pub mod vision;

fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}
