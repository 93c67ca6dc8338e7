use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::shared::config::{self, SearchConfig};
use crate::shared::entities::{Mood, Track};
use crate::shared::error::SearchError;
use crate::shared::ports::{MediaSearchPort, PortFuture};

/// Curated search keywords per mood. Moods without a curated list fall
/// back to the neutral list.
fn keywords_for(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &[
            "happy indian songs",
            "bollywood dance songs",
            "upbeat hindi songs",
            "punjabi bhangra",
        ],
        Mood::Sad => &[
            "sad hindi songs",
            "emotional bollywood songs",
            "hindi sad songs",
            "bollywood romantic sad",
        ],
        Mood::Angry => &[
            "powerful hindi songs",
            "intense bollywood songs",
            "aggressive indian songs",
        ],
        Mood::Fearful => &[
            "dramatic bollywood songs",
            "intense hindi songs",
            "suspense indian songs",
        ],
        Mood::Surprised => &[
            "energetic bollywood songs",
            "party hindi songs",
            "upbeat indian songs",
        ],
        Mood::Neutral | Mood::Disgusted => &[
            "peaceful hindi songs",
            "calm indian songs",
            "soothing bollywood",
        ],
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn tracks_from_items(items: Vec<SearchItem>) -> Vec<Track> {
    items
        .into_iter()
        .filter_map(|item| {
            item.id.video_id.map(|id| Track {
                id,
                title: item.snippet.title,
                artist: item.snippet.channel_title,
            })
        })
        .collect()
}

/// YouTube Data API v3 music search. One ranked fetch per decision; quota
/// and transport failures surface as `SearchError`, never as an empty
/// success.
pub struct YoutubeSearch {
    cfg: SearchConfig,
}

impl YoutubeSearch {
    pub fn from_config(cfg: SearchConfig) -> Self {
        Self { cfg }
    }

    async fn fetch(cfg: SearchConfig, mood: Mood) -> Result<Vec<Track>, SearchError> {
        let api_key = cfg
            .api_key
            .ok_or_else(|| SearchError::Request("api key not configured".to_string()))?;
        let keyword = keywords_for(mood)
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("soothing bollywood");
        log::debug!("[search] {} -> keyword {:?}", mood, keyword);

        let client = super::http_client(config::timeouts().search_http)
            .map_err(|e| SearchError::Request(format!("search client error: {e}")))?;
        let max_results = cfg.max_results.to_string();
        let resp = client
            .get(&cfg.api_base)
            .query(&[
                ("part", "snippet"),
                ("maxResults", max_results.as_str()),
                ("q", keyword),
                ("type", "video"),
                ("videoCategoryId", "10"),
                ("key", api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(format!("search http error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .and_then(|error| error.message)
                .unwrap_or(body);
            return Err(SearchError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let response: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("search response parse error: {e}")))?;
        let items = response
            .items
            .ok_or_else(|| SearchError::InvalidResponse("missing items array".to_string()))?;
        Ok(tracks_from_items(items))
    }
}

impl MediaSearchPort for YoutubeSearch {
    fn search(&self, mood: Mood) -> PortFuture<Result<Vec<Track>, SearchError>> {
        let cfg = self.cfg.clone();
        Box::pin(async move { Self::fetch(cfg, mood).await })
    }
}

/// Built-in per-mood catalog used when no API key is configured, so the
/// engine stays exercisable offline. Moods without entries fall back to
/// the neutral shelf.
pub struct StaticCatalog;

fn catalog_for(mood: Mood) -> Vec<Track> {
    let track = |id: &str, title: &str, artist: &str| Track {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
    };
    match mood {
        Mood::Happy => vec![
            track("1k8craCGpgs", "Don't Stop Believin'", "Journey"),
            track("ZbZSe6N_BXs", "Happy", "Pharrell Williams"),
        ],
        Mood::Sad => vec![
            track("hLQl3WQQoQ0", "Someone Like You", "Adele"),
            track("-2U0Ivkn2Ds", "Say Something", "A Great Big World"),
        ],
        Mood::Angry => vec![
            track("eVTXPUF4Oz4", "In The End", "Linkin Park"),
            track("ZpUYjpKg9KY", "Break Stuff", "Limp Bizkit"),
        ],
        _ => vec![
            track("UfcAVejslrU", "Weightless", "Marconi Union"),
            track("CvFH_6DNRCY", "Clair de Lune", "Debussy"),
        ],
    }
}

impl MediaSearchPort for StaticCatalog {
    fn search(&self, mood: Mood) -> PortFuture<Result<Vec<Track>, SearchError>> {
        let tracks = catalog_for(mood);
        Box::pin(async move { Ok(tracks) })
    }
}
