use std::sync::OnceLock;
use std::time::Duration;

/// Timing knobs for the session engine.
#[derive(Clone, Debug)]
pub struct SessionTuning {
    /// Fixed observation window before a mood decision is finalized.
    pub analysis_window: Duration,
    /// Minimum interval between accepted detector polls.
    pub detection_interval: Duration,
    /// Minimum interval between two accepted gestures.
    pub gesture_cooldown: Duration,
    /// Minimum interval between consecutive skip-triggered queue advances.
    pub skip_debounce: Duration,
}

impl SessionTuning {
    fn from_env() -> Self {
        Self {
            analysis_window: env_duration_sec("ANALYSIS_WINDOW_SEC", 10),
            detection_interval: detection_interval_from_env(),
            gesture_cooldown: env_duration_ms("GESTURE_COOLDOWN_MS", 2_000),
            skip_debounce: env_duration_sec("SKIP_DEBOUNCE_SEC", 10),
        }
    }
}

static SESSION_TUNING: OnceLock<SessionTuning> = OnceLock::new();

pub fn session_tuning() -> &'static SessionTuning {
    SESSION_TUNING.get_or_init(SessionTuning::from_env)
}

fn detection_interval_from_env() -> Duration {
    const DEFAULT_MS: u64 = 200;
    const MIN_MS: u64 = 200;
    let raw = std::env::var("DETECTION_INTERVAL_MS").ok();
    let mut ms = match raw.as_deref() {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!(
                    "[config] invalid DETECTION_INTERVAL_MS={}, fallback to {}",
                    value,
                    DEFAULT_MS
                );
                DEFAULT_MS
            }
        },
        None => DEFAULT_MS,
    };
    if ms < MIN_MS {
        log::warn!(
            "[config] DETECTION_INTERVAL_MS={} below min {}, clamped",
            ms,
            MIN_MS
        );
        ms = MIN_MS;
    }
    Duration::from_millis(ms)
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Search endpoint. Defaults to the YouTube Data API v3 search URL.
    pub api_base: String,
    /// API key; absent key selects the built-in static catalog adapter.
    pub api_key: Option<String>,
    pub max_results: u32,
}

impl SearchConfig {
    fn from_env() -> Self {
        Self {
            api_base: std::env::var("SEARCH_API_BASE")
                .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3/search".to_string()),
            api_key: env_non_empty("YOUTUBE_API_KEY"),
            max_results: env_u32("SEARCH_MAX_RESULTS", 10),
        }
    }
}

static SEARCH_CONFIG: OnceLock<SearchConfig> = OnceLock::new();

pub fn search_config() -> &'static SearchConfig {
    SEARCH_CONFIG.get_or_init(SearchConfig::from_env)
}

#[derive(Clone, Debug)]
pub struct VisionConfig {
    /// Face-analysis service endpoint; absent URL selects the dummy detector.
    pub detector_url: Option<String>,
    /// Camera snapshot endpoint; absent URL selects the synthetic source.
    pub camera_url: Option<String>,
    /// Faces scored below this are treated as not found.
    pub min_face_score: f32,
}

impl VisionConfig {
    fn from_env() -> Self {
        Self {
            detector_url: env_non_empty("DETECTOR_URL"),
            camera_url: env_non_empty("CAMERA_URL"),
            min_face_score: env_f32("MIN_FACE_SCORE", 0.5),
        }
    }
}

static VISION_CONFIG: OnceLock<VisionConfig> = OnceLock::new();

pub fn vision_config() -> &'static VisionConfig {
    VISION_CONFIG.get_or_init(VisionConfig::from_env)
}

#[derive(Clone, Debug)]
pub struct Timeouts {
    pub vision_http: Duration,
    pub search_http: Duration,
}

impl Timeouts {
    fn from_env() -> Self {
        // Defaults: vision 5s (per-frame; an overlong call just drops the
        // next polls), search 10s. Timeout behavior: HTTP clients return
        // an error, the caller logs and moves on.
        Self {
            vision_http: env_duration_ms("VISION_HTTP_TIMEOUT_MS", 5_000),
            search_http: env_duration_ms("SEARCH_HTTP_TIMEOUT_MS", 10_000),
        }
    }
}

static TIMEOUTS: OnceLock<Timeouts> = OnceLock::new();

pub fn timeouts() -> &'static Timeouts {
    TIMEOUTS.get_or_init(Timeouts::from_env)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub mode: LogMode,
    pub format: LogFormat,
    pub dir: Option<String>,
    pub file_name: String,
}

impl LoggingConfig {
    fn from_env() -> Self {
        let dir_env = std::env::var("LOG_DIR").ok();
        let mode_env = std::env::var("LOG_MODE").ok();
        let format_env = std::env::var("LOG_FORMAT").ok();

        let format = match format_env.as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let mode = match mode_env.as_deref() {
            Some("file") => LogMode::File,
            Some("stdout") => LogMode::Stdout,
            _ => {
                if dir_env.is_some() {
                    LogMode::File
                } else {
                    LogMode::Stdout
                }
            }
        };

        Self {
            mode,
            format,
            dir: dir_env,
            file_name: std::env::var("LOG_FILE_NAME")
                .unwrap_or_else(|_| "moodtune-backend.log".to_string()),
        }
    }
}

static LOGGING: OnceLock<LoggingConfig> = OnceLock::new();

pub fn logging_config() -> &'static LoggingConfig {
    LOGGING.get_or_init(LoggingConfig::from_env)
}

fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

fn env_duration_sec(key: &str, default_sec: u64) -> Duration {
    let sec = std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_sec);
    Duration::from_secs(sec)
}

fn env_u32(key: &str, default_value: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default_value)
}

fn env_f32(key: &str, default_value: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default_value)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
