use async_trait::async_trait;
use serde_json::Value;

/// Source of raw catalog records: search, radio-style watch playlists and
/// lyrics. Records come back unnormalized; callers run them through
/// [`common::normalize`].
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Value>, GatewayError>;

    async fn watch_playlist(
        &self,
        video_id: &str,
        limit: usize,
    ) -> Result<Vec<Value>, GatewayError>;

    async fn lyrics(&self, video_id: &str) -> Result<Option<String>, GatewayError>;
}

/// Turns a track id into a direct audio URL. The URL expires upstream, so
/// it is resolved per playback and never stored.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve_audio(&self, video_id: &str) -> Result<String, GatewayError>;
}

pub fn is_valid_video_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 64
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Debug)]
pub enum GatewayError {
    InvalidId(String),
    InvalidQuery(String),
    Spawn(std::io::Error),
    Exit { status: Option<i32>, stderr: String },
    Timeout,
    Parse(serde_json::Error),
    Http(reqwest::Error),
    NoMedia,
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::InvalidId(id) => write!(f, "invalid track id: {:?}", id),
            GatewayError::InvalidQuery(query) => write!(f, "invalid search query: {:?}", query),
            GatewayError::Spawn(err) => write!(f, "failed to start extractor: {}", err),
            GatewayError::Exit { status, stderr } => match status {
                Some(code) => write!(f, "extractor exited with {}: {}", code, stderr),
                None => write!(f, "extractor terminated: {}", stderr),
            },
            GatewayError::Timeout => write!(f, "external call timed out"),
            GatewayError::Parse(err) => write!(f, "unexpected extractor output: {}", err),
            GatewayError::Http(err) => write!(f, "http error: {}", err),
            GatewayError::NoMedia => write!(f, "no playable audio found"),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Spawn(err) => Some(err),
            GatewayError::Parse(err) => Some(err),
            GatewayError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Parse(err)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Http(err)
    }
}
