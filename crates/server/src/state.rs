use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use common::Track;
use library::{LibraryStore, LikeStatus};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::gateway::{CatalogGateway, MediaResolver};

#[derive(Clone)]
pub struct AppState {
    pub config_path: PathBuf,
    pub config: Arc<RwLock<ServerConfig>>,
    pub library: LibraryStore,
    pub catalog: Arc<dyn CatalogGateway>,
    pub media: Arc<dyn MediaResolver>,
    pub http_client: Client,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub status: LikeStatus,
    pub db: Vec<Track>,
}

#[derive(Debug, Serialize)]
pub struct LyricsResponse {
    pub lyrics: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistAddRequest {
    pub name: String,
    pub track: Track,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistRemoveRequest {
    pub name: String,
    pub track_id: String,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
