use axum::{
    extract::{Query, State},
    Json,
};
use common::{normalize, Track};
use rand::seq::IndexedRandom;
use tracing::warn;

use crate::state::{AppState, LyricsResponse, SearchQuery, TrackQuery};

pub const LYRICS_UNAVAILABLE: &str = "LYRICS_UNAVAILABLE";

// Catalog failures degrade to empty results; the UI treats them as "nothing found".

pub async fn home(State(state): State<AppState>) -> Json<Vec<Track>> {
    let (genre, limit) = {
        let config = state.config.read();
        (pick_genre(&config.home_genres), config.home_limit)
    };
    match genre {
        Some(genre) => Json(search_tracks(&state, &genre, limit).await),
        None => Json(Vec::new()),
    }
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Track>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Json(Vec::new());
    }
    let limit = state.config.read().search_limit;
    Json(search_tracks(&state, query, limit).await)
}

pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<TrackQuery>,
) -> Json<Vec<Track>> {
    let Some(id) = track_id(&params) else {
        return Json(Vec::new());
    };
    let limit = state.config.read().recommend_limit;
    match state.catalog.watch_playlist(id, limit).await {
        Ok(records) => Json(normalize(&records)),
        Err(err) => {
            warn!("Watch playlist for {} failed: {}", id, err);
            Json(Vec::new())
        }
    }
}

pub async fn lyrics(
    State(state): State<AppState>,
    Query(params): Query<TrackQuery>,
) -> Json<LyricsResponse> {
    let text = match track_id(&params) {
        Some(id) => match state.catalog.lyrics(id).await {
            Ok(text) => text,
            Err(err) => {
                warn!("Lyrics lookup for {} failed: {}", id, err);
                None
            }
        },
        None => None,
    };
    Json(LyricsResponse {
        lyrics: text.unwrap_or_else(|| LYRICS_UNAVAILABLE.to_string()),
    })
}

async fn search_tracks(state: &AppState, query: &str, limit: usize) -> Vec<Track> {
    match state.catalog.search(query, limit).await {
        Ok(records) => normalize(records.iter().take(limit)),
        Err(err) => {
            warn!("Catalog search for {:?} failed: {}", query, err);
            Vec::new()
        }
    }
}

fn pick_genre(genres: &[String]) -> Option<String> {
    let candidates: Vec<&str> = genres
        .iter()
        .map(|genre| genre.trim())
        .filter(|genre| !genre.is_empty())
        .collect();
    candidates
        .choose(&mut rand::rng())
        .map(|genre| genre.to_string())
}

fn track_id(params: &TrackQuery) -> Option<&str> {
    params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
