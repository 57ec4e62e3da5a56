use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use common::Track;
use library::{LibraryDocument, LibraryError};
use tracing::error;

use crate::state::{
    AppState, ErrorResponse, JsonResult, LikeResponse, PlaylistAddRequest, PlaylistNameRequest,
    PlaylistRemoveRequest, StatusResponse,
};
use crate::utils::{json_body, json_error, status_json};

fn library_error(err: LibraryError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is_invalid_input() {
        return json_error(StatusCode::BAD_REQUEST, err.to_string());
    }
    error!("Library store failure: {}", err);
    json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub async fn get_library(State(state): State<AppState>) -> JsonResult<LibraryDocument> {
    let document = state.library.load().map_err(library_error)?;
    Ok(Json(document))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    payload: Result<Json<Track>, JsonRejection>,
) -> JsonResult<LikeResponse> {
    let track = json_body(payload)?;
    let outcome = state.library.toggle_liked(track).map_err(library_error)?;
    Ok(Json(LikeResponse {
        status: outcome.status,
        db: outcome.liked,
    }))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    payload: Result<Json<PlaylistNameRequest>, JsonRejection>,
) -> JsonResult<StatusResponse> {
    let payload = json_body(payload)?;
    state
        .library
        .create_playlist(&payload.name)
        .map_err(library_error)?;
    Ok(status_json("ok"))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    payload: Result<Json<PlaylistNameRequest>, JsonRejection>,
) -> JsonResult<StatusResponse> {
    let payload = json_body(payload)?;
    state
        .library
        .delete_playlist(&payload.name)
        .map_err(library_error)?;
    Ok(status_json("deleted"))
}

pub async fn add_to_playlist(
    State(state): State<AppState>,
    payload: Result<Json<PlaylistAddRequest>, JsonRejection>,
) -> JsonResult<StatusResponse> {
    let payload = json_body(payload)?;
    state
        .library
        .add_to_playlist(&payload.name, payload.track)
        .map_err(library_error)?;
    Ok(status_json("ok"))
}

pub async fn remove_from_playlist(
    State(state): State<AppState>,
    payload: Result<Json<PlaylistRemoveRequest>, JsonRejection>,
) -> JsonResult<StatusResponse> {
    let payload = json_body(payload)?;
    state
        .library
        .remove_from_playlist(&payload.name, &payload.track_id)
        .map_err(library_error)?;
    Ok(status_json("removed"))
}
