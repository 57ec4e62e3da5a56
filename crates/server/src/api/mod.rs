pub mod catalog;
pub mod player;
pub mod user_data;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, StatusResponse};
use crate::utils::status_json;

pub fn api_router(state: AppState) -> Router {
    let catalog = Router::new()
        .route("/home", get(catalog::home))
        .route("/search", get(catalog::search))
        .route("/recommend", get(catalog::recommend))
        .route("/lyrics", get(catalog::lyrics))
        .route("/play_proxy", get(player::play_proxy));

    let library = Router::new()
        .route("/library", get(user_data::get_library))
        .route("/like", post(user_data::toggle_like))
        .route("/playlist/create", post(user_data::create_playlist))
        .route("/playlist/delete_all", post(user_data::delete_playlist))
        .route("/playlist/add", post(user_data::add_to_playlist))
        .route("/playlist/remove", post(user_data::remove_from_playlist));

    Router::new()
        .route("/health", get(health))
        .merge(catalog)
        .merge(library)
        .with_state(state)
}

async fn health() -> Json<StatusResponse> {
    status_json("ok")
}
