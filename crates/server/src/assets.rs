use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::state::AppState;
use crate::utils::{json_error_response, web_root};

const FALLBACK_INDEX: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\" /><title>Neon Pulse</title></head><body><h1>Neon Pulse</h1><p>The player UI was not found. Place <code>index.html</code> in the configured <code>web_root</code> directory; the API is available under <code>/api</code>.</p></body></html>";

pub async fn index(State(state): State<AppState>) -> Response {
    let path = web_root(&state).join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Html(body).into_response(),
        Err(_) => Html(FALLBACK_INDEX).into_response(),
    }
}

pub async fn static_asset(
    State(state): State<AppState>,
    AxumPath(file): AxumPath<String>,
) -> Response {
    let static_root = web_root(&state).join("static");
    let Some(path) = safe_join(&static_root, &file) else {
        return json_error_response(StatusCode::FORBIDDEN, "forbidden");
    };
    let handle = match tokio::fs::File::open(&path).await {
        Ok(handle) => handle,
        Err(_) => return json_error_response(StatusCode::NOT_FOUND, "asset not found"),
    };
    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    let mut response = Response::new(Body::from_stream(ReaderStream::new(handle)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&mime)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    response
}

/// Joins a request path onto `root`, refusing anything that could escape it.
fn safe_join(root: &Path, relpath: &str) -> Option<PathBuf> {
    let relpath = Path::new(relpath);
    let mut out = root.to_path_buf();
    let mut pushed = false;
    for component in relpath.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    if pushed {
        Some(out)
    } else {
        None
    }
}
