use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::state::{AppState, TrackQuery};
use crate::utils::json_error_response;

const DEFAULT_AUDIO_TYPE: &str = "audio/mp4";
const RELAY_BUFFER: usize = 16;

const RELAYED_HEADERS: [header::HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

/// Streams the audio for a track through this server. The resolved media
/// URL is short-lived and bound to the resolving client, so the browser
/// never fetches it directly.
pub async fn play_proxy(
    State(state): State<AppState>,
    Query(params): Query<TrackQuery>,
    headers: HeaderMap,
) -> Response {
    let id = match params.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return json_error_response(StatusCode::BAD_REQUEST, "id is required"),
    };

    let media_url = match state.media.resolve_audio(&id).await {
        Ok(url) => url,
        Err(err) => {
            warn!("Failed to resolve audio for {}: {}", id, err);
            return json_error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    };

    let mut request = state.http_client.get(&media_url);
    if let Some(range) = headers.get(header::RANGE) {
        request = request.header(header::RANGE, range.clone());
    }
    let upstream = match request.send().await {
        Ok(upstream) => upstream,
        Err(err) => {
            warn!("Audio request for {} failed: {}", id, err);
            return json_error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    };

    let status = upstream.status();
    if !status.is_success() && status != StatusCode::RANGE_NOT_SATISFIABLE {
        warn!("Audio upstream for {} answered {}", id, status);
        return json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("upstream returned {}", status),
        );
    }

    let mut response_headers = HeaderMap::new();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_AUDIO_TYPE));
    response_headers.insert(header::CONTENT_TYPE, content_type);
    for name in RELAYED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            response_headers.insert(name, value.clone());
        }
    }

    let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(RELAY_BUFFER);
    tokio::spawn(relay_body(upstream, tx));

    let mut response = Response::new(Body::from_stream(ReceiverStream::new(rx)));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    response
}

async fn relay_body(
    mut upstream: reqwest::Response,
    tx: mpsc::Sender<Result<Bytes, std::io::Error>>,
) {
    loop {
        match upstream.chunk().await {
            Ok(Some(chunk)) => {
                if tx.send(Ok(chunk)).await.is_err() {
                    debug!("Listener disconnected; stopping audio relay");
                    return;
                }
            }
            Ok(None) => return,
            Err(err) => {
                warn!("Audio relay interrupted: {}", err);
                let _ = tx.send(Err(std::io::Error::other(err))).await;
                return;
            }
        }
    }
}
