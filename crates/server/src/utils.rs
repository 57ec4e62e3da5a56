use std::path::PathBuf;
use std::process::{Command, Stdio};

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use crate::config::resolve_path;
use crate::state::{AppState, ErrorResponse, StatusResponse};

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    json_error(status, message).into_response()
}

/// Unwraps a JSON request body, turning any rejection (bad syntax, wrong
/// shape, missing content type) into a 400 with an `{"error"}` body.
pub fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, (StatusCode, Json<ErrorResponse>)> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(json_error(StatusCode::BAD_REQUEST, rejection.body_text()))
        }
    }
}

pub fn status_json(status: &'static str) -> Json<StatusResponse> {
    Json(StatusResponse { status })
}

pub fn web_root(state: &AppState) -> PathBuf {
    let configured = state.config.read().web_root.clone();
    let primary = resolve_path(&state.config_path, configured.trim());
    if primary.exists() {
        return primary;
    }
    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("web");
        if candidate.exists() {
            return candidate;
        }
        let candidate = cwd.join("crates").join("server").join("web");
        if candidate.exists() {
            return candidate;
        }
    }
    primary
}

/// Opens `url` in the desktop's default browser without waiting for it.
pub fn open_in_browser(url: &str) -> Result<(), String> {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", url]);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    };
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| err.to_string())?;
    Ok(())
}
