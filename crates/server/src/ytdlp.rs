use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use common::format_duration_secs;
use reqwest::{Client, Url};
use serde_json::{json, Map, Value};
use tokio::process::Command;
use tracing::debug;

use crate::gateway::{is_valid_video_id, CatalogGateway, GatewayError, MediaResolver};
use crate::lyrics::fetch_lyrics;

const MUSIC_SEARCH_URL: &str = "https://music.youtube.com/search";
const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/best";
const TOPIC_SUFFIX: &str = " - Topic";

/// Catalog and media access through the `yt-dlp` executable.
#[derive(Clone)]
pub struct YtDlp {
    program: String,
    timeout: Duration,
    client: Client,
    lyrics_enabled: bool,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, timeout: Duration, client: Client) -> Self {
        Self {
            program: program.into(),
            timeout,
            client,
            lyrics_enabled: true,
        }
    }

    pub fn with_lyrics(mut self, enabled: bool) -> Self {
        self.lyrics_enabled = enabled;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, GatewayError> {
        debug!("{} {}", self.program, args.join(" "));
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(GatewayError::Spawn)?,
            Err(_) => return Err(GatewayError::Timeout),
        };
        if !output.status.success() {
            return Err(GatewayError::Exit {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    async fn flat_playlist(&self, url: &str, limit: usize) -> Result<Vec<Value>, GatewayError> {
        let limit = limit.max(1).to_string();
        let stdout = self
            .run(&[
                "--flat-playlist",
                "--dump-single-json",
                "--no-warnings",
                "--playlist-end",
                limit.as_str(),
                "--",
                url,
            ])
            .await?;
        let payload: Value = serde_json::from_slice(&stdout)?;
        Ok(playlist_entries(&payload))
    }
}

#[async_trait]
impl CatalogGateway for YtDlp {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Value>, GatewayError> {
        let url = search_url(query)
            .ok_or_else(|| GatewayError::InvalidQuery(query.to_string()))?;
        let mut records = self.flat_playlist(url.as_str(), limit).await?;
        records.truncate(limit);
        Ok(records)
    }

    async fn watch_playlist(
        &self,
        video_id: &str,
        limit: usize,
    ) -> Result<Vec<Value>, GatewayError> {
        if !is_valid_video_id(video_id) {
            return Err(GatewayError::InvalidId(video_id.to_string()));
        }
        let url = radio_url(video_id);
        let mut records = self.flat_playlist(&url, limit).await?;
        records.truncate(limit);
        Ok(records)
    }

    async fn lyrics(&self, video_id: &str) -> Result<Option<String>, GatewayError> {
        if !self.lyrics_enabled {
            return Ok(None);
        }
        if !is_valid_video_id(video_id) {
            return Err(GatewayError::InvalidId(video_id.to_string()));
        }
        let url = watch_url(video_id);
        let stdout = self
            .run(&[
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                "--",
                url.as_str(),
            ])
            .await?;
        let info: Value = serde_json::from_slice(&stdout)?;
        let title = first_str(&info, &["track", "title"]).unwrap_or_default();
        let artist = entry_artist(&info).unwrap_or_default();
        fetch_lyrics(&self.client, self.timeout, &artist, title).await
    }
}

#[async_trait]
impl MediaResolver for YtDlp {
    async fn resolve_audio(&self, video_id: &str) -> Result<String, GatewayError> {
        if !is_valid_video_id(video_id) {
            return Err(GatewayError::InvalidId(video_id.to_string()));
        }
        let url = watch_url(video_id);
        let stdout = self
            .run(&[
                "-f",
                AUDIO_FORMAT,
                "--get-url",
                "--no-playlist",
                "--no-warnings",
                "--",
                url.as_str(),
            ])
            .await?;
        String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or(GatewayError::NoMedia)
    }
}

fn search_url(query: &str) -> Option<Url> {
    let mut url = Url::parse_with_params(MUSIC_SEARCH_URL, &[("q", query)]).ok()?;
    url.set_fragment(Some("songs"));
    Some(url)
}

fn watch_url(video_id: &str) -> String {
    format!("https://music.youtube.com/watch?v={}", video_id)
}

fn radio_url(video_id: &str) -> String {
    format!(
        "https://music.youtube.com/watch?v={}&list=RDAMVM{}",
        video_id, video_id
    )
}

fn playlist_entries(payload: &Value) -> Vec<Value> {
    payload
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(catalog_record).collect())
        .unwrap_or_default()
}

/// Reshapes a yt-dlp entry into the catalog record layout
/// (`videoId`, `title`, `artists[].name`, `thumbnails[].url`, `duration`).
/// Fields yt-dlp did not report are left out.
pub fn catalog_record(entry: &Value) -> Value {
    let mut record = Map::new();
    if let Some(id) = entry.get("id").and_then(Value::as_str) {
        record.insert("videoId".to_string(), json!(id));
    }
    if let Some(title) = first_str(entry, &["track", "title"]) {
        record.insert("title".to_string(), json!(title));
    }
    if let Some(artist) = entry_artist(entry) {
        record.insert("artists".to_string(), json!([{ "name": artist }]));
    }
    if let Some(thumbnails) = entry.get("thumbnails").and_then(Value::as_array) {
        let thumbnails: Vec<Value> = thumbnails
            .iter()
            .filter(|thumb| thumb.get("url").and_then(Value::as_str).is_some())
            .cloned()
            .collect();
        record.insert("thumbnails".to_string(), Value::Array(thumbnails));
    } else if let Some(thumb) = entry.get("thumbnail").and_then(Value::as_str) {
        record.insert("thumbnail".to_string(), json!([{ "url": thumb }]));
    }
    if let Some(secs) = entry.get("duration").and_then(Value::as_f64) {
        if secs.is_finite() && secs >= 0.0 {
            record.insert(
                "duration".to_string(),
                json!(format_duration_secs(secs.round() as u64)),
            );
        }
    }
    Value::Object(record)
}

fn entry_artist(entry: &Value) -> Option<String> {
    let listed = entry
        .get("artists")
        .and_then(Value::as_array)
        .and_then(|artists| artists.first())
        .and_then(Value::as_str);
    let name = listed.or_else(|| first_str(entry, &["artist", "creator", "channel", "uploader"]))?;
    let name = name.strip_suffix(TOPIC_SUFFIX).unwrap_or(name).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn first_str<'a>(entry: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
}
