use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::gateway::GatewayError;

const LRCLIB_SEARCH_URL: &str = "https://lrclib.net/api/search";

#[derive(Deserialize)]
struct LrcLibEntry {
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    instrumental: Option<bool>,
}

/// Plain-text lyrics from LRCLIB for an artist/title pair.
pub async fn fetch_lyrics(
    client: &Client,
    timeout: Duration,
    artist: &str,
    title: &str,
) -> Result<Option<String>, GatewayError> {
    let title = title.trim();
    if title.is_empty() {
        return Ok(None);
    }
    let mut params = vec![("track_name", title)];
    let artist = artist.trim();
    if !artist.is_empty() {
        params.push(("artist_name", artist));
    }
    let response = client
        .get(LRCLIB_SEARCH_URL)
        .query(&params)
        .timeout(timeout)
        .send()
        .await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    let entries = response.json::<Vec<LrcLibEntry>>().await?;
    Ok(pick_lyrics(entries))
}

fn pick_lyrics(entries: Vec<LrcLibEntry>) -> Option<String> {
    entries
        .into_iter()
        .filter(|entry| !entry.instrumental.unwrap_or(false))
        .find_map(|entry| clean_text(entry.plain_lyrics))
}

fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
