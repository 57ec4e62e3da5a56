use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PLACEHOLDER_THUMB: &str = "https://via.placeholder.com/200?text=NO_IMG";
pub const UNKNOWN_ARTIST: &str = "Unknown";
pub const ZERO_DURATION: &str = "0:00";

/// A playable catalog item in the shape the UI and the library file use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_artist")]
    pub artist: String,
    #[serde(default = "default_thumb")]
    pub thumb: String,
    #[serde(default = "default_duration")]
    pub duration: String,
}

fn default_artist() -> String {
    UNKNOWN_ARTIST.to_string()
}

fn default_thumb() -> String {
    PLACEHOLDER_THUMB.to_string()
}

fn default_duration() -> String {
    ZERO_DURATION.to_string()
}

/// Read-only view over a loosely-typed catalog record.
///
/// Catalog output is not contractually shaped, so every accessor answers
/// "does the record carry a usable X" and returns `None` otherwise. `null`
/// values are treated the same as missing keys.
#[derive(Clone, Copy, Debug)]
pub struct RawRecord<'a> {
    value: &'a Value,
}

impl<'a> RawRecord<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn field(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|value| !value.is_null())
    }

    pub fn video_id(&self) -> Option<&'a str> {
        self.field("videoId")?
            .as_str()
            .filter(|id| !id.is_empty())
    }

    pub fn title(&self) -> Option<&'a str> {
        self.field("title")?.as_str()
    }

    /// Largest thumbnail URL; catalogs list thumbnails smallest first.
    pub fn thumbnail(&self) -> Option<&'a str> {
        last_url(self.field("thumbnails")).or_else(|| last_url(self.field("thumbnail")))
    }

    pub fn artist(&self) -> Option<&'a str> {
        self.field("artists")?
            .as_array()?
            .first()?
            .get("name")?
            .as_str()
    }

    pub fn duration(&self) -> Option<String> {
        match self.field("duration")? {
            Value::String(text) => Some(text.clone()),
            Value::Number(secs) => secs.as_u64().map(format_duration_secs),
            _ => None,
        }
    }
}

fn last_url(value: Option<&Value>) -> Option<&str> {
    value?.as_array()?.last()?.get("url")?.as_str()
}

/// Converts raw catalog records into tracks, dropping records without an id.
pub fn normalize<'a, I>(records: I) -> Vec<Track>
where
    I: IntoIterator<Item = &'a Value>,
{
    records
        .into_iter()
        .map(RawRecord::new)
        .filter_map(|record| {
            let id = record.video_id()?;
            Some(Track {
                id: id.to_string(),
                title: record.title().unwrap_or_default().to_string(),
                artist: record.artist().unwrap_or(UNKNOWN_ARTIST).to_string(),
                thumb: record.thumbnail().unwrap_or(PLACEHOLDER_THUMB).to_string(),
                duration: record
                    .duration()
                    .unwrap_or_else(|| ZERO_DURATION.to_string()),
            })
        })
        .collect()
}

pub fn format_duration_secs(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{format_duration_secs, normalize, Track, PLACEHOLDER_THUMB};

    #[test]
    fn drops_records_without_usable_id() {
        let records = vec![
            json!({"videoId": "a1", "title": "One"}),
            json!({"title": "No id"}),
            json!({"videoId": null, "title": "Null id"}),
            json!({"videoId": "", "title": "Empty id"}),
            json!({"videoId": "b2", "title": "Two"}),
        ];
        let tracks = normalize(&records);
        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
    }

    #[test]
    fn applies_defaults_for_missing_fields() {
        let records = vec![json!({"videoId": "x", "title": "Bare"})];
        let tracks = normalize(&records);
        assert_eq!(
            tracks,
            vec![Track {
                id: "x".to_string(),
                title: "Bare".to_string(),
                artist: "Unknown".to_string(),
                thumb: PLACEHOLDER_THUMB.to_string(),
                duration: "0:00".to_string(),
            }]
        );
    }

    #[test]
    fn thumbnail_falls_back_to_singular_list() {
        let records = vec![json!({
            "videoId": "x",
            "title": "T",
            "thumbnails": [],
            "thumbnail": [{"url": "X"}],
        })];
        assert_eq!(normalize(&records)[0].thumb, "X");
    }

    #[test]
    fn picks_last_thumbnail_and_first_artist() {
        let records = vec![json!({
            "videoId": "x",
            "title": "T",
            "thumbnails": [{"url": "small"}, {"url": "large"}],
            "thumbnail": [{"url": "ignored"}],
            "artists": [{"name": "First"}, {"name": "Second"}],
            "duration": "3:41",
        })];
        let track = &normalize(&records)[0];
        assert_eq!(track.thumb, "large");
        assert_eq!(track.artist, "First");
        assert_eq!(track.duration, "3:41");
    }

    #[test]
    fn empty_artist_list_is_unknown() {
        let records = vec![json!({"videoId": "x", "title": "T", "artists": []})];
        assert_eq!(normalize(&records)[0].artist, "Unknown");
    }

    #[test]
    fn missing_title_keeps_record() {
        let records = vec![json!({"videoId": "x"})];
        let tracks = normalize(&records);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "");
    }

    #[test]
    fn numeric_duration_is_formatted() {
        let records = vec![json!({"videoId": "x", "title": "T", "duration": 185})];
        assert_eq!(normalize(&records)[0].duration, "3:05");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_duration_secs(0), "0:00");
        assert_eq!(format_duration_secs(3725), "1:02:05");
    }

    #[test]
    fn track_body_defaults_non_id_fields() {
        let track: Track = serde_json::from_str(r#"{"id":"abc","title":"T"}"#).unwrap();
        assert_eq!(track.artist, "Unknown");
        assert_eq!(track.thumb, PLACEHOLDER_THUMB);
        assert_eq!(track.duration, "0:00");
        assert!(serde_json::from_str::<Track>(r#"{"title":"T"}"#).is_err());
    }
}
