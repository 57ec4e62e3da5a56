use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use common::Track;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DATA_FILE_NAME: &str = "neon_pulse_data.json";

/// Everything the user has saved: liked tracks and named playlists.
/// Playlists keep their creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDocument {
    #[serde(default)]
    pub liked: Vec<Track>,
    #[serde(default)]
    pub playlists: IndexMap<String, Vec<Track>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

#[derive(Clone, Debug)]
pub struct LikeOutcome {
    pub status: LikeStatus,
    pub liked: Vec<Track>,
}

/// JSON file backed store for the [`LibraryDocument`].
///
/// Nothing is cached between calls: each operation reads the whole file,
/// applies its change and writes the whole file back. Concurrent writers
/// are not coordinated; the last save wins.
#[derive(Clone, Debug)]
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located in the user's home directory, so the data survives
    /// moving the executable around.
    pub fn at_home() -> Result<Self, LibraryError> {
        let home = dirs::home_dir().ok_or(LibraryError::HomeDirUnavailable)?;
        Ok(Self::new(home.join(DATA_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an empty document if the file does not exist yet.
    pub fn ensure_exists(&self) -> Result<bool, LibraryError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&LibraryDocument::default())?;
        Ok(true)
    }

    pub fn load(&self) -> Result<LibraryDocument, LibraryError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(LibraryDocument::default());
            }
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(document),
            Err(err) => {
                warn!(
                    "Library file {:?} is unreadable ({}); starting from an empty library",
                    self.path, err
                );
                Ok(LibraryDocument::default())
            }
        }
    }

    /// Writes the whole document to a sibling temp file and renames it over
    /// the library, so readers see either the old or the new document.
    pub fn save(&self, document: &LibraryDocument) -> Result<(), LibraryError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&buf)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Load, apply `mutate`, then save unconditionally.
    pub fn transact<T>(
        &self,
        mutate: impl FnOnce(&mut LibraryDocument) -> T,
    ) -> Result<T, LibraryError> {
        let mut document = self.load()?;
        let result = mutate(&mut document);
        self.save(&document)?;
        Ok(result)
    }

    pub fn toggle_liked(&self, track: Track) -> Result<LikeOutcome, LibraryError> {
        require_track_id(&track.id)?;
        self.transact(|document| {
            let status = match document.liked.iter().position(|t| t.id == track.id) {
                Some(index) => {
                    document.liked.remove(index);
                    LikeStatus::Unliked
                }
                None => {
                    document.liked.push(track);
                    LikeStatus::Liked
                }
            };
            LikeOutcome {
                status,
                liked: document.liked.clone(),
            }
        })
    }

    /// Returns `true` when the playlist was newly created.
    pub fn create_playlist(&self, name: &str) -> Result<bool, LibraryError> {
        require_playlist_name(name)?;
        self.transact(|document| {
            if document.playlists.contains_key(name) {
                return false;
            }
            document.playlists.insert(name.to_string(), Vec::new());
            true
        })
    }

    /// Returns `true` when a playlist was removed.
    pub fn delete_playlist(&self, name: &str) -> Result<bool, LibraryError> {
        self.transact(|document| document.playlists.shift_remove(name).is_some())
    }

    /// Appends `track` to an existing playlist. Unknown playlists are not
    /// created and a track already present is not added twice; both cases
    /// return `false`. The track id is only checked once the playlist is
    /// known to exist.
    pub fn add_to_playlist(&self, name: &str, track: Track) -> Result<bool, LibraryError> {
        self.transact(|document| {
            let Some(tracks) = document.playlists.get_mut(name) else {
                debug!("add_to_playlist: no playlist named {:?}", name);
                return Ok(false);
            };
            require_track_id(&track.id)?;
            if tracks.iter().any(|t| t.id == track.id) {
                return Ok(false);
            }
            tracks.push(track);
            Ok(true)
        })?
    }

    /// Returns how many entries were removed.
    pub fn remove_from_playlist(&self, name: &str, track_id: &str) -> Result<usize, LibraryError> {
        self.transact(|document| match document.playlists.get_mut(name) {
            Some(tracks) => {
                let before = tracks.len();
                tracks.retain(|t| t.id != track_id);
                before - tracks.len()
            }
            None => 0,
        })
    }
}

fn require_track_id(id: &str) -> Result<(), LibraryError> {
    if id.trim().is_empty() {
        Err(LibraryError::EmptyTrackId)
    } else {
        Ok(())
    }
}

fn require_playlist_name(name: &str) -> Result<(), LibraryError> {
    if name.trim().is_empty() {
        Err(LibraryError::EmptyPlaylistName)
    } else {
        Ok(())
    }
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Json(serde_json::Error),
    HomeDirUnavailable,
    EmptyTrackId,
    EmptyPlaylistName,
}

impl LibraryError {
    /// Rejected input, as opposed to a storage failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            LibraryError::EmptyTrackId | LibraryError::EmptyPlaylistName
        )
    }
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Json(err) => write!(f, "json error: {}", err),
            LibraryError::HomeDirUnavailable => write!(f, "unable to resolve home directory"),
            LibraryError::EmptyTrackId => write!(f, "track id is required"),
            LibraryError::EmptyPlaylistName => write!(f, "playlist name is required"),
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Io(err) => Some(err),
            LibraryError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use common::Track;
    use tempfile::TempDir;

    use super::{LibraryDocument, LibraryError, LibraryStore, LikeStatus};

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: "T".to_string(),
            artist: "A".to_string(),
            thumb: "u".to_string(),
            duration: "3:00".to_string(),
        }
    }

    fn temp_store() -> (TempDir, LibraryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::new(dir.path().join("library.json"));
        (dir, store)
    }

    #[test]
    fn load_missing_file_is_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load().unwrap(), LibraryDocument::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn load_garbage_is_empty() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), b"{not json").unwrap();
        assert_eq!(store.load().unwrap(), LibraryDocument::default());
    }

    #[test]
    fn load_tolerates_missing_keys() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), br#"{"liked": []}"#).unwrap();
        let document = store.load().unwrap();
        assert!(document.playlists.is_empty());
    }

    #[test]
    fn ensure_exists_writes_empty_document_once() {
        let (_dir, store) = temp_store();
        assert!(store.ensure_exists().unwrap());
        assert!(!store.ensure_exists().unwrap());
        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"liked": [], "playlists": {}}));
    }

    #[test]
    fn toggle_liked_twice_restores_state() {
        let (_dir, store) = temp_store();
        let first = store.toggle_liked(track("abc")).unwrap();
        assert_eq!(first.status, LikeStatus::Liked);
        assert_eq!(first.liked.len(), 1);

        let second = store.toggle_liked(track("abc")).unwrap();
        assert_eq!(second.status, LikeStatus::Unliked);
        assert!(second.liked.is_empty());
        assert!(store.load().unwrap().liked.is_empty());
    }

    #[test]
    fn toggle_liked_keeps_order() {
        let (_dir, store) = temp_store();
        store.toggle_liked(track("a")).unwrap();
        store.toggle_liked(track("b")).unwrap();
        store.toggle_liked(track("c")).unwrap();
        let outcome = store.toggle_liked(track("b")).unwrap();
        let ids: Vec<&str> = outcome.liked.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn rejects_empty_ids_and_names() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.toggle_liked(track("")),
            Err(LibraryError::EmptyTrackId)
        ));
        assert!(matches!(
            store.create_playlist("  "),
            Err(LibraryError::EmptyPlaylistName)
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn add_to_missing_playlist_does_not_create_it() {
        let (_dir, store) = temp_store();
        assert!(!store.add_to_playlist("X", track("abc")).unwrap());
        let document = store.load().unwrap();
        assert!(document.playlists.is_empty());
        // no-ops still write through
        assert!(store.path().exists());
    }

    #[test]
    fn create_add_remove_leaves_empty_playlist() {
        let (_dir, store) = temp_store();
        let t = track("abc");
        assert!(store.create_playlist("Chill").unwrap());
        assert!(store.add_to_playlist("Chill", t.clone()).unwrap());
        assert_eq!(store.remove_from_playlist("Chill", &t.id).unwrap(), 1);
        let document = store.load().unwrap();
        assert_eq!(document.playlists.get("Chill"), Some(&Vec::new()));
    }

    #[test]
    fn night_playlist_scenario() {
        let (_dir, store) = temp_store();
        store.save(&LibraryDocument::default()).unwrap();

        store.create_playlist("Night").unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"liked": [], "playlists": {"Night": []}}));

        assert!(store.add_to_playlist("Night", track("abc")).unwrap());
        assert!(!store.add_to_playlist("Night", track("abc")).unwrap());
        let document = store.load().unwrap();
        let night = &document.playlists["Night"];
        assert_eq!(night.len(), 1);
        assert_eq!(night[0].id, "abc");
    }

    #[test]
    fn create_existing_playlist_keeps_tracks() {
        let (_dir, store) = temp_store();
        store.create_playlist("Night").unwrap();
        store.add_to_playlist("Night", track("abc")).unwrap();
        assert!(!store.create_playlist("Night").unwrap());
        assert_eq!(store.load().unwrap().playlists["Night"].len(), 1);
    }

    #[test]
    fn playlists_keep_creation_order() {
        let (_dir, store) = temp_store();
        store.create_playlist("Zed").unwrap();
        store.create_playlist("Alpha").unwrap();
        let names: Vec<String> = store.load().unwrap().playlists.keys().cloned().collect();
        assert_eq!(names, vec!["Zed", "Alpha"]);
        store.create_playlist("Mid").unwrap();
        store.delete_playlist("Zed").unwrap();
        store.create_playlist("Zed").unwrap();
        let names: Vec<String> = store.load().unwrap().playlists.keys().cloned().collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zed"]);

        let raw = fs::read_to_string(store.path()).unwrap();
        let alpha = raw.find("\"Alpha\"").unwrap();
        let mid = raw.find("\"Mid\"").unwrap();
        assert!(alpha < mid);
    }

    #[test]
    fn empty_id_on_missing_playlist_is_noop() {
        let (_dir, store) = temp_store();
        assert!(!store.add_to_playlist("Nope", track("")).unwrap());
        store.create_playlist("Night").unwrap();
        assert!(matches!(
            store.add_to_playlist("Night", track("")),
            Err(LibraryError::EmptyTrackId)
        ));
        assert!(store.load().unwrap().playlists["Night"].is_empty());
    }

    #[test]
    fn concurrent_loads_never_see_partial_document() {
        let (_dir, store) = temp_store();
        let document = LibraryDocument {
            liked: (0..2000).map(|i| track(&format!("t{}", i))).collect(),
            ..LibraryDocument::default()
        };
        store.save(&document).unwrap();

        std::thread::scope(|scope| {
            let writer = scope.spawn(|| {
                for _ in 0..100 {
                    store.save(&document).unwrap();
                }
            });
            while !writer.is_finished() {
                assert_eq!(store.load().unwrap().liked.len(), 2000);
            }
        });
        assert_eq!(store.load().unwrap(), document);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let (dir, store) = temp_store();
        store.create_playlist("Night").unwrap();
        store.toggle_liked(track("abc")).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn playlist_names_are_case_sensitive() {
        let (_dir, store) = temp_store();
        store.create_playlist("night").unwrap();
        store.create_playlist("Night").unwrap();
        assert_eq!(store.load().unwrap().playlists.len(), 2);
    }

    #[test]
    fn delete_playlist_is_idempotent() {
        let (_dir, store) = temp_store();
        store.create_playlist("Gone").unwrap();
        assert!(store.delete_playlist("Gone").unwrap());
        assert!(!store.delete_playlist("Gone").unwrap());
        assert!(store.load().unwrap().playlists.is_empty());
    }

    #[test]
    fn remove_from_missing_playlist_is_noop() {
        let (_dir, store) = temp_store();
        assert_eq!(store.remove_from_playlist("Nope", "abc").unwrap(), 0);
        assert!(store.load().unwrap().playlists.is_empty());
    }

    #[test]
    fn saved_file_uses_track_keys() {
        let (_dir, store) = temp_store();
        store.toggle_liked(track("abc")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw["liked"][0],
            serde_json::json!({
                "id": "abc",
                "title": "T",
                "artist": "A",
                "thumb": "u",
                "duration": "3:00",
            })
        );
    }

    #[test]
    fn io_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let store = LibraryStore::new(dir.path());
        assert!(matches!(store.load(), Err(LibraryError::Io(_))));
    }
}
