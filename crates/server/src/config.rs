use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use library::LibraryStore;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 2;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub port: u16,
    pub bind_addr: String,
    /// Empty means `~/neon_pulse_data.json`.
    pub library_path: String,
    pub web_root: String,
    pub ytdlp_path: String,
    pub home_genres: Vec<String>,
    pub home_limit: usize,
    pub search_limit: usize,
    pub recommend_limit: usize,
    pub external_timeout_secs: u64,
    pub lyrics_enabled: bool,
    pub open_browser: bool,
    pub open_browser_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            library_path: "".to_string(),
            web_root: "web".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            home_genres: default_home_genres(),
            home_limit: 12,
            search_limit: 20,
            recommend_limit: 10,
            external_timeout_secs: 30,
            lyrics_enabled: true,
            open_browser: true,
            open_browser_delay_ms: 1000,
        }
    }
}

fn default_home_genres() -> Vec<String> {
    ["Cyberpunk", "Synthwave", "Phonk", "Dark Techno", "Future Garage"]
        .iter()
        .map(|genre| genre.to_string())
        .collect()
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn browser_url(&self) -> String {
        let host = match self.bind_addr.as_str() {
            "0.0.0.0" | "::" | "" => DEFAULT_BIND_ADDR,
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Yaml(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("NEON_PULSE_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = if contents.trim().is_empty() {
            ServerConfig::default()
        } else {
            serde_yaml::from_str(&contents)?
        };
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.recommend_limit == 0 {
            config.recommend_limit = 10;
        }
        if config.port == 0 {
            config.port = DEFAULT_PORT;
        }
        if config.bind_addr.trim().is_empty() {
            config.bind_addr = DEFAULT_BIND_ADDR.to_string();
        }
        if config.ytdlp_path.trim().is_empty() {
            config.ytdlp_path = "yt-dlp".to_string();
        }
        if config.home_genres.iter().all(|genre| genre.trim().is_empty()) {
            config.home_genres = default_home_genres();
        }
        if config.home_limit == 0 {
            config.home_limit = 12;
        }
        if config.search_limit == 0 {
            config.search_limit = 20;
        }
        if config.external_timeout_secs == 0 {
            config.external_timeout_secs = 30;
        }
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

pub fn library_store(
    config_path: &Path,
    config: &ServerConfig,
) -> Result<LibraryStore, library::LibraryError> {
    let value = config.library_path.trim();
    if value.is_empty() {
        LibraryStore::at_home()
    } else {
        Ok(LibraryStore::new(resolve_path(config_path, value)))
    }
}
