use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use library::LibraryStore;
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::gateway::{CatalogGateway, GatewayError, MediaResolver};
use crate::state::AppState;

/// Canned catalog used by handler tests; never touches the network.
#[derive(Default)]
pub struct FakeCatalog {
    pub records: Vec<Value>,
    pub lyrics: Option<String>,
    pub fail: bool,
    pub media_url: Option<String>,
}

#[async_trait]
impl CatalogGateway for FakeCatalog {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<Value>, GatewayError> {
        if self.fail {
            return Err(GatewayError::Timeout);
        }
        Ok(self.records.iter().take(limit).cloned().collect())
    }

    async fn watch_playlist(
        &self,
        _video_id: &str,
        limit: usize,
    ) -> Result<Vec<Value>, GatewayError> {
        self.search("", limit).await
    }

    async fn lyrics(&self, _video_id: &str) -> Result<Option<String>, GatewayError> {
        if self.fail {
            return Err(GatewayError::Timeout);
        }
        Ok(self.lyrics.clone())
    }
}

#[async_trait]
impl MediaResolver for FakeCatalog {
    async fn resolve_audio(&self, _video_id: &str) -> Result<String, GatewayError> {
        self.media_url.clone().ok_or(GatewayError::NoMedia)
    }
}

pub fn test_state(dir: &Path, catalog: FakeCatalog) -> AppState {
    let catalog = Arc::new(catalog);
    AppState {
        config_path: dir.join("config.yaml"),
        config: Arc::new(RwLock::new(ServerConfig::default())),
        library: LibraryStore::new(dir.join("library.json")),
        catalog: catalog.clone(),
        media: catalog,
        http_client: Client::builder().no_proxy().build().unwrap(),
    }
}
