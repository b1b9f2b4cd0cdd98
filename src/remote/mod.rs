//! HTTP client for the per-user account document service.
//!
//! Each user has a single account document holding the synced slices of
//! their local data. The document is read whole and written one slice at a
//! time; the service applies last-writer-wins per slice.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SyncConfig;
use crate::models::{CustomGroup, CustomTile, GameBoard};

/// Errors that can occur talking to the account service.
#[derive(Debug)]
pub enum RemoteError {
    /// Sync is not configured
    NotConfigured,
    /// Failed to reach the server
    ConnectionError(String),
    /// Server answered with a non-success status
    HttpError(u16, String),
    /// Response body could not be decoded
    DecodeError(String),
    /// Request body could not be encoded
    EncodeError(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::NotConfigured => write!(
                f,
                "Sync not configured. Add server_url and api_key to config."
            ),
            RemoteError::ConnectionError(e) => write!(f, "Connection error: {}", e),
            RemoteError::HttpError(status, body) => {
                write!(f, "Server error {}: {}", status, body)
            }
            RemoteError::DecodeError(e) => write!(f, "Failed to decode response: {}", e),
            RemoteError::EncodeError(e) => write!(f, "Failed to encode request: {}", e),
        }
    }
}

impl std::error::Error for RemoteError {}

/// The per-user account document. Slices written by older clients may be
/// absent; every field defaults to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "customTiles", default)]
    pub custom_tiles: Vec<CustomTile>,
    #[serde(rename = "customGroups", default)]
    pub custom_groups: Vec<CustomGroup>,
    #[serde(rename = "disabledDefaults", default)]
    pub disabled_defaults: Vec<String>,
    #[serde(rename = "gameBoards", default)]
    pub game_boards: Vec<GameBoard>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

/// Strips the local `id` field from each item of a serialized slice before
/// a cross-store write.
///
/// Local row ids and remote ids are independently assigned; letting one
/// store's ids leak into the other invites primary-key collisions. Only
/// top-level item ids are stripped; nested ids (a group's intensity levels)
/// are real data.
pub fn strip_local_ids(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    map.remove("id");
                }
            }
        }
        Value::Object(map) => {
            map.remove("id");
        }
        _ => {}
    }
}

/// Client for the account document service.
pub struct AccountClient {
    http: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl AccountClient {
    /// Creates a client from config.
    ///
    /// Returns an error if sync is not configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, RemoteError> {
        let server_url = config
            .server_url
            .clone()
            .ok_or(RemoteError::NotConfigured)?;
        let api_key = config.api_key.clone().ok_or(RemoteError::NotConfigured)?;

        Ok(Self::new(server_url, api_key))
    }

    /// Creates a client with explicit parameters.
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            http: reqwest::Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn document_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/document", self.server_url, user_id)
    }

    fn slice_url(&self, user_id: &str, slice: &str) -> String {
        format!("{}/{}", self.document_url(user_id), slice)
    }

    /// Fetches the user's account document.
    ///
    /// Absence (404) is a valid state — the user has never synced — and is
    /// reported as `None`, not an error.
    pub async fn fetch_user_document(
        &self,
        user_id: &str,
    ) -> Result<Option<UserDocument>, RemoteError> {
        let response = self
            .http
            .get(self.document_url(user_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::ConnectionError(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::HttpError(status, body));
        }

        let document = response
            .json::<UserDocument>()
            .await
            .map_err(|e| RemoteError::DecodeError(e.to_string()))?;

        Ok(Some(document))
    }

    async fn put_slice(
        &self,
        user_id: &str,
        slice: &str,
        body: Value,
    ) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(self.slice_url(user_id, slice))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::HttpError(status, body));
        }

        Ok(())
    }

    pub async fn push_custom_tiles(
        &self,
        user_id: &str,
        tiles: &[CustomTile],
    ) -> Result<(), RemoteError> {
        let mut body =
            serde_json::to_value(tiles).map_err(|e| RemoteError::EncodeError(e.to_string()))?;
        strip_local_ids(&mut body);
        self.put_slice(user_id, "customTiles", body).await
    }

    /// Pushes custom groups. Group ids are the stable join key shared by
    /// both stores, so they are not stripped.
    pub async fn push_custom_groups(
        &self,
        user_id: &str,
        groups: &[CustomGroup],
    ) -> Result<(), RemoteError> {
        let body =
            serde_json::to_value(groups).map_err(|e| RemoteError::EncodeError(e.to_string()))?;
        self.put_slice(user_id, "customGroups", body).await
    }

    pub async fn push_disabled_defaults(
        &self,
        user_id: &str,
        refs: &[String],
    ) -> Result<(), RemoteError> {
        let body =
            serde_json::to_value(refs).map_err(|e| RemoteError::EncodeError(e.to_string()))?;
        self.put_slice(user_id, "disabledDefaults", body).await
    }

    pub async fn push_game_boards(
        &self,
        user_id: &str,
        boards: &[GameBoard],
    ) -> Result<(), RemoteError> {
        let mut body =
            serde_json::to_value(boards).map_err(|e| RemoteError::EncodeError(e.to_string()))?;
        strip_local_ids(&mut body);
        self.put_slice(user_id, "gameBoards", body).await
    }

    pub async fn push_settings(
        &self,
        user_id: &str,
        settings: &Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let body = Value::Object(settings.clone());
        self.put_slice(user_id, "settings", body).await
    }

    /// Fast reachability probe, used before opportunistic auto-sync.
    pub async fn check_server(&self) -> bool {
        let url = format!("{}/health", self.server_url);
        match self.http.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_from_config_requires_url_and_key() {
        let config = SyncConfig {
            server_url: Some("https://sync.example.com".to_string()),
            api_key: None,
            user_id: Some("u1".to_string()),
            auto_sync: false,
        };
        assert!(matches!(
            AccountClient::from_config(&config),
            Err(RemoteError::NotConfigured)
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = AccountClient::new("https://sync.example.com/", "key");
        assert_eq!(
            client.document_url("u1"),
            "https://sync.example.com/users/u1/document"
        );
        assert_eq!(
            client.slice_url("u1", "customTiles"),
            "https://sync.example.com/users/u1/document/customTiles"
        );
    }

    #[test]
    fn test_strip_local_ids_top_level_only() {
        let mut value = json!([
            {"id": 7, "group_id": "g1", "intensities": [{"id": 1, "value": 1}]}
        ]);
        strip_local_ids(&mut value);

        assert!(value[0].get("id").is_none());
        // Nested ids are real data, not local row ids.
        assert_eq!(value[0]["intensities"][0]["id"], json!(1));
    }

    #[test]
    fn test_user_document_defaults_when_slices_absent() {
        let document: UserDocument = serde_json::from_str(r#"{"settings": {"a": 1}}"#).unwrap();
        assert!(document.custom_tiles.is_empty());
        assert!(document.game_boards.is_empty());
        assert_eq!(document.settings.get("a"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_fetch_user_document_includes_bearer_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/u1/document"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customTiles": [{"group_id": "g1", "intensity": 1, "action": "Clap"}]
            })))
            .mount(&server)
            .await;

        let client = AccountClient::new(server.uri(), "test-key");
        let document = client.fetch_user_document("u1").await.unwrap().unwrap();

        assert_eq!(document.custom_tiles.len(), 1);
        assert_eq!(document.custom_tiles[0].action, "Clap");
    }

    #[tokio::test]
    async fn test_fetch_user_document_absent_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/u1/document"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = AccountClient::new(server.uri(), "test-key");
        assert!(client.fetch_user_document("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_user_document_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/u1/document"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AccountClient::new(server.uri(), "test-key");
        assert!(matches!(
            client.fetch_user_document("u1").await,
            Err(RemoteError::HttpError(500, _))
        ));
    }

    #[tokio::test]
    async fn test_push_custom_tiles_strips_local_ids() {
        let server = MockServer::start().await;

        let mut tile = CustomTile::new("g1", 2, "Sing");
        tile.id = Some(42);

        Mock::given(method("PUT"))
            .and(path("/users/u1/document/customTiles"))
            .and(body_json(json!([{
                "group_id": "g1",
                "intensity": 2,
                "action": "Sing",
                "tags": [],
                "gameMode": "online",
                "locale": "en",
                "isCustom": true,
                "isEnabled": true
            }])))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = AccountClient::new(server.uri(), "test-key");
        client.push_custom_tiles("u1", &[tile]).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_server() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = AccountClient::new(server.uri(), "test-key");
        assert!(client.check_server().await);

        let dead = AccountClient::new("http://127.0.0.1:1", "test-key");
        assert!(!dead.check_server().await);
    }
}
