//! HTTP implementation of the memory gateway.

use super::{Connection, Connector, MemoryApi, Timeout};
use crate::auth::{CredentialStore, Credentials};
use crate::config::{Config, HttpConfig};
use crate::error::{Error, Result};
use crate::types::*;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the memory server.
#[derive(Clone)]
pub struct RemoteClient {
    /// `<serverUrl>/api`
    base_url: String,
    client: reqwest::Client,
}

impl RemoteClient {
    /// Create a client that authenticates every request with the stored token.
    pub fn new(creds: &Credentials, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", creds.token))
            .map_err(|_| Error::Config("Token contains characters not allowed in a header".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: creds.api_base(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("API request: {} {}", method, url);
        self.client.request(method, url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let resp = self.send(self.request(Method::GET, path).query(query)).await?;
        Ok(resp.json().await?)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(resp.json().await?)
    }

    /// POST where the response body is irrelevant (and may be empty).
    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(())
    }

    /// Send a request, turning non-2xx responses into errors.
    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::remote(status.as_u16(), extract_error_message(status, &body)))
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Prefers the JSON `error` field, then `message`, then the raw body, then the
/// status reason.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(|r| format!("{} {}", status.as_u16(), r))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl MemoryApi for RemoteClient {
    async fn append_log(&self, entry: &NewLogEntry) -> Result<AppendLogResponse> {
        self.post("/logs", entry).await
    }

    async fn recent_logs(&self, project: &str, limit: u32) -> Result<Vec<LogEntry>> {
        let list: LogList = self
            .get(
                "/logs/recent",
                &[("project", project.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(list.logs)
    }

    async fn sessions(&self, project: &str, machine_id: &str, limit: u32) -> Result<SessionList> {
        self.get(
            "/logs/sessions",
            &[
                ("project", project.to_string()),
                ("machineId", machine_id.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn search_logs(&self, query: &SearchQuery) -> Result<Vec<LogEntry>> {
        let mut params = vec![("q", query.query.clone()), ("limit", query.limit.to_string())];
        if let Some(ref project) = query.project {
            params.push(("project", project.clone()));
        }
        if let Some(entry_type) = query.entry_type {
            params.push(("type", entry_type.as_str().to_string()));
        }

        let list: LogList = self.get("/logs/search", &params).await?;
        Ok(list.logs)
    }

    async fn store_file(&self, request: &StoreFileRequest) -> Result<StoreFileResponse> {
        self.post("/files/store", request).await
    }

    async fn latest_file(&self, project: &str, file_path: &str) -> Result<Option<RemoteFile>> {
        let req = self.request(Method::GET, "/files/latest").query(&[
            ("project", project),
            ("filePath", file_path),
        ]);

        match self.send(req).await {
            Ok(resp) => {
                // Some deployments answer 200 with a null body for unknown files
                let value: serde_json::Value = resp.json().await?;
                if value.is_null() {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_value(value)?))
            }
            Err(Error::Remote { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn share_file(&self, project: &str, file_path: &str) -> Result<()> {
        let body = FileRef {
            project: project.to_string(),
            file_path: file_path.to_string(),
        };
        self.post_unit("/files/share", &body).await
    }

    async fn unshare_file(&self, project: &str, file_path: &str) -> Result<()> {
        let body = FileRef {
            project: project.to_string(),
            file_path: file_path.to_string(),
        };
        self.post_unit("/files/unshare", &body).await
    }

    async fn shared_files(&self, project: &str) -> Result<Vec<SharedFile>> {
        let list: SharedFileList = self
            .get("/files/shared", &[("project", project.to_string())])
            .await?;
        Ok(list.files)
    }

    async fn sync_status(&self, project: &str, files: &[FileHash]) -> Result<Vec<FileVerdict>> {
        let body = SyncStatusRequest {
            project: project.to_string(),
            files: files.to_vec(),
        };
        let resp: SyncStatusResponse = self.post("/files/sync", &body).await?;
        Ok(resp.files)
    }
}

/// [`Connector`] that reads `credentials.json` on every call.
#[derive(Debug, Clone)]
pub struct CredentialConnector {
    store: CredentialStore,
    http: HttpConfig,
}

impl CredentialConnector {
    pub fn new(store: CredentialStore, http: HttpConfig) -> Self {
        Self { store, http }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CredentialStore::new(config.paths.credentials_file()),
            config.http.clone(),
        )
    }
}

impl Connector for CredentialConnector {
    fn connect(&self, timeout: Timeout) -> Result<Connection> {
        let Some(creds) = self.store.load()? else {
            return Ok(Connection::Unauthenticated);
        };

        let duration = match timeout {
            Timeout::Metadata => self.http.timeout(),
            Timeout::Transfer => self.http.transfer_timeout(),
        };
        let client = RemoteClient::new(&creds, duration)?;
        Ok(Connection::Authenticated(Arc::new(client)))
    }

    fn server_url(&self) -> Option<String> {
        self.store.load().ok().flatten().map(|c| c.server_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RemoteClient {
        let creds = Credentials::new(server.uri(), "secret-token");
        RemoteClient::new(&creds, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_extract_error_message() {
        let s = StatusCode::BAD_REQUEST;
        assert_eq!(extract_error_message(s, r#"{"error":"bad project"}"#), "bad project");
        assert_eq!(extract_error_message(s, r#"{"message":"nope"}"#), "nope");
        assert_eq!(extract_error_message(s, "plain failure\n"), "plain failure");
        assert_eq!(extract_error_message(s, ""), "400 Bad Request");
    }

    #[tokio::test]
    async fn test_append_log_sends_auth_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/logs"))
            .and(header("authorization", "Bearer secret-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "project": "widgets",
                "type": "summary",
                "content": "Finished parser",
                "tags": ["parser"],
                "sessionId": "s1",
                "machineId": "m1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "log_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let entry = NewLogEntry {
            project: "widgets".into(),
            entry_type: LogType::Summary,
            content: "Finished parser".into(),
            tags: vec!["parser".into()],
            session_id: "s1".into(),
            machine_id: "m1".into(),
            git_branch: None,
            git_commit: None,
            directory: None,
        };
        let resp = client_for(&server).append_log(&entry).await.unwrap();
        assert_eq!(resp.id.as_deref(), Some("log_1"));
    }

    #[tokio::test]
    async fn test_search_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/logs/search"))
            .and(query_param("q", "sqlite"))
            .and(query_param("type", "decision"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs": [{"type": "decision", "content": "Use SQLite", "project": "widgets"}]
            })))
            .mount(&server)
            .await;

        let results = client_for(&server)
            .search_logs(&SearchQuery {
                query: "sqlite".into(),
                project: None,
                entry_type: Some(EntryType::Decision),
                limit: 5,
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Use SQLite");
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files/shared"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Token revoked"})))
            .mount(&server)
            .await;

        let err = client_for(&server).shared_files("widgets").await.unwrap_err();
        match &err {
            Error::Remote { status, message } => {
                assert_eq!(*status, 403);
                assert_eq!(message, "Token revoked");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.user_message(), "Token revoked");
    }

    #[tokio::test]
    async fn test_latest_file_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files/latest"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "File not found"})))
            .mount(&server)
            .await;

        let latest = client_for(&server).latest_file("widgets", "a.txt").await.unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_latest_file_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files/latest"))
            .and(query_param("filePath", "docs/a.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": "hello", "contentHash": "5d41402abc4b2a76b9719d911017c592"
            })))
            .mount(&server)
            .await;

        let latest = client_for(&server)
            .latest_file("widgets", "docs/a.txt")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.content, "hello");
    }

    #[tokio::test]
    async fn test_share_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files/share"))
            .and(body_json(json!({"project": "widgets", "filePath": "a.txt"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).share_file("widgets", "a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_status_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files/sync"))
            .and(body_json(json!({
                "project": "widgets",
                "files": [{"filePath": "a.txt", "contentHash": ""}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [{"filePath": "a.txt", "status": "download_needed"}]
            })))
            .mount(&server)
            .await;

        let verdicts = client_for(&server)
            .sync_status(
                "widgets",
                &[FileHash {
                    file_path: "a.txt".into(),
                    content_hash: String::new(),
                }],
            )
            .await
            .unwrap();
        assert_eq!(verdicts[0].status, SyncStatus::DownloadNeeded);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) is almost never listening
        let creds = Credentials::new("http://127.0.0.1:9", "t");
        let client = RemoteClient::new(&creds, Duration::from_secs(2)).unwrap();
        let err = client.recent_logs("widgets", 5).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn test_connector_without_credentials() {
        let dir = tempdir().unwrap();
        let connector = CredentialConnector::new(
            CredentialStore::new(dir.path().join("credentials.json")),
            HttpConfig::default(),
        );
        if std::env::var("MEMSYNC_TOKEN").is_ok() {
            return;
        }
        let conn = connector.connect(Timeout::Metadata).unwrap();
        assert!(!conn.is_authenticated());
    }

    #[test]
    fn test_connector_with_credentials() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store
            .save(&Credentials::new("https://mem.example.com", "tok"))
            .unwrap();

        let connector = CredentialConnector::new(store, HttpConfig::default());
        assert!(connector.connect(Timeout::Transfer).unwrap().is_authenticated());
        assert!(connector.server_url().is_some());
    }
}
