//! Remote document store: the trait the engine talks to and its GitHub
//! Gist implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::error::SyncError;

/// Default GitHub REST endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_LOG_BODY_CHARS: usize = 300;

/// A file inside a remote document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A remote document: an id plus a map of filename to file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub files: BTreeMap<String, RemoteFile>,
}

impl RemoteDocument {
    /// Content of the sync file.
    ///
    /// Prefers `preferred` when it has non-empty content, otherwise the first
    /// file whose name ends in `.json` (case-insensitive).
    pub fn sync_content(&self, preferred: &str) -> Option<&str> {
        if let Some(content) = self
            .files
            .get(preferred)
            .and_then(|f| f.content.as_deref())
            .filter(|c| !c.is_empty())
        {
            return Some(content);
        }

        self.files.iter().find_map(|(key, file)| {
            let name = file.filename.as_deref().unwrap_or(key);
            if name.to_lowercase().ends_with(".json") {
                file.content.as_deref()
            } else {
                None
            }
        })
    }
}

/// Operations the sync engine needs from a remote document store.
///
/// Every call carries the optional bearer credential; authentication
/// failures come back as [`SyncError::Transport`] with the store's message.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &str, credential: Option<&str>) -> Result<RemoteDocument, SyncError>;

    /// Creates a document and returns it with its store-assigned id.
    async fn create(
        &self,
        description: &str,
        public: bool,
        files: &BTreeMap<String, String>,
        credential: Option<&str>,
    ) -> Result<RemoteDocument, SyncError>;

    /// Replaces the content of the given files in place.
    async fn update(
        &self,
        id: &str,
        files: &BTreeMap<String, String>,
        credential: Option<&str>,
    ) -> Result<(), SyncError>;
}

/// GitHub Gist client.
#[derive(Debug, Clone)]
pub struct GistClient {
    client: reqwest::Client,
    base_url: String,
}

impl GistClient {
    /// Creates a client for the given API root (e.g. `https://api.github.com`).
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("daybook/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn gists_url(&self) -> String {
        format!("{}/gists", self.base_url)
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.base_url, urlencoding::encode(id))
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        credential: Option<&str>,
    ) -> Result<RequestBuilder, SyncError> {
        let mut builder = self.client.request(method, url);
        if let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SyncError::network("Invalid token format"))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SyncError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        log_response(status, &body);

        if !status.is_success() {
            return Err(SyncError::http(
                status.as_u16(),
                error_message(status.as_u16(), &body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            SyncError::http(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl DocumentStore for GistClient {
    async fn get(&self, id: &str, credential: Option<&str>) -> Result<RemoteDocument, SyncError> {
        let request = self.request(Method::GET, &self.gist_url(id), credential)?;
        Self::send(request).await
    }

    async fn create(
        &self,
        description: &str,
        public: bool,
        files: &BTreeMap<String, String>,
        credential: Option<&str>,
    ) -> Result<RemoteDocument, SyncError> {
        let body = json!({
            "description": description,
            "public": public,
            "files": files_body(files),
        });
        let request = self
            .request(Method::POST, &self.gists_url(), credential)?
            .json(&body);
        Self::send(request).await
    }

    async fn update(
        &self,
        id: &str,
        files: &BTreeMap<String, String>,
        credential: Option<&str>,
    ) -> Result<(), SyncError> {
        let body = json!({ "files": files_body(files) });
        let request = self
            .request(Method::PATCH, &self.gist_url(id), credential)?
            .json(&body);
        let _: Value = Self::send(request).await?;
        Ok(())
    }
}

fn files_body(files: &BTreeMap<String, String>) -> Value {
    files
        .iter()
        .map(|(name, content)| (name.clone(), json!({ "content": content })))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Message for a failed response: the API's `message` field when the body
/// carries one, otherwise `HTTP <status>`.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v.get("message") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| format!("HTTP {}", status))
}

fn log_response(status: reqwest::StatusCode, body: &str) {
    if status.is_success() {
        debug!("Gist API response status: {}", status);
        return;
    }
    let mut preview: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    debug!("Gist API error ({}): {}", status, preview);
}
