//! Implements the `RemoteStore` trait against the Google Drive v3 REST API.

use crate::api::{RemoteStore, TokenProvider};
use crate::error::Res;
use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::trace;

const API: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3/files";
const BOUNDARY: &str = "fintrack_snapshot_boundary";

/// Talks to Drive with an access token from the `TokenProvider`, which is refreshed before each
/// call if it is about to expire.
#[derive(Debug, Clone)]
pub(crate) struct GoogleDrive {
    http: reqwest::Client,
    tokens: Arc<Mutex<TokenProvider>>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

impl GoogleDrive {
    pub(crate) fn new(tokens: TokenProvider) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    /// The `TokenProvider`, shared so that logout can revoke the grant.
    pub(crate) fn tokens(&self) -> Arc<Mutex<TokenProvider>> {
        self.tokens.clone()
    }

    async fn request(&self, method: Method, url: &str) -> Res<RequestBuilder> {
        let token = self.tokens.lock().await.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Uploads `content` with the file metadata as a `multipart/related` body.
    async fn upload(&self, method: Method, url: &str, content: &str) -> Res<Response> {
        let request = self.request(method, url).await?;
        let response = request
            .query(&[("uploadType", "multipart")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(multipart_body(content)?)
            .send()
            .await
            .context("Unable to reach Google Drive")?;
        check(response).await
    }
}

#[async_trait]
impl RemoteStore for GoogleDrive {
    async fn find_file(&self, name: &str) -> Res<Option<String>> {
        trace!("Looking for '{name}' in Google Drive");
        let query = format!("name = '{name}' and trashed = false");
        let response = self
            .request(Method::GET, API)
            .await?
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name)"),
                ("spaces", "drive"),
            ])
            .send()
            .await
            .context("Unable to reach Google Drive")?;
        let list: FileList = check(response)
            .await?
            .json()
            .await
            .context("Unable to parse the Google Drive file list")?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_file(&self, name: &str, content: &str) -> Res<String> {
        trace!("Creating '{name}' in Google Drive");
        let created: FileRef = self
            .upload(Method::POST, UPLOAD_API, content)
            .await?
            .json()
            .await
            .context("Unable to parse the created Google Drive file")?;
        Ok(created.id)
    }

    async fn update_file(&self, id: &str, content: &str) -> Res<()> {
        trace!("Updating Google Drive file {id}");
        self.upload(Method::PATCH, &format!("{UPLOAD_API}/{id}"), content)
            .await?;
        Ok(())
    }

    async fn download(&self, id: &str) -> Res<String> {
        trace!("Downloading Google Drive file {id}");
        let response = self
            .request(Method::GET, &format!("{API}/{id}"))
            .await?
            .query(&[("alt", "media")])
            .send()
            .await
            .context("Unable to reach Google Drive")?;
        check(response)
            .await?
            .text()
            .await
            .context("Unable to read the Google Drive file")
    }
}

async fn check(response: Response) -> Res<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("Google Drive responded with {status}: {body}")
}

fn multipart_body(content: &str) -> Res<String> {
    let metadata = serde_json::json!({
        "name": crate::api::REMOTE_FILE_NAME,
        "mimeType": "application/json",
    });
    let metadata = serde_json::to_string(&metadata).context("Unable to serialize metadata")?;
    Ok(format!(
        "\r\n--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\
        \r\n--{BOUNDARY}\r\nContent-Type: application/json\r\n\r\n{content}\r\n--{BOUNDARY}--"
    ))
}

#[test]
fn test_multipart_body() {
    let body = multipart_body(r#"{"projects":[]}"#).unwrap();
    assert!(body.starts_with(&format!("\r\n--{BOUNDARY}\r\n")));
    assert!(body.contains(r#""name":"fintrack_pro_data.json""#));
    assert!(body.contains("\r\n\r\n{\"projects\":[]}\r\n"));
    assert!(body.ends_with(&format!("--{BOUNDARY}--")));
}
