//! Cloud Files backend adapter
//!
//! Talks to the Cloud Files JSON API: every operation is a POST against
//! an RPC-style endpoint, authenticated with a bearer token. Paths are
//! absolute and slash-prefixed in this API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use quillsync_core::config::CloudFilesConfig;
use quillsync_core::ports::backend::{RemoteBackend, RemoteFile};
use quillsync_core::status::{TaskError, TaskResult};

use crate::http::{map_http_status, send_with_retry};

/// Cloud Files implementation of [`RemoteBackend`]
pub struct CloudFilesBackend {
    http: reqwest::Client,
    api_url: String,
    access_token: String,
    base_dir: String,
}

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<FolderEntry>,
}

#[derive(Debug, Deserialize)]
struct FolderEntry {
    #[serde(rename = ".tag")]
    tag: String,
    #[serde(rename = "pathDisplay")]
    path_display: String,
    #[serde(default)]
    size: u64,
}

impl CloudFilesBackend {
    /// Creates an adapter from connection settings
    pub fn new(config: &CloudFilesConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            base_dir: format!("/{}", config.base_dir.trim_matches('/')),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/files/{name}", self.api_url)
    }

    /// Sends an RPC call with the bearer token attached, retrying
    /// throttle responses
    async fn send<B>(&self, operation: &str, build: B) -> TaskResult<Response>
    where
        B: Fn() -> reqwest::RequestBuilder,
    {
        send_with_retry(operation, || build().bearer_auth(&self.access_token)).await
    }
}

#[async_trait::async_trait]
impl RemoteBackend for CloudFilesBackend {
    async fn create_dir(&self, path: &str) -> TaskResult<()> {
        let url = self.endpoint("create_folder");
        let resp = self
            .send("create_dir", || self.http.post(&url).json(&PathArg { path }))
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            // The API reports an existing folder as a conflict; the end
            // state matches intent.
            StatusCode::CONFLICT => Ok(()),
            s => Err(map_http_status(s, &format!("create_folder {path}"))),
        }
    }

    async fn list_files(&self, dir: &str) -> TaskResult<Vec<RemoteFile>> {
        let url = self.endpoint("list_folder");
        let resp = self
            .send("list_files", || self.http.post(&url).json(&PathArg { path: dir }))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_http_status(status, &format!("list_folder {dir}")));
        }

        let listing: ListFolderResponse = resp
            .json()
            .await
            .map_err(|e| TaskError::other(format!("decoding list_folder response: {e}")))?;

        Ok(listing
            .entries
            .into_iter()
            .map(|entry| RemoteFile {
                is_dir: entry.tag == "folder",
                name: entry.path_display,
                size: entry.size,
            })
            .collect())
    }

    async fn download_file(&self, remote: &str, local: &Path) -> TaskResult<PathBuf> {
        let url = self.endpoint("download");
        let resp = self
            .send("download_file", || {
                self.http.post(&url).json(&PathArg { path: remote })
            })
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_http_status(status, &format!("download {remote}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TaskError::other(format!("reading download body: {e}")))?;
        tokio::fs::write(local, &bytes)
            .await
            .map_err(|e| TaskError::other(format!("writing {}: {e}", local.display())))?;

        debug!(remote, bytes = bytes.len(), "downloaded");
        Ok(local.to_path_buf())
    }

    async fn upload_file(&self, local: &Path, remote: &str, mime_type: &str) -> TaskResult<()> {
        let data = tokio::fs::read(local)
            .await
            .map_err(|e| TaskError::other(format!("reading {}: {e}", local.display())))?;
        let url = self.endpoint("upload");

        let resp = self
            .send("upload_file", || {
                self.http
                    .post(&url)
                    .header("X-File-Path", remote)
                    .header(reqwest::header::CONTENT_TYPE, mime_type)
                    .body(data.clone())
            })
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_http_status(status, &format!("upload {remote}")));
        }
        debug!(remote, bytes = data.len(), "uploaded");
        Ok(())
    }

    async fn remove_file(&self, remote: &str) -> TaskResult<()> {
        let url = self.endpoint("delete");
        let resp = self
            .send("remove_file", || {
                self.http.post(&url).json(&PathArg { path: remote })
            })
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            // Already gone: absence is the intended end state.
            StatusCode::NOT_FOUND => Ok(()),
            s => Err(map_http_status(s, &format!("delete {remote}"))),
        }
    }

    fn absolute_path(&self, segments: &[&str]) -> String {
        let mut path = self.base_dir.clone();
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}
