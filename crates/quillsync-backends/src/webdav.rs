//! WebDAV backend adapter
//!
//! Speaks plain WebDAV over reqwest: MKCOL for directories, PROPFIND
//! (Depth 1) for listings, GET/PUT/DELETE for file transfer. The
//! multistatus listing response is parsed with quick-xml, matching on
//! local element names so namespace prefixes don't matter.

use std::path::{Path, PathBuf};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Method, Response, StatusCode};
use tracing::debug;
use url::Url;

use quillsync_core::config::WebdavConfig;
use quillsync_core::ports::backend::{RemoteBackend, RemoteFile};
use quillsync_core::status::{TaskError, TaskResult};

use crate::http::{map_http_status, send_with_retry};

/// Depth-1 PROPFIND body asking for the properties a listing needs
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
    <d:getcontentlength/>
  </d:prop>
</d:propfind>"#;

/// WebDAV implementation of [`RemoteBackend`]
pub struct WebdavBackend {
    http: reqwest::Client,
    root: Url,
    username: String,
    password: String,
    base_dir: String,
}

impl WebdavBackend {
    /// Creates an adapter from connection settings
    pub fn new(config: &WebdavConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(120))
            .build()?;
        let root = Url::parse(&config.url)?;
        Ok(Self {
            http,
            root,
            username: config.username.clone(),
            password: config.password.clone(),
            base_dir: config.base_dir.trim_matches('/').to_string(),
        })
    }

    /// Builds the request URL for a remote path
    fn url_for(&self, path: &str) -> TaskResult<Url> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|_| TaskError::other(format!("webdav url cannot be a base: {}", self.root)))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    /// Sends a request with credentials attached, retrying throttle
    /// responses
    async fn send<B>(&self, operation: &str, build: B) -> TaskResult<Response>
    where
        B: Fn() -> reqwest::RequestBuilder,
    {
        send_with_retry(operation, || {
            build().basic_auth(&self.username, Some(&self.password))
        })
        .await
    }
}

/// One parsed entry of a multistatus response
#[derive(Debug, Default)]
struct DavEntry {
    href: String,
    length: u64,
    is_dir: bool,
}

/// Which element's text we are currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Href,
    Length,
}

/// Parses a PROPFIND multistatus document into entries
fn parse_multistatus(xml: &str) -> TaskResult<Vec<DavEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<DavEntry> = None;
    let mut field: Option<TextField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                b"response" => current = Some(DavEntry::default()),
                b"href" => field = Some(TextField::Href),
                b"getcontentlength" => field = Some(TextField::Length),
                b"collection" => {
                    if let Some(entry) = current.as_mut() {
                        entry.is_dir = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().local_name().as_ref() == b"collection" {
                    if let Some(entry) = current.as_mut() {
                        entry.is_dir = true;
                    }
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| TaskError::other(format!("bad multistatus text: {e}")))?;
                if let Some(entry) = current.as_mut() {
                    match field {
                        Some(TextField::Href) => entry.href.push_str(&text),
                        Some(TextField::Length) => {
                            entry.length = text.trim().parse().unwrap_or(0);
                        }
                        None => {}
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                b"response" => {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                b"href" | b"getcontentlength" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TaskError::other(format!("bad multistatus xml: {e}"))),
        }
    }

    Ok(entries)
}

#[async_trait::async_trait]
impl RemoteBackend for WebdavBackend {
    async fn create_dir(&self, path: &str) -> TaskResult<()> {
        let url = self.url_for(path)?;
        let method = Method::from_bytes(b"MKCOL")
            .map_err(|e| TaskError::other(format!("bad method: {e}")))?;

        let resp = self
            .send("create_dir", || self.http.request(method.clone(), url.clone()))
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            // MKCOL on an existing collection: the end state matches intent.
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            s => Err(map_http_status(s, &format!("MKCOL {path}"))),
        }
    }

    async fn list_files(&self, dir: &str) -> TaskResult<Vec<RemoteFile>> {
        let url = self.url_for(dir)?;
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| TaskError::other(format!("bad method: {e}")))?;

        let resp = self
            .send("list_files", || {
                self.http
                    .request(method.clone(), url.clone())
                    .header("Depth", "1")
                    .header(reqwest::header::CONTENT_TYPE, "application/xml")
                    .body(PROPFIND_BODY)
            })
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_http_status(status, &format!("PROPFIND {dir}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| TaskError::other(format!("reading multistatus body: {e}")))?;

        // The server reports hrefs below its own dav root, percent-encoded;
        // decode them and strip that prefix (and the requested directory's
        // own entry) to recover paths in our namespace.
        let root_path = percent_decode_str(self.root.path())
            .decode_utf8_lossy()
            .trim_end_matches('/')
            .to_string();
        let dir_trimmed = dir.trim_matches('/');

        let files = parse_multistatus(&body)?
            .into_iter()
            .filter_map(|entry| {
                let href = percent_decode_str(entry.href.trim_end_matches('/'))
                    .decode_utf8_lossy()
                    .into_owned();
                let path = href.strip_prefix(root_path.as_str()).unwrap_or(&href);
                let path = path.trim_matches('/');
                if path.is_empty() || path == dir_trimmed {
                    return None;
                }
                Some(RemoteFile {
                    name: path.to_string(),
                    size: entry.length,
                    is_dir: entry.is_dir,
                })
            })
            .collect();

        Ok(files)
    }

    async fn download_file(&self, remote: &str, local: &Path) -> TaskResult<PathBuf> {
        let url = self.url_for(remote)?;
        let resp = self.send("download_file", || self.http.get(url.clone())).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_http_status(status, &format!("GET {remote}")));
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
        let url = self.url_for(remote)?;

        let resp = self
            .send("upload_file", || {
                self.http
                    .put(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, mime_type)
                    .body(data.clone())
            })
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(map_http_status(status, &format!("PUT {remote}")));
        }
        debug!(remote, bytes = data.len(), "uploaded");
        Ok(())
    }

    async fn remove_file(&self, remote: &str) -> TaskResult<()> {
        let url = self.url_for(remote)?;
        let resp = self.send("remove_file", || self.http.delete(url.clone())).await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            // Already gone: absence is the intended end state.
            StatusCode::NOT_FOUND => Ok(()),
            s => Err(map_http_status(s, &format!("DELETE {remote}"))),
        }
    }

    fn absolute_path(&self, segments: &[&str]) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.base_dir.is_empty() {
            parts.push(&self.base_dir);
        }
        parts.extend(segments.iter().copied());
        parts.join("/")
    }
}
