//! Content stores that receive published section PDFs.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use http::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::config::StoreConfig;
use crate::constants::{GITHUB_API_BASE, GITHUB_RAW_BASE};
use crate::utils::encode_remote_path;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("GITHUB_TOKEN is not set")]
    MissingToken,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub upload failed: {status} - {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for published bytes. Returns the public url of the upload.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, remote_path: &str, bytes: &[u8]) -> Result<String, StoreError>;
}

#[async_trait]
impl ContentStore for Box<dyn ContentStore> {
    async fn upload(&self, remote_path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        (**self).upload(remote_path, bytes).await
    }
}

/// Build the configured store. GitHub stores read their token from the
/// environment.
pub fn build_store(config: &StoreConfig) -> Result<Box<dyn ContentStore>, StoreError> {
    let store: Box<dyn ContentStore> = match config {
        StoreConfig::Github { owner, repo, branch } => {
            Box::new(GithubStore::from_env(owner, repo, branch)?)
        }
        StoreConfig::Directory { root, base_url } => {
            Box::new(DirectoryStore::new(root, base_url.clone()))
        }
    };
    Ok(store)
}

// =============================================================================
// GitHub contents API
// =============================================================================

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Commits files to a GitHub repository and serves them from the raw CDN.
pub struct GithubStore {
    client: reqwest::Client,
    owner: String,
    repo: String,
    branch: String,
    token: String,
    api_base: String,
    raw_base: String,
}

impl GithubStore {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            token: token.into(),
            api_base: GITHUB_API_BASE.to_string(),
            raw_base: GITHUB_RAW_BASE.to_string(),
        }
    }

    /// Build a store whose token comes from `GITHUB_TOKEN`.
    pub fn from_env(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(StoreError::MissingToken)?;
        Ok(Self::new(owner, repo, branch, token))
    }

    fn contents_url(&self, remote_path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            encode_remote_path(remote_path)
        )
    }

    /// Public CDN url of a committed file.
    pub fn public_url(&self, remote_path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            encode_remote_path(remote_path)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, env!("CARGO_PKG_NAME"))
    }

    /// Blob sha of an existing file, `None` when the path is new.
    async fn existing_sha(&self, remote_path: &str) -> Result<Option<String>, StoreError> {
        let response = self
            .authorized(self.client.get(self.contents_url(remote_path)))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }
        let payload: ContentsResponse = response.json().await?;
        Ok(Some(payload.sha))
    }
}

#[async_trait]
impl ContentStore for GithubStore {
    async fn upload(&self, remote_path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let sha = self.existing_sha(remote_path).await?;
        let verb = if sha.is_some() { "Update" } else { "Add" };
        let body = PutContents {
            message: format!("{} {}", verb, remote_path),
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
            branch: &self.branch,
            sha,
        };

        let response = self
            .authorized(self.client.put(self.contents_url(remote_path)))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        debug!(path = remote_path, verb, "committed to GitHub");
        Ok(self.public_url(remote_path))
    }
}

// =============================================================================
// Local directory
// =============================================================================

/// Copies uploads under a local root. Useful for staging and tests.
pub struct DirectoryStore {
    root: PathBuf,
    base_url: String,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        let root = root.into();
        let base_url = base_url.unwrap_or_else(|| format!("file://{}", root.display()));
        Self { root, base_url }
    }
}

#[async_trait]
impl ContentStore for DirectoryStore {
    async fn upload(&self, remote_path: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let path = self.root.join(remote_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encode_remote_path(remote_path)
        ))
    }
}
