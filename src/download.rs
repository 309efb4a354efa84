//! Recursive, concurrent GitHub folder downloader.
//!
//! One listing call per directory, one download per file. Sibling entries at
//! each level are dispatched concurrently; total in-flight requests across
//! the whole process are bounded by a shared semaphore so unauthenticated or
//! low-quota tokens are not throttled by the API.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture, FutureExt};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::contract::{FetchError, TreeFetcher};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("docs-mirror/", env!("CARGO_PKG_VERSION"));

/// Default ceiling for concurrent requests against the API.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// One item from a directory listing, consumed immediately to decide
/// recurse-vs-download.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    pub name: String,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules and anything the API grows later.
    #[serde(other)]
    Other,
}

/// The (owner, repo, ref) coordinates shared by every request of one fetch.
struct RefTarget {
    owner: String,
    repo: String,
    reference: String,
}

/// GitHub-backed [`TreeFetcher`].
pub struct GitHubFetcher {
    client: Client,
    access_token: Option<String>,
    api_base: String,
    raw_base: String,
    in_flight: Arc<Semaphore>,
}

impl GitHubFetcher {
    /// `access_token` of `None` sends no Authorization header, supporting
    /// unauthenticated (low rate limit) usage.
    pub fn new(access_token: Option<String>, max_in_flight: usize) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            access_token,
            api_base: GITHUB_API_BASE.to_string(),
            raw_base: GITHUB_RAW_BASE.to_string(),
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
        })
    }

    /// Point the fetcher at a different API host, e.g. a local stub server.
    pub fn with_base_urls(mut self, api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.raw_base = raw_base.into();
        self
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.header("Authorization", format!("token {token}")),
            None => request,
        }
    }

    /// List the contents of one remote directory at the configured ref.
    async fn list_dir(
        &self,
        target: &RefTarget,
        remote_path: &str,
    ) -> Result<Vec<RemoteEntry>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base, target.owner, target.repo, remote_path, target.reference
        );
        debug!(%url, "Listing remote directory");

        // The semaphore is never closed, so acquire cannot fail in practice.
        let _permit = self.in_flight.acquire().await.ok();
        let request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json");
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                source: e,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                owner: target.owner.clone(),
                repo: target.repo.clone(),
                reference: target.reference.clone(),
                path: remote_path.to_string(),
            }),
            status if !status.is_success() => Err(FetchError::UnexpectedStatus { url, status }),
            _ => {
                let body = response.text().await.map_err(|e| FetchError::Transport {
                    url: url.clone(),
                    source: e,
                })?;
                serde_json::from_str(&body)
                    .map_err(|e| FetchError::MalformedResponse { url, source: e })
            }
        }
    }

    /// Where to download a file entry from. Certain refs and content types
    /// come back without a direct download URL; those are fetched through
    /// the raw-content host instead.
    fn entry_download_url(&self, target: &RefTarget, entry: &RemoteEntry) -> String {
        match &entry.download_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}/{}/{}/{}",
                self.raw_base, target.owner, target.repo, target.reference, entry.path
            ),
        }
    }

    /// Download one file entry to `local`, overwriting any existing file
    /// (last-write-wins, no conflict detection).
    async fn download_entry(
        &self,
        target: &RefTarget,
        entry: &RemoteEntry,
        local: &Path,
    ) -> Result<(), FetchError> {
        let url = self.entry_download_url(target, entry);

        let _permit = self.in_flight.acquire().await.ok();
        let response = self
            .authorised(self.client.get(&url))
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                source: e,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                owner: target.owner.clone(),
                repo: target.repo.clone(),
                reference: target.reference.clone(),
                path: entry.path.clone(),
            }),
            status if !status.is_success() => Err(FetchError::UnexpectedStatus { url, status }),
            _ => {
                let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
                    url: url.clone(),
                    source: e,
                })?;
                tokio::fs::write(local, &bytes)
                    .await
                    .map_err(|e| FetchError::LocalIo {
                        path: local.to_path_buf(),
                        source: e,
                    })?;
                debug!(path = %local.display(), bytes = bytes.len(), "Downloaded file");
                Ok(())
            }
        }
    }

    /// Recurse into a subdirectory. Listing failures for a subdirectory are
    /// collected, not propagated, so sibling subtrees keep downloading.
    fn mirror_dir<'a>(
        &'a self,
        target: &'a RefTarget,
        remote_path: String,
        dest: PathBuf,
    ) -> BoxFuture<'a, Vec<FetchError>> {
        async move {
            if let Err(e) = tokio::fs::create_dir_all(&dest).await {
                return vec![FetchError::LocalIo {
                    path: dest,
                    source: e,
                }];
            }
            let entries = match self.list_dir(target, &remote_path).await {
                Ok(entries) => entries,
                Err(e) => return vec![e],
            };
            self.mirror_entries(target, entries, &dest).await
        }
        .boxed()
    }

    /// Dispatch every entry of one directory level concurrently and collect
    /// all failures once every sibling has settled.
    async fn mirror_entries(
        &self,
        target: &RefTarget,
        entries: Vec<RemoteEntry>,
        dest: &Path,
    ) -> Vec<FetchError> {
        let mut tasks: Vec<BoxFuture<'_, Vec<FetchError>>> = Vec::new();
        for entry in entries {
            let local = dest.join(&entry.name);
            match entry.kind {
                EntryKind::File => tasks.push(
                    async move {
                        match self.download_entry(target, &entry, &local).await {
                            Ok(()) => Vec::new(),
                            Err(e) => vec![e],
                        }
                    }
                    .boxed(),
                ),
                EntryKind::Dir => tasks.push(self.mirror_dir(target, entry.path, local)),
                EntryKind::Other => {
                    debug!(name = %entry.name, "Skipping entry of unsupported kind")
                }
            }
        }
        join_all(tasks).await.into_iter().flatten().collect()
    }
}

#[async_trait]
impl TreeFetcher for GitHubFetcher {
    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        remote_path: &str,
        dest: &Path,
    ) -> Result<(), FetchError> {
        debug!(
            owner,
            repo,
            reference,
            remote_path,
            dest = %dest.display(),
            "Downloading remote folder tree"
        );
        let target = RefTarget {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference: reference.to_string(),
        };

        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| FetchError::LocalIo {
                path: dest.to_path_buf(),
                source: e,
            })?;

        // A 404 here means the ref or path itself is absent; callers treat
        // that differently from entry-level failures below.
        let entries = self.list_dir(&target, remote_path).await?;
        let failures = self.mirror_entries(&target, entries, dest).await;

        if failures.is_empty() {
            Ok(())
        } else {
            for failure in &failures {
                warn!(error = %failure, "Entry download failed");
            }
            Err(FetchError::Incomplete {
                dir: dest.to_path_buf(),
                failures,
            })
        }
    }
}
