//! Contract between the remote tree fetcher and its consumers.
//!
//! The [`TreeFetcher`] trait is the seam the orchestration code depends on;
//! the real GitHub implementation lives in [`crate::download`], and tests
//! plug in fakes or the generated mock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use thiserror::Error;

/// Failure conditions from fetching a remote folder tree.
///
/// `NotFound` is the only variant callers are expected to absorb: it means
/// the ref or path does not exist remotely, which during a tag fetch is
/// logged and skipped rather than propagated.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The ref or path does not exist remotely (HTTP 404 on the listing).
    #[error("remote path '{path}' not found in {owner}/{repo} at ref '{reference}'")]
    NotFound {
        owner: String,
        repo: String,
        reference: String,
        path: String,
    },

    /// Connection-level failure (DNS, TLS, timeout, aborted transfer).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A non-2xx response other than not-found.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The listing body did not parse as the expected entry schema.
    #[error("malformed listing from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Local filesystem create/write failure.
    #[error("local file error at {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more entry downloads under a fetched tree failed. Siblings are
    /// never cancelled; every failure is collected here once all have
    /// settled.
    #[error("{} download(s) failed under {}", .failures.len(), .dir.display())]
    Incomplete {
        dir: PathBuf,
        failures: Vec<FetchError>,
    },
}

/// Downloads a remote folder tree to a local destination.
///
/// Implemented by the real GitHub client and by test fakes/mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TreeFetcher: Send + Sync {
    /// Recursively mirror `remote_path` of `owner/repo` at `reference` into
    /// `dest`, preserving relative structure. Existing files are overwritten.
    async fn fetch(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        remote_path: &str,
        dest: &Path,
    ) -> Result<(), FetchError>;
}
