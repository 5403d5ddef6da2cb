//! Sync configuration, results and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::platform::PlatformError;
use crate::store::StoreError;

/// Issue pipelines are written in batches of this size.
pub const PIPELINE_FLUSH_SIZE: usize = 100;

/// Name of the directory whose OWNERS files are never read.
pub const VENDOR_DIR: &str = "vendor";

/// An organization to mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSpec {
    /// Organization login.
    pub name: String,
    /// Repositories to mirror. Empty means every repository of the organization.
    #[serde(default)]
    pub repos: Vec<String>,
}

impl OrgSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repos: Vec::new(),
        }
    }

    pub fn with_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repos = repos.into_iter().map(Into::into).collect();
        self
    }
}

/// Counters reported by a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Organizations written.
    pub orgs: usize,
    /// Repositories written.
    pub repos: usize,
    /// Users written by the final flush.
    pub users: usize,
    /// Non-fatal problems that were logged and skipped.
    pub warnings: usize,
}

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The run's cancellation token fired.
    #[error("sync cancelled")]
    Cancelled,

    /// A required builder field was not set.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
