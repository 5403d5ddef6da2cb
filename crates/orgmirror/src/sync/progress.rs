//! Progress reporting for sync runs.
//!
//! The engine emits [`SyncProgress`] events to an optional callback so a
//! front end can render them however it likes. Events are informational only;
//! nothing in the engine depends on whether they are observed.

use chrono::{DateTime, Utc};

use crate::entity::bot_activity::Bookmark;

/// Progress events emitted during a sync run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Organizations and repositories have been enumerated and written.
    Enumerated {
        /// Number of organizations.
        orgs: usize,
        /// Number of repositories across all organizations.
        repos: usize,
    },

    /// Starting the passes for one organization.
    OrgStarted {
        /// Organization login.
        org: String,
        /// Repositories to visit.
        repos: usize,
    },

    /// Starting the passes for one repository.
    RepoStarted {
        /// Organization login.
        org: String,
        /// Repository name.
        repo: String,
    },

    /// An entity-kind pass finished for a repository (or organization).
    PassComplete {
        /// Organization login.
        org: String,
        /// Repository name, empty for organization-level passes.
        repo: String,
        /// Entity kind, e.g. `"issues"` or `"members"`.
        pass: &'static str,
        /// Records received from upstream.
        count: usize,
    },

    /// A bookmark was moved to this run's start time.
    BookmarkAdvanced {
        org: String,
        repo: String,
        bookmark: Bookmark,
        /// The new bookmark value.
        at: DateTime<Utc>,
    },

    /// A bookmark was left alone because another writer moved it first.
    BookmarkSkipped {
        org: String,
        repo: String,
        bookmark: Bookmark,
    },

    /// The run's users were written.
    UsersFlushed {
        /// Users written.
        count: usize,
        /// Users whose full profile was fetched before writing.
        enriched: usize,
    },

    /// Warning message (non-fatal).
    Warning {
        /// Warning message.
        message: String,
    },
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
