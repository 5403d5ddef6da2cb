//! Bookmark windows for incrementally synced entity kinds.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::entity::bot_activity::Bookmark;
use crate::store::{Store, StoreError};

/// What happened when a window was closed.
#[derive(Debug)]
pub enum BookmarkOutcome {
    /// The bookmark now equals the window's start time.
    Advanced,
    /// Another writer moved the bookmark during the pass; it was left alone.
    Skipped,
    /// The update itself failed. The next run refetches the same window.
    Failed(StoreError),
}

/// One incremental pass over a bookmarked entity kind.
///
/// Opening a window captures the start time before anything is fetched and
/// reads the prior bookmark, which becomes both the fetch lower bound and the
/// guard for the later advance. Close the window only after the pass
/// succeeded; a dropped window leaves the bookmark untouched.
#[derive(Debug, Clone)]
pub struct ActivityWindow {
    org: String,
    repo: String,
    bookmark: Bookmark,
    prior: Option<DateTime<Utc>>,
    start: DateTime<Utc>,
}

impl ActivityWindow {
    pub async fn open(store: &dyn Store, org: &str, repo: &str, bookmark: Bookmark) -> Self {
        let start = Utc::now();
        let prior = match store.read_bot_activity(org, repo).await {
            Ok(activity) => activity.and_then(|a| bookmark.get(&a)),
            Err(e) => {
                // An unreadable bookmark means a full fetch; the guard then
                // refuses to clobber whatever is actually stored.
                warn!(org, repo, %bookmark, error = %e, "unable to read bot activity");
                None
            }
        };

        Self {
            org: org.to_string(),
            repo: repo.to_string(),
            bookmark,
            prior,
            start,
        }
    }

    /// Lower bound for the fetch; `None` fetches everything.
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.prior
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn bookmark(&self) -> Bookmark {
        self.bookmark
    }

    /// Advance the bookmark to the start time if it still holds the prior value.
    pub async fn close(self, store: &dyn Store) -> BookmarkOutcome {
        match store
            .advance_bookmark(&self.org, &self.repo, self.bookmark, self.prior, self.start)
            .await
        {
            Ok(true) => BookmarkOutcome::Advanced,
            Ok(false) => {
                debug!(
                    org = %self.org,
                    repo = %self.repo,
                    bookmark = %self.bookmark,
                    "bookmark moved during the pass, leaving it alone"
                );
                BookmarkOutcome::Skipped
            }
            Err(e) => {
                warn!(
                    org = %self.org,
                    repo = %self.repo,
                    bookmark = %self.bookmark,
                    error = %e,
                    "unable to update bot activity"
                );
                BookmarkOutcome::Failed(e)
            }
        }
    }
}
