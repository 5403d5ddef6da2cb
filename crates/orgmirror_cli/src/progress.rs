//! Progress reporting for sync runs.
//!
//! Every [`SyncProgress`] event becomes one structured `tracing` line. Per-repo
//! detail is logged at debug so the default filter shows one line per pass.

use orgmirror::sync::{ProgressCallback, SyncProgress};

/// Logging reporter using tracing for structured output.
#[derive(Debug, Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::Enumerated { orgs, repos } => {
                tracing::info!(orgs, repos, "Enumerated organizations");
            }

            SyncProgress::OrgStarted { org, repos } => {
                tracing::info!(org = %org, repos, "Syncing organization");
            }

            SyncProgress::RepoStarted { org, repo } => {
                tracing::debug!(repo = %format!("{org}/{repo}"), "Syncing repository");
            }

            SyncProgress::PassComplete {
                org,
                repo,
                pass,
                count,
            } => {
                if repo.is_empty() {
                    tracing::info!(org = %org, pass, count, "Pass complete");
                } else {
                    tracing::info!(repo = %format!("{org}/{repo}"), pass, count, "Pass complete");
                }
            }

            SyncProgress::BookmarkAdvanced {
                org,
                repo,
                bookmark,
                at,
            } => {
                tracing::debug!(
                    repo = %format!("{org}/{repo}"),
                    bookmark = %bookmark,
                    at = %at.to_rfc3339(),
                    "Bookmark advanced"
                );
            }

            SyncProgress::BookmarkSkipped { org, repo, bookmark } => {
                tracing::info!(
                    repo = %format!("{org}/{repo}"),
                    bookmark = %bookmark,
                    "Bookmark moved by another writer, left unchanged"
                );
            }

            SyncProgress::UsersFlushed { count, enriched } => {
                tracing::info!(count, enriched, "Users written");
            }

            // Already logged at warn by the engine.
            SyncProgress::Warning { message } => {
                tracing::debug!(message = %message, "Warning");
            }

            _ => {}
        }
    }

    /// Convert to a ProgressCallback for the library.
    pub fn into_callback(self) -> ProgressCallback {
        Box::new(move |event| self.handle(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgmirror::Bookmark;

    #[test]
    fn callback_accepts_every_event() {
        let callback = LoggingReporter::new().into_callback();
        callback(SyncProgress::Enumerated { orgs: 1, repos: 2 });
        callback(SyncProgress::PassComplete {
            org: "istio".to_string(),
            repo: String::new(),
            pass: "members",
            count: 3,
        });
        callback(SyncProgress::BookmarkSkipped {
            org: "istio".to_string(),
            repo: "istio".to_string(),
            bookmark: Bookmark::Issues,
        });
        callback(SyncProgress::Warning {
            message: "no ZenHub client configured".to_string(),
        });
    }
}
