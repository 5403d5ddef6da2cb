//! Labels, repository comments and event feeds.

use tracing::{debug, info, warn};

use super::RunContext;
use crate::entity::repository;
use crate::github::convert::{convert_label, convert_repo_comment};
use crate::sync::context::Syncer;
use crate::sync::events::{EventBatch, convert_issue_timeline_event};
use crate::sync::types::Result;

impl Syncer {
    pub(super) async fn handle_labels(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!("Getting labels");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run.upstream(self.github.list_labels(org, name, n)).await??;
            total += batch.items.len();

            let labels = batch
                .items
                .iter()
                .map(|label| convert_label(org, name, label))
                .collect();
            self.cache.write_labels(labels).await?;

            page = batch.next_page;
        }

        Ok(total)
    }

    pub(super) async fn handle_repo_comments(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!("Getting repository comments");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_repo_comments(org, name, n))
                .await??;
            total += batch.items.len();

            let mut comments = Vec::with_capacity(batch.items.len());
            for gh in &batch.items {
                let (comment, users) = convert_repo_comment(org, name, gh);
                comments.push(comment);
                run.users.register_all(users);
            }
            self.store.write_repo_comments(comments).await?;

            page = batch.next_page;
        }

        Ok(total)
    }

    /// Record the repository event feed, then the issue timeline.
    ///
    /// Feed entries of unrecognized types are dropped. An entry whose payload
    /// does not decode is logged and skipped; the rest of its page is still
    /// written.
    pub(super) async fn handle_events(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!("Getting events");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_repo_events(org, name, n))
                .await??;
            total += batch.items.len();
            info!(count = total, "Received events");

            let mut events = EventBatch::new();
            for event in &batch.items {
                if let Err(e) = events.push(org, name, event) {
                    warn!(kind = ?event.kind, id = %event.id, error = %e, "unable to parse event payload");
                    run.summary.warnings += 1;
                }
            }
            events.write(self.store.as_ref()).await?;

            page = batch.next_page;
        }

        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_issue_events(org, name, n))
                .await??;
            total += batch.items.len();
            info!(count = total, "Received events");

            let events: Vec<_> = batch
                .items
                .iter()
                .map(|event| convert_issue_timeline_event(org, name, event))
                .collect();
            if !events.is_empty() {
                self.store.write_issue_events(events).await?;
            }

            page = batch.next_page;
        }

        Ok(total)
    }
}
