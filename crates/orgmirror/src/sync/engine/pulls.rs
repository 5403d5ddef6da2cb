//! Pull requests, their reviews and review comments.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::RunContext;
use crate::entity::repository;
use crate::github::convert::{
    convert_pull_request, convert_pull_request_review, convert_pull_request_review_comment,
};
use crate::github::types::{GhPullRequest, GhPullRequestFile};
use crate::sync::context::Syncer;
use crate::sync::types::Result;

impl Syncer {
    /// Sync pull requests page by page.
    ///
    /// A pull request whose cached copy carries the same `updated_at` is
    /// skipped entirely. Every other one has its reviews and changed files
    /// fetched before it is converted. Each page writes pull requests first,
    /// then their reviews.
    pub(super) async fn handle_pull_requests(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!("Getting pull requests");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_pull_requests(org, name, n))
                .await??;
            total += batch.items.len();
            info!(count = total, "Received pull requests");

            let mut prs = Vec::with_capacity(batch.items.len());
            let mut reviews = Vec::new();
            for pr in &batch.items {
                if self.is_unchanged(org, name, pr).await {
                    debug!(number = pr.number, "pull request unchanged");
                    continue;
                }

                let mut review_page = Some(1);
                while let Some(rn) = review_page {
                    let fetched = run
                        .upstream(self.github.list_reviews(org, name, pr.number, rn))
                        .await??;
                    for review in &fetched.items {
                        let (model, users) =
                            convert_pull_request_review(org, name, pr.number, review);
                        reviews.push(model);
                        run.users.register_all(users);
                    }
                    review_page = fetched.next_page;
                }

                let files = self.pull_request_files(run, org, name, pr.number).await?;
                let (model, users) = convert_pull_request(org, name, pr, &files);
                prs.push(model);
                run.users.register_all(users);
            }

            self.cache.write_pull_requests(prs).await?;
            self.store.write_pull_request_reviews(reviews).await?;

            page = batch.next_page;
        }

        Ok(total)
    }

    async fn is_unchanged(&self, org: &str, repo: &str, pr: &GhPullRequest) -> bool {
        match self.cache.read_pull_request(org, repo, pr.number).await {
            Ok(Some(cached)) => cached.updated_at == pr.updated_at,
            Ok(None) => false,
            Err(e) => {
                debug!(number = pr.number, error = %e, "pull request lookup failed");
                false
            }
        }
    }

    async fn pull_request_files(
        &self,
        run: &RunContext<'_>,
        org: &str,
        repo: &str,
        number: i64,
    ) -> Result<Vec<GhPullRequestFile>> {
        let mut files = Vec::new();
        let mut page = Some(1);
        while let Some(n) = page {
            let fetched = run
                .upstream(self.github.list_pull_request_files(org, repo, number, n))
                .await??;
            files.extend(fetched.items);
            page = fetched.next_page;
        }
        Ok(files)
    }

    pub(super) async fn handle_review_comments(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
        since: Option<DateTime<Utc>>,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!(?since, "Getting pull request review comments");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_review_comments(org, name, since, n))
                .await??;
            total += batch.items.len();
            info!(count = total, "Received pull request review comments");

            let mut comments = Vec::with_capacity(batch.items.len());
            for gh in &batch.items {
                match convert_pull_request_review_comment(org, name, gh) {
                    Ok((comment, users)) => {
                        comments.push(comment);
                        run.users.register_all(users);
                    }
                    Err(e) => {
                        self.warning(run, format!("{org}/{name}: skipping review comment: {e}"))
                    }
                }
            }
            self.store.write_pull_request_review_comments(comments).await?;

            page = batch.next_page;
        }

        Ok(total)
    }
}
