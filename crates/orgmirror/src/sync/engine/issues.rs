//! Issues, issue comments and their ZenHub pipelines.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::RunContext;
use crate::entity::{issue_pipeline, repository};
use crate::github::convert::{convert_issue, convert_issue_comment};
use crate::sync::context::Syncer;
use crate::sync::types::{PIPELINE_FLUSH_SIZE, Result};

impl Syncer {
    pub(super) async fn handle_issues(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
        since: Option<DateTime<Utc>>,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!(?since, "Getting issues");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_issues(org, name, since, n))
                .await??;
            total += batch.items.len();
            info!(count = total, "Received issues");

            let mut issues = Vec::with_capacity(batch.items.len());
            for gh in &batch.items {
                let (issue, users) = convert_issue(org, name, gh);
                issues.push(issue);
                run.users.register_all(users);
            }
            self.store.write_issues(issues).await?;

            page = batch.next_page;
        }

        Ok(total)
    }

    pub(super) async fn handle_issue_comments(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
        since: Option<DateTime<Utc>>,
    ) -> Result<usize> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!(?since, "Getting issue comments");

        let mut total = 0;
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_issue_comments(org, name, since, n))
                .await??;
            total += batch.items.len();
            info!(count = total, "Received issue comments");

            let mut comments = Vec::with_capacity(batch.items.len());
            for gh in &batch.items {
                match convert_issue_comment(org, name, gh) {
                    Ok((comment, users)) => {
                        comments.push(comment);
                        run.users.register_all(users);
                    }
                    Err(e) => self.warning(run, format!("{org}/{name}: skipping comment: {e}")),
                }
            }
            self.store.write_issue_comments(comments).await?;

            page = batch.next_page;
        }

        Ok(total)
    }

    /// Read this repository's issues back from the store and record the
    /// ZenHub pipeline of each. Issues ZenHub never tracked are skipped.
    pub(super) async fn handle_pipelines(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
    ) -> Result<usize> {
        let Some(zenhub) = &self.zenhub else {
            return Ok(0);
        };
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        debug!("Getting ZenHub issue data");

        let issues = self.store.query_issues_by_repo(org, name).await?;

        let mut written = 0;
        let mut pipelines = Vec::with_capacity(PIPELINE_FLUSH_SIZE);
        for issue in &issues {
            let data = match run
                .upstream(zenhub.get_issue_data(repo.repo_number, issue.issue_number))
                .await?
            {
                Ok(data) => data,
                Err(e) if e.is_not_found() => {
                    debug!(issue = issue.issue_number, "issue not tracked by ZenHub");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            pipelines.push(issue_pipeline::Model {
                org_login: org.to_string(),
                repo_name: name.to_string(),
                issue_number: issue.issue_number,
                pipeline: data.pipeline.name,
            });

            if pipelines.len() >= PIPELINE_FLUSH_SIZE {
                written += pipelines.len();
                self.store
                    .write_issue_pipelines(std::mem::take(&mut pipelines))
                    .await?;
            }
        }

        if !pipelines.is_empty() {
            written += pipelines.len();
            self.store.write_issue_pipelines(pipelines).await?;
        }

        info!(count = written, "Wrote issue pipelines");
        Ok(written)
    }
}
