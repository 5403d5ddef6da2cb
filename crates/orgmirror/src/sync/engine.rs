//! The sync run.
//!
//! A run walks organizations, then their repositories, then entity kinds in a
//! fixed order: labels, issues and issue comments, ZenHub pipelines, pull
//! requests and review comments, repository comments, events. Members follow
//! an organization's repositories; maintainers are resolved per organization
//! afterwards. Users discovered anywhere are written once at the very end.
//!
//! Everything a run accumulates lives in a [`RunContext`] owned by
//! [`Syncer::sync`], so nothing carries over between runs.

mod issues;
mod org;
mod pulls;
mod repo;

use std::collections::BTreeMap;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::activity::{ActivityWindow, BookmarkOutcome};
use super::context::Syncer;
use super::flags::FilterFlags;
use super::progress::SyncProgress;
use super::types::{Result, SyncError, SyncSummary};
use super::users::UserRegistry;
use crate::entity::bot_activity::Bookmark;
use crate::entity::{organization, repository};
use crate::github::convert::{convert_org, convert_repo, convert_user};
use crate::platform;

/// State owned by one run.
pub(super) struct RunContext<'a> {
    pub(super) flags: FilterFlags,
    cancel: &'a CancellationToken,
    pub(super) users: UserRegistry,
    pub(super) summary: SyncSummary,
}

impl<'a> RunContext<'a> {
    fn new(flags: FilterFlags, cancel: &'a CancellationToken) -> Self {
        Self {
            flags,
            cancel,
            users: UserRegistry::new(),
            summary: SyncSummary::default(),
        }
    }

    /// Race an upstream call against the run's cancellation token.
    ///
    /// The outer result only ever fails with [`SyncError::Cancelled`]; the
    /// inner one is the call's own outcome, so callers that treat upstream
    /// failures as fatal write `run.upstream(call).await??`.
    pub(super) async fn upstream<T>(
        &self,
        call: impl Future<Output = platform::Result<T>>,
    ) -> Result<platform::Result<T>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SyncError::Cancelled),
            result = call => Ok(result),
        }
    }

    pub(super) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Syncer {
    /// Mirror every configured organization.
    ///
    /// Organizations and repositories are enumerated and written wholesale
    /// first; the selected entity kinds are then synced against that list.
    /// Any error aborts the run, except for the downgraded failures that are
    /// counted in [`SyncSummary::warnings`].
    #[tracing::instrument(skip_all, fields(flags = %flags))]
    pub async fn sync(&self, flags: FilterFlags, cancel: &CancellationToken) -> Result<SyncSummary> {
        let mut run = RunContext::new(flags, cancel);

        if run.flags.contains(FilterFlags::ZENHUB) && self.zenhub.is_none() {
            self.warning(
                &mut run,
                "no ZenHub client configured, skipping pipelines".to_string(),
            );
            run.flags = run.flags.difference(FilterFlags::ZENHUB);
        }

        let (orgs, repos) = self.enumerate(&run).await?;

        self.store.write_orgs(orgs.clone()).await?;
        self.store.write_repos(repos.clone()).await?;
        run.summary.orgs = orgs.len();
        run.summary.repos = repos.len();
        self.emit(SyncProgress::Enumerated {
            orgs: orgs.len(),
            repos: repos.len(),
        });

        for org in &orgs {
            let org_repos: Vec<&repository::Model> = repos
                .iter()
                .filter(|r| r.org_login == org.org_login)
                .collect();

            self.emit(SyncProgress::OrgStarted {
                org: org.org_login.clone(),
                repos: org_repos.len(),
            });

            if run.flags.intersects(FilterFlags::REPO_PASS) {
                self.handle_org(&mut run, org, &org_repos).await?;
            }

            if run.flags.contains(FilterFlags::MAINTAINERS) {
                let count = self.handle_maintainers(&mut run, org, &org_repos).await?;
                self.pass_complete(&org.org_login, "", "maintainers", count);
            }
        }

        self.flush_users(&mut run).await?;

        info!(
            orgs = run.summary.orgs,
            repos = run.summary.repos,
            users = run.summary.users,
            warnings = run.summary.warnings,
            "Sync complete"
        );
        Ok(run.summary)
    }

    /// Fetch the configured organizations and their repositories.
    async fn enumerate(
        &self,
        run: &RunContext<'_>,
    ) -> Result<(Vec<organization::Model>, Vec<repository::Model>)> {
        let mut orgs = Vec::with_capacity(self.orgs.len());
        let mut repos = Vec::new();

        for spec in &self.orgs {
            let org = convert_org(&run.upstream(self.github.get_org(&spec.name)).await??);

            if spec.repos.is_empty() {
                let mut page = Some(1);
                while let Some(n) = page {
                    let batch = run
                        .upstream(self.github.list_org_repos(&spec.name, n))
                        .await??;
                    repos.extend(
                        batch
                            .items
                            .iter()
                            .map(|repo| convert_repo(&org.org_login, repo)),
                    );
                    page = batch.next_page;
                }
            } else {
                for name in &spec.repos {
                    let repo = run.upstream(self.github.get_repo(&spec.name, name)).await??;
                    repos.push(convert_repo(&org.org_login, &repo));
                }
            }

            orgs.push(org);
        }

        Ok((orgs, repos))
    }

    #[tracing::instrument(skip_all, fields(org = %org.org_login))]
    async fn handle_org(
        &self,
        run: &mut RunContext<'_>,
        org: &organization::Model,
        repos: &[&repository::Model],
    ) -> Result<()> {
        info!(repos = repos.len(), "Syncing org");

        for repo in repos {
            self.handle_repo(run, repo).await?;
        }

        if run.flags.contains(FilterFlags::MEMBERS) {
            let count = self.handle_members(run, org).await?;
            self.pass_complete(&org.org_login, "", "members", count);
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, fields(org = %repo.org_login, repo = %repo.repo_name))]
    async fn handle_repo(&self, run: &mut RunContext<'_>, repo: &repository::Model) -> Result<()> {
        run.check_cancelled()?;
        info!("Syncing repo");
        self.emit(SyncProgress::RepoStarted {
            org: repo.org_login.clone(),
            repo: repo.repo_name.clone(),
        });

        if run.flags.contains(FilterFlags::LABELS) {
            let count = self.handle_labels(run, repo).await?;
            self.pass_complete(&repo.org_login, &repo.repo_name, "labels", count);
        }

        if run.flags.contains(FilterFlags::ISSUES) {
            let window = self.open_window(repo, Bookmark::Issues).await;
            let count = self.handle_issues(run, repo, window.since()).await?;
            self.close_window(run, repo, window).await;
            self.pass_complete(&repo.org_login, &repo.repo_name, "issues", count);

            let window = self.open_window(repo, Bookmark::IssueComments).await;
            let count = self.handle_issue_comments(run, repo, window.since()).await?;
            self.close_window(run, repo, window).await;
            self.pass_complete(&repo.org_login, &repo.repo_name, "issue_comments", count);
        }

        if run.flags.contains(FilterFlags::ZENHUB) {
            let count = self.handle_pipelines(run, repo).await?;
            self.pass_complete(&repo.org_login, &repo.repo_name, "pipelines", count);
        }

        if run.flags.contains(FilterFlags::PRS) {
            let count = self.handle_pull_requests(run, repo).await?;
            self.pass_complete(&repo.org_login, &repo.repo_name, "pull_requests", count);

            let window = self
                .open_window(repo, Bookmark::PullRequestReviewComments)
                .await;
            let count = self
                .handle_review_comments(run, repo, window.since())
                .await?;
            self.close_window(run, repo, window).await;
            self.pass_complete(&repo.org_login, &repo.repo_name, "review_comments", count);
        }

        if run.flags.contains(FilterFlags::REPO_COMMENTS) {
            let count = self.handle_repo_comments(run, repo).await?;
            self.pass_complete(&repo.org_login, &repo.repo_name, "repo_comments", count);
        }

        if run.flags.contains(FilterFlags::EVENTS) {
            let count = self.handle_events(run, repo).await?;
            self.pass_complete(&repo.org_login, &repo.repo_name, "events", count);
        }

        Ok(())
    }

    async fn open_window(&self, repo: &repository::Model, bookmark: Bookmark) -> ActivityWindow {
        ActivityWindow::open(
            self.store.as_ref(),
            &repo.org_login,
            &repo.repo_name,
            bookmark,
        )
        .await
    }

    async fn close_window(
        &self,
        run: &mut RunContext<'_>,
        repo: &repository::Model,
        window: ActivityWindow,
    ) {
        let (bookmark, at) = (window.bookmark(), window.start());
        match window.close(self.store.as_ref()).await {
            BookmarkOutcome::Advanced => self.emit(SyncProgress::BookmarkAdvanced {
                org: repo.org_login.clone(),
                repo: repo.repo_name.clone(),
                bookmark,
                at,
            }),
            BookmarkOutcome::Skipped => self.emit(SyncProgress::BookmarkSkipped {
                org: repo.org_login.clone(),
                repo: repo.repo_name.clone(),
                bookmark,
            }),
            BookmarkOutcome::Failed(e) => self.warning(
                run,
                format!(
                    "unable to update {bookmark} bookmark for {}/{}: {e}",
                    repo.org_login, repo.repo_name
                ),
            ),
        }
    }

    /// Write every user seen during the run, backfilling stubs first.
    async fn flush_users(&self, run: &mut RunContext<'_>) -> Result<()> {
        let users = std::mem::take(&mut run.users);

        let mut profiles = BTreeMap::new();
        for login in users.stubs() {
            match run.upstream(self.github.get_user(&login)).await? {
                Ok(profile) => {
                    profiles.insert(login, convert_user(&profile));
                }
                Err(e) => debug!(login = %login, error = %e, "keeping user stub"),
            }
        }

        let enriched = profiles.len();
        let batch = users.into_enriched(profiles);
        let count = batch.len();
        if !batch.is_empty() {
            self.cache.write_users(batch).await?;
        }

        run.summary.users = count;
        info!(count, enriched, "Wrote users");
        self.emit(SyncProgress::UsersFlushed { count, enriched });
        Ok(())
    }

    /// Record a downgraded failure.
    pub(super) fn warning(&self, run: &mut RunContext<'_>, message: String) {
        warn!("{message}");
        run.summary.warnings += 1;
        self.emit(SyncProgress::Warning { message });
    }

    fn pass_complete(&self, org: &str, repo: &str, pass: &'static str, count: usize) {
        self.emit(SyncProgress::PassComplete {
            org: org.to_string(),
            repo: repo.to_string(),
            pass,
            count,
        });
    }
}
