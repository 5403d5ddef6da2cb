//! The `sync` command: one batch run over every configured organization.

use std::sync::Arc;

use console::{Term, style};
use tokio_util::sync::CancellationToken;

use orgmirror::github::GitHubClient;
use orgmirror::store::DbStore;
use orgmirror::sync::{FilterFlags, SyncError, SyncSummary, Syncer};
use orgmirror::zenhub::ZenHubClient;
use orgmirror::{RateLimitedClient, connect_and_migrate};

use crate::config::Config;
use crate::progress::LoggingReporter;

/// Run a sync restricted to the kinds named in `filter`.
///
/// The schema is migrated before the run. A cancelled run is reported as an
/// error; bookmarks already advanced stay advanced and the rest are untouched.
pub(crate) async fn handle_sync(
    filter: &str,
    config: &Config,
    database_url: &str,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let flags: FilterFlags = filter.parse()?;

    let token = config
        .github_token()
        .ok_or("no GitHub token configured; set ORGMIRROR_GITHUB_TOKEN or [github] token")?;
    if config.orgs.is_empty() {
        return Err("no organizations configured; add an [[orgs]] entry to the config file".into());
    }

    let db = connect_and_migrate(database_url).await?;

    let github = RateLimitedClient::new(
        GitHubClient::new(token)?,
        config.github.requests_per_second,
    );

    let mut builder = Syncer::builder()
        .github(Arc::new(github))
        .store(Arc::new(DbStore::new(db)))
        .orgs(config.orgs.iter().cloned())
        .progress(LoggingReporter::new().into_callback());

    match config.zenhub_token() {
        Some(zh_token) => {
            let zenhub = RateLimitedClient::new(
                ZenHubClient::new(zh_token)?,
                config.zenhub.requests_per_second,
            );
            builder = builder.zenhub(Arc::new(zenhub));
        }
        None => tracing::debug!("No ZenHub token configured"),
    }

    let syncer = builder.build()?;

    tracing::info!(flags = %flags, orgs = config.orgs.len(), "Starting sync");
    finish(syncer.sync(flags, &cancel).await)
}

fn finish(result: Result<SyncSummary, SyncError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(SyncError::Cancelled) => {
            tracing::warn!("Sync cancelled; unfinished bookmarks were left in place");
            Err(SyncError::Cancelled.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(summary: &SyncSummary) {
    if !Term::stdout().is_term() {
        println!(
            "orgs={} repos={} users={} warnings={}",
            summary.orgs, summary.repos, summary.users, summary.warnings
        );
        return;
    }

    println!(
        "{} {} orgs, {} repos, {} users",
        style("Synced").green().bold(),
        summary.orgs,
        summary.repos,
        summary.users
    );
    if summary.warnings > 0 {
        println!(
            "{} {} warning(s); see the log above",
            style("!").yellow().bold(),
            summary.warnings
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_run_is_an_error() {
        let err = finish(Err(SyncError::Cancelled)).unwrap_err();
        assert_eq!(err.to_string(), "sync cancelled");
    }

    #[test]
    fn completed_run_succeeds() {
        let summary = SyncSummary {
            orgs: 1,
            repos: 3,
            users: 7,
            warnings: 0,
        };
        assert!(finish(Ok(summary)).is_ok());
    }
}
