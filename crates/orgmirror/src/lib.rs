//! orgmirror - an incremental mirror of GitHub organizations.
//!
//! This library copies organizations, repositories, issues, pull requests,
//! comments, reviews, labels, members, maintainers, events and ZenHub
//! pipelines into a relational database that analytics and bots can query
//! without touching the GitHub API.
//!
//! # Features
//!
//! - `sqlite` (default) / `postgres` - Database backends for [`store::DbStore`].
//! - `migrate` (default) - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use orgmirror::connect_and_migrate;
//! use orgmirror::github::GitHubClient;
//! use orgmirror::platform::{RateLimitedClient, rate_limits};
//! use orgmirror::store::DbStore;
//! use orgmirror::sync::{FilterFlags, OrgSpec, Syncer};
//! use tokio_util::sync::CancellationToken;
//!
//! let db = connect_and_migrate("sqlite://mirror.db?mode=rwc").await?;
//! let github = RateLimitedClient::new(GitHubClient::new(&token)?, rate_limits::GITHUB_DEFAULT_RPS);
//!
//! let syncer = Syncer::builder()
//!     .github(Arc::new(github))
//!     .store(Arc::new(DbStore::new(db)))
//!     .org(OrgSpec::new("istio"))
//!     .build()?;
//! let summary = syncer.sync(FilterFlags::ALL, &CancellationToken::new()).await?;
//! ```

pub mod cache;
pub mod db;
pub mod entity;
pub mod github;
pub mod platform;
pub mod refresher;
pub mod retry;
pub mod store;
pub mod sync;
pub mod zenhub;

#[cfg(feature = "migrate")]
pub mod migration;

#[cfg(test)]
mod test_support;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use platform::{GitHubApi, PlatformError, RateLimitedClient, ZenHubApi, rate_limits};
