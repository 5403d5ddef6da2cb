//! Upstream API seams.
//!
//! The sync engine and the refresher only ever talk to GitHub and ZenHub
//! through the [`GitHubApi`] and [`ZenHubApi`] traits. Concrete clients live in
//! [`crate::github`] and [`crate::zenhub`]; [`RateLimitedClient`] adds proactive
//! throttling in front of either.
//!
//! ```ignore
//! use orgmirror::platform::{GitHubApi, RateLimitedClient, rate_limits};
//!
//! async fn print_repos<C: GitHubApi>(client: &C, org: &str) -> orgmirror::platform::Result<()> {
//!     let mut page = Some(1);
//!     while let Some(n) = page {
//!         let batch = client.list_org_repos(org, n).await?;
//!         for repo in &batch.items {
//!             println!("{}", repo.full_name());
//!         }
//!         page = batch.next_page;
//!     }
//!     Ok(())
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, RateLimitedClient, rate_limits};
pub use types::{GitHubApi, PAGE_SIZE, Page, ZenHubApi};
