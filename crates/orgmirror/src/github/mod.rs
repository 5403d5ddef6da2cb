//! GitHub REST client, payload types and conversion to mirror entities.
//!
//! # Module Structure
//!
//! - [`types`] - Wire payloads (only the fields the mirror stores)
//! - [`client`] - [`GitHubClient`], the concrete [`GitHubApi`](crate::platform::GitHubApi)
//! - [`convert`] - Pure conversion into entity models, shared by sync and refresh
//!
//! ```ignore
//! use orgmirror::github::GitHubClient;
//! use orgmirror::platform::{RateLimitedClient, rate_limits};
//!
//! let client = RateLimitedClient::new(GitHubClient::new(&token)?, rate_limits::GITHUB_DEFAULT_RPS);
//! ```

mod client;
pub mod convert;
pub mod types;

pub use client::{
    GITHUB_API_URL, GITHUB_RAW_URL, GitHubClient, LinkPagination, parse_link_header,
};
