//! ZenHub API client.
//!
//! Only the per-issue pipeline lookup is consumed; see [`ZenHubClient`].

mod client;
pub mod types;

pub use client::{ZENHUB_API_URL, ZenHubClient};
pub use types::{ZhEstimate, ZhIssueData, ZhPipeline};
