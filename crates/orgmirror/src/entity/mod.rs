//! SeaORM entity definitions for the mirror schema.
//!
//! Every entity uses its natural key as a composite primary key so that batch
//! writes can be expressed as idempotent upserts.

pub mod bot_activity;
pub mod issue;
pub mod issue_comment;
pub mod issue_comment_event;
pub mod issue_event;
pub mod issue_pipeline;
pub mod label;
pub mod maintainer;
pub mod member;
pub mod organization;
pub mod prelude;
pub mod pull_request;
pub mod pull_request_event;
pub mod pull_request_review;
pub mod pull_request_review_comment;
pub mod pull_request_review_comment_event;
pub mod pull_request_review_event;
pub mod repo_comment;
pub mod repo_comment_event;
pub mod repository;
pub mod string_list;
pub mod user;
