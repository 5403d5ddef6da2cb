//! Common re-exports for convenient entity usage.

pub use super::bot_activity::{
    Bookmark, Column as BotActivityColumn, Entity as BotActivity, Model as BotActivityModel,
};
pub use super::issue::{Column as IssueColumn, Entity as Issue, Model as IssueModel};
pub use super::issue_comment::{Entity as IssueComment, Model as IssueCommentModel};
pub use super::issue_comment_event::{Entity as IssueCommentEvent, Model as IssueCommentEventModel};
pub use super::issue_event::{Entity as IssueEvent, Model as IssueEventModel};
pub use super::issue_pipeline::{Entity as IssuePipeline, Model as IssuePipelineModel};
pub use super::label::{Entity as Label, Model as LabelModel};
pub use super::maintainer::{
    Column as MaintainerColumn, Entity as Maintainer, Model as MaintainerModel,
};
pub use super::member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use super::organization::{Entity as Organization, Model as OrganizationModel};
pub use super::pull_request::{Entity as PullRequest, Model as PullRequestModel};
pub use super::pull_request_event::{Entity as PullRequestEvent, Model as PullRequestEventModel};
pub use super::pull_request_review::{Entity as PullRequestReview, Model as PullRequestReviewModel};
pub use super::pull_request_review_comment::{
    Entity as PullRequestReviewComment, Model as PullRequestReviewCommentModel,
};
pub use super::pull_request_review_comment_event::{
    Entity as PullRequestReviewCommentEvent, Model as PullRequestReviewCommentEventModel,
};
pub use super::pull_request_review_event::{
    Entity as PullRequestReviewEvent, Model as PullRequestReviewEventModel,
};
pub use super::repo_comment::{Entity as RepoComment, Model as RepoCommentModel};
pub use super::repo_comment_event::{Entity as RepoCommentEvent, Model as RepoCommentEventModel};
pub use super::repository::{Entity as Repository, Model as RepositoryModel};
pub use super::string_list::StringList;
pub use super::user::{Entity as User, Model as UserModel};
