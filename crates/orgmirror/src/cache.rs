//! Read-through cache in front of the store.
//!
//! Point lookups for users, labels and pull requests are served from memory
//! when possible. The cache is never authoritative: a miss falls back to the
//! store, and a miss there is reported as `None`, not as an error.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::entity::{
    issue, issue_comment, label, pull_request, pull_request_review, pull_request_review_comment,
    repo_comment, user,
};
use crate::store::{Store, StoreError};

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed.
    #[error("Cache backing store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Lookups plus write-through operations that keep the lookups fresh.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn read_user(&self, login: &str) -> Result<Option<user::Model>>;
    async fn read_label(&self, org: &str, repo: &str, name: &str)
    -> Result<Option<label::Model>>;
    async fn read_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<pull_request::Model>>;

    async fn write_users(&self, users: Vec<user::Model>) -> Result<()>;
    async fn write_labels(&self, labels: Vec<label::Model>) -> Result<()>;
    async fn write_issues(&self, issues: Vec<issue::Model>) -> Result<()>;
    async fn write_issue_comments(&self, comments: Vec<issue_comment::Model>) -> Result<()>;
    async fn write_pull_requests(&self, prs: Vec<pull_request::Model>) -> Result<()>;
    async fn write_pull_request_reviews(
        &self,
        reviews: Vec<pull_request_review::Model>,
    ) -> Result<()>;
    async fn write_pull_request_review_comments(
        &self,
        comments: Vec<pull_request_review_comment::Model>,
    ) -> Result<()>;
    async fn write_repo_comments(&self, comments: Vec<repo_comment::Model>) -> Result<()>;
}

type LabelKey = (String, String, String);
type PullRequestKey = (String, String, i64);

async fn cached<K, V>(map: &RwLock<HashMap<K, V>>, key: &K) -> Option<V>
where
    K: Eq + Hash,
    V: Clone,
{
    map.read().await.get(key).cloned()
}

/// A [`Cache`] that keeps in-memory maps in front of a [`Store`].
pub struct ReadThroughCache<S: ?Sized> {
    store: Arc<S>,
    users: RwLock<HashMap<String, user::Model>>,
    labels: RwLock<HashMap<LabelKey, label::Model>>,
    pull_requests: RwLock<HashMap<PullRequestKey, pull_request::Model>>,
}

impl<S: Store + ?Sized> ReadThroughCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            users: RwLock::new(HashMap::new()),
            labels: RwLock::new(HashMap::new()),
            pull_requests: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: Store + ?Sized> Cache for ReadThroughCache<S> {
    async fn read_user(&self, login: &str) -> Result<Option<user::Model>> {
        let key = login.to_string();
        if let Some(hit) = cached(&self.users, &key).await {
            return Ok(Some(hit));
        }

        let found = self.store.read_user(login).await?;
        if let Some(user) = &found {
            self.users.write().await.insert(key, user.clone());
        }
        Ok(found)
    }

    async fn read_label(
        &self,
        org: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<label::Model>> {
        let key = (org.to_string(), repo.to_string(), name.to_string());
        if let Some(hit) = cached(&self.labels, &key).await {
            return Ok(Some(hit));
        }

        let found = self.store.read_label(org, repo, name).await?;
        if let Some(label) = &found {
            self.labels.write().await.insert(key, label.clone());
        }
        Ok(found)
    }

    async fn read_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<pull_request::Model>> {
        let key = (org.to_string(), repo.to_string(), number);
        if let Some(hit) = cached(&self.pull_requests, &key).await {
            return Ok(Some(hit));
        }

        let found = self.store.read_pull_request(org, repo, number).await?;
        if let Some(pr) = &found {
            self.pull_requests.write().await.insert(key, pr.clone());
        }
        Ok(found)
    }

    async fn write_users(&self, users: Vec<user::Model>) -> Result<()> {
        self.store.write_users(users.clone()).await?;
        let mut map = self.users.write().await;
        for user in users {
            map.insert(user.user_login.clone(), user);
        }
        Ok(())
    }

    async fn write_labels(&self, labels: Vec<label::Model>) -> Result<()> {
        self.store.write_labels(labels.clone()).await?;
        let mut map = self.labels.write().await;
        for label in labels {
            let key = (
                label.org_login.clone(),
                label.repo_name.clone(),
                label.label_name.clone(),
            );
            map.insert(key, label);
        }
        Ok(())
    }

    async fn write_issues(&self, issues: Vec<issue::Model>) -> Result<()> {
        Ok(self.store.write_issues(issues).await?)
    }

    async fn write_issue_comments(&self, comments: Vec<issue_comment::Model>) -> Result<()> {
        Ok(self.store.write_issue_comments(comments).await?)
    }

    async fn write_pull_requests(&self, prs: Vec<pull_request::Model>) -> Result<()> {
        self.store.write_pull_requests(prs.clone()).await?;
        let mut map = self.pull_requests.write().await;
        for pr in prs {
            let key = (
                pr.org_login.clone(),
                pr.repo_name.clone(),
                pr.pull_request_number,
            );
            map.insert(key, pr);
        }
        Ok(())
    }

    async fn write_pull_request_reviews(
        &self,
        reviews: Vec<pull_request_review::Model>,
    ) -> Result<()> {
        Ok(self.store.write_pull_request_reviews(reviews).await?)
    }

    async fn write_pull_request_review_comments(
        &self,
        comments: Vec<pull_request_review_comment::Model>,
    ) -> Result<()> {
        Ok(self
            .store
            .write_pull_request_review_comments(comments)
            .await?)
    }

    async fn write_repo_comments(&self, comments: Vec<repo_comment::Model>) -> Result<()> {
        Ok(self.store.write_repo_comments(comments).await?)
    }
}
