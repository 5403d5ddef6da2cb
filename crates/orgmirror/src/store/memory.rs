//! Process-local store for tests and dry runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::{Result, StoreError};
use super::traits::Store;
use crate::entity::bot_activity::Bookmark;
use crate::entity::{
    bot_activity, issue, issue_comment, issue_comment_event, issue_event, issue_pipeline, label,
    maintainer, member, organization, pull_request, pull_request_event, pull_request_review,
    pull_request_review_comment, pull_request_review_comment_event, pull_request_review_event,
    repo_comment, repo_comment_event, repository, user,
};

type RepoKey = (String, String);
type NumberKey = (String, String, i64);
type SubKey = (String, String, i64, i64);

fn repo_key(org: &str, repo: &str) -> RepoKey {
    (org.to_string(), repo.to_string())
}

/// Everything a [`MemoryStore`] holds.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub orgs: BTreeMap<String, organization::Model>,
    pub repos: BTreeMap<RepoKey, repository::Model>,
    pub users: BTreeMap<String, user::Model>,
    pub bot_activities: BTreeMap<RepoKey, bot_activity::Model>,
    pub labels: BTreeMap<(String, String, String), label::Model>,
    pub members: BTreeMap<RepoKey, member::Model>,
    pub maintainers: BTreeMap<RepoKey, maintainer::Model>,
    pub issues: BTreeMap<NumberKey, issue::Model>,
    pub issue_comments: BTreeMap<SubKey, issue_comment::Model>,
    pub issue_pipelines: BTreeMap<NumberKey, issue_pipeline::Model>,
    pub pull_requests: BTreeMap<NumberKey, pull_request::Model>,
    pub pull_request_reviews: BTreeMap<SubKey, pull_request_review::Model>,
    pub pull_request_review_comments: BTreeMap<SubKey, pull_request_review_comment::Model>,
    pub repo_comments: BTreeMap<NumberKey, repo_comment::Model>,
    pub issue_events: Vec<issue_event::Model>,
    pub issue_comment_events: Vec<issue_comment_event::Model>,
    pub pull_request_events: Vec<pull_request_event::Model>,
    pub pull_request_review_comment_events: Vec<pull_request_review_comment_event::Model>,
    pub pull_request_review_events: Vec<pull_request_review_event::Model>,
    pub repo_comment_events: Vec<repo_comment_event::Model>,
    /// Number of non-empty `write_users` calls.
    pub user_write_batches: usize,
}

/// Append rows not already present; events are keyed by the whole row.
fn append_unique<T: PartialEq>(log: &mut Vec<T>, events: Vec<T>) {
    for event in events {
        if !log.contains(&event) {
            log.push(event);
        }
    }
}

/// A [`Store`] backed by in-memory maps.
///
/// Operations named with [`MemoryStore::fail_operation`] return
/// [`StoreError::Unavailable`], which lets callers exercise their failure paths.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> MemoryState {
        self.lock().clone()
    }

    /// Make every later call of `operation` (a [`Store`] method name) fail.
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(operation);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing.contains(operation) {
            Err(StoreError::unavailable(operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn write_orgs(&self, orgs: Vec<organization::Model>) -> Result<()> {
        self.check("write_orgs")?;
        self.lock().orgs = orgs
            .into_iter()
            .map(|o| (o.org_login.clone(), o))
            .collect();
        Ok(())
    }

    async fn write_repos(&self, repos: Vec<repository::Model>) -> Result<()> {
        self.check("write_repos")?;
        self.lock().repos = repos
            .into_iter()
            .map(|r| (repo_key(&r.org_login, &r.repo_name), r))
            .collect();
        Ok(())
    }

    async fn write_all_members(&self, org: &str, members: Vec<member::Model>) -> Result<()> {
        self.check("write_all_members")?;
        let mut state = self.lock();
        state.members.retain(|(o, _), _| o != org);
        for m in members {
            state
                .members
                .insert((m.org_login.clone(), m.user_login.clone()), m);
        }
        Ok(())
    }

    async fn write_all_maintainers(
        &self,
        org: &str,
        maintainers: Vec<maintainer::Model>,
    ) -> Result<()> {
        self.check("write_all_maintainers")?;
        let mut state = self.lock();
        state.maintainers.retain(|(o, _), _| o != org);
        for m in maintainers {
            state
                .maintainers
                .insert((m.org_login.clone(), m.user_login.clone()), m);
        }
        Ok(())
    }

    async fn write_users(&self, users: Vec<user::Model>) -> Result<()> {
        self.check("write_users")?;
        if users.is_empty() {
            return Ok(());
        }
        let mut state = self.lock();
        state.user_write_batches += 1;
        for u in users {
            state.users.insert(u.user_login.clone(), u);
        }
        Ok(())
    }

    async fn write_labels(&self, labels: Vec<label::Model>) -> Result<()> {
        self.check("write_labels")?;
        let mut state = self.lock();
        for l in labels {
            let key = (l.org_login.clone(), l.repo_name.clone(), l.label_name.clone());
            state.labels.insert(key, l);
        }
        Ok(())
    }

    async fn write_issues(&self, issues: Vec<issue::Model>) -> Result<()> {
        self.check("write_issues")?;
        let mut state = self.lock();
        for i in issues {
            let key = (i.org_login.clone(), i.repo_name.clone(), i.issue_number);
            state.issues.insert(key, i);
        }
        Ok(())
    }

    async fn write_issue_comments(&self, comments: Vec<issue_comment::Model>) -> Result<()> {
        self.check("write_issue_comments")?;
        let mut state = self.lock();
        for c in comments {
            let key = (
                c.org_login.clone(),
                c.repo_name.clone(),
                c.issue_number,
                c.issue_comment_id,
            );
            state.issue_comments.insert(key, c);
        }
        Ok(())
    }

    async fn write_issue_pipelines(&self, pipelines: Vec<issue_pipeline::Model>) -> Result<()> {
        self.check("write_issue_pipelines")?;
        let mut state = self.lock();
        for p in pipelines {
            let key = (p.org_login.clone(), p.repo_name.clone(), p.issue_number);
            state.issue_pipelines.insert(key, p);
        }
        Ok(())
    }

    async fn write_pull_requests(&self, prs: Vec<pull_request::Model>) -> Result<()> {
        self.check("write_pull_requests")?;
        let mut state = self.lock();
        for pr in prs {
            let key = (
                pr.org_login.clone(),
                pr.repo_name.clone(),
                pr.pull_request_number,
            );
            state.pull_requests.insert(key, pr);
        }
        Ok(())
    }

    async fn write_pull_request_reviews(
        &self,
        reviews: Vec<pull_request_review::Model>,
    ) -> Result<()> {
        self.check("write_pull_request_reviews")?;
        let mut state = self.lock();
        for r in reviews {
            let key = (
                r.org_login.clone(),
                r.repo_name.clone(),
                r.pull_request_number,
                r.pull_request_review_id,
            );
            state.pull_request_reviews.insert(key, r);
        }
        Ok(())
    }

    async fn write_pull_request_review_comments(
        &self,
        comments: Vec<pull_request_review_comment::Model>,
    ) -> Result<()> {
        self.check("write_pull_request_review_comments")?;
        let mut state = self.lock();
        for c in comments {
            let key = (
                c.org_login.clone(),
                c.repo_name.clone(),
                c.pull_request_number,
                c.pull_request_review_comment_id,
            );
            state.pull_request_review_comments.insert(key, c);
        }
        Ok(())
    }

    async fn write_repo_comments(&self, comments: Vec<repo_comment::Model>) -> Result<()> {
        self.check("write_repo_comments")?;
        let mut state = self.lock();
        for c in comments {
            let key = (c.org_login.clone(), c.repo_name.clone(), c.repo_comment_id);
            state.repo_comments.insert(key, c);
        }
        Ok(())
    }

    async fn write_issue_events(&self, events: Vec<issue_event::Model>) -> Result<()> {
        self.check("write_issue_events")?;
        append_unique(&mut self.lock().issue_events, events);
        Ok(())
    }

    async fn write_issue_comment_events(
        &self,
        events: Vec<issue_comment_event::Model>,
    ) -> Result<()> {
        self.check("write_issue_comment_events")?;
        append_unique(&mut self.lock().issue_comment_events, events);
        Ok(())
    }

    async fn write_pull_request_events(
        &self,
        events: Vec<pull_request_event::Model>,
    ) -> Result<()> {
        self.check("write_pull_request_events")?;
        append_unique(&mut self.lock().pull_request_events, events);
        Ok(())
    }

    async fn write_pull_request_review_comment_events(
        &self,
        events: Vec<pull_request_review_comment_event::Model>,
    ) -> Result<()> {
        self.check("write_pull_request_review_comment_events")?;
        append_unique(
            &mut self.lock().pull_request_review_comment_events,
            events,
        );
        Ok(())
    }

    async fn write_pull_request_review_events(
        &self,
        events: Vec<pull_request_review_event::Model>,
    ) -> Result<()> {
        self.check("write_pull_request_review_events")?;
        append_unique(&mut self.lock().pull_request_review_events, events);
        Ok(())
    }

    async fn write_repo_comment_events(
        &self,
        events: Vec<repo_comment_event::Model>,
    ) -> Result<()> {
        self.check("write_repo_comment_events")?;
        append_unique(&mut self.lock().repo_comment_events, events);
        Ok(())
    }

    async fn read_bot_activity(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<Option<bot_activity::Model>> {
        self.check("read_bot_activity")?;
        Ok(self.lock().bot_activities.get(&repo_key(org, repo)).cloned())
    }

    async fn advance_bookmark(
        &self,
        org: &str,
        repo: &str,
        bookmark: Bookmark,
        guard: Option<DateTime<Utc>>,
        new: DateTime<Utc>,
    ) -> Result<bool> {
        self.check("advance_bookmark")?;
        let mut state = self.lock();
        let activity = state
            .bot_activities
            .entry(repo_key(org, repo))
            .or_insert_with(|| bot_activity::Model::new(org, repo));

        if bookmark.get(activity) != guard {
            return Ok(false);
        }
        bookmark.set(activity, Some(new));
        Ok(true)
    }

    async fn query_issues_by_repo(&self, org: &str, repo: &str) -> Result<Vec<issue::Model>> {
        self.check("query_issues_by_repo")?;
        Ok(self
            .lock()
            .issues
            .values()
            .filter(|i| i.org_login == org && i.repo_name == repo)
            .cloned()
            .collect())
    }

    async fn read_user(&self, login: &str) -> Result<Option<user::Model>> {
        self.check("read_user")?;
        Ok(self.lock().users.get(login).cloned())
    }

    async fn read_label(
        &self,
        org: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<label::Model>> {
        self.check("read_label")?;
        let key = (org.to_string(), repo.to_string(), name.to_string());
        Ok(self.lock().labels.get(&key).cloned())
    }

    async fn read_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<pull_request::Model>> {
        self.check("read_pull_request")?;
        let key = (org.to_string(), repo.to_string(), number);
        Ok(self.lock().pull_requests.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[tokio::test]
    async fn bookmark_only_moves_from_the_guard_value() {
        let store = MemoryStore::new();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        assert!(
            store
                .advance_bookmark("istio", "istio", Bookmark::Issues, None, t1)
                .await
                .unwrap()
        );
        // Stale guard: another writer already moved it.
        assert!(
            !store
                .advance_bookmark("istio", "istio", Bookmark::Issues, None, t2)
                .await
                .unwrap()
        );

        let activity = store
            .read_bot_activity("istio", "istio")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(activity.last_issue_sync_start, Some(t1));
        assert_eq!(activity.last_issue_comment_sync_start, None);
    }

    #[tokio::test]
    async fn members_are_replaced_per_org() {
        let store = MemoryStore::new();
        let member = |org: &str, login: &str| member::Model {
            org_login: org.to_string(),
            user_login: login.to_string(),
        };

        store
            .write_all_members("istio", vec![member("istio", "alice")])
            .await
            .unwrap();
        store
            .write_all_members("envoy", vec![member("envoy", "bob")])
            .await
            .unwrap();
        store
            .write_all_members("istio", vec![member("istio", "carol")])
            .await
            .unwrap();

        let members: Vec<_> = store.snapshot().members.into_keys().collect();
        assert_eq!(
            members,
            [
                ("envoy".to_string(), "bob".to_string()),
                ("istio".to_string(), "carol".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn empty_user_batches_are_not_counted() {
        let store = MemoryStore::new();
        store.write_users(Vec::new()).await.unwrap();
        store
            .write_users(vec![user::Model::stub("alice")])
            .await
            .unwrap();
        assert_eq!(store.snapshot().user_write_batches, 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_unavailable() {
        let store = MemoryStore::new();
        store.fail_operation("advance_bookmark");

        let err = store
            .advance_bookmark("istio", "istio", Bookmark::Issues, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
