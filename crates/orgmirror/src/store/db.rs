//! sea-orm backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityName, EntityTrait,
    IdenStatic, IntoActiveModel, Iterable, PrimaryKeyToColumn, QueryFilter, QueryOrder,
    TransactionTrait,
};

use super::errors::Result;
use super::traits::Store;
use crate::entity::bot_activity::Bookmark;
use crate::entity::{
    bot_activity, issue, issue_comment, issue_comment_event, issue_event, issue_pipeline, label,
    maintainer, member, organization, pull_request, pull_request_event, pull_request_review,
    pull_request_review_comment, pull_request_review_comment_event, pull_request_review_event,
    repo_comment, repo_comment_event, repository, user,
};

/// Rows per INSERT statement. Keeps SQLite under its bind-parameter limit.
const INSERT_CHUNK: usize = 100;

type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

/// `ON CONFLICT (primary key)`: update every other column, or do nothing when
/// the key is the whole row (event logs).
fn upsert_on_conflict<E: EntityTrait>() -> OnConflict {
    let keys: Vec<E::Column> = E::PrimaryKey::iter()
        .map(PrimaryKeyToColumn::into_column)
        .collect();
    let key_names: Vec<&str> = keys.iter().map(|c| c.as_str()).collect();
    let updates: Vec<E::Column> = E::Column::iter()
        .filter(|c| !key_names.contains(&c.as_str()))
        .collect();

    let mut on_conflict = OnConflict::columns(keys);
    if updates.is_empty() {
        on_conflict.do_nothing();
    } else {
        on_conflict.update_columns(updates);
    }
    on_conflict
}

/// Upsert `models` in chunks on `db`, which may be a transaction.
async fn upsert_models<A, C>(db: &C, models: Vec<ModelOf<A>>) -> Result<u64>
where
    A: ActiveModelTrait + Send,
    ModelOf<A>: IntoActiveModel<A> + Send,
    C: ConnectionTrait,
{
    let on_conflict = upsert_on_conflict::<A::Entity>();
    let mut written = 0;
    let mut models = models.into_iter();

    loop {
        let chunk: Vec<A> = models
            .by_ref()
            .take(INSERT_CHUNK)
            .map(IntoActiveModel::into_active_model)
            .collect();
        if chunk.is_empty() {
            break;
        }

        written += <A::Entity as EntityTrait>::insert_many(chunk)
            .on_conflict(on_conflict.clone())
            .exec_without_returning(db)
            .await?;
    }

    Ok(written)
}

/// A [`Store`] over any sea-orm connection.
///
/// ```ignore
/// let db = orgmirror::connect_and_migrate("sqlite://mirror.db?mode=rwc").await?;
/// let store = DbStore::new(db);
/// ```
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn upsert<A>(&self, models: Vec<ModelOf<A>>) -> Result<()>
    where
        A: ActiveModelTrait + Send,
        ModelOf<A>: IntoActiveModel<A> + Send,
    {
        if models.is_empty() {
            return Ok(());
        }
        let count = models.len();
        let written = upsert_models::<A, _>(&self.db, models).await?;
        tracing::debug!(
            table = A::Entity::default().table_name(),
            count,
            written,
            "Upserted batch"
        );
        Ok(())
    }

    async fn try_advance(
        &self,
        org: &str,
        repo: &str,
        bookmark: Bookmark,
        guard: Option<DateTime<Utc>>,
        new: DateTime<Utc>,
    ) -> Result<bool> {
        let column = bookmark.column();
        let guard_condition = match guard {
            Some(value) => column.eq(value),
            None => column.is_null(),
        };

        let result = bot_activity::Entity::update_many()
            .col_expr(column, Expr::value(new))
            .filter(bot_activity::Column::OrgLogin.eq(org))
            .filter(bot_activity::Column::RepoName.eq(repo))
            .filter(guard_condition)
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl Store for DbStore {
    async fn write_orgs(&self, orgs: Vec<organization::Model>) -> Result<()> {
        let count = orgs.len();
        let txn = self.db.begin().await?;
        organization::Entity::delete_many().exec(&txn).await?;
        upsert_models::<organization::ActiveModel, _>(&txn, orgs).await?;
        txn.commit().await?;
        tracing::debug!(count, "Replaced organizations");
        Ok(())
    }

    async fn write_repos(&self, repos: Vec<repository::Model>) -> Result<()> {
        let count = repos.len();
        let txn = self.db.begin().await?;
        repository::Entity::delete_many().exec(&txn).await?;
        upsert_models::<repository::ActiveModel, _>(&txn, repos).await?;
        txn.commit().await?;
        tracing::debug!(count, "Replaced repositories");
        Ok(())
    }

    async fn write_all_members(&self, org: &str, members: Vec<member::Model>) -> Result<()> {
        let count = members.len();
        let txn = self.db.begin().await?;
        member::Entity::delete_many()
            .filter(member::Column::OrgLogin.eq(org))
            .exec(&txn)
            .await?;
        upsert_models::<member::ActiveModel, _>(&txn, members).await?;
        txn.commit().await?;
        tracing::debug!(org, count, "Replaced members");
        Ok(())
    }

    async fn write_all_maintainers(
        &self,
        org: &str,
        maintainers: Vec<maintainer::Model>,
    ) -> Result<()> {
        let count = maintainers.len();
        let txn = self.db.begin().await?;
        maintainer::Entity::delete_many()
            .filter(maintainer::Column::OrgLogin.eq(org))
            .exec(&txn)
            .await?;
        upsert_models::<maintainer::ActiveModel, _>(&txn, maintainers).await?;
        txn.commit().await?;
        tracing::debug!(org, count, "Replaced maintainers");
        Ok(())
    }

    async fn write_users(&self, users: Vec<user::Model>) -> Result<()> {
        self.upsert::<user::ActiveModel>(users).await
    }

    async fn write_labels(&self, labels: Vec<label::Model>) -> Result<()> {
        self.upsert::<label::ActiveModel>(labels).await
    }

    async fn write_issues(&self, issues: Vec<issue::Model>) -> Result<()> {
        self.upsert::<issue::ActiveModel>(issues).await
    }

    async fn write_issue_comments(&self, comments: Vec<issue_comment::Model>) -> Result<()> {
        self.upsert::<issue_comment::ActiveModel>(comments).await
    }

    async fn write_issue_pipelines(&self, pipelines: Vec<issue_pipeline::Model>) -> Result<()> {
        self.upsert::<issue_pipeline::ActiveModel>(pipelines).await
    }

    async fn write_pull_requests(&self, prs: Vec<pull_request::Model>) -> Result<()> {
        self.upsert::<pull_request::ActiveModel>(prs).await
    }

    async fn write_pull_request_reviews(
        &self,
        reviews: Vec<pull_request_review::Model>,
    ) -> Result<()> {
        self.upsert::<pull_request_review::ActiveModel>(reviews)
            .await
    }

    async fn write_pull_request_review_comments(
        &self,
        comments: Vec<pull_request_review_comment::Model>,
    ) -> Result<()> {
        self.upsert::<pull_request_review_comment::ActiveModel>(comments)
            .await
    }

    async fn write_repo_comments(&self, comments: Vec<repo_comment::Model>) -> Result<()> {
        self.upsert::<repo_comment::ActiveModel>(comments).await
    }

    async fn write_issue_events(&self, events: Vec<issue_event::Model>) -> Result<()> {
        self.upsert::<issue_event::ActiveModel>(events).await
    }

    async fn write_issue_comment_events(
        &self,
        events: Vec<issue_comment_event::Model>,
    ) -> Result<()> {
        self.upsert::<issue_comment_event::ActiveModel>(events)
            .await
    }

    async fn write_pull_request_events(
        &self,
        events: Vec<pull_request_event::Model>,
    ) -> Result<()> {
        self.upsert::<pull_request_event::ActiveModel>(events).await
    }

    async fn write_pull_request_review_comment_events(
        &self,
        events: Vec<pull_request_review_comment_event::Model>,
    ) -> Result<()> {
        self.upsert::<pull_request_review_comment_event::ActiveModel>(events)
            .await
    }

    async fn write_pull_request_review_events(
        &self,
        events: Vec<pull_request_review_event::Model>,
    ) -> Result<()> {
        self.upsert::<pull_request_review_event::ActiveModel>(events)
            .await
    }

    async fn write_repo_comment_events(
        &self,
        events: Vec<repo_comment_event::Model>,
    ) -> Result<()> {
        self.upsert::<repo_comment_event::ActiveModel>(events).await
    }

    async fn read_bot_activity(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<Option<bot_activity::Model>> {
        Ok(
            bot_activity::Entity::find_by_id((org.to_string(), repo.to_string()))
                .one(&self.db)
                .await?,
        )
    }

    async fn advance_bookmark(
        &self,
        org: &str,
        repo: &str,
        bookmark: Bookmark,
        guard: Option<DateTime<Utc>>,
        new: DateTime<Utc>,
    ) -> Result<bool> {
        if self.try_advance(org, repo, bookmark, guard, new).await? {
            return Ok(true);
        }

        // A missing row reads as all-null bookmarks, so it only matches a null guard.
        if guard.is_some() || self.read_bot_activity(org, repo).await?.is_some() {
            return Ok(false);
        }

        bot_activity::Entity::insert(bot_activity::Model::new(org, repo).into_active_model())
            .on_conflict(
                OnConflict::columns([
                    bot_activity::Column::OrgLogin,
                    bot_activity::Column::RepoName,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.try_advance(org, repo, bookmark, guard, new).await
    }

    async fn query_issues_by_repo(&self, org: &str, repo: &str) -> Result<Vec<issue::Model>> {
        Ok(issue::Entity::find()
            .filter(issue::Column::OrgLogin.eq(org))
            .filter(issue::Column::RepoName.eq(repo))
            .order_by_asc(issue::Column::IssueNumber)
            .all(&self.db)
            .await?)
    }

    async fn read_user(&self, login: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(login.to_string())
            .one(&self.db)
            .await?)
    }

    async fn read_label(
        &self,
        org: &str,
        repo: &str,
        name: &str,
    ) -> Result<Option<label::Model>> {
        Ok(
            label::Entity::find_by_id((org.to_string(), repo.to_string(), name.to_string()))
                .one(&self.db)
                .await?,
        )
    }

    async fn read_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: i64,
    ) -> Result<Option<pull_request::Model>> {
        Ok(
            pull_request::Entity::find_by_id((org.to_string(), repo.to_string(), number))
                .one(&self.db)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};

    use super::*;
    use crate::entity::string_list::StringList;

    fn user(login: &str) -> user::Model {
        user::Model::stub(login)
    }

    #[test]
    fn entity_upsert_updates_non_key_columns() {
        let sql = user::Entity::insert(user("alice").into_active_model())
            .on_conflict(upsert_on_conflict::<user::Entity>())
            .build(DatabaseBackend::Sqlite)
            .to_string();

        assert!(sql.contains(r#"ON CONFLICT ("user_login") DO UPDATE SET"#), "{sql}");
        assert!(sql.contains(r#""name" = "excluded"."name""#), "{sql}");
    }

    #[test]
    fn event_upsert_ignores_duplicates() {
        let event = issue_event::Model {
            org_login: "istio".into(),
            repo_name: "istio".into(),
            issue_number: 1,
            created_at: Utc::now(),
            actor: "alice".into(),
            action: "opened".into(),
        };
        let sql = issue_event::Entity::insert(event.into_active_model())
            .on_conflict(upsert_on_conflict::<issue_event::Entity>())
            .build(DatabaseBackend::Sqlite)
            .to_string();

        assert!(sql.ends_with("DO NOTHING"), "{sql}");
    }

    #[tokio::test]
    async fn empty_batches_do_not_touch_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let store = DbStore::new(db);

        store.write_users(Vec::new()).await.unwrap();
        store.write_issue_events(Vec::new()).await.unwrap();

        let DbStore { db } = store;
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn large_batches_are_chunked() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([
                MockExecResult {
                    rows_affected: 100,
                    last_insert_id: 0,
                },
                MockExecResult {
                    rows_affected: 5,
                    last_insert_id: 0,
                },
            ])
            .into_connection();
        let store = DbStore::new(db);

        let maintainers: Vec<maintainer::Model> = (0..105)
            .map(|i| maintainer::Model {
                paths: StringList::from(vec![format!("istio/pkg{i}")]),
                ..maintainer::Model::new("istio", format!("user{i}"))
            })
            .collect();
        let written = upsert_models::<maintainer::ActiveModel, _>(store.connection(), maintainers)
            .await
            .unwrap();

        assert_eq!(written, 105);
        let DbStore { db } = store;
        assert_eq!(db.into_transaction_log().len(), 2);
    }
}
