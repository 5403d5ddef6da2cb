//! Initial migration creating every mirrored table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn key(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).string().not_null().to_owned()
}

fn key_number(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).big_integer().not_null().to_owned()
}

fn text(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).text().not_null().default("").to_owned()
}

fn string_list(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .json()
        .not_null()
        .default(Expr::cust("'[]'"))
        .to_owned()
}

fn timestamp(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn nullable_timestamp(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).timestamp_with_time_zone().null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_orgs_and_repos(manager).await?;
        self.create_people(manager).await?;
        self.create_issues(manager).await?;
        self.create_pull_requests(manager).await?;
        self.create_events(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Tables::RepoCommentEvents,
            Tables::PullRequestReviewEvents,
            Tables::PullRequestReviewCommentEvents,
            Tables::PullRequestEvents,
            Tables::IssueCommentEvents,
            Tables::IssueEvents,
            Tables::RepoComments,
            Tables::PullRequestReviewComments,
            Tables::PullRequestReviews,
            Tables::PullRequests,
            Tables::IssuePipelines,
            Tables::IssueComments,
            Tables::Issues,
            Tables::Maintainers,
            Tables::Members,
            Tables::Labels,
            Tables::BotActivities,
            Tables::Users,
            Tables::Repositories,
            Tables::Organizations,
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

impl Migration {
    async fn create_orgs_and_repos(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tables::Organizations)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin).primary_key())
                    .col(ColumnDef::new(Cols::Company).string().null())
                    .col(ColumnDef::new(Cols::Description).text().null())
                    .col(ColumnDef::new(Cols::AvatarUrl).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::Repositories)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::RepoNumber))
                    .col(ColumnDef::new(Cols::Description).text().null())
                    .col(
                        ColumnDef::new(Cols::DefaultBranch)
                            .string()
                            .not_null()
                            .default("master"),
                    )
                    .col(ColumnDef::new(Cols::Watchers).integer().not_null().default(0))
                    .col(ColumnDef::new(Cols::Stars).integer().not_null().default(0))
                    .col(ColumnDef::new(Cols::Forks).integer().not_null().default(0))
                    .col(ColumnDef::new(Cols::OpenIssues).integer().not_null().default(0))
                    .primary_key(Index::create().col(Cols::OrgLogin).col(Cols::RepoName))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::BotActivities)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(nullable_timestamp(Cols::LastIssueSyncStart))
                    .col(nullable_timestamp(Cols::LastIssueCommentSyncStart))
                    .col(nullable_timestamp(Cols::LastPullRequestReviewCommentSyncStart))
                    .primary_key(Index::create().col(Cols::OrgLogin).col(Cols::RepoName))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::Labels)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key(Cols::LabelName))
                    .col(ColumnDef::new(Cols::Description).text().null())
                    .col(ColumnDef::new(Cols::Color).string().not_null().default(""))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::LabelName),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_people(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tables::Users)
                    .if_not_exists()
                    .col(key(Cols::UserLogin).primary_key())
                    .col(ColumnDef::new(Cols::Name).string().not_null().default(""))
                    .col(ColumnDef::new(Cols::Company).string().null())
                    .col(ColumnDef::new(Cols::AvatarUrl).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::Members)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::UserLogin))
                    .primary_key(Index::create().col(Cols::OrgLogin).col(Cols::UserLogin))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::Maintainers)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::UserLogin))
                    .col(string_list(Cols::Paths))
                    .primary_key(Index::create().col(Cols::OrgLogin).col(Cols::UserLogin))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_issues(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tables::Issues)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::IssueNumber))
                    .col(key(Cols::Title))
                    .col(text(Cols::Body))
                    .col(string_list(Cols::Labels))
                    .col(timestamp(Cols::CreatedAt))
                    .col(timestamp(Cols::UpdatedAt))
                    .col(nullable_timestamp(Cols::ClosedAt))
                    .col(key(Cols::State))
                    .col(key(Cols::Author))
                    .col(string_list(Cols::Assignees))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::IssueNumber),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::IssueComments)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::IssueNumber))
                    .col(key_number(Cols::IssueCommentId))
                    .col(text(Cols::Body))
                    .col(key(Cols::Author))
                    .col(timestamp(Cols::CreatedAt))
                    .col(timestamp(Cols::UpdatedAt))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::IssueNumber)
                            .col(Cols::IssueCommentId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::IssuePipelines)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::IssueNumber))
                    .col(key(Cols::Pipeline))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::IssueNumber),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::RepoComments)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::RepoCommentId))
                    .col(text(Cols::Body))
                    .col(key(Cols::Author))
                    .col(timestamp(Cols::CreatedAt))
                    .col(timestamp(Cols::UpdatedAt))
                    .col(key(Cols::CommitSha))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::RepoCommentId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_pull_requests(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tables::PullRequests)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::PullRequestNumber))
                    .col(key(Cols::Title))
                    .col(text(Cols::Body))
                    .col(string_list(Cols::Labels))
                    .col(timestamp(Cols::CreatedAt))
                    .col(timestamp(Cols::UpdatedAt))
                    .col(nullable_timestamp(Cols::ClosedAt))
                    .col(nullable_timestamp(Cols::MergedAt))
                    .col(key(Cols::State))
                    .col(key(Cols::Author))
                    .col(string_list(Cols::Assignees))
                    .col(string_list(Cols::RequestedReviewers))
                    .col(string_list(Cols::Files))
                    .col(key(Cols::BaseCommitSha))
                    .col(key(Cols::HeadCommitSha))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::PullRequestNumber),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::PullRequestReviews)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::PullRequestNumber))
                    .col(key_number(Cols::PullRequestReviewId))
                    .col(text(Cols::Body))
                    .col(key(Cols::Author))
                    .col(nullable_timestamp(Cols::SubmittedAt))
                    .col(key(Cols::State))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::PullRequestNumber)
                            .col(Cols::PullRequestReviewId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tables::PullRequestReviewComments)
                    .if_not_exists()
                    .col(key(Cols::OrgLogin))
                    .col(key(Cols::RepoName))
                    .col(key_number(Cols::PullRequestNumber))
                    .col(key_number(Cols::PullRequestReviewCommentId))
                    .col(text(Cols::Body))
                    .col(key(Cols::Author))
                    .col(timestamp(Cols::CreatedAt))
                    .col(timestamp(Cols::UpdatedAt))
                    .primary_key(
                        Index::create()
                            .col(Cols::OrgLogin)
                            .col(Cols::RepoName)
                            .col(Cols::PullRequestNumber)
                            .col(Cols::PullRequestReviewCommentId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    /// Event tables share one shape: repository, subject ids, then (created_at, actor, action).
    async fn create_events(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        let event_tables: [(Tables, &[Cols]); 6] = [
            (Tables::IssueEvents, &[Cols::IssueNumber]),
            (
                Tables::IssueCommentEvents,
                &[Cols::IssueNumber, Cols::IssueCommentId],
            ),
            (Tables::PullRequestEvents, &[Cols::PullRequestNumber]),
            (
                Tables::PullRequestReviewCommentEvents,
                &[Cols::PullRequestNumber, Cols::PullRequestReviewCommentId],
            ),
            (
                Tables::PullRequestReviewEvents,
                &[Cols::PullRequestNumber, Cols::PullRequestReviewId],
            ),
            (Tables::RepoCommentEvents, &[Cols::RepoCommentId]),
        ];

        for (table, subject) in event_tables {
            let mut create = Table::create();
            create
                .table(table)
                .if_not_exists()
                .col(key(Cols::OrgLogin))
                .col(key(Cols::RepoName));

            let mut pk = Index::create();
            pk.col(Cols::OrgLogin).col(Cols::RepoName);

            for &col in subject {
                create.col(key_number(col));
                pk.col(col);
            }

            create
                .col(timestamp(Cols::CreatedAt))
                .col(key(Cols::Actor))
                .col(key(Cols::Action));
            pk.col(Cols::CreatedAt).col(Cols::Actor).col(Cols::Action);
            create.primary_key(&mut pk);

            manager.create_table(create.to_owned()).await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Tables {
    Organizations,
    Repositories,
    BotActivities,
    Labels,
    Users,
    Members,
    Maintainers,
    Issues,
    IssueComments,
    IssuePipelines,
    RepoComments,
    PullRequests,
    PullRequestReviews,
    PullRequestReviewComments,
    IssueEvents,
    IssueCommentEvents,
    PullRequestEvents,
    PullRequestReviewCommentEvents,
    PullRequestReviewEvents,
    RepoCommentEvents,
}

#[derive(DeriveIden, Clone, Copy)]
enum Cols {
    OrgLogin,
    RepoName,
    RepoNumber,
    UserLogin,
    LabelName,
    Company,
    Description,
    AvatarUrl,
    DefaultBranch,
    Watchers,
    Stars,
    Forks,
    OpenIssues,
    LastIssueSyncStart,
    LastIssueCommentSyncStart,
    LastPullRequestReviewCommentSyncStart,
    Color,
    Name,
    Paths,
    IssueNumber,
    IssueCommentId,
    Title,
    Body,
    Labels,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    MergedAt,
    State,
    Author,
    Assignees,
    RequestedReviewers,
    Files,
    BaseCommitSha,
    HeadCommitSha,
    Pipeline,
    RepoCommentId,
    CommitSha,
    PullRequestNumber,
    PullRequestReviewId,
    PullRequestReviewCommentId,
    SubmittedAt,
    Actor,
    Action,
}
