//! Organization-level passes: members and maintainers.

use tracing::{debug, warn};

use super::RunContext;
use crate::entity::{member, organization, repository};
use crate::github::convert::convert_user;
use crate::sync::context::Syncer;
use crate::sync::maintainers::{
    CODEOWNERS_PATH, MaintainerError, MaintainerSet, is_owners_file, owners_dir, parse_codeowners,
    parse_owners,
};
use crate::sync::types::{Result, SyncError};

/// `RunContext::upstream` only fails on cancellation.
fn cancelled(_: SyncError) -> MaintainerError {
    MaintainerError::Cancelled
}

impl Syncer {
    /// Replace the organization's member list.
    pub(super) async fn handle_members(
        &self,
        run: &mut RunContext<'_>,
        org: &organization::Model,
    ) -> Result<usize> {
        debug!("Getting members");

        let mut members = Vec::new();
        let mut page = Some(1);
        while let Some(n) = page {
            let batch = run
                .upstream(self.github.list_members(&org.org_login, n))
                .await??;
            for user in &batch.items {
                run.users.register(convert_user(user));
                members.push(member::Model {
                    org_login: org.org_login.clone(),
                    user_login: user.login.clone(),
                });
            }
            page = batch.next_page;
        }

        let count = members.len();
        self.store
            .write_all_members(&org.org_login, members)
            .await?;
        Ok(count)
    }

    /// Rebuild the organization's maintainers from ownership files.
    ///
    /// A repository whose ownership files cannot be read is skipped with a
    /// warning. The result replaces the organization's previous maintainers.
    #[tracing::instrument(skip_all, fields(org = %org.org_login))]
    pub(super) async fn handle_maintainers(
        &self,
        run: &mut RunContext<'_>,
        org: &organization::Model,
        repos: &[&repository::Model],
    ) -> Result<usize> {
        debug!("Getting maintainers");

        let mut set = MaintainerSet::new(&org.org_login);
        for repo in repos {
            match self.resolve_repo_maintainers(run, &mut set, repo).await {
                Ok(()) => {}
                Err(MaintainerError::Cancelled) => return Err(SyncError::Cancelled),
                Err(e) => self.warning(
                    run,
                    format!(
                        "Unable to establish maintainers for repo {}/{}: {e}",
                        repo.org_login, repo.repo_name
                    ),
                ),
            }
        }

        let count = set.len();
        self.store
            .write_all_maintainers(&org.org_login, set.into_models())
            .await?;
        Ok(count)
    }

    async fn resolve_repo_maintainers(
        &self,
        run: &mut RunContext<'_>,
        set: &mut MaintainerSet,
        repo: &repository::Model,
    ) -> std::result::Result<(), MaintainerError> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());

        let contents = run
            .upstream(self.github.get_contents(org, name, CODEOWNERS_PATH))
            .await
            .map_err(cancelled)?;

        match contents {
            Ok(file) => {
                let body = file.decoded().map_err(MaintainerError::CodeOwners)?;
                let rules = parse_codeowners(&body);
                debug!(repo = name, rules = rules.len(), "Read CODEOWNERS");

                for rule in &rules {
                    for login in &rule.logins {
                        self.add_maintainer_path(run, set, login, name, &rule.path)
                            .await?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                debug!(repo = name, error = %e, "no CODEOWNERS, scanning OWNERS files");
                self.apply_owners_files(run, set, repo).await
            }
        }
    }

    async fn apply_owners_files(
        &self,
        run: &mut RunContext<'_>,
        set: &mut MaintainerSet,
        repo: &repository::Model,
    ) -> std::result::Result<(), MaintainerError> {
        let (org, name) = (repo.org_login.as_str(), repo.repo_name.as_str());
        let branch = repo.default_branch.as_str();

        let sha = run
            .upstream(self.github.latest_commit_sha(org, name, branch))
            .await
            .map_err(cancelled)?
            .map_err(|source| MaintainerError::Commit {
                branch: branch.to_string(),
                source,
            })?;

        let tree = run
            .upstream(self.github.get_tree(org, name, &sha, true))
            .await
            .map_err(cancelled)?
            .map_err(MaintainerError::Tree)?;

        let mut files = Vec::new();
        for entry in tree.tree.iter().filter(|e| is_owners_file(&e.path)) {
            let body = run
                .upstream(self.github.fetch_raw(org, name, branch, &entry.path))
                .await
                .map_err(cancelled)?
                .map_err(|source| MaintainerError::Fetch {
                    path: entry.path.clone(),
                    source,
                })?;
            files.push((entry.path.clone(), parse_owners(&entry.path, &body)?));
        }
        debug!(repo = name, files = files.len(), "OWNERS files found");

        // Reviewers are parsed but do not grant paths.
        for (path, file) in &files {
            for login in &file.approvers {
                self.add_maintainer_path(run, set, login, name, owners_dir(path))
                    .await?;
            }
        }

        Ok(())
    }

    /// Credit `repo/path` to a login. A login that cannot be resolved is
    /// skipped with a warning.
    async fn add_maintainer_path(
        &self,
        run: &mut RunContext<'_>,
        set: &mut MaintainerSet,
        login: &str,
        repo: &str,
        path: &str,
    ) -> std::result::Result<(), MaintainerError> {
        match self.resolve_maintainer(run, login).await {
            Ok(user_login) => {
                debug!(login = %user_login, repo, path, "maintainer path");
                set.add_path(&user_login, repo, path);
                Ok(())
            }
            Err(MaintainerError::Cancelled) => Err(MaintainerError::Cancelled),
            Err(e) => {
                warn!(login, error = %e, "Couldn't get info on potential maintainer");
                run.summary.warnings += 1;
                Ok(())
            }
        }
    }

    /// Resolve a login through the run's users, then the cache, then GitHub.
    async fn resolve_maintainer(
        &self,
        run: &mut RunContext<'_>,
        login: &str,
    ) -> std::result::Result<String, MaintainerError> {
        if let Some(user) = run.users.get(login) {
            return Ok(user.user_login.clone());
        }

        let lookup_failed = |message: String| MaintainerError::UserLookup {
            login: login.to_string(),
            message,
        };

        if let Some(user) = self
            .cache
            .read_user(login)
            .await
            .map_err(|e| lookup_failed(e.to_string()))?
        {
            let user_login = user.user_login.clone();
            run.users.register(user);
            return Ok(user_login);
        }

        let profile = run
            .upstream(self.github.get_user(login))
            .await
            .map_err(cancelled)?
            .map_err(|e| lookup_failed(e.to_string()))?;
        let user = convert_user(&profile);
        let user_login = user.user_login.clone();
        run.users.register(user);
        Ok(user_login)
    }
}
