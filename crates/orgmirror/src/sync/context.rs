//! Syncer construction.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use orgmirror::sync::{FilterFlags, OrgSpec, Syncer};
//!
//! let syncer = Syncer::builder()
//!     .github(Arc::new(github_client))
//!     .zenhub(Arc::new(zenhub_client))
//!     .store(Arc::new(store))
//!     .org(OrgSpec::new("istio"))
//!     .build()?;
//!
//! let summary = syncer.sync(FilterFlags::ALL, &cancel).await?;
//! ```

use std::sync::Arc;

use crate::cache::{Cache, ReadThroughCache};
use crate::platform::{GitHubApi, ZenHubApi};
use crate::store::Store;

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{OrgSpec, Result, SyncError};

/// Builder for a [`Syncer`].
///
/// The GitHub client and the store are required. Without a cache, a
/// [`ReadThroughCache`] over the store is used. Without a ZenHub client the
/// pipeline pass is skipped with a warning.
#[derive(Default)]
pub struct SyncerBuilder {
    github: Option<Arc<dyn GitHubApi>>,
    zenhub: Option<Arc<dyn ZenHubApi>>,
    store: Option<Arc<dyn Store>>,
    cache: Option<Arc<dyn Cache>>,
    orgs: Vec<OrgSpec>,
    progress: Option<ProgressCallback>,
}

impl SyncerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the GitHub client.
    pub fn github(mut self, client: Arc<dyn GitHubApi>) -> Self {
        self.github = Some(client);
        self
    }

    /// Set the ZenHub client.
    pub fn zenhub(mut self, client: Arc<dyn ZenHubApi>) -> Self {
        self.zenhub = Some(client);
        self
    }

    /// Set the durable store.
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the cache consulted for users and pull requests.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add one organization to mirror.
    pub fn org(mut self, org: OrgSpec) -> Self {
        self.orgs.push(org);
        self
    }

    /// Add several organizations to mirror.
    pub fn orgs(mut self, orgs: impl IntoIterator<Item = OrgSpec>) -> Self {
        self.orgs.extend(orgs);
        self
    }

    /// Set the progress callback.
    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Build the syncer.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingField` if the GitHub client or the store is
    /// not set.
    pub fn build(self) -> Result<Syncer> {
        let github = self
            .github
            .ok_or(SyncError::MissingField { field: "github" })?;
        let store = self
            .store
            .ok_or(SyncError::MissingField { field: "store" })?;
        let cache: Arc<dyn Cache> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(ReadThroughCache::new(Arc::clone(&store))),
        };

        Ok(Syncer {
            github,
            zenhub: self.zenhub,
            store,
            cache,
            orgs: self.orgs,
            progress: self.progress,
        })
    }
}

/// Mirrors the configured organizations into a store.
///
/// A `Syncer` holds no per-run state, so [`Syncer::sync`] can be called
/// repeatedly; each call starts from an empty user registry.
pub struct Syncer {
    pub(super) github: Arc<dyn GitHubApi>,
    pub(super) zenhub: Option<Arc<dyn ZenHubApi>>,
    pub(super) store: Arc<dyn Store>,
    pub(super) cache: Arc<dyn Cache>,
    pub(super) orgs: Vec<OrgSpec>,
    pub(super) progress: Option<ProgressCallback>,
}

impl Syncer {
    /// Create a new builder.
    pub fn builder() -> SyncerBuilder {
        SyncerBuilder::new()
    }

    /// The organizations this syncer mirrors.
    pub fn orgs(&self) -> &[OrgSpec] {
        &self.orgs
    }

    /// The durable store every pass writes to.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The cache consulted for users and pull requests, shared with a refresher.
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub(super) fn emit(&self, event: SyncProgress) {
        emit(self.progress.as_ref(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::FakeGitHub;

    #[test]
    fn test_builder_missing_github() {
        let result = Syncer::builder()
            .store(Arc::new(MemoryStore::new()))
            .build();
        assert!(matches!(
            result,
            Err(SyncError::MissingField { field: "github" })
        ));
    }

    #[test]
    fn test_builder_missing_store() {
        let result = Syncer::builder()
            .github(Arc::new(FakeGitHub::default()))
            .build();
        assert!(matches!(
            result,
            Err(SyncError::MissingField { field: "store" })
        ));
    }

    #[test]
    fn test_builder_collects_orgs() {
        let syncer = Syncer::builder()
            .github(Arc::new(FakeGitHub::default()))
            .store(Arc::new(MemoryStore::new()))
            .org(OrgSpec::new("istio"))
            .orgs([OrgSpec::new("envoyproxy").with_repos(["envoy"])])
            .build()
            .unwrap();

        let names: Vec<_> = syncer.orgs().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["istio", "envoyproxy"]);
        assert!(syncer.zenhub.is_none());
    }
}
