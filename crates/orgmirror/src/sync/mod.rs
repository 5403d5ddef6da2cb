//! Batch synchronization of organizations into the mirror.
//!
//! # Module Structure
//!
//! - [`flags`] - Entity-kind selection: `FilterFlags`, `FilterError`
//! - [`types`] - `OrgSpec`, `SyncSummary`, `SyncError`, constants
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`activity`] - Bookmark windows for incremental passes
//! - [`users`] - Per-run user registry
//! - [`maintainers`] - CODEOWNERS and OWNERS parsing
//! - [`events`] - Repository event normalization
//! - `engine` - The run itself: `Syncer::sync()`
//!
//! # Example
//!
//! ```ignore
//! use orgmirror::sync::{FilterFlags, OrgSpec, Syncer};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn mirror(github: Arc<dyn GitHubApi>, store: Arc<dyn Store>) -> Result<(), SyncError> {
//!     let syncer = Syncer::builder()
//!         .github(github)
//!         .store(store)
//!         .org(OrgSpec::new("istio"))
//!         .build()?;
//!     let flags = FilterFlags::ISSUES | FilterFlags::PRS;
//!     let summary = syncer.sync(flags, &CancellationToken::new()).await?;
//!     println!("Wrote {} users", summary.users);
//!     Ok(())
//! }
//! ```

pub mod activity;
mod context;
mod engine;
pub mod events;
pub mod flags;
pub mod maintainers;
mod progress;
pub mod types;
pub mod users;

pub use activity::{ActivityWindow, BookmarkOutcome};
pub use context::{Syncer, SyncerBuilder};
pub use events::{EventBatch, RepoEventKind};
pub use flags::{FilterError, FilterFlags};
pub use maintainers::{MaintainerError, MaintainerSet};
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{OrgSpec, PIPELINE_FLUSH_SIZE, Result, SyncError, SyncSummary};
pub use users::UserRegistry;
