//! Durable storage for the mirror.
//!
//! The sync engine and refresher only see the [`Store`] trait. [`DbStore`]
//! persists through sea-orm (SQLite or PostgreSQL); [`MemoryStore`] keeps
//! everything in process for tests and dry runs.

mod db;
mod errors;
mod memory;
mod traits;

pub use db::DbStore;
pub use errors::{Result, StoreError};
pub use memory::{MemoryState, MemoryStore};
pub use traits::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn database_errors_convert() {
        let err: StoreError = DbErr::Custom("disk full".to_string()).into();
        assert!(err.to_string().contains("disk full"));
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn unavailable_names_the_operation() {
        let err = StoreError::unavailable("write_users");
        assert_eq!(err.to_string(), "Store unavailable: write_users");
    }
}
