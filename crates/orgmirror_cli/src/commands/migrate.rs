use orgmirror::connect;
use orgmirror::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?.len();
            tracing::info!(pending, "Applying migrations");
            Migrator::up(&db, None).await?;
            println!("Applied {pending} migration(s).");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration");
            Migrator::down(&db, Some(1)).await?;
            println!("Rollback complete.");
        }
        MigrateAction::Status => {
            // Prints one line per migration through the migrator's own logging.
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping every mirror table, bookmarks included");
            Migrator::fresh(&db).await?;
            println!("Schema recreated; the next sync fetches everything.");
        }
    }

    Ok(())
}
