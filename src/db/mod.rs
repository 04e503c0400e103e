pub mod fixtures;
pub mod schema;

use crate::config::Config;
use log::LevelFilter;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub type DbPool = DatabaseConnection;

/// Connects to the configured database and makes sure every table exists.
pub async fn create_pool(config: &Config) -> Result<DbPool, anyhow::Error> {
    let url = config.database_url();
    let mut options = ConnectOptions::new(url.clone());
    options
        .max_connections(config.database.max_connections)
        .sqlx_logging_level(LevelFilter::Debug);

    // Every connection to `sqlite::memory:` opens its own empty database.
    if url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;
    schema::create_schema(&db).await?;
    log::info!("Database schema ready");

    Ok(db)
}
