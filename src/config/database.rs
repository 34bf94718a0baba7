//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Creation is idempotent (`IF NOT EXISTS`) because it runs on every start.

use crate::config::DatabaseConfig;
use crate::entities::{AccountEntry, EnergyCounter, EnergyCounterReading, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Establishes a connection to the configured database.
pub async fn create_connection(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", config.url);
    Database::connect(&config.url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    db.execute(builder.build(statement.if_not_exists())).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so the foreign keys resolve:
/// users, account entries, energy counters, then counter readings.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, AccountEntry).await?;
    create_table(db, &schema, EnergyCounter).await?;
    create_table(db, &schema, EnergyCounterReading).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AccountEntryModel, EnergyCounterModel, EnergyCounterReadingModel, UserModel,
    };
    use sea_orm::QuerySelect;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_connection() -> Result<()> {
        let db = create_connection(&memory_config()).await?;
        create_tables(&db).await?;

        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection(&memory_config()).await?;
        create_tables(&db).await?;

        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<AccountEntryModel> = AccountEntry::find().limit(1).all(&db).await?;
        let _: Vec<EnergyCounterModel> = EnergyCounter::find().limit(1).all(&db).await?;
        let _: Vec<EnergyCounterReadingModel> =
            EnergyCounterReading::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection(&memory_config()).await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
