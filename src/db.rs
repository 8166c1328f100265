use sea_orm::{
    ConnectionTrait, ConnectOptions, Database, DatabaseConnection, DbBackend, DbErr, Schema,
    Statement,
};
use sea_orm::sea_query::{Index, TableCreateStatement};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{team, user, user_team};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    if config.is_sqlite() {
        info!("Connecting to sqlite database: {}", config.path.display());
    } else {
        info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);
    }

    let db = connect(&config.connection_url()).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Open a connection pool for the given URL
///
/// SQLite gets a single long-lived connection: an in-memory database lives
/// only as long as its connection.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    if database_url.starts_with("sqlite:") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(100)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(8))
            .set_schema_search_path("public");
    }
    opt.sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}

/// Create tables and indexes that do not exist yet
pub async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(team::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user_team::Entity)).await?;

    // One membership row per (user, team), ever
    let membership_index = Index::create()
        .name("idx_pm_user_team_user_team")
        .table(user_team::Entity)
        .col(user_team::Column::UserId)
        .col(user_team::Column::TeamId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&membership_index)).await?;

    let team_index = Index::create()
        .name("idx_pm_user_team_team")
        .table(user_team::Entity)
        .col(user_team::Column::TeamId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&team_index)).await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();

    let sql = backend.build(&stmt);

    db.execute(Statement::from_string(backend, sql.to_string())).await?;

    Ok(())
}
