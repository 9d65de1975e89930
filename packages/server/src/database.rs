use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    ensure_sqlite_parent(&config.url)?;

    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("filedrop::entity::*")
        .sync(&db)
        .await?;

    tracing::info!(backend = ?db.get_database_backend(), "database ready");
    Ok(db)
}

/// SQLite creates the database file on demand but not its directory.
fn ensure_sqlite_parent(url: &str) -> Result<(), DbErr> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(':') {
        return Ok(());
    }

    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| DbErr::Custom(format!("cannot create {}: {e}", parent.display()))),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) async fn test_db(dir: &Path) -> DatabaseConnection {
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.join("test.db").display()),
        max_connections: 5,
    };
    init_db(&config).await.unwrap()
}
