use anyhow::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

/// SQL migrations, applied in order. Every statement must be idempotent.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_documents.sql",
    include_str!("../migrations/0001_documents.sql"),
)];

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Minimal migration runner for the embedded SQL files.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    for (name, sql) in MIGRATIONS {
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let statement = format!("{stmt};");
            conn.execute(Statement::from_string(backend, statement))
                .await?;
        }
        tracing::debug!(migration = name, "migration applied");
    }

    Ok(())
}
