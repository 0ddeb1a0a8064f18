use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS faces (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        label         TEXT NOT NULL UNIQUE,
        employee_id   TEXT,
        department    TEXT,
        descriptor    TEXT NOT NULL,
        quality       REAL,
        registered_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        face_id           INTEGER NOT NULL REFERENCES faces(id) ON DELETE CASCADE,
        date              TEXT NOT NULL,
        time_in           TEXT NOT NULL,
        time_out          TEXT,
        expected_checkout TEXT,
        status            TEXT NOT NULL,
        UNIQUE (face_id, date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance (date)",
    "CREATE INDEX IF NOT EXISTS idx_faces_department ON faces (department)",
];

/// Open the pool and make sure both tables exist.
pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if database_url.contains(":memory:") {
        // every in-memory connection is its own database
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(options).await?
    };

    bootstrap_schema(&pool).await?;
    Ok(pool)
}

async fn bootstrap_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("faces and attendance tables ready");
    Ok(())
}
