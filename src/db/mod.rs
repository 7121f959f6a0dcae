//! This module is responsible for reading, writing and managing the SQLite database

mod migrations;

use crate::error::Res;
use crate::store::RecordStore;
use anyhow::{bail, Context};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// The SQLite database that holds the local record store.
#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!(
                "No database found at {}, run 'fintrack init' first",
                path.display()
            );
        }
        let pool = connect(path, false).await?;
        let current = migrations::version(&pool).await?;
        if current > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {current} is newer than this program supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, current, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }
}

async fn connect(path: &Path, create: bool) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse SQLite connection string")?
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open the database at {}", path.display()))
}

const UPSERT: &str = "INSERT INTO records (key, value) VALUES (?, ?) \
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

#[async_trait]
impl RecordStore for Db {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM records WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read record '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to write record '{key}'"))?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Res<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        for (key, value) in entries {
            sqlx::query(UPSERT)
                .bind(*key)
                .bind(value.as_str())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to write record '{key}'"))?;
        }
        tx.commit().await.context("Failed to commit records")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CATEGORIES_KEY, PROJECTS_KEY};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fintrack.sqlite");
        let db = Db::init(&path).await.unwrap();
        db.set(PROJECTS_KEY, "[]").await.unwrap();
        db.set(PROJECTS_KEY, r#"[{"id":"p1"}]"#).await.unwrap();
        drop(db);

        let db = Db::load(&path).await.unwrap();
        assert_eq!(
            db.get(PROJECTS_KEY).await.unwrap().unwrap(),
            r#"[{"id":"p1"}]"#
        );
        assert!(db.get(CATEGORIES_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fintrack.sqlite");
        Db::init(&path).await.unwrap();
        assert!(Db::init(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_requires_file() {
        let dir = TempDir::new().unwrap();
        assert!(Db::load(dir.path().join("missing.sqlite")).await.is_err());
    }

    #[tokio::test]
    async fn test_set_many() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(dir.path().join("fintrack.sqlite")).await.unwrap();
        db.set_many(&[
            (PROJECTS_KEY, "[]".to_string()),
            (CATEGORIES_KEY, "[1]".to_string()),
        ])
        .await
        .unwrap();
        assert_eq!(db.get(CATEGORIES_KEY).await.unwrap().unwrap(), "[1]");
        assert_eq!(db.get(PROJECTS_KEY).await.unwrap().unwrap(), "[]");
    }
}
