use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{Command, CommandId};

mod context;
mod memory;

pub use context::{
    ChangeTracker, CommandContext, CommandStore, PendingChange, StoreError, StoreResult,
};
pub use memory::{InMemoryCommandContext, InMemoryStore};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

impl CommandStore for Storage {
    type Context = SqliteCommandContext;

    fn context(&self) -> Self::Context {
        SqliteCommandContext {
            pool: self.pool.clone(),
            tracker: ChangeTracker::default(),
        }
    }
}

pub struct SqliteCommandContext {
    pool: Pool<Sqlite>,
    tracker: ChangeTracker,
}

#[async_trait]
impl CommandContext for SqliteCommandContext {
    async fn list(&self) -> StoreResult<Vec<Command>> {
        let rows = sqlx::query(
            "SELECT id, how_to, commanline, platform FROM commands ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list commands")?;
        Ok(rows.iter().map(command_from_row).collect())
    }

    async fn find_by_id(&self, id: CommandId) -> StoreResult<Option<Command>> {
        let row =
            sqlx::query("SELECT id, how_to, commanline, platform FROM commands WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("failed to load command {id}"))?;
        Ok(row.as_ref().map(command_from_row))
    }

    fn add(&mut self, command: Command) {
        self.tracker.stage(PendingChange::Added(command));
    }

    fn remove(&mut self, command: Command) {
        self.tracker.stage(PendingChange::Removed(command));
    }

    fn mark_modified(&mut self, command: Command) {
        self.tracker.stage(PendingChange::Modified(command));
    }

    async fn commit(&mut self) -> StoreResult<usize> {
        let changes = self.tracker.drain();
        if changes.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin commit transaction")?;
        let mut affected = 0u64;
        for change in &changes {
            let command = change.command();
            let result = match change {
                PendingChange::Added(_) => {
                    sqlx::query(
                        "INSERT INTO commands (id, how_to, commanline, platform) VALUES (?, ?, ?, ?)",
                    )
                    .bind(command.id.0)
                    .bind(&command.how_to)
                    .bind(&command.commanline)
                    .bind(&command.platform)
                    .execute(&mut *tx)
                    .await
                }
                PendingChange::Modified(_) => {
                    sqlx::query(
                        "UPDATE commands SET how_to = ?, commanline = ?, platform = ? WHERE id = ?",
                    )
                    .bind(&command.how_to)
                    .bind(&command.commanline)
                    .bind(&command.platform)
                    .bind(command.id.0)
                    .execute(&mut *tx)
                    .await
                }
                PendingChange::Removed(_) => {
                    sqlx::query("DELETE FROM commands WHERE id = ?")
                        .bind(command.id.0)
                        .execute(&mut *tx)
                        .await
                }
            };

            // Dropping `tx` on the error paths rolls the whole commit back.
            let rows = match result {
                Ok(done) => done.rows_affected(),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    return Err(StoreError::DuplicateId(command.id));
                }
                Err(error) => {
                    return Err(anyhow::Error::new(error)
                        .context(format!("failed to apply change to command {}", command.id))
                        .into());
                }
            };
            if rows == 0 {
                debug!(id = %command.id, ?change, "change matched no stored command");
            }
            affected += rows;
        }

        tx.commit()
            .await
            .context("failed to commit command changes")?;
        Ok(affected as usize)
    }
}

fn command_from_row(row: &sqlx::sqlite::SqliteRow) -> Command {
    Command {
        id: CommandId(row.get::<i64, _>("id")),
        how_to: row.get("how_to"),
        commanline: row.get("commanline"),
        platform: row.get("platform"),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
