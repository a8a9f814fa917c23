//! # Database
//!
//! SQLite persistence for per-guild administrator roles.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use log::info;
use serenity::model::id::{GuildId, RoleId};
use sqlite::{Connection, State};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::commands::permissions::{AdminRoleLookup, AdminRoleStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS administrator_roles (
        guild_id INTEGER NOT NULL,
        role_id INTEGER NOT NULL,
        level INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (guild_id, role_id)
    );
";

/// Shared handle to the bot database
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and apply the schema
    ///
    /// `:memory:` gives a private in-memory database.
    pub async fn new(path: &str) -> Result<Self> {
        let connection =
            sqlite::open(path).with_context(|| format!("failed to open database at {path}"))?;
        connection
            .execute(SCHEMA)
            .context("failed to initialize database schema")?;
        info!("Database ready at {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

// Snowflakes fit in 63 bits, so the casts are lossless
fn to_sql(id: u64) -> i64 {
    id as i64
}

#[async_trait]
impl AdminRoleLookup for Database {
    async fn is_administrator_role(&self, guild: GuildId, role: RoleId) -> Result<bool> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(
            "SELECT 1 FROM administrator_roles WHERE guild_id = ? AND role_id = ? LIMIT 1",
        )?;
        statement.bind((1, to_sql(guild.0)))?;
        statement.bind((2, to_sql(role.0)))?;
        Ok(statement.next()? == State::Row)
    }
}

#[async_trait]
impl AdminRoleStore for Database {
    async fn add_administrator_role(&self, guild: GuildId, role: RoleId, level: u8) -> Result<bool> {
        let connection = self.connection.lock().await;

        let mut existing = connection.prepare(
            "SELECT 1 FROM administrator_roles WHERE guild_id = ? AND role_id = ?",
        )?;
        existing.bind((1, to_sql(guild.0)))?;
        existing.bind((2, to_sql(role.0)))?;
        let is_new = existing.next()? != State::Row;
        drop(existing);

        let mut statement = connection.prepare(
            "INSERT INTO administrator_roles (guild_id, role_id, level) VALUES (?, ?, ?)
             ON CONFLICT (guild_id, role_id) DO UPDATE SET level = excluded.level",
        )?;
        statement.bind((1, to_sql(guild.0)))?;
        statement.bind((2, to_sql(role.0)))?;
        statement.bind((3, i64::from(level)))?;
        statement.next()?;
        Ok(is_new)
    }

    async fn remove_administrator_role(&self, guild: GuildId, role: RoleId) -> Result<bool> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare("DELETE FROM administrator_roles WHERE guild_id = ? AND role_id = ?")?;
        statement.bind((1, to_sql(guild.0)))?;
        statement.bind((2, to_sql(role.0)))?;
        statement.next()?;
        drop(statement);
        Ok(connection.change_count() > 0)
    }

    async fn administrator_roles(&self, guild: GuildId) -> Result<Vec<(RoleId, u8)>> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(
            "SELECT role_id, level FROM administrator_roles WHERE guild_id = ? ORDER BY role_id",
        )?;
        statement.bind((1, to_sql(guild.0)))?;

        let mut roles = Vec::new();
        while statement.next()? == State::Row {
            let role_id = statement.read::<i64, _>("role_id")?;
            let level = statement.read::<i64, _>("level")?;
            roles.push((RoleId(role_id as u64), level.clamp(0, u8::MAX as i64) as u8));
        }
        Ok(roles)
    }
}
