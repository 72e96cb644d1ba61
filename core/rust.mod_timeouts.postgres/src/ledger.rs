use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use mod_timeouts::ledger::{ActionLedger, ActionType, TimedAction};
use mod_timeouts::registry::TimerId;

use crate::config::StorageConfig;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS timed_actions (
    user_id TEXT NOT NULL,
    server_id TEXT NOT NULL,
    action TEXT NOT NULL,
    start_time BIGINT NOT NULL,
    end_time BIGINT NOT NULL CHECK (end_time > start_time),
    timer_handle INT NOT NULL,
    mute_role_id TEXT,
    PRIMARY KEY (user_id, action, server_id)
)
"#;

/// Timed action ledger persisted in Postgres.
///
/// The primary key is the natural key, so the upserting insert keeps startup
/// recovery from ever duplicating a pending action.
pub struct PgTimeoutLedger {
    pool: PgPool,
}

impl PgTimeoutLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &StorageConfig) -> Result<Self, mod_timeouts::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the backing table if it does not exist yet.
    pub async fn init(&self) -> Result<(), mod_timeouts::Error> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;

        log::info!("Ensured timed_actions table exists");

        Ok(())
    }
}

#[async_trait]
impl ActionLedger for PgTimeoutLedger {
    async fn insert(&self, action: &TimedAction) -> Result<(), mod_timeouts::Error> {
        sqlx::query(
            "INSERT INTO timed_actions (user_id, server_id, action, start_time, end_time, timer_handle, mute_role_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (user_id, action, server_id) DO UPDATE
             SET start_time = EXCLUDED.start_time,
                 end_time = EXCLUDED.end_time,
                 timer_handle = EXCLUDED.timer_handle,
                 mute_role_id = EXCLUDED.mute_role_id",
        )
        .bind(&action.user_id)
        .bind(&action.server_id)
        .bind(action.action.to_string())
        .bind(action.start_time)
        .bind(action.end_time)
        .bind(action.handle)
        .bind(&action.mute_role_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_and_return_handle(
        &self,
        user_id: &str,
        action: ActionType,
        server_id: &str,
    ) -> Result<Option<TimerId>, mod_timeouts::Error> {
        let row = sqlx::query(
            "DELETE FROM timed_actions WHERE user_id = $1 AND action = $2 AND server_id = $3 RETURNING timer_handle",
        )
        .bind(user_id)
        .bind(action.to_string())
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<i32, _>("timer_handle")?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<TimedAction>, mod_timeouts::Error> {
        let rows = sqlx::query(
            "SELECT user_id, server_id, action, start_time, end_time, timer_handle, mute_role_id FROM timed_actions",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut actions = Vec::new();

        for row in rows {
            actions.push(TimedAction {
                user_id: row.try_get("user_id")?,
                server_id: row.try_get("server_id")?,
                action: ActionType::from_str(row.try_get::<String, _>("action")?.as_str())?,
                start_time: row.try_get("start_time")?,
                end_time: row.try_get("end_time")?,
                handle: row.try_get("timer_handle")?,
                mute_role_id: row.try_get("mute_role_id")?,
            });
        }

        Ok(actions)
    }
}
