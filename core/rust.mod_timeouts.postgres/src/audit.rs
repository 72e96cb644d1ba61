use async_trait::async_trait;
use sqlx::PgPool;

use mod_timeouts::audit::{AuditAction, AuditSink};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS moderation_actions (
    id BIGSERIAL PRIMARY KEY,
    server_id TEXT NOT NULL,
    actor_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    action TEXT NOT NULL,
    action_time BIGINT NOT NULL,
    reason TEXT
)
"#;

/// Writes reversal audit entries to the moderation_actions table.
pub struct PgModerationAudit {
    pool: PgPool,
}

impl PgModerationAudit {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table if it does not exist yet.
    pub async fn init(&self) -> Result<(), mod_timeouts::Error> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;

        log::info!("Ensured moderation_actions table exists");

        Ok(())
    }
}

#[async_trait]
impl AuditSink for PgModerationAudit {
    async fn record(
        &self,
        server_id: &str,
        actor_id: &str,
        target_id: &str,
        action: AuditAction,
        timestamp: i64,
        reason: &str,
    ) -> Result<(), mod_timeouts::Error> {
        sqlx::query(
            "INSERT INTO moderation_actions (server_id, actor_id, target_id, action, action_time, reason)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(server_id)
        .bind(actor_id)
        .bind(target_id)
        .bind(action.to_string())
        .bind(timestamp)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
