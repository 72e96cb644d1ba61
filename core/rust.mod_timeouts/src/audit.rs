use async_trait::async_trait;

/// Event emitted when a sanction is reversed. Never persisted as a pending
/// action, only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Unban,
    Unmute,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Unban => write!(f, "unban"),
            AuditAction::Unmute => write!(f, "unmute"),
        }
    }
}

/// Sink for moderation audit entries.
///
/// Fire-and-forget from the manager's point of view: record failures are
/// logged and never fail the cleanup path.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        server_id: &str,
        actor_id: &str,
        target_id: &str,
        action: AuditAction,
        timestamp: i64,
        reason: &str,
    ) -> Result<(), crate::Error>;
}
