use async_trait::async_trait;

/// Minimal view of a server member as returned by the member-management
/// capability. Only what a mute reversal needs.
#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: String,
    pub server_id: String,
    pub role_ids: Vec<String>,
}

/// The remote member-management capability (ban and role mutation).
///
/// Every call is a fallible network operation. Callers treat failures as
/// best-effort: they are logged and never propagated into cleanup.
#[async_trait]
pub trait MemberManager: Send + Sync {
    async fn unban(&self, server_id: &str, user_id: &str) -> Result<(), crate::Error>;

    async fn fetch_member(&self, server_id: &str, user_id: &str)
        -> Result<Member, crate::Error>;

    async fn remove_role(
        &self,
        server_id: &str,
        member: &Member,
        role_id: &str,
    ) -> Result<(), crate::Error>;
}
