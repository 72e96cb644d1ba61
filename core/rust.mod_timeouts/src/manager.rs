use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditAction, AuditSink};
use crate::ledger::{ActionLedger, ActionType, TimedAction};
use crate::members::MemberManager;
use crate::registry::{TimerId, TimerRegistry};

/// Orchestrates delayed sanction reversals.
///
/// Arms one-shot timers, keeps the ledger row and registry entry in step, and
/// performs the reversal plus cleanup when a timer fires. The registry is
/// owned exclusively by this manager and this manager is the only writer to
/// the ledger rows it creates.
pub struct TimeoutManager {
    registry: Arc<TimerRegistry>,
    ledger: Arc<dyn ActionLedger>,
    members: Arc<dyn MemberManager>,
    audit: Arc<dyn AuditSink>,
    /// Recorded as the actor on reversal audit entries
    bot_id: String,
}

impl TimeoutManager {
    pub fn new(
        ledger: Arc<dyn ActionLedger>,
        members: Arc<dyn MemberManager>,
        audit: Arc<dyn AuditSink>,
        bot_id: impl Into<String>,
    ) -> Self {
        Self {
            registry: Arc::new(TimerRegistry::new()),
            ledger,
            members,
            audit,
            bot_id: bot_id.into(),
        }
    }

    pub fn registry(&self) -> &TimerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<dyn ActionLedger> {
        &self.ledger
    }

    /// Arms the unban timer and records the pending ban in the ledger.
    ///
    /// timeout_secs is the delay actually slept for, which after a restart is
    /// the *remaining* duration. The ledger keeps the original start/end
    /// times so recovery can always recompute the remainder from wall-clock
    /// time instead of trusting a stored countdown.
    pub async fn add_ban_timeout(
        &self,
        timeout_secs: u64,
        start_time: i64,
        end_time: i64,
        user_id: &str,
        server_id: &str,
    ) -> Result<(), crate::Error> {
        self.add_timeout(
            ActionType::Ban,
            timeout_secs,
            start_time,
            end_time,
            user_id,
            server_id,
            None,
        )
        .await
    }

    /// Same as add_ban_timeout, for mutes. mute_role_id is the role stripped
    /// on reversal and is persisted so recovery can re-arm the mute.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_mute_timeout(
        &self,
        timeout_secs: u64,
        start_time: i64,
        end_time: i64,
        user_id: &str,
        server_id: &str,
        mute_role_id: String,
    ) -> Result<(), crate::Error> {
        self.add_timeout(
            ActionType::Mute,
            timeout_secs,
            start_time,
            end_time,
            user_id,
            server_id,
            Some(mute_role_id),
        )
        .await
    }

    /// Cancels a pending reversal, e.g. because of a manual unban/unmute.
    ///
    /// Idempotent: a missing row is a silent no-op. Only one of a manual
    /// cancel and a natural fire ever gets the row's handle back, so the
    /// reversal side effect runs at most once per action.
    pub async fn cancel(
        &self,
        action: ActionType,
        user_id: &str,
        server_id: &str,
    ) -> Result<(), crate::Error> {
        if let Some(handle) = self
            .ledger
            .delete_and_return_handle(user_id, action, server_id)
            .await?
        {
            self.registry.release(handle);
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn add_timeout(
        &self,
        action: ActionType,
        timeout_secs: u64,
        start_time: i64,
        end_time: i64,
        user_id: &str,
        server_id: &str,
        mute_role_id: Option<String>,
    ) -> Result<(), crate::Error> {
        let handle = self.arm(
            action,
            timeout_secs,
            start_time,
            end_time,
            user_id,
            server_id,
            mute_role_id.clone(),
        )?;

        let row = TimedAction {
            user_id: user_id.to_string(),
            server_id: server_id.to_string(),
            action,
            start_time,
            end_time,
            handle,
            mute_role_id,
        };

        if let Err(e) = self.ledger.insert(&row).await {
            // Don't leave an armed timer behind with no row backing it
            self.registry.release(handle);
            return Err(e);
        }

        Ok(())
    }

    /// Schedules the one-shot fire callback and returns its registry handle.
    ///
    /// The callback, once past the Armed -> Firing gate: attempts the
    /// reversal, deletes the ledger row, releases the stored handle and
    /// records the audit entry. Every step is best-effort; a later step
    /// failing never rolls back an earlier one, it is only logged.
    #[allow(clippy::too_many_arguments)]
    fn arm(
        &self,
        action: ActionType,
        timeout_secs: u64,
        start_time: i64,
        end_time: i64,
        user_id: &str,
        server_id: &str,
        mute_role_id: Option<String>,
    ) -> Result<TimerId, crate::Error> {
        let id = self.registry.reserve()?;

        let registry = self.registry.clone();
        let ledger = self.ledger.clone();
        let members = self.members.clone();
        let audit = self.audit.clone();
        let bot_id = self.bot_id.clone();
        let user_id = user_id.to_string();
        let server_id = server_id.to_string();

        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(timeout_secs)).await;

            if !registry.begin_fire(id) {
                // Cancelled while sleeping
                return;
            }

            // Audit messaging uses the originally intended span, not the
            // wall-clock elapsed time, so a restart mid-sanction does not
            // distort the reported duration
            let minutes = (end_time - start_time) / 60;

            match action {
                ActionType::Ban => {
                    log::info!("Unbanning {} after {} minutes timeout", user_id, minutes);

                    if let Err(e) = members.unban(&server_id, &user_id).await {
                        log::warn!(
                            "Unable to unban user {} from server {}: {}",
                            user_id,
                            server_id,
                            e
                        );
                    }
                }
                ActionType::Mute => {
                    log::info!("Unmuting {} after {} minutes timeout", user_id, minutes);

                    let role_id = mute_role_id.as_deref().unwrap_or_default();
                    let unmute = async {
                        let member = members.fetch_member(&server_id, &user_id).await?;
                        members.remove_role(&server_id, &member, role_id).await
                    };

                    if let Err(e) = unmute.await {
                        log::warn!(
                            "Unable to unmute user {} from server {}. Mute role is {}: {}",
                            user_id,
                            server_id,
                            role_id,
                            e
                        );
                    }
                }
            }

            match ledger
                .delete_and_return_handle(&user_id, action, &server_id)
                .await
            {
                Ok(Some(stored)) => {
                    registry.release(stored);

                    let reversal = match action {
                        ActionType::Ban => AuditAction::Unban,
                        ActionType::Mute => AuditAction::Unmute,
                    };
                    let label = match reversal {
                        AuditAction::Unban => "Unban",
                        AuditAction::Unmute => "Unmute",
                    };
                    let reason = format!("{} after {} minutes timeout", label, minutes);

                    if let Err(e) = audit
                        .record(
                            &server_id,
                            &bot_id,
                            &user_id,
                            reversal,
                            crate::get_unix_time(),
                            &reason,
                        )
                        .await
                    {
                        log::warn!("Failed to record {} for user {}: {}", reversal, user_id, e);
                    }

                    log::info!("Done removing {} from the ledger", user_id);
                }
                Ok(None) => {
                    // A concurrent cancel got the row first and released the
                    // stored handle. Our own entry may be a stale duplicate
                    // for the same key, forget it
                    registry.release(id);
                }
                Err(e) => {
                    log::error!(
                        "Failed to delete timed action row for user {}: {}",
                        user_id,
                        e
                    );
                    registry.release(id);
                }
            }
        });

        self.registry.bind(id, task.abort_handle());

        Ok(id)
    }
}
