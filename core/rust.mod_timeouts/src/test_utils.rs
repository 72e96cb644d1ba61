use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::audit::{AuditAction, AuditSink};
use crate::ledger::{ActionLedger, ActionType, TimedAction};
use crate::manager::TimeoutManager;
use crate::members::{Member, MemberManager};
use crate::registry::TimerId;

type Key = (String, ActionType, String);

fn key(user_id: &str, action: ActionType, server_id: &str) -> Key {
    (user_id.to_string(), action, server_id.to_string())
}

/// In-memory stand-in for the persisted ledger. Upserts on the natural key
/// like the real table does.
#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<HashMap<Key, TimedAction>>,
    pub fail_inserts: AtomicBool,
}

impl MemoryLedger {
    pub fn contains(&self, user_id: &str, action: ActionType, server_id: &str) -> bool {
        self.rows
            .lock()
            .unwrap()
            .contains_key(&key(user_id, action, server_id))
    }

    pub fn get(
        &self,
        user_id: &str,
        action: ActionType,
        server_id: &str,
    ) -> Option<TimedAction> {
        self.rows
            .lock()
            .unwrap()
            .get(&key(user_id, action, server_id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn seed(&self, row: TimedAction) {
        self.rows
            .lock()
            .unwrap()
            .insert(key(&row.user_id, row.action, &row.server_id), row);
    }
}

#[async_trait]
impl ActionLedger for MemoryLedger {
    async fn insert(&self, action: &TimedAction) -> Result<(), crate::Error> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err("Ledger insert refused".into());
        }

        self.rows.lock().unwrap().insert(
            key(&action.user_id, action.action, &action.server_id),
            action.clone(),
        );

        Ok(())
    }

    async fn delete_and_return_handle(
        &self,
        user_id: &str,
        action: ActionType,
        server_id: &str,
    ) -> Result<Option<TimerId>, crate::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .remove(&key(user_id, action, server_id))
            .map(|row| row.handle))
    }

    async fn list_all(&self) -> Result<Vec<TimedAction>, crate::Error> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }
}

/// Records reversal calls instead of talking to a real server.
#[derive(Default)]
pub struct RecordingMembers {
    /// (server_id, user_id) pairs unbanned
    pub unbans: Mutex<Vec<(String, String)>>,
    /// (server_id, user_id, role_id) triples stripped
    pub removed_roles: Mutex<Vec<(String, String, String)>>,
    pub fail_calls: AtomicBool,
}

#[async_trait]
impl MemberManager for RecordingMembers {
    async fn unban(&self, server_id: &str, user_id: &str) -> Result<(), crate::Error> {
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err("Remote rejected the unban".into());
        }

        self.unbans
            .lock()
            .unwrap()
            .push((server_id.to_string(), user_id.to_string()));

        Ok(())
    }

    async fn fetch_member(
        &self,
        server_id: &str,
        user_id: &str,
    ) -> Result<Member, crate::Error> {
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err("Remote rejected the member fetch".into());
        }

        Ok(Member {
            user_id: user_id.to_string(),
            server_id: server_id.to_string(),
            role_ids: vec!["muted-role".to_string()],
        })
    }

    async fn remove_role(
        &self,
        server_id: &str,
        member: &Member,
        role_id: &str,
    ) -> Result<(), crate::Error> {
        self.removed_roles.lock().unwrap().push((
            server_id.to_string(),
            member.user_id.clone(),
            role_id.to_string(),
        ));

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub server_id: String,
    pub actor_id: String,
    pub target_id: String,
    pub action: AuditAction,
    pub timestamp: i64,
    pub reason: String,
}

#[derive(Default)]
pub struct RecordingAudit {
    pub entries: Mutex<Vec<AuditEntry>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(
        &self,
        server_id: &str,
        actor_id: &str,
        target_id: &str,
        action: AuditAction,
        timestamp: i64,
        reason: &str,
    ) -> Result<(), crate::Error> {
        self.entries.lock().unwrap().push(AuditEntry {
            server_id: server_id.to_string(),
            actor_id: actor_id.to_string(),
            target_id: target_id.to_string(),
            action,
            timestamp,
            reason: reason.to_string(),
        });

        Ok(())
    }
}

pub struct TestHarness {
    pub manager: TimeoutManager,
    pub ledger: Arc<MemoryLedger>,
    pub members: Arc<RecordingMembers>,
    pub audit: Arc<RecordingAudit>,
}

pub fn harness() -> TestHarness {
    let ledger = Arc::new(MemoryLedger::default());
    let members = Arc::new(RecordingMembers::default());
    let audit = Arc::new(RecordingAudit::default());

    TestHarness {
        manager: TimeoutManager::new(
            ledger.clone(),
            members.clone(),
            audit.clone(),
            "bot-1",
        ),
        ledger,
        members,
        audit,
    }
}

/// Polls until the condition holds. Meant for paused-clock tests, where the
/// sleeps in between auto-advance the timer wheel.
pub async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("Timed out waiting for: {}", what);
}
