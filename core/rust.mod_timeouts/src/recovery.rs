use crate::ledger::ActionType;
use crate::manager::TimeoutManager;

/// Re-arms every pending ledger row after a process restart.
///
/// Each row is re-armed with the remaining duration derived from wall-clock
/// time, floored at zero so sanctions that lapsed while the process was down
/// fire immediately. The original start/end times are kept, and the
/// upserting ledger insert means re-arming never duplicates a row. Per-row
/// failures are logged and do not stop recovery of the remaining rows.
pub async fn resume_pending_actions(manager: &TimeoutManager) -> Result<(), crate::Error> {
    let rows = manager.ledger().list_all().await?;

    log::info!("Resuming {} pending timed actions", rows.len());

    for row in rows {
        let remaining = (row.end_time - crate::get_unix_time()).max(0) as u64;

        let res = match row.action {
            ActionType::Ban => {
                manager
                    .add_ban_timeout(
                        remaining,
                        row.start_time,
                        row.end_time,
                        &row.user_id,
                        &row.server_id,
                    )
                    .await
            }
            ActionType::Mute => match row.mute_role_id.clone() {
                Some(role_id) => {
                    manager
                        .add_mute_timeout(
                            remaining,
                            row.start_time,
                            row.end_time,
                            &row.user_id,
                            &row.server_id,
                            role_id,
                        )
                        .await
                }
                None => {
                    log::warn!(
                        "Mute row for user {} in server {} has no mute role recorded, skipping",
                        row.user_id,
                        row.server_id
                    );
                    continue;
                }
            },
        };

        if let Err(e) = res {
            log::error!(
                "Failed to re-arm {} for user {} in server {}: {}",
                row.action,
                row.user_id,
                row.server_id,
                e
            );
        }
    }

    Ok(())
}
