use crate::api::assist::record_event;
use crate::model::assist::AssistStatus;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{error, info};

/// Periodic escalation sweep: pending assist requests older than the
/// configured threshold move to `escalated`, each with an audit event.
/// Runs for the life of the server.
pub async fn run_escalation_sweep(pool: MySqlPool, escalate_after_minutes: i64, interval_secs: u64) {
    loop {
        actix_web::rt::time::sleep(Duration::from_secs(interval_secs)).await;

        if let Err(e) = sweep_once(&pool, escalate_after_minutes).await {
            error!(error = %e, "Escalation sweep pass failed");
        }
    }
}

async fn sweep_once(pool: &MySqlPool, escalate_after_minutes: i64) -> Result<(), sqlx::Error> {
    let next = AssistStatus::Escalated;
    let Some(prior) = AssistStatus::required_prior(next) else {
        return Ok(());
    };

    let overdue = sqlx::query_as::<_, (u64,)>(
        r#"
        SELECT id
        FROM bathroom_assist_requests
        WHERE status = ?
        AND created_at < DATE_SUB(UTC_TIMESTAMP(), INTERVAL ? MINUTE)
        "#,
    )
    .bind(prior.to_string())
    .bind(escalate_after_minutes)
    .fetch_all(pool)
    .await?;

    for (request_id,) in overdue {
        // Status precondition again: a request accepted since the select
        // above must not be escalated underneath the acceptor.
        let result = sqlx::query(
            r#"
            UPDATE bathroom_assist_requests
            SET status = ?, escalated_at = UTC_TIMESTAMP()
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(next.to_string())
        .bind(request_id)
        .bind(prior.to_string())
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(request_id, "Assist request escalated");
            record_event(pool, request_id, &next.to_string(), "system").await;
        }
    }

    Ok(())
}
