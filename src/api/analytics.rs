use crate::{
    api::{attendance, cleaner::roster_cleaner_ids},
    auth::auth::AuthUser,
    config::Config,
    model::role::Role,
    model::schedule::WeeklySchedule,
    model::task_log::parse_id_list,
    utils::metrics::{
        self, CleanerOnTime, DayCompliance, DayHours, PhotoCompliance, PhotoStub, SelectionAgg,
        ShiftRow,
    },
    utils::snapshot_cache::{self, DailySnapshot},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashSet;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub trend: Vec<DayCompliance>,
    pub on_time: Vec<CleanerOnTime>,
    pub photo_compliance: PhotoCompliance,
    pub daily_hours: Vec<DayHours>,
}

/// Multi-day metrics over the manager's roster (or everything for admins)
#[utoipa::path(
    get,
    path = "/api/v1/analytics/summary",
    params(
        ("from", Query, description = "Range start (inclusive)"),
        ("to", Query, description = "Range end (inclusive)")
    ),
    responses(
        (status = 200, description = "Aggregated metrics", body = SummaryResponse),
        (status = 400, description = "Invalid range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if query.from > query.to {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "from must not be after to"
        })));
    }

    let roster = roster_cleaner_ids(pool.get_ref(), &auth).await.map_err(|e| {
        error!(error = %e, "Failed to fetch roster");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Independent queries, fetched concurrently
    let (rows, selections, photos, schedules) = futures::try_join!(
        attendance::fetch_range(pool.get_ref(), query.from, query.to, &roster, None),
        fetch_selections(pool.get_ref(), query.from, query.to, &roster),
        fetch_photos(pool.get_ref(), query.from, query.to, &roster),
        fetch_schedules(pool.get_ref(), &roster),
    )
    .map_err(|e| {
        error!(error = %e, "Failed to fetch analytics inputs");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let shifts: Vec<ShiftRow> = rows
        .iter()
        .map(|r| ShiftRow {
            cleaner_id: r.cleaner_id,
            clock_in: r.clock_in,
            clock_out: r.clock_out,
        })
        .collect();

    let now = Utc::now();
    let range_end = range_end(query.to);
    let grace = Duration::minutes(config.on_time_grace_minutes);

    Ok(HttpResponse::Ok().json(SummaryResponse {
        trend: metrics::compliance_trend(&shifts, query.from, query.to),
        on_time: metrics::on_time_rates(&roster, &shifts, &schedules, grace),
        photo_compliance: metrics::photo_compliance(&selections, &photos),
        daily_hours: metrics::daily_hours(&shifts, query.from, query.to, range_end, now),
    }))
}

/// Same-day metrics recomputation, served through the short-TTL cache
#[utoipa::path(
    get,
    path = "/api/v1/analytics/snapshot",
    params(
        ("date", Query, description = "Day to snapshot")
    ),
    responses(
        (status = 200, description = "Daily snapshot", body = DailySnapshot),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn snapshot(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SnapshotQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let scope = if auth.role == Role::Admin {
        "all".to_string()
    } else {
        auth.user_id.to_string()
    };
    let key = format!("{}:{}", query.date, scope);

    if let Some(cached) = snapshot_cache::get(&key).await {
        return Ok(HttpResponse::Ok().json(cached));
    }

    let roster = roster_cleaner_ids(pool.get_ref(), &auth).await.map_err(|e| {
        error!(error = %e, "Failed to fetch roster");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (rows, selections, photos) = futures::try_join!(
        attendance::fetch_range(pool.get_ref(), query.date, query.date, &roster, None),
        fetch_selections(pool.get_ref(), query.date, query.date, &roster),
        fetch_photos(pool.get_ref(), query.date, query.date, &roster),
    )
    .map_err(|e| {
        error!(error = %e, "Failed to fetch snapshot inputs");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let shifts: Vec<ShiftRow> = rows
        .iter()
        .map(|r| ShiftRow {
            cleaner_id: r.cleaner_id,
            clock_in: r.clock_in,
            clock_out: r.clock_out,
        })
        .collect();

    let now = Utc::now();
    let hours = metrics::daily_hours(&shifts, query.date, query.date, range_end(query.date), now);

    let areas_cleaned = selections
        .iter()
        .map(|s| s.qr_code.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    // "Currently online" is only meaningful when looking at today
    let currently_clocked_in = if query.date == now.date_naive() {
        shifts.iter().filter(|s| s.clock_out.is_none()).count() as u64
    } else {
        0
    };

    let snapshot = DailySnapshot {
        date: query.date.to_string(),
        areas_cleaned,
        photos_taken: photos.len() as u64,
        hours_worked: hours.first().map(|d| d.hours).unwrap_or(0.0),
        currently_clocked_in,
    };

    snapshot_cache::put(key, snapshot.clone()).await;

    Ok(HttpResponse::Ok().json(snapshot))
}

/// Exclusive end boundary of an inclusive date range.
fn range_end(to: NaiveDate) -> DateTime<Utc> {
    (to + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap().and_utc()
}

async fn fetch_selections(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
    cleaner_ids: &[u64],
) -> Result<Vec<SelectionAgg>, sqlx::Error> {
    if cleaner_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; cleaner_ids.len()].join(", ");
    let sql = format!(
        r#"
        SELECT cleaner_id, qr_code, selected_task_ids, created_at
        FROM cleaner_task_selections
        WHERE created_at >= ? AND created_at < DATE_ADD(?, INTERVAL 1 DAY)
        AND cleaner_id IN ({})
        "#,
        placeholders
    );

    let mut q =
        sqlx::query_as::<_, (u64, String, String, DateTime<Utc>)>(&sql).bind(from).bind(to);
    for id in cleaner_ids {
        q = q.bind(id);
    }

    let rows = q.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(cleaner_id, qr_code, raw, created_at)| SelectionAgg {
            cleaner_id,
            qr_code,
            selected: parse_id_list(&raw),
            created_at,
        })
        .collect())
}

async fn fetch_photos(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
    cleaner_ids: &[u64],
) -> Result<Vec<PhotoStub>, sqlx::Error> {
    if cleaner_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; cleaner_ids.len()].join(", ");
    let sql = format!(
        r#"
        SELECT cleaner_id, qr_code, task_id, taken_at
        FROM cleaner_task_photos
        WHERE taken_at >= ? AND taken_at < DATE_ADD(?, INTERVAL 1 DAY)
        AND cleaner_id IN ({})
        "#,
        placeholders
    );

    let mut q = sqlx::query_as::<_, (u64, String, u64, DateTime<Utc>)>(&sql).bind(from).bind(to);
    for id in cleaner_ids {
        q = q.bind(id);
    }

    let rows = q.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(cleaner_id, qr_code, task_id, taken_at)| PhotoStub {
            cleaner_id,
            qr_code,
            task_id,
            taken_at,
        })
        .collect())
}

async fn fetch_schedules(
    pool: &MySqlPool,
    cleaner_ids: &[u64],
) -> Result<Vec<WeeklySchedule>, sqlx::Error> {
    if cleaner_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; cleaner_ids.len()].join(", ");
    let sql = format!(
        "SELECT id, cleaner_id, weekday, start_time FROM weekly_schedules WHERE cleaner_id IN ({})",
        placeholders
    );

    let mut q = sqlx::query_as::<_, WeeklySchedule>(&sql);
    for id in cleaner_ids {
        q = q.bind(id);
    }

    q.fetch_all(pool).await
}
