use crate::{
    api::cleaner::roster_cleaner_ids,
    auth::auth::AuthUser,
    model::attendance::Attendance,
    model::role::Role,
    utils::snapshot_cache,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ClockIn {
    #[schema(example = 1)]
    pub customer_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub cleaner_id: Option<u64>,
}

/// Clock-in endpoint. One open shift per cleaner at a time.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    request_body = ClockIn,
    responses(
        (status = 200, description = "Clocked in successfully"),
        (status = 400, description = "Already clocked in"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockIn>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_profile()?;

    let open = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM time_attendance WHERE cleaner_id = ? AND clock_out IS NULL)",
    )
    .bind(cleaner_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Clock-in lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if open {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Already clocked in"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO time_attendance (cleaner_id, customer_id, clock_in)
        VALUES (?, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(cleaner_id)
    .bind(payload.customer_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Clock-in failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    snapshot_cache::invalidate_all();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked in successfully"
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out successfully"),
        (status = 400, description = "No open shift found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_profile()?;

    let result = sqlx::query(
        r#"
        UPDATE time_attendance
        SET clock_out = UTC_TIMESTAMP()
        WHERE cleaner_id = ?
        AND clock_out IS NULL
        "#,
    )
    .bind(cleaner_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Clock-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No open shift found"
        })));
    }

    snapshot_cache::invalidate_all();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked out successfully"
    })))
}

/// Attendance rows in a date range, roster-scoped for managers
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(
        ("from", Query, description = "Range start (inclusive)"),
        ("to", Query, description = "Range end (inclusive)"),
        ("cleaner_id", Query, description = "Restrict to one cleaner")
    ),
    responses(
        (status = 200, description = "Attendance rows", body = [Attendance]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let roster = roster_cleaner_ids(pool.get_ref(), &auth).await.map_err(|e| {
        error!(error = %e, "Failed to fetch roster");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if let Some(cleaner_id) = query.cleaner_id {
        if auth.role != Role::Admin && !roster.contains(&cleaner_id) {
            return Err(actix_web::error::ErrorForbidden("Cleaner not on roster"));
        }
    }

    let rows = fetch_range(pool.get_ref(), query.from, query.to, &roster, query.cleaner_id)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Rows whose clock-in falls inside [from, to], for the given cleaners.
pub async fn fetch_range(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
    cleaner_ids: &[u64],
    only: Option<u64>,
) -> Result<Vec<Attendance>, sqlx::Error> {
    if cleaner_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; cleaner_ids.len()].join(", ");
    let mut sql = format!(
        r#"
        SELECT id, cleaner_id, customer_id, clock_in, clock_out
        FROM time_attendance
        WHERE clock_in >= ? AND clock_in < DATE_ADD(?, INTERVAL 1 DAY)
        AND cleaner_id IN ({})
        "#,
        placeholders
    );
    if only.is_some() {
        sql.push_str(" AND cleaner_id = ?");
    }
    sql.push_str(" ORDER BY clock_in");

    let mut q = sqlx::query_as::<_, Attendance>(&sql).bind(from).bind(to);
    for id in cleaner_ids {
        q = q.bind(id);
    }
    if let Some(id) = only {
        q = q.bind(id);
    }

    q.fetch_all(pool).await
}
