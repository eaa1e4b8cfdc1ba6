use crate::{
    auth::auth::AuthUser,
    model::task_log::TaskSelection,
    utils::{qr_filter, snapshot_cache},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SubmitSelection {
    #[schema(example = "QR-0012")]
    pub qr_code: String,
    #[schema(example = json!([40, 41]))]
    pub selected_task_ids: Vec<u64>,
    #[schema(example = json!([40]))]
    pub completed_task_ids: Vec<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitPhoto {
    #[schema(example = "QR-0012")]
    pub qr_code: String,
    #[schema(example = 40)]
    pub task_id: u64,
    #[schema(example = "photos/2026/01/05/abc.jpg")]
    pub object_key: String,
}

/// Resolves a scanned code to an active area id. The cuckoo filter screens
/// out definite misses first; false positives fall through to the lookup.
async fn resolve_qr(pool: &MySqlPool, code: &str) -> actix_web::Result<Option<u64>> {
    let code = code.trim().to_uppercase();

    if !qr_filter::might_exist(&code) {
        return Ok(None);
    }

    sqlx::query_scalar::<_, u64>(
        "SELECT id FROM areas WHERE qr_code = ? AND is_active = TRUE",
    )
    .bind(&code)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, qr_code = %code, "QR lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })
}

/// Record the tasks a cleaner selected (and completed) after scanning an area
#[utoipa::path(
    post,
    path = "/api/v1/logs/selections",
    request_body = SubmitSelection,
    responses(
        (status = 201, description = "Selection recorded"),
        (status = 400, description = "Empty selection"),
        (status = 404, description = "Unknown or inactive QR code"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn submit_selection(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubmitSelection>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_profile()?;

    if payload.selected_task_ids.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "At least one task must be selected"
        })));
    }

    if resolve_qr(pool.get_ref(), &payload.qr_code).await?.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Unknown or inactive QR code"
        })));
    }

    let selected = serde_json::to_string(&payload.selected_task_ids).unwrap_or_default();
    let completed = serde_json::to_string(&payload.completed_task_ids).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO cleaner_task_selections
            (cleaner_id, qr_code, selected_task_ids, completed_task_ids, created_at)
        VALUES (?, ?, ?, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(cleaner_id)
    .bind(payload.qr_code.trim().to_uppercase())
    .bind(selected)
    .bind(completed)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Failed to record selection");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    snapshot_cache::invalidate_all();

    Ok(HttpResponse::Created().json(json!({
        "message": "Selection recorded"
    })))
}

/// Record a task photo's storage object key
#[utoipa::path(
    post,
    path = "/api/v1/logs/photos",
    request_body = SubmitPhoto,
    responses(
        (status = 201, description = "Photo recorded"),
        (status = 400, description = "Empty object key"),
        (status = 404, description = "Unknown or inactive QR code"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn submit_photo(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubmitPhoto>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_profile()?;

    if payload.object_key.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Object key must not be empty"
        })));
    }

    if resolve_qr(pool.get_ref(), &payload.qr_code).await?.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Unknown or inactive QR code"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO cleaner_task_photos
            (cleaner_id, qr_code, task_id, object_key, taken_at)
        VALUES (?, ?, ?, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(cleaner_id)
    .bind(payload.qr_code.trim().to_uppercase())
    .bind(payload.task_id)
    .bind(payload.object_key.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Failed to record photo");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    snapshot_cache::invalidate_all();

    Ok(HttpResponse::Created().json(json!({
        "message": "Photo recorded"
    })))
}

/// A cleaner's own selections, newest first
#[utoipa::path(
    get,
    path = "/api/v1/logs/selections",
    responses(
        (status = 200, description = "Selection rows", body = [TaskSelection]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Logs"
)]
pub async fn my_selections(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_profile()?;

    let rows = sqlx::query_as::<_, TaskSelection>(
        r#"
        SELECT id, cleaner_id, qr_code, selected_task_ids, completed_task_ids, created_at
        FROM cleaner_task_selections
        WHERE cleaner_id = ?
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(cleaner_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Failed to fetch selections");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}
