use crate::{
    api::cleaner::roster_cleaner_ids,
    auth::auth::AuthUser,
    config::Config,
    model::task_log::PhotoFeedback,
    utils::grouping::{self, AreaGroup, ReviewPhoto, SessionRef},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub cleaner_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateFeedback {
    #[schema(example = "Mirror still streaky, please redo")]
    pub comment: String,
}

/// Task photos grouped by session and nested under their area, newest first
#[utoipa::path(
    get,
    path = "/api/v1/review/photos",
    params(
        ("from", Query, description = "Range start (inclusive)"),
        ("to", Query, description = "Range end (inclusive)")
    ),
    responses(
        (status = 200, description = "Grouped photos", body = [AreaGroup]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Review"
)]
pub async fn review_photos(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReviewQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let roster = roster_cleaner_ids(pool.get_ref(), &auth).await.map_err(|e| {
        error!(error = %e, "Failed to fetch roster");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if roster.is_empty() {
        return Ok(HttpResponse::Ok().json(Vec::<AreaGroup>::new()));
    }

    let placeholders = vec!["?"; roster.len()].join(", ");

    let photo_sql = format!(
        r#"
        SELECT p.id, p.cleaner_id, cl.name, p.qr_code, a.name, cu.name,
               p.task_id, p.object_key, p.taken_at
        FROM cleaner_task_photos p
        JOIN cleaners cl ON cl.id = p.cleaner_id
        JOIN areas a ON a.qr_code = p.qr_code
        JOIN customers cu ON cu.id = a.customer_id
        WHERE p.taken_at >= ? AND p.taken_at < DATE_ADD(?, INTERVAL 1 DAY)
        AND p.cleaner_id IN ({})
        "#,
        placeholders
    );

    type PhotoTuple = (u64, u64, String, String, String, String, u64, String, DateTime<Utc>);
    let mut photo_q = sqlx::query_as::<_, PhotoTuple>(&photo_sql).bind(query.from).bind(query.to);
    for id in &roster {
        photo_q = photo_q.bind(id);
    }

    let session_sql = format!(
        r#"
        SELECT cleaner_id, qr_code, created_at
        FROM cleaner_task_selections
        WHERE created_at >= ? AND created_at < DATE_ADD(?, INTERVAL 1 DAY)
        AND cleaner_id IN ({})
        "#,
        placeholders
    );
    let mut session_q = sqlx::query_as::<_, (u64, String, DateTime<Utc>)>(&session_sql)
        .bind(query.from)
        .bind(query.to);
    for id in &roster {
        session_q = session_q.bind(id);
    }

    let (photo_rows, session_rows) =
        futures::try_join!(photo_q.fetch_all(pool.get_ref()), session_q.fetch_all(pool.get_ref()))
            .map_err(|e| {
                error!(error = %e, "Failed to fetch review inputs");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let photos: Vec<ReviewPhoto> = photo_rows
        .into_iter()
        .map(
            |(id, cleaner_id, cleaner_name, qr_code, area_name, customer_name, task_id, key, taken_at)| {
                ReviewPhoto {
                    id,
                    cleaner_id,
                    cleaner_name,
                    qr_code,
                    area_name,
                    customer_name,
                    task_id,
                    url: format!("{}/{}", config.media_base_url.trim_end_matches('/'), key),
                    taken_at,
                }
            },
        )
        .collect();

    let sessions: Vec<SessionRef> = session_rows
        .into_iter()
        .map(|(cleaner_id, qr_code, created_at)| SessionRef { cleaner_id, qr_code, created_at })
        .collect();

    Ok(HttpResponse::Ok().json(grouping::group_photos(photos, &sessions)))
}

/// Attach manager feedback to a photo
#[utoipa::path(
    post,
    path = "/api/v1/review/photos/{photo_id}/feedback",
    params(
        ("photo_id", Path, description = "Photo ID")
    ),
    request_body = CreateFeedback,
    responses(
        (status = 201, description = "Feedback recorded"),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "Photo not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Review"
)]
pub async fn create_feedback(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateFeedback>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let photo_id = path.into_inner();

    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Comment must not be empty"
        })));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM cleaner_task_photos WHERE id = ?)",
    )
    .bind(photo_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, photo_id, "Photo lookup failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Photo not found"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO photo_feedback (photo_id, manager_id, comment, created_at)
        VALUES (?, ?, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(photo_id)
    .bind(auth.user_id)
    .bind(comment)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, photo_id, "Failed to record feedback");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Feedback recorded"
    })))
}

/// Feedback rows; cleaners see their own, managers can filter by cleaner
#[utoipa::path(
    get,
    path = "/api/v1/review/feedback",
    params(
        ("cleaner_id", Query, description = "Filter by cleaner (manager/admin)")
    ),
    responses(
        (status = 200, description = "Feedback rows", body = [PhotoFeedback])
    ),
    security(("bearer_auth" = [])),
    tag = "Review"
)]
pub async fn list_feedback(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<FeedbackQuery>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = if auth.is_cleaner() {
        auth.require_cleaner_profile()?
    } else {
        match query.cleaner_id {
            Some(id) => id,
            None => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "cleaner_id is required"
                })));
            }
        }
    };

    let rows = sqlx::query_as::<_, PhotoFeedback>(
        r#"
        SELECT f.id, f.photo_id, f.manager_id, f.comment, f.created_at
        FROM photo_feedback f
        JOIN cleaner_task_photos p ON p.id = f.photo_id
        WHERE p.cleaner_id = ?
        ORDER BY f.created_at DESC
        LIMIT 200
        "#,
    )
    .bind(cleaner_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Failed to fetch feedback");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}
