use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::assist::{AssistEvent, AssistRequest, AssistStatus},
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateAssist {
    #[schema(example = "Ground floor gents")]
    pub location: String,
    #[schema(example = 1)]
    pub customer_id: u64,
    #[schema(example = "supplies")]
    pub issue_type: String,
    #[schema(example = "Paper towels out", nullable = true)]
    pub description: Option<String>,
    #[schema(example = json!(["assist/before1.jpg"]))]
    pub before_photos: Option<Vec<String>>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveAssist {
    #[schema(example = json!(["assist/after1.jpg"]))]
    pub after_photos: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AssistFilter {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct AssistListResponse {
    pub data: Vec<AssistRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Audit-trail insert. Failures are logged and swallowed; losing an event
/// must never fail the transition it records.
pub(crate) async fn record_event(pool: &MySqlPool, request_id: u64, event: &str, actor: &str) {
    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO bathroom_assist_events (request_id, event, actor, created_at)
        VALUES (?, ?, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(request_id)
    .bind(event)
    .bind(actor)
    .execute(pool)
    .await
    {
        error!(error = %e, request_id, event, "Failed to record assist event");
    }
}

/// Looks up the current status and checks the requested transition against
/// the state machine. On success returns the status the row must still hold,
/// which callers bind as the UPDATE's WHERE precondition. Distinguishes a
/// missing row (404) from an illegal transition (409).
async fn check_transition(
    pool: &MySqlPool,
    request_id: u64,
    next: AssistStatus,
) -> actix_web::Result<Result<AssistStatus, HttpResponse>> {
    let Some(prior) = AssistStatus::required_prior(next) else {
        return Ok(Err(HttpResponse::Conflict().json(json!({
            "message": format!("No transition leads to {}", next)
        }))));
    };

    let current = sqlx::query_scalar::<_, String>(
        "SELECT status FROM bathroom_assist_requests WHERE id = ?",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, request_id, "Failed to fetch assist request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(current) = current else {
        return Ok(Err(HttpResponse::NotFound().json(json!({
            "message": "Assist request not found"
        }))));
    };

    let current = AssistStatus::from_str(&current).map_err(|_| {
        error!(request_id, status = %current, "Unrecognized assist status in database");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if current != prior {
        return Ok(Err(HttpResponse::Conflict().json(json!({
            "message": format!("Cannot move a {} request to {}", current, next)
        }))));
    }

    Ok(Ok(prior))
}

/// Raise an assist request
#[utoipa::path(
    post,
    path = "/api/v1/assist",
    request_body = CreateAssist,
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn create_assist(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAssist>,
) -> actix_web::Result<impl Responder> {
    let location = payload.location.trim();
    if location.is_empty() || payload.issue_type.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "location and issue_type must not be empty"
        })));
    }

    let before = serde_json::to_string(payload.before_photos.as_deref().unwrap_or_default())
        .unwrap_or_else(|_| "[]".to_string());

    let result = sqlx::query(
        r#"
        INSERT INTO bathroom_assist_requests
            (location, customer_id, issue_type, description, status,
             before_photos, after_photos, created_at)
        VALUES (?, ?, ?, ?, 'pending', ?, '[]', UTC_TIMESTAMP())
        "#,
    )
    .bind(location)
    .bind(payload.customer_id)
    .bind(payload.issue_type.trim())
    .bind(&payload.description)
    .bind(before)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create assist request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request_id = result.last_insert_id();
    record_event(pool.get_ref(), request_id, "pending", &auth.username).await;

    Ok(HttpResponse::Created().json(json!({
        "id": request_id,
        "status": "pending"
    })))
}

/// Paginated assist request list
#[utoipa::path(
    get,
    path = "/api/v1/assist",
    params(
        ("status", Query, description = "Filter by status"),
        ("page", Query, description = "Page number (1-based)"),
        ("per_page", Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Paginated assist list", body = AssistListResponse),
        (status = 400, description = "Unknown status filter")
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn list_assist(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AssistFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        if AssistStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Unknown status"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM bathroom_assist_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count assist requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, location, customer_id, issue_type, description, status,
               created_at, accepted_at, resolved_at, escalated_at, cancelled_at,
               accepted_by, resolved_by, before_photos, after_photos
        FROM bathroom_assist_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AssistRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch assist list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AssistListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Assist request detail, with photo keys expanded to public URLs
#[utoipa::path(
    get,
    path = "/api/v1/assist/{request_id}",
    params(
        ("request_id", Path, description = "Assist request ID")
    ),
    responses(
        (status = 200, description = "Request detail"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn get_assist(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = sqlx::query_as::<_, AssistRequest>(
        r#"
        SELECT id, location, customer_id, issue_type, description, status,
               created_at, accepted_at, resolved_at, escalated_at, cancelled_at,
               accepted_by, resolved_by, before_photos, after_photos
        FROM bathroom_assist_requests
        WHERE id = ?
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, request_id, "Failed to fetch assist request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(request) = request else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Assist request not found"
        })));
    };

    let base = config.media_base_url.trim_end_matches('/');
    let expand = |raw: &str| -> Vec<String> {
        serde_json::from_str::<Vec<String>>(raw)
            .unwrap_or_default()
            .into_iter()
            .map(|key| format!("{}/{}", base, key))
            .collect()
    };

    let before_urls = expand(&request.before_photos);
    let after_urls = expand(&request.after_photos);

    let mut body = serde_json::to_value(&request).unwrap_or_default();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("before_photo_urls".into(), json!(before_urls));
        obj.insert("after_photo_urls".into(), json!(after_urls));
    }

    Ok(HttpResponse::Ok().json(body))
}

/// Audit trail for one request
#[utoipa::path(
    get,
    path = "/api/v1/assist/{request_id}/events",
    params(
        ("request_id", Path, description = "Assist request ID")
    ),
    responses(
        (status = 200, description = "Event rows", body = [AssistEvent])
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn list_assist_events(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let events = sqlx::query_as::<_, AssistEvent>(
        r#"
        SELECT id, request_id, event, actor, created_at
        FROM bathroom_assist_events
        WHERE request_id = ?
        ORDER BY created_at
        "#,
    )
    .bind(request_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, request_id, "Failed to fetch assist events");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(events))
}

/// Accept a pending request
#[utoipa::path(
    put,
    path = "/api/v1/assist/{request_id}/accept",
    params(
        ("request_id", Path, description = "Assist request ID")
    ),
    responses(
        (status = 200, description = "Request accepted"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn accept_assist(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let next = AssistStatus::Accepted;
    let prior = match check_transition(pool.get_ref(), request_id, next).await? {
        Ok(p) => p,
        Err(resp) => return Ok(resp),
    };

    let result = sqlx::query(
        r#"
        UPDATE bathroom_assist_requests
        SET status = ?, accepted_at = UTC_TIMESTAMP(), accepted_by = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.to_string())
    .bind(&auth.username)
    .bind(request_id)
    .bind(prior.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, request_id, "Accept assist failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        // lost the race with another transition
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Request is no longer pending"
        })));
    }

    record_event(pool.get_ref(), request_id, &next.to_string(), &auth.username).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request accepted"
    })))
}

/// Resolve an accepted request, optionally attaching after-photos
#[utoipa::path(
    put,
    path = "/api/v1/assist/{request_id}/resolve",
    params(
        ("request_id", Path, description = "Assist request ID")
    ),
    request_body = ResolveAssist,
    responses(
        (status = 200, description = "Request resolved"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not accepted")
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn resolve_assist(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ResolveAssist>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let next = AssistStatus::Resolved;
    let prior = match check_transition(pool.get_ref(), request_id, next).await? {
        Ok(p) => p,
        Err(resp) => return Ok(resp),
    };

    let after = serde_json::to_string(payload.after_photos.as_deref().unwrap_or_default())
        .unwrap_or_else(|_| "[]".to_string());

    let result = sqlx::query(
        r#"
        UPDATE bathroom_assist_requests
        SET status = ?, resolved_at = UTC_TIMESTAMP(), resolved_by = ?,
            after_photos = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.to_string())
    .bind(&auth.username)
    .bind(after)
    .bind(request_id)
    .bind(prior.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, request_id, "Resolve assist failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Request is not in accepted state"
        })));
    }

    record_event(pool.get_ref(), request_id, &next.to_string(), &auth.username).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request resolved"
    })))
}

/// Cancel a pending request
#[utoipa::path(
    put,
    path = "/api/v1/assist/{request_id}/cancel",
    params(
        ("request_id", Path, description = "Assist request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Assist"
)]
pub async fn cancel_assist(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let next = AssistStatus::Cancelled;
    let prior = match check_transition(pool.get_ref(), request_id, next).await? {
        Ok(p) => p,
        Err(resp) => return Ok(resp),
    };

    let result = sqlx::query(
        r#"
        UPDATE bathroom_assist_requests
        SET status = ?, cancelled_at = UTC_TIMESTAMP()
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.to_string())
    .bind(request_id)
    .bind(prior.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, request_id, "Cancel assist failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Request is no longer pending"
        })));
    }

    record_event(pool.get_ref(), request_id, &next.to_string(), &auth.username).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request cancelled"
    })))
}
