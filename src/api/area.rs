use crate::{
    auth::auth::AuthUser,
    model::area::{Area, AreaTask},
    utils::{db_utils, qr_filter},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateArea {
    #[schema(example = 1)]
    pub customer_id: u64,
    #[schema(example = "3rd Floor Kitchen")]
    pub name: String,
    #[schema(example = "QR-0012", nullable = true)]
    pub qr_code: Option<String>,
    #[schema(example = 3)]
    pub sort_order: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAreaTask {
    #[schema(example = "Wipe down worktops")]
    pub description: String,
    #[schema(example = "daily", nullable = true)]
    pub task_type: Option<String>,
    #[schema(example = 1)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    pub customer_id: Option<u64>,
}

/// QR codes are stored trimmed and uppercased; an empty string clears the
/// code. Applied to update payloads so stored codes always match what scan
/// lookups search for.
fn normalize_qr_patch(payload: &mut Value) {
    if let Some(raw) = payload.get("qr_code").and_then(Value::as_str) {
        let code = raw.trim().to_uppercase();
        payload["qr_code"] = if code.is_empty() {
            Value::Null
        } else {
            Value::String(code)
        };
    }
}

/// Create Area. A QR code, when present, is registered with the in-process
/// filter so scans can be validated without touching the database.
#[utoipa::path(
    post,
    path = "/api/v1/areas",
    request_body = CreateArea,
    responses(
        (status = 201, description = "Area created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "QR code already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn create_area(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateArea>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Area name must not be empty"
        })));
    }

    let qr_code = payload
        .qr_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase);

    let result = sqlx::query(
        r#"
        INSERT INTO areas (customer_id, name, qr_code, sort_order)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.customer_id)
    .bind(name)
    .bind(&qr_code)
    .bind(payload.sort_order.unwrap_or(0))
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            if let Some(code) = &qr_code {
                qr_filter::insert(code);
            }
            Ok(HttpResponse::Created().json(json!({
                "id": res.last_insert_id(),
                "message": "Area created"
            })))
        }
        Err(e) if db_utils::is_duplicate_key(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "QR code already in use"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create area");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// List areas, optionally filtered to one customer
#[utoipa::path(
    get,
    path = "/api/v1/areas",
    params(
        ("customer_id", Query, description = "Filter by customer")
    ),
    responses(
        (status = 200, description = "Area list", body = [Area])
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn list_areas(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AreaQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let areas = match query.customer_id {
        Some(customer_id) => {
            sqlx::query_as::<_, Area>(
                r#"
                SELECT id, customer_id, name, qr_code, is_active, sort_order
                FROM areas
                WHERE customer_id = ?
                ORDER BY sort_order, name
                "#,
            )
            .bind(customer_id)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Area>(
                r#"
                SELECT id, customer_id, name, qr_code, is_active, sort_order
                FROM areas
                ORDER BY customer_id, sort_order, name
                "#,
            )
            .fetch_all(pool.get_ref())
            .await
        }
    }
    .map_err(|e| {
        error!(error = %e, "Failed to fetch areas");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(areas))
}

/// Update Area
#[utoipa::path(
    put,
    path = "/api/v1/areas/{area_id}",
    params(
        ("area_id", Path, description = "Area ID")
    ),
    responses(
        (status = 200, description = "Area updated"),
        (status = 404, description = "Area not found"),
        (status = 409, description = "QR code already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn update_area(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let area_id = path.into_inner();

    let mut payload = body.into_inner();
    normalize_qr_patch(&mut payload);

    let update = db_utils::build_update_sql(
        "areas",
        &payload,
        &["name", "qr_code", "is_active", "sort_order"],
        "id",
        area_id,
    )?;

    let affected = match db_utils::execute_update(pool.get_ref(), update).await {
        Ok(n) => n,
        Err(e) if db_utils::is_duplicate_key(&e) => {
            return Ok(HttpResponse::Conflict().json(json!({
                "message": "QR code already in use"
            })));
        }
        Err(e) => {
            error!(error = %e, area_id, "Failed to update area");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Area not found"
        })));
    }

    if let Some(code) = payload.get("qr_code").and_then(Value::as_str) {
        qr_filter::insert(code);
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Area updated"
    })))
}

/// Deactivate Area (rows are kept for history; the QR code is retired)
#[utoipa::path(
    delete,
    path = "/api/v1/areas/{area_id}",
    params(
        ("area_id", Path, description = "Area ID")
    ),
    responses(
        (status = 200, description = "Area deactivated"),
        (status = 404, description = "Area not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn delete_area(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let area_id = path.into_inner();

    let qr_code = sqlx::query_scalar::<_, Option<String>>(
        "SELECT qr_code FROM areas WHERE id = ?",
    )
    .bind(area_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, area_id, "Failed to fetch area");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(qr_code) = qr_code else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Area not found"
        })));
    };

    sqlx::query("UPDATE areas SET is_active = FALSE WHERE id = ?")
        .bind(area_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, area_id, "Failed to deactivate area");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if let Some(code) = qr_code {
        qr_filter::remove(&code);
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Area deactivated"
    })))
}

/// Add a task to an area
#[utoipa::path(
    post,
    path = "/api/v1/areas/{area_id}/tasks",
    params(
        ("area_id", Path, description = "Area ID")
    ),
    request_body = CreateAreaTask,
    responses(
        (status = 201, description = "Task created"),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn create_area_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CreateAreaTask>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let area_id = path.into_inner();

    let description = payload.description.trim();
    if description.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Task description must not be empty"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO area_tasks (area_id, description, task_type, sort_order)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(area_id)
    .bind(description)
    .bind(&payload.task_type)
    .bind(payload.sort_order.unwrap_or(0))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, area_id, "Failed to create area task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_id(),
        "message": "Task created"
    })))
}

/// List an area's tasks
#[utoipa::path(
    get,
    path = "/api/v1/areas/{area_id}/tasks",
    params(
        ("area_id", Path, description = "Area ID")
    ),
    responses(
        (status = 200, description = "Task list", body = [AreaTask])
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn list_area_tasks(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let area_id = path.into_inner();

    let tasks = sqlx::query_as::<_, AreaTask>(
        r#"
        SELECT id, area_id, description, task_type, is_active, sort_order
        FROM area_tasks
        WHERE area_id = ? AND is_active = TRUE
        ORDER BY sort_order, id
        "#,
    )
    .bind(area_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, area_id, "Failed to fetch area tasks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}",
    params(
        ("task_id", Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task updated"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn update_area_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let task_id = path.into_inner();

    let update = db_utils::build_update_sql(
        "area_tasks",
        &body,
        &["description", "task_type", "is_active", "sort_order"],
        "id",
        task_id,
    )?;

    let affected = db_utils::execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            error!(error = %e, task_id, "Failed to update task");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Task not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated"
    })))
}

/// Deactivate a task
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{task_id}",
    params(
        ("task_id", Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deactivated"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Area"
)]
pub async fn delete_area_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let task_id = path.into_inner();

    let result = sqlx::query("UPDATE area_tasks SET is_active = FALSE WHERE id = ?")
        .bind(task_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, task_id, "Failed to deactivate task");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Task not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task deactivated"
    })))
}

#[cfg(test)]
mod tests {
    use super::normalize_qr_patch;
    use serde_json::json;

    #[test]
    fn qr_patch_is_trimmed_and_uppercased() {
        let mut payload = json!({"qr_code": " qr-77x "});
        normalize_qr_patch(&mut payload);
        assert_eq!(payload["qr_code"], json!("QR-77X"));
    }

    #[test]
    fn empty_qr_patch_clears_the_code() {
        let mut payload = json!({"qr_code": "   "});
        normalize_qr_patch(&mut payload);
        assert!(payload["qr_code"].is_null());
    }

    #[test]
    fn payload_without_qr_code_is_untouched() {
        let mut payload = json!({"name": "Lobby", "sort_order": 2});
        normalize_qr_patch(&mut payload);
        assert_eq!(payload, json!({"name": "Lobby", "sort_order": 2}));
    }
}
