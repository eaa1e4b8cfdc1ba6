use crate::{auth::auth::AuthUser, model::cleaner::Cleaner, utils::db_utils};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateCleaner {
    #[schema(example = "Maria Kovacs")]
    pub name: String,
    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "maria@example.com", nullable = true)]
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RosterAssignment {
    #[schema(example = 7)]
    pub cleaner_id: u64,
}

/// The roster: cleaners visible to a manager via the mapping table, or
/// everyone for admins. Deactivated cleaners stay in scope; filtering them
/// out here would silently drop their historical attendance and photos from
/// every range query that scopes through the roster.
pub async fn roster_cleaner_ids(
    pool: &MySqlPool,
    auth: &AuthUser,
) -> Result<Vec<u64>, sqlx::Error> {
    if auth.role == crate::model::role::Role::Admin {
        let rows = sqlx::query_as::<_, (u64,)>("SELECT id FROM cleaners")
            .fetch_all(pool)
            .await?;
        return Ok(rows.into_iter().map(|(id,)| id).collect());
    }

    let rows = sqlx::query_as::<_, (u64,)>(
        "SELECT cleaner_id FROM manager_cleaners WHERE manager_id = ?",
    )
    .bind(auth.user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Create Cleaner
#[utoipa::path(
    post,
    path = "/api/v1/cleaners",
    request_body = CreateCleaner,
    responses(
        (status = 201, description = "Cleaner created"),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Cleaner"
)]
pub async fn create_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCleaner>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Cleaner name must not be empty"
        })));
    }

    let result = sqlx::query("INSERT INTO cleaners (name, phone, email) VALUES (?, ?, ?)")
        .bind(name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create cleaner");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_id(),
        "message": "Cleaner created"
    })))
}

/// List all cleaners (admin)
#[utoipa::path(
    get,
    path = "/api/v1/cleaners",
    responses(
        (status = 200, description = "Cleaner list", body = [Cleaner])
    ),
    security(("bearer_auth" = [])),
    tag = "Cleaner"
)]
pub async fn list_cleaners(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let cleaners = sqlx::query_as::<_, Cleaner>(
        "SELECT id, name, phone, email, is_active FROM cleaners ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch cleaners");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(cleaners))
}

/// The calling manager's roster
#[utoipa::path(
    get,
    path = "/api/v1/cleaners/roster",
    responses(
        (status = 200, description = "Roster cleaners", body = [Cleaner])
    ),
    security(("bearer_auth" = [])),
    tag = "Cleaner"
)]
pub async fn get_roster(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let cleaners = sqlx::query_as::<_, Cleaner>(
        r#"
        SELECT c.id, c.name, c.phone, c.email, c.is_active
        FROM cleaners c
        JOIN manager_cleaners mc ON mc.cleaner_id = c.id
        WHERE mc.manager_id = ?
        ORDER BY c.name
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch roster");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(cleaners))
}

/// Assign a cleaner to the calling manager's roster
#[utoipa::path(
    post,
    path = "/api/v1/cleaners/roster",
    request_body = RosterAssignment,
    responses(
        (status = 201, description = "Cleaner added to roster"),
        (status = 409, description = "Already on roster")
    ),
    security(("bearer_auth" = [])),
    tag = "Cleaner"
)]
pub async fn add_to_roster(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RosterAssignment>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let result = sqlx::query("INSERT INTO manager_cleaners (manager_id, cleaner_id) VALUES (?, ?)")
        .bind(auth.user_id)
        .bind(payload.cleaner_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Cleaner added to roster"
        }))),
        Err(e) if db_utils::is_duplicate_key(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Cleaner already on roster"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to add cleaner to roster");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Update Cleaner
#[utoipa::path(
    put,
    path = "/api/v1/cleaners/{cleaner_id}",
    params(
        ("cleaner_id", Path, description = "Cleaner ID")
    ),
    responses(
        (status = 200, description = "Cleaner updated"),
        (status = 404, description = "Cleaner not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cleaner"
)]
pub async fn update_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let cleaner_id = path.into_inner();

    let update = db_utils::build_update_sql(
        "cleaners",
        &body,
        &["name", "phone", "email", "is_active"],
        "id",
        cleaner_id,
    )?;

    let affected = db_utils::execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            error!(error = %e, cleaner_id, "Failed to update cleaner");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Cleaner not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Cleaner updated"
    })))
}
