use crate::{auth::auth::AuthUser, model::customer::Customer, utils::db_utils};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateCustomer {
    #[schema(example = "Riverside Business Park")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub include_deleted: Option<bool>,
}

/// Create Customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomer,
    responses(
        (status = 201, description = "Customer created"),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn create_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCustomer>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Customer name must not be empty"
        })));
    }

    let result = sqlx::query("INSERT INTO customers (name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create customer");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "id": result.last_insert_id(),
        "message": "Customer created"
    })))
}

/// List customers, hiding soft-deleted rows unless asked for them
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(
        ("include_deleted", Query, description = "Also return soft-deleted customers")
    ),
    responses(
        (status = 200, description = "Customer list", body = [Customer]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn list_customers(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CustomerQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let sql = if query.include_deleted.unwrap_or(false) {
        "SELECT id, name, is_deleted FROM customers ORDER BY name"
    } else {
        "SELECT id, name, is_deleted FROM customers WHERE is_deleted = FALSE ORDER BY name"
    };

    let customers = sqlx::query_as::<_, Customer>(sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch customers");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(customers))
}

/// Get Customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}",
    params(
        ("customer_id", Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer found", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn get_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let customer_id = path.into_inner();

    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, is_deleted FROM customers WHERE id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, customer_id, "Failed to fetch customer");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match customer {
        Some(c) => Ok(HttpResponse::Ok().json(c)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Customer not found"
        }))),
    }
}

/// Update Customer
#[utoipa::path(
    put,
    path = "/api/v1/customers/{customer_id}",
    params(
        ("customer_id", Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer updated"),
        (status = 404, description = "Customer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn update_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let customer_id = path.into_inner();

    let update = db_utils::build_update_sql("customers", &body, &["name"], "id", customer_id)?;

    let affected = db_utils::execute_update(pool.get_ref(), update)
        .await
        .map_err(|e| {
            error!(error = %e, customer_id, "Failed to update customer");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Customer not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Customer updated"
    })))
}

/// Soft-delete Customer. The row stays; it just disappears from listings.
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{customer_id}",
    params(
        ("customer_id", Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer soft-deleted"),
        (status = 404, description = "Customer not found or already deleted")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn delete_customer(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let customer_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE customers SET is_deleted = TRUE WHERE id = ? AND is_deleted = FALSE",
    )
    .bind(customer_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, customer_id, "Failed to soft-delete customer");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Customer not found or already deleted"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Customer deleted"
    })))
}
