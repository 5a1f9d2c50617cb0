//! User CRUD handlers.
//!
//! ```text
//! POST   /api/users          (optional Idempotency-Key header)
//! GET    /api/users
//! GET    /api/users/{id}
//! PUT    /api/users/{id}
//! DELETE /api/users/{id}
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CreateUserRequest, Error, UpdateUserRequest, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::extract_idempotency_key;
use crate::inbound::http::state::HttpState;

/// Response body for `GET /api/users`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: usize,
}

impl From<Vec<User>> for UserListResponse {
    fn from(users: Vec<User>) -> Self {
        Self {
            total: users.len(),
            users,
        }
    }
}

/// Response body for `DELETE /api/users/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteUserResponse {
    #[schema(example = "user deleted")]
    pub message: String,
}

// Path ids are opaque strings; one that can never name a user is simply
// absent.
fn parse_user_id(raw: String) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| Error::not_found("user not found"))
}

/// Create a user.
///
/// Retrying with the same `Idempotency-Key` returns the first result.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Deduplicates retried creates")
    ),
    responses(
        (status = 201, description = "User created (or replayed)", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 422, description = "Same key already in progress", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let key = extract_idempotency_key(request.headers())?;
    let user = state
        .users_command
        .create_user(key, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(user))
}

/// Fetch one user.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let id = parse_user_id(path.into_inner())?;
    let user = state.users_query.get_user(&id).await?;
    Ok(web::Json(user))
}

/// List all users, newest first.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<UserListResponse>> {
    let users = state.users_query.list_users().await?;
    Ok(web::Json(users.into()))
}

/// Update the supplied fields of a user.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<User>> {
    let id = parse_user_id(path.into_inner())?;
    let user = state
        .users_command
        .update_user(&id, payload.into_inner())
        .await?;
    Ok(web::Json(user))
}

/// Delete a user.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User deleted", body = DeleteUserResponse),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeleteUserResponse>> {
    let id = parse_user_id(path.into_inner())?;
    state.users_command.delete_user(&id).await?;
    Ok(web::Json(DeleteUserResponse {
        message: "user deleted".to_owned(),
    }))
}

/// Register every user handler on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_user)
        .service(list_users)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}

#[cfg(test)]
mod tests;
