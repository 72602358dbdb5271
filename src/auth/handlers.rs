use actix_web::{HttpResponse, web};
use tracing::instrument;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::models::{ApiResponse, LoginReq, RegisterReq, UpdateUserReq};
use crate::service::Accounts;

/// User registration handler
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = crate::model::user::UserSummary),
        (status = 400, description = "Missing fields or unknown role"),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "success": false,
            "message": "User already exists"
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
pub async fn register(
    accounts: web::Data<Accounts>,
    req: web::Json<RegisterReq>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.register(req.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok("User registered successfully", user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful", body = crate::service::accounts::LoginResult),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "login_request", skip(accounts, req))]
pub async fn login(
    accounts: web::Data<Accounts>,
    req: web::Json<LoginReq>,
) -> Result<HttpResponse, AppError> {
    let result = accounts.login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Login successful", result)))
}

/// Echoes the identity carried by the bearer token
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = crate::service::accounts::TokenIdentity),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn verify(
    auth: AuthUser,
    accounts: web::Data<Accounts>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Token is valid", accounts.verify(&auth))))
}

/// Issues a fresh access token for the caller
#[utoipa::path(
    post,
    path = "/api/auth/generate-token",
    responses(
        (status = 200, description = "New token issued", body = crate::service::accounts::IssuedToken),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn generate_token(
    auth: AuthUser,
    accounts: web::Data<Accounts>,
) -> Result<HttpResponse, AppError> {
    let token = accounts.issue_token(&auth).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Token generated successfully", token)))
}

#[utoipa::path(
    post,
    path = "/api/auth/update/{id}",
    params(
        ("id" = u64, Path, description = "User id")
    ),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "User updated", body = crate::model::user::UserSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your account, or role change by non-admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn update_user(
    auth: AuthUser,
    accounts: web::Data<Accounts>,
    path: web::Path<u64>,
    req: web::Json<UpdateUserReq>,
) -> Result<HttpResponse, AppError> {
    let user = accounts
        .update_user(&auth, path.into_inner(), req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("User updated successfully", user)))
}

/// Every registered user (admin only)
#[utoipa::path(
    get,
    path = "/api/auth/usersdetails",
    responses(
        (status = 200, description = "All users", body = [crate::model::user::UserSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn list_users(
    auth: AuthUser,
    accounts: web::Data<Accounts>,
) -> Result<HttpResponse, AppError> {
    let users = accounts.list_users(&auth).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Users retrieved", users)))
}
