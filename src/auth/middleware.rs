use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use crate::auth::auth::authenticate;
use crate::config::Config;
use crate::error::AppError;

/// Rejects requests without a valid bearer token and stores the resolved
/// `AuthUser` in the request extensions for the handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(config) = req.app_data::<Data<Config>>() else {
        let resp = AppError::internal("Config missing from app data").error_response();
        return Ok(req.into_response(resp.map_into_boxed_body()));
    };

    match authenticate(req.headers(), &config.jwt_secret) {
        Ok(auth_user) => {
            tracing::debug!(user_id = auth_user.user_id, "Request authenticated");
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(e) => {
            let resp = e.error_response();
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
