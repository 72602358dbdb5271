use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, http::header::HeaderMap, web::Data,
};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::models::Claims;

/// The authenticated caller, as decoded from a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::unauthenticated("Access token required"))?
        .to_str()
        .map_err(|_| AppError::unauthenticated("Invalid Authorization header encoding"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthenticated("Authorization header must start with Bearer"))
}

/// Resolves the caller from the `Authorization: Bearer <token>` header.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> AppResult<AuthUser> {
    let token = bearer_token(headers)?;

    verify_token(token, secret)
        .map(AuthUser::from)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AppError::unauthenticated("Invalid or expired token")
        })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already resolved by the auth middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::internal("Config missing from app data")));
        };

        ready(authenticate(req.headers(), &config.jwt_secret))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admin satisfies every role requirement.
    pub fn require(&self, role: Role) -> AppResult<()> {
        match role {
            Role::User => Ok(()),
            Role::Admin if self.is_admin() => Ok(()),
            Role::Admin => Err(AppError::forbidden("Forbidden: Admin access required")),
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        self.require(Role::Admin)
    }
}
