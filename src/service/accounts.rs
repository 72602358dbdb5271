//! Registration, login and profile maintenance.
//!
//! Email availability goes through three tiers: the cuckoo filter answers
//! "definitely free", the moka cache answers "recently seen taken", and the
//! user store settles the rest.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserPatch, UserSummary};
use crate::models::{RegisterReq, UpdateUserReq};
use crate::store::UserStore;
use crate::utils::email_cache::EmailCache;
use crate::utils::email_filter::{EmailFilter, normalize};

const WARMUP_BATCH_SIZE: usize = 1_000;
const WARMUP_RECENT_DAYS: u32 = 30;

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentity {
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "jane@company.com")]
    pub email: String,
    pub role: Role,
}

impl From<&AuthUser> for TokenIdentity {
    fn from(caller: &AuthUser) -> Self {
        TokenIdentity {
            user_id: caller.user_id,
            email: caller.email.clone(),
            role: caller.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssuedToken {
    pub token: String,
}

fn parse_role(role: &str) -> AppResult<Role> {
    Role::from_str(role.trim()).map_err(|_| AppError::validation(format!("Unknown role '{role}'")))
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct Accounts {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    filter: EmailFilter,
    cache: EmailCache,
    jwt_secret: String,
    token_ttl: usize,
}

impl Accounts {
    pub fn new(
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        jwt_secret: impl Into<String>,
        token_ttl: usize,
    ) -> Self {
        Self {
            users,
            clock,
            filter: EmailFilter::default(),
            cache: EmailCache::default(),
            jwt_secret: jwt_secret.into(),
            token_ttl,
        }
    }

    /// Fills the email filter and cache from the user store. Failures are
    /// logged; the store fallback keeps availability checks correct anyway.
    pub async fn warmup(&self) {
        if let Err(e) = self.filter.warmup(self.users.as_ref(), WARMUP_BATCH_SIZE).await {
            warn!(error = %e, "Email filter warmup failed");
        }

        if let Err(e) = self
            .cache
            .warmup(self.users.as_ref(), WARMUP_RECENT_DAYS, WARMUP_BATCH_SIZE)
            .await
        {
            warn!(error = %e, "Email cache warmup failed");
        }
    }

    /// true  => email AVAILABLE
    /// false => email TAKEN
    pub async fn is_email_available(&self, email: &str) -> AppResult<bool> {
        let email = normalize(email);

        if !self.filter.might_exist(&email) {
            return Ok(true);
        }

        if self.cache.is_taken(&email).await {
            return Ok(false);
        }

        let taken = self.users.find_by_email(&email).await?.is_some();
        if taken {
            self.cache.mark_taken(&email).await;
        }

        Ok(!taken)
    }

    async fn remember(&self, email: &str) {
        self.filter.insert(email);
        self.cache.mark_taken(email).await;
    }

    async fn forget(&self, email: &str) {
        self.filter.remove(email);
        self.cache.forget(email).await;
    }

    #[instrument(name = "auth_register", skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterReq) -> AppResult<UserSummary> {
        let name = req.name.trim().to_string();
        let email = normalize(&req.email);

        if name.is_empty() || email.is_empty() || req.password.is_empty() {
            return Err(AppError::validation(
                "Name, email and password must not be empty",
            ));
        }

        let role = match req.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(role) => parse_role(role)?,
        };

        if !self.is_email_available(&email).await? {
            info!("Registration rejected: email taken");
            return Err(AppError::conflict("User already exists"));
        }

        let user = self
            .users
            .insert(NewUser {
                name,
                email,
                password: hash_password(&req.password)?,
                role,
            })
            .await?;

        self.remember(&user.email).await;
        info!(user_id = user.id, role = %user.role, "User registered");

        Ok(UserSummary::from(&user))
    }

    #[instrument(name = "auth_login", skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResult> {
        let email = normalize(email);

        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            info!("Invalid credentials: user not found");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password) {
            info!(user_id = user.id, "Invalid credentials: password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.token_for(&user)?;

        // not fatal for the login itself
        if let Err(e) = self.users.record_login(user.id, self.clock.now()).await {
            warn!(error = %e, "Failed to update last_login_at");
        }

        info!(user_id = user.id, "Login successful");

        Ok(LoginResult {
            token,
            user: UserSummary::from(&user),
        })
    }

    fn token_for(&self, user: &User) -> AppResult<String> {
        debug!(user_id = user.id, "Generating access token");

        generate_access_token(
            user.id,
            user.email.clone(),
            user.role,
            &self.jwt_secret,
            self.token_ttl,
        )
        .map(|(token, _)| token)
        .map_err(|e| AppError::internal(format!("token generation failed: {e}")))
    }

    /// Identity carried by an already validated token.
    pub fn verify(&self, caller: &AuthUser) -> TokenIdentity {
        TokenIdentity::from(caller)
    }

    /// Fresh token for the caller, with the role as currently stored.
    pub async fn issue_token(&self, caller: &AuthUser) -> AppResult<IssuedToken> {
        let user = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or_else(|| AppError::unauthenticated("User no longer exists"))?;

        Ok(IssuedToken {
            token: self.token_for(&user)?,
        })
    }

    #[instrument(skip(self, caller, req), fields(caller = caller.user_id))]
    pub async fn update_user(
        &self,
        caller: &AuthUser,
        id: u64,
        req: UpdateUserReq,
    ) -> AppResult<UserSummary> {
        if caller.user_id != id && !caller.is_admin() {
            return Err(AppError::forbidden(
                "Forbidden: You can only update your own account",
            ));
        }

        let role = match present(req.role) {
            Some(role) => {
                caller.require_admin()?;
                Some(parse_role(&role)?)
            }
            None => None,
        };

        let existing = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let email = present(req.email)
            .map(|e| normalize(&e))
            .filter(|e| *e != existing.email);
        if let Some(email) = &email {
            if !self.is_email_available(email).await? {
                return Err(AppError::conflict("User already exists"));
            }
        }

        let password = match present(req.password) {
            Some(p) => Some(hash_password(&p)?),
            None => None,
        };

        let patch = UserPatch {
            name: present(req.name),
            email: email.clone(),
            password,
            role,
        };

        let updated = self
            .users
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if email.is_some() {
            self.forget(&existing.email).await;
            self.remember(&updated.email).await;
        }

        info!(user_id = id, "User updated");
        Ok(UserSummary::from(&updated))
    }

    pub async fn list_users(&self, caller: &AuthUser) -> AppResult<Vec<UserSummary>> {
        caller.require_admin()?;

        let users = self.users.list().await?;
        Ok(users.iter().map(UserSummary::from).collect())
    }
}
