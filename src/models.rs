use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::role::Role;

/// `{ success, message, data? }`, the envelope of every response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    /// `admin` or `user`, defaults to `user`
    #[schema(example = "user")]
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateUserReq {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Optional body of clock-in / clock-out.
#[derive(Deserialize, Default, ToSchema)]
pub struct NotesReq {
    #[schema(example = "Working from the Dhaka office")]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Inclusive lower bound on work date
    #[schema(example = "2026-01-01", value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on work date
    #[schema(example = "2026-01-31", value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    /// Target user, admin views only
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    /// Page number, starts with 1
    #[schema(example = 1)]
    pub page: Option<i64>,
    /// Records per page, at most 100
    #[schema(example = 10)]
    pub limit: Option<i64>,
}

#[derive(Deserialize, IntoParams, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    #[schema(example = "2026-01-01", value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-31", value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = 7)]
    pub user_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: u64,
    /// email of the account
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
