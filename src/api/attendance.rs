use actix_web::{HttpResponse, web};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::pagination::PageRequest;
use crate::models::{ApiResponse, AttendanceQuery, NotesReq};
use crate::service::report_aggregator::{DateRange, OWN_HISTORY_PER_PAGE};
use crate::service::{ReportAggregator, SessionTracker};

/// A missing or blank body means no notes. Anything else has to be a valid
/// `NotesReq`.
fn notes_of(body: &web::Bytes) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let req: NotesReq = serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Json deserialize error: {e}")))?;

    Ok(req.notes)
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    request_body(content = NotesReq, description = "Optional notes for the session"),
    responses(
        (status = 201, description = "Clocked in successfully", body = crate::service::session_tracker::ClockInResult),
        (status = 400, description = "Malformed notes body"),
        (status = 409, description = "Already clocked in today", body = Object, example = json!({
            "success": false,
            "message": "You have already clocked in today. Please clock out first."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    sessions: web::Data<SessionTracker>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let result = sessions.clock_in(&auth, notes_of(&body)?).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok("Clocked in successfully", result)))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    request_body(content = NotesReq, description = "Optional notes, replaces the clock-in notes"),
    responses(
        (status = 200, description = "Clocked out successfully", body = crate::service::session_tracker::ClockOutResult),
        (status = 400, description = "Malformed notes body"),
        (status = 404, description = "No active clock-in found for today", body = Object, example = json!({
            "success": false,
            "message": "No active clock-in found for today. Please clock in first."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    sessions: web::Data<SessionTracker>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let result = sessions.clock_out(&auth, notes_of(&body)?).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Clocked out successfully", result)))
}

/// Whether the caller has an open session today
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Current session status", body = crate::service::session_tracker::SessionStatus),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn status(
    auth: AuthUser,
    sessions: web::Data<SessionTracker>,
) -> Result<HttpResponse, AppError> {
    let status = sessions.current_status(&auth).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Current attendance status", status)))
}

/// The caller's own attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/my-attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance history", body = crate::model::pagination::AttendancePage),
        (status = 400, description = "Malformed query"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    reports: web::Data<ReportAggregator>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let range = DateRange {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let page = PageRequest::new(query.page, query.limit, OWN_HISTORY_PER_PAGE);

    let page = reports.user_attendance(&auth, range, page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Attendance history retrieved", page)))
}
