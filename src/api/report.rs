use actix_web::{HttpResponse, web};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::attendance::AttendancePatch;
use crate::model::pagination::PageRequest;
use crate::models::{ApiResponse, AttendanceQuery, ReportQuery};
use crate::service::ReportAggregator;
use crate::service::report_aggregator::{DateRange, ROSTER_PER_PAGE};

/// All users' attendance (admin only)
#[utoipa::path(
    get,
    path = "/api/attendance/all-users",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance of every user", body = crate::model::pagination::AttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn all_users(
    auth: AuthUser,
    reports: web::Data<ReportAggregator>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let range = DateRange {
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let page = PageRequest::new(query.page, query.limit, ROSTER_PER_PAGE);

    let page = reports
        .all_users_attendance(&auth, range, query.user_id, page)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("All users attendance retrieved", page)))
}

/// Per-user totals over a date range (admin only)
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Attendance report", body = crate::model::report::AttendanceReport),
        (status = 400, description = "Missing or inverted date range", body = Object, example = json!({
            "success": false,
            "message": "Start date and end date are required for report generation"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn report(
    auth: AuthUser,
    reports: web::Data<ReportAggregator>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let range = DateRange {
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let report = reports.generate_report(&auth, range, query.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Attendance report generated", report)))
}

/// Correct a single attendance record (admin only)
#[utoipa::path(
    put,
    path = "/api/attendance/update/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    request_body = AttendancePatch,
    responses(
        (status = 200, description = "Attendance record updated", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Clock-out before clock-in"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found"),
        (status = 409, description = "Record would duplicate an active session"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn update_record(
    auth: AuthUser,
    reports: web::Data<ReportAggregator>,
    path: web::Path<u64>,
    patch: web::Json<AttendancePatch>,
) -> Result<HttpResponse, AppError> {
    let record = reports
        .update_record(&auth, path.into_inner(), patch.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Attendance record updated successfully", record)))
}
