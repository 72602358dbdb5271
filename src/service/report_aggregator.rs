use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::auth::auth::AuthUser;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendancePatch, AttendanceRecord};
use crate::model::pagination::{AttendancePage, PageRequest};
use crate::model::report::{AttendanceReport, ReportRange};
use crate::store::{AttendanceFilter, AttendanceStore, EntryOrder};

/// Page size of a user's own history when `limit` is omitted.
pub const OWN_HISTORY_PER_PAGE: u32 = 10;
/// Page size of the admin roster when `limit` is omitted.
pub const ROSTER_PER_PAGE: u32 = 20;

/// Optional inclusive bounds on work date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    fn filter(self, user_id: Option<u64>) -> AttendanceFilter {
        AttendanceFilter {
            user_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Read side of attendance: paginated histories, the per-user report and the
/// admin correction of a single record.
pub struct ReportAggregator {
    attendance: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
}

impl ReportAggregator {
    pub fn new(attendance: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { attendance, clock }
    }

    async fn page(
        &self,
        filter: AttendanceFilter,
        order: EntryOrder,
        page: PageRequest,
    ) -> AppResult<AttendancePage> {
        let attendance = self.attendance.list_entries(&filter, order, &page).await?;
        let total = self.attendance.count_entries(&filter).await?;

        Ok(AttendancePage {
            attendance,
            pagination: page.pagination(total),
        })
    }

    /// The caller's own records, newest first.
    pub async fn user_attendance(
        &self,
        caller: &AuthUser,
        range: DateRange,
        page: PageRequest,
    ) -> AppResult<AttendancePage> {
        self.page(
            range.filter(Some(caller.user_id)),
            EntryOrder::NewestFirst,
            page,
        )
        .await
    }

    #[instrument(skip(self, caller), fields(caller = caller.user_id))]
    pub async fn all_users_attendance(
        &self,
        caller: &AuthUser,
        range: DateRange,
        user_id: Option<u64>,
        page: PageRequest,
    ) -> AppResult<AttendancePage> {
        caller.require_admin()?;

        self.page(range.filter(user_id), EntryOrder::NewestFirstByName, page)
            .await
    }

    #[instrument(skip(self, caller), fields(caller = caller.user_id))]
    pub async fn generate_report(
        &self,
        caller: &AuthUser,
        range: DateRange,
        user_id: Option<u64>,
    ) -> AppResult<AttendanceReport> {
        caller.require_admin()?;

        let (Some(start_date), Some(end_date)) = (range.start_date, range.end_date) else {
            return Err(AppError::validation(
                "Start date and end date are required for report generation",
            ));
        };
        if start_date > end_date {
            return Err(AppError::validation(
                "Start date must not be after end date",
            ));
        }

        let range = ReportRange {
            start_date,
            end_date,
        };
        let totals = self.attendance.user_totals(&range, user_id).await?;
        debug!(users = totals.len(), "Report totals loaded");

        Ok(AttendanceReport::build(&totals, range))
    }

    /// Admin correction. `total_hours` is left as stored.
    #[instrument(skip(self, caller, patch), fields(caller = caller.user_id))]
    pub async fn update_record(
        &self,
        caller: &AuthUser,
        id: u64,
        mut patch: AttendancePatch,
    ) -> AppResult<AttendanceRecord> {
        caller.require_admin()?;

        patch.notes = patch.notes.filter(|n| !n.trim().is_empty());

        let existing = self
            .attendance
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Attendance record not found"))?;

        let now = self.clock.now();
        let merged = patch.apply_to(&existing, now);
        if merged
            .clock_out_time
            .is_some_and(|out| out < merged.clock_in_time)
        {
            return Err(AppError::validation(
                "Clock-out time cannot be before clock-in time",
            ));
        }

        let updated = self
            .attendance
            .update(id, &patch, now)
            .await?
            .ok_or_else(|| AppError::not_found("Attendance record not found"))?;

        info!(record_id = id, "Attendance record updated");
        Ok(updated)
    }
}
