//! Clock-in / clock-out lifecycle of a user's work session.
//!
//! A user holds at most one `active` record per work date. The check is done
//! here for the common case, but the store enforces it too, so two racing
//! clock-ins resolve to exactly one record and one `already clocked in`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, ClockOutUpdate, NewAttendance};
use crate::model::user::UserProfile;
use crate::store::{AttendanceStore, UserStore};
use crate::utils::hours::hours_between;

const NO_ACTIVE_SESSION: &str = "No active clock-in found for today. Please clock in first.";

#[derive(Debug, Serialize, ToSchema)]
pub struct ClockInResult {
    pub attendance: AttendanceRecord,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClockOutResult {
    pub attendance: AttendanceRecord,
    #[schema(example = 8.5)]
    pub total_hours: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_active: bool,
    pub attendance: Option<AttendanceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 2.25)]
    pub current_hours_worked: Option<f64>,
}

fn non_empty(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

pub struct SessionTracker {
    attendance: Arc<dyn AttendanceStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl SessionTracker {
    pub fn new(
        attendance: Arc<dyn AttendanceStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            attendance,
            users,
            clock,
        }
    }

    #[instrument(name = "clock_in", skip(self, caller, notes), fields(user_id = caller.user_id))]
    pub async fn clock_in(
        &self,
        caller: &AuthUser,
        notes: Option<String>,
    ) -> AppResult<ClockInResult> {
        let now = self.clock.now();
        let today = now.date_naive();

        if let Some(existing) = self.attendance.find_active(caller.user_id, today).await? {
            info!(record_id = existing.id, "Clock-in rejected: session already open");
            return Err(AppError::already_clocked_in(Some(existing)));
        }

        let user = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let new = NewAttendance {
            user_id: caller.user_id,
            work_date: today,
            clock_in_time: now,
            notes: non_empty(notes),
        };

        let record = match self.attendance.insert(new).await {
            Ok(record) => record,
            // lost the race against a concurrent clock-in
            Err(e) if e.is_conflict() => {
                let winner = self.attendance.find_active(caller.user_id, today).await?;
                info!("Clock-in rejected: concurrent session won");
                return Err(AppError::already_clocked_in(winner));
            }
            Err(e) => return Err(e),
        };

        info!(record_id = record.id, work_date = %record.work_date, "Clocked in");

        Ok(ClockInResult {
            attendance: record,
            user: UserProfile::from(&user),
        })
    }

    #[instrument(name = "clock_out", skip(self, caller, notes), fields(user_id = caller.user_id))]
    pub async fn clock_out(
        &self,
        caller: &AuthUser,
        notes: Option<String>,
    ) -> AppResult<ClockOutResult> {
        let now = self.clock.now();

        let active = self
            .attendance
            .find_active(caller.user_id, now.date_naive())
            .await?
            .ok_or_else(|| AppError::not_found(NO_ACTIVE_SESSION))?;

        // clock_out_time never precedes clock_in_time
        let clock_out_time = now.max(active.clock_in_time);
        let total_hours = hours_between(active.clock_in_time, clock_out_time);

        let update = ClockOutUpdate {
            clock_out_time,
            notes: non_empty(notes),
            total_hours,
            updated_at: now,
        };

        let closed = self
            .attendance
            .close(active.id, update)
            .await?
            .ok_or_else(|| AppError::not_found(NO_ACTIVE_SESSION))?;

        info!(record_id = closed.id, total_hours, "Clocked out");

        Ok(ClockOutResult {
            attendance: closed,
            total_hours,
        })
    }

    pub async fn current_status(&self, caller: &AuthUser) -> AppResult<SessionStatus> {
        let now = self.clock.now();

        let Some(record) = self
            .attendance
            .find_active(caller.user_id, now.date_naive())
            .await?
        else {
            return Ok(SessionStatus {
                is_active: false,
                attendance: None,
                current_hours_worked: None,
            });
        };

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let current_hours_worked = hours_between(record.clock_in_time, now.max(record.clock_in_time));

        Ok(SessionStatus {
            is_active: true,
            attendance: Some(AttendanceEntry {
                record,
                name: user.name,
                email: user.email,
                role: user.role,
            }),
            current_hours_worked: Some(current_hours_worked),
        })
    }
}
