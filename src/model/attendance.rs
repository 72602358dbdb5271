use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::role::Role;

/// `active` means the session is open; clock-out moves it to `completed`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = "2026-01-05T09:00:00Z", value_type = String, format = "date-time")]
    pub clock_in_time: DateTime<Utc>,
    #[schema(example = "2026-01-05T17:30:00Z", value_type = Option<String>, format = "date-time")]
    pub clock_out_time: Option<DateTime<Utc>>,
    #[schema(example = "Client visit in the afternoon", nullable = true)]
    pub notes: Option<String>,
    pub status: AttendanceStatus,
    #[schema(example = 8.5, nullable = true)]
    pub total_hours: Option<f64>,
    #[schema(example = "2026-01-05T17:30:00Z", value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn is_active(&self) -> bool {
        self.status == AttendanceStatus::Active
    }
}

/// A record joined with its owner, as the history and status views return it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub work_date: NaiveDate,
    pub clock_in_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Fields written when an open session is closed.
#[derive(Debug, Clone)]
pub struct ClockOutUpdate {
    pub clock_out_time: DateTime<Utc>,
    /// Replaces the stored notes only when `Some`
    pub notes: Option<String>,
    pub total_hours: f64,
    pub updated_at: DateTime<Utc>,
}

/// Admin override. Omitted fields keep their stored value and `total_hours`
/// is never touched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AttendancePatch {
    #[schema(example = "2026-01-05T08:45:00Z", value_type = Option<String>, format = "date-time")]
    pub clock_in_time: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T17:00:00Z", value_type = Option<String>, format = "date-time")]
    pub clock_out_time: Option<DateTime<Utc>>,
    #[schema(example = "Corrected by HR")]
    pub notes: Option<String>,
    pub status: Option<AttendanceStatus>,
}

impl AttendancePatch {
    /// Applies the patch to a copy of `record`.
    pub fn apply_to(&self, record: &AttendanceRecord, updated_at: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            clock_in_time: self.clock_in_time.unwrap_or(record.clock_in_time),
            clock_out_time: self.clock_out_time.or(record.clock_out_time),
            notes: self.notes.clone().or_else(|| record.notes.clone()),
            status: self.status.unwrap_or(record.status),
            updated_at,
            ..record.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            user_id: 7,
            work_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            clock_in_time: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            clock_out_time: None,
            notes: Some("on site".into()),
            status: AttendanceStatus::Active,
            total_hours: None,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let now = Utc.with_ymd_and_hms(2026, 1, 6, 8, 0, 0).unwrap();
        let patch = AttendancePatch {
            status: Some(AttendanceStatus::Completed),
            ..Default::default()
        };

        let patched = patch.apply_to(&record(), now);

        assert_eq!(patched.status, AttendanceStatus::Completed);
        assert_eq!(patched.notes.as_deref(), Some("on site"));
        assert_eq!(patched.clock_in_time, record().clock_in_time);
        assert_eq!(patched.total_hours, None);
        assert_eq!(patched.updated_at, now);
    }

    #[test]
    fn entry_serializes_flat() {
        let entry = AttendanceEntry {
            record: record(),
            name: "Jane".into(),
            email: "jane@company.com".into(),
            role: Role::User,
        };
        let v = serde_json::to_value(&entry).unwrap();

        assert_eq!(v["id"], 1);
        assert_eq!(v["status"], "active");
        assert_eq!(v["work_date"], "2026-01-05");
        assert_eq!(v["name"], "Jane");
    }
}
