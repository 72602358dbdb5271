use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::User;
use crate::utils::hours::{format_hours, round2};

/// Raw per-user aggregate over a report range, as the store computes it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserTotals {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub total_days_worked: u64,
    pub total_hours_worked: f64,
    /// Mean of the records that have total hours, 0 when none do
    pub average_hours_per_day: f64,
    pub incomplete_days: u64,
}

impl UserTotals {
    /// Left-join semantics: a user with no records still yields a zero row.
    pub fn from_records<'a>(
        user: &User,
        records: impl IntoIterator<Item = &'a AttendanceRecord>,
    ) -> Self {
        let mut days = 0u64;
        let mut incomplete = 0u64;
        let mut sum = 0.0;
        let mut closed = 0u64;

        for record in records {
            days += 1;
            if record.is_active() {
                incomplete += 1;
            }
            if let Some(hours) = record.total_hours {
                sum += hours;
                closed += 1;
            }
        }

        UserTotals {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            total_days_worked: days,
            total_hours_worked: sum,
            average_hours_per_day: if closed == 0 { 0.0 } else { sum / closed as f64 },
            incomplete_days: incomplete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportRow {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    pub role: Role,
    #[schema(example = 5)]
    pub total_days_worked: u64,
    #[schema(example = "40.25")]
    pub total_hours_worked: String,
    #[schema(example = "8.05")]
    pub average_hours_per_day: String,
    #[schema(example = 0)]
    pub incomplete_days: u64,
}

impl From<&UserTotals> for ReportRow {
    fn from(t: &UserTotals) -> Self {
        ReportRow {
            id: t.id,
            name: t.name.clone(),
            email: t.email.clone(),
            role: t.role,
            total_days_worked: t.total_days_worked,
            total_hours_worked: format_hours(t.total_hours_worked),
            average_hours_per_day: format_hours(t.average_hours_per_day),
            incomplete_days: t.incomplete_days,
        }
    }
}

/// Inclusive `[start_date, end_date]` window over work dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRange {
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-31", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

impl ReportRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    #[schema(example = 12)]
    pub total_users: usize,
    #[schema(example = "380.50")]
    pub total_hours_all_users: String,
    #[schema(example = "31.71")]
    pub average_hours_per_user: String,
    pub most_active_user: Option<ReportRow>,
    pub date_range: ReportRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceReport {
    pub report: Vec<ReportRow>,
    pub statistics: ReportStatistics,
}

impl AttendanceReport {
    /// Builds the report from per-user totals in their stored order.
    ///
    /// The most active user is the first row holding the highest total.
    /// Unlike a plain max over the rows, nobody is singled out when every
    /// total is zero, so an idle range reports `mostActiveUser: null`.
    pub fn build(totals: &[UserTotals], range: ReportRange) -> Self {
        let total_users = totals.len();
        let total_hours = totals
            .iter()
            .fold(0.0, |acc, t| acc + round2(t.total_hours_worked));
        let average = if total_users == 0 {
            0.0
        } else {
            total_hours / total_users as f64
        };

        let most_active = totals
            .iter()
            .fold(None::<&UserTotals>, |best, t| match best {
                Some(b) if t.total_hours_worked <= b.total_hours_worked => Some(b),
                _ => Some(t),
            })
            .filter(|t| round2(t.total_hours_worked) > 0.0);

        AttendanceReport {
            report: totals.iter().map(ReportRow::from).collect(),
            statistics: ReportStatistics {
                total_users,
                total_hours_all_users: format_hours(total_hours),
                average_hours_per_user: format_hours(average),
                most_active_user: most_active.map(ReportRow::from),
                date_range: range,
            },
        }
    }
}
