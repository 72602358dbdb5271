//! Persistence seams for users and attendance records.
//!
//! The services only ever talk to these traits. `MySqlStore` is the production
//! backend; `MemoryStore` backs `DATABASE_URL=memory` and the test suites.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppResult;
use crate::model::attendance::{
    AttendanceEntry, AttendancePatch, AttendanceRecord, ClockOutUpdate, NewAttendance,
};
use crate::model::pagination::PageRequest;
use crate::model::report::{ReportRange, UserTotals};
use crate::model::user::{NewUser, User, UserPatch};
use crate::utils::db_utils::{Op, WhereClause};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Optional predicates over attendance rows; date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub user_id: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AttendanceFilter {
    /// SQL form, against the `attendance a` alias.
    pub fn where_clause(&self) -> WhereClause {
        WhereClause::new()
            .and_opt("a.user_id", Op::Eq, self.user_id)
            .and_opt("a.work_date", Op::Gte, self.start_date)
            .and_opt("a.work_date", Op::Lte, self.end_date)
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.user_id.is_none_or(|id| record.user_id == id)
            && self.start_date.is_none_or(|d| record.work_date >= d)
            && self.end_date.is_none_or(|d| record.work_date <= d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrder {
    /// Newest day first, then latest clock-in
    NewestFirst,
    /// Newest day first, then user name, then latest clock-in
    NewestFirstByName,
}

impl EntryOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            EntryOrder::NewestFirst => "a.work_date DESC, a.clock_in_time DESC, a.id DESC",
            EntryOrder::NewestFirstByName => {
                "a.work_date DESC, u.name ASC, a.clock_in_time DESC, a.id DESC"
            }
        }
    }

    pub fn compare(&self, a: &AttendanceEntry, b: &AttendanceEntry) -> Ordering {
        let by_date = b.record.work_date.cmp(&a.record.work_date);
        let by_name = match self {
            EntryOrder::NewestFirst => Ordering::Equal,
            EntryOrder::NewestFirstByName => a.name.cmp(&b.name),
        };

        by_date
            .then(by_name)
            .then_with(|| b.record.clock_in_time.cmp(&a.record.clock_in_time))
            .then_with(|| b.record.id.cmp(&a.record.id))
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// The open session of `user_id` on `work_date`, if any.
    async fn find_active(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>>;

    async fn find_by_id(&self, id: u64) -> AppResult<Option<AttendanceRecord>>;

    /// Inserts an `active` record. Fails with `AppError::Conflict` when the
    /// user already has an active record for that work date.
    async fn insert(&self, new: NewAttendance) -> AppResult<AttendanceRecord>;

    /// Closes the record if it is still active. `None` means it was not.
    async fn close(&self, id: u64, update: ClockOutUpdate) -> AppResult<Option<AttendanceRecord>>;

    /// COALESCE-style partial update. `None` when the id is unknown.
    async fn update(
        &self,
        id: u64,
        patch: &AttendancePatch,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<AttendanceRecord>>;

    async fn list_entries(
        &self,
        filter: &AttendanceFilter,
        order: EntryOrder,
        page: &PageRequest,
    ) -> AppResult<Vec<AttendanceEntry>>;

    async fn count_entries(&self, filter: &AttendanceFilter) -> AppResult<u64>;

    /// One row per user ordered by name, left-joined with the records whose
    /// work date falls inside `range`.
    async fn user_totals(
        &self,
        range: &ReportRange,
        user_id: Option<u64>,
    ) -> AppResult<Vec<UserTotals>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Fails with `AppError::Conflict` on a duplicate email.
    async fn insert(&self, new: NewUser) -> AppResult<User>;

    async fn update(&self, id: u64, patch: UserPatch) -> AppResult<Option<User>>;

    async fn list(&self) -> AppResult<Vec<User>>;

    /// All emails, or only those of users who logged in within the last `days`.
    async fn emails(&self, active_within_days: Option<u32>) -> AppResult<Vec<String>>;

    async fn record_login(&self, id: u64, at: DateTime<Utc>) -> AppResult<()>;
}
