use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{
    AttendanceEntry, AttendancePatch, AttendanceRecord, AttendanceStatus, ClockOutUpdate,
    NewAttendance,
};
use crate::model::pagination::PageRequest;
use crate::model::report::{ReportRange, UserTotals};
use crate::model::user::{NewUser, User, UserPatch};
use crate::store::{AttendanceFilter, AttendanceStore, EntryOrder, UserStore};

#[derive(Default)]
struct State {
    users: Vec<User>,
    attendance: Vec<AttendanceRecord>,
    next_user_id: u64,
    next_attendance_id: u64,
}

impl State {
    fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }

    fn has_active(&self, user_id: u64, work_date: NaiveDate, except: Option<u64>) -> bool {
        self.attendance.iter().any(|r| {
            r.user_id == user_id && r.work_date == work_date && r.is_active() && Some(r.id) != except
        })
    }

    fn entry(&self, record: &AttendanceRecord) -> Option<AttendanceEntry> {
        self.user(record.user_id).map(|u| AttendanceEntry {
            record: record.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
        })
    }

    /// Entries joined with their owner; orphaned records drop out like an inner join.
    fn entries(&self, filter: &AttendanceFilter) -> Vec<AttendanceEntry> {
        self.attendance
            .iter()
            .filter(|r| filter.matches(r))
            .filter_map(|r| self.entry(r))
            .collect()
    }
}

/// Process-local store. Every operation runs under one lock, so the
/// check-and-insert for active sessions is atomic just like the unique key
/// in the MySQL schema.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_active(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        Ok(self
            .lock()
            .attendance
            .iter()
            .find(|r| r.user_id == user_id && r.work_date == work_date && r.is_active())
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        Ok(self.lock().attendance.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        let mut state = self.lock();

        if state.user(new.user_id).is_none() {
            return Err(AppError::Store(format!("unknown user {}", new.user_id)));
        }
        if state.has_active(new.user_id, new.work_date, None) {
            return Err(AppError::conflict("Active attendance already exists"));
        }

        state.next_attendance_id += 1;
        let record = AttendanceRecord {
            id: state.next_attendance_id,
            user_id: new.user_id,
            work_date: new.work_date,
            clock_in_time: new.clock_in_time,
            clock_out_time: None,
            notes: new.notes,
            status: AttendanceStatus::Active,
            total_hours: None,
            updated_at: new.clock_in_time,
        };
        state.attendance.push(record.clone());

        Ok(record)
    }

    async fn close(&self, id: u64, update: ClockOutUpdate) -> AppResult<Option<AttendanceRecord>> {
        let mut state = self.lock();

        let Some(record) = state
            .attendance
            .iter_mut()
            .find(|r| r.id == id && r.is_active())
        else {
            return Ok(None);
        };

        record.clock_out_time = Some(update.clock_out_time);
        if update.notes.is_some() {
            record.notes = update.notes;
        }
        record.total_hours = Some(update.total_hours);
        record.status = AttendanceStatus::Completed;
        record.updated_at = update.updated_at;

        Ok(Some(record.clone()))
    }

    async fn update(
        &self,
        id: u64,
        patch: &AttendancePatch,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<AttendanceRecord>> {
        let mut state = self.lock();

        let Some(pos) = state.attendance.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let patched = patch.apply_to(&state.attendance[pos], updated_at);
        if patched.is_active() && state.has_active(patched.user_id, patched.work_date, Some(id)) {
            return Err(AppError::conflict("Active attendance already exists"));
        }

        state.attendance[pos] = patched.clone();
        Ok(Some(patched))
    }

    async fn list_entries(
        &self,
        filter: &AttendanceFilter,
        order: EntryOrder,
        page: &PageRequest,
    ) -> AppResult<Vec<AttendanceEntry>> {
        let mut entries = self.lock().entries(filter);
        entries.sort_by(|a, b| order.compare(a, b));

        Ok(entries
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_entries(&self, filter: &AttendanceFilter) -> AppResult<u64> {
        Ok(self.lock().entries(filter).len() as u64)
    }

    async fn user_totals(
        &self,
        range: &ReportRange,
        user_id: Option<u64>,
    ) -> AppResult<Vec<UserTotals>> {
        let state = self.lock();

        let mut users: Vec<&User> = state
            .users
            .iter()
            .filter(|u| user_id.is_none_or(|id| u.id == id))
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(users
            .into_iter()
            .map(|u| {
                let records = state
                    .attendance
                    .iter()
                    .filter(|r| r.user_id == u.id && range.contains(r.work_date));
                UserTotals::from_records(u, records)
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>> {
        Ok(self.lock().user(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> AppResult<User> {
        let mut state = self.lock();

        if state.email_taken(&new.email, None) {
            return Err(AppError::conflict("User already exists"));
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            name: new.name,
            email: new.email,
            password: new.password,
            role: new.role,
            last_login_at: None,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn update(&self, id: u64, patch: UserPatch) -> AppResult<Option<User>> {
        let mut state = self.lock();

        if let Some(email) = &patch.email {
            if state.email_taken(email, Some(id)) {
                return Err(AppError::conflict("User already exists"));
            }
        }

        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(password) = patch.password {
            user.password = password;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }

        Ok(Some(user.clone()))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.lock().users.clone())
    }

    async fn emails(&self, active_within_days: Option<u32>) -> AppResult<Vec<String>> {
        let cutoff = active_within_days.map(|days| Utc::now() - Duration::days(days as i64));

        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| match cutoff {
                Some(cutoff) => u.last_login_at.is_some_and(|at| at >= cutoff),
                None => true,
            })
            .map(|u| u.email.clone())
            .collect())
    }

    async fn record_login(&self, id: u64, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}
