mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use attendance_tracker::clock::ManualClock;
use attendance_tracker::error::{AppError, AppResult};
use attendance_tracker::model::attendance::{
    AttendanceEntry, AttendancePatch, AttendanceRecord, AttendanceStatus, ClockOutUpdate,
    NewAttendance,
};
use attendance_tracker::model::pagination::PageRequest;
use attendance_tracker::model::report::{ReportRange, UserTotals};
use attendance_tracker::model::role::Role;
use attendance_tracker::service::SessionTracker;
use attendance_tracker::store::{
    AttendanceFilter, AttendanceStore, EntryOrder, MemoryStore, UserStore,
};

use common::{TestContext, at, caller, date};

#[actix_web::test]
async fn full_shift_records_eight_and_a_half_hours() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;

    let started = ctx
        .sessions()
        .clock_in(&caller(&jane), Some("On site".into()))
        .await
        .unwrap();
    assert_eq!(started.attendance.status, AttendanceStatus::Active);
    assert_eq!(started.attendance.work_date, date(5));
    assert_eq!(started.user.email, "jane@company.com");

    ctx.advance(Duration::minutes(8 * 60 + 30));
    let finished = ctx.sessions().clock_out(&caller(&jane), None).await.unwrap();

    assert_eq!(finished.total_hours, 8.5);
    assert_eq!(finished.attendance.total_hours, Some(8.5));
    assert_eq!(finished.attendance.clock_out_time, Some(at(5, 17, 30)));
    assert_eq!(finished.attendance.status, AttendanceStatus::Completed);
    // empty clock-out notes keep the clock-in notes
    assert_eq!(finished.attendance.notes.as_deref(), Some("On site"));
}

#[actix_web::test]
async fn clock_out_notes_replace_clock_in_notes() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;

    ctx.sessions()
        .clock_in(&caller(&jane), Some("Morning".into()))
        .await
        .unwrap();
    ctx.advance(Duration::minutes(20));
    let finished = ctx
        .sessions()
        .clock_out(&caller(&jane), Some("Left early".into()))
        .await
        .unwrap();

    assert_eq!(finished.attendance.notes.as_deref(), Some("Left early"));
    assert_eq!(finished.total_hours, 0.33);
}

#[actix_web::test]
async fn second_clock_in_returns_existing_record_unchanged() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;

    let first = ctx.sessions().clock_in(&caller(&jane), None).await.unwrap();
    ctx.advance(Duration::hours(1));

    let err = ctx
        .sessions()
        .clock_in(&caller(&jane), Some("again".into()))
        .await
        .unwrap_err();

    match err {
        AppError::Conflict { message, record } => {
            assert_eq!(message, "You have already clocked in today. Please clock out first.");
            assert_eq!(record.as_deref(), Some(&first.attendance));
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let total = ctx
        .store
        .count_entries(&AttendanceFilter::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[actix_web::test]
async fn clock_out_without_session_is_not_found_and_mutates_nothing() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;
    let yesterday = ctx.seed_session(&jane, at(4, 9, 0), 8.0).await;

    let err = ctx.sessions().clock_out(&caller(&jane), None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let unchanged = AttendanceStore::find_by_id(ctx.store.as_ref(), yesterday.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged, yesterday);
}

#[actix_web::test]
async fn second_clock_out_is_not_found() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;

    ctx.sessions().clock_in(&caller(&jane), None).await.unwrap();
    ctx.advance(Duration::hours(2));
    ctx.sessions().clock_out(&caller(&jane), None).await.unwrap();

    let err = ctx.sessions().clock_out(&caller(&jane), None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_web::test]
async fn session_opened_before_midnight_is_not_closed_the_next_day() {
    let ctx = TestContext::starting_at(at(5, 23, 0));
    let jane = ctx.seed_user("Jane", Role::User).await;

    ctx.sessions().clock_in(&caller(&jane), None).await.unwrap();
    ctx.advance(Duration::minutes(90));

    let err = ctx.sessions().clock_out(&caller(&jane), None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // a new day allows a new session
    let next = ctx.sessions().clock_in(&caller(&jane), None).await.unwrap();
    assert_eq!(next.attendance.work_date, date(6));
}

#[actix_web::test]
async fn status_reports_running_hours() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;

    let idle = ctx.sessions().current_status(&caller(&jane)).await.unwrap();
    assert!(!idle.is_active);
    assert!(idle.attendance.is_none());
    assert!(idle.current_hours_worked.is_none());

    ctx.sessions().clock_in(&caller(&jane), None).await.unwrap();
    ctx.advance(Duration::minutes(135));

    let running = ctx.sessions().current_status(&caller(&jane)).await.unwrap();
    assert!(running.is_active);
    assert_eq!(running.current_hours_worked, Some(2.25));
    let entry = running.attendance.unwrap();
    assert_eq!(entry.name, "Jane");
    assert_eq!(entry.email, "jane@company.com");
}

#[actix_web::test]
async fn concurrent_clock_ins_leave_one_active_record() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;
    let who = caller(&jane);

    let (a, b) = futures::join!(
        ctx.sessions().clock_in(&who, None),
        ctx.sessions().clock_in(&who, None)
    );

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    assert!([a, b].into_iter().any(|r| r.is_err_and(|e| e.is_conflict())));

    let active = ctx.store.find_active(jane.id, date(5)).await.unwrap();
    assert!(active.is_some());
    let total = ctx
        .store
        .count_entries(&AttendanceFilter::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

/// Hides the first `find_active` hit, as a concurrent insert landing between
/// the pre-check and the insert would.
struct StalePrecheck {
    inner: MemoryStore,
    stale: AtomicBool,
}

#[async_trait]
impl AttendanceStore for StalePrecheck {
    async fn find_active(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        if self.stale.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_active(user_id, work_date).await
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        AttendanceStore::find_by_id(&self.inner, id).await
    }

    async fn insert(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        AttendanceStore::insert(&self.inner, new).await
    }

    async fn close(&self, id: u64, update: ClockOutUpdate) -> AppResult<Option<AttendanceRecord>> {
        self.inner.close(id, update).await
    }

    async fn update(
        &self,
        id: u64,
        patch: &AttendancePatch,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<AttendanceRecord>> {
        AttendanceStore::update(&self.inner, id, patch, updated_at).await
    }

    async fn list_entries(
        &self,
        filter: &AttendanceFilter,
        order: EntryOrder,
        page: &PageRequest,
    ) -> AppResult<Vec<AttendanceEntry>> {
        self.inner.list_entries(filter, order, page).await
    }

    async fn count_entries(&self, filter: &AttendanceFilter) -> AppResult<u64> {
        self.inner.count_entries(filter).await
    }

    async fn user_totals(
        &self,
        range: &ReportRange,
        user_id: Option<u64>,
    ) -> AppResult<Vec<UserTotals>> {
        self.inner.user_totals(range, user_id).await
    }
}

#[actix_web::test]
async fn insert_conflict_after_stale_precheck_reports_the_winner() {
    let users = Arc::new(MemoryStore::new());
    let store = Arc::new(StalePrecheck {
        inner: MemoryStore::new(),
        stale: AtomicBool::new(false),
    });
    let clock = Arc::new(ManualClock::new(at(5, 9, 0)));

    // the user row has to exist in both stores
    let jane = UserStore::insert(
        users.as_ref(),
        attendance_tracker::model::user::NewUser {
            name: "Jane".into(),
            email: "jane@company.com".into(),
            password: "hash".into(),
            role: Role::User,
        },
    )
    .await
    .unwrap();
    UserStore::insert(
        &store.inner,
        attendance_tracker::model::user::NewUser {
            name: "Jane".into(),
            email: "jane@company.com".into(),
            password: "hash".into(),
            role: Role::User,
        },
    )
    .await
    .unwrap();

    let tracker = SessionTracker::new(store.clone(), users, clock);
    let winner = tracker.clock_in(&caller(&jane), None).await.unwrap();

    store.stale.store(true, Ordering::SeqCst);
    let err = tracker.clock_in(&caller(&jane), None).await.unwrap_err();

    match err {
        AppError::Conflict { record, .. } => {
            assert_eq!(record.as_deref(), Some(&winner.attendance));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}
