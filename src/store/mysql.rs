use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::TryStreamExt;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{
    AttendanceEntry, AttendancePatch, AttendanceRecord, AttendanceStatus, ClockOutUpdate,
    NewAttendance,
};
use crate::model::pagination::PageRequest;
use crate::model::report::{ReportRange, UserTotals};
use crate::model::role::Role;
use crate::model::user::{NewUser, User, UserPatch};
use crate::store::{AttendanceFilter, AttendanceStore, EntryOrder, UserStore};
use crate::utils::db_utils::{Op, WhereClause, is_unique_violation};

const ATTENDANCE_COLUMNS: &str = "a.id, a.user_id, a.work_date, a.clock_in_time, a.clock_out_time, \
     a.notes, a.status, a.total_hours, a.updated_at";

const USER_COLUMNS: &str = "id, name, email, password, role, last_login_at";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    work_date: NaiveDate,
    clock_in_time: DateTime<Utc>,
    clock_out_time: Option<DateTime<Utc>>,
    notes: Option<String>,
    status: String,
    total_hours: Option<f64>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> AppResult<Self> {
        let status = AttendanceStatus::from_str(&row.status)
            .map_err(|_| AppError::Store(format!("unknown attendance status '{}'", row.status)))?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            work_date: row.work_date,
            clock_in_time: row.clock_in_time,
            clock_out_time: row.clock_out_time,
            notes: row.notes,
            status,
            total_hours: row.total_hours,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct EntryRow {
    #[sqlx(flatten)]
    record: AttendanceRow,
    name: String,
    email: String,
    role: String,
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    email: String,
    password: String,
    role: String,
    last_login_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct TotalsRow {
    id: u64,
    name: String,
    email: String,
    role: String,
    total_days_worked: i64,
    total_hours_worked: f64,
    average_hours_per_day: f64,
    incomplete_days: i64,
}

fn parse_role(raw: &str) -> AppResult<Role> {
    Role::from_str(raw).map_err(|_| AppError::Store(format!("unknown role '{raw}'")))
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        Ok(User {
            id: row.id,
            role: parse_role(&row.role)?,
            name: row.name,
            email: row.email,
            password: row.password,
            last_login_at: row.last_login_at,
        })
    }
}

impl TryFrom<EntryRow> for AttendanceEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> AppResult<Self> {
        Ok(AttendanceEntry {
            role: parse_role(&row.role)?,
            record: row.record.try_into()?,
            name: row.name,
            email: row.email,
        })
    }
}

impl TryFrom<TotalsRow> for UserTotals {
    type Error = AppError;

    fn try_from(row: TotalsRow) -> AppResult<Self> {
        Ok(UserTotals {
            id: row.id,
            role: parse_role(&row.role)?,
            name: row.name,
            email: row.email,
            total_days_worked: row.total_days_worked.max(0) as u64,
            total_hours_worked: row.total_hours_worked,
            average_hours_per_day: row.average_hours_per_day,
            incomplete_days: row.incomplete_days.max(0) as u64,
        })
    }
}

/// sqlx-backed store over the `users` and `attendance` tables.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch_attendance(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a WHERE a.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn fetch_user(&self, id: u64) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_active(
        &self,
        user_id: u64,
        work_date: NaiveDate,
    ) -> AppResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a \
             WHERE a.user_id = ? AND a.work_date = ? AND a.status = 'active'"
        ))
        .bind(user_id)
        .bind(work_date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<AttendanceRecord>> {
        self.fetch_attendance(id).await
    }

    async fn insert(&self, new: NewAttendance) -> AppResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, work_date, clock_in_time, notes, status, updated_at)
            VALUES (?, ?, ?, ?, 'active', ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.work_date)
        .bind(new.clock_in_time)
        .bind(&new.notes)
        .bind(new.clock_in_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => self
                .fetch_attendance(done.last_insert_id())
                .await?
                .ok_or_else(|| AppError::Store("inserted attendance row not found".into())),
            // uq_attendance_active: one active session per user and work date
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::conflict("Active attendance already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self, id: u64, update: ClockOutUpdate) -> AppResult<Option<AttendanceRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_out_time = ?,
                notes = COALESCE(?, notes),
                total_hours = ?,
                status = 'completed',
                updated_at = ?
            WHERE id = ? AND status = 'active'
            "#,
        )
        .bind(update.clock_out_time)
        .bind(&update.notes)
        .bind(update.total_hours)
        .bind(update.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.fetch_attendance(id).await
    }

    async fn update(
        &self,
        id: u64,
        patch: &AttendancePatch,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Option<AttendanceRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_in_time = COALESCE(?, clock_in_time),
                clock_out_time = COALESCE(?, clock_out_time),
                notes = COALESCE(?, notes),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(patch.clock_in_time)
        .bind(patch.clock_out_time)
        .bind(&patch.notes)
        .bind(patch.status.map(|s| s.to_string()))
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            // MySQL counts changed rows only, so re-read instead of trusting rows_affected
            Ok(_) => self.fetch_attendance(id).await,
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::conflict("Active attendance already exists"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_entries(
        &self,
        filter: &AttendanceFilter,
        order: EntryOrder,
        page: &PageRequest,
    ) -> AppResult<Vec<AttendanceEntry>> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {ATTENDANCE_COLUMNS}, u.name, u.email, u.role \
             FROM attendance a JOIN users u ON a.user_id = u.id"
        ));
        filter.where_clause().push_to(&mut qb);
        qb.push(" ORDER BY ");
        qb.push(order.as_sql());
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<EntryRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(AttendanceEntry::try_from).collect()
    }

    async fn count_entries(&self, filter: &AttendanceFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT COUNT(*) FROM attendance a JOIN users u ON a.user_id = u.id",
        );
        filter.where_clause().push_to(&mut qb);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn user_totals(
        &self,
        range: &ReportRange,
        user_id: Option<u64>,
    ) -> AppResult<Vec<UserTotals>> {
        let mut qb = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                u.id,
                u.name,
                u.email,
                u.role,
                COUNT(a.id) AS total_days_worked,
                CAST(COALESCE(SUM(a.total_hours), 0) AS DOUBLE) AS total_hours_worked,
                CAST(COALESCE(AVG(a.total_hours), 0) AS DOUBLE) AS average_hours_per_day,
                COUNT(CASE WHEN a.status = 'active' THEN 1 END) AS incomplete_days
            FROM users u
            LEFT JOIN attendance a ON u.id = a.user_id
                AND a.work_date >= "#,
        );
        qb.push_bind(range.start_date);
        qb.push(" AND a.work_date <= ");
        qb.push_bind(range.end_date);

        WhereClause::new()
            .and_opt("u.id", Op::Eq, user_id)
            .push_to(&mut qb);

        qb.push(" GROUP BY u.id, u.name, u.email, u.role ORDER BY u.name, u.id");

        let rows = qb
            .build_query_as::<TotalsRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserTotals::try_from).collect()
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>> {
        self.fetch_user(id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn insert(&self, new: NewUser) -> AppResult<User> {
        let result = sqlx::query(
            r#"INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)"#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password)
        .bind(new.role.as_ref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => self
                .fetch_user(done.last_insert_id())
                .await?
                .ok_or_else(|| AppError::Store("inserted user row not found".into())),
            Err(e) if is_unique_violation(&e) => Err(AppError::conflict("User already exists")),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: u64, patch: UserPatch) -> AppResult<Option<User>> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                password = COALESCE(?, password),
                role = COALESCE(?, role)
            WHERE id = ?
            "#,
        )
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.password)
        .bind(patch.role.map(|r| r.to_string()))
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self.fetch_user(id).await,
            Err(e) if is_unique_violation(&e) => Err(AppError::conflict("User already exists")),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn emails(&self, active_within_days: Option<u32>) -> AppResult<Vec<String>> {
        let emails: Vec<String> = match active_within_days {
            Some(days) => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT email
                    FROM users
                    WHERE last_login_at >= UTC_TIMESTAMP() - INTERVAL ? DAY
                    ORDER BY last_login_at DESC
                    "#,
                )
                .bind(days)
                .fetch(&self.pool)
                .try_collect()
                .await?
            }
            None => {
                sqlx::query_scalar::<_, String>("SELECT email FROM users")
                    .fetch(&self.pool)
                    .try_collect()
                    .await?
            }
        };

        Ok(emails)
    }

    async fn record_login(&self, id: u64, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
