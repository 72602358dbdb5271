//! Shared fixtures: a memory-backed set of services driven by a manual clock.

#![allow(dead_code, unused_macros)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use attendance_tracker::auth::auth::AuthUser;
use attendance_tracker::auth::jwt::generate_access_token;
use attendance_tracker::auth::password::hash_password;
use attendance_tracker::clock::ManualClock;
use attendance_tracker::config::Config;
use attendance_tracker::model::attendance::{AttendanceRecord, ClockOutUpdate, NewAttendance};
use attendance_tracker::model::role::Role;
use attendance_tracker::model::user::{NewUser, User};
use attendance_tracker::service::{Accounts, ReportAggregator, Services, SessionTracker};
use attendance_tracker::store::{AttendanceStore, MemoryStore, UserStore};

pub const PASSWORD: &str = "s3cret-pass";

/// Builds the full actix service for a `TestContext`.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(actix_web::App::new().configure(|cfg| {
            attendance_tracker::routes::configure(cfg, $ctx.config.clone(), $ctx.services.clone())
        }))
        .await
    };
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| {
        match key {
            "SERVER_ADDR" => Some("127.0.0.1:0"),
            "DATABASE_URL" => Some("memory"),
            "JWT_SECRET" => Some("test-secret-key-for-testing-only"),
            _ => None,
        }
        .map(String::from)
    })
    .expect("test config")
}

/// Governor keys on the peer address, so every test request carries one.
pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, hour, minute, 0).unwrap()
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: Config,
    pub services: Services,
}

impl TestContext {
    /// Monday 2026-01-05 09:00 UTC.
    pub fn new() -> Self {
        Self::starting_at(at(5, 9, 0))
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let config = test_config();
        let services = Services::new(store.clone(), clock.clone(), &config);

        Self {
            store,
            clock,
            config,
            services,
        }
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.services.sessions
    }

    pub fn reports(&self) -> &ReportAggregator {
        &self.services.reports
    }

    pub fn accounts(&self) -> &Accounts {
        &self.services.accounts
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub async fn seed_user(&self, name: &str, role: Role) -> User {
        UserStore::insert(
            self.store.as_ref(),
            NewUser {
                name: name.to_string(),
                email: format!("{}@company.com", name.to_lowercase()),
                password: hash_password(PASSWORD).unwrap(),
                role,
            },
        )
        .await
        .unwrap()
    }

    /// Writes a closed session directly through the store.
    pub async fn seed_session(
        &self,
        user: &User,
        clock_in: DateTime<Utc>,
        hours: f64,
    ) -> AttendanceRecord {
        let record = AttendanceStore::insert(
            self.store.as_ref(),
            NewAttendance {
                user_id: user.id,
                work_date: clock_in.date_naive(),
                clock_in_time: clock_in,
                notes: None,
            },
        )
        .await
        .unwrap();

        let clock_out = clock_in + Duration::minutes((hours * 60.0) as i64);
        self.store
            .close(
                record.id,
                ClockOutUpdate {
                    clock_out_time: clock_out,
                    notes: None,
                    total_hours: hours,
                    updated_at: clock_out,
                },
            )
            .await
            .unwrap()
            .unwrap()
    }

    /// Writes a still-open session directly through the store.
    pub async fn seed_open_session(&self, user: &User, clock_in: DateTime<Utc>) -> AttendanceRecord {
        AttendanceStore::insert(
            self.store.as_ref(),
            NewAttendance {
                user_id: user.id,
                work_date: clock_in.date_naive(),
                clock_in_time: clock_in,
                notes: None,
            },
        )
        .await
        .unwrap()
    }

    pub fn token(&self, user: &User) -> String {
        let (token, _) = generate_access_token(
            user.id,
            user.email.clone(),
            user.role,
            &self.config.jwt_secret,
            self.config.access_token_ttl,
        )
        .unwrap();
        token
    }

    pub fn bearer(&self, user: &User) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token(user)))
    }
}

pub fn caller(user: &User) -> AuthUser {
    AuthUser {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}
