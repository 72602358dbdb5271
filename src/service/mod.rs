use std::sync::Arc;

use actix_web::web::Data;

use crate::clock::Clock;
use crate::config::Config;
use crate::store::{AttendanceStore, UserStore};

pub mod accounts;
pub mod report_aggregator;
pub mod session_tracker;

pub use accounts::Accounts;
pub use report_aggregator::ReportAggregator;
pub use session_tracker::SessionTracker;

/// The three services, wrapped for `app_data`. Built once and cloned into
/// every worker.
#[derive(Clone)]
pub struct Services {
    pub sessions: Data<SessionTracker>,
    pub reports: Data<ReportAggregator>,
    pub accounts: Data<Accounts>,
}

impl Services {
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>, config: &Config) -> Self
    where
        S: AttendanceStore + UserStore + 'static,
    {
        let attendance: Arc<dyn AttendanceStore> = store.clone();
        let users: Arc<dyn UserStore> = store;

        Self {
            sessions: Data::new(SessionTracker::new(
                attendance.clone(),
                users.clone(),
                clock.clone(),
            )),
            reports: Data::new(ReportAggregator::new(attendance, clock.clone())),
            accounts: Data::new(Accounts::new(
                users,
                clock,
                config.jwt_secret.clone(),
                config.access_token_ttl,
            )),
        }
    }
}
