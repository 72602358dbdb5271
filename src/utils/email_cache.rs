use std::time::Duration;

use anyhow::{Context, Result};
use moka::future::Cache;

use crate::store::UserStore;
use crate::utils::email_filter::normalize;

pub const CACHE_CAPACITY: u64 = 500_000;
pub const CACHE_TTL: Duration = Duration::from_secs(86400);

/// Recently seen emails that are known to be taken.
pub struct EmailCache {
    taken: Cache<String, bool>,
}

impl Default for EmailCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY, CACHE_TTL)
    }
}

impl EmailCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            taken: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn mark_taken(&self, email: &str) {
        self.taken.insert(normalize(email), true).await;
    }

    pub async fn is_taken(&self, email: &str) -> bool {
        self.taken.get(&normalize(email)).await.unwrap_or(false)
    }

    pub async fn forget(&self, email: &str) {
        self.taken.invalidate(&normalize(email)).await;
    }

    async fn batch_mark(&self, emails: &[String]) {
        let futures: Vec<_> = emails
            .iter()
            .map(|e| self.taken.insert(normalize(e), true))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Loads only the emails of users who logged in within the last `days`.
    pub async fn warmup(&self, users: &dyn UserStore, days: u32, batch_size: usize) -> Result<usize> {
        let emails = users
            .emails(Some(days))
            .await
            .context("loading recent emails for cache warmup")?;

        for chunk in emails.chunks(batch_size.max(1)) {
            self.batch_mark(chunk).await;
        }

        log::info!(
            "Email cache warmup complete: {} recent users (last {} days)",
            emails.len(),
            days
        );
        Ok(emails.len())
    }
}
