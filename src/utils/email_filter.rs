use std::sync::RwLock;

use anyhow::{Context, Result};
use autoscale_cuckoo_filter::CuckooFilter;

use crate::store::UserStore;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
pub const FILTER_CAPACITY: usize = 100_000;
pub const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Probabilistic set of registered emails. A miss is definitive, a hit
/// only means "maybe".
pub struct EmailFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)
    }
}

impl EmailFilter {
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(capacity, false_positive_rate)),
        }
    }

    /// Check if an email might exist (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.inner
            .read()
            .expect("email filter poisoned")
            .contains(&email)
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        self.inner
            .write()
            .expect("email filter poisoned")
            .add(&email);
    }

    pub fn remove(&self, email: &str) {
        let email = normalize(email);
        self.inner
            .write()
            .expect("email filter poisoned")
            .remove(&email);
    }

    /// Insert a batch of normalized emails
    fn insert_batch(&self, emails: &[String]) {
        let mut filter = self.inner.write().expect("email filter poisoned");

        for email in emails {
            filter.add(email);
        }
    }

    /// Loads every registered email, `batch_size` at a time.
    pub async fn warmup(&self, users: &dyn UserStore, batch_size: usize) -> Result<usize> {
        let emails = users
            .emails(None)
            .await
            .context("loading emails for filter warmup")?;

        for chunk in emails.chunks(batch_size.max(1)) {
            let batch: Vec<String> = chunk.iter().map(|e| normalize(e)).collect();
            self.insert_batch(&batch);
        }

        log::info!("Email filter warmup complete: {} users", emails.len());
        Ok(emails.len())
    }
}
