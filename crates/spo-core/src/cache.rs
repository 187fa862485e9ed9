use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::shops::Shop;

/// Time-boxed snapshot of the shop list.
///
/// The cache holds no clock of its own; callers pass `now` so staleness is a
/// pure function of its arguments.
#[derive(Debug, Clone, Default)]
pub struct ShopCache {
    data: Vec<Shop>,
    fetched_at: Option<DateTime<Utc>>,
}

impl ShopCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the cache was never filled, holds no shops, or is older than `ttl`.
    ///
    /// A `fetched_at` in the future (clock moved backwards) counts as fresh.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Some(fetched_at) = self.fetched_at else {
            return true;
        };
        if self.data.is_empty() {
            return true;
        }
        (now - fetched_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed > ttl)
    }

    pub fn replace(&mut self, shops: Vec<Shop>, now: DateTime<Utc>) {
        self.data = shops;
        self.fetched_at = Some(now);
    }

    #[must_use]
    pub fn shops(&self) -> &[Shop] {
        &self.data
    }

    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}
