use eventor_core::stats::AdminStats;
use eventor_core::CoreResult;
use eventor_store::Store;

/// Read-only platform revenue figures for the admin dashboard.
#[derive(Clone)]
pub struct AdminAggregator {
    store: Store,
}

impl AdminAggregator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn stats(&self) -> CoreResult<AdminStats> {
        Ok(self.store.stats.admin_stats().await?)
    }
}
