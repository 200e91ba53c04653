use eventor_core::commission::{CommissionSetting, NewCommissionSetting};
use eventor_core::CoreResult;
use eventor_store::Store;
use tracing::info;

#[derive(Clone)]
pub struct CommissionService {
    store: Store,
}

impl CommissionService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The active setting, or the built-in default while none was ever saved.
    pub async fn current(&self) -> CoreResult<CommissionSetting> {
        Ok(self
            .store
            .commission
            .active_setting()
            .await?
            .unwrap_or_else(CommissionSetting::fallback))
    }

    /// Validates and appends a new version, which becomes active immediately.
    /// Payments already taken keep the rate they were charged at.
    pub async fn update(&self, setting: NewCommissionSetting) -> CoreResult<CommissionSetting> {
        let setting = setting.validated()?;
        let stored = self.store.commission.append_setting(setting).await?;
        info!(
            setting_id = stored.id,
            rate = %stored.rate,
            payment_method = %stored.payment_method,
            "Commission setting updated"
        );
        Ok(stored)
    }
}
