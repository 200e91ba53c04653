use eventor_booking::{AdminAggregator, BookingLedger, CommissionService, PaymentProcessor};
use eventor_core::payment::PaymentGateway;
use eventor_store::Store;
use std::sync::Arc;

use crate::error::AppError;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub session_days: i64,
    pub cookie_secure: bool,
}

/// Everything that needs a configured store.
#[derive(Clone)]
pub struct Services {
    pub store: Store,
    pub ledger: BookingLedger,
    pub processor: PaymentProcessor,
    pub commission: CommissionService,
    pub admin: AdminAggregator,
}

impl Services {
    pub fn new(store: Store, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            ledger: BookingLedger::new(store.clone()),
            processor: PaymentProcessor::new(store.clone(), gateway),
            commission: CommissionService::new(store.clone()),
            admin: AdminAggregator::new(store.clone()),
            store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    /// `None` when no database is configured; data routes answer 503.
    pub services: Option<Services>,
    pub auth: AuthConfig,
    pub admin_emails: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        store: Option<Store>,
        gateway: Arc<dyn PaymentGateway>,
        auth: AuthConfig,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            services: store.map(|store| Services::new(store, gateway)),
            auth,
            admin_emails: Arc::new(admin_emails),
        }
    }

    pub fn services(&self) -> Result<&Services, AppError> {
        self.services
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("no database configured".to_string()))
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|admin| admin.eq_ignore_ascii_case(email))
    }
}
