pub mod app_config;
pub mod booking_repo;
pub mod commission_repo;
pub mod database;
pub mod memory;
pub mod message_repo;
pub mod payment_repo;
pub mod provider_repo;
pub mod stats_repo;
pub mod user_repo;

use eventor_core::repository::{
    BookingRepository, CommissionRepository, MessageRepository, PaymentRepository, ProviderRepository,
    StatsRepository, UserRepository,
};
use std::sync::Arc;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::MemoryStore;

/// Every repository the services need, behind trait objects so Postgres and
/// the in-memory store are interchangeable.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub providers: Arc<dyn ProviderRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub commission: Arc<dyn CommissionRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub messages: Arc<dyn MessageRepository>,
}

impl Store {
    pub fn postgres(db: &DbClient) -> Self {
        Self {
            users: Arc::new(user_repo::PgUserRepository::new(db.pool.clone())),
            providers: Arc::new(provider_repo::PgProviderRepository::new(db.pool.clone())),
            bookings: Arc::new(booking_repo::PgBookingRepository::new(db.pool.clone())),
            payments: Arc::new(payment_repo::PgPaymentRepository::new(db.pool.clone())),
            commission: Arc::new(commission_repo::PgCommissionRepository::new(db.pool.clone())),
            stats: Arc::new(stats_repo::PgStatsRepository::new(db.pool.clone())),
            messages: Arc::new(message_repo::PgMessageRepository::new(db.pool.clone())),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    /// Wraps an existing in-memory store, keeping a handle for tests that
    /// need to flip its availability.
    pub fn from_memory(memory: MemoryStore) -> Self {
        Self {
            users: Arc::new(memory.clone()),
            providers: Arc::new(memory.clone()),
            bookings: Arc::new(memory.clone()),
            payments: Arc::new(memory.clone()),
            commission: Arc::new(memory.clone()),
            stats: Arc::new(memory.clone()),
            messages: Arc::new(memory),
        }
    }
}
