use async_trait::async_trait;

use crate::booking::{Booking, BookingFilter, NewBooking};
use crate::commission::{CommissionSetting, NewCommissionSetting};
use crate::directory::{NewProviderProfile, NewService, ProviderProfile, ProviderProfileUpdate, ProviderSearch, Service};
use crate::messages::{Message, NewMessage};
use crate::payment::{NewPayment, Payment};
use crate::stats::AdminStats;
use crate::users::{NewUser, User};
use crate::StoreResult;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the user and, for providers, their profile in one unit.
    /// A duplicate email surfaces as `StoreError::Conflict`.
    async fn create_user(
        &self,
        user: NewUser,
        profile: Option<NewProviderProfile>,
    ) -> StoreResult<(User, Option<ProviderProfile>)>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
}

/// Repository trait for provider profiles and their services
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn get_profile(&self, id: i64) -> StoreResult<Option<ProviderProfile>>;

    async fn profile_for_user(&self, user_id: i64) -> StoreResult<Option<ProviderProfile>>;

    async fn search_profiles(&self, search: &ProviderSearch) -> StoreResult<Vec<ProviderProfile>>;

    async fn update_profile(
        &self,
        id: i64,
        update: &ProviderProfileUpdate,
    ) -> StoreResult<Option<ProviderProfile>>;

    async fn add_service(&self, service: NewService) -> StoreResult<Service>;

    async fn list_services(&self, provider_id: i64) -> StoreResult<Vec<Service>>;
}

/// Repository trait for the booking ledger
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking>;

    async fn get_booking(&self, id: i64) -> StoreResult<Option<Booking>>;

    /// Most recent first.
    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>>;
}

/// Repository trait for payment attempts
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Stores a completed payment and moves its booking from pending to
    /// confirmed in a single transaction. If the booking is no longer pending,
    /// or already has a completed payment, nothing is written and
    /// `StoreError::Conflict` is returned.
    async fn record_completed(&self, payment: NewPayment) -> StoreResult<Payment>;

    /// Stores a declined attempt. The booking is left untouched.
    async fn record_failed(&self, payment: NewPayment) -> StoreResult<Payment>;

    /// Newest first.
    async fn payments_for_booking(&self, booking_id: i64) -> StoreResult<Vec<Payment>>;
}

/// Repository trait for versioned commission settings
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// The version the active pointer names, if any was ever stored.
    async fn active_setting(&self) -> StoreResult<Option<CommissionSetting>>;

    /// Appends a new version and makes it active.
    async fn append_setting(&self, setting: NewCommissionSetting) -> StoreResult<CommissionSetting>;
}

/// Read-side aggregation for the admin dashboard
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn admin_stats(&self) -> StoreResult<AdminStats>;
}

/// Repository trait for direct messages
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn send_message(&self, message: NewMessage) -> StoreResult<Message>;

    /// Messages exchanged between `user_id` and `other_id`, oldest first.
    /// Messages addressed to `user_id` are marked read.
    async fn conversation(&self, user_id: i64, other_id: i64) -> StoreResult<Vec<Message>>;
}
