use async_trait::async_trait;
use chrono::Utc;
use eventor_core::booking::{Booking, BookingFilter, BookingStatus, NewBooking};
use eventor_core::commission::{CommissionSetting, NewCommissionSetting};
use eventor_core::directory::{
    NewProviderProfile, NewService, ProviderProfile, ProviderProfileUpdate, ProviderSearch, Service,
    DEFAULT_RESPONSE_TIME_HOURS,
};
use eventor_core::messages::{Message, NewMessage};
use eventor_core::payment::{NewPayment, Payment, PaymentStatus};
use eventor_core::repository::{
    BookingRepository, CommissionRepository, MessageRepository, PaymentRepository, ProviderRepository,
    StatsRepository, UserRepository,
};
use eventor_core::stats::{self, AdminStats, LabelledPayment};
use eventor_core::users::{NewUser, User};
use eventor_core::{StoreError, StoreResult};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    profiles: BTreeMap<i64, ProviderProfile>,
    services: BTreeMap<i64, Service>,
    bookings: BTreeMap<i64, Booking>,
    payments: BTreeMap<i64, Payment>,
    settings: BTreeMap<i64, CommissionSetting>,
    active_setting: Option<i64>,
    messages: BTreeMap<i64, Message>,
}

fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

/// A thread-safe in-memory implementation of every repository trait.
///
/// Used by the test suites and by `database.in_memory = true` runs. Every
/// write happens under one lock, so multi-row changes are all-or-nothing
/// just like the Postgres transactions.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: while `false`, every call fails with `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        }
    }

    fn insert_payment(tables: &mut Tables, payment: NewPayment) -> StoreResult<Payment> {
        if tables.payments.values().any(|p| p.transaction_id == payment.transaction_id) {
            return Err(StoreError::Conflict(format!(
                "duplicate transaction id {}",
                payment.transaction_id
            )));
        }
        let stored = Payment {
            id: next_id(&tables.payments),
            booking_id: payment.booking_id,
            amount: payment.amount,
            currency: payment.currency,
            payment_method: payment.payment_method,
            status: payment.status,
            transaction_id: payment.transaction_id,
            commission_rate: payment.commission_rate,
            commission_amount: payment.commission_amount,
            provider_amount: payment.provider_amount,
            created_at: Utc::now(),
        };
        tables.payments.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        user: NewUser,
        profile: Option<NewProviderProfile>,
    ) -> StoreResult<(User, Option<ProviderProfile>)> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }

        let now = Utc::now();
        let stored = User {
            id: next_id(&tables.users),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            user_type: user.user_type,
            avatar_url: None,
            email_verified: false,
            created_at: now,
        };
        tables.users.insert(stored.id, stored.clone());

        let created_profile = profile.map(|p| {
            let profile = ProviderProfile {
                id: next_id(&tables.profiles),
                user_id: stored.id,
                business_name: p.business_name,
                category: p.category,
                bio: p.bio,
                location_city: p.location_city,
                location_region: p.location_region,
                hourly_rate: None,
                daily_rate: None,
                verified: false,
                response_time_hours: DEFAULT_RESPONSE_TIME_HOURS,
                created_at: now,
            };
            tables.profiles.insert(profile.id, profile.clone());
            profile
        });

        Ok((stored, created_profile))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }
}

#[async_trait]
impl ProviderRepository for MemoryStore {
    async fn get_profile(&self, id: i64) -> StoreResult<Option<ProviderProfile>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&id).cloned())
    }

    async fn profile_for_user(&self, user_id: i64) -> StoreResult<Option<ProviderProfile>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.profiles.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn search_profiles(&self, search: &ProviderSearch) -> StoreResult<Vec<ProviderProfile>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut found: Vec<ProviderProfile> = tables
            .profiles
            .values()
            .filter(|p| search.matches(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.verified
                .cmp(&a.verified)
                .then_with(|| a.business_name.cmp(&b.business_name))
        });
        Ok(found)
    }

    async fn update_profile(
        &self,
        id: i64,
        update: &ProviderProfileUpdate,
    ) -> StoreResult<Option<ProviderProfile>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        Ok(tables.profiles.get_mut(&id).map(|profile| {
            update.apply(profile);
            profile.clone()
        }))
    }

    async fn add_service(&self, service: NewService) -> StoreResult<Service> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.profiles.contains_key(&service.provider_id) {
            return Err(StoreError::Internal(format!(
                "provider {} does not exist",
                service.provider_id
            )));
        }
        let stored = Service {
            id: next_id(&tables.services),
            provider_id: service.provider_id,
            name: service.name,
            description: service.description,
            price: service.price,
            category: service.category,
            created_at: Utc::now(),
        };
        tables.services.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_services(&self, provider_id: i64) -> StoreResult<Vec<Service>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .values()
            .filter(|s| s.provider_id == provider_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let stored = Booking {
            id: next_id(&tables.bookings),
            seeker_id: booking.seeker_id,
            provider_id: booking.provider_id,
            service_id: booking.service_id,
            event_date: booking.event_date,
            event_time: booking.event_time,
            location: booking.location,
            guest_count: booking.guest_count,
            special_requirements: booking.special_requirements,
            total_amount: booking.total_amount,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_booking(&self, id: i64) -> StoreResult<Option<Booking>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: BookingFilter) -> StoreResult<Vec<Booking>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut found: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record_completed(&self, payment: NewPayment) -> StoreResult<Payment> {
        self.check()?;
        let mut tables = self.tables.write().await;

        let already_paid = tables
            .payments
            .values()
            .any(|p| p.booking_id == payment.booking_id && p.status == PaymentStatus::Completed);
        let pending = matches!(
            tables.bookings.get(&payment.booking_id),
            Some(b) if b.status == BookingStatus::Pending
        );
        if already_paid || !pending {
            return Err(StoreError::Conflict(format!(
                "booking {} is not awaiting payment",
                payment.booking_id
            )));
        }

        let booking_id = payment.booking_id;
        let stored = Self::insert_payment(&mut tables, payment)?;
        if let Some(booking) = tables.bookings.get_mut(&booking_id) {
            booking.status = BookingStatus::Confirmed;
            booking.updated_at = Utc::now();
        }
        Ok(stored)
    }

    async fn record_failed(&self, payment: NewPayment) -> StoreResult<Payment> {
        self.check()?;
        let mut tables = self.tables.write().await;
        Self::insert_payment(&mut tables, payment)
    }

    async fn payments_for_booking(&self, booking_id: i64) -> StoreResult<Vec<Payment>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut found: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }
}

#[async_trait]
impl CommissionRepository for MemoryStore {
    async fn active_setting(&self) -> StoreResult<Option<CommissionSetting>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .active_setting
            .and_then(|id| tables.settings.get(&id))
            .cloned())
    }

    async fn append_setting(&self, setting: NewCommissionSetting) -> StoreResult<CommissionSetting> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let stored = CommissionSetting {
            id: next_id(&tables.settings),
            rate: setting.rate,
            payment_method: setting.payment_method,
            account_details: setting.account_details,
            created_at: Some(Utc::now()),
        };
        tables.settings.insert(stored.id, stored.clone());
        tables.active_setting = Some(stored.id);
        Ok(stored)
    }
}

#[async_trait]
impl StatsRepository for MemoryStore {
    async fn admin_stats(&self) -> StoreResult<AdminStats> {
        self.check()?;
        let tables = self.tables.read().await;
        let rows = tables
            .payments
            .values()
            .map(|payment| {
                let booking = tables.bookings.get(&payment.booking_id);
                let customer_name = booking
                    .and_then(|b| tables.users.get(&b.seeker_id))
                    .map(User::display_name)
                    .unwrap_or_default();
                let provider_name = booking
                    .and_then(|b| tables.profiles.get(&b.provider_id))
                    .map(|p| p.business_name.clone())
                    .unwrap_or_default();
                let service_name = booking
                    .and_then(|b| b.service_id)
                    .and_then(|id| tables.services.get(&id))
                    .map(|s| s.name.clone());
                LabelledPayment {
                    payment: payment.clone(),
                    service_name,
                    customer_name,
                    provider_name,
                }
            })
            .collect();
        Ok(stats::aggregate(rows, Utc::now()))
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn send_message(&self, message: NewMessage) -> StoreResult<Message> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let stored = Message {
            id: next_id(&tables.messages),
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            booking_id: message.booking_id,
            content: message.content,
            read: false,
            created_at: Utc::now(),
        };
        tables.messages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn conversation(&self, user_id: i64, other_id: i64) -> StoreResult<Vec<Message>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let mut thread = Vec::new();
        for message in tables.messages.values_mut() {
            let outgoing = message.sender_id == user_id && message.recipient_id == other_id;
            let incoming = message.sender_id == other_id && message.recipient_id == user_id;
            if incoming {
                message.read = true;
            }
            if outgoing || incoming {
                thread.push(message.clone());
            }
        }
        Ok(thread)
    }
}
