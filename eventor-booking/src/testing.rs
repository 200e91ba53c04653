use eventor_core::booking::BookingRequest;
use eventor_core::directory::{NewProviderProfile, ProviderProfile};
use eventor_core::users::{NewUser, User, UserType};
use eventor_store::Store;
use rust_decimal::Decimal;

pub(crate) struct Fixture {
    pub store: Store,
    pub seeker: User,
    pub provider_user: User,
    pub provider: ProviderProfile,
}

fn new_user(email: &str, first: &str, user_type: UserType) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        first_name: first.to_string(),
        last_name: "Mensah".to_string(),
        phone: None,
        user_type,
    }
}

pub(crate) async fn fixture() -> Fixture {
    let store = Store::in_memory();
    let (seeker, _) = store
        .users
        .create_user(new_user("ama@example.com", "Ama", UserType::Seeker), None)
        .await
        .unwrap();
    let profile = NewProviderProfile::new(
        Some("Golden Plate Catering".to_string()),
        Some("catering".to_string()),
        Some("Accra".to_string()),
        None,
    )
    .unwrap();
    let (provider_user, provider) = store
        .users
        .create_user(new_user("chef@example.com", "Yaw", UserType::Provider), Some(profile))
        .await
        .unwrap();

    Fixture {
        store,
        seeker,
        provider_user,
        provider: provider.unwrap(),
    }
}

pub(crate) fn booking_request(provider_id: i64, total: Decimal) -> BookingRequest {
    BookingRequest {
        provider_id: Some(provider_id),
        service_id: None,
        event_date: Some("2026-12-20".to_string()),
        event_time: Some("14:00".to_string()),
        location: Some("Labadi Beach Hotel".to_string()),
        guest_count: Some(120),
        special_requirements: None,
        total_amount: Some(total),
    }
}
