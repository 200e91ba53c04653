use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use eventor_api::{app, state::AuthConfig, AppState};
use eventor_booking::SimulatedGateway;
use eventor_store::{MemoryStore, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "ops@eventor.gh";

fn test_app(store: Option<Store>, success_rate: f64) -> Router {
    app(AppState::new(
        store,
        Arc::new(SimulatedGateway::instant(success_rate)),
        AuthConfig {
            secret: "integration-secret".to_string(),
            session_days: 7,
            cookie_secure: false,
        },
        vec![ADMIN_EMAIL.to_string()],
    ))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn seeker_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": "kwame123",
        "firstName": "Kwame",
        "lastName": "Asante",
        "userType": "seeker"
    })
}

fn provider_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": "sounds123",
        "firstName": "Efua",
        "lastName": "Owusu",
        "userType": "provider",
        "businessName": "Efua's Sounds",
        "category": "DJ",
        "locationCity": "Accra"
    })
}

/// Registers and returns (token, response body).
async fn register(app: &Router, body: Value) -> (String, Value) {
    let (status, body) = send(app, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (body["token"].as_str().unwrap().to_string(), body)
}

fn booking_body(provider_id: i64, total: f64) -> Value {
    json!({
        "providerId": provider_id,
        "eventDate": "2026-12-31",
        "eventTime": "20:00",
        "location": "Kempinski Hotel Gold Coast City",
        "guestCount": 150,
        "totalAmount": total
    })
}

#[tokio::test]
async fn test_health_answers_without_a_store() {
    let app = test_app(None, 1.0);
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "unconfigured");
}

#[tokio::test]
async fn test_data_endpoints_answer_503_without_a_store() {
    let app = test_app(None, 1.0);

    let (status, body) = send(&app, "POST", "/auth/register", None, Some(seeker_body("a@b.com"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service temporarily unavailable");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@b.com", "password": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_store_outage_answers_503() {
    let memory = MemoryStore::new();
    let app = test_app(Some(Store::from_memory(memory.clone())), 1.0);
    let (token, registered) = register(&app, seeker_body("kwame@example.com")).await;
    let seeker_id = registered["user"]["id"].as_i64().unwrap();

    memory.set_available(false);
    let uri = format!("/bookings?seekerId={}", seeker_id);
    let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service temporarily unavailable");
}

#[tokio::test]
async fn test_register_validation() {
    let app = test_app(Some(Store::in_memory()), 1.0);

    let mut short = seeker_body("kwame@example.com");
    short["password"] = json!("12345");
    let (status, _) = send(&app, "POST", "/auth/register", None, Some(short)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut no_business = provider_body("efua@example.com");
    no_business["businessName"] = json!("  ");
    let (status, _) = send(&app, "POST", "/auth/register", None, Some(no_business)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    register(&app, seeker_body("kwame@example.com")).await;
    let (status, body) =
        send(&app, "POST", "/auth/register", None, Some(seeker_body("KWAME@example.com"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "An account with this email already exists");
}

#[tokio::test]
async fn test_malformed_json_is_a_400() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    let request = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_cookie_login_and_me() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    register(&app, provider_body("efua@example.com")).await;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "efua@example.com", "password": "sounds123" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("eventor_session="))
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/auth/me")
        .header(header::COOKIE, session)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["user"]["email"], "efua@example.com");
    assert!(me["user"].get("passwordHash").is_none());
    assert_eq!(me["providerProfile"]["businessName"], "Efua's Sounds");

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "efua@example.com", "password": "wrong-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_and_payment_flow() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    let (admin, _) = register(&app, seeker_body(ADMIN_EMAIL)).await;
    let (provider_token, provider) = register(&app, provider_body("efua@example.com")).await;
    let (seeker, seeker_reg) = register(&app, seeker_body("kwame@example.com")).await;
    let provider_id = provider["providerProfile"]["id"].as_i64().unwrap();
    let seeker_id = seeker_reg["user"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/admin/commission-settings",
        Some(&admin),
        Some(json!({ "rate": 0.10, "paymentMethod": "mobile_money", "accountDetails": "0244000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", "/bookings", None, Some(booking_body(provider_id, 1000.0))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, created) =
        send(&app, "POST", "/bookings", Some(&seeker), Some(booking_body(provider_id, 1000.0))).await;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created["booking"]["status"], "pending");
    let booking_id = created["booking"]["id"].as_i64().unwrap();

    let (status, _) = send(&app, "GET", "/bookings", Some(&seeker), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listed) = send(
        &app,
        "GET",
        &format!("/bookings?seekerId={}", seeker_id),
        Some(&seeker),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["bookings"].as_array().unwrap().len(), 1);

    let (status, incoming) = send(
        &app,
        "GET",
        &format!("/bookings?providerId={}", provider_id),
        Some(&provider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(incoming["bookings"][0]["id"], booking_id);

    let charge = json!({
        "bookingId": booking_id,
        "paymentMethod": "momo",
        "amount": 1000,
        "phoneNumber": "0244123456"
    });
    let (status, paid) = send(&app, "POST", "/payments", Some(&seeker), Some(charge.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", paid);
    assert_eq!(paid["payment"]["status"], "completed");
    assert_eq!(paid["payment"]["paymentMethod"], "mobile_money");
    assert_eq!(paid["payment"]["commissionAmount"].as_f64(), Some(100.0));
    assert_eq!(paid["payment"]["providerAmount"].as_f64(), Some(900.0));
    assert!(paid["payment"]["transactionId"].as_str().unwrap().starts_with("TXN-"));

    let (_, booking) = send(&app, "GET", &format!("/bookings/{}", booking_id), Some(&seeker), None).await;
    assert_eq!(booking["booking"]["status"], "confirmed");

    let (status, _) = send(&app, "POST", "/payments", Some(&seeker), Some(charge)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = send(&app, "GET", "/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalTransactions"], 1);
    assert_eq!(stats["totalCommission"].as_f64(), Some(100.0));
    assert_eq!(stats["totalRevenue"].as_f64(), Some(1000.0));
    assert_eq!(stats["recentTransactions"][0]["customerName"], "Kwame Asante");
    assert_eq!(stats["recentTransactions"][0]["serviceName"], "Event booking");
}

#[tokio::test]
async fn test_declined_payment_keeps_booking_pending() {
    let app = test_app(Some(Store::in_memory()), 0.0);
    let (_, provider) = register(&app, provider_body("efua@example.com")).await;
    let (seeker, _) = register(&app, seeker_body("kwame@example.com")).await;
    let provider_id = provider["providerProfile"]["id"].as_i64().unwrap();

    let (_, created) =
        send(&app, "POST", "/bookings", Some(&seeker), Some(booking_body(provider_id, 450.0))).await;
    let booking_id = created["booking"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/payments",
        Some(&seeker),
        Some(json!({ "bookingId": booking_id, "paymentMethod": "bank_transfer", "amount": 450 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("declined"));

    let (_, booking) = send(&app, "GET", &format!("/bookings/{}", booking_id), Some(&seeker), None).await;
    assert_eq!(booking["booking"]["status"], "pending");

    let (_, attempts) = send(
        &app,
        "GET",
        &format!("/bookings/{}/payments", booking_id),
        Some(&seeker),
        None,
    )
    .await;
    assert_eq!(attempts["payments"][0]["status"], "failed");
}

#[tokio::test]
async fn test_payment_input_checks() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    let (_, provider) = register(&app, provider_body("efua@example.com")).await;
    let (seeker, _) = register(&app, seeker_body("kwame@example.com")).await;
    let (stranger, _) = register(&app, seeker_body("yaa@example.com")).await;
    let provider_id = provider["providerProfile"]["id"].as_i64().unwrap();
    let (_, created) =
        send(&app, "POST", "/bookings", Some(&seeker), Some(booking_body(provider_id, 300.0))).await;
    let booking_id = created["booking"]["id"].as_i64().unwrap();

    let cases = [
        (json!({ "bookingId": booking_id, "paymentMethod": "momo", "amount": 300 }), StatusCode::BAD_REQUEST),
        (
            json!({ "bookingId": booking_id, "paymentMethod": "card", "amount": 300, "cardDetails": { "number": "4111111111111111" } }),
            StatusCode::BAD_REQUEST,
        ),
        (json!({ "bookingId": booking_id, "paymentMethod": "cheque", "amount": 300 }), StatusCode::BAD_REQUEST),
        (json!({ "bookingId": booking_id, "paymentMethod": "card", "amount": -1 }), StatusCode::BAD_REQUEST),
        (json!({ "bookingId": booking_id, "paymentMethod": "bank_transfer", "amount": 0.01 }), StatusCode::BAD_REQUEST),
        (json!({ "bookingId": 9999, "paymentMethod": "bank_transfer", "amount": 300 }), StatusCode::NOT_FOUND),
    ];
    for (body, expected) in cases {
        let (status, response) = send(&app, "POST", "/payments", Some(&seeker), Some(body)).await;
        assert_eq!(status, expected, "{}", response);
    }

    let (status, _) = send(
        &app,
        "POST",
        "/payments",
        Some(&stranger),
        Some(json!({ "bookingId": booking_id, "paymentMethod": "bank_transfer", "amount": 300 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", &format!("/bookings/{}", booking_id), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&seeker),
        Some(booking_body(provider_id, 1e11)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("totalAmount"));
}

#[tokio::test]
async fn test_admin_routes_and_commission_settings() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    let (admin, _) = register(&app, seeker_body(ADMIN_EMAIL)).await;
    let (seeker, _) = register(&app, seeker_body("kwame@example.com")).await;

    let (status, _) = send(&app, "GET", "/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/admin/stats", Some(&seeker), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = send(&app, "GET", "/admin/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalTransactions"], 0);
    assert_eq!(stats["totalRevenue"].as_f64(), Some(0.0));
    assert_eq!(stats["averageRate"].as_f64(), Some(0.0));
    assert_eq!(stats["monthlyBreakdown"], json!([]));

    let (_, first) = send(&app, "GET", "/admin/commission-settings", Some(&admin), None).await;
    let (_, second) = send(&app, "GET", "/admin/commission-settings", Some(&admin), None).await;
    assert_eq!(first, second);
    assert_eq!(first["settings"]["rate"].as_f64(), Some(0.05));
    assert_eq!(first["settings"]["createdAt"], Value::Null);

    let (status, _) = send(
        &app,
        "POST",
        "/admin/commission-settings",
        Some(&admin),
        Some(json!({ "rate": 0.75, "paymentMethod": "mobile_money" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, after) = send(&app, "GET", "/admin/commission-settings", Some(&admin), None).await;
    assert_eq!(after, first);
}

#[tokio::test]
async fn test_provider_directory() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    let (provider_token, provider) = register(&app, provider_body("efua@example.com")).await;
    let (seeker, _) = register(&app, seeker_body("kwame@example.com")).await;
    let provider_id = provider["providerProfile"]["id"].as_i64().unwrap();

    let (status, created) = send(
        &app,
        "POST",
        "/providers/me/services",
        Some(&provider_token),
        Some(json!({ "name": "Wedding DJ set", "price": 2500 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["service"]["category"], "dj");

    let (status, _) = send(
        &app,
        "PUT",
        "/providers/me",
        Some(&seeker),
        Some(json!({ "bio": "not a provider" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        "PUT",
        "/providers/me",
        Some(&provider_token),
        Some(json!({ "bio": "Highlife and afrobeats", "dailyRate": 1800 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["provider"]["bio"], "Highlife and afrobeats");

    let (_, found) = send(&app, "GET", "/providers?category=dj&q=AFRO", None, None).await;
    assert_eq!(found["providers"][0]["id"], provider_id);
    let (_, none) = send(&app, "GET", "/providers?city=Kumasi", None, None).await;
    assert_eq!(none["providers"], json!([]));

    let (status, detail) = send(&app, "GET", &format!("/providers/{}", provider_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["services"][0]["name"], "Wedding DJ set");

    let (status, _) = send(&app, "GET", "/providers/424242", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_messaging() {
    let app = test_app(Some(Store::in_memory()), 1.0);
    let (provider_token, provider) = register(&app, provider_body("efua@example.com")).await;
    let (seeker, seeker_reg) = register(&app, seeker_body("kwame@example.com")).await;
    let provider_user = provider["user"]["id"].as_i64().unwrap();
    let seeker_user = seeker_reg["user"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/messages",
        Some(&seeker),
        Some(json!({ "recipientId": provider_user, "content": "Are you free on NYE?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/messages",
        Some(&seeker),
        Some(json!({ "recipientId": seeker_user, "content": "note to self" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, thread) = send(
        &app,
        "GET",
        &format!("/messages?withUserId={}", seeker_user),
        Some(&provider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["messages"][0]["content"], "Are you free on NYE?");
    assert_eq!(thread["messages"][0]["read"], true);
}
