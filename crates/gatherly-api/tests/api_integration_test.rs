//! End-to-end tests against a running API server
//!
//! Run with: cargo test -p gatherly-api --test api_integration_test -- --ignored
//!
//! Requirements:
//! - gatherly-api running (defaults to http://localhost:3001, override with API_BASE_URL)
//! - PostgreSQL behind it with migrations applied

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

fn base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Register a fresh user and log in, returning (access token, user json)
async fn register_and_login(client: &Client, tag: &str) -> (String, Value) {
    let suffix = Uuid::now_v7().simple().to_string();
    let email = format!("{tag}-{suffix}@example.com");
    let username = format!("{}_{}", tag.replace('-', "_"), &suffix[..12]);

    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "username": username,
            "firstName": "Test",
            "lastName": "User",
            "password": "Password123",
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "Password123" }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let token = body["accessToken"].as_str().unwrap().to_string();
    (token, body["user"].clone())
}

async fn create_event(client: &Client, token: &str, max_attendees: Option<u32>) -> Value {
    let resp = client
        .post(format!("{}/api/events", base_url()))
        .bearer_auth(token)
        .json(&json!({
            "title": "Integration Test Meetup",
            "description": "An event created by the integration test suite",
            "startDate": "2031-06-01T18:00:00Z",
            "location": "Test Venue, Berlin",
            "category": "TECHNOLOGY",
            "maxAttendees": max_attendees,
            "tags": ["testing"],
        }))
        .send()
        .await
        .expect("create event request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.unwrap();
    body["event"].clone()
}

#[tokio::test]
#[ignore]
async fn test_health() {
    let client = Client::new();
    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("health request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore]
async fn test_register_login_me_logout() {
    let client = Client::new();
    let (token, user) = register_and_login(&client, "auth").await;

    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["_count"]["hostedEvents"], 0);

    let resp = client
        .post(format!("{}/api/auth/logout", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Without a token the profile endpoint rejects
    let resp = client
        .get(format!("{}/api/auth/me", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_login_rejects_bad_password() {
    let client = Client::new();
    let (_, user) = register_and_login(&client, "badpw").await;

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": user["email"], "password": "WrongPassword1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_event_lifecycle_with_rsvp_and_like() {
    let client = Client::new();
    let (host_token, _) = register_and_login(&client, "host").await;
    let (guest_token, _) = register_and_login(&client, "guest").await;

    let event = create_event(&client, &host_token, Some(10)).await;
    let event_id = event["id"].as_str().unwrap();

    // Detail is publicly visible
    let resp = client
        .get(format!("{}/api/events/{event_id}", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: Value = resp.json().await.unwrap();
    assert_eq!(detail["attendeeCount"], 0);
    assert_eq!(detail["reviewCount"], 0);

    // Guest goes
    let resp = client
        .post(format!("{}/api/events/{event_id}/rsvp", base_url()))
        .bearer_auth(&guest_token)
        .json(&json!({ "status": "GOING" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "GOING");
    assert_eq!(body["attendeeCount"], 1);

    // The guest's view reflects their RSVP
    let resp = client
        .get(format!("{}/api/events/{event_id}", base_url()))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    let detail: Value = resp.json().await.unwrap();
    assert_eq!(detail["userRsvp"], "GOING");
    assert_eq!(detail["attendeeCount"], 1);

    // Like toggles on and off
    let resp = client
        .post(format!("{}/api/events/{event_id}/like", base_url()))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isLiked"], true);

    let resp = client
        .post(format!("{}/api/events/{event_id}/like", base_url()))
        .bearer_auth(&guest_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isLiked"], false);
}

#[tokio::test]
#[ignore]
async fn test_capacity_rejection_over_http() {
    let client = Client::new();
    let (host_token, _) = register_and_login(&client, "cap-host").await;
    let (a_token, _) = register_and_login(&client, "cap-a").await;
    let (b_token, _) = register_and_login(&client, "cap-b").await;

    let event = create_event(&client, &host_token, Some(1)).await;
    let event_id = event["id"].as_str().unwrap();

    let resp = client
        .post(format!("{}/api/events/{event_id}/rsvp", base_url()))
        .bearer_auth(&a_token)
        .json(&json!({ "status": "GOING" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/api/events/{event_id}/rsvp", base_url()))
        .bearer_auth(&b_token)
        .json(&json!({ "status": "GOING" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Event is at full capacity");

    // MAYBE is not capacity-limited
    let resp = client
        .post(format!("{}/api/events/{event_id}/rsvp", base_url()))
        .bearer_auth(&b_token)
        .json(&json!({ "status": "MAYBE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_invalid_rsvp_status_rejected() {
    let client = Client::new();
    let (host_token, _) = register_and_login(&client, "status-host").await;
    let event = create_event(&client, &host_token, None).await;
    let event_id = event["id"].as_str().unwrap();

    let resp = client
        .post(format!("{}/api/events/{event_id}/rsvp", base_url()))
        .bearer_auth(&host_token)
        .json(&json!({ "status": "ATTENDING" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_reviews_are_once_per_user() {
    let client = Client::new();
    let (host_token, _) = register_and_login(&client, "rev-host").await;
    let (guest_token, _) = register_and_login(&client, "rev-guest").await;

    let event = create_event(&client, &host_token, None).await;
    let event_id = event["id"].as_str().unwrap();

    let resp = client
        .post(format!("{}/api/events/{event_id}/reviews", base_url()))
        .bearer_auth(&guest_token)
        .json(&json!({ "rating": 5, "comment": "Great event" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{}/api/events/{event_id}/reviews", base_url()))
        .bearer_auth(&guest_token)
        .json(&json!({ "rating": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_follow_toggle_and_counts() {
    let client = Client::new();
    let (follower_token, follower) = register_and_login(&client, "follower").await;
    let (_, followee) = register_and_login(&client, "followee").await;
    let followee_id = followee["id"].as_str().unwrap();

    // Self-follow is rejected
    let follower_id = follower["id"].as_str().unwrap();
    let resp = client
        .post(format!("{}/api/users/{follower_id}/follow", base_url()))
        .bearer_auth(&follower_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{}/api/users/{followee_id}/follow", base_url()))
        .bearer_auth(&follower_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isFollowing"], true);

    let resp = client
        .get(format!("{}/api/users/{followee_id}", base_url()))
        .send()
        .await
        .unwrap();
    let profile: Value = resp.json().await.unwrap();
    assert_eq!(profile["_count"]["followers"], 1);
    // Public profiles never expose the email
    assert!(profile.get("email").is_none());

    let resp = client
        .post(format!("{}/api/users/{followee_id}/follow", base_url()))
        .bearer_auth(&follower_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isFollowing"], false);
}

#[tokio::test]
#[ignore]
async fn test_token_refresh_rotates() {
    let client = Client::new();
    let suffix = Uuid::now_v7().simple().to_string();
    let email = format!("refresh-{suffix}@example.com");

    client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "username": format!("refresh_{}", &suffix[..12]),
            "firstName": "Test",
            "lastName": "User",
            "password": "Password123",
        }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "Password123" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let refresh_token = body["refreshToken"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/api/auth/refresh", base_url()))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated: Value = resp.json().await.unwrap();
    assert_ne!(rotated["refreshToken"].as_str().unwrap(), refresh_token);

    // The old token was rotated out and no longer works
    let resp = client
        .post(format!("{}/api/auth/refresh", base_url()))
        .json(&json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
