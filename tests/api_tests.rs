//! API integration tests
//!
//! These tests run against a live server with a fresh database:
//! start the server with a test configuration, then run
//! `cargo test -- --ignored`. The server must be configured with
//! `auth.admin_secret = "test-admin-secret"`.

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_SECRET: &str = "test-admin-secret";

/// Unique email per test run to avoid duplicate-email conflicts
fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.org", prefix, nanos)
}

/// Register an account and return (email, token)
async fn register_and_login(client: &Client, prefix: &str, role: &str) -> (String, String) {
    let email = unique_email(prefix);

    let mut body = json!({
        "username": prefix,
        "email": email,
        "password": "hunter2",
        "city": "Budapest",
        "age": 30,
        "role": role,
    });
    if role == "admin" {
        body["admin_secret"] = json!(ADMIN_SECRET);
    }

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&body)
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201, "registration failed");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "hunter2" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success(), "login failed");

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();

    (email, token)
}

/// Create a book as admin, returning its id
async fn create_book(client: &Client, admin_token: &str, loan_type: i64) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": "Invisible Cities",
            "author": "Italo Calvino",
            "year_published": 1972,
            "description": "Travel reports to Kublai Khan",
            "loan_type": loan_type,
        }))
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    body["id"].as_i64().expect("No book ID")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _token) = register_and_login(&client, "badpass", "member").await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email() {
    let client = Client::new();
    let email = unique_email("dup");

    for expected in [201, 409] {
        let response = client
            .post(format!("{}/auth/register", BASE_URL))
            .json(&json!({
                "username": "dup",
                "email": email,
                "password": "hunter2",
                "city": "Budapest",
                "age": 30,
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_admin_signup_requires_secret() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": "impostor",
            "email": unique_email("impostor"),
            "password": "hunter2",
            "city": "Budapest",
            "age": 30,
            "role": "admin",
            "admin_secret": "not-the-secret",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "AdminSecretInvalid");
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let (email, token) = register_and_login(&client, "profile", "member").await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], email.as_str());
    assert_eq!(body["role"], "member");
    // The password hash must never be serialized
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["books"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_add_book_but_admin_can() {
    let client = Client::new();
    let (_email, member_token) = register_and_login(&client, "member-add", "member").await;
    let (_email, admin_token) = register_and_login(&client, "admin-add", "admin").await;

    let payload = json!({
        "title": "The Leopard",
        "author": "Giuseppe Tomasi di Lampedusa",
        "year_published": 1958,
        "loan_type": 2,
    });

    // Member is rejected
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // Same payload from an admin succeeds
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["id"].as_i64().expect("No book ID");
    assert_eq!(body["status"], "available");
    assert_eq!(body["copy_status"], "available");

    // The book appears in the public listing
    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let found = body["books"]
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["id"].as_i64() == Some(book_id));
    assert!(found, "created book missing from listing");
}

#[tokio::test]
#[ignore]
async fn test_loan_round_trip() {
    let client = Client::new();
    let (_email, admin_token) = register_and_login(&client, "loan-admin", "admin").await;
    let (_email, member_token) = register_and_login(&client, "borrower", "member").await;
    let book_id = create_book(&client, &admin_token, 1).await;

    // Borrow: the primary slot is consumed first
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_i64().expect("No loan ID");
    assert!(body["due_date"].is_string());

    // Second borrow of the same book by the same user is rejected
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "AlreadyLoaned");

    // The loan shows up in the borrower's list, not late
    let response = client
        .get(format!("{}/loans/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan = body["loans"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["loan_id"].as_i64() == Some(loan_id))
        .expect("loan missing from own list")
        .clone();
    assert_eq!(loan["late"], false);

    // Return restores availability
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", member_token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["status"], "available");
    assert_eq!(body["book"]["copy_status"], "available");
    assert!(body.get("loan").is_none());

    // Returning the same loan again fails
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", member_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_two_copies_then_unavailable() {
    let client = Client::new();
    let (_email, admin_token) = register_and_login(&client, "copies-admin", "admin").await;
    let (_email, first_token) = register_and_login(&client, "first-borrower", "member").await;
    let (_email, second_token) = register_and_login(&client, "second-borrower", "member").await;
    let (_email, third_token) = register_and_login(&client, "third-borrower", "member").await;
    let book_id = create_book(&client, &admin_token, 3).await;

    for token in [&first_token, &second_token] {
        let response = client
            .post(format!("{}/loans", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "book_id": book_id }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    // Both slots taken: the third borrower is rejected
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", third_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BookUnavailable");

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["status"], "taken");
    assert_eq!(body["book"]["copy_status"], "taken");
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_return_another_users_loan() {
    let client = Client::new();
    let (_email, admin_token) = register_and_login(&client, "return-admin", "admin").await;
    let (_email, borrower_token) = register_and_login(&client, "owner", "member").await;
    let (_email, other_token) = register_and_login(&client, "other", "member").await;
    let book_id = create_book(&client, &admin_token, 2).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["id"].as_i64().unwrap();

    // Another member may not return it
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // An admin may
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_loans_claim_distinct_slots() {
    let client = Client::new();
    let (_email, admin_token) = register_and_login(&client, "race-admin", "admin").await;
    let (_email, first_token) = register_and_login(&client, "racer-one", "member").await;
    let (_email, second_token) = register_and_login(&client, "racer-two", "member").await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let borrow = |token: String| {
        let client = client.clone();
        async move {
            client
                .post(format!("{}/loans", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "book_id": book_id }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
        }
    };

    let (first, second) = tokio::join!(borrow(first_token), borrow(second_token.clone()));
    assert_eq!(first, 201);
    assert_eq!(second, 201);

    // Exactly two loans, both flags taken, no double-assigned slot
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", second_token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["status"], "taken");
    assert_eq!(body["book"]["copy_status"], "taken");
}

#[tokio::test]
#[ignore]
async fn test_all_loans_listing_is_admin_only() {
    let client = Client::new();
    let (_email, member_token) = register_and_login(&client, "loans-member", "member").await;
    let (_email, admin_token) = register_and_login(&client, "loans-admin", "admin").await;

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["loans"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_customers_endpoints_are_admin_only() {
    let client = Client::new();
    let (_email, member_token) = register_and_login(&client, "cust-member", "member").await;
    let (_email, admin_token) = register_and_login(&client, "cust-admin", "admin").await;

    let response = client
        .get(format!("{}/customers", BASE_URL))
        .header("Authorization", format!("Bearer {}", member_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/customers", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/me", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
