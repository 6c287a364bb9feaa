//! API integration tests
//!
//! These run against a live server with a seeded admin account:
//!   cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated staff token
pub async fn get_auth_token(client: &Client) -> String {
    let email = std::env::var("UNILIB_TEST_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@university.edu".to_string());
    let password =
        std::env::var("UNILIB_TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin-password".to_string());

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Unique suffix so repeated runs don't trip duplicate checks
pub fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
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

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@university.edu",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["email"].is_string());
    // The password hash must never serialize
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();

    // A publisher is required first
    let response = client
        .post(format!("{}/publishers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": format!("Test Press {}", suffix) }))
        .send()
        .await
        .expect("Failed to create publisher");
    assert_eq!(response.status(), 201);
    let publisher: Value = response.json().await.unwrap();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": format!("Test Book {}", suffix),
            "publisher_id": publisher["id"],
            "publication_year": 2020,
            "shelf_location": "T-1",
            "total_copies": 2
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);

    let book: Value = response.json().await.unwrap();
    assert_eq!(book["total_copies"], 2);
    assert_eq!(book["available_copies"], 2);

    let book_id = book["id"].as_str().unwrap();

    // Copies were seeded alongside the book
    let response = client
        .get(format!("{}/books/{}/copies", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let copies: Value = response.json().await.unwrap();
    assert_eq!(copies.as_array().unwrap().len(), 2);

    // Delete the book
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();
    let isbn = format!("9{:012}", suffix % 1_000_000_000_000);

    let response = client
        .post(format!("{}/publishers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": format!("ISBN Press {}", suffix) }))
        .send()
        .await
        .unwrap();
    let publisher: Value = response.json().await.unwrap();

    let payload = json!({
        "title": format!("ISBN Book {}", suffix),
        "isbn_13": isbn,
        "publisher_id": publisher["id"],
        "publication_year": 2021,
        "shelf_location": "T-2"
    });

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_account_request_flow() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();
    let email = format!("student{}@university.edu", suffix);

    // Submit (public, no token)
    let response = client
        .post(format!("{}/account-requests", BASE_URL))
        .json(&json!({
            "full_name": "Test Student",
            "email": email,
            "student_id": format!("S{}", suffix % 10_000_000)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let request: Value = response.json().await.unwrap();
    let request_id = request["id"].as_str().unwrap();

    // A second pending request for the same email is rejected
    let response = client
        .post(format!("{}/account-requests", BASE_URL))
        .json(&json!({
            "full_name": "Test Student",
            "email": email
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Approve
    let response = client
        .post(format!("{}/account-requests/{}/approve", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "password": "initial-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "student");
    assert_eq!(user["account_status"], "active");

    // Approving twice is rejected
    let response = client
        .post(format!("{}/account-requests/{}/approve", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "password": "initial-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // The new user can log in
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "initial-password" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_dashboard() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/dashboard", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert!(body["books_total"].is_number());
    assert!(body["borrows_active"].is_number());
    assert!(body["fines_unpaid_total"].is_string() || body["fines_unpaid_total"].is_number());
    assert!(body["recent_borrows"].is_array());
}
