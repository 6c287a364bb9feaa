//! Circulation and reservation flow tests.
//!
//! The central scenario mirrors the documented lifecycle of a single-copy
//! book: borrow exhausts availability, a reservation queues behind it, and
//! returning the book restores availability WITHOUT notifying the queue —
//! hand-off only happens through the explicit notify-next call.

use reqwest::Client;
use serde_json::{json, Value};

use crate::api_tests::{get_auth_token, unique_suffix};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn create_user(client: &Client, token: &str, suffix: u128, tag: &str) -> Value {
    let response = client
        .post(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "full_name": format!("User {}", tag),
            "email": format!("{}{}@university.edu", tag, suffix),
            "password": "borrower-password",
            "role": "student"
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

async fn create_single_copy_book(client: &Client, token: &str, suffix: u128) -> Value {
    let response = client
        .post(format!("{}/publishers", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": format!("Circulation Press {}", suffix) }))
        .send()
        .await
        .unwrap();
    let publisher: Value = response.json().await.unwrap();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": format!("Single Copy {}", suffix),
            "publisher_id": publisher["id"],
            "publication_year": 2019,
            "shelf_location": "C-1",
            "total_copies": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

async fn get_book(client: &Client, token: &str, book_id: &str) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_borrow_reserve_return_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();

    let user_a = create_user(&client, &token, suffix, "alice").await;
    let user_b = create_user(&client, &token, suffix, "bob").await;
    let book = create_single_copy_book(&client, &token, suffix).await;
    let book_id = book["id"].as_str().unwrap();

    // Reserving while a copy is available is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "user_id": user_b["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // Alice borrows the only copy
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": user_a["id"], "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let borrow: Value = response.json().await.unwrap();
    assert_eq!(borrow["status"], "approved");
    assert!(borrow["due_date"].is_string());

    let book_now = get_book(&client, &token, book_id).await;
    assert_eq!(book_now["available_copies"], 0);
    assert_eq!(book_now["total_copies"], 1);

    // Borrowing with no copies left is rejected regardless of the request
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": user_b["id"], "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    // Bob reserves and gets queue position 1
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "user_id": user_b["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let reservation: Value = response.json().await.unwrap();
    assert_eq!(reservation["queue_position"], 1);
    assert_eq!(reservation["status"], "active");

    // A second active reservation for the same user and book is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id, "user_id": user_b["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Alice returns the book
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow["id"].as_str().unwrap()))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned["status"], "returned");

    let book_after = get_book(&client, &token, book_id).await;
    assert_eq!(book_after["available_copies"], 1);

    // The return did NOT notify Bob: his reservation is untouched
    let response = client
        .get(format!("{}/books/{}/reservations", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let queue: Value = response.json().await.unwrap();
    let queue = queue.as_array().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["notification_sent"], false);

    // Explicit hand-off notifies the head of the queue
    let response = client
        .post(format!("{}/books/{}/reservations/notify-next", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["notified"]["notification_sent"], true);
}

#[tokio::test]
#[ignore]
async fn test_renewal_limit() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();

    let user = create_user(&client, &token, suffix, "renewer").await;
    let book = create_single_copy_book(&client, &token, suffix).await;

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": user["id"], "book_id": book["id"] }))
        .send()
        .await
        .unwrap();
    let borrow: Value = response.json().await.unwrap();
    let borrow_id = borrow["id"].as_str().unwrap();

    // Default max_renewals is 2
    for expected in 1..=2 {
        let response = client
            .post(format!("{}/borrows/{}/renew", BASE_URL, borrow_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["renewal_count"], expected);
    }

    // The third renewal hits the cap
    let response = client
        .post(format!("{}/borrows/{}/renew", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_queue_positions_stay_contiguous() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique_suffix();

    let borrower = create_user(&client, &token, suffix, "holder").await;
    let book = create_single_copy_book(&client, &token, suffix).await;
    let book_id = book["id"].as_str().unwrap();

    // Exhaust availability so reservations are allowed
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": borrower["id"], "book_id": book_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Three users queue up
    let mut reservations = Vec::new();
    for tag in ["q1", "q2", "q3"] {
        let user = create_user(&client, &token, suffix, tag).await;
        let response = client
            .post(format!("{}/reservations", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "book_id": book_id, "user_id": user["id"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        reservations.push(response.json::<Value>().await.unwrap());
    }
    assert_eq!(reservations[2]["queue_position"], 3);

    // Cancel the middle reservation; positions must close to 1..2
    let response = client
        .post(format!(
            "{}/reservations/{}/cancel",
            BASE_URL,
            reservations[1]["id"].as_str().unwrap()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/{}/reservations", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let queue: Value = response.json().await.unwrap();
    let positions: Vec<i64> = queue
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["queue_position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, vec![1, 2]);

    // Cancelling a non-active reservation is rejected
    let response = client
        .post(format!(
            "{}/reservations/{}/cancel",
            BASE_URL,
            reservations[1]["id"].as_str().unwrap()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_overdue_processing_is_idempotent() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    // Two consecutive runs over the same data must report the same overdue
    // set and create no second fine for any record.
    let first: Value = client
        .post(format!("{}/circulation/process-overdue", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let second: Value = client
        .post(format!("{}/circulation/process-overdue", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["overdue_count"], second["overdue_count"]);
    assert_eq!(second["fines_created"], 0);
}
