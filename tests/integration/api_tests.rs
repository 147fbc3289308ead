//! API integration tests
//!
//! These run against a live server backed by a fresh database, started
//! without a shared password.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:5055/api";

/// Register a throwaway account and return its bearer token
async fn register(client: &Client) -> (String, Value) {
    let username = format!("it_{}", &Uuid::new_v4().simple().to_string()[..12]);
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "testpassword123",
            "full_name": "Integration Test"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse register response");
    let token = body["access_token"]
        .as_str()
        .expect("No token in response")
        .to_string();
    (token, body["user"].clone())
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
async fn test_auth_status() {
    let client = Client::new();

    let response = client
        .get(format!("{}/auth/status", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["auth_enabled"].is_boolean());
    assert!(body["message"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_register_login_and_me() {
    let client = Client::new();
    let (_, user) = register(&client).await;
    let username = user["username"].as_str().expect("username").to_string();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username.to_uppercase(),
            "password": "testpassword123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().expect("token").to_string();

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let me: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(me["username"], username);
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "nobody-here",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_change_password() {
    let client = Client::new();
    let (token, _) = register(&client).await;

    let response = client
        .post(format!("{}/auth/change-password", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "current_password": "not-the-password",
            "new_password": "another-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/auth/change-password", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "current_password": "testpassword123",
            "new_password": "another-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Password changed successfully");
}

#[tokio::test]
#[ignore]
async fn test_notebook_lifecycle() {
    let client = Client::new();
    let (token, _) = register(&client).await;

    // Create
    let response = client
        .post(format!("{}/notebooks", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Integration notebook",
            "description": "Created by the test suite"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let notebook: Value = response.json().await.expect("Failed to parse response");
    let id = notebook["id"].as_str().expect("notebook id").to_string();
    assert_eq!(notebook["source_count"], 0);
    assert_eq!(notebook["note_count"], 0);

    // Listed for its owner
    let response = client
        .get(format!("{}/notebooks?order_by=name%20asc", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let list: Value = response.json().await.expect("Failed to parse response");
    assert!(list
        .as_array()
        .expect("array")
        .iter()
        .any(|n| n["id"] == id.as_str()));

    // Hidden from another user
    let (other_token, _) = register(&client).await;
    let response = client
        .get(format!("{}/notebooks/{}", BASE_URL, id))
        .bearer_auth(&other_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Archive
    let response = client
        .put(format!("{}/notebooks/notebook:{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({"archived": true}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["archived"], true);
    assert_eq!(updated["name"], "Integration notebook");

    // Linking an unknown source
    let response = client
        .post(format!("{}/notebooks/{}/sources/{}", BASE_URL, id, Uuid::new_v4()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Delete
    let response = client
        .delete(format!("{}/notebooks/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/notebooks/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
