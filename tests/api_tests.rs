mod common;

use blog_backend::create_router;
use common::{InMemoryRepository, test_state};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let router = create_router(test_state(InMemoryRepository::new()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", app.address);

    // 1. Register
    let res = client
        .post(format!("{api}/users/register"))
        .json(&json!({ "name": "testuser", "email": "a@test.com", "password": "testpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // 2. Login
    let res = client
        .post(format!("{api}/users/login"))
        .json(&json!({ "email": "a@test.com", "password": "testpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // 3. Create
    let res = client
        .post(format!("{api}/posts"))
        .bearer_auth(&token)
        .json(&json!({ "title": "First post", "content": "Hello", "isHidden": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();

    // 4. Update
    let res = client
        .put(format!("{api}/posts"))
        .bearer_auth(&token)
        .json(&json!({ "id": id, "title": "Edited", "content": "Hello again", "isHidden": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The author still reads their hidden post.
    let res = client
        .get(format!("{api}/posts?id={id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Edited");
    assert_eq!(body["isHidden"], true);

    // 5. Delete
    let res = client
        .delete(format!("{api}/posts"))
        .bearer_auth(&token)
        .json(&json!({ "id": id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{api}/posts?id={id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_without_token_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/users", app.address))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "AUTH_WRONG_TYPE" }));
}
