mod common;

use common::{spawn_app, PASSWORD, SHARED_TOKEN, USERNAME};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_requires_shared_token() {
    let app = spawn_app().await;
    let payload = json!({ "username": "newcomer", "password": "secret" });

    let missing = app
        .client
        .post(app.url("/User/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let jwt = app.post("/User/register").json(&payload).send().await.unwrap();
    assert_eq!(jwt.status(), StatusCode::UNAUTHORIZED);

    let shared = app
        .client
        .post(app.url("/User/register"))
        .bearer_auth(SHARED_TOKEN)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(shared.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_rejects_blank_and_duplicate_users() {
    let app = spawn_app().await;

    let blank = app
        .client
        .post(app.url("/User/register"))
        .bearer_auth(SHARED_TOKEN)
        .json(&json!({ "username": "  ", "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let duplicate = app
        .client
        .post(app.url("/User/register"))
        .bearer_auth(SHARED_TOKEN)
        .json(&json!({ "username": USERNAME, "password": "another" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    let body: Value = duplicate.json().await.unwrap();
    assert_eq!(body["error"], "Username already exists");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;

    let wrong = app
        .client
        .post(app.url("/User/login"))
        .json(&json!({ "username": USERNAME, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = app
        .client
        .post(app.url("/User/login"))
        .json(&json!({ "username": "nobody", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_routes_require_valid_jwt() {
    let app = spawn_app().await;

    let anonymous = app.client.get(app.url("/Product")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let body: Value = anonymous.json().await.unwrap();
    assert_eq!(body["error"], "Missing bearer token");

    let forged = app
        .client
        .get(app.url("/Tag"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let shared = app
        .client
        .get(app.url("/Oxford"))
        .bearer_auth(SHARED_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(shared.status(), StatusCode::UNAUTHORIZED);

    let authorized = app.get("/Product").send().await.unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);
}
