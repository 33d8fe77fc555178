#![allow(dead_code)]

use oxford_catalog::config::AuthConfig;
use oxford_catalog::entities::setup_schema;
use oxford_catalog::storage::{FileStore, MemoryStore};
use oxford_catalog::{create_api_router, AppState};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use sea_orm::Database;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub const SHARED_TOKEN: &str = "shared-test-token";
pub const USERNAME: &str = "erp";
pub const PASSWORD: &str = "Muzion15";

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub token: String,
    pub store: Arc<MemoryStore>,
    pub legacy: Arc<MemoryStore>,
    _db_dir: TempDir,
}

/// Serves the router on a random port with a fresh SQLite file and
/// in-memory stores, and logs a user in.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    spawn_app_with(store.clone(), store).await
}

/// Like [`spawn_app`], but the handlers write through `files`, which is
/// expected to be backed by `store`.
pub async fn spawn_app_with(store: Arc<MemoryStore>, files: Arc<dyn FileStore>) -> TestApp {
    let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", db_dir.path().join("catalog.db").display());
    let db = Database::connect(&db_url)
        .await
        .expect("Failed to open test database");
    setup_schema(&db).await.expect("Failed to create schema");

    let legacy = Arc::new(MemoryStore::new());
    let state = AppState {
        db: Arc::new(db),
        store: files,
        legacy_store: Some(legacy.clone() as Arc<dyn FileStore>),
        auth: Arc::new(AuthConfig {
            jwt_key: "integration-test-key".into(),
            issuer: "oxford-catalog".into(),
            audience: "oxford-apps".into(),
            shared_token: SHARED_TOKEN.into(),
        }),
        bundle_skip_failed: true,
        upload_size_limit: 20 * 1024 * 1024,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = format!("http://{}", listener.local_addr().unwrap());
    let app = create_api_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::new();
    let register = client
        .post(format!("{address}/v1/User/register"))
        .bearer_auth(SHARED_TOKEN)
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(register.status(), StatusCode::CREATED);

    let login = client
        .post(format!("{address}/v1/User/login"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(login.status(), StatusCode::OK);
    let body: Value = login.json().await.expect("Failed to parse login response");
    let token = body["token"]
        .as_str()
        .expect("Token not found in login response")
        .to_string();

    TestApp {
        address,
        client,
        token,
        store,
        legacy,
        _db_dir: db_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.address, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client
            .put(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    pub async fn seed_products(&self, products: Value) {
        let response = self.post("/Product").json(&products).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    pub async fn seed_product(&self, product_id: &str, name: &str) {
        self.seed_products(json!([{ "productId": product_id, "productName": name, "barcode": format!("789{product_id}") }]))
            .await;
    }

    /// Taxonomy with the given family, brand, line and decoration
    /// descriptions; every other dimension gets a placeholder.
    pub async fn seed_oxford(&self, product_id: &str, family: &str, brand: &str, line: &str, decoration: &str) {
        let row = json!({
            "productId": product_id,
            "familyId": "F01",
            "familyDescription": family,
            "brandId": "B01",
            "brandDescription": brand,
            "lineId": "L01",
            "lineDescription": line,
            "decorationId": "D01",
            "decorationDescription": decoration,
            "typeId": "T01",
            "processId": "P01",
            "situationId": "S01",
            "qualityId": "Q01",
            "baseProductId": "BP01",
            "baseProductDescription": format!("{family} {decoration}"),
            "productGroupId": "G01"
        });
        let response = self.post("/Oxford").json(&json!([row])).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Product 000123 with a complete taxonomy, ready for image uploads.
    pub async fn seed_cup(&self) {
        self.seed_product("000123", "Copo Floral").await;
        self.seed_oxford("000123", "Copos", "Linha A", "Classic", "Floral Clássico")
            .await;
    }

    pub async fn replace_images(&self, product_id: &str, purpose: &str, files: &[(&str, &[u8])]) -> reqwest::Response {
        let mut form = reqwest::multipart::Form::new();
        for (name, data) in files {
            let part = reqwest::multipart::Part::bytes(data.to_vec())
                .file_name(name.to_string())
                .mime_str("image/jpeg")
                .unwrap();
            form = form.part("files", part);
        }
        self.post(&format!("/Image/ReplaceProductImages/{product_id}/{purpose}"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

pub const CUP_DIR: &str = "Copos/Linha_A/Classic/Floral_Clássico/000123/PRODUTO";
