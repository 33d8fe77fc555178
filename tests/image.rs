mod common;

use async_trait::async_trait;
use common::{spawn_app, spawn_app_with, CUP_DIR};
use oxford_catalog::services::archive::{self, ArchiveBuilder};
use oxford_catalog::storage::{FileStore, MemoryStore, StoreError};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

const JPEG_A: &[u8] = b"\xff\xd8\xff\xe0 image a";
const JPEG_B: &[u8] = b"\xff\xd8\xff\xe0 image b";

fn paths(rows: &[Value]) -> Vec<String> {
    rows.iter()
        .map(|r| r["imagePath"].as_str().unwrap().to_string())
        .collect()
}

async fn product_images(app: &common::TestApp, purpose: &str) -> Vec<Value> {
    let response = app
        .get(&format!("/Image/Product/000123/{purpose}"))
        .send()
        .await
        .unwrap();
    if response.status() == StatusCode::NOT_FOUND {
        return Vec::new();
    }
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_replace_product_images() {
    let app = spawn_app().await;
    app.seed_cup().await;

    let response = app
        .replace_images("000123", "PRODUTO", &[("a.jpg", JPEG_A), ("b.jpg", JPEG_B)])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = product_images(&app, "PRODUTO").await;
    assert_eq!(
        paths(&rows),
        [format!("{CUP_DIR}/a.jpg"), format!("{CUP_DIR}/b.jpg")]
    );
    assert_eq!(rows[0]["sequence"], 1);
    assert_eq!(rows[0]["imageMain"], true);
    assert_eq!(rows[1]["sequence"], 2);
    assert_eq!(rows[1]["imageMain"], false);
    assert_eq!(rows[1]["finalidade"], "PRODUTO");

    assert_eq!(app.store.get(&format!("{CUP_DIR}/a.jpg")).unwrap(), JPEG_A);
    assert_eq!(app.store.get(&format!("{CUP_DIR}/b.jpg")).unwrap(), JPEG_B);

    assert!(product_images(&app, "DECORACAO").await.is_empty());
    assert_eq!(product_images(&app, "TODOS").await.len(), 2);
}

#[tokio::test]
async fn test_replacing_twice_is_idempotent() {
    let app = spawn_app().await;
    app.seed_cup().await;
    let files: [(&str, &[u8]); 2] = [("a.jpg", JPEG_A), ("b.jpg", JPEG_B)];

    app.replace_images("000123", "PRODUTO", &files).await;
    let first = product_images(&app, "PRODUTO").await;
    app.replace_images("000123", "PRODUTO", &files).await;
    let second = product_images(&app, "PRODUTO").await;

    assert_eq!(paths(&first), paths(&second));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a["sequence"], b["sequence"]);
        assert_eq!(a["imageMain"], b["imageMain"]);
    }
    assert_eq!(app.store.paths().len(), 2);
}

#[tokio::test]
async fn test_replacement_reuses_directory_and_drops_old_files() {
    let app = spawn_app().await;
    app.seed_cup().await;
    app.replace_images("000123", "PRODUTO", &[("a.jpg", JPEG_A), ("b.jpg", JPEG_B)])
        .await;

    // The taxonomy changes, but existing images pin the directory.
    app.seed_oxford("000123", "Canecas", "Linha A", "Classic", "Floral Clássico")
        .await;
    let response = app
        .client
        .post(app.url("/Image/UpdateProductImages/000123/PRODUTO"))
        .bearer_auth(&app.token)
        .multipart(reqwest::multipart::Form::new().part(
            "files",
            reqwest::multipart::Part::bytes(JPEG_A.to_vec())
                .file_name("copo azul.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = product_images(&app, "PRODUTO").await;
    assert_eq!(paths(&rows), [format!("{CUP_DIR}/copo_azul.jpg")]);
    assert_eq!(app.store.paths(), [format!("{CUP_DIR}/copo_azul.jpg")]);
}

#[tokio::test]
async fn test_replace_rejections() {
    let app = spawn_app().await;
    app.seed_cup().await;
    app.seed_product("000124", "Sem Taxonomia").await;

    let todos = app.replace_images("000123", "TODOS", &[("a.jpg", JPEG_A)]).await;
    assert_eq!(todos.status(), StatusCode::BAD_REQUEST);

    let unknown_purpose = app.replace_images("000123", "OUTRO", &[("a.jpg", JPEG_A)]).await;
    assert_eq!(unknown_purpose.status(), StatusCode::BAD_REQUEST);

    let unknown = app.replace_images("999999", "PRODUTO", &[("a.jpg", JPEG_A)]).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let no_files = app.replace_images("000123", "PRODUTO", &[]).await;
    assert_eq!(no_files.status(), StatusCode::BAD_REQUEST);

    let no_taxonomy = app.replace_images("000124", "PRODUTO", &[("a.jpg", JPEG_A)]).await;
    assert_eq!(no_taxonomy.status(), StatusCode::NOT_FOUND);

    let text = app
        .post("/Image/ReplaceProductImages/000123/PRODUTO")
        .multipart(reqwest::multipart::Form::new().part(
            "files",
            reqwest::multipart::Part::bytes(b"hello".to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(text.status(), StatusCode::BAD_REQUEST);

    assert!(product_images(&app, "TODOS").await.is_empty());
    assert!(app.store.paths().is_empty());
}

/// Writes through to memory, except for files with the poisoned name.
struct FailingStore {
    inner: Arc<MemoryStore>,
    poisoned: &'static str,
}

#[async_trait]
impl FileStore for FailingStore {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<(), StoreError> {
        if path.ends_with(self.poisoned) {
            return Err(StoreError::Transient(format!("connection reset on {path}")));
        }
        self.inner.upload(path, data).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.download(path).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        self.inner.exists(path).await
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list(dir).await
    }

    async fn make_dir(&self, dir: &str) -> Result<(), StoreError> {
        self.inner.make_dir(dir).await
    }
}

#[tokio::test]
async fn test_failed_upload_rolls_back_rows() {
    let memory = Arc::new(MemoryStore::new());
    let store = Arc::new(FailingStore {
        inner: memory.clone(),
        poisoned: "broken.jpg",
    });
    let app = spawn_app_with(memory, store).await;
    app.seed_cup().await;

    let first = app.replace_images("000123", "PRODUTO", &[("a.jpg", JPEG_A)]).await;
    assert_eq!(first.status(), StatusCode::OK);
    let before = product_images(&app, "PRODUTO").await;

    let failed = app
        .replace_images("000123", "PRODUTO", &[("b.jpg", JPEG_B), ("broken.jpg", JPEG_A)])
        .await;
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = failed.json().await.unwrap();
    assert_eq!(body["error"], "Internal server error");

    let after = product_images(&app, "PRODUTO").await;
    assert_eq!(paths(&before), paths(&after));
    assert_eq!(before[0]["id"], after[0]["id"]);

    let id = after[0]["id"].as_i64().unwrap();
    let file = app.get(&format!("/Image/{id}/file")).send().await.unwrap();
    assert_eq!(file.status(), StatusCode::OK);
    assert_eq!(file.bytes().await.unwrap().as_ref(), JPEG_A);
    assert_eq!(app.store.paths(), [format!("{CUP_DIR}/a.jpg")]);

    let replaced = app.replace_images("000123", "PRODUTO", &[("b.jpg", JPEG_B)]).await;
    assert_eq!(replaced.status(), StatusCode::OK);
    assert_eq!(app.store.paths(), [format!("{CUP_DIR}/b.jpg")]);
}

fn zipped_base64(name: &str, data: &[u8]) -> String {
    let mut builder = ArchiveBuilder::new();
    builder.add(name, data).unwrap();
    archive::encode_base64(&builder.finish().unwrap())
}

#[tokio::test]
async fn test_base64_import_round_trip() {
    let app = spawn_app().await;
    app.seed_cup().await;

    let response = app
        .post("/Image/ReplaceProductImages/Base64")
        .json(&json!({
            "productId": "000123",
            "finalidade": "DECORACAO",
            "base64Images": [zipped_base64("fotos/mesa.jpg", JPEG_B)]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = product_images(&app, "DECORACAO").await;
    let expected = "Copos/Linha_A/Classic/Floral_Clássico/000123/DECORACAO/mesa.jpg";
    assert_eq!(paths(&rows), [expected]);
    assert_eq!(app.store.get(expected).unwrap(), JPEG_B);
}

#[tokio::test]
async fn test_base64_import_rejects_bad_payloads() {
    let app = spawn_app().await;
    app.seed_cup().await;

    let send = |images: Value| {
        app.post("/Image/ReplaceProductImages/Base64")
            .json(&json!({ "productId": "000123", "finalidade": "PRODUTO", "base64Images": images }))
            .send()
    };

    let not_base64 = send(json!(["***"])).await.unwrap();
    assert_eq!(not_base64.status(), StatusCode::BAD_REQUEST);
    let body: Value = not_base64.json().await.unwrap();
    assert_eq!(body["error"], "Image is not valid base64");

    let not_zip = send(json!([archive::encode_base64(b"plain bytes")])).await.unwrap();
    assert_eq!(not_zip.status(), StatusCode::BAD_REQUEST);
    let body: Value = not_zip.json().await.unwrap();
    assert_eq!(body["error"], "Image is not a valid zip archive");

    let empty_zip = send(json!([archive::encode_base64(&ArchiveBuilder::new().finish().unwrap())]))
        .await
        .unwrap();
    assert_eq!(empty_zip.status(), StatusCode::BAD_REQUEST);
    let body: Value = empty_zip.json().await.unwrap();
    assert_eq!(body["error"], "Archive does not contain an image");

    let none = send(json!([])).await.unwrap();
    assert_eq!(none.status(), StatusCode::BAD_REQUEST);

    assert!(product_images(&app, "TODOS").await.is_empty());
}

#[tokio::test]
async fn test_bulk_image_rows() {
    let app = spawn_app().await;
    app.seed_cup().await;

    let unknown = app
        .post("/Image")
        .json(&json!([
            { "productId": "000123", "imagePath": "x/a.jpg" },
            { "productId": "999999", "imagePath": "x/b.jpg" }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["error"], "Products not found: 999999");
    assert!(product_images(&app, "TODOS").await.is_empty());

    let two_mains = app
        .post("/Image")
        .json(&json!([
            { "productId": "000123", "imagePath": "x/a.jpg", "imageMain": true },
            { "productId": "000123", "imagePath": "x/b.jpg", "imageMain": true }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(two_mains.status(), StatusCode::BAD_REQUEST);

    let saved = app
        .post("/Image")
        .json(&json!([
            { "productId": "000123", "imagePath": "\\x\\a.jpg", "imageMain": true },
            { "productId": "000123", "imagePath": "x/deco.jpg", "imageMain": true, "finalidade": "DECORACAO", "sequence": 3 }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);
    let body: Value = saved.json().await.unwrap();
    assert_eq!(body["images"].as_array().unwrap().len(), 2);

    let rows = product_images(&app, "PRODUTO").await;
    assert_eq!(paths(&rows), ["x/a.jpg"]);
    assert_eq!(rows[0]["sequence"], 1);

    let id = rows[0]["id"].as_i64().unwrap();
    let one: Value = app.get(&format!("/Image/{id}")).send().await.unwrap().json().await.unwrap();
    assert_eq!(one["imagePath"], "x/a.jpg");
    let missing = app.get("/Image/987654").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_product_images() {
    let app = spawn_app().await;
    app.seed_cup().await;
    app.replace_images("000123", "PRODUTO", &[("a.jpg", JPEG_A), ("b.jpg", JPEG_B)])
        .await;

    let response = app
        .get("/Image/ProductImage/000123/PRODUTO/false")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"produto_000123_imagens.zip\""
    );
    let entries = archive::extract(&response.bytes().await.unwrap()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a.jpg", "b.jpg"]);
    assert_eq!(entries[1].data, JPEG_B);

    let main_only = app
        .get("/Image/ProductImage/000123/TODOS/true")
        .send()
        .await
        .unwrap();
    let entries = archive::extract(&main_only.bytes().await.unwrap()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data, JPEG_A);

    let none = app
        .get("/Image/ProductImage/000123/DECORACAO/false")
        .send()
        .await
        .unwrap();
    assert_eq!(none.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_file() {
    let app = spawn_app().await;
    app.seed_cup().await;
    app.replace_images("000123", "PRODUTO", &[("a.jpg", JPEG_A)]).await;

    let rows = product_images(&app, "PRODUTO").await;
    let id = rows[0]["id"].as_i64().unwrap();

    let response = app.get(&format!("/Image/{id}/file")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(response.bytes().await.unwrap().as_ref(), JPEG_A);

    app.store
        .delete(&format!("{CUP_DIR}/a.jpg"))
        .await
        .unwrap();
    let gone = app.get(&format!("/Image/{id}/file")).send().await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
