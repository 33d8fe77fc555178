use axum::{
    extract::{Extension, Multipart},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::extract::{AppJson, AppPath};
use crate::entities::image::PurposeFilter;
use crate::error::{AppError, AppResult};
use crate::repositories::ImageRepository;
use crate::services::image::{self as images, Base64ImportRequest, NewImage, UploadFile};
use crate::storage::path;
use crate::AppState;

//ROUTERS
pub fn image_router() -> Router {
    Router::new()
        .route("/", post(create_images))
        .route("/:id", get(get_image))
        .route("/:id/file", get(get_image_file))
        .route("/Product/:product_id/:purpose", get(get_product_images))
        .route("/ProductImage/:product_id/:purpose/:main", get(download_product_images))
        .route("/ReplaceProductImages/Base64", post(replace_images_base64))
        .route("/ReplaceProductImages/:product_id/:purpose", post(replace_images))
        .route("/UpdateProductImages/:product_id/:purpose", post(replace_images))
}

//ROUTES
async fn create_images(
    Extension(state): Extension<AppState>,
    AppJson(payload): AppJson<Vec<NewImage>>,
) -> AppResult<impl IntoResponse> {
    let saved = images::create_or_replace_images(state.db.as_ref(), payload).await?;
    Ok(Json(json!({
        "message": format!("{} images saved", saved.len()),
        "images": saved
    })))
}

async fn get_image(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let image = ImageRepository::find_by_id(state.db.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Image {id}")))?;
    Ok(Json(image))
}

async fn get_image_file(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let (image, data) = images::download_image(state.db.as_ref(), state.store.as_ref(), id).await?;
    let content_type = mime_guess::from_path(&image.image_path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

async fn get_product_images(
    Extension(state): Extension<AppState>,
    AppPath((product_id, purpose)): AppPath<(String, PurposeFilter)>,
) -> AppResult<impl IntoResponse> {
    let rows = ImageRepository::find_by_product(state.db.as_ref(), &product_id, purpose, false).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(format!("No image found for product {product_id}")));
    }
    Ok(Json(rows))
}

async fn download_product_images(
    Extension(state): Extension<AppState>,
    AppPath((product_id, purpose, main)): AppPath<(String, PurposeFilter, bool)>,
) -> AppResult<impl IntoResponse> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err(AppError::Validation("Invalid product".into()));
    }

    let rows = ImageRepository::find_by_product(state.db.as_ref(), product_id, purpose, main).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(format!("No image found for product {product_id}")));
    }

    let zipped = images::bundle_images(state.store.as_ref(), &rows, state.bundle_skip_failed).await?;
    let disposition = format!("attachment; filename=\"produto_{product_id}_imagens.zip\"");

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        zipped,
    ))
}

async fn replace_images(
    Extension(state): Extension<AppState>,
    AppPath((product_id, purpose)): AppPath<(String, PurposeFilter)>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let files = read_files(multipart).await?;
    let saved = images::replace_product_images(
        state.db.as_ref(),
        state.store.as_ref(),
        &product_id,
        purpose,
        files,
    )
    .await?;

    Ok(Json(json!({
        "message": "Images replaced",
        "images": saved
    })))
}

async fn replace_images_base64(
    Extension(state): Extension<AppState>,
    AppJson(request): AppJson<Base64ImportRequest>,
) -> AppResult<impl IntoResponse> {
    let saved = images::import_base64_images(state.db.as_ref(), state.store.as_ref(), request).await?;
    Ok(Json(json!({
        "message": "Images replaced",
        "images": saved
    })))
}

/// File parts of a multipart body. Plain form fields are ignored and only
/// image content types are accepted.
async fn read_files(mut multipart: Multipart) -> AppResult<Vec<UploadFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let content_type = match field.content_type() {
            Some(content_type) => content_type.to_owned(),
            None => mime_guess::from_path(&name)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_owned(),
        };
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported content type {content_type} for {}",
                path::file_name(&name)
            )));
        }

        let data = field.bytes().await?;
        files.push(UploadFile {
            name,
            data: data.to_vec(),
        });
    }
    Ok(files)
}

const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
];
