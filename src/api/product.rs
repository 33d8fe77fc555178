use axum::{
    extract::Extension,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::TransactionTrait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::extract::{AppJson, AppPath, AppQuery, OptionalJson};
use crate::config::AuthConfig;
use crate::entities::product;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{auth_middleware, shared_token_middleware};
use crate::repositories::{ProductFilter, ProductRepository, SearchParams};
use crate::services::{catalog, sync};
use crate::AppState;

const PRODUCT_ID_MAX_LEN: usize = 20;

//ROUTERS
pub fn product_router(auth: Arc<AuthConfig>) -> Router {
    Router::new()
        .route("/", get(list_products).post(upsert_products))
        .route("/Search", get(search_products))
        .route("/AppSearch", post(app_search))
        .route("/AppProduct/:id", get(app_product))
        .route("/productData/:id", get(product_data))
        .route("/productDataRange/:offset", get(product_data_range))
        .route("/productsData", post(products_data))
        .route("/Details", get(product_details))
        .route("/ProductOxford", post(product_oxford))
        .route("/ProductOxfordDetails", post(product_oxford_details))
        .route(
            "/:id",
            get(get_product).put(replace_product).delete(delete_product),
        )
        .route_layer(from_fn_with_state(auth.clone(), auth_middleware))
        .route(
            "/sync",
            post(sync_images).route_layer(from_fn_with_state(auth, shared_token_middleware)),
        )
}

//ROUTES
async fn list_products(Extension(state): Extension<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(ProductRepository::find_all(state.db.as_ref()).await?))
}

async fn search_products(
    Extension(state): Extension<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(ProductRepository::search(state.db.as_ref(), &params).await?))
}

async fn app_search(
    Extension(state): Extension<AppState>,
    AppJson(filter): AppJson<ProductFilter>,
) -> AppResult<impl IntoResponse> {
    filter.validate()?;
    let response = catalog::app_search(
        state.db.as_ref(),
        state.store.as_ref(),
        &filter,
        state.bundle_skip_failed,
    )
    .await?;
    Ok(Json(response))
}

async fn app_product(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let product = catalog::app_product(
        state.db.as_ref(),
        state.store.as_ref(),
        &id,
        state.bundle_skip_failed,
    )
    .await?;
    Ok(Json(product))
}

async fn get_product(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let product = ProductRepository::find_by_id(state.db.as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(product))
}

/// Creates missing products and refreshes name and barcode of known ones.
async fn upsert_products(
    Extension(state): Extension<AppState>,
    AppJson(products): AppJson<Vec<product::Model>>,
) -> AppResult<impl IntoResponse> {
    if products.is_empty() {
        return Err(AppError::Validation("The product list is empty".into()));
    }
    for product in &products {
        check_product_id(&product.product_id)?;
    }

    let count = products.len();
    let txn = state.db.begin().await?;
    for mut product in products {
        product.product_id = product.product_id.trim().to_string();
        ProductRepository::upsert(&txn, product).await?;
    }
    txn.commit().await?;

    info!(count, "Products saved");
    Ok(Json(json!({
        "message": format!("{count} products saved")
    })))
}

async fn replace_product(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(product): AppJson<product::Model>,
) -> AppResult<impl IntoResponse> {
    if product.product_id != id {
        return Err(AppError::Validation(
            "The product id in the body does not match the path".into(),
        ));
    }
    check_product_id(&product.product_id)?;

    let saved = ProductRepository::replace(state.db.as_ref(), product)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(saved))
}

async fn delete_product(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    if !ProductRepository::delete(state.db.as_ref(), &id).await? {
        return Err(AppError::not_found(format!("Product {id}")));
    }
    info!(product_id = %id, "Product deleted");
    Ok(Json(json!({
        "message": "Product deleted"
    })))
}

async fn product_data(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(catalog::product_data(state.db.as_ref(), &id).await?))
}

async fn product_data_range(
    Extension(state): Extension<AppState>,
    AppPath(offset): AppPath<u32>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(catalog::product_data_range(state.db.as_ref(), offset).await?))
}

async fn products_data(
    Extension(state): Extension<AppState>,
    AppJson(product_ids): AppJson<Vec<String>>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(catalog::products_data(state.db.as_ref(), &product_ids).await?))
}

async fn product_details(
    Extension(state): Extension<AppState>,
    AppQuery(query): AppQuery<DetailsQuery>,
) -> AppResult<impl IntoResponse> {
    let location_id = query.location_id.trim();
    if location_id.is_empty() {
        return Err(AppError::Validation("location_id is required".into()));
    }
    let details = catalog::product_details(state.db.as_ref(), query.status, location_id).await?;
    Ok(Json(details))
}

async fn product_oxford(
    Extension(state): Extension<AppState>,
    AppJson(filter): AppJson<ProductFilter>,
) -> AppResult<impl IntoResponse> {
    filter.validate()?;
    Ok(Json(catalog::product_oxford(state.db.as_ref(), &filter).await?))
}

async fn product_oxford_details(
    Extension(state): Extension<AppState>,
    AppJson(product_ids): AppJson<Vec<String>>,
) -> AppResult<impl IntoResponse> {
    let details = catalog::product_oxford_details(state.db.as_ref(), &product_ids).await?;
    Ok(Json(details))
}

async fn sync_images(
    Extension(state): Extension<AppState>,
    OptionalJson(product_ids): OptionalJson<Vec<String>>,
) -> AppResult<impl IntoResponse> {
    let legacy = state
        .legacy_store
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Legacy image server is not configured".into()))?;
    let product_ids = product_ids.unwrap_or_default();

    let copied = sync::sync_legacy_images(
        state.db.as_ref(),
        legacy.as_ref(),
        state.store.as_ref(),
        &product_ids,
    )
    .await?;
    Ok((StatusCode::OK, Json(json!({ "copied": copied }))))
}

fn check_product_id(product_id: &str) -> AppResult<()> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err(AppError::Validation("Every product needs a productId".into()));
    }
    if product_id.chars().count() > PRODUCT_ID_MAX_LEN {
        return Err(AppError::Validation(format!(
            "productId {product_id} is longer than {PRODUCT_ID_MAX_LEN} characters"
        )));
    }
    Ok(())
}

//STRUCTS
#[derive(Debug, Deserialize)]
struct DetailsQuery {
    #[serde(default = "active")]
    status: bool,
    #[serde(default)]
    location_id: String,
}

fn active() -> bool {
    true
}
