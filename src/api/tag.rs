use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::TransactionTrait;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use super::extract::{AppJson, AppPath};
use crate::entities::tag;
use crate::error::{AppError, AppResult};
use crate::repositories::{ProductRepository, TagRepository};
use crate::AppState;

//ROUTERS
pub fn tag_router() -> Router {
    Router::new()
        .route("/", get(list_tags).post(replace_tags))
        .route("/:id", get(get_tag))
        .route("/Product/:product_id", get(get_product_tags))
}

//ROUTES
async fn list_tags(Extension(state): Extension<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(TagRepository::find_all(state.db.as_ref()).await?))
}

async fn get_tag(
    Extension(state): Extension<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let tag = TagRepository::find_by_id(state.db.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tag {id}")))?;
    Ok(Json(tag))
}

async fn get_product_tags(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let tags = TagRepository::find_by_product(state.db.as_ref(), &product_id).await?;
    if tags.is_empty() {
        return Err(AppError::NotFound(format!("No tag found for product {product_id}")));
    }
    Ok(Json(tags))
}

/// The tags sent for a product become its whole tag set.
async fn replace_tags(
    Extension(state): Extension<AppState>,
    AppJson(tags): AppJson<Vec<tag::Model>>,
) -> AppResult<impl IntoResponse> {
    if tags.is_empty() {
        return Err(AppError::Validation("No tag was sent".into()));
    }
    if tags
        .iter()
        .any(|t| t.product_id.trim().is_empty() || t.tag.trim().is_empty())
    {
        return Err(AppError::Validation(
            "Every tag needs a productId and a valueTag".into(),
        ));
    }

    let mut by_product: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for t in tags {
        by_product
            .entry(t.product_id.trim().to_string())
            .or_default()
            .push(t.tag);
    }

    let product_ids: Vec<String> = by_product.keys().cloned().collect();
    let found: HashSet<String> = ProductRepository::find_by_ids(state.db.as_ref(), &product_ids)
        .await?
        .into_iter()
        .map(|p| p.product_id)
        .collect();
    let missing: Vec<&str> = product_ids
        .iter()
        .filter(|id| !found.contains(*id))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::NotFound(format!(
            "Products not found: {}",
            missing.join(", ")
        )));
    }

    let txn = state.db.begin().await?;
    let mut saved = Vec::new();
    for (product_id, values) in &by_product {
        saved.extend(TagRepository::replace_for_product(&txn, product_id, values).await?);
    }
    txn.commit().await?;

    info!(products = by_product.len(), tags = saved.len(), "Product tags replaced");
    Ok(Json(saved))
}
