use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::TransactionTrait;
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::extract::{AppJson, AppPath};
use crate::entities::oxford;
use crate::error::{AppError, AppResult};
use crate::repositories::{OxfordRepository, ProductFilter};
use crate::services::catalog;
use crate::AppState;

//ROUTERS
pub fn oxford_router() -> Router {
    Router::new()
        .route("/", get(list_oxfords).post(upsert_oxfords))
        .route("/Filter", post(filter_oxfords))
        .route(
            "/:product_id",
            get(get_oxford).put(update_oxford).delete(delete_oxford),
        )
}

//ROUTES
async fn list_oxfords(Extension(state): Extension<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(OxfordRepository::find_all(state.db.as_ref()).await?))
}

async fn get_oxford(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let oxford = OxfordRepository::find_by_product(state.db.as_ref(), &product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Taxonomy of product {product_id}")))?;
    Ok(Json(oxford))
}

async fn upsert_oxfords(
    Extension(state): Extension<AppState>,
    AppJson(rows): AppJson<Vec<oxford::Model>>,
) -> AppResult<impl IntoResponse> {
    if rows.is_empty() {
        return Err(AppError::Validation("The taxonomy list is empty".into()));
    }
    if rows.iter().any(|row| row.product_id.trim().is_empty()) {
        return Err(AppError::Validation("Every taxonomy row needs a productId".into()));
    }

    let count = rows.len();
    let txn = state.db.begin().await?;
    for row in rows {
        OxfordRepository::upsert(&txn, row).await?;
    }
    txn.commit().await?;

    info!(count, "Taxonomy rows saved");
    Ok(Json(json!({
        "message": format!("{count} taxonomy rows saved")
    })))
}

async fn update_oxford(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
    AppJson(row): AppJson<oxford::Model>,
) -> AppResult<impl IntoResponse> {
    if row.product_id != product_id {
        return Err(AppError::Validation(
            "The product id in the body does not match the path".into(),
        ));
    }
    if OxfordRepository::find_by_product(state.db.as_ref(), &product_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("Taxonomy of product {product_id}")));
    }

    Ok(Json(OxfordRepository::upsert(state.db.as_ref(), row).await?))
}

async fn delete_oxford(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    if OxfordRepository::delete_by_product(state.db.as_ref(), &product_id).await? == 0 {
        return Err(AppError::not_found(format!("Taxonomy of product {product_id}")));
    }
    Ok(Json(json!({
        "message": "Taxonomy deleted"
    })))
}

async fn filter_oxfords(
    Extension(state): Extension<AppState>,
    AppJson(filter): AppJson<ProductFilter>,
) -> AppResult<impl IntoResponse> {
    filter.validate()?;
    Ok(Json(catalog::oxford_filter(state.db.as_ref(), &filter).await?))
}
