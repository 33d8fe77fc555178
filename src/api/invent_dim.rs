use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::TransactionTrait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::extract::{AppJson, AppPath, AppQuery};
use crate::entities::invent_dim;
use crate::error::{AppError, AppResult};
use crate::repositories::InventDimRepository;
use crate::AppState;

//ROUTERS
pub fn invent_dim_router() -> Router {
    Router::new()
        .route("/", post(upsert_invent_dims).put(update_invent_dim))
        .route("/List/:product_id", get(list_invent_dims))
        .route("/:product_id", get(get_invent_dim).delete(delete_invent_dim))
}

//ROUTES
async fn get_invent_dim(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
    AppQuery(keys): AppQuery<DimKeys>,
) -> AppResult<impl IntoResponse> {
    let row = InventDimRepository::find_by_keys(
        state.db.as_ref(),
        &product_id,
        keys.location_id.as_deref(),
        keys.company_id.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("Stock of product {product_id}")))?;
    Ok(Json(row))
}

async fn list_invent_dims(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(InventDimRepository::find_by_product(state.db.as_ref(), &product_id).await?))
}

async fn upsert_invent_dims(
    Extension(state): Extension<AppState>,
    AppJson(rows): AppJson<Vec<invent_dim::Model>>,
) -> AppResult<impl IntoResponse> {
    if rows.is_empty() {
        return Err(AppError::Validation("The stock list is empty".into()));
    }
    if rows.iter().any(|row| row.product_id.trim().is_empty()) {
        return Err(AppError::Validation("Every stock row needs a productId".into()));
    }

    let count = rows.len();
    let txn = state.db.begin().await?;
    for row in rows {
        InventDimRepository::upsert(&txn, row).await?;
    }
    txn.commit().await?;

    info!(count, "Stock rows saved");
    Ok(Json(json!({
        "message": format!("{count} stock rows saved")
    })))
}

async fn update_invent_dim(
    Extension(state): Extension<AppState>,
    AppJson(row): AppJson<invent_dim::Model>,
) -> AppResult<impl IntoResponse> {
    if row.product_id.trim().is_empty() {
        return Err(AppError::Validation("The stock row needs a productId".into()));
    }
    let product_id = row.product_id.clone();

    let saved = InventDimRepository::update(state.db.as_ref(), row)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Stock of product {product_id}")))?;
    Ok(Json(saved))
}

async fn delete_invent_dim(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
    AppQuery(keys): AppQuery<DimKeys>,
) -> AppResult<impl IntoResponse> {
    let deleted = InventDimRepository::delete_by_keys(
        state.db.as_ref(),
        &product_id,
        keys.location_id.as_deref(),
        keys.company_id.as_deref(),
    )
    .await?;
    if !deleted {
        return Err(AppError::not_found(format!("Stock of product {product_id}")));
    }
    Ok(Json(json!({
        "message": "Stock deleted"
    })))
}

//STRUCTS
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DimKeys {
    location_id: Option<String>,
    company_id: Option<String>,
}
