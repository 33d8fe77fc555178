use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::TransactionTrait;
use serde_json::json;
use tracing::info;

use super::extract::{AppJson, AppPath};
use crate::entities::invent;
use crate::error::{AppError, AppResult};
use crate::repositories::InventRepository;
use crate::AppState;

//ROUTERS
pub fn invent_router() -> Router {
    Router::new()
        .route("/", get(list_invents).post(upsert_invents))
        .route(
            "/:product_id",
            get(get_invent).put(update_invent).delete(delete_invent),
        )
}

//ROUTES
async fn list_invents(Extension(state): Extension<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(InventRepository::find_all(state.db.as_ref()).await?))
}

async fn get_invent(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let oxford = InventRepository::find_by_product(state.db.as_ref(), &product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Physical attributes of product {product_id}")))?;
    Ok(Json(oxford))
}

async fn upsert_invents(
    Extension(state): Extension<AppState>,
    AppJson(rows): AppJson<Vec<invent::Model>>,
) -> AppResult<impl IntoResponse> {
    if rows.is_empty() {
        return Err(AppError::Validation("The physical attribute list is empty".into()));
    }
    if rows.iter().any(|row| row.product_id.trim().is_empty()) {
        return Err(AppError::Validation("Every physical attribute row needs a productId".into()));
    }

    let count = rows.len();
    let txn = state.db.begin().await?;
    for row in rows {
        InventRepository::upsert(&txn, row).await?;
    }
    txn.commit().await?;

    info!(count, "Physical attributes saved");
    Ok(Json(json!({
        "message": format!("{count} physical attribute rows saved")
    })))
}

async fn update_invent(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
    AppJson(row): AppJson<invent::Model>,
) -> AppResult<impl IntoResponse> {
    if row.product_id != product_id {
        return Err(AppError::Validation(
            "The product id in the body does not match the path".into(),
        ));
    }
    if InventRepository::find_by_product(state.db.as_ref(), &product_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("Physical attributes of product {product_id}")));
    }

    Ok(Json(InventRepository::upsert(state.db.as_ref(), row).await?))
}

async fn delete_invent(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    if InventRepository::delete_by_product(state.db.as_ref(), &product_id).await? == 0 {
        return Err(AppError::not_found(format!("Physical attributes of product {product_id}")));
    }
    Ok(Json(json!({
        "message": "Physical attributes deleted"
    })))
}
