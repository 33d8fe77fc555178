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
use crate::entities::tax_information;
use crate::error::{AppError, AppResult};
use crate::repositories::TaxInformationRepository;
use crate::AppState;

//ROUTERS
pub fn tax_information_router() -> Router {
    Router::new()
        .route("/", get(list_tax_information).post(upsert_tax_information))
        .route(
            "/:product_id",
            get(get_tax_information).put(update_tax_information).delete(delete_tax_information),
        )
}

//ROUTES
async fn list_tax_information(Extension(state): Extension<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(TaxInformationRepository::find_all(state.db.as_ref()).await?))
}

async fn get_tax_information(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let oxford = TaxInformationRepository::find_by_product(state.db.as_ref(), &product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tax information of product {product_id}")))?;
    Ok(Json(oxford))
}

async fn upsert_tax_information(
    Extension(state): Extension<AppState>,
    AppJson(rows): AppJson<Vec<tax_information::Model>>,
) -> AppResult<impl IntoResponse> {
    if rows.is_empty() {
        return Err(AppError::Validation("The tax information list is empty".into()));
    }
    if rows.iter().any(|row| row.product_id.trim().is_empty()) {
        return Err(AppError::Validation("Every tax information row needs a productId".into()));
    }

    let count = rows.len();
    let txn = state.db.begin().await?;
    for row in rows {
        TaxInformationRepository::upsert(&txn, row).await?;
    }
    txn.commit().await?;

    info!(count, "Tax information saved");
    Ok(Json(json!({
        "message": format!("{count} tax information rows saved")
    })))
}

async fn update_tax_information(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
    AppJson(row): AppJson<tax_information::Model>,
) -> AppResult<impl IntoResponse> {
    if row.product_id != product_id {
        return Err(AppError::Validation(
            "The product id in the body does not match the path".into(),
        ));
    }
    if TaxInformationRepository::find_by_product(state.db.as_ref(), &product_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found(format!("Tax information of product {product_id}")));
    }

    Ok(Json(TaxInformationRepository::upsert(state.db.as_ref(), row).await?))
}

async fn delete_tax_information(
    Extension(state): Extension<AppState>,
    AppPath(product_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    if TaxInformationRepository::delete_by_product(state.db.as_ref(), &product_id).await? == 0 {
        return Err(AppError::not_found(format!("Tax information of product {product_id}")));
    }
    Ok(Json(json!({
        "message": "Tax information deleted"
    })))
}
