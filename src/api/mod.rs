pub mod extract;
pub mod image;
pub mod invent;
pub mod invent_dim;
pub mod oxford;
pub mod product;
pub mod tag;
pub mod tax_information;
pub mod user;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower_http::trace::TraceLayer;

use image::image_router;
use invent::invent_router;
use invent_dim::invent_dim_router;
use oxford::oxford_router;
use product::product_router;
use tag::tag_router;
use tax_information::tax_information_router;
use user::user_router;

use crate::middleware::auth::auth_middleware;
use crate::middleware::logging::logging_middleware;
use crate::AppState;

/// Every route lives under `/v1`. Apart from the `User` routes and the
/// legacy sync, which carry their own gates, requests need a valid JWT.
pub fn create_api_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/Image", image_router())
        .nest("/Oxford", oxford_router())
        .nest("/Invent", invent_router())
        .nest("/InventDim", invent_dim_router())
        .nest("/TaxInformation", tax_information_router())
        .nest("/Tag", tag_router())
        .route_layer(from_fn_with_state(state.auth.clone(), auth_middleware));

    let v1 = Router::new()
        .nest("/User", user_router(state.auth.clone()))
        .nest("/Product", product_router(state.auth.clone()))
        .merge(protected);

    Router::new()
        .nest("/v1", v1)
        .layer(Extension(state.clone()))
        .layer(DefaultBodyLimit::max(state.upload_size_limit))
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
