use axum::{
    http::{self, HeaderMap, HeaderValue, header::CACHE_CONTROL},
    response::IntoResponse,
};
use tower_http::{
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
};

use crate::service::app_state::{StateRouter, create_state_router};
use crate::store::seed::BOOTSTRAP_ADMIN_ID;

use admin::create_admin_router;
use audit_log::create_audit_log_router;
use catalog::create_catalog_router;
use category::create_category_router;
use provider::create_provider_router;

mod admin;
mod audit_log;
mod catalog;
mod category;
mod error;
mod provider;

pub use error::BaseError;

/// Actor attribution for audit entries. There is no authentication layer;
/// the admin UI sends its current admin id in a header, and mutations
/// without one fall back to the bootstrap admin.
pub(crate) fn actor_id(headers: &HeaderMap) -> i64 {
    headers
        .get("x-admin-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(BOOTSTRAP_ADMIN_ID)
}

pub fn create_manager_router() -> StateRouter {
    let serve_dir = ServeDir::new("public").fallback(ServeFile::new("public/index.html"));
    let serve_vendor_dir = ServeDir::new("public/assets");

    let ui_router = create_state_router()
        .nest_service("/ui", serve_dir.clone())
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .nest_service("/ui/assets", serve_vendor_dir);

    let api_router = create_state_router().nest(
        "/api",
        create_state_router()
            .merge(create_provider_router())
            .merge(create_category_router())
            .merge(create_admin_router())
            .merge(create_audit_log_router()),
    );

    create_state_router().nest("/manager", create_state_router().merge(api_router).merge(ui_router))
}

pub fn create_router() -> StateRouter {
    create_state_router()
        .merge(create_catalog_router())
        .merge(create_manager_router())
}

pub async fn handle_404() -> impl IntoResponse {
    (http::StatusCode::NOT_FOUND, "not found")
}
