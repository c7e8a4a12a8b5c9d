use axum::response::{IntoResponse, Json};
use serde::Serialize;

/// Service banner served at `/`.
///
/// Points API consumers at the auth prefix; the full contract lives in the
/// generated OpenAPI document (see the `openapi` binary).
#[derive(Serialize, Debug)]
pub struct ServiceInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
    api_base: &'static str,
}

pub async fn root() -> impl IntoResponse {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        api_base: "/api/auth/",
    })
}
