use utoipa_axum::router::OpenApiRouter;

use crate::app::state::AppState;

pub mod admin;
pub mod carts;
pub mod products;
pub mod tracking;

/// Every route of the service, buyer and admin, with its OpenAPI description.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(products::routes_with_openapi())
        .merge(carts::routes_with_openapi())
        .merge(tracking::routes_with_openapi())
        .merge(admin::routes_with_openapi(state))
}
