//! Admin panel endpoints. Everything except login sits behind the bearer-token gate.

use axum::middleware;
use utoipa_axum::router::OpenApiRouter;

use crate::app::{middleware::admin_authorization, state::AppState};

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .merge(auth::protected_routes())
        .merge(dashboard::routes_with_openapi())
        .merge(orders::routes_with_openapi())
        .merge(products::routes_with_openapi())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_authorization,
        ));

    OpenApiRouter::new().nest("/admin", auth::public_routes().merge(protected))
}
