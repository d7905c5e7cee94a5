use axum::{extract::State, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app::{
        error::{AppError, StdResponse},
        state::AppState,
    },
    services::orders::{self, DashboardStats},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(utoipa_axum::routes!(get_dashboard))
}

/// Order counts by status, product count and the most recent orders.
#[utoipa::path(
    get,
    path = "/dashboard",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get dashboard successfully", body = StdResponse<DashboardStats, String>)
    )
)]
async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = orders::dashboard(&state.store).await?;

    Ok(StdResponse {
        data: Some(stats),
        message: Some("Get dashboard successfully"),
    })
}
