use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app::{
        error::{AppError, StdResponse},
        state::AppState,
    },
    services::orders::{self, OrderDetails},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/tracking",
        OpenApiRouter::new().routes(utoipa_axum::routes!(track_order)),
    )
}

/// Look up an order by its public tracking code.
#[utoipa::path(
    get,
    path = "/{code}",
    tags = ["Tracking"],
    params(
        ("code" = String, Path, description = "Tracking code, e.g. HH-4K2Z9QA")
    ),
    responses(
        (status = 200, description = "Order found", body = StdResponse<OrderDetails, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn track_order(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::track_order(&state.store, &code).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Order found"),
    })
}
