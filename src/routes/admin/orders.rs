use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app::{
        error::{AppError, StdResponse},
        state::AppState,
    },
    models::{OrderEntity, OrderStatus},
    services::orders::{self, OrderDetails, StatusFilter},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(update_order_status)),
    )
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct OrdersQuery {
    /// `all`, `pending`, `in_progress` or `delivered`; defaults to `all`.
    #[param(inline)]
    pub status: Option<StatusFilter>,
}

/// List orders, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(OrdersQuery),
    responses(
        (status = 200, description = "List orders successfully", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn get_orders(
    Query(query): Query<OrdersQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let orders = orders::list_orders(&state.store, query.status.unwrap_or_default()).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("List orders successfully"),
    })
}

/// Fetch an order with its items and total.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderDetails, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::get_order(&state.store, id).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Get order successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateStatusReq {
    pub status: OrderStatus,
}

/// Change an order's status.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to update")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Updated order status successfully", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Status change not allowed")
    )
)]
async fn update_order_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<UpdateStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let order = orders::update_status(
        &state.store,
        state.config.orders.status_policy,
        id,
        body.status,
    )
    .await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Updated order status successfully"),
    })
}
