use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app::{
        error::{AppError, StdResponse},
        state::AppState,
    },
    cart::{CartProduct, CartSummary, sessions::SessionCart},
    services::{
        catalog,
        placement::{self, DeliveryDetails, PlacedOrder},
    },
};

/// Buyer cart sessions and checkout. No authentication; the session id is the capability.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/carts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_cart))
            .routes(utoipa_axum::routes!(get_cart))
            .routes(utoipa_axum::routes!(delete_cart))
            .routes(utoipa_axum::routes!(add_item))
            .routes(utoipa_axum::routes!(clear_cart))
            .routes(utoipa_axum::routes!(update_item))
            .routes(utoipa_axum::routes!(remove_item))
            .routes(utoipa_axum::routes!(checkout)),
    )
}

/// Locks and loads the session's cart for the rest of the handler.
async fn open_cart(state: &AppState, session: Uuid) -> Result<SessionCart<'_>, AppError> {
    state
        .carts
        .open(session)
        .await
        .context("Failed to load cart")?
        .ok_or(AppError::NotFound)
}

#[derive(Serialize, ToSchema)]
struct CreateCartRes {
    pub session_id: Uuid,
}

/// Open a new, empty cart session.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Carts"],
    responses(
        (status = 200, description = "Created cart successfully", body = StdResponse<CreateCartRes, String>)
    )
)]
async fn create_cart(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session_id = state
        .carts
        .create()
        .await
        .context("Failed to create a cart session")?;

    Ok(StdResponse {
        data: Some(CreateCartRes { session_id }),
        message: Some("Created cart successfully"),
    })
}

/// Fetch the cart with its derived totals.
#[utoipa::path(
    get,
    path = "/{session}",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID")
    ),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<CartSummary, String>),
        (status = 404, description = "Unknown cart session")
    )
)]
async fn get_cart(
    Path(session): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let cart = open_cart(&state, session).await?;

    Ok(StdResponse {
        data: Some(cart.summary()),
        message: Some("Get cart successfully"),
    })
}

/// Discard the cart session entirely.
#[utoipa::path(
    delete,
    path = "/{session}",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID")
    ),
    responses(
        (status = 200, description = "Deleted cart successfully", body = StdResponse<Uuid, String>),
        (status = 404, description = "Unknown cart session")
    )
)]
async fn delete_cart(
    Path(session): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state
        .carts
        .remove(session)
        .await
        .context("Failed to delete cart session")?;
    if !removed {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(session),
        message: Some("Deleted cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AddItemReq {
    pub product_id: i32,
    pub quantity: u32,
}

/// Add a product to the cart, merging with an existing line for the same product.
#[utoipa::path(
    post,
    path = "/{session}/items",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID")
    ),
    request_body = AddItemReq,
    responses(
        (status = 200, description = "Added item successfully", body = StdResponse<CartSummary, String>),
        (status = 404, description = "Unknown cart session or product")
    )
)]
async fn add_item(
    Path(session): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<AddItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut cart = open_cart(&state, session).await?;
    let product = catalog::get_product(&state.store, body.product_id).await?;

    cart.add_item(CartProduct::from(&product), body.quantity);
    cart.save().await.context("Failed to save cart")?;

    Ok(StdResponse {
        data: Some(cart.summary()),
        message: Some("Added item successfully"),
    })
}

/// Remove every line from the cart.
#[utoipa::path(
    delete,
    path = "/{session}/items",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID")
    ),
    responses(
        (status = 200, description = "Cleared cart successfully", body = StdResponse<CartSummary, String>),
        (status = 404, description = "Unknown cart session")
    )
)]
async fn clear_cart(
    Path(session): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut cart = open_cart(&state, session).await?;
    cart.clear();
    cart.save().await.context("Failed to save cart")?;

    Ok(StdResponse {
        data: Some(cart.summary()),
        message: Some("Cleared cart successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateItemReq {
    /// Zero or less removes the line.
    pub quantity: i64,
}

/// Set a line's quantity exactly.
#[utoipa::path(
    patch,
    path = "/{session}/items/{product_id}",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID"),
        ("product_id" = i32, Path, description = "Product ID of the line")
    ),
    request_body = UpdateItemReq,
    responses(
        (status = 200, description = "Updated item successfully", body = StdResponse<CartSummary, String>),
        (status = 404, description = "Unknown cart session")
    )
)]
async fn update_item(
    Path((session, product_id)): Path<(Uuid, i32)>,
    State(state): State<AppState>,
    Json(body): Json<UpdateItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut cart = open_cart(&state, session).await?;
    cart.update_quantity(product_id, body.quantity);
    cart.save().await.context("Failed to save cart")?;

    Ok(StdResponse {
        data: Some(cart.summary()),
        message: Some("Updated item successfully"),
    })
}

/// Remove one line; removing an absent product is not an error.
#[utoipa::path(
    delete,
    path = "/{session}/items/{product_id}",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID"),
        ("product_id" = i32, Path, description = "Product ID of the line")
    ),
    responses(
        (status = 200, description = "Removed item successfully", body = StdResponse<CartSummary, String>),
        (status = 404, description = "Unknown cart session")
    )
)]
async fn remove_item(
    Path((session, product_id)): Path<(Uuid, i32)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let mut cart = open_cart(&state, session).await?;
    cart.remove_item(product_id);
    cart.save().await.context("Failed to save cart")?;

    Ok(StdResponse {
        data: Some(cart.summary()),
        message: Some("Removed item successfully"),
    })
}

/// Place an order from the cart. On success the cart is emptied.
#[utoipa::path(
    post,
    path = "/{session}/checkout",
    tags = ["Carts"],
    params(
        ("session" = Uuid, Path, description = "Cart session ID")
    ),
    request_body = DeliveryDetails,
    responses(
        (status = 200, description = "Placed order successfully", body = StdResponse<PlacedOrder, String>),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Unknown cart session"),
        (status = 409, description = "Some products are no longer available"),
        (status = 422, description = "Invalid delivery details")
    )
)]
async fn checkout(
    Path(session): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<DeliveryDetails>,
) -> Result<impl IntoResponse, AppError> {
    let mut cart = open_cart(&state, session).await?;

    let placed = placement::place_order(
        &state.store,
        &mut *cart,
        &body,
        state.config.orders.tracking_code_attempts,
    )
    .await?;
    // The order exists at this point; a stale cart is only logged.
    if let Err(err) = cart.save().await {
        tracing::error!("Failed to clear cart {} after checkout: {}", session, err);
    }

    Ok(StdResponse {
        data: Some(placed),
        message: Some("Placed order successfully"),
    })
}
