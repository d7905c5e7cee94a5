use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app::{
        error::{AppError, StdResponse},
        state::AppState,
    },
    models::ProductEntity,
    routes::products::CatalogQuery,
    services::catalog::{self, ProductForm, ProductPatch},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products))
            .routes(utoipa_axum::routes!(create_product))
            .routes(utoipa_axum::routes!(update_product))
            .routes(utoipa_axum::routes!(delete_product)),
    )
}

/// List products for management.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(CatalogQuery),
    responses(
        (status = 200, description = "List products successfully", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn get_products(
    Query(query): Query<CatalogQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let products =
        catalog::list_products(&state.store, query.category.unwrap_or_default()).await?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("List products successfully"),
    })
}

/// Add a product to the catalog.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = ProductForm,
    responses(
        (status = 200, description = "Created product successfully", body = StdResponse<ProductEntity, String>),
        (status = 422, description = "Invalid product")
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<ProductForm>,
) -> Result<impl IntoResponse, AppError> {
    let product = catalog::create_product(&state.store, &body).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Created product successfully"),
    })
}

/// Change some fields of a product. Existing orders keep their purchase price.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Product ID to update")
    ),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Updated product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid product")
    )
)]
async fn update_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<ProductPatch>,
) -> Result<impl IntoResponse, AppError> {
    let product = catalog::update_product(&state.store, id, &body).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Updated product successfully"),
    })
}

/// Remove a product. Order items that referenced it keep their frozen values.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Product ID to delete")
    ),
    responses(
        (status = 200, description = "Deleted product successfully", body = StdResponse<i32, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn delete_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    catalog::delete_product(&state.store, id).await?;

    Ok(StdResponse {
        data: Some(id),
        message: Some("Deleted product successfully"),
    })
}
