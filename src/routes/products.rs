use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app::{
        error::{AppError, StdResponse},
        state::AppState,
    },
    models::ProductEntity,
    services::catalog::{self, CategoryFilter},
};

/// Buyer-facing catalog browsing.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products))
            .routes(utoipa_axum::routes!(get_product)),
    )
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// `all`, `vegetable` or `fruit`; defaults to `all`.
    #[param(inline)]
    pub category: Option<CategoryFilter>,
}

/// List the catalog, optionally narrowed to one category.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Products"],
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

/// Fetch a single product.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Products"],
    params(
        ("id" = i32, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let product = catalog::get_product(&state.store, id).await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}
