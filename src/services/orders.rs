use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    app::error::AppError,
    models::{OrderEntity, OrderItemEntity, OrderStatus, ProductEntity},
    store::{OrderKey, Store, StoreError, StoreResult},
    tracking,
};

const RECENT_ORDERS: usize = 5;

/// Which status changes an admin may make.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any status may be set from any other, including going back.
    #[default]
    Permissive,
    /// Only forward along pending, in_progress, delivered.
    Strict,
}

impl StatusPolicy {
    pub fn allows(self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            StatusPolicy::Permissive => true,
            StatusPolicy::Strict => stage(to) >= stage(from),
        }
    }
}

fn stage(status: OrderStatus) -> usize {
    match status {
        OrderStatus::Pending => 0,
        OrderStatus::InProgress => 1,
        OrderStatus::Delivered => 2,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Delivered,
}

impl StatusFilter {
    pub fn status(self) -> Option<OrderStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(OrderStatus::Pending),
            StatusFilter::InProgress => Some(OrderStatus::InProgress),
            StatusFilter::Delivered => Some(OrderStatus::Delivered),
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Please enter a tracking ID")]
    BlankTrackingCode,

    #[error("Order not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::BlankTrackingCode => AppError::BadRequest(err.to_string()),
            LookupError::NotFound => AppError::NotFound,
            LookupError::Store(err) => err.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Order not found")]
    NotFound,

    #[error("Cannot move an order from {from} to {to}")]
    NotAllowed { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotFound => AppError::NotFound,
            TransitionError::NotAllowed { .. } => AppError::Conflict(err.to_string()),
            TransitionError::Store(err) => err.into(),
        }
    }
}

/// Current catalog fields of the product an item points at.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub name: String,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemView {
    pub id: i32,
    pub product_id: Option<i32>,
    pub quantity: i32,
    #[schema(value_type = String, example = "2.99")]
    pub price_at_purchase: BigDecimal,
    #[schema(value_type = String, example = "14.95")]
    pub line_total: BigDecimal,
    /// `None` once the product has been deleted from the catalog.
    pub product: Option<ProductSummary>,
}

impl OrderItemView {
    fn new(item: OrderItemEntity, product: Option<ProductEntity>) -> Self {
        let line_total = &item.price_at_purchase * BigDecimal::from(item.quantity);
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            line_total,
            product: product.map(|product| ProductSummary {
                name: product.name,
                image_url: product.image_url,
                description: product.description,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemView>,
    #[schema(value_type = String, example = "19.42")]
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: usize,
    pub pending_orders: usize,
    pub in_progress_orders: usize,
    pub delivered_orders: usize,
    pub total_products: i64,
    pub recent_orders: Vec<OrderEntity>,
}

async fn load_details(store: &impl Store, key: OrderKey) -> Result<OrderDetails, LookupError> {
    let order = store.find_order(key).await?.ok_or(LookupError::NotFound)?;

    let order_items: Vec<OrderItemView> = store
        .find_order_items(order.id)
        .await?
        .into_iter()
        .map(|(item, product)| OrderItemView::new(item, product))
        .collect();
    let total_price = order_items.iter().map(|item| &item.line_total).sum();

    Ok(OrderDetails {
        order,
        order_items,
        total_price,
    })
}

/// Admin lookup by internal id.
pub async fn get_order(store: &impl Store, id: i32) -> Result<OrderDetails, LookupError> {
    load_details(store, OrderKey::Id(id)).await
}

/// Buyer lookup by tracking code. Surrounding whitespace is ignored.
pub async fn track_order(store: &impl Store, code: &str) -> Result<OrderDetails, LookupError> {
    let code = tracking::normalize(code).ok_or(LookupError::BlankTrackingCode)?;
    load_details(store, OrderKey::TrackingCode(code.to_string())).await
}

pub async fn list_orders(store: &impl Store, filter: StatusFilter) -> StoreResult<Vec<OrderEntity>> {
    store.list_orders(filter.status()).await
}

/// Moves an order to `status`.
///
/// Under the strict policy the write is conditional on the status that was
/// checked; if another admin got there first the check runs again against
/// the newer status.
pub async fn update_status(
    store: &impl Store,
    policy: StatusPolicy,
    id: i32,
    status: OrderStatus,
) -> Result<OrderEntity, TransitionError> {
    loop {
        let current = store
            .find_order(OrderKey::Id(id))
            .await?
            .ok_or(TransitionError::NotFound)?;

        if !policy.allows(current.status, status) {
            tracing::warn!(
                "Rejected status change of order {} from {} to {}",
                id,
                current.status,
                status
            );
            return Err(TransitionError::NotAllowed {
                from: current.status,
                to: status,
            });
        }

        let expected = match policy {
            StatusPolicy::Permissive => None,
            StatusPolicy::Strict => Some(current.status),
        };
        match store.set_order_status(id, status, expected).await? {
            Some(updated) => {
                tracing::info!("Order {} moved from {} to {}", id, current.status, updated.status);
                return Ok(updated);
            }
            None if expected.is_some() => {
                tracing::debug!("Order {} changed status concurrently, checking again", id);
            }
            None => return Err(TransitionError::NotFound),
        }
    }
}

pub async fn dashboard(store: &impl Store) -> StoreResult<DashboardStats> {
    let orders = store.list_orders(None).await?;
    let total_products = store.count_products().await?;
    let count = |status| orders.iter().filter(|order| order.status == status).count();

    Ok(DashboardStats {
        total_orders: orders.len(),
        pending_orders: count(OrderStatus::Pending),
        in_progress_orders: count(OrderStatus::InProgress),
        delivered_orders: count(OrderStatus::Delivered),
        total_products,
        recent_orders: orders.iter().take(RECENT_ORDERS).cloned().collect(),
    })
}
