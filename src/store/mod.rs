//! Access to the catalog and order tables.
//!
//! `Store` is implemented by [`pg::PgStore`] against PostgreSQL and by
//! [`memory::MemoryStore`] for in-process use.

use std::future::Future;

use thiserror::Error;

use crate::{
    app::error::AppError,
    models::{
        Category, CreateOrderEntity, CreateProductEntity, NewOrderItem, OrderEntity,
        OrderItemEntity, OrderStatus, ProductEntity, UpdateProductEntity,
    },
};

pub mod memory;
pub mod pg;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to obtain a DB connection: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Pool(reason) | StoreError::Unavailable(reason) => {
                tracing::error!("Store unavailable: {}", reason);
                AppError::ServiceUnreachable("Database".into())
            }
            StoreError::Query(err) => AppError::Other(err.into()),
        }
    }
}

/// Outcome of the atomic header + items insert.
#[derive(Debug, Error)]
pub enum CreateOrderError {
    #[error("Tracking code {0} is already taken")]
    TrackingCodeTaken(String),

    #[error("Failed to create order: {0}")]
    Header(#[source] StoreError),

    #[error("Failed to create order items: {0}")]
    Items(#[source] StoreError),
}

impl From<diesel::result::Error> for CreateOrderError {
    fn from(err: diesel::result::Error) -> Self {
        CreateOrderError::Header(err.into())
    }
}

/// How an order is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
    Id(i32),
    TrackingCode(String),
}

pub trait Store: Send + Sync {
    fn list_products(
        &self,
        category: Option<Category>,
    ) -> impl Future<Output = StoreResult<Vec<ProductEntity>>> + Send;

    fn find_product(&self, id: i32) -> impl Future<Output = StoreResult<Option<ProductEntity>>> + Send;

    fn count_products(&self) -> impl Future<Output = StoreResult<i64>> + Send;

    fn create_product(
        &self,
        product: CreateProductEntity,
    ) -> impl Future<Output = StoreResult<ProductEntity>> + Send;

    /// `changes` must not be empty.
    fn update_product(
        &self,
        id: i32,
        changes: UpdateProductEntity,
    ) -> impl Future<Output = StoreResult<Option<ProductEntity>>> + Send;

    /// Returns whether a row was deleted.
    fn delete_product(&self, id: i32) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Newest first.
    fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = StoreResult<Vec<OrderEntity>>> + Send;

    fn find_order(&self, key: OrderKey) -> impl Future<Output = StoreResult<Option<OrderEntity>>> + Send;

    /// Items of one order with the product row they currently point at, if it still exists.
    fn find_order_items(
        &self,
        order_id: i32,
    ) -> impl Future<Output = StoreResult<Vec<(OrderItemEntity, Option<ProductEntity>)>>> + Send;

    /// Inserts the header and all items atomically: either both land or neither does.
    fn create_order(
        &self,
        order: CreateOrderEntity,
        items: Vec<NewOrderItem>,
    ) -> impl Future<Output = Result<OrderEntity, CreateOrderError>> + Send;

    /// With `expected`, the write only happens while the order still has that status.
    /// `None` when the order is missing or no longer matches.
    fn set_order_status(
        &self,
        id: i32,
        status: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> impl Future<Output = StoreResult<Option<OrderEntity>>> + Send;
}
