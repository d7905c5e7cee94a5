use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::{
    models::{
        Category, CreateOrderEntity, CreateProductEntity, NewOrderItem, OrderEntity,
        OrderItemEntity, OrderStatus, ProductEntity, UpdateProductEntity,
    },
    store::{CreateOrderError, OrderKey, Store, StoreError, StoreResult},
};

/// Failures the store will simulate on the following calls.
#[derive(Debug, Default, Clone)]
pub struct FailurePlan {
    /// Every read fails as if the backend were down.
    pub reads: bool,
    /// The order header insert fails.
    pub order_insert: bool,
    /// The order items insert fails after the header was written.
    pub items_insert: bool,
    /// Number of upcoming order inserts that collide on the tracking code.
    pub tracking_collisions: usize,
    /// Another writer moves the order to this status right before the next status update.
    pub concurrent_status: Option<OrderStatus>,
}

#[derive(Default)]
struct Tables {
    products: BTreeMap<i32, ProductEntity>,
    orders: BTreeMap<i32, OrderEntity>,
    order_items: Vec<OrderItemEntity>,
    tracking_ids: HashSet<String>,
    next_product_id: i32,
    next_order_id: i32,
    next_item_id: i32,
    failures: FailurePlan,
}

/// In-process store with the same semantics as the PostgreSQL one, plus
/// failure injection and a count of every call made against it.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("simulated outage".into())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of `Store` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failures(&self, failures: FailurePlan) {
        self.tables().failures = failures;
    }

    /// Inserts a product directly, without counting it as a call.
    pub fn seed_product(&self, name: &str, price: BigDecimal, category: Category) -> ProductEntity {
        let mut tables = self.tables();
        tables.next_product_id += 1;
        let product = ProductEntity {
            id: tables.next_product_id,
            name: name.to_string(),
            price,
            image_url: format!("https://images.example.com/{}.jpeg", name.to_lowercase()),
            description: format!("{} from the farm", name),
            category,
            created_at: Utc::now(),
        };
        tables.products.insert(product.id, product.clone());
        product
    }

    pub fn orders(&self) -> Vec<OrderEntity> {
        self.tables().orders.values().cloned().collect()
    }

    pub fn order_items(&self) -> Vec<OrderItemEntity> {
        self.tables().order_items.clone()
    }
}

impl Store for MemoryStore {
    async fn list_products(&self, category: Option<Category>) -> StoreResult<Vec<ProductEntity>> {
        self.record_call();
        let tables = self.tables();
        if tables.failures.reads {
            return Err(unavailable());
        }

        Ok(tables
            .products
            .values()
            .filter(|product| category.is_none_or(|category| product.category == category))
            .cloned()
            .collect())
    }

    async fn find_product(&self, id: i32) -> StoreResult<Option<ProductEntity>> {
        self.record_call();
        let tables = self.tables();
        if tables.failures.reads {
            return Err(unavailable());
        }

        Ok(tables.products.get(&id).cloned())
    }

    async fn count_products(&self) -> StoreResult<i64> {
        self.record_call();
        let tables = self.tables();
        if tables.failures.reads {
            return Err(unavailable());
        }

        Ok(tables.products.len() as i64)
    }

    async fn create_product(&self, product: CreateProductEntity) -> StoreResult<ProductEntity> {
        self.record_call();
        let mut tables = self.tables();
        tables.next_product_id += 1;

        let created = ProductEntity {
            id: tables.next_product_id,
            name: product.name,
            price: product.price,
            image_url: product.image_url,
            description: product.description,
            category: product.category,
            created_at: Utc::now(),
        };
        tables.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: i32,
        changes: UpdateProductEntity,
    ) -> StoreResult<Option<ProductEntity>> {
        self.record_call();
        let mut tables = self.tables();

        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(image_url) = changes.image_url {
            product.image_url = image_url;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(category) = changes.category {
            product.category = category;
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: i32) -> StoreResult<bool> {
        self.record_call();
        let mut tables = self.tables();

        let deleted = tables.products.remove(&id).is_some();
        if deleted {
            for item in tables
                .order_items
                .iter_mut()
                .filter(|item| item.product_id == Some(id))
            {
                item.product_id = None;
            }
        }
        Ok(deleted)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<OrderEntity>> {
        self.record_call();
        let tables = self.tables();
        if tables.failures.reads {
            return Err(unavailable());
        }

        let mut orders: Vec<OrderEntity> = tables
            .orders
            .values()
            .filter(|order| status.is_none_or(|status| order.status == status))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn find_order(&self, key: OrderKey) -> StoreResult<Option<OrderEntity>> {
        self.record_call();
        let tables = self.tables();
        if tables.failures.reads {
            return Err(unavailable());
        }

        Ok(match key {
            OrderKey::Id(id) => tables.orders.get(&id).cloned(),
            OrderKey::TrackingCode(code) => tables
                .orders
                .values()
                .find(|order| order.tracking_id == code)
                .cloned(),
        })
    }

    async fn find_order_items(
        &self,
        order_id: i32,
    ) -> StoreResult<Vec<(OrderItemEntity, Option<ProductEntity>)>> {
        self.record_call();
        let tables = self.tables();
        if tables.failures.reads {
            return Err(unavailable());
        }

        Ok(tables
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .map(|item| {
                let product = item
                    .product_id
                    .and_then(|id| tables.products.get(&id).cloned());
                (item.clone(), product)
            })
            .collect())
    }

    async fn create_order(
        &self,
        order: CreateOrderEntity,
        items: Vec<NewOrderItem>,
    ) -> Result<OrderEntity, CreateOrderError> {
        self.record_call();
        let mut tables = self.tables();

        if tables.failures.tracking_collisions > 0 {
            tables.failures.tracking_collisions -= 1;
            return Err(CreateOrderError::TrackingCodeTaken(order.tracking_id));
        }
        if tables.tracking_ids.contains(&order.tracking_id) {
            return Err(CreateOrderError::TrackingCodeTaken(order.tracking_id));
        }
        if tables.failures.order_insert {
            return Err(CreateOrderError::Header(unavailable()));
        }
        // Nothing has been written yet, so failing here mirrors a rolled back transaction.
        if tables.failures.items_insert {
            return Err(CreateOrderError::Items(unavailable()));
        }

        tables.next_order_id += 1;
        let created = OrderEntity {
            id: tables.next_order_id,
            buyer_name: order.buyer_name,
            contact_information: order.contact_information,
            delivery_address: order.delivery_address,
            status: order.status,
            created_at: Utc::now(),
            tracking_id: order.tracking_id,
        };

        for item in items {
            tables.next_item_id += 1;
            let entity = item.into_entity(created.id);
            let row = OrderItemEntity {
                id: tables.next_item_id,
                order_id: entity.order_id,
                product_id: entity.product_id,
                quantity: entity.quantity,
                price_at_purchase: entity.price_at_purchase,
            };
            tables.order_items.push(row);
        }
        tables.tracking_ids.insert(created.tracking_id.clone());
        tables.orders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_order_status(
        &self,
        id: i32,
        status: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> StoreResult<Option<OrderEntity>> {
        self.record_call();
        let mut tables = self.tables();
        let concurrent = tables.failures.concurrent_status.take();

        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(concurrent) = concurrent {
            order.status = concurrent;
        }
        if expected.is_some_and(|expected| expected != order.status) {
            return Ok(None);
        }

        order.status = status;
        Ok(Some(order.clone()))
    }
}
