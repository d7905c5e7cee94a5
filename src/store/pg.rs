use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl, pooled_connection::bb8::PooledConnection,
};

use crate::{
    app::db::DbPool,
    models::{
        Category, CreateOrderEntity, CreateOrderItemEntity, CreateProductEntity, NewOrderItem,
        OrderEntity, OrderItemEntity, OrderStatus, ProductEntity, UpdateProductEntity,
    },
    schema::{order_items, orders, products},
    store::{CreateOrderError, OrderKey, Store, StoreError, StoreResult},
};

/// PostgreSQL-backed store sharing one bb8 pool.
#[derive(Clone)]
pub struct PgStore {
    db_pool: DbPool,
}

impl PgStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }

    async fn conn(&self) -> StoreResult<PooledConnection<'_, AsyncPgConnection>> {
        self.db_pool
            .get()
            .await
            .map_err(|err| StoreError::Pool(err.to_string()))
    }
}

impl Store for PgStore {
    async fn list_products(&self, category: Option<Category>) -> StoreResult<Vec<ProductEntity>> {
        let conn = &mut self.conn().await?;

        let mut query = products::table
            .select(ProductEntity::as_select())
            .order_by(products::id.asc())
            .into_boxed();
        if let Some(category) = category {
            query = query.filter(products::category.eq(category));
        }

        Ok(query.load(conn).await?)
    }

    async fn find_product(&self, id: i32) -> StoreResult<Option<ProductEntity>> {
        let conn = &mut self.conn().await?;

        Ok(products::table
            .find(id)
            .select(ProductEntity::as_select())
            .first(conn)
            .await
            .optional()?)
    }

    async fn count_products(&self) -> StoreResult<i64> {
        let conn = &mut self.conn().await?;

        Ok(products::table.count().get_result(conn).await?)
    }

    async fn create_product(&self, product: CreateProductEntity) -> StoreResult<ProductEntity> {
        let conn = &mut self.conn().await?;

        Ok(diesel::insert_into(products::table)
            .values(product)
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await?)
    }

    async fn update_product(
        &self,
        id: i32,
        changes: UpdateProductEntity,
    ) -> StoreResult<Option<ProductEntity>> {
        let conn = &mut self.conn().await?;

        Ok(diesel::update(products::table.find(id))
            .set(changes)
            .returning(ProductEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?)
    }

    async fn delete_product(&self, id: i32) -> StoreResult<bool> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(products::table.find(id))
            .execute(conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<OrderEntity>> {
        let conn = &mut self.conn().await?;

        let mut query = orders::table
            .select(OrderEntity::as_select())
            .order_by((orders::created_at.desc(), orders::id.desc()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(orders::status.eq(status));
        }

        Ok(query.load(conn).await?)
    }

    async fn find_order(&self, key: OrderKey) -> StoreResult<Option<OrderEntity>> {
        let conn = &mut self.conn().await?;

        let query = orders::table.select(OrderEntity::as_select()).into_boxed();
        let query = match key {
            OrderKey::Id(id) => query.filter(orders::id.eq(id)),
            OrderKey::TrackingCode(code) => query.filter(orders::tracking_id.eq(code)),
        };

        Ok(query.first(conn).await.optional()?)
    }

    async fn find_order_items(
        &self,
        order_id: i32,
    ) -> StoreResult<Vec<(OrderItemEntity, Option<ProductEntity>)>> {
        let conn = &mut self.conn().await?;

        Ok(order_items::table
            .left_join(products::table)
            .filter(order_items::order_id.eq(order_id))
            .order_by(order_items::id.asc())
            .select((
                OrderItemEntity::as_select(),
                Option::<ProductEntity>::as_select(),
            ))
            .load(conn)
            .await?)
    }

    async fn create_order(
        &self,
        order: CreateOrderEntity,
        items: Vec<NewOrderItem>,
    ) -> Result<OrderEntity, CreateOrderError> {
        let conn = &mut self.conn().await.map_err(CreateOrderError::Header)?;
        let tracking_id = order.tracking_id.clone();

        conn.transaction(move |conn| {
            Box::pin(async move {
                let created = diesel::insert_into(orders::table)
                    .values(order)
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            CreateOrderError::TrackingCodeTaken(tracking_id)
                        }
                        other => CreateOrderError::Header(other.into()),
                    })?;

                let rows: Vec<CreateOrderItemEntity> = items
                    .into_iter()
                    .map(|item| item.into_entity(created.id))
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(rows)
                    .execute(conn)
                    .await
                    .map_err(|err| CreateOrderError::Items(err.into()))?;

                Ok::<OrderEntity, CreateOrderError>(created)
            })
        })
        .await
    }

    async fn set_order_status(
        &self,
        id: i32,
        status: OrderStatus,
        expected: Option<OrderStatus>,
    ) -> StoreResult<Option<OrderEntity>> {
        let conn = &mut self.conn().await?;

        let updated: diesel::QueryResult<OrderEntity> = match expected {
            Some(expected) => {
                diesel::update(
                    orders::table
                        .filter(orders::id.eq(id))
                        .filter(orders::status.eq(expected)),
                )
                .set(orders::status.eq(status))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await
            }
            None => {
                diesel::update(orders::table.find(id))
                    .set(orders::status.eq(status))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
            }
        };

        Ok(updated.optional()?)
    }
}
