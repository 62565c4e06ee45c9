//! PostgreSQL implementation of the order store.
//!
//! An order owns its item rows: they are inserted in the same transaction
//! and removed by cascade. `mark_paid` and `update_status` lock the order
//! row for the duration of the transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, MarkPaid, OrderId, Timestamp};
use crate::domain::order::{DeliveryMethod, Order, OrderItem, OrderStatus, ShippingAddress};
use crate::ports::OrderRepository;

/// PostgreSQL implementation of the OrderRepository port.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order (items loaded separately).
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    delivery_method: String,
    shipping_line: Option<String>,
    shipping_city: Option<String>,
    shipping_postcode: Option<String>,
    notes: Option<String>,
    subtotal: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    status: String,
    payment_intent_id: Option<String>,
    checkout_session_id: Option<String>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    fulfilled_at: Option<DateTime<Utc>>,
}

/// Database row representation of an order item.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: String,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        let delivery_method = DeliveryMethod::parse(&self.delivery_method)?;
        let status = OrderStatus::parse(&self.status)?;

        let shipping_address = match (self.shipping_line, self.shipping_city, self.shipping_postcode)
        {
            (Some(line), Some(city), Some(postcode)) => Some(ShippingAddress {
                line,
                city,
                postcode,
            }),
            _ => None,
        };

        let items = items
            .into_iter()
            .map(|row| {
                let quantity = u32::try_from(row.quantity).map_err(|_| {
                    DomainError::database(format!("invalid item quantity: {}", row.quantity))
                })?;
                Ok(OrderItem {
                    product_id: row.product_id,
                    product_name: row.product_name,
                    quantity,
                    unit_price: row.unit_price,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Order {
            id: OrderId::from_uuid(self.id),
            order_number: self.order_number,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            delivery_method,
            shipping_address,
            notes: self.notes,
            items,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            total: self.total,
            status,
            payment_intent_id: self.payment_intent_id,
            checkout_session_id: self.checkout_session_id,
            created_at: Timestamp::from_datetime(self.created_at),
            paid_at: self.paid_at.map(Timestamp::from_datetime),
            fulfilled_at: self.fulfilled_at.map(Timestamp::from_datetime),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, order_number, customer_name, customer_email, customer_phone,
           delivery_method, shipping_line, shipping_city, shipping_postcode,
           notes, subtotal, shipping_cost, total, status,
           payment_intent_id, checkout_session_id,
           created_at, paid_at, fulfilled_at
    FROM orders
"#;

const SELECT_ITEMS: &str = r#"
    SELECT product_id, product_name, quantity, unit_price
    FROM order_items
    WHERE order_id = $1
    ORDER BY sort_order
"#;

impl PostgresOrderRepository {
    async fn fetch_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: &Uuid,
    ) -> Result<Vec<OrderItemRow>, DomainError> {
        sqlx::query_as(SELECT_ITEMS)
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(DomainError::database)
    }

    /// Completes a loaded row with its items, outside a transaction.
    async fn hydrate(&self, row: Option<OrderRow>) -> Result<Option<Order>, DomainError> {
        let Some(row) = row else { return Ok(None) };

        let items: Vec<OrderItemRow> = sqlx::query_as(SELECT_ITEMS)
            .bind(row.id)
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::database)?;

        Ok(Some(row.into_order(items)?))
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::database)?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_name, customer_email, customer_phone,
                delivery_method, shipping_line, shipping_city, shipping_postcode,
                notes, subtotal, shipping_cost, total, status,
                payment_intent_id, checkout_session_id,
                created_at, paid_at, fulfilled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                      $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(order.delivery_method.as_str())
        .bind(order.shipping_address.as_ref().map(|a| &a.line))
        .bind(order.shipping_address.as_ref().map(|a| &a.city))
        .bind(order.shipping_address.as_ref().map(|a| &a.postcode))
        .bind(&order.notes)
        .bind(order.subtotal)
        .bind(order.shipping_cost)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(&order.payment_intent_id)
        .bind(&order.checkout_session_id)
        .bind(order.created_at.as_datetime())
        .bind(order.paid_at.as_ref().map(Timestamp::as_datetime))
        .bind(order.fulfilled_at.as_ref().map(Timestamp::as_datetime))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("orders_order_number_key") {
                    return DomainError::OrderNumberCollision(order.order_number.clone());
                }
            }
            DomainError::database(format!("failed to insert order: {}", e))
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, sort_order, product_id, product_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(DomainError::database)?;
        }

        tx.commit().await.map_err(DomainError::database)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::database)?;
        self.hydrate(row).await
    }

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE order_number = $1", SELECT_COLUMNS))
                .bind(order_number)
                .fetch_optional(&self.pool)
                .await
                .map_err(DomainError::database)?;
        self.hydrate(row).await
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE checkout_session_id = $1", SELECT_COLUMNS))
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DomainError::database)?;
        self.hydrate(row).await
    }

    async fn set_checkout_session(
        &self,
        id: &OrderId,
        session_id: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE orders SET checkout_session_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::database)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("order", id.to_string()));
        }
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: &OrderId,
        payment_intent_id: &str,
    ) -> Result<(MarkPaid, Order), DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::database)?;

        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(DomainError::database)?;

        let row = row.ok_or_else(|| DomainError::not_found("order", id.to_string()))?;
        let items = Self::fetch_items(&mut tx, &row.id).await?;
        let mut order = row.into_order(items)?;

        let outcome = order.mark_paid(payment_intent_id, Timestamp::now())?;

        if outcome.was_applied() {
            sqlx::query(
                r#"
                UPDATE orders
                SET status = $2, payment_intent_id = $3, paid_at = $4
                WHERE id = $1
                "#,
            )
            .bind(id.as_uuid())
            .bind(order.status.as_str())
            .bind(&order.payment_intent_id)
            .bind(order.paid_at.as_ref().map(Timestamp::as_datetime))
            .execute(&mut *tx)
            .await
            .map_err(DomainError::database)?;
        }

        tx.commit().await.map_err(DomainError::database)?;
        Ok((outcome, order))
    }

    async fn update_status(
        &self,
        id: &OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::database)?;

        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(DomainError::database)?;

        let row = row.ok_or_else(|| DomainError::not_found("order", id.to_string()))?;
        let items = Self::fetch_items(&mut tx, &row.id).await?;
        let mut order = row.into_order(items)?;

        order.update_status(new_status, Timestamp::now())?;

        sqlx::query("UPDATE orders SET status = $2, fulfilled_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.fulfilled_at.as_ref().map(Timestamp::as_datetime))
            .execute(&mut *tx)
            .await
            .map_err(DomainError::database)?;

        tx.commit().await.map_err(DomainError::database)?;
        Ok(order)
    }
}
