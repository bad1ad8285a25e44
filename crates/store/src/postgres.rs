use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BusinessId, ItemId, OrderId};
use domain::{
    InventoryRecord, InventoryUpdate, Money, NewInventoryItem, NewOrder, Order, OrderLine,
    OrderStatus,
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    repository::{
        BusinessDirectory, DecrementOutcome, InventoryRepository, OrderLedger, TransitionOutcome,
    },
};

const ITEM_COLUMNS: &str =
    "id, business_id, name, sku, category, unit_price_cents, quantity_on_hand, unit";

const ORDER_COLUMNS: &str = "id, business_id, customer_name, customer_contact, delivery_address, status, total_amount_cents, created_at";

/// PostgreSQL-backed record store.
///
/// Stock decrements are single conditional `UPDATE` statements, so the row
/// lock is held only for that statement and concurrent reservations on the
/// same item serialize inside the database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: PgRow) -> Result<InventoryRecord> {
        Ok(InventoryRecord {
            id: ItemId::new(row.try_get("id")?),
            business_id: BusinessId::new(row.try_get("business_id")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            category: row.try_get("category")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            quantity_on_hand: row.try_get("quantity_on_hand")?,
            unit: row.try_get("unit")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            business_id: BusinessId::new(row.try_get("business_id")?),
            customer_name: row.try_get("customer_name")?,
            customer_contact: row.try_get("customer_contact")?,
            delivery_address: row.try_get("delivery_address")?,
            status: status.parse()?,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLine> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::Corrupt {
            table: "order_lines",
            reason: format!("quantity {quantity} out of range"),
        })?;
        Ok(OrderLine {
            order_id: OrderId::new(row.try_get("order_id")?),
            inventory_item_id: row.try_get::<Option<i64>, _>("inventory_item_id")?.map(ItemId::new),
            name: row.try_get("name")?,
            quantity,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
        })
    }

    async fn lines_for(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, inventory_item_id, name, quantity, unit_price_cents, total_price_cents
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }
}

#[async_trait]
impl InventoryRepository for PostgresStore {
    async fn get_item(
        &self,
        business_id: BusinessId,
        item_id: ItemId,
    ) -> Result<Option<InventoryRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 AND business_id = $2"
        ))
        .bind(item_id.as_i64())
        .bind(business_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn try_decrement(&self, item_id: ItemId, amount: u32) -> Result<DecrementOutcome> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET quantity_on_hand = quantity_on_hand - $2
            WHERE id = $1 AND quantity_on_hand >= $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id.as_i64())
        .bind(i64::from(amount))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(DecrementOutcome::Applied(Self::row_to_item(row)?));
        }

        // Nothing matched: tell a missing row apart from a short one.
        let available: Option<i64> =
            sqlx::query_scalar("SELECT quantity_on_hand FROM inventory_items WHERE id = $1")
                .bind(item_id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match available {
            Some(available) => DecrementOutcome::InsufficientStock { available },
            None => DecrementOutcome::NotFound,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn increment(&self, item_id: ItemId, amount: u32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE inventory_items SET quantity_on_hand = quantity_on_hand + $2 WHERE id = $1",
        )
        .bind(item_id.as_i64())
        .bind(i64::from(amount))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_item(
        &self,
        business_id: BusinessId,
        item: NewInventoryItem,
    ) -> Result<InventoryRecord> {
        item.validate()?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO inventory_items (business_id, name, sku, category, unit_price_cents, quantity_on_hand, unit)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(business_id.as_i64())
        .bind(&item.name)
        .bind(&item.sku)
        .bind(&item.category)
        .bind(item.unit_price.cents())
        .bind(item.quantity_on_hand)
        .bind(&item.unit)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(row)
    }

    async fn update_item(
        &self,
        business_id: BusinessId,
        item_id: ItemId,
        update: InventoryUpdate,
    ) -> Result<Option<InventoryRecord>> {
        update.validate()?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($3, name),
                unit_price_cents = COALESCE($4, unit_price_cents),
                quantity_on_hand = COALESCE($5, quantity_on_hand),
                category = COALESCE($6, category)
            WHERE id = $1 AND business_id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id.as_i64())
        .bind(business_id.as_i64())
        .bind(&update.name)
        .bind(update.unit_price.map(|p| p.cents()))
        .bind(update.quantity_on_hand)
        .bind(&update.category)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn delete_item(&self, business_id: BusinessId, item_id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND business_id = $2")
            .bind(item_id.as_i64())
            .bind(business_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self, business_id: BusinessId) -> Result<Vec<InventoryRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE business_id = $1 ORDER BY id ASC"
        ))
        .bind(business_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderLedger for PostgresStore {
    #[tracing::instrument(skip(self, order), fields(business_id = %order.business_id, lines = order.lines.len()))]
    async fn record_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (business_id, customer_name, customer_contact, delivery_address, status, total_amount_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(order.business_id.as_i64())
        .bind(&order.customer_name)
        .bind(&order.customer_contact)
        .bind(&order.delivery_address)
        .bind(OrderStatus::Pending.as_str())
        .bind(order.total_amount.cents())
        .fetch_one(&mut *tx)
        .await?;

        let order_id = OrderId::new(row.try_get("id")?);
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, inventory_item_id, name, quantity, unit_price_cents, total_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id.as_i64())
            .bind(line.item_id.as_i64())
            .bind(&line.name)
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.cents())
            .bind(line.total_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order.into_records(order_id, created_at))
    }

    async fn get_order(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
    ) -> Result<Option<(Order, Vec<OrderLine>)>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND business_id = $2"
        ))
        .bind(order_id.as_i64())
        .bind(business_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let order = Self::row_to_order(row)?;
                let lines = self.lines_for(order.id).await?;
                Ok(Some((order, lines)))
            }
            None => Ok(None),
        }
    }

    async fn list_orders(&self, business_id: BusinessId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE business_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(business_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn transition_status(
        &self,
        business_id: BusinessId,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<TransitionOutcome> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders SET status = $4
            WHERE id = $1 AND business_id = $2 AND status = $3
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id.as_i64())
        .bind(business_id.as_i64())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(TransitionOutcome::Applied(Self::row_to_order(row)?));
        }

        let actual: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 AND business_id = $2")
                .bind(order_id.as_i64())
                .bind(business_id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match actual {
            Some(status) => TransitionOutcome::Conflict {
                actual: status.parse()?,
            },
            None => TransitionOutcome::NotFound,
        })
    }
}

#[async_trait]
impl BusinessDirectory for PostgresStore {
    async fn register_business(&self, name: &str) -> Result<BusinessId> {
        let id: i64 = sqlx::query_scalar("INSERT INTO businesses (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(BusinessId::new(id))
    }

    async fn business_exists(&self, business_id: BusinessId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM businesses WHERE id = $1)")
            .bind(business_id.as_i64())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn item_belongs_to(&self, business_id: BusinessId, item_id: ItemId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM inventory_items WHERE id = $1 AND business_id = $2)",
        )
        .bind(item_id.as_i64())
        .bind(business_id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
