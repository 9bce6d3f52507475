use super::{commit, contains_pattern, non_empty, prefix_pattern, query_error, Database};
use crate::models::{HistoricalItemPrice, Item, ItemFields, ItemType};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};

const ITEM_COLUMNS: &str =
    "id, name, description, stock, selling_price, purchase_price, item_state, item_type_id";

fn item_error(operation: &str, item_type_id: i32, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::NotFound(anyhow::anyhow!("Item type {} not found", item_type_id))
        }
        _ => query_error(operation, e),
    }
}

impl Database {
    // -------------------------------------------------------------------------
    // Item Type Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_item_type(&self, id: i32) -> Result<Option<ItemType>, AppError> {
        sqlx::query_as::<_, ItemType>("SELECT id, name FROM item_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("get item type", e))
    }

    #[instrument(skip(self))]
    pub async fn list_item_types(&self) -> Result<Vec<ItemType>, AppError> {
        sqlx::query_as::<_, ItemType>("SELECT id, name FROM item_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list item types", e))
    }

    // -------------------------------------------------------------------------
    // Item Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<Option<Item>, AppError> {
        sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("get item", e))
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items ORDER BY id", ITEM_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list items", e))
    }

    /// Load every item named in `ids`. Missing ids are simply absent.
    #[instrument(skip(self))]
    pub async fn get_items_by_ids(&self, ids: &[i32]) -> Result<Vec<Item>, AppError> {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE id = ANY($1) ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("load items", e))
    }

    #[instrument(skip(self))]
    pub async fn search_items_by_id(&self, term: &str) -> Result<Vec<Item>, AppError> {
        let rows = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search items", e))?;
        non_empty(rows, "items")
    }

    #[instrument(skip(self))]
    pub async fn search_items_by_name(&self, term: &str) -> Result<Vec<Item>, AppError> {
        let rows = sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE name ILIKE $1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search items", e))?;
        non_empty(rows, "items")
    }

    /// Insert an item and its first price history row.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(&self, input: &ItemFields) -> Result<Item, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        let mut tx = self.begin().await?;

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (name, description, stock, selling_price, purchase_price,
                               item_state, item_type_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.stock)
        .bind(input.selling_price)
        .bind(input.purchase_price)
        .bind(input.item_state)
        .bind(input.item_type_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| item_error("create item", input.item_type_id, e))?;

        record_price(&mut tx, item.id, item.selling_price).await?;

        commit(tx).await?;
        timer.observe_duration();

        info!(item_id = item.id, "Item created");

        Ok(item)
    }

    /// Replace an item. A changed selling price appends a history row in the
    /// same transaction.
    #[instrument(skip(self, input))]
    pub async fn update_item(&self, id: i32, input: &ItemFields) -> Result<Option<Item>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_item"])
            .start_timer();

        let mut tx = self.begin().await?;

        let previous_price = sqlx::query_scalar::<_, rust_decimal::Decimal>(
            "SELECT selling_price FROM items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| query_error("update item", e))?;

        let Some(previous_price) = previous_price else {
            return Ok(None);
        };

        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items SET
                name = $2, description = $3, stock = $4, selling_price = $5,
                purchase_price = $6, item_state = $7, item_type_id = $8
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.stock)
        .bind(input.selling_price)
        .bind(input.purchase_price)
        .bind(input.item_state)
        .bind(input.item_type_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| item_error("update item", input.item_type_id, e))?;

        if item.selling_price != previous_price {
            record_price(&mut tx, item.id, item.selling_price).await?;
            info!(item_id = item.id, price = %item.selling_price, "Selling price changed");
        }

        commit(tx).await?;
        timer.observe_duration();

        Ok(Some(item))
    }

    #[instrument(skip(self))]
    pub async fn update_item_state(
        &self,
        id: i32,
        item_state: bool,
    ) -> Result<Option<Item>, AppError> {
        sqlx::query_as::<_, Item>(&format!(
            "UPDATE items SET item_state = $2 WHERE id = $1 RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(item_state)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("update item state", e))
    }

    // -------------------------------------------------------------------------
    // Price History Operations
    // -------------------------------------------------------------------------

    /// Price history of an item, oldest first.
    #[instrument(skip(self))]
    pub async fn list_item_price_history(
        &self,
        item_id: i32,
    ) -> Result<Vec<HistoricalItemPrice>, AppError> {
        let rows = sqlx::query_as::<_, HistoricalItemPrice>(
            r#"
            SELECT id, item_id, price, modification_date
            FROM historical_item_prices
            WHERE item_id = $1
            ORDER BY modification_date, id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list price history", e))?;
        non_empty(rows, "historical prices")
    }
}

async fn record_price(
    tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
    item_id: i32,
    price: rust_decimal::Decimal,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO historical_item_prices (item_id, price, modification_date)
        VALUES ($1, $2, LOCALTIMESTAMP)
        "#,
    )
    .bind(item_id)
    .bind(price)
    .execute(&mut **tx)
    .await
    .map_err(|e| query_error("record price history", e))?;
    Ok(())
}
