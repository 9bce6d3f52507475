use super::{commit, non_empty, prefix_pattern, query_error, Database};
use crate::models::{
    Adjustment, AdjustmentFields, Invoice, LineItem, NewInvoice, NewPurchaseOrder, OrderStateType,
    PricedLine, PurchaseOrder, PurchaseOrderChanges, StateChange, StoredLine,
};
use crate::services::lifecycle::{is_editable, plan_transition, OrderState, Transition, TransitionError};
use crate::services::metrics::{DB_QUERY_DURATION, INVOICES_TOTAL, ORDER_TRANSITIONS_TOTAL};
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

type Tx = sqlx::Transaction<'static, sqlx::Postgres>;

const ORDER_COLUMNS: &str =
    "id, seller_id, customer_id, responsible_id, date_time, subtotal, total, order_state_id";

const INVOICE_COLUMNS: &str =
    "id, enterprise_data, date_time, customer_id, purchase_order_id, subtotal, total";

/// Purchase orders and invoices keep their lines, discounts and taxes in
/// `<owner>_items`, `<owner>_discounts` and `<owner>_taxes`, keyed by
/// `<owner>_id`.
#[derive(Debug, Clone, Copy)]
enum Owner {
    PurchaseOrder,
    Invoice,
}

impl Owner {
    fn prefix(self) -> &'static str {
        match self {
            Owner::PurchaseOrder => "purchase_order",
            Owner::Invoice => "invoice",
        }
    }
}

#[derive(Default)]
struct Details {
    lines: HashMap<i32, Vec<LineItem>>,
    discounts: HashMap<i32, Vec<i32>>,
    taxes: HashMap<i32, Vec<i32>>,
}

impl Details {
    fn take(&mut self, owner_id: i32) -> (Vec<LineItem>, Vec<i32>, Vec<i32>) {
        (
            self.lines.remove(&owner_id).unwrap_or_default(),
            self.discounts.remove(&owner_id).unwrap_or_default(),
            self.taxes.remove(&owner_id).unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum AdjustmentKind {
    Discount,
    Tax,
}

impl AdjustmentKind {
    fn table(self) -> &'static str {
        match self {
            AdjustmentKind::Discount => "discount_types",
            AdjustmentKind::Tax => "tax_types",
        }
    }

    fn link_column(self) -> &'static str {
        match self {
            AdjustmentKind::Discount => "discount_type_id",
            AdjustmentKind::Tax => "tax_type_id",
        }
    }
}

impl Database {
    // -------------------------------------------------------------------------
    // Order State Type Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_order_state_type(&self, id: i32) -> Result<Option<OrderStateType>, AppError> {
        sqlx::query_as::<_, OrderStateType>(
            "SELECT id, description FROM order_state_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get order state type", e))
    }

    #[instrument(skip(self))]
    pub async fn list_order_state_types(&self) -> Result<Vec<OrderStateType>, AppError> {
        sqlx::query_as::<_, OrderStateType>(
            "SELECT id, description FROM order_state_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list order state types", e))
    }

    // -------------------------------------------------------------------------
    // Purchase Order Queries
    // -------------------------------------------------------------------------

    async fn load_details(&self, owner: Owner, ids: &[i32]) -> Result<Details, AppError> {
        let mut details = Details::default();
        if ids.is_empty() {
            return Ok(details);
        }
        let prefix = owner.prefix();

        let lines = sqlx::query_as::<_, StoredLine>(&format!(
            r#"
            SELECT {p}_id AS owner_id, item_id, amount, unit_price
            FROM {p}_items
            WHERE {p}_id = ANY($1)
            ORDER BY item_id
            "#,
            p = prefix
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("load lines", e))?;

        for line in lines {
            details.lines.entry(line.owner_id).or_default().push(LineItem {
                id: line.item_id,
                amount: line.amount,
            });
        }

        for kind in [AdjustmentKind::Discount, AdjustmentKind::Tax] {
            let links = sqlx::query_as::<_, (i32, i32)>(&format!(
                "SELECT {p}_id, {c} FROM {p}_{t} WHERE {p}_id = ANY($1) ORDER BY {c}",
                p = prefix,
                c = kind.link_column(),
                t = link_suffix(kind),
            ))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("load adjustments", e))?;

            let target = match kind {
                AdjustmentKind::Discount => &mut details.discounts,
                AdjustmentKind::Tax => &mut details.taxes,
            };
            for (owner_id, adjustment_id) in links {
                target.entry(owner_id).or_default().push(adjustment_id);
            }
        }

        Ok(details)
    }

    async fn with_order_details(
        &self,
        mut orders: Vec<PurchaseOrder>,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut details = self.load_details(Owner::PurchaseOrder, &ids).await?;
        for order in &mut orders {
            (order.items, order.discounts, order.taxes) = details.take(order.id);
        }
        Ok(orders)
    }

    async fn find_orders(
        &self,
        filter: &str,
        bind: OrderFilter<'_>,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let sql = format!(
            "SELECT {} FROM purchase_orders {} ORDER BY id",
            ORDER_COLUMNS, filter
        );
        let query = sqlx::query_as::<_, PurchaseOrder>(&sql);
        let query = match bind {
            OrderFilter::None => query,
            OrderFilter::Id(id) => query.bind(id),
            OrderFilter::Pattern(pattern) => query.bind(pattern),
        };
        let orders = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list purchase orders", e))?;
        self.with_order_details(orders).await
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(&self, id: i32) -> Result<Option<PurchaseOrder>, AppError> {
        let orders = self.find_orders("WHERE id = $1", OrderFilter::Id(id)).await?;
        Ok(orders.into_iter().next())
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(&self) -> Result<Vec<PurchaseOrder>, AppError> {
        self.find_orders("", OrderFilter::None).await
    }

    #[instrument(skip(self))]
    pub async fn search_purchase_orders_by_id(
        &self,
        term: &str,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let pattern = prefix_pattern(term);
        let rows = self
            .find_orders("WHERE CAST(id AS TEXT) LIKE $1", OrderFilter::Pattern(&pattern))
            .await?;
        non_empty(rows, "purchase orders")
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders_by_customer(
        &self,
        customer_id: i32,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let rows = self
            .find_orders("WHERE customer_id = $1", OrderFilter::Id(customer_id))
            .await?;
        non_empty(rows, "purchase orders")
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders_by_seller(
        &self,
        seller_id: i32,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let rows = self
            .find_orders("WHERE seller_id = $1", OrderFilter::Id(seller_id))
            .await?;
        non_empty(rows, "purchase orders")
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders_by_state(
        &self,
        order_state_id: i32,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let rows = self
            .find_orders("WHERE order_state_id = $1", OrderFilter::Id(order_state_id))
            .await?;
        non_empty(rows, "purchase orders")
    }

    // -------------------------------------------------------------------------
    // Purchase Order Lifecycle
    // -------------------------------------------------------------------------

    /// Insert a pending order and its priced lines.
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn create_purchase_order(
        &self,
        input: &NewPurchaseOrder,
    ) -> Result<PurchaseOrder, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_purchase_order"])
            .start_timer();

        let mut tx = self.begin().await?;

        let order_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO purchase_orders (seller_id, customer_id, responsible_id, date_time,
                                         subtotal, total, order_state_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.seller_id)
        .bind(input.customer_id)
        .bind(input.responsible_id)
        .bind(input.date_time)
        .bind(input.subtotal)
        .bind(input.total)
        .bind(OrderState::Pending.id())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| query_error("create purchase order", e))?;

        insert_lines(&mut tx, Owner::PurchaseOrder, order_id, &input.lines).await?;

        commit(tx).await?;
        timer.observe_duration();

        info!(purchase_order_id = order_id, "Purchase order created");

        self.get_purchase_order(order_id).await?.ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Purchase order {} vanished", order_id))
        })
    }

    /// Replace the contents of a pending order.
    #[instrument(skip(self, changes))]
    pub async fn update_purchase_order(
        &self,
        id: i32,
        changes: &PurchaseOrderChanges,
    ) -> Result<Option<PurchaseOrder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_purchase_order"])
            .start_timer();

        let mut tx = self.begin().await?;

        let state = sqlx::query_scalar::<_, i32>(
            "SELECT order_state_id FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| query_error("update purchase order", e))?;

        let Some(state) = state else {
            return Ok(None);
        };
        if !is_editable(state) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Only pending purchase orders can be modified"
            )));
        }

        sqlx::query(
            r#"
            UPDATE purchase_orders SET
                seller_id = COALESCE($2, seller_id),
                customer_id = COALESCE($3, customer_id),
                responsible_id = COALESCE($4, responsible_id),
                date_time = COALESCE($5, date_time),
                subtotal = $6,
                total = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.seller_id)
        .bind(changes.customer_id)
        .bind(changes.responsible_id)
        .bind(changes.date_time)
        .bind(changes.subtotal)
        .bind(changes.total)
        .execute(&mut *tx)
        .await
        .map_err(|e| query_error("update purchase order", e))?;

        for table in ["items", "discounts", "taxes"] {
            sqlx::query(&format!(
                "DELETE FROM purchase_order_{} WHERE purchase_order_id = $1",
                table
            ))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("update purchase order", e))?;
        }

        insert_lines(&mut tx, Owner::PurchaseOrder, id, &changes.lines).await?;
        insert_links(&mut tx, Owner::PurchaseOrder, AdjustmentKind::Discount, id, &changes.discounts)
            .await?;
        insert_links(&mut tx, Owner::PurchaseOrder, AdjustmentKind::Tax, id, &changes.taxes).await?;

        commit(tx).await?;
        timer.observe_duration();

        self.get_purchase_order(id).await
    }

    /// Move an order to `to_state_id`.
    ///
    /// Paying consumes stock for every line and issues an invoice copying the
    /// order's customer, lines, adjustments and totals. Nothing is committed
    /// unless every step succeeds.
    #[instrument(skip(self, enterprise_data))]
    pub async fn change_purchase_order_state(
        &self,
        id: i32,
        to_state_id: i32,
        enterprise_data: &str,
    ) -> Result<StateChange, AppError> {
        if self.get_order_state_type(to_state_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Order state {} not found",
                to_state_id
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["change_purchase_order_state"])
            .start_timer();

        let mut tx = self.begin().await?;

        let order = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT {} FROM purchase_orders WHERE id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| query_error("load purchase order", e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Purchase order {} not found", id)))?;

        let transition = plan_transition(order.order_state_id, to_state_id).map_err(|e| match e {
            TransitionError::NotAllowed { from, to } => {
                warn!(%from, %to, purchase_order_id = id, "Rejected state transition");
                AppError::BadRequest(anyhow::anyhow!("Invalid state transition"))
            }
            TransitionError::UnknownState(_) => AppError::NotFound(e.into()),
        })?;

        let invoice_id = match transition {
            Transition::Pay => Some(pay_order(&mut tx, &order, enterprise_data).await?),
            Transition::Cancel => None,
        };

        sqlx::query("UPDATE purchase_orders SET order_state_id = $2 WHERE id = $1")
            .bind(id)
            .bind(transition.target().id())
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("change purchase order state", e))?;

        commit(tx).await?;
        timer.observe_duration();

        ORDER_TRANSITIONS_TOTAL
            .with_label_values(&[transition.target().as_str()])
            .inc();
        if invoice_id.is_some() {
            INVOICES_TOTAL.with_label_values(&["purchase_order"]).inc();
        }

        info!(
            purchase_order_id = id,
            to_state = %transition.target(),
            invoice_id = ?invoice_id,
            "Purchase order state changed"
        );

        let purchase_order = self.get_purchase_order(id).await?.ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Purchase order {} vanished", id))
        })?;
        let invoice = match invoice_id {
            Some(invoice_id) => self.get_invoice(invoice_id).await?,
            None => None,
        };

        Ok(StateChange {
            purchase_order,
            invoice,
        })
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    async fn find_invoices(&self, sql: &str, pattern: Option<&str>) -> Result<Vec<Invoice>, AppError> {
        let query = sqlx::query_as::<_, Invoice>(sql);
        let query = match pattern {
            Some(pattern) => query.bind(pattern),
            None => query,
        };
        let mut invoices = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list invoices", e))?;

        let ids: Vec<i32> = invoices.iter().map(|i| i.id).collect();
        let mut details = self.load_details(Owner::Invoice, &ids).await?;
        for invoice in &mut invoices {
            (invoice.items, invoice.discounts, invoice.taxes) = details.take(invoice.id);
        }
        Ok(invoices)
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: i32) -> Result<Option<Invoice>, AppError> {
        let sql = format!("SELECT {} FROM invoices WHERE id = $1", INVOICE_COLUMNS);
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("get invoice", e))?;

        let Some(mut invoice) = invoice else {
            return Ok(None);
        };
        let mut details = self.load_details(Owner::Invoice, &[invoice.id]).await?;
        (invoice.items, invoice.discounts, invoice.taxes) = details.take(invoice.id);
        Ok(Some(invoice))
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        let sql = format!("SELECT {} FROM invoices ORDER BY id", INVOICE_COLUMNS);
        self.find_invoices(&sql, None).await
    }

    #[instrument(skip(self))]
    pub async fn search_invoices_by_id(&self, term: &str) -> Result<Vec<Invoice>, AppError> {
        let sql = format!(
            "SELECT {} FROM invoices WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            INVOICE_COLUMNS
        );
        let rows = self.find_invoices(&sql, Some(&prefix_pattern(term))).await?;
        non_empty(rows, "invoices")
    }

    /// Invoices whose customer's personal identifier starts with `term`.
    #[instrument(skip(self))]
    pub async fn search_invoices_by_customer_personal_id(
        &self,
        term: &str,
    ) -> Result<Vec<Invoice>, AppError> {
        let sql = r#"
            SELECT i.id, i.enterprise_data, i.date_time, i.customer_id, i.purchase_order_id,
                   i.subtotal, i.total
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            WHERE c.customer_id LIKE $1
            ORDER BY i.id
        "#;
        let rows = self.find_invoices(sql, Some(&prefix_pattern(term))).await?;
        non_empty(rows, "invoices")
    }

    /// Issue an invoice outside the order flow. Stock is consumed as for a
    /// paid order.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id))]
    pub async fn create_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.begin().await?;

        let customer_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                .bind(input.customer_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| query_error("check customer", e))?;
        if !customer_exists {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                input.customer_id
            )));
        }

        for line in &input.lines {
            consume_stock(&mut tx, line.item_id, line.amount).await?;
        }

        let invoice_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO invoices (enterprise_data, date_time, customer_id, subtotal, total)
            VALUES ($1, LOCALTIMESTAMP, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.enterprise_data)
        .bind(input.customer_id)
        .bind(input.subtotal)
        .bind(input.total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| query_error("create invoice", e))?;

        insert_lines(&mut tx, Owner::Invoice, invoice_id, &input.lines).await?;
        insert_links(&mut tx, Owner::Invoice, AdjustmentKind::Discount, invoice_id, &input.discounts)
            .await?;
        insert_links(&mut tx, Owner::Invoice, AdjustmentKind::Tax, invoice_id, &input.taxes).await?;

        commit(tx).await?;
        timer.observe_duration();

        INVOICES_TOTAL.with_label_values(&["direct"]).inc();
        info!(invoice_id, "Invoice created");

        self.get_invoice(invoice_id).await?.ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Invoice {} vanished", invoice_id))
        })
    }

    // -------------------------------------------------------------------------
    // Discount and Tax Type Operations
    // -------------------------------------------------------------------------

    async fn get_adjustment(
        &self,
        kind: AdjustmentKind,
        id: i32,
    ) -> Result<Option<Adjustment>, AppError> {
        sqlx::query_as::<_, Adjustment>(&format!(
            "SELECT id, name, value, is_percentage FROM {} WHERE id = $1",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get adjustment", e))
    }

    async fn list_adjustments(&self, kind: AdjustmentKind) -> Result<Vec<Adjustment>, AppError> {
        sqlx::query_as::<_, Adjustment>(&format!(
            "SELECT id, name, value, is_percentage FROM {} ORDER BY id",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list adjustments", e))
    }

    async fn adjustments_by_ids(
        &self,
        kind: AdjustmentKind,
        ids: &[i32],
    ) -> Result<Vec<Adjustment>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Adjustment>(&format!(
            "SELECT id, name, value, is_percentage FROM {} WHERE id = ANY($1)",
            kind.table()
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("load adjustments", e))
    }

    async fn create_adjustment(
        &self,
        kind: AdjustmentKind,
        input: &AdjustmentFields,
    ) -> Result<Adjustment, AppError> {
        sqlx::query_as::<_, Adjustment>(&format!(
            r#"
            INSERT INTO {} (name, value, is_percentage)
            VALUES ($1, $2, $3)
            RETURNING id, name, value, is_percentage
            "#,
            kind.table()
        ))
        .bind(&input.name)
        .bind(input.value)
        .bind(input.is_percentage)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("create adjustment", e))
    }

    #[instrument(skip(self))]
    pub async fn get_discount_type(&self, id: i32) -> Result<Option<Adjustment>, AppError> {
        self.get_adjustment(AdjustmentKind::Discount, id).await
    }

    #[instrument(skip(self))]
    pub async fn list_discount_types(&self) -> Result<Vec<Adjustment>, AppError> {
        self.list_adjustments(AdjustmentKind::Discount).await
    }

    #[instrument(skip(self))]
    pub async fn get_discount_types_by_ids(&self, ids: &[i32]) -> Result<Vec<Adjustment>, AppError> {
        self.adjustments_by_ids(AdjustmentKind::Discount, ids).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_discount_type(&self, input: &AdjustmentFields) -> Result<Adjustment, AppError> {
        self.create_adjustment(AdjustmentKind::Discount, input).await
    }

    #[instrument(skip(self))]
    pub async fn get_tax_type(&self, id: i32) -> Result<Option<Adjustment>, AppError> {
        self.get_adjustment(AdjustmentKind::Tax, id).await
    }

    #[instrument(skip(self))]
    pub async fn list_tax_types(&self) -> Result<Vec<Adjustment>, AppError> {
        self.list_adjustments(AdjustmentKind::Tax).await
    }

    #[instrument(skip(self))]
    pub async fn get_tax_types_by_ids(&self, ids: &[i32]) -> Result<Vec<Adjustment>, AppError> {
        self.adjustments_by_ids(AdjustmentKind::Tax, ids).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_tax_type(&self, input: &AdjustmentFields) -> Result<Adjustment, AppError> {
        self.create_adjustment(AdjustmentKind::Tax, input).await
    }
}

enum OrderFilter<'a> {
    None,
    Id(i32),
    Pattern(&'a str),
}

fn link_suffix(kind: AdjustmentKind) -> &'static str {
    match kind {
        AdjustmentKind::Discount => "discounts",
        AdjustmentKind::Tax => "taxes",
    }
}

async fn insert_lines(
    tx: &mut Tx,
    owner: Owner,
    owner_id: i32,
    lines: &[PricedLine],
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO {p}_items ({p}_id, item_id, amount, unit_price) VALUES ($1, $2, $3, $4)",
        p = owner.prefix()
    );
    for line in lines {
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(line.item_id)
            .bind(line.amount)
            .bind(line.unit_price)
            .execute(&mut **tx)
            .await
            .map_err(|e| query_error("insert lines", e))?;
    }
    Ok(())
}

async fn insert_links(
    tx: &mut Tx,
    owner: Owner,
    kind: AdjustmentKind,
    owner_id: i32,
    ids: &[i32],
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT INTO {p}_{t} ({p}_id, {c}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        p = owner.prefix(),
        t = link_suffix(kind),
        c = kind.link_column(),
    );
    for &id in ids {
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| query_error("insert adjustments", e))?;
    }
    Ok(())
}

/// Take `amount` units of an item out of stock, failing if not enough remain.
async fn consume_stock(tx: &mut Tx, item_id: i32, amount: i32) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE items SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
        .bind(item_id)
        .bind(amount)
        .execute(&mut **tx)
        .await
        .map_err(|e| query_error("consume stock", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Insufficient stock for item {}",
            item_id
        )));
    }
    Ok(())
}

/// Consume stock for every line of `order` and copy it into a new invoice.
async fn pay_order(tx: &mut Tx, order: &PurchaseOrder, enterprise_data: &str) -> Result<i32, AppError> {
    let customer_id = order.customer_id.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "A customer is required to pay a purchase order"
        ))
    })?;

    let lines = sqlx::query_as::<_, (i32, i32)>(
        "SELECT item_id, amount FROM purchase_order_items WHERE purchase_order_id = $1 ORDER BY item_id",
    )
    .bind(order.id)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| query_error("load purchase order lines", e))?;

    for (item_id, amount) in lines {
        consume_stock(tx, item_id, amount).await?;
    }

    let invoice_id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO invoices (enterprise_data, date_time, customer_id, purchase_order_id,
                              subtotal, total)
        VALUES ($1, LOCALTIMESTAMP, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(enterprise_data)
    .bind(customer_id)
    .bind(order.id)
    .bind(order.subtotal)
    .bind(order.total)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| query_error("create invoice", e))?;

    sqlx::query(
        r#"
        INSERT INTO invoice_items (invoice_id, item_id, amount, unit_price)
        SELECT $1, item_id, amount, unit_price
        FROM purchase_order_items WHERE purchase_order_id = $2
        "#,
    )
    .bind(invoice_id)
    .bind(order.id)
    .execute(&mut **tx)
    .await
    .map_err(|e| query_error("copy invoice lines", e))?;

    for kind in [AdjustmentKind::Discount, AdjustmentKind::Tax] {
        sqlx::query(&format!(
            r#"
            INSERT INTO invoice_{t} (invoice_id, {c})
            SELECT $1, {c} FROM purchase_order_{t} WHERE purchase_order_id = $2
            "#,
            t = link_suffix(kind),
            c = kind.link_column(),
        ))
        .bind(invoice_id)
        .bind(order.id)
        .execute(&mut **tx)
        .await
        .map_err(|e| query_error("copy invoice adjustments", e))?;
    }

    Ok(invoice_id)
}
