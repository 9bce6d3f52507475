//! Purchase orders, invoices, discount and tax types, and billing math.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;

use super::found;
use crate::dtos::sales::{
    AdjustmentRequest, ChangeStateRequest, CreateInvoiceRequest, CreatePurchaseOrderRequest,
    SubtotalRequest, SubtotalResponse, TotalRequest, UpdatePurchaseOrderRequest,
};
use crate::dtos::{ErrorResponse, SearchQuery};
use crate::middleware::Caller;
use crate::models::{
    Adjustment, Invoice, LineItem, NewInvoice, NewPurchaseOrder, OrderStateType, PricedLine,
    PurchaseOrder, PurchaseOrderChanges, StateChange,
};
use crate::permissions as perm;
use crate::services::billing::{self, Totals};
use crate::services::lifecycle::is_editable;
use crate::services::Database;
use crate::AppState;
use service_core::error::AppError;

/// Price request lines against the current catalog.
async fn price(db: &Database, lines: &[LineItem]) -> Result<Vec<PricedLine>, AppError> {
    let ids: Vec<i32> = lines.iter().map(|line| line.id).collect();
    let items = db.get_items_by_ids(&ids).await?;
    billing::price_lines(lines, &items)
}

/// Price lines and apply the named discount and tax types.
async fn price_with_adjustments(
    db: &Database,
    lines: &[LineItem],
    discount_ids: &[i32],
    tax_ids: &[i32],
) -> Result<(Vec<PricedLine>, Totals), AppError> {
    let priced = price(db, lines).await?;
    let discounts = billing::resolve_adjustments(
        discount_ids,
        &db.get_discount_types_by_ids(discount_ids).await?,
        "Discount type",
    )?;
    let taxes = billing::resolve_adjustments(
        tax_ids,
        &db.get_tax_types_by_ids(tax_ids).await?,
        "Tax type",
    )?;
    let totals = billing::totals(&priced, &discounts, &taxes);
    Ok((priced, totals))
}

// ============================================================================
// Order State Types
// ============================================================================

pub async fn get_order_state_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<OrderStateType>, AppError> {
    let audit = state.audit(&caller, "get order state type by id").await?;
    audit
        .authorize(perm::order_state_type::GET_BY_ID, "GetOrderStateTypeByID")
        .await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_order_state_type(id)
        .await
        .and_then(|value| found(value, "Order state type", id));
    audit.finish(result, "Successfully retrieved order state type").await.map(Json)
}

pub async fn list_order_state_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<OrderStateType>>, AppError> {
    let audit = state.audit(&caller, "list order state types").await?;
    audit.authorize(perm::order_state_type::LIST, "GetOrderStateTypes").await?;

    let result = state.db.list_order_state_types().await;
    audit.finish(result, "Successfully retrieved order state types").await.map(Json)
}

// ============================================================================
// Purchase Orders
// ============================================================================

pub async fn get_purchase_order(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<PurchaseOrder>, AppError> {
    let audit = state.audit(&caller, "get purchase order by id").await?;
    audit.authorize(perm::purchase_order::GET_BY_ID, "GetPurchaseOrderByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_purchase_order(id)
        .await
        .and_then(|value| found(value, "Purchase order", id));
    audit.finish(result, "Successfully retrieved purchase order").await.map(Json)
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<PurchaseOrder>>, AppError> {
    let audit = state.audit(&caller, "list purchase orders").await?;
    audit.authorize(perm::purchase_order::LIST, "GetAllPurchaseOrders").await?;

    let result = state.db.list_purchase_orders().await;
    audit.finish(result, "Successfully retrieved purchase orders").await.map(Json)
}

pub async fn search_purchase_orders_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<PurchaseOrder>>, AppError> {
    let audit = state.audit(&caller, "search purchase orders by id").await?;
    audit
        .authorize(perm::purchase_order::SEARCH_BY_ID, "SearchPurchaseOrdersByID")
        .await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_purchase_orders_by_id(&term).await;
    audit.finish(result, "Successfully searched purchase orders").await.map(Json)
}

pub async fn list_purchase_orders_by_customer(
    State(state): State<AppState>,
    caller: Caller,
    customer_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<PurchaseOrder>>, AppError> {
    let audit = state.audit(&caller, "list purchase orders of customer").await?;
    audit
        .authorize(perm::purchase_order::LIST_BY_CUSTOMER, "GetPurchaseOrdersByCustomerID")
        .await?;
    let Path(customer_id) = audit.input(customer_id).await?;

    let result = state.db.list_purchase_orders_by_customer(customer_id).await;
    audit.finish(result, "Successfully retrieved purchase orders").await.map(Json)
}

pub async fn list_purchase_orders_by_seller(
    State(state): State<AppState>,
    caller: Caller,
    seller_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<PurchaseOrder>>, AppError> {
    let audit = state.audit(&caller, "list purchase orders of seller").await?;
    audit
        .authorize(perm::purchase_order::LIST_BY_SELLER, "GetPurchaseOrdersBySellerID")
        .await?;
    let Path(seller_id) = audit.input(seller_id).await?;

    let result = state.db.list_purchase_orders_by_seller(seller_id).await;
    audit.finish(result, "Successfully retrieved purchase orders").await.map(Json)
}

pub async fn list_purchase_orders_by_state(
    State(state): State<AppState>,
    caller: Caller,
    order_state_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<PurchaseOrder>>, AppError> {
    let audit = state.audit(&caller, "list purchase orders by state").await?;
    audit
        .authorize(perm::purchase_order::LIST_BY_STATE, "GetPurchaseOrdersByState")
        .await?;
    let Path(order_state_id) = audit.input(order_state_id).await?;

    let result = state.db.list_purchase_orders_by_state(order_state_id).await;
    audit.finish(result, "Successfully retrieved purchase orders").await.map(Json)
}

/// Open a pending order. Lines are priced at the items' current selling
/// price; no adjustments apply until the order is updated.
#[utoipa::path(
    post,
    path = "/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created", body = PurchaseOrder),
        (status = 400, description = "Disabled item or invalid amount", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Purchase Orders",
    security(("caller_email" = []))
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreatePurchaseOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PurchaseOrder>), AppError> {
    let audit = state.audit(&caller, "create purchase order").await?;
    audit.authorize(perm::purchase_order::CREATE, "CreatePurchaseOrder").await?;
    let req = audit.payload(payload).await?;

    let result: Result<PurchaseOrder, AppError> = async {
        let lines = price(&state.db, &req.items).await?;
        let subtotal = billing::subtotal(&lines);
        let order = NewPurchaseOrder {
            seller_id: req.seller_id,
            customer_id: req.customer_id,
            responsible_id: req.responsible_id,
            date_time: Local::now().naive_local(),
            subtotal,
            total: subtotal,
            lines,
        };
        state.db.create_purchase_order(&order).await
    }
    .await;

    audit
        .finish(result, "Successfully created purchase order")
        .await
        .map(|order| (StatusCode::CREATED, Json(order)))
}

/// Replace the contents of a pending order and recompute its totals.
#[utoipa::path(
    put,
    path = "/purchase-orders/{id}",
    request_body = UpdatePurchaseOrderRequest,
    params(
        ("id" = i32, Path, description = "Purchase order id")
    ),
    responses(
        (status = 200, description = "Purchase order updated", body = PurchaseOrder),
        (status = 400, description = "Order is no longer pending", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Order, item, discount or tax not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Purchase Orders",
    security(("caller_email" = []))
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdatePurchaseOrderRequest>, JsonRejection>,
) -> Result<Json<PurchaseOrder>, AppError> {
    let audit = state.audit(&caller, "update purchase order").await?;
    audit.authorize(perm::purchase_order::UPDATE, "UpdatePurchaseOrder").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result: Result<PurchaseOrder, AppError> = async {
        let current = found(
            state.db.get_purchase_order(id).await?,
            "Purchase order",
            id,
        )?;
        if !is_editable(current.order_state_id) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Only pending purchase orders can be modified"
            )));
        }

        let (lines, totals) =
            price_with_adjustments(&state.db, &req.items, &req.discounts, &req.taxes).await?;
        let changes = PurchaseOrderChanges {
            seller_id: req.seller_id,
            customer_id: req.customer_id,
            responsible_id: req.responsible_id,
            date_time: req.date_time,
            subtotal: totals.subtotal,
            total: totals.total,
            lines,
            discounts: req.discounts,
            taxes: req.taxes,
        };
        state
            .db
            .update_purchase_order(id, &changes)
            .await
            .and_then(|value| found(value, "Purchase order", id))
    }
    .await;

    audit.finish(result, "Successfully updated purchase order").await.map(Json)
}

/// Pay or cancel a pending order. Paying consumes stock and issues the
/// invoice in the same transaction.
#[utoipa::path(
    patch,
    path = "/purchase-orders/{id}/state",
    request_body = ChangeStateRequest,
    params(
        ("id" = i32, Path, description = "Purchase order id")
    ),
    responses(
        (status = 200, description = "State changed; invoice present when paid", body = StateChange),
        (status = 400, description = "Invalid state transition or order without customer", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Order or state not found", body = ErrorResponse),
        (status = 409, description = "Insufficient stock", body = ErrorResponse)
    ),
    tag = "Purchase Orders",
    security(("caller_email" = []))
)]
pub async fn change_purchase_order_state(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ChangeStateRequest>, JsonRejection>,
) -> Result<Json<StateChange>, AppError> {
    let audit = state.audit(&caller, "change purchase order state").await?;
    audit
        .authorize(perm::purchase_order::CHANGE_STATE, "ChangePurchaseOrderState")
        .await?;
    let Path(id) = audit.input(id).await?;
    let Json(req) = audit.input(payload).await?;

    let result = state
        .db
        .change_purchase_order_state(id, req.order_state_id, &state.config.invoicing.enterprise_data)
        .await;
    audit.finish(result, "Successfully changed purchase order state").await.map(Json)
}

// ============================================================================
// Invoices
// ============================================================================

pub async fn get_invoice(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Invoice>, AppError> {
    let audit = state.audit(&caller, "get invoice by id").await?;
    audit.authorize(perm::invoice::GET_BY_ID, "GetInvoiceByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_invoice(id)
        .await
        .and_then(|value| found(value, "Invoice", id));
    audit.finish(result, "Successfully retrieved invoice").await.map(Json)
}

pub async fn list_invoices(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let audit = state.audit(&caller, "list invoices").await?;
    audit.authorize(perm::invoice::LIST, "GetAllInvoices").await?;

    let result = state.db.list_invoices().await;
    audit.finish(result, "Successfully retrieved invoices").await.map(Json)
}

pub async fn search_invoices_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let audit = state.audit(&caller, "search invoices by id").await?;
    audit.authorize(perm::invoice::SEARCH_BY_ID, "SearchInvoicesByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_invoices_by_id(&term).await;
    audit.finish(result, "Successfully searched invoices").await.map(Json)
}

/// GET /invoices/searchByCustomerPersonalId?customer_id=
pub async fn search_invoices_by_customer_personal_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    let audit = state
        .audit(&caller, "search invoices by customer personal id")
        .await?;
    audit
        .authorize(
            perm::invoice::SEARCH_BY_CUSTOMER_PERSONAL_ID,
            "SearchInvoicesByCustomerPersonalID",
        )
        .await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.customer_id).await?;

    let result = state.db.search_invoices_by_customer_personal_id(&term).await;
    audit.finish(result, "Successfully searched invoices").await.map(Json)
}

/// Issue an invoice directly, outside the purchase-order flow.
#[utoipa::path(
    post,
    path = "/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice issued", body = Invoice),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Customer, item, discount or tax not found", body = ErrorResponse),
        (status = 409, description = "Insufficient stock", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Billing",
    security(("caller_email" = []))
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let audit = state.audit(&caller, "create invoice").await?;
    audit.authorize(perm::invoice::CREATE, "CreateInvoice").await?;
    let req = audit.payload(payload).await?;

    let result: Result<Invoice, AppError> = async {
        let (lines, totals) =
            price_with_adjustments(&state.db, &req.items, &req.discounts, &req.taxes).await?;
        let invoice = NewInvoice {
            enterprise_data: req
                .enterprise_data
                .filter(|data| !data.trim().is_empty())
                .unwrap_or_else(|| state.config.invoicing.enterprise_data.clone()),
            customer_id: req.customer_id,
            subtotal: totals.subtotal,
            total: totals.total,
            lines,
            discounts: req.discounts,
            taxes: req.taxes,
        };
        state.db.create_invoice(&invoice).await
    }
    .await;

    audit
        .finish(result, "Successfully created invoice")
        .await
        .map(|invoice| (StatusCode::CREATED, Json(invoice)))
}

// ============================================================================
// Discount and Tax Types
// ============================================================================

pub async fn get_discount_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Adjustment>, AppError> {
    let audit = state.audit(&caller, "get discount type by id").await?;
    audit.authorize(perm::discount_type::GET_BY_ID, "GetDiscountTypeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_discount_type(id)
        .await
        .and_then(|value| found(value, "Discount type", id));
    audit.finish(result, "Successfully retrieved discount type").await.map(Json)
}

pub async fn list_discount_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Adjustment>>, AppError> {
    let audit = state.audit(&caller, "list discount types").await?;
    audit.authorize(perm::discount_type::LIST, "GetAllDiscountTypes").await?;

    let result = state.db.list_discount_types().await;
    audit.finish(result, "Successfully retrieved discount types").await.map(Json)
}

pub async fn create_discount_type(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Adjustment>), AppError> {
    let audit = state.audit(&caller, "create discount type").await?;
    audit.authorize(perm::discount_type::CREATE, "CreateDiscountType").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_discount_type(&req.into()).await;
    audit
        .finish(result, "Successfully created discount type")
        .await
        .map(|discount| (StatusCode::CREATED, Json(discount)))
}

pub async fn get_tax_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Adjustment>, AppError> {
    let audit = state.audit(&caller, "get tax type by id").await?;
    audit.authorize(perm::tax_type::GET_BY_ID, "GetTaxTypeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_tax_type(id)
        .await
        .and_then(|value| found(value, "Tax type", id));
    audit.finish(result, "Successfully retrieved tax type").await.map(Json)
}

pub async fn list_tax_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Adjustment>>, AppError> {
    let audit = state.audit(&caller, "list tax types").await?;
    audit.authorize(perm::tax_type::LIST, "GetAllTaxTypes").await?;

    let result = state.db.list_tax_types().await;
    audit.finish(result, "Successfully retrieved tax types").await.map(Json)
}

pub async fn create_tax_type(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Adjustment>), AppError> {
    let audit = state.audit(&caller, "create tax type").await?;
    audit.authorize(perm::tax_type::CREATE, "CreateTaxType").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_tax_type(&req.into()).await;
    audit
        .finish(result, "Successfully created tax type")
        .await
        .map(|tax| (StatusCode::CREATED, Json(tax)))
}

// ============================================================================
// Billing
// ============================================================================

#[utoipa::path(
    post,
    path = "/billing/subtotal",
    request_body = SubtotalRequest,
    responses(
        (status = 200, description = "Sum of price times amount, rounded to cents", body = SubtotalResponse),
        (status = 400, description = "Disabled item or invalid amount", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "Billing",
    security(("caller_email" = []))
)]
pub async fn calculate_subtotal(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<SubtotalRequest>, JsonRejection>,
) -> Result<Json<SubtotalResponse>, AppError> {
    let audit = state.audit(&caller, "calculate subtotal").await?;
    audit.authorize(perm::billing::CALCULATE_SUBTOTAL, "CalculateSubtotal").await?;
    let req = audit.payload(payload).await?;

    let result = price(&state.db, &req.items)
        .await
        .map(|lines| billing::subtotal(&lines));
    audit
        .finish(result, "Successfully calculated subtotal")
        .await
        .map(|subtotal| Json(SubtotalResponse { subtotal }))
}

#[utoipa::path(
    post,
    path = "/billing/total",
    request_body = TotalRequest,
    responses(
        (status = 200, description = "Subtotal, discount, tax and total", body = Totals),
        (status = 400, description = "Disabled item or invalid amount", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Item, discount or tax not found", body = ErrorResponse)
    ),
    tag = "Billing",
    security(("caller_email" = []))
)]
pub async fn calculate_total(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<TotalRequest>, JsonRejection>,
) -> Result<Json<Totals>, AppError> {
    let audit = state.audit(&caller, "calculate total").await?;
    audit.authorize(perm::billing::CALCULATE_TOTAL, "CalculateTotal").await?;
    let req = audit.payload(payload).await?;

    let result = price_with_adjustments(&state.db, &req.items, &req.discounts, &req.taxes)
        .await
        .map(|(_, totals)| totals);
    audit.finish(result, "Successfully calculated total").await.map(Json)
}
