//! Item type, item and price history handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::found;
use crate::dtos::catalog::{ItemRequest, ItemStateRequest, StockQuery};
use crate::dtos::SearchQuery;
use crate::middleware::Caller;
use crate::models::{HistoricalItemPrice, Item, ItemType, StockCheck};
use crate::permissions as perm;
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// Item Types
// ============================================================================

pub async fn get_item_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ItemType>, AppError> {
    let audit = state.audit(&caller, "get item type by id").await?;
    audit.authorize(perm::item_type::GET_BY_ID, "GetItemTypeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_item_type(id)
        .await
        .and_then(|value| found(value, "Item type", id));
    audit.finish(result, "Successfully retrieved item type").await.map(Json)
}

pub async fn list_item_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ItemType>>, AppError> {
    let audit = state.audit(&caller, "list item types").await?;
    audit.authorize(perm::item_type::LIST, "GetItemTypes").await?;

    let result = state.db.list_item_types().await;
    audit.finish(result, "Successfully retrieved item types").await.map(Json)
}

// ============================================================================
// Items
// ============================================================================

pub async fn get_item(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Item>, AppError> {
    let audit = state.audit(&caller, "get item by id").await?;
    audit.authorize(perm::item::GET_BY_ID, "GetItemByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_item(id)
        .await
        .and_then(|value| found(value, "Item", id));
    audit.finish(result, "Successfully retrieved item").await.map(Json)
}

pub async fn list_items(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Item>>, AppError> {
    let audit = state.audit(&caller, "list items").await?;
    audit.authorize(perm::item::LIST, "GetAllItems").await?;

    let result = state.db.list_items().await;
    audit.finish(result, "Successfully retrieved items").await.map(Json)
}

pub async fn search_items_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, AppError> {
    let audit = state.audit(&caller, "search items by id").await?;
    audit.authorize(perm::item::SEARCH_BY_ID, "SearchItemsByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_items_by_id(&term).await;
    audit.finish(result, "Successfully searched items").await.map(Json)
}

pub async fn search_items_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, AppError> {
    let audit = state.audit(&caller, "search items by name").await?;
    audit.authorize(perm::item::SEARCH_BY_NAME, "SearchItemsByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_items_by_name(&term).await;
    audit.finish(result, "Successfully searched items").await.map(Json)
}

pub async fn create_item(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let audit = state.audit(&caller, "create item").await?;
    audit.authorize(perm::item::CREATE, "CreateItem").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_item(&req.into()).await;
    audit
        .finish(result, "Successfully created item")
        .await
        .map(|item| (StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let audit = state.audit(&caller, "update item").await?;
    audit.authorize(perm::item::UPDATE, "UpdateItem").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .update_item(id, &req.into())
        .await
        .and_then(|value| found(value, "Item", id));
    audit.finish(result, "Successfully updated item").await.map(Json)
}

pub async fn update_item_state(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ItemStateRequest>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let audit = state.audit(&caller, "update item state").await?;
    audit.authorize(perm::item::UPDATE_STATE, "UpdateItemState").await?;
    let Path(id) = audit.input(id).await?;
    let Json(req) = audit.input(payload).await?;

    let result = state
        .db
        .update_item_state(id, req.item_state)
        .await
        .and_then(|value| found(value, "Item", id));
    audit.finish(result, "Successfully updated item state").await.map(Json)
}

/// GET /item/:id/stock?quantity=n
pub async fn check_stock(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    query: Result<Query<StockQuery>, QueryRejection>,
) -> Result<Json<StockCheck>, AppError> {
    let audit = state.audit(&caller, "check item stock").await?;
    audit.authorize(perm::item::CHECK_STOCK, "CheckItemStock").await?;
    let Path(id) = audit.input(id).await?;
    let query = audit.params(query).await?;

    let result = state
        .db
        .get_item(id)
        .await
        .and_then(|value| found(value, "Item", id))
        .map(|item| StockCheck::new(&item, query.quantity));
    audit.finish(result, "Successfully checked stock").await.map(Json)
}

// ============================================================================
// Price History
// ============================================================================

/// Oldest first.
pub async fn list_item_price_history(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<HistoricalItemPrice>>, AppError> {
    let audit = state.audit(&caller, "get price history of item").await?;
    audit
        .authorize(perm::historical_item_price::LIST_BY_ITEM, "GetHistoricalItemPrice")
        .await?;
    let Path(id) = audit.input(id).await?;

    let result = state.db.list_item_price_history(id).await;
    audit.finish(result, "Successfully retrieved price history").await.map(Json)
}
