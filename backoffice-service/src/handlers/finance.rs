//! External sales, additional expenses and the sales report.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::found;
use crate::dtos::finance::{AdditionalExpenseRequest, ExternalSaleRequest, ReportQuery};
use crate::dtos::MessageResponse;
use crate::middleware::Caller;
use crate::models::{AdditionalExpense, ExternalSale, SalesReport};
use crate::permissions as perm;
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// External Sales
// ============================================================================

pub async fn get_external_sale(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ExternalSale>, AppError> {
    let audit = state.audit(&caller, "get external sale by id").await?;
    audit.authorize(perm::external_sale::GET_BY_ID, "GetExternalSaleByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_external_sale(id)
        .await
        .and_then(|value| found(value, "External sale", id));
    audit.finish(result, "Successfully retrieved external sale").await.map(Json)
}

pub async fn list_external_sales(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<ExternalSale>>, AppError> {
    let audit = state.audit(&caller, "list external sales").await?;
    audit.authorize(perm::external_sale::LIST, "GetAllExternalSales").await?;

    let result = state.db.list_external_sales().await;
    audit.finish(result, "Successfully retrieved external sales").await.map(Json)
}

pub async fn create_external_sale(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ExternalSaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExternalSale>), AppError> {
    let audit = state.audit(&caller, "create external sale").await?;
    audit.authorize(perm::external_sale::CREATE, "CreateExternalSale").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_external_sale(&req.into()).await;
    audit
        .finish(result, "Successfully created external sale")
        .await
        .map(|sale| (StatusCode::CREATED, Json(sale)))
}

// ============================================================================
// Additional Expenses
// ============================================================================

pub async fn get_additional_expense(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<AdditionalExpense>, AppError> {
    let audit = state.audit(&caller, "get additional expense by id").await?;
    audit
        .authorize(perm::additional_expense::GET_BY_ID, "GetAdditionalExpenseByID")
        .await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_additional_expense(id)
        .await
        .and_then(|value| found(value, "Additional expense", id));
    audit.finish(result, "Successfully retrieved additional expense").await.map(Json)
}

pub async fn list_additional_expenses(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<AdditionalExpense>>, AppError> {
    let audit = state.audit(&caller, "list additional expenses").await?;
    audit
        .authorize(perm::additional_expense::LIST, "GetAllAdditionalExpenses")
        .await?;

    let result = state.db.list_additional_expenses().await;
    audit.finish(result, "Successfully retrieved additional expenses").await.map(Json)
}

pub async fn create_additional_expense(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<AdditionalExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AdditionalExpense>), AppError> {
    let audit = state.audit(&caller, "create additional expense").await?;
    audit
        .authorize(perm::additional_expense::CREATE, "CreateAdditionalExpense")
        .await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_additional_expense(&req.into()).await;
    audit
        .finish(result, "Successfully created additional expense")
        .await
        .map(|expense| (StatusCode::CREATED, Json(expense)))
}

pub async fn update_additional_expense(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<AdditionalExpenseRequest>, JsonRejection>,
) -> Result<Json<AdditionalExpense>, AppError> {
    let audit = state.audit(&caller, "update additional expense").await?;
    audit
        .authorize(perm::additional_expense::UPDATE, "UpdateAdditionalExpense")
        .await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .update_additional_expense(id, &req.into())
        .await
        .and_then(|value| found(value, "Additional expense", id));
    audit.finish(result, "Successfully updated additional expense").await.map(Json)
}

pub async fn delete_additional_expense(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let audit = state.audit(&caller, "delete additional expense").await?;
    audit
        .authorize(perm::additional_expense::DELETE, "DeleteAdditionalExpense")
        .await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .delete_additional_expense(id)
        .await
        .and_then(|deleted| found(deleted.then_some(()), "Additional expense", id));
    audit
        .finish(result, "Successfully deleted additional expense")
        .await
        .map(|()| {
            Json(MessageResponse {
                message: format!("Additional expense {} deleted", id),
            })
        })
}

// ============================================================================
// Sales Report
// ============================================================================

/// GET /sales-report?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn sales_report(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<SalesReport>, AppError> {
    let audit = state.audit(&caller, "view sales report").await?;
    audit.authorize(perm::sales_report::VIEW, "GetSalesReport").await?;
    let query = audit.params(query).await?;

    let result = state
        .db
        .sales_figures(query.from, query.to)
        .await
        .map(|figures| SalesReport::from_figures(query.from, query.to, figures));
    audit.finish(result, "Successfully generated sales report").await.map(Json)
}
