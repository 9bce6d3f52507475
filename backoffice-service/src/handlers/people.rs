//! Employee, customer and comment handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::found;
use crate::dtos::people::{CommentRequest, CustomerRequest, EmployeeRequest};
use crate::dtos::{MessageResponse, SearchQuery};
use crate::middleware::Caller;
use crate::models::{Comment, Customer, Employee};
use crate::permissions as perm;
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// Employees
// ============================================================================

pub async fn get_employee(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Employee>, AppError> {
    let audit = state.audit(&caller, "get employee by id").await?;
    audit.authorize(perm::employee::GET_BY_ID, "GetEmployeeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_employee(id)
        .await
        .and_then(|value| found(value, "Employee", id));
    audit.finish(result, "Successfully retrieved employee").await.map(Json)
}

pub async fn list_employees(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Employee>>, AppError> {
    let audit = state.audit(&caller, "list employees").await?;
    audit.authorize(perm::employee::LIST, "GetAllEmployees").await?;

    let result = state.db.list_employees().await;
    audit.finish(result, "Successfully retrieved employees").await.map(Json)
}

pub async fn search_employees_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let audit = state.audit(&caller, "search employees by name").await?;
    audit.authorize(perm::employee::SEARCH_BY_NAME, "SearchEmployeesByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_employees_by_name(&term).await;
    audit.finish(result, "Successfully searched employees").await.map(Json)
}

pub async fn search_employees_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Employee>>, AppError> {
    let audit = state.audit(&caller, "search employees by id").await?;
    audit.authorize(perm::employee::SEARCH_BY_ID, "SearchEmployeesByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_employees_by_id(&term).await;
    audit.finish(result, "Successfully searched employees").await.map(Json)
}

pub async fn create_employee(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<EmployeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    let audit = state.audit(&caller, "create employee").await?;
    audit.authorize(perm::employee::CREATE, "CreateEmployee").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_employee(&req.into()).await;
    audit
        .finish(result, "Successfully created employee")
        .await
        .map(|employee| (StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<EmployeeRequest>, JsonRejection>,
) -> Result<Json<Employee>, AppError> {
    let audit = state.audit(&caller, "update employee").await?;
    audit.authorize(perm::employee::UPDATE, "UpdateEmployee").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .update_employee(id, &req.into())
        .await
        .and_then(|value| found(value, "Employee", id));
    audit.finish(result, "Successfully updated employee").await.map(Json)
}

pub async fn delete_employee(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let audit = state.audit(&caller, "delete employee").await?;
    audit.authorize(perm::employee::DELETE, "DeleteEmployee").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .delete_employee(id)
        .await
        .and_then(|deleted| found(deleted.then_some(()), "Employee", id));
    audit
        .finish(result, "Successfully deleted employee")
        .await
        .map(|()| {
            Json(MessageResponse {
                message: format!("Employee {} deleted", id),
            })
        })
}

// ============================================================================
// Customers
// ============================================================================

pub async fn get_customer(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Customer>, AppError> {
    let audit = state.audit(&caller, "get customer by id").await?;
    audit.authorize(perm::customer::GET_BY_ID, "GetCustomerByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_customer(id)
        .await
        .and_then(|value| found(value, "Customer", id));
    audit.finish(result, "Successfully retrieved customer").await.map(Json)
}

pub async fn list_customers(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Customer>>, AppError> {
    let audit = state.audit(&caller, "list customers").await?;
    audit.authorize(perm::customer::LIST, "GetAllCustomers").await?;

    let result = state.db.list_customers().await;
    audit.finish(result, "Successfully retrieved customers").await.map(Json)
}

pub async fn get_customer_by_email(
    State(state): State<AppState>,
    caller: Caller,
    email: Result<Path<String>, PathRejection>,
) -> Result<Json<Customer>, AppError> {
    let audit = state.audit(&caller, "get customer by email").await?;
    audit.authorize(perm::customer::GET_BY_EMAIL, "GetCustomerByEmail").await?;
    let Path(email) = audit.input(email).await?;

    let result = state
        .db
        .get_customer_by_email(&email)
        .await
        .and_then(|value| found(value, "Customer with email", &email));
    audit.finish(result, "Successfully retrieved customer").await.map(Json)
}

pub async fn get_customer_by_personal_id(
    State(state): State<AppState>,
    caller: Caller,
    personal_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Customer>, AppError> {
    let audit = state.audit(&caller, "get customer by personal identifier").await?;
    audit
        .authorize(perm::customer::GET_BY_PERSONAL_ID, "GetCustomerByCustomerID")
        .await?;
    let Path(personal_id) = audit.input(personal_id).await?;

    let result = state
        .db
        .get_customer_by_personal_id(&personal_id)
        .await
        .and_then(|value| found(value, "Customer with identifier", &personal_id));
    audit.finish(result, "Successfully retrieved customer").await.map(Json)
}

pub async fn search_customers_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let audit = state.audit(&caller, "search customers by id").await?;
    audit.authorize(perm::customer::SEARCH_BY_ID, "SearchCustomersByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_customers_by_id(&term).await;
    audit.finish(result, "Successfully searched customers").await.map(Json)
}

pub async fn search_customers_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let audit = state.audit(&caller, "search customers by name").await?;
    audit.authorize(perm::customer::SEARCH_BY_NAME, "SearchCustomersByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_customers_by_name(&term).await;
    audit.finish(result, "Successfully searched customers").await.map(Json)
}

pub async fn search_customers_by_last_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let audit = state.audit(&caller, "search customers by last name").await?;
    audit
        .authorize(perm::customer::SEARCH_BY_LAST_NAME, "SearchCustomersByLastName")
        .await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.last_name).await?;

    let result = state.db.search_customers_by_last_name(&term).await;
    audit.finish(result, "Successfully searched customers").await.map(Json)
}

pub async fn create_customer(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let audit = state.audit(&caller, "create customer").await?;
    audit.authorize(perm::customer::CREATE, "CreateCustomer").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_customer(&req.into()).await;
    audit
        .finish(result, "Successfully created customer")
        .await
        .map(|customer| (StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> Result<Json<Customer>, AppError> {
    let audit = state.audit(&caller, "update customer").await?;
    audit.authorize(perm::customer::UPDATE, "UpdateCustomer").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .update_customer(id, &req.into())
        .await
        .and_then(|value| found(value, "Customer", id));
    audit.finish(result, "Successfully updated customer").await.map(Json)
}

// ============================================================================
// Comments
// ============================================================================

pub async fn get_comment(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Comment>, AppError> {
    let audit = state.audit(&caller, "get comment by id").await?;
    audit.authorize(perm::comment::GET_BY_ID, "GetCommentByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_comment(id)
        .await
        .and_then(|value| found(value, "Comment", id));
    audit.finish(result, "Successfully retrieved comment").await.map(Json)
}

pub async fn list_comments(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Comment>>, AppError> {
    let audit = state.audit(&caller, "list comments").await?;
    audit.authorize(perm::comment::LIST, "GetAllComments").await?;

    let result = state.db.list_comments().await;
    audit.finish(result, "Successfully retrieved comments").await.map(Json)
}

pub async fn search_comments_by_email(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let audit = state.audit(&caller, "search comments by email").await?;
    audit.authorize(perm::comment::SEARCH_BY_EMAIL, "SearchCommentsByEmail").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.email).await?;

    let result = state.db.search_comments_by_email(&term).await;
    audit.finish(result, "Successfully searched comments").await.map(Json)
}

pub async fn search_comments_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let audit = state.audit(&caller, "search comments by name").await?;
    audit.authorize(perm::comment::SEARCH_BY_NAME, "SearchCommentsByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_comments_by_name(&term).await;
    audit.finish(result, "Successfully searched comments").await.map(Json)
}

pub async fn search_comments_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let audit = state.audit(&caller, "search comments by id").await?;
    audit.authorize(perm::comment::SEARCH_BY_ID, "SearchCommentsByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_comments_by_id(&term).await;
    audit.finish(result, "Successfully searched comments").await.map(Json)
}

pub async fn create_comment(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let audit = state.audit(&caller, "create comment").await?;
    audit.authorize(perm::comment::CREATE, "CreateComment").await?;
    let req = audit.payload(payload).await?;

    let result = state.db.create_comment(&req.into()).await;
    audit
        .finish(result, "Successfully created comment")
        .await
        .map(|comment| (StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<Comment>, AppError> {
    let audit = state.audit(&caller, "update comment").await?;
    audit.authorize(perm::comment::UPDATE, "UpdateComment").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .update_comment(id, &req.into())
        .await
        .and_then(|value| found(value, "Comment", id));
    audit.finish(result, "Successfully updated comment").await.map(Json)
}
