//! Appointment handlers.
//!
//! Booking rules live in [`Database::book_appointment`](crate::services::Database::book_appointment);
//! these handlers only bind input and pass the configured slot capacity.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::found;
use crate::dtos::scheduling::{AppointmentRequest, AppointmentStateQuery, CustomerSlotQuery, HoursQuery};
use crate::dtos::{ErrorResponse, MessageResponse, SearchQuery};
use crate::middleware::Caller;
use crate::models::{Appointment, HourSlot};
use crate::permissions as perm;
use crate::AppState;
use service_core::error::AppError;

pub async fn get_appointment(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Appointment>, AppError> {
    let audit = state.audit(&caller, "get appointment by id").await?;
    audit.authorize(perm::appointment::GET_BY_ID, "GetAppointmentByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_appointment(id)
        .await
        .and_then(|value| found(value, "Appointment", id));
    audit.finish(result, "Successfully retrieved appointment").await.map(Json)
}

pub async fn list_appointments(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let audit = state.audit(&caller, "list appointments").await?;
    audit.authorize(perm::appointment::LIST, "GetAllAppointments").await?;

    let result = state.db.list_appointments().await;
    audit.finish(result, "Successfully retrieved appointments").await.map(Json)
}

/// GET /appointments/state?state=true
pub async fn list_appointments_by_state(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<AppointmentStateQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let audit = state.audit(&caller, "search appointments by state").await?;
    audit
        .authorize(perm::appointment::SEARCH_BY_STATE, "SearchAppointmentsByState")
        .await?;
    let Query(query) = audit.input(query).await?;

    let result = state.db.list_appointments_by_state(query.state).await;
    audit.finish(result, "Successfully retrieved appointments").await.map(Json)
}

pub async fn list_appointments_by_customer(
    State(state): State<AppState>,
    caller: Caller,
    customer_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let audit = state.audit(&caller, "list appointments of customer").await?;
    audit
        .authorize(perm::appointment::LIST_BY_CUSTOMER, "GetAppointmentsByCustomerID")
        .await?;
    let Path(customer_id) = audit.input(customer_id).await?;

    let result = state.db.list_appointments_by_customer(customer_id).await;
    audit.finish(result, "Successfully retrieved appointments").await.map(Json)
}

pub async fn search_appointments_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let audit = state.audit(&caller, "search appointments by id").await?;
    audit
        .authorize(perm::appointment::SEARCH_BY_ID, "SearchAppointmentsByID")
        .await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_appointments_by_id(&term).await;
    audit.finish(result, "Successfully searched appointments").await.map(Json)
}

pub async fn search_appointments_by_customer_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let audit = state.audit(&caller, "search appointments by customer id").await?;
    audit
        .authorize(
            perm::appointment::SEARCH_BY_CUSTOMER_ID,
            "SearchAppointmentsByCustomerID",
        )
        .await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.customer_id).await?;

    let result = state.db.search_appointments_by_customer_id(&term).await;
    audit.finish(result, "Successfully searched appointments").await.map(Json)
}

/// GET /appointments/customers/:id/slot?date_time=...
pub async fn get_appointment_by_customer_and_date(
    State(state): State<AppState>,
    caller: Caller,
    customer_id: Result<Path<i32>, PathRejection>,
    query: Result<Query<CustomerSlotQuery>, QueryRejection>,
) -> Result<Json<Appointment>, AppError> {
    let audit = state
        .audit(&caller, "get appointment by customer and date")
        .await?;
    audit
        .authorize(
            perm::appointment::GET_BY_CUSTOMER_AND_DATE,
            "GetAppointmentByCustomerIDAndDate",
        )
        .await?;
    let Path(customer_id) = audit.input(customer_id).await?;
    let Query(query) = audit.input(query).await?;

    let result = state
        .db
        .get_appointment_by_customer_and_time(customer_id, query.date_time)
        .await
        .and_then(|value| {
            found(
                value,
                "Appointment for customer",
                format!("{} at {}", customer_id, query.date_time),
            )
        });
    audit.finish(result, "Successfully retrieved appointment").await.map(Json)
}

/// Book an hourly slot for a customer.
#[utoipa::path(
    post,
    path = "/appointments",
    request_body = AppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Slot outside business hours or not on the hour", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
        (status = 409, description = "Customer already booked or slot full", body = ErrorResponse)
    ),
    tag = "Scheduling",
    security(("caller_email" = []))
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<AppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let audit = state.audit(&caller, "create appointment").await?;
    audit.authorize(perm::appointment::CREATE, "CreateAppointment").await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .book_appointment(&req.into(), state.config.scheduling.slot_capacity, None)
        .await;
    audit
        .finish(result, "Successfully created appointment")
        .await
        .map(|appointment| (StatusCode::CREATED, Json(appointment)))
}

/// Move an appointment to another slot. The same booking rules apply, with
/// the appointment itself excluded from the conflict checks.
#[utoipa::path(
    put,
    path = "/appointments/{id}",
    request_body = AppointmentRequest,
    params(
        ("id" = i32, Path, description = "Appointment id")
    ),
    responses(
        (status = 200, description = "Appointment updated", body = Appointment),
        (status = 400, description = "Slot outside business hours or not on the hour", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse),
        (status = 404, description = "Appointment or customer not found", body = ErrorResponse),
        (status = 409, description = "Customer already booked or slot full", body = ErrorResponse)
    ),
    tag = "Scheduling",
    security(("caller_email" = []))
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<AppointmentRequest>, JsonRejection>,
) -> Result<Json<Appointment>, AppError> {
    let audit = state.audit(&caller, "update appointment").await?;
    audit.authorize(perm::appointment::UPDATE, "UpdateAppointment").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result = state
        .db
        .book_appointment(&req.into(), state.config.scheduling.slot_capacity, Some(id))
        .await;
    audit.finish(result, "Successfully updated appointment").await.map(Json)
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let audit = state.audit(&caller, "delete appointment").await?;
    audit.authorize(perm::appointment::DELETE, "DeleteAppointment").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .delete_appointment(id)
        .await
        .and_then(|deleted| found(deleted.then_some(()), "Appointment", id));
    audit
        .finish(result, "Successfully deleted appointment")
        .await
        .map(|()| {
            Json(MessageResponse {
                message: format!("Appointment {} deleted", id),
            })
        })
}

/// Occupancy of the nine business-hour slots of a day.
#[utoipa::path(
    get,
    path = "/appointments/hours",
    params(
        HoursQuery
    ),
    responses(
        (status = 200, description = "One entry per slot from 09:00 to 17:00", body = [HourSlot]),
        (status = 400, description = "Missing or malformed date", body = ErrorResponse),
        (status = 403, description = "Permission denied", body = ErrorResponse)
    ),
    tag = "Scheduling",
    security(("caller_email" = []))
)]
pub async fn count_appointments_by_hour(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<HoursQuery>, QueryRejection>,
) -> Result<Json<Vec<HourSlot>>, AppError> {
    let audit = state.audit(&caller, "count appointments by hour").await?;
    audit
        .authorize(perm::appointment::COUNT_BY_HOUR, "CountAppointmentsByHour")
        .await?;
    let Query(query) = audit.input(query).await?;

    let result = state
        .db
        .count_appointments_by_hour(query.date, state.config.scheduling.slot_capacity)
        .await;
    audit.finish(result, "Successfully counted appointments").await.map(Json)
}
