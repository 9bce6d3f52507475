//! User account handlers and the per-user activity log.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::found;
use crate::dtos::access::{
    CreateUserRequest, PermissionCheckResponse, UpdateUserRequest, UpdateUserStateRequest,
};
use crate::dtos::SearchQuery;
use crate::middleware::Caller;
use crate::models::{LogEntry, NewUser, User, UserChanges};
use crate::permissions as perm;
use crate::utils::hash_password;
use crate::AppState;
use service_core::error::AppError;

pub async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let audit = state.audit(&caller, "get user by id").await?;
    audit.authorize(perm::user::GET_BY_ID, "GetUserByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_user(id)
        .await
        .and_then(|value| found(value, "User", id));
    audit.finish(result, "Successfully retrieved user").await.map(Json)
}

pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<User>>, AppError> {
    let audit = state.audit(&caller, "list users").await?;
    audit.authorize(perm::user::LIST, "GetAllUsers").await?;

    let result = state.db.list_users().await;
    audit.finish(result, "Successfully retrieved users").await.map(Json)
}

pub async fn search_users_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let audit = state.audit(&caller, "search users by id").await?;
    audit.authorize(perm::user::SEARCH_BY_ID, "SearchUsersByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_users_by_id(&term).await;
    audit.finish(result, "Successfully searched users").await.map(Json)
}

pub async fn search_users_by_email(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let audit = state.audit(&caller, "search users by email").await?;
    audit.authorize(perm::user::SEARCH_BY_EMAIL, "SearchUsersByEmail").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.email).await?;

    let result = state.db.search_users_by_email(&term).await;
    audit.finish(result, "Successfully searched users").await.map(Json)
}

/// POST /user
pub async fn create_user(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let audit = state.audit(&caller, "create user").await?;
    audit.authorize(perm::user::CREATE, "CreateUser").await?;
    let req = audit.payload(payload).await?;

    let result: Result<User, AppError> = async {
        let password_hash = hash_password(&req.password)?;
        state
            .db
            .create_user(&NewUser {
                email: req.email.trim().to_lowercase(),
                password_hash,
                user_type_id: req.user_type_id,
            })
            .await
    }
    .await;

    audit
        .finish(result, "Successfully created user")
        .await
        .map(|user| (StatusCode::CREATED, Json(user)))
}

/// PUT /user/:id
pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let audit = state.audit(&caller, "update user").await?;
    audit.authorize(perm::user::UPDATE, "UpdateUser").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result: Result<User, AppError> = async {
        let password_hash = match req.password {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };
        let changes = UserChanges {
            email: req.email.map(|e| e.trim().to_lowercase()),
            password_hash,
            user_type_id: req.user_type_id,
            user_state_type_id: req.user_state_type_id,
        };
        state
            .db
            .update_user(id, &changes)
            .await
            .and_then(|value| found(value, "User", id))
    }
    .await;

    audit.finish(result, "Successfully updated user").await.map(Json)
}

/// PATCH /user/:id/state
pub async fn update_user_state(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateUserStateRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let audit = state.audit(&caller, "update user state").await?;
    audit.authorize(perm::user::UPDATE_STATE, "UpdateUserState").await?;
    let Path(id) = audit.input(id).await?;
    let req = audit.payload(payload).await?;

    let result: Result<User, AppError> = async {
        found(
            state.db.get_user_state_type(req.user_state_type_id).await?,
            "User state type",
            req.user_state_type_id,
        )?;
        let changes = UserChanges {
            user_state_type_id: Some(req.user_state_type_id),
            ..UserChanges::default()
        };
        state
            .db
            .update_user(id, &changes)
            .await
            .and_then(|value| found(value, "User", id))
    }
    .await;

    audit.finish(result, "Successfully updated user state").await.map(Json)
}

/// GET /user/:email/permissions/:code
pub async fn check_user_permission(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Path<(String, i32)>, PathRejection>,
) -> Result<Json<PermissionCheckResponse>, AppError> {
    let audit = state.audit(&caller, "check user permission").await?;
    audit.authorize(perm::user::HAS_PERMISSION, "UserHasPermission").await?;
    let Path((email, code)) = audit.input(params).await?;

    let result = state.permissions.has_permission(&email, code).await;
    audit
        .finish(result, "Successfully checked user permission")
        .await
        .map(|granted| {
            Json(PermissionCheckResponse {
                email,
                permission: code,
                granted,
            })
        })
}

/// GET /logs/:email, newest first.
pub async fn list_user_logs(
    State(state): State<AppState>,
    caller: Caller,
    email: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let audit = state.audit(&caller, "list logs of user").await?;
    audit.authorize(perm::log::LIST_BY_USER, "GetLogsByEmail").await?;
    let Path(email) = audit.input(email).await?;

    let result = state.db.list_logs_for_user(&email).await;
    audit.finish(result, "Successfully retrieved logs").await.map(Json)
}
