//! Permission, role, user type and reference-table handlers.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;

use super::found;
use crate::dtos::{ExistsResponse, SearchQuery};
use crate::middleware::Caller;
use crate::models::{IdentifierType, Permission, Role, RoleWithPermissions, UserStateType, UserType};
use crate::permissions as perm;
use crate::AppState;
use service_core::error::AppError;

// ============================================================================
// Permissions
// ============================================================================

pub async fn get_permission(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Permission>, AppError> {
    let audit = state.audit(&caller, "get permission by id").await?;
    audit.authorize(perm::permission::GET_BY_ID, "GetPermissionByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_permission(id)
        .await
        .and_then(|value| found(value, "Permission", id));
    audit.finish(result, "Successfully retrieved permission").await.map(Json)
}

pub async fn list_permissions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Permission>>, AppError> {
    let audit = state.audit(&caller, "list permissions").await?;
    audit.authorize(perm::permission::LIST, "GetAllPermissions").await?;

    let result = state.db.list_permissions().await;
    audit.finish(result, "Successfully retrieved permissions").await.map(Json)
}

pub async fn search_permissions_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let audit = state.audit(&caller, "search permissions by id").await?;
    audit.authorize(perm::permission::SEARCH_BY_ID, "SearchPermissionsByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_permissions_by_id(&term).await;
    audit.finish(result, "Successfully searched permissions").await.map(Json)
}

pub async fn search_permissions_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let audit = state.audit(&caller, "search permissions by name").await?;
    audit.authorize(perm::permission::SEARCH_BY_NAME, "SearchPermissionsByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_permissions_by_name(&term).await;
    audit.finish(result, "Successfully searched permissions").await.map(Json)
}

// ============================================================================
// Roles
// ============================================================================

pub async fn get_role(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<RoleWithPermissions>, AppError> {
    let audit = state.audit(&caller, "get role by id").await?;
    audit.authorize(perm::role::GET_BY_ID, "GetRoleByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_role(id)
        .await
        .and_then(|value| found(value, "Role", id));
    audit.finish(result, "Successfully retrieved role").await.map(Json)
}

pub async fn list_roles(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Role>>, AppError> {
    let audit = state.audit(&caller, "list roles").await?;
    audit.authorize(perm::role::LIST, "GetAllRoles").await?;

    let result = state.db.list_roles().await;
    audit.finish(result, "Successfully retrieved roles").await.map(Json)
}

pub async fn list_role_permissions(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let audit = state.audit(&caller, "list permissions of role").await?;
    audit.authorize(perm::role::LIST_PERMISSIONS, "GetAllPermissionsOfRole").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .list_role_permissions(id)
        .await
        .and_then(|value| found(value, "Role", id));
    audit.finish(result, "Successfully retrieved role permissions").await.map(Json)
}

pub async fn role_exists(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ExistsResponse>, AppError> {
    let audit = state.audit(&caller, "check whether role exists").await?;
    audit.authorize(perm::role::EXISTS, "ExistRole").await?;
    let Path(id) = audit.input(id).await?;

    let result = state.db.role_exists(id).await;
    audit
        .finish(result, "Successfully checked role existence")
        .await
        .map(|exists| Json(ExistsResponse { exists }))
}

pub async fn search_roles_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Role>>, AppError> {
    let audit = state.audit(&caller, "search roles by name").await?;
    audit.authorize(perm::role::SEARCH_BY_NAME, "SearchRolesByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_roles_by_name(&term).await;
    audit.finish(result, "Successfully searched roles").await.map(Json)
}

pub async fn search_roles_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Role>>, AppError> {
    let audit = state.audit(&caller, "search roles by id").await?;
    audit.authorize(perm::role::SEARCH_BY_ID, "SearchRolesByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_roles_by_id(&term).await;
    audit.finish(result, "Successfully searched roles").await.map(Json)
}

// ============================================================================
// User Types
// ============================================================================

pub async fn get_user_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<UserType>, AppError> {
    let audit = state.audit(&caller, "get user type by id").await?;
    audit.authorize(perm::user_type::GET_BY_ID, "ObtainUserTypeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_user_type(id)
        .await
        .and_then(|value| found(value, "User type", id));
    audit.finish(result, "Successfully retrieved user type").await.map(Json)
}

pub async fn list_user_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<UserType>>, AppError> {
    let audit = state.audit(&caller, "list user types").await?;
    audit.authorize(perm::user_type::LIST, "ObtainAllUserTypes").await?;

    let result = state.db.list_user_types().await;
    audit.finish(result, "Successfully retrieved user types").await.map(Json)
}

pub async fn user_type_exists(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ExistsResponse>, AppError> {
    let audit = state.audit(&caller, "check whether user type exists").await?;
    audit.authorize(perm::user_type::EXISTS, "ExistsUserType").await?;
    let Path(id) = audit.input(id).await?;

    let result = state.db.user_type_exists(id).await;
    audit
        .finish(result, "Successfully checked user type existence")
        .await
        .map(|exists| Json(ExistsResponse { exists }))
}

pub async fn search_user_types_by_id(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<UserType>>, AppError> {
    let audit = state.audit(&caller, "search user types by id").await?;
    audit.authorize(perm::user_type::SEARCH_BY_ID, "SearchUserTypesByID").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.id).await?;

    let result = state.db.search_user_types_by_id(&term).await;
    audit.finish(result, "Successfully searched user types").await.map(Json)
}

pub async fn search_user_types_by_name(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<UserType>>, AppError> {
    let audit = state.audit(&caller, "search user types by name").await?;
    audit.authorize(perm::user_type::SEARCH_BY_NAME, "SearchUserTypesByName").await?;
    let Query(query) = audit.input(query).await?;
    let term = audit.query_term(query.name).await?;

    let result = state.db.search_user_types_by_name(&term).await;
    audit.finish(result, "Successfully searched user types").await.map(Json)
}

// ============================================================================
// Reference Tables
// ============================================================================

pub async fn get_user_state_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<UserStateType>, AppError> {
    let audit = state.audit(&caller, "get user state type by id").await?;
    audit.authorize(perm::user_state_type::GET_BY_ID, "GetUserStateTypeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_user_state_type(id)
        .await
        .and_then(|value| found(value, "User state type", id));
    audit.finish(result, "Successfully retrieved user state type").await.map(Json)
}

pub async fn list_user_state_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<UserStateType>>, AppError> {
    let audit = state.audit(&caller, "list user state types").await?;
    audit.authorize(perm::user_state_type::LIST, "GetUserStateTypes").await?;

    let result = state.db.list_user_state_types().await;
    audit.finish(result, "Successfully retrieved user state types").await.map(Json)
}

pub async fn get_identifier_type(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<IdentifierType>, AppError> {
    let audit = state.audit(&caller, "get identifier type by id").await?;
    audit.authorize(perm::identifier_type::GET_BY_ID, "GetIdentifierTypeByID").await?;
    let Path(id) = audit.input(id).await?;

    let result = state
        .db
        .get_identifier_type(id)
        .await
        .and_then(|value| found(value, "Identifier type", id));
    audit.finish(result, "Successfully retrieved identifier type").await.map(Json)
}

pub async fn list_identifier_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<IdentifierType>>, AppError> {
    let audit = state.audit(&caller, "list identifier types").await?;
    audit.authorize(perm::identifier_type::LIST, "GetIdentifierTypes").await?;

    let result = state.db.list_identifier_types().await;
    audit.finish(result, "Successfully retrieved identifier types").await.map(Json)
}
