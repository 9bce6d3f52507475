//! Access-control lookup models: permissions, roles, user types and the
//! small reference tables around them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A permission. The id doubles as the permission code checked per request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Role together with the codes it grants.
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserType {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[sqlx(skip)]
    pub roles: Vec<i32>,
}

/// Account state. Only [`UserStateType::ACTIVE`] accounts are granted permissions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStateType {
    pub id: i32,
    pub description: String,
}

impl UserStateType {
    pub const ACTIVE: i32 = 1;
    pub const INACTIVE: i32 = 2;
    pub const BLOCKED: i32 = 3;
}

/// Kind of personal document (national id, passport, ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdentifierType {
    pub id: i32,
    pub name: String,
}
