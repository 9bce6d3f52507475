use secrecy::Secret;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "crate::utils::validation::password_length"))]
    pub password: Secret<String>,

    pub user_type_id: i32,
}

/// Partial update; omitted fields keep their value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "crate::utils::validation::password_length"))]
    pub password: Option<Secret<String>>,

    pub user_type_id: Option<i32>,

    pub user_state_type_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserStateRequest {
    #[validate(range(min = 1, message = "Invalid user state"))]
    pub user_state_type_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionCheckResponse {
    pub email: String,
    pub permission: i32,
    pub granted: bool,
}
