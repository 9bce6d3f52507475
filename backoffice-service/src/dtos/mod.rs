pub mod access;
pub mod catalog;
pub mod finance;
pub mod people;
pub mod sales;
pub mod scheduling;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Permission denied")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Search parameters. Each search endpoint reads the one field it matches on.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Prefix of the decimal id.
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    /// Prefix of a customer's id or personal identifier.
    #[serde(alias = "customerId")]
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
