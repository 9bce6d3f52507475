use crate::models::{CommentFields, CustomerFields, EmployeeFields};
use serde::Deserialize;
use validator::Validate;

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmployeeRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 50, message = "Personal id is required"))]
    pub personal_id: String,
    pub identifier_type_id: i32,
    #[serde(default)]
    pub residential_address: String,
    #[serde(default)]
    pub phone_number: String,
    pub user_id: Option<i32>,
}

impl From<EmployeeRequest> for EmployeeFields {
    fn from(req: EmployeeRequest) -> Self {
        Self {
            name: req.name,
            last_name: req.last_name,
            personal_id: req.personal_id,
            identifier_type_id: req.identifier_type_id,
            residential_address: req.residential_address,
            phone_number: req.phone_number,
            user_id: req.user_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    /// Personal identifier printed on the customer's document.
    #[validate(length(min = 1, max = 50, message = "Customer id is required"))]
    pub customer_id: String,
    pub identifier_type_id: i32,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "enabled")]
    pub customer_state: bool,
}

impl From<CustomerRequest> for CustomerFields {
    fn from(req: CustomerRequest) -> Self {
        Self {
            name: req.name,
            last_name: req.last_name,
            customer_id: req.customer_id,
            identifier_type_id: req.identifier_type_id,
            email: req.email,
            phone_number: req.phone_number,
            address: req.address,
            customer_state: req.customer_state,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters"))]
    pub comment: String,
}

impl From<CommentRequest> for CommentFields {
    fn from(req: CommentRequest) -> Self {
        Self {
            name: req.name,
            last_name: req.last_name,
            email: req.email,
            phone_number: req.phone_number,
            comment: req.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_defaults_to_enabled() {
        let req: CustomerRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "last_name": "Ruiz",
            "customer_id": "1032",
            "identifier_type_id": 1,
            "email": "ana@example.com"
        }))
        .unwrap();
        assert!(req.customer_state);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_comment_requires_text_and_valid_email() {
        let req = CommentRequest {
            name: "Ana".to_string(),
            last_name: String::new(),
            email: "not-an-email".to_string(),
            phone_number: String::new(),
            comment: String::new(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("comment"));
    }
}
