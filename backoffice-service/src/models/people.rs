//! Employees, customers and the comments left by visitors.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub last_name: String,
    pub personal_id: String,
    pub identifier_type_id: i32,
    pub residential_address: String,
    pub phone_number: String,
    pub user_id: Option<i32>,
}

/// Fields accepted when creating or replacing an employee.
#[derive(Debug, Clone)]
pub struct EmployeeFields {
    pub name: String,
    pub last_name: String,
    pub personal_id: String,
    pub identifier_type_id: i32,
    pub residential_address: String,
    pub phone_number: String,
    pub user_id: Option<i32>,
}

/// A customer. `customer_id` is the personal identifier printed on their
/// document, distinct from the row id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub last_name: String,
    pub customer_id: String,
    pub identifier_type_id: i32,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub customer_state: bool,
}

#[derive(Debug, Clone)]
pub struct CustomerFields {
    pub name: String,
    pub last_name: String,
    pub customer_id: String,
    pub identifier_type_id: i32,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub customer_state: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i32,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub comment: String,
    pub date_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CommentFields {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub comment: String,
}
