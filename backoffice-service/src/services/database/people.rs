use super::{contains_pattern, non_empty, prefix_pattern, query_error, Database};
use crate::models::{Comment, CommentFields, Customer, CustomerFields, Employee, EmployeeFields};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use tracing::{info, instrument};

const EMPLOYEE_COLUMNS: &str = "id, name, last_name, personal_id, identifier_type_id, \
     residential_address, phone_number, user_id";

const CUSTOMER_COLUMNS: &str = "id, name, last_name, customer_id, identifier_type_id, email, \
     phone_number, address, customer_state";

const COMMENT_COLUMNS: &str = "id, name, last_name, email, phone_number, comment, date_time";

impl Database {
    // -------------------------------------------------------------------------
    // Employee Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: i32) -> Result<Option<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE id = $1",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get employee", e))
    }

    #[instrument(skip(self))]
    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees ORDER BY id",
            EMPLOYEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list employees", e))
    }

    /// Match on first or last name.
    #[instrument(skip(self))]
    pub async fn search_employees_by_name(&self, term: &str) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE name ILIKE $1 OR last_name ILIKE $1 ORDER BY id",
            EMPLOYEE_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search employees", e))?;
        non_empty(rows, "employees")
    }

    #[instrument(skip(self))]
    pub async fn search_employees_by_id(&self, term: &str) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            EMPLOYEE_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search employees", e))?;
        non_empty(rows, "employees")
    }

    #[instrument(skip(self, input), fields(personal_id = %input.personal_id))]
    pub async fn create_employee(&self, input: &EmployeeFields) -> Result<Employee, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_employee"])
            .start_timer();

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (name, last_name, personal_id, identifier_type_id,
                                   residential_address, phone_number, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.last_name)
        .bind(&input.personal_id)
        .bind(input.identifier_type_id)
        .bind(&input.residential_address)
        .bind(&input.phone_number)
        .bind(input.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("create employee", e))?;

        timer.observe_duration();

        info!(employee_id = employee.id, "Employee created");

        Ok(employee)
    }

    #[instrument(skip(self, input))]
    pub async fn update_employee(
        &self,
        id: i32,
        input: &EmployeeFields,
    ) -> Result<Option<Employee>, AppError> {
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees SET
                name = $2, last_name = $3, personal_id = $4, identifier_type_id = $5,
                residential_address = $6, phone_number = $7, user_id = $8
            WHERE id = $1
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.last_name)
        .bind(&input.personal_id)
        .bind(input.identifier_type_id)
        .bind(&input.residential_address)
        .bind(&input.phone_number)
        .bind(input.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("update employee", e))
    }

    /// Returns false when no employee had that id.
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "Employee {} is referenced by orders or sales",
                        id
                    ))
                }
                _ => query_error("delete employee", e),
            })?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: i32) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get customer", e))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list customers", e))
    }

    #[instrument(skip(self))]
    pub async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE lower(email) = lower($1)",
            CUSTOMER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get customer", e))
    }

    /// Exact match on the personal identifier.
    #[instrument(skip(self))]
    pub async fn get_customer_by_personal_id(
        &self,
        personal_id: &str,
    ) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE customer_id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(personal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get customer", e))
    }

    #[instrument(skip(self))]
    pub async fn search_customers_by_id(&self, term: &str) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search customers", e))?;
        non_empty(rows, "customers")
    }

    #[instrument(skip(self))]
    pub async fn search_customers_by_name(&self, term: &str) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE name ILIKE $1 ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search customers", e))?;
        non_empty(rows, "customers")
    }

    #[instrument(skip(self))]
    pub async fn search_customers_by_last_name(
        &self,
        term: &str,
    ) -> Result<Vec<Customer>, AppError> {
        let rows = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE last_name ILIKE $1 ORDER BY id",
            CUSTOMER_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search customers", e))?;
        non_empty(rows, "customers")
    }

    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_customer(&self, input: &CustomerFields) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (name, last_name, customer_id, identifier_type_id, email,
                                   phone_number, address, customer_state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.last_name)
        .bind(&input.customer_id)
        .bind(input.identifier_type_id)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.address)
        .bind(input.customer_state)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "A customer with identifier '{}' or email '{}' already exists",
                    input.customer_id,
                    input.email
                ))
            }
            _ => query_error("create customer", e),
        })?;

        timer.observe_duration();

        info!(id = customer.id, "Customer created");

        Ok(customer)
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        id: i32,
        input: &CustomerFields,
    ) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET
                name = $2, last_name = $3, customer_id = $4, identifier_type_id = $5,
                email = $6, phone_number = $7, address = $8, customer_state = $9
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.last_name)
        .bind(&input.customer_id)
        .bind(input.identifier_type_id)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.address)
        .bind(input.customer_state)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("update customer", e))
    }

    // -------------------------------------------------------------------------
    // Comment Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_comment(&self, id: i32) -> Result<Option<Comment>, AppError> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE id = $1",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get comment", e))
    }

    #[instrument(skip(self))]
    pub async fn list_comments(&self) -> Result<Vec<Comment>, AppError> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments ORDER BY date_time DESC, id DESC",
            COMMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list comments", e))
    }

    #[instrument(skip(self))]
    pub async fn search_comments_by_email(&self, term: &str) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE email ILIKE $1 ORDER BY id",
            COMMENT_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search comments", e))?;
        non_empty(rows, "comments")
    }

    #[instrument(skip(self))]
    pub async fn search_comments_by_name(&self, term: &str) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE name ILIKE $1 OR last_name ILIKE $1 ORDER BY id",
            COMMENT_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search comments", e))?;
        non_empty(rows, "comments")
    }

    #[instrument(skip(self))]
    pub async fn search_comments_by_id(&self, term: &str) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            COMMENT_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search comments", e))?;
        non_empty(rows, "comments")
    }

    #[instrument(skip(self, input))]
    pub async fn create_comment(&self, input: &CommentFields) -> Result<Comment, AppError> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (name, last_name, email, phone_number, comment, date_time)
            VALUES ($1, $2, $3, $4, $5, LOCALTIMESTAMP)
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("create comment", e))
    }

    #[instrument(skip(self, input))]
    pub async fn update_comment(
        &self,
        id: i32,
        input: &CommentFields,
    ) -> Result<Option<Comment>, AppError> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments SET
                name = $2, last_name = $3, email = $4, phone_number = $5, comment = $6
            WHERE id = $1
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.comment)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("update comment", e))
    }
}
