use super::{query_error, Database};
use crate::models::{
    AdditionalExpense, AdditionalExpenseFields, ExternalSale, ExternalSaleFields, SalesFigures,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::NaiveDate;
use service_core::error::AppError;
use tracing::{info, instrument};

const EXTERNAL_SALE_COLUMNS: &str = "id, date_time, description, amount, seller_id";
const EXPENSE_COLUMNS: &str = "id, name, description, amount, expense_date";

impl Database {
    // -------------------------------------------------------------------------
    // External Sale Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_external_sale(&self, id: i32) -> Result<Option<ExternalSale>, AppError> {
        sqlx::query_as::<_, ExternalSale>(&format!(
            "SELECT {} FROM external_sales WHERE id = $1",
            EXTERNAL_SALE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get external sale", e))
    }

    #[instrument(skip(self))]
    pub async fn list_external_sales(&self) -> Result<Vec<ExternalSale>, AppError> {
        sqlx::query_as::<_, ExternalSale>(&format!(
            "SELECT {} FROM external_sales ORDER BY date_time, id",
            EXTERNAL_SALE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list external sales", e))
    }

    #[instrument(skip(self, input))]
    pub async fn create_external_sale(
        &self,
        input: &ExternalSaleFields,
    ) -> Result<ExternalSale, AppError> {
        let sale = sqlx::query_as::<_, ExternalSale>(&format!(
            r#"
            INSERT INTO external_sales (date_time, description, amount, seller_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            EXTERNAL_SALE_COLUMNS
        ))
        .bind(input.date_time)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.seller_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("create external sale", e))?;

        info!(external_sale_id = sale.id, "External sale recorded");
        Ok(sale)
    }

    // -------------------------------------------------------------------------
    // Additional Expense Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_additional_expense(
        &self,
        id: i32,
    ) -> Result<Option<AdditionalExpense>, AppError> {
        sqlx::query_as::<_, AdditionalExpense>(&format!(
            "SELECT {} FROM additional_expenses WHERE id = $1",
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get additional expense", e))
    }

    #[instrument(skip(self))]
    pub async fn list_additional_expenses(&self) -> Result<Vec<AdditionalExpense>, AppError> {
        sqlx::query_as::<_, AdditionalExpense>(&format!(
            "SELECT {} FROM additional_expenses ORDER BY expense_date, id",
            EXPENSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list additional expenses", e))
    }

    #[instrument(skip(self, input))]
    pub async fn create_additional_expense(
        &self,
        input: &AdditionalExpenseFields,
    ) -> Result<AdditionalExpense, AppError> {
        sqlx::query_as::<_, AdditionalExpense>(&format!(
            r#"
            INSERT INTO additional_expenses (name, description, amount, expense_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.expense_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("create additional expense", e))
    }

    #[instrument(skip(self, input))]
    pub async fn update_additional_expense(
        &self,
        id: i32,
        input: &AdditionalExpenseFields,
    ) -> Result<Option<AdditionalExpense>, AppError> {
        sqlx::query_as::<_, AdditionalExpense>(&format!(
            r#"
            UPDATE additional_expenses SET
                name = $2, description = $3, amount = $4, expense_date = $5
            WHERE id = $1
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.expense_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("update additional expense", e))
    }

    /// Returns false when no expense had that id.
    #[instrument(skip(self))]
    pub async fn delete_additional_expense(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM additional_expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("delete additional expense", e))?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    /// Sums over the inclusive day range `[from, to]`.
    #[instrument(skip(self))]
    pub async fn sales_figures(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<SalesFigures, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sales_figures"])
            .start_timer();

        let figures = sqlx::query_as::<_, SalesFigures>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM invoices
                  WHERE date_time::date BETWEEN $1 AND $2) AS invoice_count,
                (SELECT COALESCE(SUM(total), 0) FROM invoices
                  WHERE date_time::date BETWEEN $1 AND $2) AS invoice_total,
                (SELECT COUNT(*) FROM external_sales
                  WHERE date_time::date BETWEEN $1 AND $2) AS external_sale_count,
                (SELECT COALESCE(SUM(amount), 0) FROM external_sales
                  WHERE date_time::date BETWEEN $1 AND $2) AS external_sale_total,
                (SELECT COALESCE(SUM(amount), 0) FROM additional_expenses
                  WHERE expense_date BETWEEN $1 AND $2) AS additional_expense_total
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("compute sales figures", e))?;

        timer.observe_duration();
        Ok(figures)
    }
}
