use super::{commit, non_empty, prefix_pattern, query_error, Database};
use crate::models::{Appointment, AppointmentFields, HourSlot};
use crate::services::metrics::{APPOINTMENTS_TOTAL, DB_QUERY_DURATION};
use crate::services::scheduling::{
    business_day_window, check_booking, hourly_occupancy, slot_lock_key, validate_slot,
    BookingError,
};
use chrono::{NaiveDate, NaiveDateTime};
use service_core::error::AppError;
use tracing::{info, instrument, warn};

const APPOINTMENT_COLUMNS: &str = "id, date_time, state, customer_id";

impl Database {
    #[instrument(skip(self))]
    pub async fn get_appointment(&self, id: i32) -> Result<Option<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            APPOINTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get appointment", e))
    }

    #[instrument(skip(self))]
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments ORDER BY date_time, id",
            APPOINTMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list appointments", e))
    }

    #[instrument(skip(self))]
    pub async fn list_appointments_by_state(
        &self,
        state: bool,
    ) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE state = $1 ORDER BY date_time, id",
            APPOINTMENT_COLUMNS
        ))
        .bind(state)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list appointments", e))?;
        non_empty(rows, "appointments")
    }

    #[instrument(skip(self))]
    pub async fn list_appointments_by_customer(
        &self,
        customer_id: i32,
    ) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE customer_id = $1 ORDER BY date_time, id",
            APPOINTMENT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list appointments", e))?;
        non_empty(rows, "appointments")
    }

    #[instrument(skip(self))]
    pub async fn search_appointments_by_id(
        &self,
        term: &str,
    ) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            APPOINTMENT_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search appointments", e))?;
        non_empty(rows, "appointments")
    }

    #[instrument(skip(self))]
    pub async fn search_appointments_by_customer_id(
        &self,
        term: &str,
    ) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE CAST(customer_id AS TEXT) LIKE $1 ORDER BY id",
            APPOINTMENT_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search appointments", e))?;
        non_empty(rows, "appointments")
    }

    #[instrument(skip(self))]
    pub async fn get_appointment_by_customer_and_time(
        &self,
        customer_id: i32,
        date_time: NaiveDateTime,
    ) -> Result<Option<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {} FROM appointments WHERE customer_id = $1 AND date_time = $2",
            APPOINTMENT_COLUMNS
        ))
        .bind(customer_id)
        .bind(date_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get appointment", e))
    }

    /// Returns false when no appointment had that id.
    #[instrument(skip(self))]
    pub async fn delete_appointment(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("delete appointment", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Book a slot, or move appointment `existing` to it.
    ///
    /// Checks run in order: slot shape, customer existence, the customer's
    /// own double booking, then slot capacity. Concurrent bookings of the
    /// same slot are serialized by a transaction-scoped advisory lock.
    #[instrument(skip(self, input), fields(date_time = %input.date_time, customer_id = input.customer_id))]
    pub async fn book_appointment(
        &self,
        input: &AppointmentFields,
        capacity: u32,
        existing: Option<i32>,
    ) -> Result<Appointment, AppError> {
        validate_slot(input.date_time).map_err(|e| AppError::BadRequest(e.into()))?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["book_appointment"])
            .start_timer();

        let mut tx = self.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(slot_lock_key(input.date_time))
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("lock appointment slot", e))?;

        if let Some(id) = existing {
            let found = sqlx::query_scalar::<_, i32>(
                "SELECT id FROM appointments WHERE id = $1 FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| query_error("update appointment", e))?;
            if found.is_none() {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Appointment {} not found",
                    id
                )));
            }
        }

        let customer_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                .bind(input.customer_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| query_error("check customer", e))?;
        if !customer_exists {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                input.customer_id
            )));
        }

        // Rows for the appointment being moved do not count against the slot.
        let (customer_booked, booked_in_slot) = sqlx::query_as::<_, (bool, i64)>(
            r#"
            SELECT
                COALESCE(bool_or(customer_id = $2), FALSE),
                COUNT(*)
            FROM appointments
            WHERE date_time = $1
              AND ($3::int IS NULL OR id <> $3)
            "#,
        )
        .bind(input.date_time)
        .bind(input.customer_id)
        .bind(existing)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| query_error("check appointment slot", e))?;

        if let Err(e) = check_booking(customer_booked, booked_in_slot, capacity) {
            let outcome = match e {
                BookingError::CustomerAlreadyBooked => "duplicate",
                BookingError::SlotFull => "slot_full",
            };
            APPOINTMENTS_TOTAL.with_label_values(&[outcome]).inc();
            warn!(outcome, booked_in_slot, "Appointment rejected");
            return Err(AppError::Conflict(e.into()));
        }

        let appointment = match existing {
            Some(id) => sqlx::query_as::<_, Appointment>(&format!(
                r#"
                UPDATE appointments SET date_time = $2, state = $3, customer_id = $4
                WHERE id = $1
                RETURNING {}
                "#,
                APPOINTMENT_COLUMNS
            ))
            .bind(id)
            .bind(input.date_time)
            .bind(input.state)
            .bind(input.customer_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| query_error("update appointment", e))?,
            None => sqlx::query_as::<_, Appointment>(&format!(
                r#"
                INSERT INTO appointments (date_time, state, customer_id)
                VALUES ($1, $2, $3)
                RETURNING {}
                "#,
                APPOINTMENT_COLUMNS
            ))
            .bind(input.date_time)
            .bind(input.state)
            .bind(input.customer_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| query_error("create appointment", e))?,
        };

        commit(tx).await?;
        timer.observe_duration();

        let outcome = if existing.is_some() { "moved" } else { "booked" };
        APPOINTMENTS_TOTAL.with_label_values(&[outcome]).inc();
        info!(appointment_id = appointment.id, outcome, "Appointment saved");

        Ok(appointment)
    }

    /// Occupancy of every slot on `date`.
    #[instrument(skip(self))]
    pub async fn count_appointments_by_hour(
        &self,
        date: NaiveDate,
        capacity: u32,
    ) -> Result<Vec<HourSlot>, AppError> {
        let (open, close) = business_day_window(date);

        let counts = sqlx::query_as::<_, (i32, i64)>(
            r#"
            SELECT EXTRACT(HOUR FROM date_time)::int AS hour, COUNT(*) AS count
            FROM appointments
            WHERE date_time >= $1 AND date_time < $2
            GROUP BY 1
            "#,
        )
        .bind(open)
        .bind(close)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("count appointments", e))?;

        Ok(hourly_occupancy(&counts, capacity))
    }
}
