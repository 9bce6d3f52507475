use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A booked slot. `date_time` is local business time and always on the hour.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: i32,
    pub date_time: NaiveDateTime,
    pub state: bool,
    pub customer_id: i32,
}

/// Input for booking or moving an appointment.
#[derive(Debug, Clone)]
pub struct AppointmentFields {
    pub date_time: NaiveDateTime,
    pub state: bool,
    pub customer_id: i32,
}

/// Occupancy of one hourly slot on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HourSlot {
    pub hour: u32,
    pub count: i64,
    pub available: bool,
}
