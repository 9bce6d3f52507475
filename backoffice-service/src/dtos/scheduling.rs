use crate::models::AppointmentFields;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

fn active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AppointmentRequest {
    /// Slot start in local business time, e.g. `2024-05-14T10:00:00`.
    #[schema(value_type = String, example = "2024-05-14T10:00:00")]
    pub date_time: NaiveDateTime,
    #[serde(default = "active")]
    pub state: bool,
    #[validate(range(min = 1, message = "Invalid customer id"))]
    pub customer_id: i32,
}

impl From<AppointmentRequest> for AppointmentFields {
    fn from(req: AppointmentRequest) -> Self {
        Self {
            date_time: req.date_time,
            state: req.state,
            customer_id: req.customer_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HoursQuery {
    /// Day to report, `YYYY-MM-DD`.
    #[param(value_type = String, example = "2024-05-14")]
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentStateQuery {
    pub state: bool,
}

#[derive(Debug, Deserialize)]
pub struct CustomerSlotQuery {
    pub date_time: NaiveDateTime,
}
