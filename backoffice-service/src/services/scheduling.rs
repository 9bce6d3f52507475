//! Appointment slot rules.
//!
//! The business books one-hour slots starting on the hour from 09:00 up to
//! and including 17:00. Each slot holds at most `capacity` appointments and a
//! customer may hold at most one appointment per slot.

use crate::models::HourSlot;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const FIRST_SLOT_HOUR: u32 = 9;
pub const LAST_SLOT_HOUR: u32 = 17;

pub fn slot_hours() -> RangeInclusive<u32> {
    FIRST_SLOT_HOUR..=LAST_SLOT_HOUR
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("Appointments must start on the hour")]
    NotOnTheHour,

    #[error("Appointments must be between 9:00 and 17:00")]
    OutsideBusinessHours,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Customer already has an appointment at this time")]
    CustomerAlreadyBooked,

    #[error("No availability for the selected time slot")]
    SlotFull,
}

/// Check that `date_time` is the start of a bookable slot.
pub fn validate_slot(date_time: NaiveDateTime) -> Result<(), SlotError> {
    let time = date_time.time();
    if time.minute() != 0 || time.second() != 0 || time.nanosecond() != 0 {
        return Err(SlotError::NotOnTheHour);
    }
    if !slot_hours().contains(&time.hour()) {
        return Err(SlotError::OutsideBusinessHours);
    }
    Ok(())
}

/// Decide whether a booking may proceed given what is already in the slot.
pub fn check_booking(
    customer_already_booked: bool,
    booked_in_slot: i64,
    capacity: u32,
) -> Result<(), BookingError> {
    if customer_already_booked {
        return Err(BookingError::CustomerAlreadyBooked);
    }
    if booked_in_slot >= i64::from(capacity) {
        return Err(BookingError::SlotFull);
    }
    Ok(())
}

/// Half-open window `[09:00, 18:00)` covering every slot of `date`.
pub fn business_day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let open = date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(FIRST_SLOT_HOUR));
    let close = date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(LAST_SLOT_HOUR + 1));
    (open, close)
}

/// Expand per-hour counts into one entry per slot, filling gaps with zero.
/// Hours outside the slot range are ignored.
pub fn hourly_occupancy(counts: &[(i32, i64)], capacity: u32) -> Vec<HourSlot> {
    let by_hour: HashMap<i32, i64> = counts.iter().copied().collect();

    slot_hours()
        .map(|hour| {
            let count = by_hour.get(&(hour as i32)).copied().unwrap_or(0);
            HourSlot {
                hour,
                count,
                available: count < i64::from(capacity),
            }
        })
        .collect()
}

/// Key used to serialize concurrent bookings of the same slot.
pub fn slot_lock_key(date_time: NaiveDateTime) -> i64 {
    date_time.and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_valid_slots() {
        assert_eq!(validate_slot(at(9, 0)), Ok(()));
        assert_eq!(validate_slot(at(17, 0)), Ok(()));
    }

    #[test]
    fn test_slot_bounds() {
        assert_eq!(validate_slot(at(8, 0)), Err(SlotError::OutsideBusinessHours));
        assert_eq!(validate_slot(at(18, 0)), Err(SlotError::OutsideBusinessHours));
        assert_eq!(validate_slot(at(10, 30)), Err(SlotError::NotOnTheHour));
    }

    #[test]
    fn test_booking_rules() {
        assert_eq!(check_booking(false, 0, 1), Ok(()));
        assert_eq!(check_booking(false, 1, 1), Err(BookingError::SlotFull));
        assert_eq!(check_booking(false, 1, 2), Ok(()));
        assert_eq!(
            check_booking(true, 0, 5),
            Err(BookingError::CustomerAlreadyBooked)
        );
    }

    #[test]
    fn test_business_day_window() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        let (open, close) = business_day_window(date);
        assert_eq!(open, at(9, 0));
        assert_eq!(close, at(18, 0));
    }

    #[test]
    fn test_hourly_occupancy_fills_all_slots() {
        let slots = hourly_occupancy(&[(9, 1), (13, 2), (20, 4)], 2);

        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0], HourSlot { hour: 9, count: 1, available: true });
        assert_eq!(slots[4], HourSlot { hour: 13, count: 2, available: false });
        assert_eq!(slots[8], HourSlot { hour: 17, count: 0, available: true });
        assert_eq!(slots.iter().map(|s| s.count).sum::<i64>(), 3);
    }
}
