//! Date numbers
//!
//! Dates are carried as fractional days counted from day 0 of the proleptic
//! Gregorian calendar, so day 719529 is 1970-01-01. BSON stores datetimes as
//! milliseconds since the Unix epoch; these helpers convert between the two.

use chrono::{DateTime, Utc};

/// Day number of 1970-01-01
pub const UNIX_EPOCH_DAYS: f64 = 719_529.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a day number to milliseconds since the Unix epoch
///
/// # Returns
/// * `Option<i64>` - `None` for non-finite or out-of-range day numbers
pub fn days_to_millis(days: f64) -> Option<i64> {
    if !days.is_finite() {
        return None;
    }
    let millis = ((days - UNIX_EPOCH_DAYS) * MILLIS_PER_DAY).round();
    (millis >= i64::MIN as f64 && millis <= i64::MAX as f64).then_some(millis as i64)
}

/// Convert milliseconds since the Unix epoch to a day number
pub fn millis_to_days(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_DAY + UNIX_EPOCH_DAYS
}

/// Convert seconds since the Unix epoch to a day number
pub fn seconds_to_days(seconds: u32) -> f64 {
    f64::from(seconds) / SECONDS_PER_DAY + UNIX_EPOCH_DAYS
}

/// Convert a day number to a UTC datetime
pub fn to_datetime(days: f64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(days_to_millis(days)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_is_zero_millis() {
        assert_eq!(days_to_millis(UNIX_EPOCH_DAYS), Some(0));
        assert_eq!(millis_to_days(0), UNIX_EPOCH_DAYS);
    }

    #[test]
    fn test_half_day() {
        assert_eq!(days_to_millis(719_529.5), Some(43_200_000));
        assert_eq!(seconds_to_days(43_200), 719_529.5);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(days_to_millis(f64::NAN), None);
        assert_eq!(days_to_millis(f64::INFINITY), None);
    }

    #[test]
    fn test_to_datetime() {
        let datetime = to_datetime(719_529.5).unwrap();
        assert_eq!(datetime.timestamp(), 43_200);
        assert_eq!(millis_to_days(datetime.timestamp_millis()), 719_529.5);
        assert!(to_datetime(f64::NAN).is_none());
    }
}
