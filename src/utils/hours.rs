use chrono::{DateTime, Utc};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Rounds half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Elapsed hours between two instants, rounded to 2 decimals.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds() as f64;
    round2(millis / MILLIS_PER_HOUR)
}

/// Fixed 2-decimal rendering used for every aggregate in reports.
pub fn format_hours(value: f64) -> String {
    let rounded = round2(value);
    // -0.0 would render as "-0.00"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn full_shift_is_eight_and_a_half() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 17, 30, 0).unwrap();

        assert_eq!(hours_between(start, end), 8.5);
        assert_eq!(format_hours(hours_between(start, end)), "8.50");
    }

    #[test]
    fn rounds_to_two_decimals() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        // 20 minutes = 0.3333... hours
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 9, 20, 0).unwrap();
        assert_eq!(hours_between(start, end), 0.33);

        // 50 minutes = 0.8333... hours
        let end = Utc.with_ymd_and_hms(2026, 1, 5, 9, 50, 0).unwrap();
        assert_eq!(hours_between(start, end), 0.83);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_hours(0.0), "0.00");
        assert_eq!(format_hours(12.3), "12.30");
        assert_eq!(format_hours(-0.0), "0.00");
        assert_eq!(format_hours(-0.001), "0.00");
    }
}
