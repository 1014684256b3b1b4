/// Formats seconds as `MM:SS`, truncating the sub-second part.
///
/// Minutes are not folded into hours. Negative and non-finite inputs render
/// as `00:00`.
///
/// # Example
/// ```
/// use scrubber::format_time;
///
/// assert_eq!(format_time(0.9), "00:00");
/// assert_eq!(format_time(65.0), "01:05");
/// ```
pub fn format_time(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::format_time;

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(format_time(59.999), "00:59");
        assert_eq!(format_time(0.5), "00:00");
    }

    #[test]
    fn keeps_counting_minutes_past_an_hour() {
        assert_eq!(format_time(3_600.0), "60:00");
        assert_eq!(format_time(6_001.0), "100:01");
    }

    #[test]
    fn negative_and_nan_render_as_zero() {
        assert_eq!(format_time(-3.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
    }
}
