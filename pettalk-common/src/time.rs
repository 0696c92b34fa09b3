//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch, used as a cache-busting token
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Compact local-time label in `YYYYMMDD_HHMMSS` form.
///
/// Upload filenames embed this label so the remote service can echo it back.
pub fn timestamp_label(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_label_zero_pads_fields() {
        let at = Local.with_ymd_and_hms(2024, 1, 1, 9, 5, 3).unwrap();
        assert_eq!(timestamp_label(at), "20240101_090503");
    }

    #[test]
    fn test_timestamp_label_length() {
        let label = timestamp_label(Local::now());
        assert_eq!(label.len(), 15);
        assert_eq!(&label[8..9], "_");
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_unix_millis_advances() {
        let first = unix_millis();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(unix_millis() > first);
    }
}
