use chrono::{NaiveDateTime, Utc};

pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time as a zero-padded `YYYY-MM-DD HH:MM:SS` string.
///
/// Every `last_update` / `last_login` / log timestamp in the store uses this
/// format.
pub fn now_stamp() -> String {
    Utc::now().format(STAMP_FORMAT).to_string()
}

pub fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// Milliseconds between two stamps, reconstructed as absolute instants.
///
/// The fixed-width format would happen to sort lexically, but expiry math
/// must not depend on that.
pub fn elapsed_ms(from: &str, to: &str) -> Option<i64> {
    let from = parse_stamp(from)?;
    let to = parse_stamp(to)?;
    Some((to - from).num_milliseconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_is_fixed_width() {
        let stamp = now_stamp();
        assert_eq!(stamp.len(), 19);
        assert!(parse_stamp(&stamp).is_some());
    }

    #[test]
    fn parses_zero_padded_fields() {
        let dt = parse_stamp("2024-02-03 04:05:06").unwrap();
        assert_eq!(dt.format(STAMP_FORMAT).to_string(), "2024-02-03 04:05:06");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_stamp("not a stamp").is_none());
        assert!(parse_stamp("2024-02-03T04:05:06").is_none());
        assert!(elapsed_ms("", "2024-02-03 04:05:06").is_none());
    }

    #[test]
    fn elapsed_crosses_day_boundary() {
        let ms = elapsed_ms("2024-02-03 23:59:30", "2024-02-04 00:00:30").unwrap();
        assert_eq!(ms, 60_000);
    }

    #[test]
    fn elapsed_is_signed() {
        let ms = elapsed_ms("2024-02-04 00:00:30", "2024-02-03 23:59:30").unwrap();
        assert_eq!(ms, -60_000);
    }
}
