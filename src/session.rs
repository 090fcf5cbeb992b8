use crate::clock;

/// Sliding session window: every successful liveness check restarts it.
pub const SESSION_TIMEOUT_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `last_login` is empty.
    LoggedOut,
    /// Logged in and inside the timeout window.
    Fresh,
    /// Logged in but the window has elapsed; `last_login` is left in place
    /// until an explicit logout clears it.
    Expired,
}

/// Classify a session from its stored `last_login` stamp and the current
/// stamp. Both are reconstructed into absolute instants before subtracting;
/// an unparseable stamp counts as expired.
pub fn classify(last_login: &str, now: &str) -> SessionState {
    if last_login.is_empty() {
        return SessionState::LoggedOut;
    }
    match clock::elapsed_ms(last_login, now) {
        Some(ms) if ms <= SESSION_TIMEOUT_MS => SessionState::Fresh,
        _ => SessionState::Expired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stamp_is_logged_out() {
        assert_eq!(classify("", "2024-02-03 12:00:00"), SessionState::LoggedOut);
    }

    #[test]
    fn inside_window_is_fresh() {
        assert_eq!(
            classify("2024-02-03 11:30:00", "2024-02-03 12:00:00"),
            SessionState::Fresh
        );
    }

    #[test]
    fn exactly_one_hour_is_still_fresh() {
        // elapsed > timeout expires; elapsed == timeout does not
        assert_eq!(
            classify("2024-02-03 11:00:00", "2024-02-03 12:00:00"),
            SessionState::Fresh
        );
    }

    #[test]
    fn one_second_past_the_hour_is_expired() {
        assert_eq!(
            classify("2024-02-03 11:00:00", "2024-02-03 12:00:01"),
            SessionState::Expired
        );
    }

    #[test]
    fn unparseable_stamp_is_expired() {
        assert_eq!(
            classify("yesterday-ish", "2024-02-03 12:00:00"),
            SessionState::Expired
        );
    }
}
