// Author: Dustin Pilgrim
// License: MIT

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0));
    d.as_millis() as u64
}

/// Whole hours, minutes and seconds in a millisecond span.
pub fn split_hms(ms: u64) -> (u64, u64, u64) {
    let secs = ms / 1000;
    (secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn format_duration_ms(ms: u64) -> String {
    let (h, m, s) = split_hms(ms);

    if h == 0 && m == 0 {
        format!("{}s", s)
    } else if h == 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}h {}m {}s", h, m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_hms() {
        assert_eq!(split_hms(0), (0, 0, 0));
        assert_eq!(split_hms(999), (0, 0, 0));
        assert_eq!(split_hms(61_500), (0, 1, 1));
        assert_eq!(split_hms(3_723_000), (1, 2, 3));
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration_ms(5_000), "5s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
        assert_eq!(format_duration_ms(3_725_000), "1h 2m 5s");
    }
}
