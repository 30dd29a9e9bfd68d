//! Human-readable formatting for elapsed times

use std::time::Duration;

/// Formats a time duration in milliseconds to a human-readable string
pub fn format_duration(millis: u64) -> String {
    if millis == 0 {
        return "0ms".to_string();
    }

    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        let seconds = millis as f64 / 1000.0;
        if seconds >= 10.0 {
            format!("{:.1}s", seconds)
        } else {
            format!("{:.2}s", seconds)
        }
    } else if millis < 3_600_000 {
        let total_seconds = millis / 1000;
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, seconds)
        }
    } else {
        let total_seconds = millis / 1000;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if seconds == 0 && minutes == 0 {
            format!("{}h", hours)
        } else if seconds == 0 {
            format!("{}h{}m", hours, minutes)
        } else {
            format!("{}h{}m{}s", hours, minutes, seconds)
        }
    }
}

/// Same as [`format_duration`] for a `Duration`
pub fn format_elapsed(elapsed: Duration) -> String {
    format_duration(elapsed.as_millis() as u64)
}
