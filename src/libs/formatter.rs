//! Duration formatting for console output.
//!
//! - Totals use "HH:MM" (hours may exceed two digits)
//! - The running clock uses "MM:SS"

/// Formats a number of seconds as "HH:MM", dropping leftover seconds.
///
/// ```rust
/// use tomo::libs::formatter::format_duration;
///
/// assert_eq!(format_duration(5400), "01:30");
/// assert_eq!(format_duration(59), "00:00");
/// ```
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{:02}:{:02}", hours, minutes)
}

/// Formats a clock value as "MM:SS".
pub fn format_clock(minutes: u32, seconds: u32) -> String {
    format!("{:02}:{:02}", minutes, seconds)
}

/// Share of `part` in `total` as a whole-number percentage.
pub fn format_share(part: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{:.0}%", part as f64 * 100.0 / total as f64)
}

/// Human-readable file size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
