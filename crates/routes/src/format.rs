//! Human-readable rendering of route durations and distances.

/// Parse a protobuf-style duration string (`"1200s"`) into whole seconds.
pub fn parse_duration_secs(raw: &str) -> Result<u64, String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    digits
        .parse::<u64>()
        .map_err(|_| format!("invalid duration '{raw}'"))
}

/// "2 hours 5 minutes", or just "5 minutes" when under an hour.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{} {}", plural(hours, "hour"), plural(minutes, "minute"))
    } else {
        plural(minutes, "minute")
    }
}

/// Meters as kilometers with one decimal, e.g. "5.0 km".
pub fn format_distance(meters: u64) -> String {
    format!("{:.1} km", meters as f64 / 1000.0)
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
