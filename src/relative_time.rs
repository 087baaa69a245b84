use chrono::{DateTime, Utc};

/// Human-readable age of `created_at` as seen from `now`, e.g. "2 hours ago".
///
/// Days never take a singular form ("1 days ago"); hours and minutes do.
/// Timestamps in the future read as "just now".
pub fn time_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(created_at);

    let days = diff.num_days();
    if days > 0 {
        return format!("{} days ago", days);
    }

    let hours = diff.num_hours();
    if hours >= 1 {
        return format!("{} {} ago", hours, plural(hours, "hour"));
    }

    let minutes = diff.num_minutes();
    if minutes >= 1 {
        return format!("{} {} ago", minutes, plural(minutes, "minute"));
    }

    "just now".to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
