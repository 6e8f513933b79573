use std::time::Duration;

pub(crate) fn format_rate(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.1}")
    } else {
        "0.0".to_string()
    }
}

pub(crate) fn format_pct(v: f64) -> String {
    format!("{v:.1}%")
}

pub(crate) fn format_ms(ms: f64) -> String {
    if ms.is_finite() {
        format!("{ms:.1}ms")
    } else {
        "-".to_string()
    }
}

/// Single rounded component in one of: ms, s, m.
pub(crate) fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1_000 {
        return format!("{total_ms}ms");
    }
    let secs = d.as_secs();
    if secs < 120 {
        return format!("{:.1}s", d.as_secs_f64());
    }
    format!("{}m{:02}s", secs / 60, secs % 60)
}
