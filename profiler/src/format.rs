//! Pure display formatting for timing and memory figures.
//!
//! Malformed values (negative, NaN, infinite) degrade to "N/A" instead of
//! panicking; a bad number from the wire must never take the table down.

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub fn format_execution_time(ms: f64) -> String {
    if !ms.is_finite() || ms < 0.0 {
        return "N/A".to_string();
    }
    format!("{:.2}s", ms / 1000.0)
}

pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes < 0.0 {
        return "N/A".to_string();
    }
    if bytes == 0.0 {
        return "0 B".to_string();
    }

    let exponent = (bytes.log(1024.0).floor() as usize).min(BYTE_UNITS.len() - 1);
    let value = bytes / 1024f64.powi(exponent as i32);
    format!("{:.2} {}", value, BYTE_UNITS[exponent])
}

/// Signed absolute + percentage text for a table delta cell,
/// e.g. "+0.05s (+11.11%)". Percent is omitted when unknown.
pub fn format_delta(diff_ms: f64, percent: Option<f64>) -> String {
    if !diff_ms.is_finite() {
        return "N/A".to_string();
    }

    let sign = if diff_ms >= 0.0 { "+" } else { "-" };
    let absolute = format!("{}{:.2}s", sign, diff_ms.abs() / 1000.0);

    match percent {
        Some(percent) if percent.is_finite() => {
            let sign = if percent >= 0.0 { "+" } else { "-" };
            format!("{} ({}{:.2}%)", absolute, sign, percent.abs())
        }
        _ => absolute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_time_formatting() {
        assert_eq!(format_execution_time(1500.0), "1.50s");
        assert_eq!(format_execution_time(500.0), "0.50s");
        assert_eq!(format_execution_time(0.0), "0.00s");
        assert_eq!(format_execution_time(-1.0), "N/A");
        assert_eq!(format_execution_time(f64::NAN), "N/A");
        assert_eq!(format_execution_time(f64::INFINITY), "N/A");
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(0.0), "0 B");
        assert_eq!(format_bytes(512.0), "512.00 B");
        assert_eq!(format_bytes(1024.0), "1.00 KB");
        assert_eq!(format_bytes(1048576.0), "1.00 MB");
        assert_eq!(format_bytes(1073741824.0), "1.00 GB");
        assert_eq!(format_bytes(-5.0), "N/A");
        assert_eq!(format_bytes(f64::NAN), "N/A");
    }

    #[test]
    fn delta_formatting() {
        assert_eq!(format_delta(50.0, Some(11.111)), "+0.05s (+11.11%)");
        assert_eq!(format_delta(-100.0, Some(-10.0)), "-0.10s (-10.00%)");
        assert_eq!(format_delta(0.0, Some(0.0)), "+0.00s (+0.00%)");
        assert_eq!(format_delta(50.0, None), "+0.05s");
        assert_eq!(format_delta(f64::NAN, None), "N/A");
    }
}
