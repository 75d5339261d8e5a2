//! Human-readable byte size formatting.

/// Binary (1024-based) unit steps.
const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count as a human-readable size using 1024-based units.
///
/// The value is rounded to two decimal places with trailing zeros dropped.
/// A zero byte count maps to the KB unit, so `human_readable_size(0)` is
/// `"0 KB"`; this mirrors the reporting format users already rely on.
///
/// # Example
/// ```rust
/// use dbdump_core::format::human_readable_size;
///
/// assert_eq!(human_readable_size(1536), "1.5 KB");
/// ```
#[must_use]
pub fn human_readable_size(size_in_bytes: u64) -> String {
    let index = if size_in_bytes == 0 {
        1
    } else {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (size_in_bytes as f64).log(1024.0).floor() as usize;
        index.min(UNITS.len() - 1)
    };

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let value = size_in_bytes as f64 / 1024_f64.powi(index as i32);
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", rounded, UNITS[index])
}
