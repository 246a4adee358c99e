//! Display helpers for document and upload listings.

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Render a byte count the way the upload list shows it: base 1024, at most
/// two decimals, trailing zeros dropped (`0 Bytes`, `1.5 KB`, `2 MB`).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, SIZE_UNITS[unit])
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_file_size_zero() {
        assert_eq!(format_file_size(0), "0 Bytes");
    }

    #[test]
    fn format_file_size_units() {
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("quarterly-report.pdf", 10), "quarter...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("résumé-final.txt", 8), "résum...");
    }
}
