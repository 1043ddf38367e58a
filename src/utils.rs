//! Utility functions

/// Strip trailing `\n` bytes, never shortening `data` below `min_len`.
///
/// Binary payloads end with a newline after the last sample, but the last
/// sample itself may be `0x0A`; the declared payload length keeps it intact.
pub fn strip_trailing_newlines(data: &[u8], min_len: usize) -> &[u8] {
    let mut end = data.len();
    while end > min_len && data[end - 1] == b'\n' {
        end -= 1;
    }
    &data[..end]
}

/// Format byte size in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_newlines() {
        assert_eq!(strip_trailing_newlines(b"\x01\x02\n\n", 0), b"\x01\x02");
        assert_eq!(strip_trailing_newlines(b"\x01\n\n", 2), b"\x01\n");
        assert_eq!(strip_trailing_newlines(b"\n\x01", 0), b"\n\x01");
        assert_eq!(strip_trailing_newlines(b"\n\n", 0), b"");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }
}
