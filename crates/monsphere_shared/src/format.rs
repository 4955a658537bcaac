//! Display helpers for addresses and chain timestamps.

use chrono::{DateTime, Utc};

/// Timestamps above this are already in milliseconds.
const MILLIS_THRESHOLD: u64 = 1_000_000_000_000;

/// Shortens an address to `0x1234…abcd`.
///
/// Keeps the `0x` prefix plus `size` characters at the front and `size`
/// characters at the back. Strings too short to shorten come back unchanged.
#[must_use]
pub fn truncate_address(addr: &str, size: usize) -> String {
    let chars: Vec<char> = addr.chars().collect();
    if chars.len() <= 2 + size * 2 {
        return addr.to_string();
    }
    let head: String = chars[..2 + size].iter().collect();
    let tail: String = chars[chars.len() - size..].iter().collect();
    format!("{head}…{tail}")
}

/// Renders a chain timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Contracts store seconds, but some store milliseconds; anything above
/// 10^12 is treated as milliseconds.
#[must_use]
pub fn format_timestamp(ts: u64) -> String {
    let millis = if ts > MILLIS_THRESHOLD { ts } else { ts.saturating_mul(1000) };
    let millis = i64::try_from(millis).unwrap_or(i64::MAX);
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_address() {
        let addr = "0x68be3c99080f2613cc5C2555104788Ec3bf6f714";
        assert_eq!(truncate_address(addr, 4), "0x68be…f714");
        assert_eq!(truncate_address(addr, 6), "0x68be3c…3bf6f714");
    }

    #[test]
    fn test_truncate_short_input() {
        assert_eq!(truncate_address("", 4), "");
        assert_eq!(truncate_address("0xabcdef", 4), "0xabcdef");
    }

    #[test]
    fn test_format_seconds_and_millis() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(1_700_000_000_000 + 1), "2023-11-14 22:13:20");
    }
}
