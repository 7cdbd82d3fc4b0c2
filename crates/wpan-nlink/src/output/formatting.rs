//! Shared formatting utilities for CLI output.
//!
//! # Example
//!
//! ```
//! use wpan_nlink::output::formatting::{format_freq, format_mbm};
//!
//! assert_eq!(format_mbm(-1250), "-12.5");
//! assert_eq!(format_mbm(400), "4");
//! assert_eq!(format_freq(24050), " 2405");
//! assert_eq!(format_freq(8683), "868.3");
//! ```

/// Format a value in mBm as dBm with at most two decimals.
pub fn format_mbm(mbm: i32) -> String {
    let sign = if mbm < 0 { "-" } else { "" };
    let abs = mbm.unsigned_abs();
    let (int, frac) = (abs / 100, abs % 100);

    if frac == 0 {
        format!("{}{}", sign, int)
    } else if frac % 10 == 0 {
        format!("{}{}.{}", sign, int, frac / 10)
    } else {
        format!("{}{}.{:02}", sign, int, frac)
    }
}

/// Format a frequency given in tenths of MHz, padded to five columns.
pub fn format_freq(tenths: u32) -> String {
    if tenths % 10 == 0 {
        format!("{:5}", tenths / 10)
    } else {
        format!("{:5.1}", tenths as f64 / 10.0)
    }
}

/// Join values with `,` as the channel lists are printed.
pub fn join_comma<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mbm() {
        assert_eq!(format_mbm(0), "0");
        assert_eq!(format_mbm(1250), "12.5");
        assert_eq!(format_mbm(1254), "12.54");
        assert_eq!(format_mbm(-7700), "-77");
        assert_eq!(format_mbm(-5), "-0.05");
        assert_eq!(format_mbm(305), "3.05");
    }

    #[test]
    fn test_format_freq() {
        assert_eq!(format_freq(9060), "  906");
        assert_eq!(format_freq(9512), "951.2");
        assert_eq!(format_freq(24800), " 2480");
    }

    #[test]
    fn test_join_comma() {
        assert_eq!(join_comma(&[11u8, 12, 26]), "11,12,26");
        assert_eq!(join_comma::<u8>(&[]), "");
    }
}
