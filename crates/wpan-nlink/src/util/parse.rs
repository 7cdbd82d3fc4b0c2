//! Argument parsing utilities.
//!
//! Integers follow `strtoul(.., 0)` conventions: `0x` for hex, a leading `0`
//! for octal, decimal otherwise, and no trailing garbage. The `_dec`
//! variants accept decimal digits only, so a leading `0` is not octal.

/// Error type for parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("number out of range: {0}")]
    OutOfRange(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse a u8 from string.
pub fn get_u8(s: &str) -> Result<u8> {
    parse_int(s)
}

/// Parse a u16 from string.
pub fn get_u16(s: &str) -> Result<u16> {
    parse_int(s)
}

/// Parse a u32 from string.
pub fn get_u32(s: &str) -> Result<u32> {
    parse_int(s)
}

/// Parse a u64 from string.
pub fn get_u64(s: &str) -> Result<u64> {
    parse_int(s)
}

/// Parse a decimal u8; leading zeros do not select octal.
pub fn get_u8_dec(s: &str) -> Result<u8> {
    parse_dec(s)
}

/// Parse a decimal u32; leading zeros do not select octal.
pub fn get_u32_dec(s: &str) -> Result<u32> {
    parse_dec(s)
}

/// Parse an i8 from string; a leading `-` is allowed.
pub fn get_i8(s: &str) -> Result<i8> {
    match s.strip_prefix('-') {
        Some(rest) => {
            let magnitude: u64 = parse_int(rest)?;
            i64::try_from(magnitude)
                .ok()
                .and_then(|m| i8::try_from(-m).ok())
                .ok_or_else(|| ParseError::OutOfRange(s.to_string()))
        }
        None => parse_int(s),
    }
}

/// Parse a `0`/`1` switch.
pub fn get_bool(s: &str) -> Result<bool> {
    match get_u8(s)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ParseError::OutOfRange(s.to_string())),
    }
}

/// Parse a decibel value. Infinities and NaN are rejected.
pub fn get_dbm(s: &str) -> Result<f32> {
    s.parse::<f32>()
        .ok()
        .filter(|dbm| dbm.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(s.to_string()))
}

/// Convert dBm to mBm, truncating toward zero.
pub fn dbm_to_mbm(dbm: f32) -> i32 {
    (dbm * 100.0) as i32
}

/// Integer parsing with hex and octal support.
fn parse_int<T: TryFrom<u64>>(s: &str) -> Result<T> {
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    parse_radix(s, digits, radix)
}

/// Integer parsing in base 10 only.
fn parse_dec<T: TryFrom<u64>>(s: &str) -> Result<T> {
    parse_radix(s, s, 10)
}

fn parse_radix<T: TryFrom<u64>>(s: &str, digits: &str, radix: u32) -> Result<T> {
    // from_str_radix accepts a sign, strtoul callers here never want one.
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(ParseError::InvalidNumber(s.to_string()));
    }

    let val = u64::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => ParseError::OutOfRange(s.to_string()),
        _ => ParseError::InvalidNumber(s.to_string()),
    })?;
    T::try_from(val).map_err(|_| ParseError::OutOfRange(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases() {
        assert_eq!(get_u16("0xbeef").unwrap(), 0xbeef);
        assert_eq!(get_u16("0XBEEF").unwrap(), 0xbeef);
        assert_eq!(get_u8("017").unwrap(), 15);
        assert_eq!(get_u8("0").unwrap(), 0);
        assert_eq!(get_u32("26").unwrap(), 26);
    }

    #[test]
    fn test_decimal_only() {
        assert_eq!(get_u8_dec("011").unwrap(), 11);
        assert_eq!(get_u8_dec("08").unwrap(), 8);
        assert_eq!(get_u32_dec("3").unwrap(), 3);
        assert!(matches!(get_u8_dec("0x1"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(get_u8_dec("256"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(get_u32_dec("-1"), Err(ParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(get_u8("12a"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(get_u8(""), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(get_u8("0x"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(get_u8("09"), Err(ParseError::InvalidNumber(_))));
        assert!(matches!(get_u8("+1"), Err(ParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_width() {
        assert!(matches!(get_u8("256"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(get_u16("0x10000"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(
            get_u64("0x1ffffffffffffffff"),
            Err(ParseError::OutOfRange(_))
        ));
        assert_eq!(get_u64("0xffffffffffffffff").unwrap(), u64::MAX);
    }

    #[test]
    fn test_signed() {
        assert_eq!(get_i8("-1").unwrap(), -1);
        assert_eq!(get_i8("7").unwrap(), 7);
        assert_eq!(get_i8("-128").unwrap(), -128);
        assert!(get_i8("-129").is_err());
        assert!(get_i8("128").is_err());
    }

    #[test]
    fn test_bool() {
        assert!(get_bool("1").unwrap());
        assert!(!get_bool("0").unwrap());
        assert!(matches!(get_bool("2"), Err(ParseError::OutOfRange(_))));
    }

    #[test]
    fn test_dbm_truncation() {
        assert_eq!(dbm_to_mbm(get_dbm("12.5").unwrap()), 1250);
        assert_eq!(dbm_to_mbm(get_dbm("12.549").unwrap()), 1254);
        assert_eq!(dbm_to_mbm(get_dbm("-3").unwrap()), -300);
        assert!(get_dbm("loud").is_err());
    }

    #[test]
    fn test_dbm_not_finite() {
        for s in ["inf", "-inf", "NaN", "infinity"] {
            assert!(matches!(get_dbm(s), Err(ParseError::InvalidNumber(_))), "{}", s);
        }
    }
}
