//! Extended address and key parsing and formatting utilities.

use super::parse;
pub use super::parse::ParseError;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse an extended address.
///
/// Accepts the colon form of exactly 8 hex octets, most significant first
/// (`00:12:4b:00:01:02:03:04`), or a number (`0x00124b0001020304`).
pub fn parse_extended_addr(s: &str) -> Result<u64> {
    if s.contains(':') {
        let octets: [u8; 8] = parse_octets(s)?;
        Ok(u64::from_be_bytes(octets))
    } else {
        parse::get_u64(s)
    }
}

/// Parse a 16-octet key written as colon separated hex.
pub fn parse_key(s: &str) -> Result<[u8; 16]> {
    parse_octets(s)
}

fn parse_octets<const N: usize>(s: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    let mut parts = s.split(':');

    for slot in out.iter_mut() {
        let part = parts
            .next()
            .ok_or_else(|| ParseError::InvalidFormat(s.to_string()))?;
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }
        *slot = u8::from_str_radix(part, 16)
            .map_err(|_| ParseError::InvalidFormat(s.to_string()))?;
    }

    if parts.next().is_some() {
        return Err(ParseError::InvalidFormat(s.to_string()));
    }
    Ok(out)
}

/// Format octets as lower-case colon separated hex.
pub fn format_hex_octets(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Format an extended address in colon form, most significant octet first.
pub fn format_extended_addr(addr: u64) -> String {
    format_hex_octets(&addr.to_be_bytes())
}
