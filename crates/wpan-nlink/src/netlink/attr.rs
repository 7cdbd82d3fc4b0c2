//! Netlink attribute (nlattr) handling.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Largest payload a single attribute can carry (`nla_len` is a u16).
pub const NLA_MAX_PAYLOAD: usize = u16::MAX as usize - NLA_HDRLEN;

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    ///
    /// `data_len` must not exceed [`NLA_MAX_PAYLOAD`]; the builder checks this.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Check if this is a nested attribute.
    pub fn is_nested(&self) -> bool {
        self.nla_type & NLA_F_NESTED != 0
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Iteration stops at the first malformed header; trailing garbage is
/// reported by [`AttrIter::remainder`].
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.data.len() < NLA_HDRLEN
    }

    /// Bytes not yet consumed.
    pub fn remainder(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> Iterator for AttrIter<'a> {
    /// Returns (attribute type, payload data).
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLA_HDRLEN {
            return None;
        }

        let attr = NlAttr::from_bytes(self.data).ok()?;

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);

        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some((attr.kind(), payload))
    }
}

/// Helper functions for extracting typed values from attribute payloads.
///
/// Signed getters are plain bit reinterpretations of the unsigned layout;
/// range checks are the caller's business.
pub mod get {
    use super::*;

    fn fixed<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
        data.get(..N)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute(format!("truncated {} attribute", what)))
    }

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        Ok(fixed::<1>(data, "u8")?[0])
    }

    /// Extract an i8 value.
    pub fn i8(data: &[u8]) -> Result<i8> {
        Ok(i8::from_ne_bytes(fixed(data, "s8")?))
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        Ok(u16::from_ne_bytes(fixed(data, "u16")?))
    }

    /// Extract an i16 value (native endian).
    pub fn i16_ne(data: &[u8]) -> Result<i16> {
        Ok(i16::from_ne_bytes(fixed(data, "s16")?))
    }

    /// Extract a u16 value (little endian).
    pub fn u16_le(data: &[u8]) -> Result<u16> {
        Ok(u16::from_le_bytes(fixed(data, "le16")?))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        Ok(u32::from_ne_bytes(fixed(data, "u32")?))
    }

    /// Extract an i32 value (native endian).
    pub fn i32_ne(data: &[u8]) -> Result<i32> {
        Ok(i32::from_ne_bytes(fixed(data, "s32")?))
    }

    /// Extract a u32 value (little endian).
    pub fn u32_le(data: &[u8]) -> Result<u32> {
        Ok(u32::from_le_bytes(fixed(data, "le32")?))
    }

    /// Extract a u32 value (big endian / network order).
    pub fn u32_be(data: &[u8]) -> Result<u32> {
        Ok(u32::from_be_bytes(fixed(data, "be32")?))
    }

    /// Extract a u64 value (native endian).
    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        Ok(u64::from_ne_bytes(fixed(data, "u64")?))
    }

    /// Extract an i64 value (native endian).
    pub fn i64_ne(data: &[u8]) -> Result<i64> {
        Ok(i64::from_ne_bytes(fixed(data, "s64")?))
    }

    /// Extract a u64 value (little endian).
    pub fn u64_le(data: &[u8]) -> Result<u64> {
        Ok(u64::from_le_bytes(fixed(data, "le64")?))
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }

    /// Extract bytes (no interpretation).
    pub fn bytes(data: &[u8]) -> &[u8] {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_stops_on_bad_length() {
        // nla_len = 64 but only 8 bytes available
        let data = [64u8, 0, 1, 0, 0, 0, 0, 0];
        assert_eq!(AttrIter::new(&data).count(), 0);
    }

    #[test]
    fn test_iter_skips_padding() {
        let data = [
            5u8, 0, 1, 0, 0xaa, 0, 0, 0, // u8 attr, padded
            6, 0, 2, 0, 0x34, 0x12, 0, 0, // u16 attr, padded
        ];
        let attrs: Vec<_> = AttrIter::new(&data).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0], (1, &[0xaa][..]));
        assert_eq!(get::u16_le(attrs[1].1).unwrap(), 0x1234);
    }

    #[test]
    fn test_nested_flag_masked() {
        let data = [4u8, 0, 0x05, 0x80];
        let (kind, payload) = AttrIter::new(&data).next().unwrap();
        assert_eq!(kind, 5);
        assert!(payload.is_empty());
    }

    #[test]
    fn test_signed_getters() {
        assert_eq!(get::i8(&[0xff]).unwrap(), -1);
        assert_eq!(get::i16_ne(&(-300i16).to_ne_bytes()).unwrap(), -300);
        assert_eq!(get::i32_ne(&(-7700i32).to_ne_bytes()).unwrap(), -7700);
        assert_eq!(get::i64_ne(&i64::MIN.to_ne_bytes()).unwrap(), i64::MIN);
    }

    #[test]
    fn test_truncated() {
        assert!(get::u8(&[]).is_err());
        assert!(get::u32_ne(&[1, 2, 3]).is_err());
        assert!(get::u64_le(&[0; 7]).is_err());
    }
}
