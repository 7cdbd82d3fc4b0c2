//! Message builder for constructing netlink messages.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NLA_MAX_PAYLOAD, NlAttr, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Default size limit for a request, matching the page-sized buffers the
/// kernel side allocates for generic netlink requests.
pub const DEFAULT_MESSAGE_LIMIT: usize = 16384;

/// Token returned when starting a nested attribute.
/// Used to finalize the nested attribute length.
#[derive(Debug, Clone, Copy)]
pub struct NestToken {
    /// Offset of the nested attribute header in the buffer.
    offset: usize,
}

/// Builder for constructing netlink messages.
///
/// Appends never fail. An attribute that cannot be encoded (payload longer
/// than `nla_len` allows, or a message growing past the limit) is recorded
/// and reported by [`MessageBuilder::try_finish`] as
/// [`Error::MessageOverflow`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
    limit: usize,
    overflow: Option<(usize, usize)>,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let header = NlMsgHdr::new(msg_type, flags);
        let mut buf = vec![0u8; NLMSG_HDRLEN];
        buf[..std::mem::size_of::<NlMsgHdr>()].copy_from_slice(header.as_bytes());
        Self {
            buf,
            limit: DEFAULT_MESSAGE_LIMIT,
            overflow: None,
        }
    }

    /// Override the total message size limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// True once an append could not be encoded.
    pub fn overflowed(&self) -> bool {
        self.overflow.is_some()
    }

    fn note_overflow(&mut self, len: usize, max: usize) {
        if self.overflow.is_none() {
            tracing::debug!(len, max, "netlink attribute overflow");
            self.overflow = Some((len, max));
        }
    }

    fn check_limit(&mut self) {
        if self.buf.len() > self.limit {
            self.note_overflow(self.buf.len(), self.limit);
        }
    }

    /// Append raw bytes to the message (with alignment padding).
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        let aligned = nlmsg_align(self.buf.len());
        self.buf.resize(aligned, 0);
        self.check_limit();
    }

    /// Append a fixed-size header struct to the message.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.append_bytes(data.as_bytes());
    }

    /// Append an attribute with the given type and data.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) {
        if data.len() > NLA_MAX_PAYLOAD {
            self.note_overflow(data.len(), NLA_MAX_PAYLOAD);
            return;
        }
        let attr = NlAttr::new(attr_type, data.len());
        self.buf.extend_from_slice(attr.as_bytes());
        self.buf.extend_from_slice(data);
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
        self.check_limit();
    }

    /// Append a u8 attribute.
    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) {
        self.append_attr(attr_type, &[value]);
    }

    /// Append an s8 attribute.
    pub fn append_attr_i8(&mut self, attr_type: u16, value: i8) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append an empty (flag) attribute with no payload.
    pub fn append_attr_empty(&mut self, attr_type: u16) {
        self.append_attr(attr_type, &[]);
    }

    /// Append a u16 attribute (native endian).
    pub fn append_attr_u16(&mut self, attr_type: u16, value: u16) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append an s16 attribute (native endian).
    pub fn append_attr_i16(&mut self, attr_type: u16, value: i16) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append a u16 attribute (little endian).
    pub fn append_attr_u16_le(&mut self, attr_type: u16, value: u16) {
        self.append_attr(attr_type, &value.to_le_bytes());
    }

    /// Append a u32 attribute (native endian).
    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append an s32 attribute (native endian).
    pub fn append_attr_i32(&mut self, attr_type: u16, value: i32) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append a u32 attribute (little endian).
    pub fn append_attr_u32_le(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_le_bytes());
    }

    /// Append a u32 attribute (big endian / network order).
    pub fn append_attr_u32_be(&mut self, attr_type: u16, value: u32) {
        self.append_attr(attr_type, &value.to_be_bytes());
    }

    /// Append a u64 attribute (native endian).
    pub fn append_attr_u64(&mut self, attr_type: u16, value: u64) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append an s64 attribute (native endian).
    pub fn append_attr_i64(&mut self, attr_type: u16, value: i64) {
        self.append_attr(attr_type, &value.to_ne_bytes());
    }

    /// Append a u64 attribute (little endian).
    pub fn append_attr_u64_le(&mut self, attr_type: u16, value: u64) {
        self.append_attr(attr_type, &value.to_le_bytes());
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        self.append_attr(attr_type, &data);
    }

    /// Start a nested attribute. Returns a token to finalize it.
    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let offset = self.buf.len();
        let attr = NlAttr::new(attr_type | NLA_F_NESTED, 0);
        self.buf.extend_from_slice(attr.as_bytes());
        NestToken { offset }
    }

    /// End a nested attribute started with `nest_start`.
    pub fn nest_end(&mut self, token: NestToken) {
        let len = self.buf.len() - token.offset;
        if len - NLA_HDRLEN > NLA_MAX_PAYLOAD {
            self.note_overflow(len - NLA_HDRLEN, NLA_MAX_PAYLOAD);
            return;
        }
        let len_bytes = (len as u16).to_ne_bytes();
        self.buf[token.offset..token.offset + 2].copy_from_slice(&len_bytes);
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
    }

    /// Set the message type, for requests built before their family is resolved.
    pub fn set_msg_type(&mut self, msg_type: u16) {
        self.buf[4..6].copy_from_slice(&msg_type.to_ne_bytes());
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        self.buf[12..16].copy_from_slice(&pid.to_ne_bytes());
    }

    /// Finalize and return the message bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        self.buf
    }

    /// Finalize, failing if any append could not be encoded.
    pub fn try_finish(self) -> Result<Vec<u8>> {
        if let Some((len, max)) = self.overflow {
            return Err(Error::MessageOverflow { len, max });
        }
        Ok(self.finish())
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrIter, get};
    use crate::netlink::message::NLM_F_REQUEST;

    fn attrs(msg: &[u8]) -> Vec<(u16, Vec<u8>)> {
        AttrIter::new(&msg[NLMSG_HDRLEN..])
            .map(|(k, p)| (k, p.to_vec()))
            .collect()
    }

    #[test]
    fn test_simple_message() {
        let msg = MessageBuilder::new(16, NLM_F_REQUEST).finish();
        assert_eq!(msg.len(), NLMSG_HDRLEN);

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, NLMSG_HDRLEN);
        assert_eq!(header.nlmsg_type, 16);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
    }

    #[test]
    fn test_late_msg_type() {
        let mut builder = MessageBuilder::new(0, NLM_F_REQUEST);
        builder.append_attr_u8(1, 7);
        builder.set_msg_type(0x1a);
        let msg = builder.finish();

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_type, 0x1a);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
        assert_eq!(attrs(&msg).len(), 1);
    }

    #[test]
    fn test_signed_round_trip() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.append_attr_i8(1, i8::MIN);
        builder.append_attr_i16(2, -12345);
        builder.append_attr_i32(3, -7700);
        builder.append_attr_i64(4, i64::MIN + 1);
        let msg = builder.try_finish().unwrap();
        let a = attrs(&msg);

        assert_eq!(get::i8(&a[0].1).unwrap(), i8::MIN);
        assert_eq!(get::i16_ne(&a[1].1).unwrap(), -12345);
        assert_eq!(get::i32_ne(&a[2].1).unwrap(), -7700);
        assert_eq!(get::i64_ne(&a[3].1).unwrap(), i64::MIN + 1);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.append_attr_u16_le(9, 0xabcd);
        builder.append_attr_u64_le(23, 0x0011_2233_4455_6677);
        let a = attrs(&builder.finish());
        assert_eq!(a[0].1, vec![0xcd, 0xab]);
        assert_eq!(a[1].1, vec![0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00]);
    }

    #[test]
    fn test_nested_attribute() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        let nest = builder.nest_start(1);
        builder.append_attr_u32(2, 100);
        builder.nest_end(nest);
        let a = attrs(&builder.finish());

        assert_eq!(a.len(), 1);
        let inner: Vec<_> = AttrIter::new(&a[0].1).collect();
        assert_eq!(inner.len(), 1);
        assert_eq!(get::u32_ne(inner[0].1).unwrap(), 100);
    }

    #[test]
    fn test_oversized_attribute_overflows() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST).with_limit(usize::MAX);
        builder.append_attr(1, &vec![0u8; NLA_MAX_PAYLOAD + 1]);
        assert!(builder.overflowed());
        assert!(matches!(
            builder.try_finish(),
            Err(Error::MessageOverflow { .. })
        ));
    }

    #[test]
    fn test_message_limit_overflows() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST).with_limit(32);
        builder.append_attr(1, &[0u8; 8]);
        assert!(!builder.overflowed());
        builder.append_attr(2, &[0u8; 8]);
        assert!(builder.overflowed());
    }
}
