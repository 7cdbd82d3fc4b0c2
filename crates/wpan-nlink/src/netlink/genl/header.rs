//! Generic Netlink message header.
//!
//! GENL messages have an additional header after the standard netlink header:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ nlmsghdr (16 bytes)                     │
//! │   nlmsg_len, nlmsg_type (family_id),    │
//! │   nlmsg_flags, nlmsg_seq, nlmsg_pid     │
//! ├─────────────────────────────────────────┤
//! │ genlmsghdr (4 bytes)                    │
//! │   cmd (u8), version (u8), reserved (u16)│
//! ├─────────────────────────────────────────┤
//! │ Attributes (TLV format)                 │
//! └─────────────────────────────────────────┘
//! ```

use std::mem;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::error::{Error, Result};
use crate::netlink::message::NlMsgHdr;

/// Generic Netlink message header.
///
/// This header immediately follows the standard netlink header in GENL messages.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    /// Command identifier (family-specific)
    pub cmd: u8,
    /// Interface version
    pub version: u8,
    /// Reserved for future use
    pub reserved: u16,
}

/// Size of the GENL header in bytes.
pub const GENL_HDRLEN: usize = mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    /// Create a new GENL header with the given command and version.
    #[inline]
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Create a header from a byte slice.
    ///
    /// Returns `None` if the slice is too short.
    pub fn from_bytes(data: &[u8]) -> Option<&Self> {
        Self::ref_from_prefix(data).ok().map(|(hdr, _)| hdr)
    }
}

/// An owned generic netlink message, split into header fields and the
/// attribute stream that follows the GENL header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenlMessage {
    /// Family ID (the nlmsg_type).
    pub family: u16,
    /// Family-specific command.
    pub cmd: u8,
    /// Sequence number; 0 for multicast notifications.
    pub seq: u32,
    /// Raw attributes.
    pub attrs: Vec<u8>,
}

impl GenlMessage {
    /// Split a netlink payload into GENL header and attributes.
    pub fn parse(header: &NlMsgHdr, payload: &[u8]) -> Result<Self> {
        let genl = GenlMsgHdr::from_bytes(payload)
            .ok_or_else(|| Error::InvalidMessage("GENL header too short".into()))?;
        Ok(Self {
            family: header.nlmsg_type,
            cmd: genl.cmd,
            seq: header.nlmsg_seq,
            attrs: payload[GENL_HDRLEN..].to_vec(),
        })
    }

    /// True for messages the kernel multicast rather than sent in reply.
    pub fn is_notification(&self) -> bool {
        self.seq == 0
    }
}
