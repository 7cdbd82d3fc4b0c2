//! Address and key identifier types shared by several nl802154 records.

use std::fmt;
use std::str::FromStr;

use super::{DevAddrAttr, DevAddrMode, KEY_SIZE, KeyIdAttr, KeyIdMode};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::policy::{AttrKind, Policy, rule};
use crate::util::addr::{self, ParseError};

/// 64-bit IEEE 802.15.4 extended address.
///
/// Held in host order; the wire carries it little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExtendedAddr(pub u64);

impl ExtendedAddr {
    pub fn encode(self, b: &mut MessageBuilder, attr: u16) {
        b.append_attr_u64_le(attr, self.0);
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(Self(get::u64_le(payload)?))
    }
}

impl fmt::Display for ExtendedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl FromStr for ExtendedAddr {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        addr::parse_extended_addr(s).map(Self)
    }
}

/// 128-bit link-layer security key.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyBytes(pub [u8; KEY_SIZE]);

impl fmt::Display for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&addr::format_hex_octets(&self.0))
    }
}

// Key material stays out of debug logs.
impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyBytes(..)")
    }
}

impl FromStr for KeyBytes {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        addr::parse_key(s).map(Self)
    }
}

/// Short or extended device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevAddr {
    Short(u16),
    Extended(ExtendedAddr),
}

impl DevAddr {
    /// Interpret a coordinator address attribute: 2 bytes short, 8 bytes extended.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        match payload.len() {
            2 => Ok(Self::Short(get::u16_le(payload)?)),
            8 => Ok(Self::Extended(ExtendedAddr::decode(payload)?)),
            n => Err(Error::InvalidAttribute(format!(
                "device address of {} bytes",
                n
            ))),
        }
    }

    pub fn mode(&self) -> DevAddrMode {
        match self {
            Self::Short(_) => DevAddrMode::Short,
            Self::Extended(_) => DevAddrMode::Extended,
        }
    }

    /// Address length in bytes.
    pub fn len(&self) -> u8 {
        match self {
            Self::Short(_) => 2,
            Self::Extended(_) => 8,
        }
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(a) => write!(f, "0x{:04x}", a),
            Self::Extended(a) => write!(f, "{}", a),
        }
    }
}

static DEV_ADDR_POLICY: Policy = Policy::new(&[
    rule(DevAddrAttr::PanId as u16, "DEV_ADDR_PAN_ID", AttrKind::U16),
    rule(DevAddrAttr::Mode as u16, "DEV_ADDR_MODE", AttrKind::U32),
    rule(DevAddrAttr::Short as u16, "DEV_ADDR_SHORT", AttrKind::U16),
    rule(DevAddrAttr::Extended as u16, "DEV_ADDR_EXTENDED", AttrKind::U64),
]);

static KEY_ID_POLICY: Policy = Policy::new(&[
    rule(KeyIdAttr::Mode as u16, "KEY_ID_MODE", AttrKind::U32),
    rule(KeyIdAttr::Index as u16, "KEY_ID_INDEX", AttrKind::U8),
    rule(KeyIdAttr::Implicit as u16, "KEY_ID_IMPLICIT", AttrKind::Nested),
    rule(KeyIdAttr::SourceShort as u16, "KEY_ID_SOURCE_SHORT", AttrKind::U32),
    rule(KeyIdAttr::SourceExtended as u16, "KEY_ID_SOURCE_EXTENDED", AttrKind::U64),
]);

/// How incoming frames reference a security key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyId {
    /// Key implied by the frame's source PAN and address.
    Implicit { pan_id: u16, addr: DevAddr },
    /// Key index only.
    Index(u8),
    /// Key index plus 4-byte key source.
    IndexShort { index: u8, source: u32 },
    /// Key index plus 8-byte key source.
    IndexExtended { index: u8, source: ExtendedAddr },
}

impl KeyId {
    pub fn mode(&self) -> KeyIdMode {
        match self {
            Self::Implicit { .. } => KeyIdMode::Implicit,
            Self::Index(_) => KeyIdMode::Index,
            Self::IndexShort { .. } => KeyIdMode::IndexShort,
            Self::IndexExtended { .. } => KeyIdMode::IndexExtended,
        }
    }

    /// Append as a nested attribute of type `attr`.
    pub fn encode(&self, b: &mut MessageBuilder, attr: u16) {
        let nest = b.nest_start(attr);
        b.append_attr_u32(KeyIdAttr::Mode as u16, self.mode() as u32);
        match *self {
            Self::Implicit { pan_id, addr } => {
                let dev = b.nest_start(KeyIdAttr::Implicit as u16);
                b.append_attr_u16_le(DevAddrAttr::PanId as u16, pan_id);
                b.append_attr_u32(DevAddrAttr::Mode as u16, addr.mode() as u32);
                match addr {
                    DevAddr::Short(short) => {
                        b.append_attr_u16_le(DevAddrAttr::Short as u16, short)
                    }
                    DevAddr::Extended(ext) => ext.encode(b, DevAddrAttr::Extended as u16),
                }
                b.nest_end(dev);
            }
            Self::Index(index) => {
                b.append_attr_u8(KeyIdAttr::Index as u16, index);
            }
            Self::IndexShort { index, source } => {
                b.append_attr_u8(KeyIdAttr::Index as u16, index);
                b.append_attr_u32_le(KeyIdAttr::SourceShort as u16, source);
            }
            Self::IndexExtended { index, source } => {
                b.append_attr_u8(KeyIdAttr::Index as u16, index);
                source.encode(b, KeyIdAttr::SourceExtended as u16);
            }
        }
        b.nest_end(nest);
    }

    /// Decode a nested key identifier.
    pub fn parse(data: &[u8]) -> Result<Self> {
        KEY_ID_POLICY.validate(data)?;

        let mut mode = None;
        let mut index = None;
        let mut implicit = None;
        let mut source_short = None;
        let mut source_extended = None;

        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == KeyIdAttr::Mode as u16 => mode = Some(get::u32_ne(payload)?),
                t if t == KeyIdAttr::Index as u16 => index = Some(get::u8(payload)?),
                t if t == KeyIdAttr::Implicit as u16 => implicit = Some(payload),
                t if t == KeyIdAttr::SourceShort as u16 => {
                    source_short = Some(get::u32_le(payload)?)
                }
                t if t == KeyIdAttr::SourceExtended as u16 => {
                    source_extended = Some(ExtendedAddr::decode(payload)?)
                }
                _ => {}
            }
        }

        let mode = KEY_ID_POLICY.require(KeyIdAttr::Mode as u16, mode)?;
        let need_index = || KEY_ID_POLICY.require(KeyIdAttr::Index as u16, index);
        match mode {
            m if m == KeyIdMode::Implicit as u32 => {
                let nested =
                    KEY_ID_POLICY.require(KeyIdAttr::Implicit as u16, implicit)?;
                let (pan_id, addr) = parse_dev_addr(nested)?;
                Ok(Self::Implicit { pan_id, addr })
            }
            m if m == KeyIdMode::Index as u32 => Ok(Self::Index(need_index()?)),
            m if m == KeyIdMode::IndexShort as u32 => Ok(Self::IndexShort {
                index: need_index()?,
                source: KEY_ID_POLICY.require(KeyIdAttr::SourceShort as u16, source_short)?,
            }),
            m if m == KeyIdMode::IndexExtended as u32 => Ok(Self::IndexExtended {
                index: need_index()?,
                source: KEY_ID_POLICY
                    .require(KeyIdAttr::SourceExtended as u16, source_extended)?,
            }),
            other => Err(Error::policy(
                "KEY_ID_MODE",
                format!("unknown key id mode {}", other),
            )),
        }
    }
}

/// Replayable command-line form: `<mode> <fields..>`.
impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode() as u32)?;
        match self {
            Self::Implicit { pan_id, addr } => {
                write!(f, " 0x{:04x} {} {}", pan_id, addr.mode() as u32, addr)
            }
            Self::Index(index) => write!(f, " 0x{:02x}", index),
            Self::IndexShort { index, source } => {
                write!(f, " 0x{:02x} 0x{:08x}", index, source)
            }
            Self::IndexExtended { index, source } => write!(f, " 0x{:02x} {}", index, source),
        }
    }
}

/// Decode an implicit key source: PAN id plus short or extended address.
fn parse_dev_addr(data: &[u8]) -> Result<(u16, DevAddr)> {
    DEV_ADDR_POLICY.validate(data)?;

    let mut pan_id = None;
    let mut mode = None;
    let mut short = None;
    let mut extended = None;

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == DevAddrAttr::PanId as u16 => pan_id = Some(get::u16_le(payload)?),
            t if t == DevAddrAttr::Mode as u16 => mode = Some(get::u32_ne(payload)?),
            t if t == DevAddrAttr::Short as u16 => short = Some(get::u16_le(payload)?),
            t if t == DevAddrAttr::Extended as u16 => {
                extended = Some(ExtendedAddr::decode(payload)?)
            }
            _ => {}
        }
    }

    let pan_id = DEV_ADDR_POLICY.require(DevAddrAttr::PanId as u16, pan_id)?;
    let addr = match DEV_ADDR_POLICY.require(DevAddrAttr::Mode as u16, mode)? {
        m if m == DevAddrMode::Short as u32 => {
            DevAddr::Short(DEV_ADDR_POLICY.require(DevAddrAttr::Short as u16, short)?)
        }
        m if m == DevAddrMode::Extended as u32 => DevAddr::Extended(
            DEV_ADDR_POLICY.require(DevAddrAttr::Extended as u16, extended)?,
        ),
        other => {
            return Err(Error::policy(
                "DEV_ADDR_MODE",
                format!("unsupported address mode {}", other),
            ));
        }
    };
    Ok((pan_id, addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::NLMSG_HDRLEN;

    fn nested_payload(key_id: &KeyId) -> Vec<u8> {
        let mut b = MessageBuilder::new(0x10, 0);
        key_id.encode(&mut b, 1);
        let msg = b.finish();
        let (_, payload) = AttrIter::new(&msg[NLMSG_HDRLEN..]).next().unwrap();
        payload.to_vec()
    }

    #[test]
    fn test_key_id_modes_survive_encoding() {
        let ids = [
            KeyId::Implicit {
                pan_id: 0xbeef,
                addr: DevAddr::Short(0x0001),
            },
            KeyId::Implicit {
                pan_id: 0x0777,
                addr: DevAddr::Extended(ExtendedAddr(0x0011_2233_4455_6677)),
            },
            KeyId::Index(5),
            KeyId::IndexShort {
                index: 1,
                source: 0xdead_beef,
            },
            KeyId::IndexExtended {
                index: 2,
                source: ExtendedAddr(42),
            },
        ];
        for id in ids {
            assert_eq!(KeyId::parse(&nested_payload(&id)).unwrap(), id);
        }
    }

    #[test]
    fn test_key_id_display() {
        assert_eq!(KeyId::Index(5).to_string(), "1 0x05");
        assert_eq!(
            KeyId::Implicit {
                pan_id: 0xbeef,
                addr: DevAddr::Short(0x0001),
            }
            .to_string(),
            "0 0xbeef 2 0x0001"
        );
        assert_eq!(
            KeyId::IndexShort {
                index: 1,
                source: 0xab,
            }
            .to_string(),
            "2 0x01 0x000000ab"
        );
    }

    #[test]
    fn test_key_id_missing_index() {
        let mut b = MessageBuilder::new(0x10, 0);
        b.append_attr_u32(KeyIdAttr::Mode as u16, KeyIdMode::Index as u32);
        let msg = b.finish();
        let err = KeyId::parse(&msg[NLMSG_HDRLEN..]).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { name: "KEY_ID_INDEX" }));
    }

    #[test]
    fn test_dev_addr_from_payload() {
        assert_eq!(
            DevAddr::from_payload(&[0x34, 0x12]).unwrap(),
            DevAddr::Short(0x1234)
        );
        assert_eq!(
            DevAddr::from_payload(&1u64.to_le_bytes()).unwrap(),
            DevAddr::Extended(ExtendedAddr(1))
        );
        assert!(DevAddr::from_payload(&[0; 4]).is_err());
    }

    #[test]
    fn test_extended_addr_display() {
        assert_eq!(ExtendedAddr(0xab).to_string(), "0x00000000000000ab");
    }

    #[test]
    fn test_key_debug_hides_material() {
        let key = KeyBytes([0x11; KEY_SIZE]);
        assert_eq!(format!("{:?}", key), "KeyBytes(..)");
        assert!(key.to_string().starts_with("11:11:"));
    }
}
