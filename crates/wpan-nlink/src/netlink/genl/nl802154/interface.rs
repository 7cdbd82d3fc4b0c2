//! WPAN interface records and link-layer security parameters.

use super::types::{ExtendedAddr, KeyId};
use super::Nl802154Attr;
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::Result;
use crate::netlink::policy::{AttrKind, Policy, rule};

static INTERFACE_POLICY: Policy = Policy::new(&[
    rule(Nl802154Attr::WpanPhy as u16, "WPAN_PHY", AttrKind::U32),
    rule(Nl802154Attr::Ifindex as u16, "IFINDEX", AttrKind::U32),
    rule(Nl802154Attr::Ifname as u16, "IFNAME", AttrKind::String),
    rule(Nl802154Attr::Iftype as u16, "IFTYPE", AttrKind::U32),
    rule(Nl802154Attr::WpanDev as u16, "WPAN_DEV", AttrKind::U64),
    rule(Nl802154Attr::ExtendedAddr as u16, "EXTENDED_ADDR", AttrKind::U64),
    rule(Nl802154Attr::ShortAddr as u16, "SHORT_ADDR", AttrKind::U16),
    rule(Nl802154Attr::PanId as u16, "PAN_ID", AttrKind::U16),
    rule(Nl802154Attr::MaxFrameRetries as u16, "MAX_FRAME_RETRIES", AttrKind::S8),
    rule(Nl802154Attr::MinBe as u16, "MIN_BE", AttrKind::U8),
    rule(Nl802154Attr::MaxBe as u16, "MAX_BE", AttrKind::U8),
    rule(Nl802154Attr::MaxCsmaBackoffs as u16, "MAX_CSMA_BACKOFFS", AttrKind::U8),
    rule(Nl802154Attr::LbtMode as u16, "LBT_MODE", AttrKind::U8),
    rule(Nl802154Attr::AckreqDefault as u16, "ACKREQ_DEFAULT", AttrKind::U8),
    rule(Nl802154Attr::SecEnabled as u16, "SEC_ENABLED", AttrKind::U8),
    rule(Nl802154Attr::SecOutLevel as u16, "SEC_OUT_LEVEL", AttrKind::U32),
    rule(Nl802154Attr::SecOutKeyId as u16, "SEC_OUT_KEY_ID", AttrKind::Nested),
    rule(Nl802154Attr::SecFrameCounter as u16, "SEC_FRAME_COUNTER", AttrKind::U32),
]);

/// A virtual 802.15.4 interface as reported by `GET_INTERFACE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WpanInterface {
    pub wpan_phy: Option<u32>,
    pub ifindex: Option<u32>,
    pub ifname: Option<String>,
    pub wpan_dev: Option<u64>,
    pub iftype: Option<u32>,
    pub extended_addr: Option<ExtendedAddr>,
    pub short_addr: Option<u16>,
    pub pan_id: Option<u16>,
    pub max_frame_retries: Option<i8>,
    pub min_be: Option<u8>,
    pub max_be: Option<u8>,
    pub max_csma_backoffs: Option<u8>,
    pub lbt: Option<u8>,
    pub ackreq_default: Option<u8>,
    pub security: SecParams,
}

/// Outgoing link-layer security configuration.
///
/// Decoded from interface replies and encoded into `SET_SEC_PARAMS`; absent
/// fields are left untouched by the kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecParams {
    pub enabled: Option<bool>,
    pub out_level: Option<u32>,
    pub out_key_id: Option<KeyId>,
    /// Host order; big-endian on the wire.
    pub frame_counter: Option<u32>,
}

impl SecParams {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.out_level.is_none()
            && self.out_key_id.is_none()
            && self.frame_counter.is_none()
    }

    pub fn encode(&self, b: &mut MessageBuilder) {
        if let Some(enabled) = self.enabled {
            b.append_attr_u8(Nl802154Attr::SecEnabled as u16, enabled as u8);
        }
        if let Some(level) = self.out_level {
            b.append_attr_u32(Nl802154Attr::SecOutLevel as u16, level);
        }
        if let Some(key_id) = &self.out_key_id {
            key_id.encode(b, Nl802154Attr::SecOutKeyId as u16);
        }
        if let Some(counter) = self.frame_counter {
            b.append_attr_u32_be(Nl802154Attr::SecFrameCounter as u16, counter);
        }
    }
}

impl WpanInterface {
    /// Decode the attributes of one `GET_INTERFACE` reply.
    pub fn parse(data: &[u8]) -> Result<Self> {
        INTERFACE_POLICY.validate(data)?;

        let mut iface = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == Nl802154Attr::WpanPhy as u16 => {
                    iface.wpan_phy = Some(get::u32_ne(payload)?)
                }
                t if t == Nl802154Attr::Ifindex as u16 => iface.ifindex = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::Ifname as u16 => {
                    iface.ifname = Some(get::string(payload)?.to_string())
                }
                t if t == Nl802154Attr::WpanDev as u16 => {
                    iface.wpan_dev = Some(get::u64_ne(payload)?)
                }
                t if t == Nl802154Attr::Iftype as u16 => iface.iftype = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::ExtendedAddr as u16 => {
                    iface.extended_addr = Some(ExtendedAddr::decode(payload)?)
                }
                t if t == Nl802154Attr::ShortAddr as u16 => {
                    iface.short_addr = Some(get::u16_le(payload)?)
                }
                t if t == Nl802154Attr::PanId as u16 => iface.pan_id = Some(get::u16_le(payload)?),
                t if t == Nl802154Attr::MaxFrameRetries as u16 => {
                    iface.max_frame_retries = Some(get::i8(payload)?)
                }
                t if t == Nl802154Attr::MinBe as u16 => iface.min_be = Some(get::u8(payload)?),
                t if t == Nl802154Attr::MaxBe as u16 => iface.max_be = Some(get::u8(payload)?),
                t if t == Nl802154Attr::MaxCsmaBackoffs as u16 => {
                    iface.max_csma_backoffs = Some(get::u8(payload)?)
                }
                t if t == Nl802154Attr::LbtMode as u16 => iface.lbt = Some(get::u8(payload)?),
                t if t == Nl802154Attr::AckreqDefault as u16 => {
                    iface.ackreq_default = Some(get::u8(payload)?)
                }
                t if t == Nl802154Attr::SecEnabled as u16 => {
                    iface.security.enabled = Some(get::u8(payload)? != 0)
                }
                t if t == Nl802154Attr::SecOutLevel as u16 => {
                    iface.security.out_level = Some(get::u32_ne(payload)?)
                }
                t if t == Nl802154Attr::SecOutKeyId as u16 => {
                    iface.security.out_key_id = Some(KeyId::parse(payload)?)
                }
                t if t == Nl802154Attr::SecFrameCounter as u16 => {
                    iface.security.frame_counter = Some(get::u32_be(payload)?)
                }
                _ => {}
            }
        }
        Ok(iface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::genl::nl802154::KeyIdAttr;
    use crate::netlink::message::NLMSG_HDRLEN;

    fn body(build: impl FnOnce(&mut MessageBuilder)) -> Vec<u8> {
        let mut b = MessageBuilder::new(0x10, 0);
        build(&mut b);
        b.finish()[NLMSG_HDRLEN..].to_vec()
    }

    #[test]
    fn test_parse_interface() {
        let data = body(|b| {
            b.append_attr_u32(Nl802154Attr::WpanPhy as u16, 0);
            b.append_attr_u32(Nl802154Attr::Ifindex as u16, 4);
            b.append_attr_str(Nl802154Attr::Ifname as u16, "wpan0");
            b.append_attr_u64(Nl802154Attr::WpanDev as u16, 0x1);
            b.append_attr_u32(Nl802154Attr::Iftype as u16, 0);
            b.append_attr_u64_le(Nl802154Attr::ExtendedAddr as u16, 0x0102_0304_0506_0708);
            b.append_attr_u16_le(Nl802154Attr::ShortAddr as u16, 0xfffe);
            b.append_attr_u16_le(Nl802154Attr::PanId as u16, 0xbeef);
            b.append_attr_i8(Nl802154Attr::MaxFrameRetries as u16, -1);
            b.append_attr_u8(Nl802154Attr::LbtMode as u16, 0);
            b.append_attr_u8(Nl802154Attr::SecEnabled as u16, 1);
            b.append_attr_u32_be(Nl802154Attr::SecFrameCounter as u16, 0x10);
        });

        let iface = WpanInterface::parse(&data).unwrap();
        assert_eq!(iface.ifname.as_deref(), Some("wpan0"));
        assert_eq!(iface.extended_addr, Some(ExtendedAddr(0x0102_0304_0506_0708)));
        assert_eq!(iface.short_addr, Some(0xfffe));
        assert_eq!(iface.pan_id, Some(0xbeef));
        assert_eq!(iface.max_frame_retries, Some(-1));
        assert_eq!(iface.min_be, None);
        assert_eq!(iface.security.enabled, Some(true));
        assert_eq!(iface.security.frame_counter, Some(0x10));
        assert!(iface.security.out_key_id.is_none());
    }

    #[test]
    fn test_sec_params_encoding() {
        let params = SecParams {
            out_key_id: Some(KeyId::Index(3)),
            frame_counter: Some(7),
            ..Default::default()
        };
        let data = body(|b| params.encode(b));
        let attrs: Vec<_> = AttrIter::new(&data).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].0, Nl802154Attr::SecOutKeyId as u16);
        let inner: Vec<_> = AttrIter::new(attrs[0].1).map(|(t, _)| t).collect();
        assert_eq!(inner, vec![KeyIdAttr::Mode as u16, KeyIdAttr::Index as u16]);
        assert_eq!(attrs[1].1, &7u32.to_be_bytes());
    }

    #[test]
    fn test_parse_bad_key_id_fails() {
        let data = body(|b| {
            let nest = b.nest_start(Nl802154Attr::SecOutKeyId as u16);
            b.append_attr_u32(KeyIdAttr::Mode as u16, 9);
            b.nest_end(nest);
        });
        assert!(WpanInterface::parse(&data).is_err());
    }
}
