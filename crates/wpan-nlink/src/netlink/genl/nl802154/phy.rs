//! WPAN PHY records and capability decoding.

use super::{CapAttr, MAX_PAGE, Nl802154Attr};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::error::Result;
use crate::netlink::policy::{AttrKind, Policy, rule};

static PHY_POLICY: Policy = Policy::new(&[
    rule(Nl802154Attr::WpanPhy as u16, "WPAN_PHY", AttrKind::U32),
    rule(Nl802154Attr::WpanPhyName as u16, "WPAN_PHY_NAME", AttrKind::String),
    rule(Nl802154Attr::ChannelsSupported as u16, "CHANNELS_SUPPORTED", AttrKind::Nested),
    rule(Nl802154Attr::Page as u16, "PAGE", AttrKind::U8),
    rule(Nl802154Attr::Channel as u16, "CHANNEL", AttrKind::U8),
    rule(Nl802154Attr::CcaMode as u16, "CCA_MODE", AttrKind::U32),
    rule(Nl802154Attr::CcaOpt as u16, "CCA_OPT", AttrKind::U32),
    rule(Nl802154Attr::CcaEdLevel as u16, "CCA_ED_LEVEL", AttrKind::S32),
    rule(Nl802154Attr::TxPower as u16, "TX_POWER", AttrKind::S32),
    rule(Nl802154Attr::WpanPhyCaps as u16, "WPAN_PHY_CAPS", AttrKind::Nested),
]);

static CAPS_POLICY: Policy = Policy::new(&[
    rule(CapAttr::Iftypes as u16, "CAP_ATTR_IFTYPES", AttrKind::Nested),
    rule(CapAttr::Channels as u16, "CAP_ATTR_CHANNELS", AttrKind::Nested),
    rule(CapAttr::TxPowers as u16, "CAP_ATTR_TX_POWERS", AttrKind::Nested),
    rule(CapAttr::CcaEdLevels as u16, "CAP_ATTR_CCA_ED_LEVELS", AttrKind::Nested),
    rule(CapAttr::CcaModes as u16, "CAP_ATTR_CCA_MODES", AttrKind::Nested),
    rule(CapAttr::CcaOpts as u16, "CAP_ATTR_CCA_OPTS", AttrKind::Nested),
    rule(CapAttr::MinMinbe as u16, "CAP_ATTR_MIN_MINBE", AttrKind::U8),
    rule(CapAttr::MaxMinbe as u16, "CAP_ATTR_MAX_MINBE", AttrKind::U8),
    rule(CapAttr::MinMaxbe as u16, "CAP_ATTR_MIN_MAXBE", AttrKind::U8),
    rule(CapAttr::MaxMaxbe as u16, "CAP_ATTR_MAX_MAXBE", AttrKind::U8),
    rule(CapAttr::MinCsmaBackoffs as u16, "CAP_ATTR_MIN_CSMA_BACKOFFS", AttrKind::U8),
    rule(CapAttr::MaxCsmaBackoffs as u16, "CAP_ATTR_MAX_CSMA_BACKOFFS", AttrKind::U8),
    rule(CapAttr::MinFrameRetries as u16, "CAP_ATTR_MIN_FRAME_RETRIES", AttrKind::S8),
    rule(CapAttr::MaxFrameRetries as u16, "CAP_ATTR_MAX_FRAME_RETRIES", AttrKind::S8),
    rule(CapAttr::Lbt as u16, "CAP_ATTR_LBT", AttrKind::U32),
]);

/// One physical 802.15.4 radio as reported by `GET_WPAN_PHY`.
///
/// Large PHYs are split across several dump messages; use [`WpanPhy::merge`]
/// to fold them back together by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WpanPhy {
    pub index: Option<u32>,
    pub name: Option<String>,
    /// Deprecated per-page channel bitmasks, indexed by page.
    pub channels_supported: Vec<u32>,
    pub page: Option<u8>,
    pub channel: Option<u8>,
    pub cca_mode: Option<u32>,
    pub cca_opt: Option<u32>,
    /// mBm.
    pub cca_ed_level: Option<i32>,
    /// mBm.
    pub tx_power: Option<i32>,
    pub caps: Option<PhyCaps>,
}

/// Supported value ranges advertised in `WPAN_PHY_CAPS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhyCaps {
    pub iftypes: Vec<u32>,
    /// `(page, channels)` pairs.
    pub channels: Vec<(u8, Vec<u8>)>,
    /// mBm.
    pub tx_powers: Vec<i32>,
    /// mBm.
    pub cca_ed_levels: Vec<i32>,
    pub cca_modes: Vec<u32>,
    pub cca_opts: Vec<u32>,
    pub min_minbe: Option<u8>,
    pub max_minbe: Option<u8>,
    pub min_maxbe: Option<u8>,
    pub max_maxbe: Option<u8>,
    pub min_csma_backoffs: Option<u8>,
    pub max_csma_backoffs: Option<u8>,
    pub min_frame_retries: Option<i8>,
    pub max_frame_retries: Option<i8>,
    pub lbt: Option<u32>,
}

impl WpanPhy {
    /// Decode the attributes of one `GET_WPAN_PHY` reply.
    pub fn parse(data: &[u8]) -> Result<Self> {
        PHY_POLICY.validate(data)?;

        let mut phy = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == Nl802154Attr::WpanPhy as u16 => phy.index = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::WpanPhyName as u16 => {
                    phy.name = Some(get::string(payload)?.to_string())
                }
                t if t == Nl802154Attr::ChannelsSupported as u16 => {
                    phy.channels_supported = AttrIter::new(payload)
                        .filter(|(t, _)| *t == Nl802154Attr::SupportedChannel as u16)
                        .map(|(_, p)| get::u32_ne(p))
                        .collect::<Result<_>>()?;
                }
                t if t == Nl802154Attr::Page as u16 => phy.page = Some(get::u8(payload)?),
                t if t == Nl802154Attr::Channel as u16 => phy.channel = Some(get::u8(payload)?),
                t if t == Nl802154Attr::CcaMode as u16 => phy.cca_mode = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::CcaOpt as u16 => phy.cca_opt = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::CcaEdLevel as u16 => {
                    phy.cca_ed_level = Some(get::i32_ne(payload)?)
                }
                t if t == Nl802154Attr::TxPower as u16 => phy.tx_power = Some(get::i32_ne(payload)?),
                t if t == Nl802154Attr::WpanPhyCaps as u16 => {
                    phy.caps = Some(PhyCaps::parse(payload)?)
                }
                _ => {}
            }
        }
        Ok(phy)
    }

    /// Fold a continuation message for the same PHY into `self`.
    ///
    /// Fields already present are kept; lists from `other` are appended.
    pub fn merge(&mut self, other: WpanPhy) {
        self.index = self.index.or(other.index);
        if self.name.is_none() {
            self.name = other.name;
        }
        self.channels_supported.extend(other.channels_supported);
        self.page = self.page.or(other.page);
        self.channel = self.channel.or(other.channel);
        self.cca_mode = self.cca_mode.or(other.cca_mode);
        self.cca_opt = self.cca_opt.or(other.cca_opt);
        self.cca_ed_level = self.cca_ed_level.or(other.cca_ed_level);
        self.tx_power = self.tx_power.or(other.tx_power);
        if let Some(theirs) = other.caps {
            match &mut self.caps {
                Some(mine) => mine.merge(theirs),
                None => self.caps = Some(theirs),
            }
        }
    }

    /// Channels from the deprecated bitmask, as `(page, channels)` pairs.
    pub fn supported_channels(&self) -> Vec<(u8, Vec<u8>)> {
        self.channels_supported
            .iter()
            .enumerate()
            .take(MAX_PAGE as usize + 1)
            .filter(|(_, mask)| **mask != 0)
            .map(|(page, mask)| (page as u8, channels_in_mask(*mask)))
            .collect()
    }
}

impl PhyCaps {
    pub fn parse(data: &[u8]) -> Result<Self> {
        CAPS_POLICY.validate(data)?;

        let mut caps = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == CapAttr::Iftypes as u16 => caps.iftypes = flag_types(payload),
                t if t == CapAttr::Channels as u16 => {
                    caps.channels = AttrIter::new(payload)
                        .map(|(page, chans)| {
                            let channels = flag_types(chans).into_iter().map(|c| c as u8).collect();
                            (page as u8, channels)
                        })
                        .collect();
                }
                t if t == CapAttr::TxPowers as u16 => caps.tx_powers = s32_list(payload)?,
                t if t == CapAttr::CcaEdLevels as u16 => caps.cca_ed_levels = s32_list(payload)?,
                t if t == CapAttr::CcaModes as u16 => caps.cca_modes = flag_types(payload),
                t if t == CapAttr::CcaOpts as u16 => caps.cca_opts = flag_types(payload),
                t if t == CapAttr::MinMinbe as u16 => caps.min_minbe = Some(get::u8(payload)?),
                t if t == CapAttr::MaxMinbe as u16 => caps.max_minbe = Some(get::u8(payload)?),
                t if t == CapAttr::MinMaxbe as u16 => caps.min_maxbe = Some(get::u8(payload)?),
                t if t == CapAttr::MaxMaxbe as u16 => caps.max_maxbe = Some(get::u8(payload)?),
                t if t == CapAttr::MinCsmaBackoffs as u16 => {
                    caps.min_csma_backoffs = Some(get::u8(payload)?)
                }
                t if t == CapAttr::MaxCsmaBackoffs as u16 => {
                    caps.max_csma_backoffs = Some(get::u8(payload)?)
                }
                t if t == CapAttr::MinFrameRetries as u16 => {
                    caps.min_frame_retries = Some(get::i8(payload)?)
                }
                t if t == CapAttr::MaxFrameRetries as u16 => {
                    caps.max_frame_retries = Some(get::i8(payload)?)
                }
                t if t == CapAttr::Lbt as u16 => caps.lbt = Some(get::u32_ne(payload)?),
                _ => {}
            }
        }
        Ok(caps)
    }

    fn merge(&mut self, other: PhyCaps) {
        self.iftypes.extend(other.iftypes);
        self.channels.extend(other.channels);
        self.tx_powers.extend(other.tx_powers);
        self.cca_ed_levels.extend(other.cca_ed_levels);
        self.cca_modes.extend(other.cca_modes);
        self.cca_opts.extend(other.cca_opts);
        self.min_minbe = self.min_minbe.or(other.min_minbe);
        self.max_minbe = self.max_minbe.or(other.max_minbe);
        self.min_maxbe = self.min_maxbe.or(other.min_maxbe);
        self.max_maxbe = self.max_maxbe.or(other.max_maxbe);
        self.min_csma_backoffs = self.min_csma_backoffs.or(other.min_csma_backoffs);
        self.max_csma_backoffs = self.max_csma_backoffs.or(other.max_csma_backoffs);
        self.min_frame_retries = self.min_frame_retries.or(other.min_frame_retries);
        self.max_frame_retries = self.max_frame_retries.or(other.max_frame_retries);
        self.lbt = self.lbt.or(other.lbt);
    }
}

/// Nest of flag attributes whose type is the value.
fn flag_types(data: &[u8]) -> Vec<u32> {
    AttrIter::new(data).map(|(t, _)| t as u32).collect()
}

/// Nest of s32 attributes whose type is the list position.
fn s32_list(data: &[u8]) -> Result<Vec<i32>> {
    AttrIter::new(data).map(|(_, p)| get::i32_ne(p)).collect()
}

fn channels_in_mask(mask: u32) -> Vec<u8> {
    (0..32u8).filter(|ch| mask & (1 << ch) != 0).collect()
}

/// Centre frequency of a channel in tenths of MHz, if the page is known.
pub fn channel_frequency(page: u8, channel: u8) -> Option<u32> {
    let ch = channel as u32;
    match (page, channel) {
        (0..=2, 0) => Some(8683),
        (0..=2, 1..=10) => Some(9060 + 20 * (ch - 1)),
        (0, 11..=26) => Some(24050 + 50 * (ch - 11)),
        (5, 0..=3) => Some(7800 + 20 * ch),
        (5, 4..=7) => Some(7800 + 20 * (ch - 4)),
        (6, 0..=7) => Some(9512 + 6 * ch),
        (6, 8..=9) => Some(9544 + 2 * (ch - 8)),
        (6, 10..=21) => Some(9511 + 4 * (ch - 10)),
        _ => None,
    }
}
