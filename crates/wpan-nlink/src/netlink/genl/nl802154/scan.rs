//! Scanning, beacon discovery and association records.

use super::types::{DevAddr, ExtendedAddr};
use super::{CoordAttr, DevAddrAttr, MAX_CHANNEL, Nl802154Attr, PeerType, ScanType};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::Result;
use crate::netlink::policy::{AttrKind, Policy, rule};

static COORD_POLICY: Policy = Policy::new(&[
    rule(CoordAttr::PanId as u16, "COORD_PANID", AttrKind::U16),
    rule(CoordAttr::Addr as u16, "COORD_ADDR", AttrKind::Binary { min: 2, max: 8 }),
    rule(CoordAttr::Channel as u16, "COORD_CHANNEL", AttrKind::U8),
    rule(CoordAttr::Page as u16, "COORD_PAGE", AttrKind::U8),
    rule(CoordAttr::PreambleCode as u16, "COORD_PREAMBLE_CODE", AttrKind::U8),
    rule(CoordAttr::MeanPrf as u16, "COORD_MEAN_PRF", AttrKind::U8),
    rule(CoordAttr::SuperframeSpec as u16, "COORD_SUPERFRAME_SPEC", AttrKind::U16),
    rule(CoordAttr::LinkQuality as u16, "COORD_LINK_QUALITY", AttrKind::U8),
    rule(CoordAttr::GtsPermit as u16, "COORD_GTS_PERMIT", AttrKind::Flag),
]);

static PEER_POLICY: Policy = Policy::new(&[
    rule(DevAddrAttr::PeerType as u16, "DEV_ADDR_ATTR_PEER_TYPE", AttrKind::U8),
    rule(DevAddrAttr::Short as u16, "DEV_ADDR_ATTR_SHORT", AttrKind::U16),
    rule(DevAddrAttr::Extended as u16, "DEV_ADDR_ATTR_EXTENDED", AttrKind::U64),
]);

static ED_SCAN_POLICY: Policy = Policy::new(&[
    rule(Nl802154Attr::ScanStatus as u16, "SCAN_STATUS", AttrKind::U8),
    rule(Nl802154Attr::ScanType as u16, "SCAN_TYPE", AttrKind::U8),
    rule(Nl802154Attr::Page as u16, "PAGE", AttrKind::U8),
    rule(Nl802154Attr::SupportedChannel as u16, "SUPPORTED_CHANNEL", AttrKind::U32),
    rule(Nl802154Attr::ScanResultListSize as u16, "SCAN_RESULT_LIST_SIZE", AttrKind::U32),
    rule(Nl802154Attr::ScanEnergyDetectList as u16, "SCAN_ENERGY_DETECT_LIST", AttrKind::Nested),
    rule(Nl802154Attr::ScanDetectedCategory as u16, "SCAN_DETECTED_CATEGORY", AttrKind::U8),
]);

/// A PAN coordinator heard during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinator {
    pub pan_id: u16,
    pub addr: DevAddr,
    pub channel: Option<u8>,
    pub page: Option<u8>,
    pub preamble_code: Option<u8>,
    pub mean_prf: Option<u8>,
    pub superframe_spec: Option<u16>,
    pub link_quality: Option<u8>,
    pub gts_permit: bool,
}

/// Identity of a coordinator for de-duplicating beacon reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    pub pan_id: u16,
    pub addr: DevAddr,
}

impl Coordinator {
    /// Decode a `COORDINATOR` nest. PAN id and address are mandatory.
    pub fn parse(data: &[u8]) -> Result<Self> {
        COORD_POLICY.validate(data)?;

        let mut pan_id = None;
        let mut addr = None;
        let mut coord = Self {
            pan_id: 0,
            addr: DevAddr::Short(0),
            channel: None,
            page: None,
            preamble_code: None,
            mean_prf: None,
            superframe_spec: None,
            link_quality: None,
            gts_permit: false,
        };

        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == CoordAttr::PanId as u16 => pan_id = Some(get::u16_le(payload)?),
                t if t == CoordAttr::Addr as u16 => addr = Some(DevAddr::from_payload(payload)?),
                t if t == CoordAttr::Channel as u16 => coord.channel = Some(get::u8(payload)?),
                t if t == CoordAttr::Page as u16 => coord.page = Some(get::u8(payload)?),
                t if t == CoordAttr::PreambleCode as u16 => {
                    coord.preamble_code = Some(get::u8(payload)?)
                }
                t if t == CoordAttr::MeanPrf as u16 => coord.mean_prf = Some(get::u8(payload)?),
                t if t == CoordAttr::SuperframeSpec as u16 => {
                    coord.superframe_spec = Some(get::u16_ne(payload)?)
                }
                t if t == CoordAttr::LinkQuality as u16 => {
                    coord.link_quality = Some(get::u8(payload)?)
                }
                t if t == CoordAttr::GtsPermit as u16 => coord.gts_permit = true,
                _ => {}
            }
        }

        coord.pan_id = COORD_POLICY.require(CoordAttr::PanId as u16, pan_id)?;
        coord.addr = COORD_POLICY.require(CoordAttr::Addr as u16, addr)?;
        Ok(coord)
    }

    /// Decode the `COORDINATOR` nest of a scan or beacon notification.
    ///
    /// Returns `Ok(None)` when the message carries no coordinator.
    pub fn from_message(data: &[u8]) -> Result<Option<Self>> {
        AttrIter::new(data)
            .find(|(t, _)| *t == Nl802154Attr::Coordinator as u16)
            .map(|(_, p)| Self::parse(p))
            .transpose()
    }

    pub fn key(&self) -> CoordKey {
        CoordKey {
            pan_id: self.pan_id,
            addr: self.addr,
        }
    }
}

/// Parameters for `TRIGGER_SCAN` and the experimental `ED_SCAN_REQ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRequest {
    pub scan_type: ScanType,
    pub page: Option<u8>,
    /// Channel bitmap.
    pub channels: Option<u32>,
    /// Scan duration order.
    pub duration: Option<u8>,
}

impl ScanRequest {
    pub fn new(scan_type: ScanType) -> Self {
        Self {
            scan_type,
            page: None,
            channels: None,
            duration: None,
        }
    }

    /// Encode for `TRIGGER_SCAN`; only the type is mandatory.
    pub fn encode(&self, b: &mut MessageBuilder) {
        b.append_attr_u8(Nl802154Attr::ScanType as u16, self.scan_type as u8);
        if let Some(duration) = self.duration {
            b.append_attr_u8(Nl802154Attr::ScanDuration as u16, duration);
        }
        if let Some(page) = self.page {
            b.append_attr_u8(Nl802154Attr::Page as u16, page);
        }
        if let Some(channels) = self.channels {
            b.append_attr_u32(Nl802154Attr::ScanChannels as u16, channels);
        }
    }

    /// Encode for `ED_SCAN_REQ`, which carries every field and the
    /// channel mask in `SUPPORTED_CHANNEL`.
    pub fn encode_ed(&self, b: &mut MessageBuilder) {
        b.append_attr_u8(Nl802154Attr::ScanType as u16, self.scan_type as u8);
        b.append_attr_u32(
            Nl802154Attr::SupportedChannel as u16,
            self.channels.unwrap_or(0),
        );
        b.append_attr_u8(Nl802154Attr::ScanDuration as u16, self.duration.unwrap_or(0));
        b.append_attr_u8(Nl802154Attr::Page as u16, self.page.unwrap_or(0));
    }
}

/// Reply to an energy detection scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdScanResult {
    pub status: u8,
    pub scan_type: u8,
    pub page: u8,
    pub unscanned_channels: u32,
    pub result_list_size: u32,
    /// Energy levels in the order the channels were scanned.
    pub energy: Vec<u8>,
    pub detected_category: u8,
}

impl EdScanResult {
    pub fn parse(data: &[u8]) -> Result<Self> {
        ED_SCAN_POLICY.validate(data)?;

        let mut status = None;
        let mut scan_type = None;
        let mut page = None;
        let mut unscanned = None;
        let mut list_size = None;
        let mut energy = None;
        let mut category = None;

        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == Nl802154Attr::ScanStatus as u16 => status = Some(get::u8(payload)?),
                t if t == Nl802154Attr::ScanType as u16 => scan_type = Some(get::u8(payload)?),
                t if t == Nl802154Attr::Page as u16 => page = Some(get::u8(payload)?),
                t if t == Nl802154Attr::SupportedChannel as u16 => {
                    unscanned = Some(get::u32_ne(payload)?)
                }
                t if t == Nl802154Attr::ScanResultListSize as u16 => {
                    list_size = Some(get::u32_ne(payload)?)
                }
                t if t == Nl802154Attr::ScanEnergyDetectList as u16 => {
                    // Entries stop at the first foreign attribute.
                    let mut levels = Vec::new();
                    for (entry_type, entry) in AttrIter::new(payload) {
                        if entry_type != Nl802154Attr::ScanEnergyDetectListEntry as u16
                            || levels.len() > MAX_CHANNEL as usize
                        {
                            break;
                        }
                        levels.push(get::u8(entry)?);
                    }
                    energy = Some(levels);
                }
                t if t == Nl802154Attr::ScanDetectedCategory as u16 => {
                    category = Some(get::u8(payload)?)
                }
                _ => {}
            }
        }

        let p = &ED_SCAN_POLICY;
        Ok(Self {
            status: p.require(Nl802154Attr::ScanStatus as u16, status)?,
            scan_type: p.require(Nl802154Attr::ScanType as u16, scan_type)?,
            page: p.require(Nl802154Attr::Page as u16, page)?,
            unscanned_channels: p.require(Nl802154Attr::SupportedChannel as u16, unscanned)?,
            result_list_size: p.require(Nl802154Attr::ScanResultListSize as u16, list_size)?,
            energy: p.require(Nl802154Attr::ScanEnergyDetectList as u16, energy)?,
            detected_category: p.require(Nl802154Attr::ScanDetectedCategory as u16, category)?,
        })
    }

    /// Pair energy levels with the requested channels, lowest channel first.
    pub fn energy_by_channel(&self, requested: u32) -> Vec<(u8, u8)> {
        let limit = (self.result_list_size as usize).min(self.energy.len());
        (0..=MAX_CHANNEL)
            .filter(|ch| requested & (1 << ch) != 0)
            .zip(self.energy.iter().copied())
            .take(limit)
            .collect()
    }
}

/// An associated parent or child, from `LIST_ASSOCIATIONS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Peer {
    pub peer_type: Option<u8>,
    pub short_addr: Option<u16>,
    pub extended_addr: Option<ExtendedAddr>,
}

impl Peer {
    pub fn parse(data: &[u8]) -> Result<Self> {
        PEER_POLICY.validate(data)?;
        let mut peer = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == DevAddrAttr::PeerType as u16 => peer.peer_type = Some(get::u8(payload)?),
                t if t == DevAddrAttr::Short as u16 => peer.short_addr = Some(get::u16_le(payload)?),
                t if t == DevAddrAttr::Extended as u16 => {
                    peer.extended_addr = Some(ExtendedAddr::decode(payload)?)
                }
                _ => {}
            }
        }
        Ok(peer)
    }

    pub fn from_message(data: &[u8]) -> Result<Option<Self>> {
        AttrIter::new(data)
            .find(|(t, _)| *t == Nl802154Attr::Peer as u16)
            .map(|(_, p)| Self::parse(p))
            .transpose()
    }

    pub fn role(&self) -> &'static str {
        match self.peer_type {
            Some(t) if t == PeerType::Parent as u8 => "parent",
            Some(t) if t == PeerType::Child as u8 => "child",
            _ => "unknown",
        }
    }
}
