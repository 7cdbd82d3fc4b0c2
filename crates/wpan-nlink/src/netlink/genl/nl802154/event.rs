//! Multicast notifications from the `config`, `scan` and `mlme` groups.

use super::scan::Coordinator;
use super::{Nl802154Attr, Nl802154Cmd, ScanDoneReason};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::error::Result;
use crate::netlink::genl::GenlMessage;
use crate::netlink::policy::{AttrKind, Policy, rule};

static EVENT_POLICY: Policy = Policy::new(&[
    rule(Nl802154Attr::WpanPhy as u16, "WPAN_PHY", AttrKind::U32),
    rule(Nl802154Attr::WpanPhyName as u16, "WPAN_PHY_NAME", AttrKind::String),
    rule(Nl802154Attr::Ifindex as u16, "IFINDEX", AttrKind::U32),
    rule(Nl802154Attr::WpanDev as u16, "WPAN_DEV", AttrKind::U64),
    rule(Nl802154Attr::ScanDoneReason as u16, "SCAN_DONE_REASON", AttrKind::U8),
    rule(Nl802154Attr::Coordinator as u16, "COORDINATOR", AttrKind::Nested),
]);

/// What a notification reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `NEW_WPAN_PHY` after a rename.
    PhyRenamed { name: String },
    PhyDeleted,
    ScanStarted,
    ScanDone { aborted: bool },
    ScanAborted,
    /// A beacon; `None` when the coordinator nest is absent or unusable.
    Beacon(Option<Coordinator>),
    Unknown,
}

/// One decoded nl802154 notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nl802154Event {
    pub cmd: u8,
    pub ifindex: Option<u32>,
    pub wpan_phy: Option<u32>,
    pub wpan_dev: Option<u64>,
    pub kind: EventKind,
}

impl Nl802154Event {
    pub fn parse(msg: &GenlMessage) -> Result<Self> {
        let data = &msg.attrs[..];
        EVENT_POLICY.validate(data)?;

        let mut ifindex = None;
        let mut wpan_phy = None;
        let mut wpan_dev = None;
        let mut phy_name = None;
        let mut done_reason = None;

        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == Nl802154Attr::Ifindex as u16 => ifindex = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::WpanPhy as u16 => wpan_phy = Some(get::u32_ne(payload)?),
                t if t == Nl802154Attr::WpanDev as u16 => wpan_dev = Some(get::u64_ne(payload)?),
                t if t == Nl802154Attr::WpanPhyName as u16 => {
                    phy_name = Some(get::string(payload)?.to_string())
                }
                t if t == Nl802154Attr::ScanDoneReason as u16 => {
                    done_reason = Some(get::u8(payload)?)
                }
                _ => {}
            }
        }

        let kind = match msg.cmd {
            c if c == Nl802154Cmd::NewWpanPhy as u8 => EventKind::PhyRenamed {
                name: phy_name.unwrap_or_default(),
            },
            c if c == Nl802154Cmd::DelWpanPhy as u8 => EventKind::PhyDeleted,
            c if c == Nl802154Cmd::TriggerScan as u8 => EventKind::ScanStarted,
            c if c == Nl802154Cmd::ScanDone as u8 => EventKind::ScanDone {
                aborted: done_reason == Some(ScanDoneReason::Aborted as u8),
            },
            c if c == Nl802154Cmd::AbortScan as u8 => EventKind::ScanAborted,
            c if c == Nl802154Cmd::ScanEvent as u8 => match Coordinator::from_message(data) {
                Ok(coord) => EventKind::Beacon(coord),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed coordinator");
                    EventKind::Beacon(None)
                }
            },
            _ => EventKind::Unknown,
        };

        Ok(Self {
            cmd: msg.cmd,
            ifindex,
            wpan_phy,
            wpan_dev,
            kind,
        })
    }

    /// Like [`parse`](Self::parse), but a notification that does not decode
    /// is logged and dropped.
    pub fn decode(msg: &GenlMessage) -> Option<Self> {
        match Self::parse(msg) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(cmd = msg.cmd, error = %e, "dropping malformed notification");
                None
            }
        }
    }

    /// True if this notification ends a scan on `ifindex`.
    pub fn ends_scan_on(&self, ifindex: u32) -> bool {
        matches!(self.kind, EventKind::ScanDone { .. } | EventKind::ScanAborted)
            && self.ifindex == Some(ifindex)
    }
}
