//! MonitorEvent implementation for nl802154 notifications.

use std::io::Write;

use super::opt_json;
use crate::netlink::genl::nl802154::{EventKind, Nl802154Event};
use crate::output::{MonitorEvent, OutputOptions};
use crate::util::ifname::index_to_name_or_fallback;

impl Nl802154Event {
    /// Origin prefix: interface, wdev and/or PHY, most specific first.
    pub fn origin(&self) -> String {
        match (self.ifindex, self.wpan_dev, self.wpan_phy) {
            (Some(ifindex), _, Some(phy)) => {
                format!("{} (phy #{}): ", index_to_name_or_fallback(ifindex), phy)
            }
            (None, Some(wdev), Some(phy)) => format!("wdev 0x{:x} (phy #{}): ", wdev, phy),
            (Some(ifindex), _, None) => format!("{}: ", index_to_name_or_fallback(ifindex)),
            (None, Some(wdev), None) => format!("wdev 0x{:x}: ", wdev),
            (None, None, Some(phy)) => format!("phy #{}: ", phy),
            (None, None, None) => String::new(),
        }
    }

    fn description(&self) -> String {
        match &self.kind {
            EventKind::PhyRenamed { name } => format!("renamed to {}", name),
            EventKind::PhyDeleted => "delete wpan_phy".to_string(),
            EventKind::ScanStarted => "scan started".to_string(),
            EventKind::ScanDone { aborted: true } | EventKind::ScanAborted => {
                "scan aborted".to_string()
            }
            EventKind::ScanDone { aborted: false } => "scan finished".to_string(),
            EventKind::Beacon(Some(coord)) => {
                format!("beacon received: PAN 0x{:04x}, addr {}", coord.pan_id, coord.addr)
            }
            EventKind::Beacon(None) => "beacon received".to_string(),
            EventKind::Unknown => format!("unknown event {}", self.cmd),
        }
    }
}

impl MonitorEvent for Nl802154Event {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        writeln!(w, "{}{}", self.origin(), self.description())
    }

    fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "cmd": self.cmd,
            "event": self.description(),
        });
        opt_json(&mut obj, "ifindex", self.ifindex);
        opt_json(&mut obj, "wpan_phy", self.wpan_phy);
        opt_json(&mut obj, "wpan_dev", self.wpan_dev);
        if let EventKind::Beacon(Some(coord)) = &self.kind {
            obj["pan_id"] = serde_json::json!(coord.pan_id);
            obj["addr"] = serde_json::json!(coord.addr.to_string());
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::genl::nl802154::{Coordinator, DevAddr, ExtendedAddr};

    fn event(ifindex: Option<u32>, wpan_dev: Option<u64>, wpan_phy: Option<u32>) -> Nl802154Event {
        Nl802154Event {
            cmd: 35,
            ifindex,
            wpan_phy,
            wpan_dev,
            kind: EventKind::ScanStarted,
        }
    }

    #[test]
    fn test_origin_precedence() {
        assert_eq!(event(None, Some(0x2), Some(1)).origin(), "wdev 0x2 (phy #1): ");
        assert_eq!(event(None, Some(0x2), None).origin(), "wdev 0x2: ");
        assert_eq!(event(None, None, Some(0)).origin(), "phy #0: ");
        assert_eq!(event(None, None, None).origin(), "");
        assert_eq!(event(Some(1), Some(0x2), Some(3)).origin(), "lo (phy #3): ");
    }

    #[test]
    fn test_event_lines() {
        let mut ev = event(None, None, Some(0));
        ev.kind = EventKind::ScanDone { aborted: false };
        let mut out = Vec::new();
        ev.print_text(&mut out, &OutputOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "phy #0: scan finished\n");

        ev.kind = EventKind::Beacon(Some(Coordinator {
            pan_id: 0x1234,
            addr: DevAddr::Extended(ExtendedAddr(0x0011_2233_4455_6677)),
            channel: None,
            page: None,
            preamble_code: None,
            mean_prf: None,
            superframe_spec: None,
            link_quality: None,
            gts_permit: false,
        }));
        assert_eq!(
            ev.description(),
            "beacon received: PAN 0x1234, addr 0x0011223344556677"
        );

        ev.kind = EventKind::Unknown;
        ev.cmd = 99;
        assert_eq!(ev.description(), "unknown event 99");
    }
}
