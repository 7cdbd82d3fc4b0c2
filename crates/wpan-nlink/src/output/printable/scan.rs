//! Printable implementations for scan results and association peers.

use std::io::Write;

use super::opt_json;
use crate::netlink::genl::nl802154::{Coordinator, EdScanResult, Peer};
use crate::output::{OutputOptions, Printable};

/// A discovered coordinator together with the interface that heard it.
pub struct CoordinatorOnDev<'a> {
    pub coord: &'a Coordinator,
    pub dev: Option<&'a str>,
}

impl Printable for CoordinatorOnDev<'_> {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        let c = self.coord;
        write!(w, "PAN 0x{:04x}", c.pan_id)?;
        if let Some(dev) = self.dev {
            write!(w, " (on {})", dev)?;
        }
        writeln!(w)?;

        writeln!(w, "\tcoordinator {}", c.addr)?;
        if let Some(page) = c.page {
            writeln!(w, "\tpage {}", page)?;
        }
        if let Some(channel) = c.channel {
            writeln!(w, "\tchannel {}", channel)?;
        }
        if let Some(spec) = c.superframe_spec {
            writeln!(w, "\tsuperframe spec. 0x{:x}", spec)?;
        }
        if let Some(lqi) = c.link_quality {
            writeln!(w, "\tLQI {:x}", lqi)?;
        }
        if c.gts_permit {
            writeln!(w, "\tGTS permitted")?;
        }
        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        let c = self.coord;
        let mut obj = serde_json::json!({
            "pan_id": c.pan_id,
            "coordinator": c.addr.to_string(),
            "gts_permitted": c.gts_permit,
        });
        opt_json(&mut obj, "dev", self.dev);
        opt_json(&mut obj, "page", c.page);
        opt_json(&mut obj, "channel", c.channel);
        opt_json(&mut obj, "preamble_code", c.preamble_code);
        opt_json(&mut obj, "mean_prf", c.mean_prf);
        opt_json(&mut obj, "superframe_spec", c.superframe_spec);
        opt_json(&mut obj, "lqi", c.link_quality);
        obj
    }
}

/// An energy detection result and the channel mask it answers.
pub struct EdScanReport<'a> {
    pub result: &'a EdScanResult,
    pub requested: u32,
}

impl Printable for EdScanReport<'_> {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        let r = self.result;
        let list: Vec<String> = r
            .energy_by_channel(self.requested)
            .iter()
            .map(|(ch, ed)| format!("{}:{}", ch, ed))
            .collect();

        writeln!(
            w,
            "status: {}, scan_type: {}, channel_page: {}, unscanned_channels: {:08x}, \
             result_list_size: {}, energy_detect_list: {{ {} }}, detected_category: {}",
            r.status,
            r.scan_type,
            r.page,
            r.unscanned_channels,
            r.result_list_size,
            list.join(", "),
            r.detected_category
        )
    }

    fn to_json(&self) -> serde_json::Value {
        let r = self.result;
        let energy: Vec<_> = r
            .energy_by_channel(self.requested)
            .into_iter()
            .map(|(ch, ed)| serde_json::json!({ "channel": ch, "energy": ed }))
            .collect();
        serde_json::json!({
            "status": r.status,
            "scan_type": r.scan_type,
            "channel_page": r.page,
            "unscanned_channels": r.unscanned_channels,
            "result_list_size": r.result_list_size,
            "energy_detect_list": energy,
            "detected_category": r.detected_category,
        })
    }
}

impl Printable for Peer {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        write!(w, "{}:", self.role())?;
        let mut sep = " ";
        if let Some(short) = self.short_addr {
            write!(w, "{}short_addr 0x{:04x}", sep, short)?;
            sep = ", ";
        }
        if let Some(ext) = self.extended_addr {
            write!(w, "{}extended_addr {}", sep, ext)?;
        }
        writeln!(w)
    }

    fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({ "role": self.role() });
        opt_json(&mut obj, "short_addr", self.short_addr);
        opt_json(&mut obj, "extended_addr", self.extended_addr.map(|a| a.to_string()));
        obj
    }
}
