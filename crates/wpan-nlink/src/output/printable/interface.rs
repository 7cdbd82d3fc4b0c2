//! Printable implementation for WpanInterface.

use std::io::Write;

use super::opt_json;
use crate::netlink::genl::nl802154::{WpanInterface, iftype_name};
use crate::output::{OutputOptions, Printable};

/// Print an interface block with every line prefixed by `indent`.
pub fn print_interface_text<W: Write>(
    w: &mut W,
    iface: &WpanInterface,
    indent: &str,
) -> std::io::Result<()> {
    match iface.ifname {
        Some(ref name) => writeln!(w, "{}Interface {}", indent, name)?,
        None => writeln!(w, "{}Unnamed/non-netdev interface", indent)?,
    }

    if let Some(ifindex) = iface.ifindex {
        writeln!(w, "{}\tifindex {}", indent, ifindex)?;
    }
    if let Some(wpan_dev) = iface.wpan_dev {
        writeln!(w, "{}\twpan_dev 0x{:x}", indent, wpan_dev)?;
    }
    if let Some(ext) = iface.extended_addr {
        writeln!(w, "{}\textended_addr {}", indent, ext)?;
    }
    if let Some(short) = iface.short_addr {
        writeln!(w, "{}\tshort_addr 0x{:04x}", indent, short)?;
    }
    if let Some(pan_id) = iface.pan_id {
        writeln!(w, "{}\tpan_id 0x{:04x}", indent, pan_id)?;
    }
    if let Some(iftype) = iface.iftype {
        writeln!(w, "{}\ttype {}", indent, iftype_name(iftype))?;
    }
    if let Some(retries) = iface.max_frame_retries {
        writeln!(w, "{}\tmax_frame_retries {}", indent, retries)?;
    }
    if let Some(min_be) = iface.min_be {
        writeln!(w, "{}\tmin_be {}", indent, min_be)?;
    }
    if let Some(max_be) = iface.max_be {
        writeln!(w, "{}\tmax_be {}", indent, max_be)?;
    }
    if let Some(backoffs) = iface.max_csma_backoffs {
        writeln!(w, "{}\tmax_csma_backoffs {}", indent, backoffs)?;
    }
    if let Some(lbt) = iface.lbt {
        writeln!(w, "{}\tlbt {}", indent, lbt)?;
    }
    if let Some(ackreq) = iface.ackreq_default {
        writeln!(w, "{}\tackreq_default {}", indent, ackreq)?;
    }

    let sec = &iface.security;
    if let Some(enabled) = sec.enabled {
        writeln!(w, "{}\tsecurity {}", indent, enabled as u8)?;
    }
    if let Some(level) = sec.out_level {
        writeln!(w, "{}\tout_level {}", indent, level)?;
    }
    if let Some(ref key_id) = sec.out_key_id {
        writeln!(w, "{}\tout_key_id {}", indent, key_id)?;
    }
    if let Some(counter) = sec.frame_counter {
        writeln!(w, "{}\tframe_counter 0x{:08x}", indent, counter)?;
    }

    Ok(())
}

impl Printable for WpanInterface {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        print_interface_text(w, self, "")
    }

    fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({});
        opt_json(&mut obj, "ifname", self.ifname.as_deref());
        opt_json(&mut obj, "ifindex", self.ifindex);
        opt_json(&mut obj, "wpan_phy", self.wpan_phy);
        opt_json(&mut obj, "wpan_dev", self.wpan_dev);
        opt_json(&mut obj, "extended_addr", self.extended_addr.map(|a| a.to_string()));
        opt_json(&mut obj, "short_addr", self.short_addr);
        opt_json(&mut obj, "pan_id", self.pan_id);
        opt_json(&mut obj, "type", self.iftype.map(iftype_name));
        opt_json(&mut obj, "max_frame_retries", self.max_frame_retries);
        opt_json(&mut obj, "min_be", self.min_be);
        opt_json(&mut obj, "max_be", self.max_be);
        opt_json(&mut obj, "max_csma_backoffs", self.max_csma_backoffs);
        opt_json(&mut obj, "lbt", self.lbt);
        opt_json(&mut obj, "ackreq_default", self.ackreq_default);

        let sec = &self.security;
        if !sec.is_empty() {
            let mut s = serde_json::json!({});
            opt_json(&mut s, "enabled", sec.enabled);
            opt_json(&mut s, "out_level", sec.out_level);
            opt_json(&mut s, "out_key_id", sec.out_key_id.map(|k| k.to_string()));
            opt_json(&mut s, "frame_counter", sec.frame_counter);
            obj["security"] = s;
        }
        obj
    }
}
