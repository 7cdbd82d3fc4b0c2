//! Printable implementation for WpanPhy.

use std::io::Write;

use super::opt_json;
use crate::netlink::genl::nl802154::{
    CcaMode, PhyCaps, WpanPhy, cca_mode_description, channel_frequency, iftype_name,
    supported_bool_name,
};
use crate::output::formatting::{format_freq, format_mbm, join_comma};
use crate::output::{OutputOptions, Printable};

impl Printable for WpanPhy {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        if let Some(ref name) = self.name {
            writeln!(w, "wpan_phy {}", name)?;
        }

        let supported = self.supported_channels();
        if !supported.is_empty() {
            writeln!(w, "supported channels:")?;
            for (page, channels) in &supported {
                writeln!(w, "\tpage {}: {}", page, join_comma(channels))?;
            }
        }

        if let Some(page) = self.page {
            writeln!(w, "current_page: {}", page)?;
        }

        if let Some(channel) = self.channel {
            write!(w, "current_channel: {}", channel)?;
            if let Some(freq) = channel_frequency(self.page.unwrap_or(0), channel) {
                write!(w, ", {} MHz", format_freq(freq))?;
            }
            writeln!(w)?;
        }

        if let Some(mode) = self.cca_mode {
            let opt = self.cca_opt.filter(|_| mode == CcaMode::EnergyCarrier as u32);
            writeln!(w, "cca_mode: ({}) {}", mode, cca_mode_description(mode, opt))?;
        }

        if let Some(level) = self.cca_ed_level {
            writeln!(w, "cca_ed_level: {}", format_mbm(level))?;
        }

        if let Some(power) = self.tx_power {
            writeln!(w, "tx_power: {}", format_mbm(power))?;
        }

        if let Some(ref caps) = self.caps {
            print_caps(w, caps)?;
        }

        Ok(())
    }

    fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({});
        opt_json(&mut obj, "wpan_phy", self.index);
        opt_json(&mut obj, "name", self.name.as_deref());

        let supported = self.supported_channels();
        if !supported.is_empty() {
            obj["supported_channels"] = channels_json(&supported);
        }

        opt_json(&mut obj, "page", self.page);
        opt_json(&mut obj, "channel", self.channel);
        if let Some(freq) = self
            .channel
            .and_then(|ch| channel_frequency(self.page.unwrap_or(0), ch))
        {
            obj["frequency_mhz"] = serde_json::json!(freq as f64 / 10.0);
        }
        opt_json(&mut obj, "cca_mode", self.cca_mode);
        opt_json(&mut obj, "cca_opt", self.cca_opt);
        opt_json(&mut obj, "cca_ed_level_mbm", self.cca_ed_level);
        opt_json(&mut obj, "tx_power_mbm", self.tx_power);

        if let Some(ref caps) = self.caps {
            obj["capabilities"] = caps_json(caps);
        }
        obj
    }
}

fn print_caps<W: Write>(w: &mut W, caps: &PhyCaps) -> std::io::Result<()> {
    writeln!(w, "capabilities:")?;

    if !caps.iftypes.is_empty() {
        let names: Vec<String> = caps.iftypes.iter().map(|t| iftype_name(*t)).collect();
        writeln!(w, "\tiftypes: {}", names.join(","))?;
    }

    if !caps.channels.is_empty() {
        writeln!(w, "\tchannels:")?;
        for (page, channels) in &caps.channels {
            let entries: Vec<String> = channels
                .iter()
                .map(|ch| match channel_frequency(*page, *ch) {
                    Some(freq) => format!("[{}] {} MHz", ch, format_freq(freq)),
                    None => format!("[{}]", ch),
                })
                .collect();
            writeln!(w, "\t\tpage {}: {}", page, entries.join(", "))?;
        }
    }

    if !caps.tx_powers.is_empty() {
        writeln!(w, "\ttx_powers:")?;
        for power in &caps.tx_powers {
            writeln!(w, "\t\t{} dBm", format_mbm(*power))?;
        }
    }

    if !caps.cca_ed_levels.is_empty() {
        writeln!(w, "\tcca_ed_levels:")?;
        for level in &caps.cca_ed_levels {
            writeln!(w, "\t\t{} dBm", format_mbm(*level))?;
        }
    }

    if !caps.cca_modes.is_empty() {
        let mut entries = Vec::new();
        for mode in &caps.cca_modes {
            if *mode == CcaMode::EnergyCarrier as u32 && !caps.cca_opts.is_empty() {
                entries.extend(
                    caps.cca_opts
                        .iter()
                        .map(|opt| format!("({}, cca_opt: {})", mode, opt)),
                );
            } else {
                entries.push(format!("({})", mode));
            }
        }
        writeln!(w, "\tcca_modes: {}", entries.join(", "))?;
    }

    if let (Some(lo), Some(hi)) = (caps.min_minbe, caps.max_minbe) {
        writeln!(w, "\tmin_be: {}-{}", lo, hi)?;
    }
    if let (Some(lo), Some(hi)) = (caps.min_maxbe, caps.max_maxbe) {
        writeln!(w, "\tmax_be: {}-{}", lo, hi)?;
    }
    if let (Some(lo), Some(hi)) = (caps.min_csma_backoffs, caps.max_csma_backoffs) {
        writeln!(w, "\tcsma_backoffs: {}-{}", lo, hi)?;
    }
    if let (Some(lo), Some(hi)) = (caps.min_frame_retries, caps.max_frame_retries) {
        writeln!(w, "\tframe_retries: {}-{}", lo, hi)?;
    }
    if let Some(lbt) = caps.lbt {
        writeln!(w, "\tlbt: {}", supported_bool_name(lbt))?;
    }

    Ok(())
}

fn channels_json(pages: &[(u8, Vec<u8>)]) -> serde_json::Value {
    serde_json::Value::Array(
        pages
            .iter()
            .map(|(page, channels)| serde_json::json!({ "page": page, "channels": channels }))
            .collect(),
    )
}

fn caps_json(caps: &PhyCaps) -> serde_json::Value {
    let iftypes: Vec<String> = caps.iftypes.iter().map(|t| iftype_name(*t)).collect();
    let mut obj = serde_json::json!({
        "iftypes": iftypes,
        "channels": channels_json(&caps.channels),
        "tx_powers_mbm": caps.tx_powers,
        "cca_ed_levels_mbm": caps.cca_ed_levels,
        "cca_modes": caps.cca_modes,
        "cca_opts": caps.cca_opts,
    });
    if let (Some(lo), Some(hi)) = (caps.min_minbe, caps.max_minbe) {
        obj["min_be"] = serde_json::json!([lo, hi]);
    }
    if let (Some(lo), Some(hi)) = (caps.min_maxbe, caps.max_maxbe) {
        obj["max_be"] = serde_json::json!([lo, hi]);
    }
    if let (Some(lo), Some(hi)) = (caps.min_csma_backoffs, caps.max_csma_backoffs) {
        obj["csma_backoffs"] = serde_json::json!([lo, hi]);
    }
    if let (Some(lo), Some(hi)) = (caps.min_frame_retries, caps.max_frame_retries) {
        obj["frame_retries"] = serde_json::json!([lo, hi]);
    }
    if let Some(lbt) = caps.lbt {
        obj["lbt"] = serde_json::json!(supported_bool_name(lbt));
    }
    obj
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(phy: &WpanPhy) -> String {
        let mut out = Vec::new();
        phy.print_text(&mut out, &OutputOptions::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_phy_text() {
        let phy = WpanPhy {
            index: Some(0),
            name: Some("wpan-phy0".into()),
            channels_supported: vec![0x07ff_f800],
            page: Some(0),
            channel: Some(11),
            cca_mode: Some(1),
            cca_ed_level: Some(-7700),
            tx_power: Some(400),
            ..Default::default()
        };
        let out = text(&phy);
        assert_eq!(
            out,
            "wpan_phy wpan-phy0\n\
             supported channels:\n\
             \tpage 0: 11,12,13,14,15,16,17,18,19,20,21,22,23,24,25,26\n\
             current_page: 0\n\
             current_channel: 11,  2405 MHz\n\
             cca_mode: (1) Energy above threshold\n\
             cca_ed_level: -77\n\
             tx_power: 4\n"
        );
    }

    #[test]
    fn test_caps_text() {
        let phy = WpanPhy {
            caps: Some(PhyCaps {
                iftypes: vec![0, 1],
                channels: vec![(0, vec![0, 11])],
                tx_powers: vec![300, -150],
                cca_modes: vec![1, 3],
                cca_opts: vec![0, 1],
                min_minbe: Some(0),
                max_minbe: Some(3),
                min_frame_retries: Some(-1),
                max_frame_retries: Some(7),
                lbt: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = text(&phy);
        assert!(out.starts_with("capabilities:\n\tiftypes: node,monitor\n"));
        assert!(out.contains("\t\tpage 0: [0] 868.3 MHz, [11]  2405 MHz\n"));
        assert!(out.contains("\ttx_powers:\n\t\t3 dBm\n\t\t-1.5 dBm\n"));
        assert!(out.contains("\tcca_modes: (1), (3, cca_opt: 0), (3, cca_opt: 1)\n"));
        assert!(out.contains("\tmin_be: 0-3\n"));
        assert!(out.contains("\tframe_retries: -1-7\n"));
        assert!(out.ends_with("\tlbt: false\n"));
    }

    #[test]
    fn test_phy_json() {
        let phy = WpanPhy {
            index: Some(1),
            name: Some("wpan-phy1".into()),
            page: Some(0),
            channel: Some(26),
            ..Default::default()
        };
        let json = phy.to_json();
        assert_eq!(json["wpan_phy"], 1);
        assert_eq!(json["name"], "wpan-phy1");
        assert_eq!(json["frequency_mhz"], 2480.0);
        assert!(json.get("tx_power_mbm").is_none());
    }
}
