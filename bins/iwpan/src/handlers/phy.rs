//! PHY settings: channel, transmit power, CCA, namespace and ED scans.

use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::PathBuf;

use wpan_nlink::netlink::genl::nl802154::{CcaMode, Nl802154Attr, Nl802154Cmd, ScanRequest, ScanType};
use wpan_nlink::util::{dbm_to_mbm, get_dbm, get_u8, get_u8_dec, get_u32, get_u32_dec};

use super::arg;
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request};

const NETNS_RUN_DIR: &str = "/var/run/netns";

/// Channels 11-26, the 2.4 GHz band of page 0.
const PAGE0_DEFAULT_CHANNELS: u32 = 0x07ff_f800;
const ED_SCAN_DEFAULT_DURATION: u8 = 3;

pub fn register(r: &mut Registry) {
    const PHY: &[IdBy] = &[IdBy::Phy];

    r.register(
        Command::new("channel", handle_channel_set)
            .section("set")
            .args("<page> <channel>")
            .nl(Nl802154Cmd::SetChannel)
            .ids(PHY),
    );
    r.register(
        Command::new("tx_power", handle_tx_power_set)
            .section("set")
            .args("<dBm>")
            .nl(Nl802154Cmd::SetTxPower)
            .ids(PHY),
    );
    r.register(
        Command::new("cca_mode", handle_cca_mode_set)
            .section("set")
            .args("<mode|3 <1|0>>")
            .nl(Nl802154Cmd::SetCcaMode)
            .ids(PHY),
    );
    r.register(
        Command::new("cca_ed_level", handle_cca_ed_level_set)
            .section("set")
            .args("<level>")
            .nl(Nl802154Cmd::SetCcaEdLevel)
            .ids(PHY),
    );
    r.register(
        Command::new("netns", handle_netns_set)
            .section("set")
            .args("{ <pid> | name <nsname> }")
            .nl(Nl802154Cmd::SetWpanPhyNetns)
            .ids(PHY)
            .help(
                "Put this wpan device into a different network namespace:\n\
                 <pid>    - change network namespace by process id\n\
                 <nsname> - change network namespace by name from /var/run/netns\n\
                 \x20          or by absolute path (man ip-netns)",
            ),
    );
    r.register(
        Command::new("ed_scan", handle_ed_scan)
            .section("get")
            .args("[<page> [<channels> [<duration>]]]")
            .nl(Nl802154Cmd::EdScanReq)
            .ids(PHY)
            .help("Energy detection scan (experimental kernel extension)."),
    );
}

fn handle_channel_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [page, channel] = args else {
        return Err(CommandError::Usage);
    };
    let page = arg(page, "page", get_u8_dec)?;
    let channel = arg(channel, "channel", get_u8_dec)?;

    req.append_attr_u8(Nl802154Attr::Page as u16, page);
    req.append_attr_u8(Nl802154Attr::Channel as u16, channel);
    Ok(Action::Send(Reply::Ack))
}

fn handle_tx_power_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [dbm] = args else {
        return Err(CommandError::Usage);
    };
    let dbm = get_dbm(dbm)?;
    req.append_attr_i32(Nl802154Attr::TxPower as u16, dbm_to_mbm(dbm));
    Ok(Action::Send(Reply::Ack))
}

fn handle_cca_mode_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let (mode, opt) = match args {
        [mode] => (mode, None),
        [mode, opt] => (mode, Some(opt)),
        _ => return Err(CommandError::Usage),
    };
    let mode = arg(mode, "cca mode", get_u32_dec)?;

    // Only the combined mode takes a logical operator.
    match opt {
        Some(opt) if mode == CcaMode::EnergyCarrier as u32 => {
            let opt = arg(opt, "cca option", get_u32_dec)?;
            req.append_attr_u32(Nl802154Attr::CcaOpt as u16, opt);
        }
        None if mode != CcaMode::EnergyCarrier as u32 => {}
        _ => return Err(CommandError::Usage),
    }

    req.append_attr_u32(Nl802154Attr::CcaMode as u16, mode);
    Ok(Action::Send(Reply::Ack))
}

fn handle_cca_ed_level_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [level] = args else {
        return Err(CommandError::Usage);
    };
    let level = get_dbm(level)?;
    req.append_attr_i32(Nl802154Attr::CcaEdLevel as u16, dbm_to_mbm(level));
    Ok(Action::Send(Reply::Ack))
}

fn handle_netns_set(req: &mut Request, args: &[String]) -> Result<Action> {
    match args {
        [pid] => {
            let pid = arg(pid, "pid", get_u32)?;
            req.append_attr_u32(Nl802154Attr::Pid as u16, pid);
        }
        [keyword, name] if keyword == "name" => {
            let file = open_netns(name)?;
            req.append_attr_u32(Nl802154Attr::NetnsFd as u16, file.as_raw_fd() as u32);
            req.hold(file);
        }
        _ => return Err(CommandError::Usage),
    }
    Ok(Action::Send(Reply::Ack))
}

/// Open a namespace by name under `/var/run/netns`, or by path.
fn open_netns(name: &str) -> Result<File> {
    let path = if name.contains('/') {
        PathBuf::from(name)
    } else {
        PathBuf::from(NETNS_RUN_DIR).join(name)
    };
    File::open(&path).map_err(|e| {
        CommandError::InvalidArgument(format!("netns {}: {}", path.display(), e))
    })
}

fn handle_ed_scan(req: &mut Request, args: &[String]) -> Result<Action> {
    if args.len() > 3 {
        return Err(CommandError::Usage);
    }

    let page = match args.first() {
        Some(page) => arg(page, "page", get_u8)?,
        None => 0,
    };
    let channels = match args.get(1) {
        Some(channels) => arg(channels, "channels", get_u32)?,
        None if page == 0 => PAGE0_DEFAULT_CHANNELS,
        None => 0,
    };
    let duration = match args.get(2) {
        Some(duration) => arg(duration, "duration", get_u8)?,
        None => ED_SCAN_DEFAULT_DURATION,
    };

    let scan = ScanRequest {
        scan_type: ScanType::Ed,
        page: Some(page),
        channels: Some(channels),
        duration: Some(duration),
    };
    scan.encode_ed(req);
    Ok(Action::Send(Reply::EdScan { channels }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{encode, find, is_usage};
    use wpan_nlink::netlink::attr::get;

    #[test]
    fn test_channel() {
        let (action, attrs) = encode(handle_channel_set, &["0", "11"]).unwrap();
        assert_eq!(action, Action::Send(Reply::Ack));
        assert_eq!(
            attrs,
            vec![
                (Nl802154Attr::Page as u16, vec![0]),
                (Nl802154Attr::Channel as u16, vec![11]),
            ]
        );
    }

    #[test]
    fn test_channel_leading_zero_is_decimal() {
        let (_, attrs) = encode(handle_channel_set, &["00", "011"]).unwrap();
        assert_eq!(find(&attrs, Nl802154Attr::Page as u16), Some(&[0u8][..]));
        assert_eq!(find(&attrs, Nl802154Attr::Channel as u16), Some(&[11u8][..]));

        let (_, attrs) = encode(handle_channel_set, &["0", "08"]).unwrap();
        assert_eq!(find(&attrs, Nl802154Attr::Channel as u16), Some(&[8u8][..]));

        assert!(is_usage(encode(handle_channel_set, &["0", "0xb"])));
    }

    #[test]
    fn test_channel_errors() {
        assert!(is_usage(encode(handle_channel_set, &["0"])));
        assert!(is_usage(encode(handle_channel_set, &["0", "11", "1"])));
        assert!(is_usage(encode(handle_channel_set, &["0", "eleven"])));
        assert!(matches!(
            encode(handle_channel_set, &["0", "256"]),
            Err(CommandError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_tx_power_truncates() {
        let (_, attrs) = encode(handle_tx_power_set, &["12.5"]).unwrap();
        let mbm = get::i32_ne(find(&attrs, Nl802154Attr::TxPower as u16).unwrap()).unwrap();
        assert_eq!(mbm, 1250);

        let (_, attrs) = encode(handle_tx_power_set, &["12.549"]).unwrap();
        let mbm = get::i32_ne(find(&attrs, Nl802154Attr::TxPower as u16).unwrap()).unwrap();
        assert_eq!(mbm, 1254);

        let (_, attrs) = encode(handle_cca_ed_level_set, &["-75"]).unwrap();
        let mbm = get::i32_ne(find(&attrs, Nl802154Attr::CcaEdLevel as u16).unwrap()).unwrap();
        assert_eq!(mbm, -7500);
    }

    #[test]
    fn test_power_rejects_non_finite() {
        assert!(is_usage(encode(handle_tx_power_set, &["inf"])));
        assert!(is_usage(encode(handle_cca_ed_level_set, &["nan"])));
    }

    #[test]
    fn test_cca_mode_option() {
        let (_, attrs) = encode(handle_cca_mode_set, &["1"]).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].0, Nl802154Attr::CcaMode as u16);

        let (_, attrs) = encode(handle_cca_mode_set, &["3", "1"]).unwrap();
        assert_eq!(attrs[0].0, Nl802154Attr::CcaOpt as u16);
        assert_eq!(get::u32_ne(&attrs[0].1).unwrap(), 1);
        assert_eq!(get::u32_ne(&attrs[1].1).unwrap(), 3);

        assert!(is_usage(encode(handle_cca_mode_set, &["3"])));
        assert!(is_usage(encode(handle_cca_mode_set, &["1", "0"])));

        let (_, attrs) = encode(handle_cca_mode_set, &["03", "01"]).unwrap();
        assert_eq!(get::u32_ne(&attrs[1].1).unwrap(), 3);
    }

    #[test]
    fn test_netns_by_pid() {
        let (_, attrs) = encode(handle_netns_set, &["1"]).unwrap();
        assert_eq!(get::u32_ne(find(&attrs, Nl802154Attr::Pid as u16).unwrap()).unwrap(), 1);
        assert!(matches!(
            encode(handle_netns_set, &["name", "/nonexistent/netns"]),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(is_usage(encode(handle_netns_set, &[])));
    }

    #[test]
    fn test_ed_scan_defaults() {
        let (action, attrs) = encode(handle_ed_scan, &[]).unwrap();
        assert_eq!(action, Action::Send(Reply::EdScan { channels: PAGE0_DEFAULT_CHANNELS }));
        assert_eq!(find(&attrs, Nl802154Attr::ScanType as u16), Some(&[0u8][..]));
        assert_eq!(find(&attrs, Nl802154Attr::Page as u16), Some(&[0u8][..]));
        assert_eq!(find(&attrs, Nl802154Attr::ScanDuration as u16), Some(&[3u8][..]));

        let (action, _) = encode(handle_ed_scan, &["2"]).unwrap();
        assert_eq!(action, Action::Send(Reply::EdScan { channels: 0 }));

        let (action, attrs) = encode(handle_ed_scan, &["0", "0x800", "5"]).unwrap();
        assert_eq!(action, Action::Send(Reply::EdScan { channels: 0x800 }));
        assert_eq!(find(&attrs, Nl802154Attr::ScanDuration as u16), Some(&[5u8][..]));

        assert!(is_usage(encode(handle_ed_scan, &["0", "1", "2", "3"])));
    }
}
