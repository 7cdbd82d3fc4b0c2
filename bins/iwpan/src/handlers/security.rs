//! Link-layer security: outgoing parameters and the four security tables.
//!
//! Every table has `dump`, `add` and `del`. The text form of a dump entry is
//! the `add` command line that recreates it.

use wpan_nlink::netlink::genl::nl802154::{
    DevAddr, DevAddrMode, ExtendedAddr, FrameType, KEY_USAGE_FRAME_CMD, KeyBytes, KeyId,
    KeyIdMode, Nl802154Cmd, SecDevKey, SecDevice, SecKey, SecLevel, SecParams,
};
use wpan_nlink::util::{get_bool, get_u8, get_u16, get_u32};

use super::{arg, no_args};
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request, Table};

const NETDEV: &[IdBy] = &[IdBy::NetDev];

const KEY_ID_ARGS: &str = "<0 <pan_id> <2 <short_addr>|3 <extended_addr>>>|\
                           <1 <index>>|\
                           <2 <index> <source_short>>|\
                           <3 <index> <source_extended>>";

const SECLEVEL_ARGS: &str = "<levels> <frame_type|3 <cmd_id>> <dev_override>";

/// Index of the command identifier word a key add may set.
const USAGE_CMDS_WORD: usize = 7;

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("security", handle_security_set)
            .section("set")
            .args("<1|0>")
            .nl(Nl802154Cmd::SetSecParams)
            .ids(NETDEV),
    );
    r.register(
        Command::new("out_level", handle_out_level_set)
            .section("set")
            .args("<out_level>")
            .nl(Nl802154Cmd::SetSecParams)
            .ids(NETDEV),
    );
    r.register(
        Command::new("out_key_id", handle_out_key_id_set)
            .section("set")
            .args(KEY_ID_ARGS)
            .nl(Nl802154Cmd::SetSecParams)
            .ids(NETDEV),
    );
    r.register(
        Command::new("frame_counter", handle_frame_counter_set)
            .section("set")
            .args("<frame_counter>")
            .nl(Nl802154Cmd::SetSecParams)
            .ids(NETDEV),
    );

    r.register(
        Command::new("dump", handle_seclevel_dump)
            .section("seclevel")
            .nl(Nl802154Cmd::GetSecLevel)
            .dump()
            .ids(NETDEV),
    );
    r.register(
        Command::new("add", handle_seclevel)
            .section("seclevel")
            .args(SECLEVEL_ARGS)
            .nl(Nl802154Cmd::NewSecLevel)
            .ids(NETDEV),
    );
    r.register(
        Command::new("del", handle_seclevel)
            .section("seclevel")
            .args(SECLEVEL_ARGS)
            .nl(Nl802154Cmd::DelSecLevel)
            .ids(NETDEV),
    );

    r.register(
        Command::new("dump", handle_device_dump)
            .section("device")
            .nl(Nl802154Cmd::GetSecDev)
            .dump()
            .ids(NETDEV),
    );
    r.register(
        Command::new("add", handle_device_add)
            .section("device")
            .args("<frame_counter> <pan_id> <short_addr> <extended_addr> <seclevel_exempt> <key_mode>")
            .nl(Nl802154Cmd::NewSecDev)
            .ids(NETDEV),
    );
    r.register(
        Command::new("del", handle_device_del)
            .section("device")
            .args("<extended_addr>")
            .nl(Nl802154Cmd::DelSecDev)
            .ids(NETDEV),
    );

    r.register(
        Command::new("dump", handle_devkey_dump)
            .section("devkey")
            .nl(Nl802154Cmd::GetSecDevkey)
            .dump()
            .ids(NETDEV),
    );
    r.register(
        Command::new("add", handle_devkey_add)
            .section("devkey")
            .args(
                "<frame_counter> <extended_addr> <0 <pan_id> <2 <short_addr>|3 <extended_addr>>>|\
                 <1 <index>>|<2 <index> <source_short>>|<3 <index> <source_extended>>",
            )
            .nl(Nl802154Cmd::NewSecDevkey)
            .ids(NETDEV),
    );
    r.register(
        Command::new("del", handle_devkey_del)
            .section("devkey")
            .args(
                "<extended_addr> <0 <pan_id> <2 <short_addr>|3 <extended_addr>>>|\
                 <1 <index>>|<2 <index> <source_short>>|<3 <index> <source_extended>>",
            )
            .nl(Nl802154Cmd::DelSecDevkey)
            .ids(NETDEV),
    );

    r.register(
        Command::new("dump", handle_key_dump)
            .section("key")
            .nl(Nl802154Cmd::GetSecKey)
            .dump()
            .ids(NETDEV),
    );
    r.register(
        Command::new("add", handle_key_add)
            .section("key")
            .args(
                "<frame_types <if 0x8 is set commands[7]>> <key <hex as 00:11:..>> \
                 <0 <pan_id> <2 <short_addr>|3 <extended_addr>>>|\
                 <1 <index>>|<2 <index> <source_short>>|<3 <index> <source_extended>>",
            )
            .nl(Nl802154Cmd::NewSecKey)
            .ids(NETDEV),
    );
    r.register(
        Command::new("del", handle_key_del)
            .section("key")
            .args(KEY_ID_ARGS)
            .nl(Nl802154Cmd::DelSecKey)
            .ids(NETDEV),
    );
}

/// Parse a key identifier from the front of `args`.
///
/// Returns the identifier and whatever follows it.
fn parse_key_id(args: &[String]) -> Result<(KeyId, &[String])> {
    let [mode, rest @ ..] = args else {
        return Err(CommandError::Usage);
    };
    let mode = arg(mode, "key id mode", get_u32)?;

    match (mode, rest) {
        (m, [pan_id, addr_mode, addr, rest @ ..]) if m == KeyIdMode::Implicit as u32 => {
            let pan_id = arg(pan_id, "pan_id", get_u16)?;
            let addr = match arg(addr_mode, "address mode", get_u32)? {
                m if m == DevAddrMode::Short as u32 => {
                    DevAddr::Short(arg(addr, "short_addr", get_u16)?)
                }
                m if m == DevAddrMode::Extended as u32 => DevAddr::Extended(addr.parse()?),
                _ => return Err(CommandError::Usage),
            };
            Ok((KeyId::Implicit { pan_id, addr }, rest))
        }
        (m, [index, rest @ ..]) if m == KeyIdMode::Index as u32 => {
            Ok((KeyId::Index(arg(index, "index", get_u8)?), rest))
        }
        (m, [index, source, rest @ ..]) if m == KeyIdMode::IndexShort as u32 => {
            let index = arg(index, "index", get_u8)?;
            let source = arg(source, "source_short", get_u32)?;
            Ok((KeyId::IndexShort { index, source }, rest))
        }
        (m, [index, source, rest @ ..]) if m == KeyIdMode::IndexExtended as u32 => {
            let index = arg(index, "index", get_u8)?;
            let source: ExtendedAddr = source.parse()?;
            Ok((KeyId::IndexExtended { index, source }, rest))
        }
        _ => Err(CommandError::Usage),
    }
}

/// A key identifier that must use up every argument.
fn parse_key_id_only(args: &[String]) -> Result<KeyId> {
    let (key_id, rest) = parse_key_id(args)?;
    no_args(rest)?;
    Ok(key_id)
}

fn handle_security_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [enabled] = args else {
        return Err(CommandError::Usage);
    };
    let params = SecParams {
        enabled: Some(arg(enabled, "security", get_bool)?),
        ..Default::default()
    };
    params.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_out_level_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [level] = args else {
        return Err(CommandError::Usage);
    };
    let params = SecParams {
        out_level: Some(arg(level, "out_level", get_u32)?),
        ..Default::default()
    };
    params.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_out_key_id_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let params = SecParams {
        out_key_id: Some(parse_key_id_only(args)?),
        ..Default::default()
    };
    params.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_frame_counter_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [counter] = args else {
        return Err(CommandError::Usage);
    };
    let params = SecParams {
        frame_counter: Some(arg(counter, "frame_counter", get_u32)?),
        ..Default::default()
    };
    params.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_seclevel_dump(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Security(Table::Level)))
}

/// `add` and `del` take the same arguments.
fn handle_seclevel(req: &mut Request, args: &[String]) -> Result<Action> {
    let [levels, frame, rest @ ..] = args else {
        return Err(CommandError::Usage);
    };
    let levels = arg(levels, "levels", get_u8)?;
    let frame = arg(frame, "frame_type", get_u32)?;

    let (cmd_frame, rest) = match rest {
        [cmd, rest @ ..] if frame == FrameType::Cmd as u32 => {
            (Some(arg(cmd, "cmd_id", get_u32)?), rest)
        }
        rest => (None, rest),
    };
    let [dev_override] = rest else {
        return Err(CommandError::Usage);
    };

    let level = SecLevel {
        levels: Some(levels),
        frame: Some(frame),
        cmd_frame,
        dev_override: Some(arg(dev_override, "dev_override", get_u8)?),
    };
    level.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_device_dump(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Security(Table::Device)))
}

fn handle_device_add(req: &mut Request, args: &[String]) -> Result<Action> {
    let [frame_counter, pan_id, short_addr, extended_addr, exempt, key_mode] = args else {
        return Err(CommandError::Usage);
    };
    let device = SecDevice {
        frame_counter: Some(arg(frame_counter, "frame_counter", get_u32)?),
        pan_id: Some(arg(pan_id, "pan_id", get_u16)?),
        short_addr: Some(arg(short_addr, "short_addr", get_u16)?),
        extended_addr: Some(extended_addr.parse()?),
        seclevel_exempt: Some(arg(exempt, "seclevel_exempt", get_u8)?),
        key_mode: Some(arg(key_mode, "key_mode", get_u32)?),
    };
    device.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_device_del(req: &mut Request, args: &[String]) -> Result<Action> {
    let [extended_addr] = args else {
        return Err(CommandError::Usage);
    };
    let device = SecDevice {
        extended_addr: Some(extended_addr.parse()?),
        ..Default::default()
    };
    device.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_devkey_dump(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Security(Table::DevKey)))
}

fn handle_devkey_add(req: &mut Request, args: &[String]) -> Result<Action> {
    let [frame_counter, extended_addr, rest @ ..] = args else {
        return Err(CommandError::Usage);
    };
    let devkey = SecDevKey {
        frame_counter: Some(arg(frame_counter, "frame_counter", get_u32)?),
        extended_addr: Some(extended_addr.parse()?),
        key_id: Some(parse_key_id_only(rest)?),
    };
    devkey.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_devkey_del(req: &mut Request, args: &[String]) -> Result<Action> {
    let [extended_addr, rest @ ..] = args else {
        return Err(CommandError::Usage);
    };
    let devkey = SecDevKey {
        frame_counter: None,
        extended_addr: Some(extended_addr.parse()?),
        key_id: Some(parse_key_id_only(rest)?),
    };
    devkey.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_key_dump(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Security(Table::Key)))
}

fn handle_key_add(req: &mut Request, args: &[String]) -> Result<Action> {
    let [frames, rest @ ..] = args else {
        return Err(CommandError::Usage);
    };
    let frames = arg(frames, "frame_types", get_u8)?;

    let (usage_cmds, rest) = match rest {
        [cmds, rest @ ..] if frames & KEY_USAGE_FRAME_CMD != 0 => {
            let mut words = [0u32; 8];
            words[USAGE_CMDS_WORD] = arg(cmds, "commands", get_u32)?;
            (Some(words), rest)
        }
        rest => (None, rest),
    };
    let [key, rest @ ..] = rest else {
        return Err(CommandError::Usage);
    };
    let key: KeyBytes = key.parse()?;

    let sec_key = SecKey {
        usage_frames: Some(frames),
        usage_cmds,
        key: Some(key),
        key_id: Some(parse_key_id_only(rest)?),
    };
    sec_key.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_key_del(req: &mut Request, args: &[String]) -> Result<Action> {
    let sec_key = SecKey {
        key_id: Some(parse_key_id_only(args)?),
        ..Default::default()
    };
    sec_key.encode(req);
    Ok(Action::Send(Reply::Ack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{Attrs, encode, find, is_usage, nested};
    use wpan_nlink::netlink::attr::get;
    use wpan_nlink::netlink::genl::nl802154::{
        DevAttr, DevAddrAttr, KeyAttr, KeyIdAttr, Nl802154Attr, SecLevelAttr,
    };

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn only_nest(attrs: &Attrs, kind: Nl802154Attr) -> Attrs {
        assert_eq!(attrs.len(), 1);
        nested(find(attrs, kind as u16).unwrap())
    }

    #[test]
    fn test_key_id_modes() {
        let args = strings(&["1", "5", "tail"]);
        let (id, rest) = parse_key_id(&args).unwrap();
        assert_eq!(id, KeyId::Index(5));
        assert_eq!(rest, &args[2..]);

        let args = strings(&["2", "5", "0x01020304"]);
        assert_eq!(
            parse_key_id_only(&args).unwrap(),
            KeyId::IndexShort { index: 5, source: 0x0102_0304 }
        );

        let args = strings(&["3", "1", "00:12:4b:00:00:00:00:01"]);
        assert_eq!(
            parse_key_id_only(&args).unwrap(),
            KeyId::IndexExtended { index: 1, source: ExtendedAddr(0x0012_4b00_0000_0001) }
        );

        let args = strings(&["0", "0xabcd", "2", "0x0001"]);
        assert_eq!(
            parse_key_id_only(&args).unwrap(),
            KeyId::Implicit { pan_id: 0xabcd, addr: DevAddr::Short(1) }
        );
    }

    #[test]
    fn test_key_id_errors() {
        assert!(is_usage(parse_key_id(&[])));
        assert!(is_usage(parse_key_id(&strings(&["4", "1"]))));
        assert!(is_usage(parse_key_id(&strings(&["2", "1"]))));
        assert!(is_usage(parse_key_id(&strings(&["0", "1", "1", "1"]))));
        assert!(is_usage(parse_key_id_only(&strings(&["1", "1", "extra"]))));
        assert!(matches!(
            parse_key_id(&strings(&["1", "256"])),
            Err(CommandError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_security_params() {
        let (_, attrs) = encode(handle_security_set, &["1"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::SecEnabled as u16, vec![1])]);

        let (_, attrs) = encode(handle_frame_counter_set, &["0x01020304"]).unwrap();
        assert_eq!(
            attrs,
            vec![(Nl802154Attr::SecFrameCounter as u16, vec![1, 2, 3, 4])]
        );

        let (_, attrs) = encode(handle_out_key_id_set, &["1", "3"]).unwrap();
        let id = only_nest(&attrs, Nl802154Attr::SecOutKeyId);
        assert_eq!(
            get::u32_ne(find(&id, KeyIdAttr::Mode as u16).unwrap()).unwrap(),
            KeyIdMode::Index as u32
        );
        assert_eq!(find(&id, KeyIdAttr::Index as u16), Some(&[3u8][..]));

        assert!(is_usage(encode(handle_out_level_set, &[])));
    }

    #[test]
    fn test_implicit_key_id_encodes_one_address() {
        let (_, attrs) = encode(handle_out_key_id_set, &["0", "0xabcd", "2", "0x0102"]).unwrap();
        let id = only_nest(&attrs, Nl802154Attr::SecOutKeyId);
        let dev = nested(find(&id, KeyIdAttr::Implicit as u16).unwrap());
        assert_eq!(find(&dev, DevAddrAttr::PanId as u16), Some(&[0xcd, 0xab][..]));
        assert_eq!(find(&dev, DevAddrAttr::Short as u16), Some(&[0x02, 0x01][..]));
        assert!(find(&dev, DevAddrAttr::Extended as u16).is_none());
    }

    #[test]
    fn test_seclevel_command_frame() {
        let (_, attrs) = encode(handle_seclevel, &["0xff", "3", "10", "1"]).unwrap();
        let level = only_nest(&attrs, Nl802154Attr::SecLevel);
        assert_eq!(find(&level, SecLevelAttr::Levels as u16), Some(&[0xffu8][..]));
        assert_eq!(get::u32_ne(find(&level, SecLevelAttr::Frame as u16).unwrap()).unwrap(), 3);
        assert_eq!(get::u32_ne(find(&level, SecLevelAttr::CmdFrame as u16).unwrap()).unwrap(), 10);
        assert_eq!(find(&level, SecLevelAttr::DevOverride as u16), Some(&[1u8][..]));

        let (_, attrs) = encode(handle_seclevel, &["1", "1", "0"]).unwrap();
        let level = only_nest(&attrs, Nl802154Attr::SecLevel);
        assert!(find(&level, SecLevelAttr::CmdFrame as u16).is_none());

        assert!(is_usage(encode(handle_seclevel, &["1", "3", "0"])));
        assert!(is_usage(encode(handle_seclevel, &["1", "1", "0", "0"])));
    }

    #[test]
    fn test_device_add_and_del() {
        assert!(is_usage(encode(
            handle_device_add,
            &["0", "0xabcd", "0x0001", "0x0012_4b00", "0", "0"]
        )));
        assert!(is_usage(encode(handle_device_add, &["0", "0xabcd", "0x0001"])));

        let (_, attrs) = encode(
            handle_device_add,
            &["5", "0xabcd", "0x0001", "0x00124b0000000001", "1", "0"],
        )
        .unwrap();
        let dev = only_nest(&attrs, Nl802154Attr::SecDevice);
        assert_eq!(find(&dev, DevAttr::PanId as u16), Some(&[0xcd, 0xab][..]));
        assert_eq!(
            get::u64_le(find(&dev, DevAttr::ExtendedAddr as u16).unwrap()).unwrap(),
            0x0012_4b00_0000_0001
        );

        let (_, attrs) = encode(handle_device_del, &["0x00124b0000000001"]).unwrap();
        let dev = only_nest(&attrs, Nl802154Attr::SecDevice);
        assert_eq!(dev.len(), 1);
        assert!(is_usage(encode(handle_device_del, &[])));
    }

    #[test]
    fn test_devkey() {
        let (_, attrs) = encode(handle_devkey_add, &["7", "0x1", "1", "2"]).unwrap();
        let devkey = only_nest(&attrs, Nl802154Attr::SecDevkey);
        assert_eq!(devkey.len(), 3);

        let (_, attrs) = encode(handle_devkey_del, &["0x1", "1", "2"]).unwrap();
        let devkey = only_nest(&attrs, Nl802154Attr::SecDevkey);
        assert_eq!(devkey.len(), 2);
        assert!(is_usage(encode(handle_devkey_del, &["0x1"])));
    }

    const KEY: &str = "00:11:22:33:44:55:66:77:88:99:aa:bb:cc:dd:ee:ff";

    #[test]
    fn test_key_add_with_commands() {
        let (_, attrs) = encode(handle_key_add, &["0x08", "0x10", KEY, "1", "1"]).unwrap();
        let key = only_nest(&attrs, Nl802154Attr::SecKey);
        assert_eq!(find(&key, KeyAttr::UsageFrames as u16), Some(&[0x08u8][..]));

        let cmds = find(&key, KeyAttr::UsageCmds as u16).unwrap();
        assert_eq!(cmds.len(), 32);
        assert_eq!(get::u32_ne(&cmds[28..]).unwrap(), 0x10);
        assert!(cmds[..28].iter().all(|b| *b == 0));

        let bytes = find(&key, KeyAttr::Bytes as u16).unwrap();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[15], 0xff);
    }

    #[test]
    fn test_key_add_without_commands() {
        let (_, attrs) = encode(handle_key_add, &["0x03", KEY, "1", "1"]).unwrap();
        let key = only_nest(&attrs, Nl802154Attr::SecKey);
        assert!(find(&key, KeyAttr::UsageCmds as u16).is_none());

        assert!(is_usage(encode(handle_key_add, &["0x08"])));
        assert!(matches!(
            encode(handle_key_add, &["0x03", "00:11", "1", "1"]),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_key_del_and_dumps() {
        let (_, attrs) = encode(handle_key_del, &["1", "4"]).unwrap();
        let key = only_nest(&attrs, Nl802154Attr::SecKey);
        assert_eq!(key.len(), 1);
        assert_eq!(key[0].0, KeyAttr::Id as u16);

        let (action, attrs) = encode(handle_key_dump, &[]).unwrap();
        assert_eq!(action, Action::Send(Reply::Security(Table::Key)));
        assert!(attrs.is_empty());
        assert!(is_usage(encode(handle_seclevel_dump, &["x"])));
    }
}
