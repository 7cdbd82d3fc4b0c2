//! MAC PIB settings of a virtual interface.

use wpan_nlink::netlink::genl::nl802154::{Nl802154Attr, Nl802154Cmd};
use wpan_nlink::util::{get_bool, get_i8, get_u8, get_u16};

use super::arg;
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request};

const NETDEV: &[IdBy] = &[IdBy::NetDev];

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("pan_id", handle_pan_id_set)
            .section("set")
            .args("<pan_id>")
            .nl(Nl802154Cmd::SetPanId)
            .ids(NETDEV),
    );
    r.register(
        Command::new("short_addr", handle_short_addr_set)
            .section("set")
            .args("<short_addr>")
            .nl(Nl802154Cmd::SetShortAddr)
            .ids(NETDEV),
    );
    r.register(
        Command::new("backoff_exponents", handle_backoff_exponents_set)
            .section("set")
            .args("<min_be> <max_be>")
            .nl(Nl802154Cmd::SetBackoffExponent)
            .ids(NETDEV),
    );
    r.register(
        Command::new("max_csma_backoffs", handle_max_csma_backoffs_set)
            .section("set")
            .args("<backoffs>")
            .nl(Nl802154Cmd::SetMaxCsmaBackoffs)
            .ids(NETDEV),
    );
    r.register(
        Command::new("max_frame_retries", handle_max_frame_retries_set)
            .section("set")
            .args("<retries>")
            .nl(Nl802154Cmd::SetMaxFrameRetries)
            .ids(NETDEV),
    );
    r.register(
        Command::new("lbt", handle_lbt_mode_set)
            .section("set")
            .args("<1|0>")
            .nl(Nl802154Cmd::SetLbtMode)
            .ids(NETDEV),
    );
    r.register(
        Command::new("ackreq_default", handle_ackreq_default_set)
            .section("set")
            .args("<1|0>")
            .nl(Nl802154Cmd::SetAckreqDefault)
            .ids(NETDEV),
    );
}

/// The single argument of a one-value setter.
fn single(args: &[String]) -> Result<&str> {
    match args {
        [value] => Ok(value.as_str()),
        _ => Err(CommandError::Usage),
    }
}

fn handle_pan_id_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let pan_id = arg(single(args)?, "pan_id", get_u16)?;
    req.append_attr_u16_le(Nl802154Attr::PanId as u16, pan_id);
    Ok(Action::Send(Reply::Ack))
}

fn handle_short_addr_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let short_addr = arg(single(args)?, "short_addr", get_u16)?;
    req.append_attr_u16_le(Nl802154Attr::ShortAddr as u16, short_addr);
    Ok(Action::Send(Reply::Ack))
}

fn handle_backoff_exponents_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [min_be, max_be] = args else {
        return Err(CommandError::Usage);
    };
    let min_be = arg(min_be, "min_be", get_u8)?;
    let max_be = arg(max_be, "max_be", get_u8)?;

    req.append_attr_u8(Nl802154Attr::MinBe as u16, min_be);
    req.append_attr_u8(Nl802154Attr::MaxBe as u16, max_be);
    Ok(Action::Send(Reply::Ack))
}

fn handle_max_csma_backoffs_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let backoffs = arg(single(args)?, "max_csma_backoffs", get_u8)?;
    req.append_attr_u8(Nl802154Attr::MaxCsmaBackoffs as u16, backoffs);
    Ok(Action::Send(Reply::Ack))
}

fn handle_max_frame_retries_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let retries = arg(single(args)?, "max_frame_retries", get_i8)?;
    req.append_attr_i8(Nl802154Attr::MaxFrameRetries as u16, retries);
    Ok(Action::Send(Reply::Ack))
}

fn handle_lbt_mode_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let mode = arg(single(args)?, "lbt", get_bool)?;
    req.append_attr_u8(Nl802154Attr::LbtMode as u16, mode as u8);
    Ok(Action::Send(Reply::Ack))
}

fn handle_ackreq_default_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let ackreq = arg(single(args)?, "ackreq_default", get_bool)?;
    req.append_attr_u8(Nl802154Attr::AckreqDefault as u16, ackreq as u8);
    Ok(Action::Send(Reply::Ack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{encode, is_usage};

    #[test]
    fn test_pan_id_little_endian() {
        let (_, attrs) = encode(handle_pan_id_set, &["0xbeef"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::PanId as u16, vec![0xef, 0xbe])]);

        let (_, attrs) = encode(handle_short_addr_set, &["0x0102"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::ShortAddr as u16, vec![0x02, 0x01])]);
    }

    #[test]
    fn test_pan_id_range() {
        let err = encode(handle_pan_id_set, &["0x10000"]).unwrap_err();
        assert_eq!(err.to_string(), "pan_id out of range: 0x10000");
        assert!(is_usage(encode(handle_pan_id_set, &[])));
        assert!(is_usage(encode(handle_pan_id_set, &["1", "2"])));
    }

    #[test]
    fn test_backoff_exponents() {
        let (_, attrs) = encode(handle_backoff_exponents_set, &["3", "5"]).unwrap();
        assert_eq!(
            attrs,
            vec![
                (Nl802154Attr::MinBe as u16, vec![3]),
                (Nl802154Attr::MaxBe as u16, vec![5]),
            ]
        );
        assert!(is_usage(encode(handle_backoff_exponents_set, &["3"])));
    }

    #[test]
    fn test_frame_retries_signed() {
        let (_, attrs) = encode(handle_max_frame_retries_set, &["-1"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::MaxFrameRetries as u16, vec![0xff])]);
        assert!(matches!(
            encode(handle_max_frame_retries_set, &["128"]),
            Err(CommandError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_switches() {
        let (_, attrs) = encode(handle_lbt_mode_set, &["1"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::LbtMode as u16, vec![1])]);
        let (_, attrs) = encode(handle_ackreq_default_set, &["0"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::AckreqDefault as u16, vec![0])]);
        assert!(matches!(
            encode(handle_lbt_mode_set, &["2"]),
            Err(CommandError::OutOfRange { .. })
        ));
    }
}
