//! Association with a coordinator and the list of associated peers.

use wpan_nlink::netlink::genl::nl802154::{ExtendedAddr, Nl802154Attr, Nl802154Cmd};
use wpan_nlink::util::{get_u16, get_u32};

use super::{arg, no_args};
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request};

const NETDEV: &[IdBy] = &[IdBy::NetDev];

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("associate", handle_associate)
            .args("pan_id <pan_id> coord <ext_addr <addr>|short_addr <addr>>")
            .nl(Nl802154Cmd::Associate)
            .ids(NETDEV)
            .help("Associate with a given coordinator."),
    );
    r.register(
        Command::new("disassociate", handle_disassociate)
            .args("<ext_addr <addr>|short_addr <addr>>")
            .nl(Nl802154Cmd::Disassociate)
            .ids(NETDEV)
            .help("Disassociate from a parent or a child."),
    );
    r.register(
        Command::new("list_associations", handle_list_associations)
            .nl(Nl802154Cmd::ListAssociations)
            .dump()
            .ids(NETDEV)
            .help("List the associated parent and children."),
    );
    r.register(
        Command::new("max_associations", handle_max_associations_set)
            .section("set")
            .args("<n>")
            .nl(Nl802154Cmd::SetMaxAssociations)
            .ids(NETDEV),
    );
}

/// Append a peer address given as `ext_addr <a>` or `short_addr <a>`.
fn append_peer_addr(req: &mut Request, kind: &str, value: &str) -> Result<()> {
    match kind {
        "ext_addr" => {
            let addr: ExtendedAddr = value.parse()?;
            addr.encode(req, Nl802154Attr::ExtendedAddr as u16);
        }
        "short_addr" => {
            let addr = arg(value, "short_addr", get_u16)?;
            req.append_attr_u16_le(Nl802154Attr::ShortAddr as u16, addr);
        }
        _ => return Err(CommandError::Usage),
    }
    Ok(())
}

fn handle_associate(req: &mut Request, args: &[String]) -> Result<Action> {
    let [pan_kw, pan_id, coord_kw, kind, addr] = args else {
        return Err(CommandError::Usage);
    };
    if pan_kw != "pan_id" || coord_kw != "coord" {
        return Err(CommandError::Usage);
    }

    let pan_id = arg(pan_id, "pan_id", get_u16)?;
    req.append_attr_u16_le(Nl802154Attr::PanId as u16, pan_id);
    append_peer_addr(req, kind, addr)?;
    Ok(Action::Send(Reply::Ack))
}

fn handle_disassociate(req: &mut Request, args: &[String]) -> Result<Action> {
    let [kind, addr] = args else {
        return Err(CommandError::Usage);
    };
    append_peer_addr(req, kind, addr)?;
    Ok(Action::Send(Reply::Ack))
}

fn handle_list_associations(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Peers))
}

fn handle_max_associations_set(req: &mut Request, args: &[String]) -> Result<Action> {
    let [max] = args else {
        return Err(CommandError::Usage);
    };
    let max = arg(max, "max_associations", get_u32)?;
    req.append_attr_u32(Nl802154Attr::MaxAssociations as u16, max);
    Ok(Action::Send(Reply::Ack))
}
