//! Virtual interface creation, removal and queries.

use wpan_nlink::netlink::genl::nl802154::{ExtendedAddr, IfType, Nl802154Attr, Nl802154Cmd};
use wpan_nlink::util::ifname;

use super::no_args;
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request};

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("add", handle_interface_add)
            .section("interface")
            .args("<name> type <type> [extended_addr <addr>]")
            .nl(Nl802154Cmd::NewInterface)
            .ids(&[IdBy::Phy, IdBy::NetDev])
            .help(
                "Add a new virtual interface with the given configuration.\n\
                 Valid interface types are: node, monitor, coordinator.",
            ),
    );
    r.register(
        Command::new("del", handle_interface_del)
            .nl(Nl802154Cmd::DelInterface)
            .ids(&[IdBy::NetDev, IdBy::WpanDev])
            .help("Remove this virtual interface"),
    );
    r.register(
        Command::new("del", handle_interface_del)
            .section("interface")
            .nl(Nl802154Cmd::DelInterface)
            .ids(&[IdBy::NetDev, IdBy::WpanDev])
            .hidden(),
    );
    r.register(
        Command::new("info", handle_interface_info)
            .nl(Nl802154Cmd::GetInterface)
            .ids(&[IdBy::NetDev, IdBy::WpanDev])
            .help("Show information for this interface."),
    );
    r.register(
        Command::new("dev", handle_dev_dump)
            .nl(Nl802154Cmd::GetInterface)
            .dump()
            .help("List all network interfaces for wireless hardware."),
    );
}

fn handle_interface_add(req: &mut Request, args: &[String]) -> Result<Action> {
    let [name, keyword, iftype, rest @ ..] = args else {
        return Err(CommandError::Usage);
    };
    if keyword != "type" {
        return Err(CommandError::Usage);
    }

    ifname::validate(name)
        .map_err(|e| CommandError::InvalidArgument(format!("{}: {}", name, e)))?;
    let iftype = IfType::from_name(iftype)
        .ok_or_else(|| CommandError::InvalidArgument(format!("invalid interface type {}", iftype)))?;

    req.append_attr_str(Nl802154Attr::Ifname as u16, name);
    req.append_attr_u32(Nl802154Attr::Iftype as u16, iftype as u32);

    match rest {
        [] => {}
        [keyword, addr] if keyword == "extended_addr" => {
            let addr: ExtendedAddr = addr.parse()?;
            addr.encode(req, Nl802154Attr::ExtendedAddr as u16);
        }
        _ => return Err(CommandError::Usage),
    }
    Ok(Action::Send(Reply::Ack))
}

fn handle_interface_del(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Ack))
}

fn handle_interface_info(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Interfaces { grouped: false }))
}

fn handle_dev_dump(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Interfaces { grouped: true }))
}
