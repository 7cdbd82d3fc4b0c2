//! PHY listing.

use wpan_nlink::netlink::genl::nl802154::Nl802154Cmd;

use super::no_args;
use crate::error::Result;
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request};

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("info", handle_info)
            .nl(Nl802154Cmd::GetWpanPhy)
            .ids(&[IdBy::Phy])
            .help("Show capabilities for the specified wireless device."),
    );
    r.register(
        Command::new("list", handle_info)
            .nl(Nl802154Cmd::GetWpanPhy)
            .dump()
            .help("List all wireless devices and their capabilities."),
    );
    r.register(
        Command::new("phy", handle_info)
            .nl(Nl802154Cmd::GetWpanPhy)
            .dump()
            .hidden(),
    );
}

fn handle_info(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Phys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{encode, is_usage};

    #[test]
    fn test_info() {
        let (action, attrs) = encode(handle_info, &[]).unwrap();
        assert_eq!(action, Action::Send(Reply::Phys));
        assert!(attrs.is_empty());
        assert!(is_usage(encode(handle_info, &["wpan-phy0"])));
    }
}
