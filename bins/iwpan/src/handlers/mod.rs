//! Command handlers, one module per area.
//!
//! A handler validates its arguments and appends attributes to the request
//! it is given. No handler touches the socket; the dispatcher sends the
//! request afterwards according to the returned [`Action`].

pub mod association;
pub mod event;
pub mod info;
pub mod interface;
pub mod mac;
pub mod phy;
pub mod scan;
pub mod security;

use wpan_nlink::util::ParseError;

use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, Registry, Request};

/// Register every command.
pub fn register_all(r: &mut Registry) {
    info::register(r);
    interface::register(r);
    phy::register(r);
    mac::register(r);
    association::register(r);
    scan::register(r);
    security::register(r);
    event::register(r);

    r.register(
        Command::new("help", handle_help)
            .args("[command]")
            .help("Print usage for all or a specific command."),
    );
}

fn handle_help(_req: &mut Request, args: &[String]) -> Result<Action> {
    match args {
        [] => Ok(Action::Help(None)),
        [section] => Ok(Action::Help(Some(section.clone()))),
        _ => Err(CommandError::Usage),
    }
}

/// Parse `value` with `parse`, naming the argument in range errors.
pub(crate) fn arg<T>(
    value: &str,
    what: &str,
    parse: fn(&str) -> std::result::Result<T, ParseError>,
) -> Result<T> {
    parse(value).map_err(|e| match e {
        ParseError::OutOfRange(_) => CommandError::out_of_range(what, value),
        other => other.into(),
    })
}

/// Reject any arguments.
pub(crate) fn no_args(args: &[String]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Usage)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use wpan_nlink::netlink::attr::AttrIter;
    use wpan_nlink::netlink::genl::GENL_HDRLEN;
    use wpan_nlink::netlink::genl::nl802154::Nl802154Cmd;
    use wpan_nlink::netlink::message::NLMSG_HDRLEN;

    use super::*;
    use crate::registry::Handler;

    /// Attributes of an encoded request, in order.
    pub type Attrs = Vec<(u16, Vec<u8>)>;

    pub fn encode(handler: Handler, args: &[&str]) -> Result<(Action, Attrs)> {
        let mut req = Request::new(Nl802154Cmd::Unspec, false);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let action = handler(&mut req, &args)?;
        let (msg, _held) = req.into_parts();
        let bytes = msg.try_finish()?;
        let attrs = AttrIter::new(&bytes[NLMSG_HDRLEN + GENL_HDRLEN..])
            .map(|(t, p)| (t, p.to_vec()))
            .collect();
        Ok((action, attrs))
    }

    /// Payload of the first attribute of type `kind`.
    pub fn find(attrs: &Attrs, kind: u16) -> Option<&[u8]> {
        attrs
            .iter()
            .find(|(t, _)| *t == kind)
            .map(|(_, p)| p.as_slice())
    }

    pub fn nested(payload: &[u8]) -> Attrs {
        AttrIter::new(payload).map(|(t, p)| (t, p.to_vec())).collect()
    }

    pub fn is_usage<T: std::fmt::Debug>(r: Result<T>) -> bool {
        matches!(r, Err(CommandError::Usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpan_nlink::util::get_u8;

    #[test]
    fn test_arg_names_range_errors() {
        let err = arg("300", "page", get_u8).unwrap_err();
        assert_eq!(err.to_string(), "page out of range: 300");
        assert!(matches!(arg("x", "page", get_u8), Err(CommandError::Usage)));
        assert_eq!(arg("0x1f", "page", get_u8).unwrap(), 31);
    }

    #[test]
    fn test_help_args() {
        let (action, attrs) = testing::encode(handle_help, &["set"]).unwrap();
        assert_eq!(action, Action::Help(Some("set".into())));
        assert!(attrs.is_empty());
        assert!(testing::is_usage(testing::encode(handle_help, &["a", "b"])));
    }

    #[test]
    fn test_registry_has_no_duplicates() {
        let mut r = Registry::new();
        register_all(&mut r);
        assert!(r.commands().len() > 40);
    }
}
