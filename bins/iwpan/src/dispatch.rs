//! From command-line tokens to a sent request and rendered replies.
//!
//! The device prefix (`dev`, `phy`, `phy#N`, `wdev`) is split off first,
//! then the command is looked up and its handler encodes the request. The
//! socket is only opened once the arguments have been accepted.

use std::io::{self, Write};

use wpan_nlink::netlink::genl::GenlMessage;
use wpan_nlink::netlink::genl::nl802154::{
    EdScanResult, Nl802154Attr, Nl802154Cmd, Nl802154Connection, Peer, SecDevKey, SecDevice,
    SecKey, SecLevel, WpanInterface, WpanPhy,
};
use wpan_nlink::output::{
    EdScanReport, OutputFormat, OutputOptions, Printable, SecurityDump, print_interface_text,
};
use wpan_nlink::util::{ifname, phy};

use crate::error::{CommandError, Result};
use crate::handlers::{arg, event, scan};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request, Table};

/// How records are printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub format: OutputFormat,
    pub opts: OutputOptions,
}

/// The device a command operates on, resolved to kernel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    None,
    Phy(u32),
    NetDev(u32),
    WpanDev(u64),
}

impl Target {
    fn encode(self, req: &mut Request) {
        match self {
            Self::None => {}
            Self::Phy(index) => req.append_attr_u32(Nl802154Attr::WpanPhy as u16, index),
            Self::NetDev(ifindex) => req.append_attr_u32(Nl802154Attr::Ifindex as u16, ifindex),
            Self::WpanDev(wdev) => req.append_attr_u64(Nl802154Attr::WpanDev as u16, wdev),
        }
    }
}

/// Split the device prefix off `args`.
///
/// `dev` and `phy` only select a device when something follows the name;
/// on their own they are the listing commands of the same name.
pub(crate) fn split_id(args: &[String]) -> (IdBy, Option<&str>, &[String]) {
    match args {
        [kind, name, rest @ ..] if !rest.is_empty() => match kind.as_str() {
            "dev" => (IdBy::NetDev, Some(name.as_str()), rest),
            "phy" => (IdBy::Phy, Some(name.as_str()), rest),
            "wdev" => (IdBy::WpanDev, Some(name.as_str()), rest),
            s if s.starts_with("phy#") => (IdBy::Phy, Some(kind.as_str()), &args[1..]),
            _ => (IdBy::None, None, args),
        },
        [kind, rest @ ..] if kind.starts_with("phy#") && !rest.is_empty() => {
            (IdBy::Phy, Some(kind.as_str()), rest)
        }
        _ => (IdBy::None, None, args),
    }
}

/// Resolve a device name given with identification `by`.
fn resolve(by: IdBy, name: &str) -> Result<Target> {
    match by {
        IdBy::None => Ok(Target::None),
        IdBy::Phy => match phy::parse_phy_hash(name) {
            Some(index) => Ok(Target::Phy(index)),
            None => Ok(Target::Phy(phy::name_to_index(name)?)),
        },
        IdBy::NetDev => Ok(Target::NetDev(ifname::name_to_index(name)?)),
        IdBy::WpanDev => Ok(Target::WpanDev(arg(name, "wdev", wpan_nlink::util::get_u64)?)),
    }
}

/// Report a rejected invocation of `command` on stderr.
fn write_usage_error<W: Write>(
    w: &mut W,
    command: &Command,
    by: IdBy,
    err: &CommandError,
) -> io::Result<()> {
    if matches!(err, CommandError::OutOfRange { .. }) {
        writeln!(w, "{}", err)?;
    }
    writeln!(w, "Usage:")?;
    command.write_usage(w, by)
}

/// Run one command line (without the global options).
pub async fn run(registry: &Registry, args: &[String], out: &Output) -> Result<()> {
    let (by, name, rest) = split_id(args);

    let Some((command, used)) = registry.find(rest, by) else {
        registry.write_help(&mut io::stderr(), None)?;
        return Err(CommandError::Usage);
    };
    tracing::debug!(section = ?command.section, name = command.name, ?by, "dispatching");

    let target = match name {
        Some(name) => resolve(by, name)?,
        None => Target::None,
    };

    let mut req = Request::new(command.cmd.unwrap_or(Nl802154Cmd::Unspec), command.dump);
    target.encode(&mut req);

    let action = match (command.handler)(&mut req, &rest[used..]) {
        Ok(action) => action,
        Err(e) if e.is_usage() => {
            write_usage_error(&mut io::stderr(), command, by, &e)?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    match action {
        Action::Help(section) => {
            let section = section.filter(|s| registry.is_section(s));
            registry.write_help(&mut io::stdout(), section.as_deref())?;
            Ok(())
        }
        Action::Monitor { timestamp } => event::monitor(timestamp, out).await,
        Action::Scan => match target {
            Target::NetDev(ifindex) => scan::run_scan(req, ifindex, out).await,
            _ => Err(CommandError::Usage),
        },
        Action::Send(reply) => {
            let conn = Nl802154Connection::new().await?;
            let (msg, held) = req.into_parts();
            let replies = conn.execute(msg).await?;
            drop(held);

            let mut stdout = io::stdout().lock();
            render(reply, &replies, &mut stdout, out)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Print the replies to a request according to `reply`.
pub(crate) fn render<W: Write>(
    reply: Reply,
    replies: &[GenlMessage],
    w: &mut W,
    out: &Output,
) -> Result<()> {
    match reply {
        Reply::Ack => {}
        Reply::Phys => {
            let mut phys: Vec<WpanPhy> = Vec::new();
            for msg in replies {
                let phy = WpanPhy::parse(&msg.attrs)?;
                match phys
                    .iter_mut()
                    .find(|p| p.index.is_some() && p.index == phy.index)
                {
                    Some(existing) => existing.merge(phy),
                    None => phys.push(phy),
                }
            }
            for phy in &phys {
                phy.print(w, out.format, &out.opts)?;
            }
        }
        Reply::Interfaces { grouped } => {
            let mut current_phy = None;
            for msg in replies {
                let iface = WpanInterface::parse(&msg.attrs)?;
                if grouped && out.format == OutputFormat::Text {
                    if iface.wpan_phy != current_phy {
                        if let Some(index) = iface.wpan_phy {
                            writeln!(w, "phy#{}", index)?;
                        }
                        current_phy = iface.wpan_phy;
                    }
                    print_interface_text(w, &iface, "\t")?;
                } else {
                    iface.print(w, out.format, &out.opts)?;
                }
            }
        }
        Reply::Security(table) => {
            for msg in replies {
                let entry = match table {
                    Table::Level => SecLevel::from_message(&msg.attrs)
                        .map(|e| e.map(SecurityDump::Level)),
                    Table::Device => SecDevice::from_message(&msg.attrs)
                        .map(|e| e.map(SecurityDump::Device)),
                    Table::DevKey => SecDevKey::from_message(&msg.attrs)
                        .map(|e| e.map(SecurityDump::DevKey)),
                    Table::Key => {
                        SecKey::from_message(&msg.attrs).map(|e| e.map(SecurityDump::Key))
                    }
                };
                match entry {
                    Ok(Some(entry)) => entry.print(w, out.format, &out.opts)?,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, ?table, "skipping entry");
                        eprintln!("failed to parse nested attributes!");
                    }
                }
            }
        }
        Reply::Peers => {
            for msg in replies {
                if let Some(peer) = Peer::from_message(&msg.attrs)? {
                    peer.print(w, out.format, &out.opts)?;
                }
            }
        }
        Reply::EdScan { channels } => {
            for msg in replies {
                let result = EdScanResult::parse(&msg.attrs)?;
                EdScanReport {
                    result: &result,
                    requested: channels,
                }
                .print(w, out.format, &out.opts)?;
            }
        }
    }
    Ok(())
}
