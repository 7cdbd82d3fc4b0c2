//! Command table and lookup.
//!
//! Every handler module registers its commands into a [`Registry`] at
//! startup. A command lives either at the top level (`scan`, `del`) or in a
//! section (`set channel`, `seclevel add`) and declares which kinds of
//! device identification it accepts.

use std::fs::File;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

use wpan_nlink::netlink::MessageBuilder;
use wpan_nlink::netlink::genl::nl802154::{Nl802154Cmd, Nl802154Connection};
use wpan_nlink::output::TimestampMode;

use crate::error::Result;

/// How a command's target device is named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdBy {
    /// No device.
    None,
    /// `phy <name>` or `phy#<index>`.
    Phy,
    /// `dev <ifname>`.
    NetDev,
    /// `wdev <index>`.
    WpanDev,
}

impl IdBy {
    fn prefix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Phy => "phy <phyname> ",
            Self::NetDev => "dev <devname> ",
            Self::WpanDev => "wdev <idx> ",
        }
    }
}

/// A request under construction plus anything it refers to.
///
/// Dereferences to the message builder, so record encoders can be handed a
/// `&mut Request` directly.
pub struct Request {
    msg: MessageBuilder,
    held: Vec<File>,
}

impl Request {
    pub fn new(cmd: Nl802154Cmd, dump: bool) -> Self {
        Self {
            msg: Nl802154Connection::request(cmd, dump),
            held: Vec::new(),
        }
    }

    /// Keep `file` open until the request has been sent.
    pub fn hold(&mut self, file: File) {
        self.held.push(file);
    }

    pub fn into_parts(self) -> (MessageBuilder, Vec<File>) {
        (self.msg, self.held)
    }
}

impl Deref for Request {
    type Target = MessageBuilder;

    fn deref(&self) -> &MessageBuilder {
        &self.msg
    }
}

impl DerefMut for Request {
    fn deref_mut(&mut self) -> &mut MessageBuilder {
        &mut self.msg
    }
}

/// How replies to a request are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Nothing beyond the acknowledgement.
    Ack,
    /// PHY descriptions, possibly split over several messages.
    Phys,
    /// Interfaces, grouped by PHY when more than one may come back.
    Interfaces { grouped: bool },
    /// Replayable security table lines.
    Security(Table),
    /// Associated peers.
    Peers,
    /// Energy detection result for the requested channel mask.
    EdScan { channels: u32 },
}

/// Security tables that can be dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Level,
    Device,
    DevKey,
    Key,
}

/// What the dispatcher does once a handler has parsed its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the request and render its replies.
    Send(Reply),
    /// Send the prepared trigger, then follow the scan until it ends.
    Scan,
    /// Listen to multicast notifications.
    Monitor { timestamp: TimestampMode },
    /// Print the command table, optionally only one section.
    Help(Option<String>),
}

pub type Handler = fn(&mut Request, &[String]) -> Result<Action>;

/// One registered command.
#[derive(Clone)]
pub struct Command {
    pub section: Option<&'static str>,
    pub name: &'static str,
    pub args: Option<&'static str>,
    /// Netlink command; `None` for commands that send nothing up front.
    pub cmd: Option<Nl802154Cmd>,
    pub dump: bool,
    pub hidden: bool,
    pub ids: &'static [IdBy],
    pub handler: Handler,
    pub help: Option<&'static str>,
}

impl Command {
    pub fn new(name: &'static str, handler: Handler) -> Self {
        Self {
            section: None,
            name,
            args: None,
            cmd: None,
            dump: false,
            hidden: false,
            ids: &[IdBy::None],
            handler,
            help: None,
        }
    }

    pub fn section(mut self, section: &'static str) -> Self {
        self.section = Some(section);
        self
    }

    pub fn args(mut self, args: &'static str) -> Self {
        self.args = Some(args);
        self
    }

    pub fn nl(mut self, cmd: Nl802154Cmd) -> Self {
        self.cmd = Some(cmd);
        self
    }

    pub fn dump(mut self) -> Self {
        self.dump = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn ids(mut self, ids: &'static [IdBy]) -> Self {
        self.ids = ids;
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Whether this command can be reached with identification `by`.
    ///
    /// PHY commands may also be given no identifier at all.
    pub fn accepts(&self, by: IdBy) -> bool {
        self.ids.contains(&by) || (by == IdBy::None && self.ids.contains(&IdBy::Phy))
    }

    /// Write the usage line for identification `by`.
    pub fn write_usage<W: Write>(&self, w: &mut W, by: IdBy) -> io::Result<()> {
        write!(w, "\t{}", by.prefix())?;
        if let Some(section) = self.section {
            write!(w, "{} ", section)?;
        }
        write!(w, "{}", self.name)?;
        if let Some(args) = self.args {
            write!(w, " {}", args)?;
        }
        writeln!(w)
    }

    fn write_help<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for by in self.ids {
            self.write_usage(w, *by)?;
        }
        if let Some(help) = self.help {
            for line in help.lines() {
                writeln!(w, "\t\t{}", line)?;
            }
        }
        writeln!(w)
    }
}

/// All known commands.
#[derive(Default)]
pub struct Registry {
    commands: Vec<Command>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) {
        debug_assert!(
            !self.commands.iter().any(|c| c.section == command.section
                && c.name == command.name
                && c.ids.iter().any(|id| command.ids.contains(id))),
            "duplicate command {:?} {}",
            command.section,
            command.name
        );
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// True if `name` is the name of a section.
    pub fn is_section(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c.section == Some(name))
    }

    /// Find the command named by the leading `tokens`.
    ///
    /// A `section name` pair wins over a top-level command of the section's
    /// name. Returns the command and how many tokens named it.
    pub fn find(&self, tokens: &[String], by: IdBy) -> Option<(&Command, usize)> {
        let first = tokens.first()?;

        if let Some(second) = tokens.get(1) {
            let found = self.commands.iter().find(|c| {
                c.section == Some(first.as_str()) && c.name == second && c.accepts(by)
            });
            if let Some(command) = found {
                return Some((command, 2));
            }
        }

        self.commands
            .iter()
            .find(|c| c.section.is_none() && c.name == first && c.accepts(by))
            .map(|c| (c, 1))
    }

    /// Print the usage summary, restricted to `section` if given.
    pub fn write_help<W: Write>(&self, w: &mut W, section: Option<&str>) -> io::Result<()> {
        writeln!(w, "Usage:\tiwpan [options] command")?;
        writeln!(w, "Options:")?;
        writeln!(w, "\t--debug\t\tenable netlink debugging")?;
        writeln!(w, "\t--version\tshow version")?;
        writeln!(w, "\t-j, --json\tprint records as JSON")?;
        writeln!(w, "\t-p, --pretty\tpretty print JSON")?;
        writeln!(w, "Commands:")?;
        for command in &self.commands {
            if command.hidden {
                continue;
            }
            if section.is_some() && command.section != section {
                continue;
            }
            command.write_help(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Request, _: &[String]) -> Result<Action> {
        Ok(Action::Send(Reply::Ack))
    }

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn sample() -> Registry {
        let mut r = Registry::new();
        r.register(
            Command::new("scan", noop)
                .args("type <type>")
                .ids(&[IdBy::NetDev]),
        );
        r.register(
            Command::new("trigger", noop)
                .section("scan")
                .ids(&[IdBy::NetDev]),
        );
        r.register(
            Command::new("channel", noop)
                .section("set")
                .args("<page> <channel>")
                .ids(&[IdBy::Phy]),
        );
        r.register(Command::new("info", noop).ids(&[IdBy::Phy]));
        r.register(Command::new("info", noop).ids(&[IdBy::NetDev, IdBy::WpanDev]));
        r.register(Command::new("phy", noop).hidden());
        r
    }

    #[test]
    fn test_section_wins_over_toplevel() {
        let r = sample();
        let (c, used) = r.find(&tokens("scan trigger type ed"), IdBy::NetDev).unwrap();
        assert_eq!((c.section, c.name, used), (Some("scan"), "trigger", 2));

        let (c, used) = r.find(&tokens("scan type ed"), IdBy::NetDev).unwrap();
        assert_eq!((c.section, c.name, used), (None, "scan", 1));
    }

    #[test]
    fn test_identification_selects_command() {
        let r = sample();
        let (c, _) = r.find(&tokens("info"), IdBy::WpanDev).unwrap();
        assert!(c.ids.contains(&IdBy::NetDev));
        let (c, _) = r.find(&tokens("info"), IdBy::Phy).unwrap();
        assert_eq!(c.ids, &[IdBy::Phy]);
    }

    #[test]
    fn test_phy_commands_without_identifier() {
        let r = sample();
        assert!(r.find(&tokens("set channel 0 11"), IdBy::None).is_some());
        assert!(r.find(&tokens("scan type ed"), IdBy::None).is_none());
        assert!(r.find(&tokens("set channel 0 11"), IdBy::NetDev).is_none());
    }

    #[test]
    fn test_unknown_command() {
        let r = sample();
        assert!(r.find(&tokens("bogus_command"), IdBy::None).is_none());
        assert!(r.find(&[], IdBy::None).is_none());
        assert!(r.is_section("set"));
        assert!(!r.is_section("channel"));
    }

    #[test]
    fn test_help_skips_hidden() {
        let mut out = Vec::new();
        sample().write_help(&mut out, None).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\tphy <phyname> set channel <page> <channel>\n"));
        assert!(out.contains("\tdev <devname> scan trigger\n"));
        assert!(!out.contains("\tphy\n"));
    }

    #[test]
    fn test_help_section_filter() {
        let mut out = Vec::new();
        sample().write_help(&mut out, Some("set")).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("set channel"));
        assert!(!out.contains("scan"));
    }
}
