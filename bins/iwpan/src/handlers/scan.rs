//! PAN scanning and beacon transmission.
//!
//! `scan` sends the same request as `scan trigger` and then follows the
//! `scan` multicast group, printing each coordinator once, until the kernel
//! reports the end of the scan on the interface. An interrupt aborts the
//! scan instead of leaving it running in the kernel.

use std::collections::HashSet;
use std::future::Future;
use std::io::{self, Write};

use tokio::signal::unix::{SignalKind, signal};
use wpan_nlink::netlink::MessageBuilder;
use wpan_nlink::netlink::genl::GenlMessage;
use wpan_nlink::netlink::genl::nl802154::{
    EventKind, MCAST_GROUP_SCAN, Nl802154Attr, Nl802154Cmd, Nl802154Connection, Nl802154Event,
    ScanRequest, ScanType,
};
use wpan_nlink::output::{CoordinatorOnDev, Printable};
use wpan_nlink::util::{get_u8, get_u32, index_to_name_or_fallback};

use super::{arg, no_args};
use crate::dispatch::Output;
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, IdBy, Registry, Reply, Request};

const NETDEV: &[IdBy] = &[IdBy::NetDev];

const SCAN_ARGS: &str = "type <type> [page <page>] [channels <bitfield>] [duration <duration-order>]";

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("scan", handle_scan)
            .args(SCAN_ARGS)
            .nl(Nl802154Cmd::TriggerScan)
            .ids(NETDEV)
            .help(
                "Scan on this virtual interface with the given configuration.\n\
                 Valid scanning types are: ed, active, passive, enhanced, rit.",
            ),
    );
    r.register(
        Command::new("trigger", handle_scan_trigger)
            .section("scan")
            .args(SCAN_ARGS)
            .nl(Nl802154Cmd::TriggerScan)
            .ids(NETDEV)
            .help(
                "Launch scanning on this virtual interface with the given configuration.\n\
                 Valid scanning types are: ed, active, passive, enhanced, rit.",
            ),
    );
    r.register(
        Command::new("abort", handle_scan_abort)
            .section("scan")
            .nl(Nl802154Cmd::AbortScan)
            .ids(NETDEV)
            .help("Abort ongoing scanning on this virtual interface"),
    );
    r.register(
        Command::new("send", handle_beacons_send)
            .section("beacons")
            .args("[interval <interval-order>]")
            .nl(Nl802154Cmd::SendBeacons)
            .ids(NETDEV)
            .help("Send beacons on this virtual interface at a regular pace."),
    );
    r.register(
        Command::new("stop", handle_beacons_stop)
            .section("beacons")
            .nl(Nl802154Cmd::StopBeacons)
            .ids(NETDEV)
            .help("Stop sending beacons on this interface."),
    );
}

/// Consume `<marker> <value>` from the front of `args`, if present.
fn take_option<'a, T>(
    args: &mut &'a [String],
    marker: &str,
    parse: fn(&str) -> std::result::Result<T, wpan_nlink::util::ParseError>,
) -> Result<Option<T>> {
    match *args {
        [first, value, rest @ ..] if first == marker => {
            let parsed = arg(value, marker, parse)?;
            *args = rest;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

/// Parse `type <type> [page <p>] [channels <bits>] [duration <d>]`.
///
/// The options are only recognised in this order.
fn parse_scan_request(args: &[String]) -> Result<ScanRequest> {
    let (scan_type, mut rest) = match args {
        [keyword, scan_type, rest @ ..] if keyword == "type" => (scan_type, rest),
        _ => return Err(CommandError::Usage),
    };
    let scan_type = ScanType::from_name(scan_type)
        .ok_or_else(|| CommandError::InvalidArgument(format!("invalid scan type {}", scan_type)))?;

    let mut scan = ScanRequest::new(scan_type);
    scan.page = take_option(&mut rest, "page", get_u8)?;
    scan.channels = take_option(&mut rest, "channels", get_u32)?;
    scan.duration = take_option(&mut rest, "duration", get_u8)?;
    no_args(rest)?;
    Ok(scan)
}

fn handle_scan(req: &mut Request, args: &[String]) -> Result<Action> {
    parse_scan_request(args)?.encode(req);
    Ok(Action::Scan)
}

fn handle_scan_trigger(req: &mut Request, args: &[String]) -> Result<Action> {
    parse_scan_request(args)?.encode(req);
    Ok(Action::Send(Reply::Ack))
}

fn handle_scan_abort(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Ack))
}

fn handle_beacons_send(req: &mut Request, args: &[String]) -> Result<Action> {
    let mut rest = args;
    let interval = take_option(&mut rest, "interval", get_u8)?;
    no_args(rest)?;
    if let Some(interval) = interval {
        req.append_attr_u8(Nl802154Attr::BeaconInterval as u16, interval);
    }
    Ok(Action::Send(Reply::Ack))
}

fn handle_beacons_stop(_req: &mut Request, args: &[String]) -> Result<Action> {
    no_args(args)?;
    Ok(Action::Send(Reply::Ack))
}

/// The netlink side of a running scan.
pub(crate) trait ScanTransport {
    async fn send_trigger(&mut self, msg: MessageBuilder) -> wpan_nlink::Result<()>;

    async fn recv_notification(&mut self) -> wpan_nlink::Result<GenlMessage>;

    async fn send_abort(&mut self, ifindex: u32) -> wpan_nlink::Result<()>;
}

impl ScanTransport for Nl802154Connection {
    async fn send_trigger(&mut self, msg: MessageBuilder) -> wpan_nlink::Result<()> {
        self.execute(msg).await?;
        Ok(())
    }

    async fn recv_notification(&mut self) -> wpan_nlink::Result<GenlMessage> {
        self.next_notification().await
    }

    async fn send_abort(&mut self, ifindex: u32) -> wpan_nlink::Result<()> {
        self.abort_scan(ifindex).await
    }
}

/// Print coordinators reported for the scan on `ifindex` until it ends.
///
/// If `interrupt` completes first, one abort request is sent and the loop
/// stops without waiting for the end-of-scan notification. Notifications
/// that do not decode are skipped. Returns the number of distinct
/// coordinators printed.
pub(crate) async fn follow_scan<T, F, W>(
    transport: &mut T,
    ifindex: u32,
    interrupt: F,
    w: &mut W,
    out: &Output,
) -> Result<usize>
where
    T: ScanTransport,
    F: Future<Output = ()>,
    W: Write,
{
    tokio::pin!(interrupt);
    let mut seen = HashSet::new();

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                tracing::debug!(ifindex, "interrupted, aborting scan");
                // the scan may already be over
                if let Err(e) = transport.send_abort(ifindex).await {
                    tracing::warn!(ifindex, error = %e, "abort scan failed");
                }
                break;
            }
            msg = transport.recv_notification() => {
                let Some(event) = Nl802154Event::decode(&msg?) else {
                    continue;
                };
                match &event.kind {
                    EventKind::Beacon(Some(coord)) => {
                        if seen.insert(coord.key()) {
                            let dev = event.ifindex.map(index_to_name_or_fallback);
                            CoordinatorOnDev { coord, dev: dev.as_deref() }
                                .print(w, out.format, &out.opts)?;
                            w.flush()?;
                        }
                    }
                    EventKind::Beacon(None) => eprintln!("coordinator info missing!"),
                    _ if event.ends_scan_on(ifindex) => break,
                    _ => {}
                }
            }
        }
    }

    Ok(seen.len())
}

/// Send `trigger`, then follow the scan it starts.
///
/// `interrupt` must already be armed so that an interrupt arriving while
/// the trigger is in flight still aborts the scan.
pub(crate) async fn start_scan<T, F, W>(
    transport: &mut T,
    trigger: MessageBuilder,
    ifindex: u32,
    interrupt: F,
    w: &mut W,
    out: &Output,
) -> Result<usize>
where
    T: ScanTransport,
    F: Future<Output = ()>,
    W: Write,
{
    transport.send_trigger(trigger).await?;
    follow_scan(transport, ifindex, interrupt, w, out).await
}

/// Resolves on SIGINT. The handler is installed when this is called, not
/// when the future is first polled. Never resolves if it cannot be installed.
fn interrupted() -> impl Future<Output = ()> {
    let sigint = signal(SignalKind::interrupt());
    async move {
        match sigint {
            Ok(mut sigint) => {
                if sigint.recv().await.is_none() {
                    std::future::pending::<()>().await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for interrupts");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Trigger the scan prepared in `req` and follow it to the end.
pub async fn run_scan(req: Request, ifindex: u32, out: &Output) -> Result<()> {
    let mut conn = Nl802154Connection::new().await?;
    conn.subscribe(MCAST_GROUP_SCAN).await?;
    let interrupt = interrupted();

    let (msg, _held) = req.into_parts();
    let mut stdout = io::stdout();
    let found = start_scan(&mut conn, msg, ifindex, interrupt, &mut stdout, out).await?;
    tracing::debug!(found, "scan complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use tokio::sync::oneshot;
    use wpan_nlink::netlink::genl::GENL_HDRLEN;
    use wpan_nlink::netlink::genl::nl802154::CoordAttr;
    use wpan_nlink::netlink::message::NLMSG_HDRLEN;

    use super::*;
    use crate::handlers::testing::{encode, find, is_usage};

    #[test]
    fn test_scan_options() {
        let (action, attrs) = encode(
            handle_scan,
            &["type", "active", "page", "0", "channels", "0x800", "duration", "4"],
        )
        .unwrap();
        assert_eq!(action, Action::Scan);
        assert_eq!(find(&attrs, Nl802154Attr::ScanType as u16), Some(&[1u8][..]));
        assert_eq!(find(&attrs, Nl802154Attr::Page as u16), Some(&[0u8][..]));
        assert_eq!(
            find(&attrs, Nl802154Attr::ScanChannels as u16),
            Some(&0x800u32.to_ne_bytes()[..])
        );
        assert_eq!(find(&attrs, Nl802154Attr::ScanDuration as u16), Some(&[4u8][..]));
    }

    #[test]
    fn test_scan_trigger_minimal() {
        let (action, attrs) = encode(handle_scan_trigger, &["type", "passive"]).unwrap();
        assert_eq!(action, Action::Send(Reply::Ack));
        assert_eq!(attrs, vec![(Nl802154Attr::ScanType as u16, vec![2])]);
    }

    #[test]
    fn test_scan_option_errors() {
        assert!(is_usage(encode(handle_scan, &["type"])));
        assert!(is_usage(encode(handle_scan, &["page", "0"])));
        // out of order options are left over
        assert!(is_usage(encode(handle_scan, &["type", "ed", "duration", "3", "page", "0"])));
        assert!(is_usage(encode(handle_scan, &["type", "ed", "page", "x"])));
        assert!(matches!(
            encode(handle_scan, &["type", "ed", "page", "256"]),
            Err(CommandError::OutOfRange { .. })
        ));

        let err = encode(handle_scan, &["type", "fast"]).unwrap_err();
        assert_eq!(err.to_string(), "invalid scan type fast");
    }

    #[test]
    fn test_beacons() {
        let (_, attrs) = encode(handle_beacons_send, &[]).unwrap();
        assert!(attrs.is_empty());
        let (_, attrs) = encode(handle_beacons_send, &["interval", "5"]).unwrap();
        assert_eq!(attrs, vec![(Nl802154Attr::BeaconInterval as u16, vec![5])]);
        assert!(is_usage(encode(handle_beacons_send, &["interval"])));
        assert!(is_usage(encode(handle_beacons_stop, &["now"])));
        assert!(is_usage(encode(handle_scan_abort, &["now"])));
    }

    /// Replays queued notifications, then blocks forever.
    #[derive(Default)]
    struct FakeTransport {
        notifications: VecDeque<GenlMessage>,
        triggers: Vec<Vec<u8>>,
        aborts: Vec<u32>,
        abort_fails: bool,
        /// Fired while the trigger is being sent.
        on_trigger: Option<oneshot::Sender<()>>,
    }

    impl ScanTransport for FakeTransport {
        async fn send_trigger(&mut self, msg: MessageBuilder) -> wpan_nlink::Result<()> {
            self.triggers.push(msg.finish());
            if let Some(tx) = self.on_trigger.take() {
                let _ = tx.send(());
            }
            Ok(())
        }

        async fn recv_notification(&mut self) -> wpan_nlink::Result<GenlMessage> {
            match self.notifications.pop_front() {
                Some(msg) => Ok(msg),
                None => std::future::pending().await,
            }
        }

        async fn send_abort(&mut self, ifindex: u32) -> wpan_nlink::Result<()> {
            self.aborts.push(ifindex);
            if self.abort_fails {
                return Err(wpan_nlink::Error::from_errno(-22));
            }
            Ok(())
        }
    }

    fn notification(cmd: Nl802154Cmd, build: impl FnOnce(&mut MessageBuilder)) -> GenlMessage {
        let mut b = Nl802154Connection::request(cmd, false);
        build(&mut b);
        GenlMessage {
            family: 0x1c,
            cmd: cmd as u8,
            seq: 0,
            attrs: b.finish()[NLMSG_HDRLEN + GENL_HDRLEN..].to_vec(),
        }
    }

    fn event(ifindex: u32, cmd: Nl802154Cmd) -> GenlMessage {
        notification(cmd, |b| b.append_attr_u32(Nl802154Attr::Ifindex as u16, ifindex))
    }

    fn beacon(ifindex: u32, pan_id: u16, short: u16) -> GenlMessage {
        notification(Nl802154Cmd::ScanEvent, |b| {
            b.append_attr_u32(Nl802154Attr::Ifindex as u16, ifindex);
            let nest = b.nest_start(Nl802154Attr::Coordinator as u16);
            b.append_attr_u16_le(CoordAttr::PanId as u16, pan_id);
            b.append_attr(CoordAttr::Addr as u16, &short.to_le_bytes());
            b.append_attr_u8(CoordAttr::Channel as u16, 11);
            b.nest_end(nest);
        })
    }

    fn text() -> Output {
        Output::default()
    }

    #[tokio::test]
    async fn test_duplicate_beacons_print_once() {
        let mut transport = FakeTransport::default();
        transport.notifications.extend([
            event(7, Nl802154Cmd::TriggerScan),
            beacon(7, 0xabcd, 0x0001),
            beacon(7, 0xabcd, 0x0001),
            beacon(7, 0xabcd, 0x0002),
            event(7, Nl802154Cmd::ScanDone),
        ]);

        let mut out = Vec::new();
        let found = follow_scan(&mut transport, 7, std::future::pending(), &mut out, &text())
            .await
            .unwrap();

        assert_eq!(found, 2);
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("PAN 0xabcd").count(), 2);
        assert!(out.contains("\tcoordinator 0x0001\n"));
        assert!(out.contains("\tcoordinator 0x0002\n"));
        assert!(transport.aborts.is_empty());
    }

    #[tokio::test]
    async fn test_done_for_other_interface_is_ignored() {
        let mut transport = FakeTransport::default();
        transport.notifications.extend([
            event(8, Nl802154Cmd::ScanDone),
            beacon(7, 0x1234, 0x0001),
            event(7, Nl802154Cmd::AbortScan),
        ]);

        let mut out = Vec::new();
        let found = follow_scan(&mut transport, 7, std::future::pending(), &mut out, &text())
            .await
            .unwrap();
        assert_eq!(found, 1);
        assert!(transport.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_notification_is_skipped() {
        let mut transport = FakeTransport::default();
        transport.notifications.extend([
            // ifindex too short for a u32
            notification(Nl802154Cmd::ScanEvent, |b| {
                b.append_attr_u16(Nl802154Attr::Ifindex as u16, 7)
            }),
            beacon(7, 0x1234, 0x0001),
            event(7, Nl802154Cmd::ScanDone),
        ]);

        let mut out = Vec::new();
        let found = follow_scan(&mut transport, 7, std::future::pending(), &mut out, &text())
            .await
            .unwrap();
        assert_eq!(found, 1);
        assert!(String::from_utf8(out).unwrap().contains("PAN 0x1234"));
        assert!(transport.notifications.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_sends_one_abort() {
        let mut transport = FakeTransport::default();
        transport.notifications.push_back(beacon(7, 0x1234, 0x0001));

        let mut out = Vec::new();
        let interrupt = tokio::time::sleep(Duration::from_secs(5));
        let found = follow_scan(&mut transport, 7, interrupt, &mut out, &text())
            .await
            .unwrap();

        assert_eq!(found, 1);
        assert_eq!(transport.aborts, vec![7]);
    }

    #[tokio::test]
    async fn test_failed_abort_still_ends_scan() {
        let mut transport = FakeTransport {
            abort_fails: true,
            ..Default::default()
        };

        let mut out = Vec::new();
        let found = follow_scan(&mut transport, 7, std::future::ready(()), &mut out, &text())
            .await
            .unwrap();
        assert_eq!(found, 0);
        assert_eq!(transport.aborts, vec![7]);
    }

    #[tokio::test]
    async fn test_interrupt_during_trigger_aborts() {
        let (tx, rx) = oneshot::channel();
        let mut transport = FakeTransport {
            on_trigger: Some(tx),
            ..Default::default()
        };
        let interrupt = async {
            let _ = rx.await;
        };

        let mut req = Request::new(Nl802154Cmd::TriggerScan, false);
        handle_scan(&mut req, &["type".to_string(), "active".to_string()]).unwrap();
        let (msg, _) = req.into_parts();

        let mut out = Vec::new();
        start_scan(&mut transport, msg, 7, interrupt, &mut out, &text())
            .await
            .unwrap();

        assert_eq!(transport.triggers.len(), 1);
        assert_eq!(transport.triggers[0][NLMSG_HDRLEN], Nl802154Cmd::TriggerScan as u8);
        assert_eq!(transport.aborts, vec![7]);
    }

    #[test]
    fn test_scan_sends_trigger() {
        let mut r = Registry::new();
        register(&mut r);
        let (command, used) = r.find(&["scan".to_string(), "type".to_string()], IdBy::NetDev).unwrap();
        assert_eq!(used, 1);
        assert_eq!(command.cmd, Some(Nl802154Cmd::TriggerScan));
    }
}
