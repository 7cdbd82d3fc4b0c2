//! `monitor`: print multicast notifications as they arrive.

use std::io;

use tokio_stream::StreamExt;
use wpan_nlink::netlink::genl::nl802154::{
    EventKind, MCAST_GROUP_CONFIG, MCAST_GROUP_MLME, MCAST_GROUP_SCAN, Nl802154Connection,
};
use wpan_nlink::output::{MonitorConfig, TimestampMode, print_event};

use crate::dispatch::Output;
use crate::error::{CommandError, Result};
use crate::registry::{Action, Command, Registry, Request};

pub fn register(r: &mut Registry) {
    r.register(
        Command::new("monitor", handle_monitor)
            .args("[-t|-r] [-f]")
            .help(
                "Monitor events from the kernel.\n\
                 -t - print timestamp\n\
                 -r - print relative timestamp\n\
                 -f - print full frame for auth/assoc etc.",
            ),
    );
}

fn handle_monitor(_req: &mut Request, args: &[String]) -> Result<Action> {
    let mut absolute = false;
    let mut relative = false;

    for flag in args {
        match flag.as_str() {
            "-t" => absolute = true,
            "-r" => relative = true,
            // full frames are not reported by any nl802154 notification
            "-f" => {}
            _ => return Err(CommandError::Usage),
        }
    }

    let timestamp = match (absolute, relative) {
        (true, true) => return Err(CommandError::Usage),
        (true, false) => TimestampMode::Absolute,
        (false, true) => TimestampMode::Relative,
        (false, false) => TimestampMode::None,
    };
    Ok(Action::Monitor { timestamp })
}

/// Listen on every nl802154 group and print events until the socket fails.
pub async fn monitor(timestamp: TimestampMode, out: &Output) -> Result<()> {
    let mut conn = Nl802154Connection::new().await?;
    conn.subscribe(MCAST_GROUP_CONFIG).await?;
    // Older kernels lack the scan and mlme groups.
    for group in [MCAST_GROUP_SCAN, MCAST_GROUP_MLME] {
        if let Err(e) = conn.subscribe(group).await {
            tracing::warn!(group, error = %e, "cannot join multicast group");
        }
    }

    let mut config = MonitorConfig::new()
        .with_timestamp(timestamp)
        .with_format(out.format)
        .with_opts(out.opts);

    let mut events = conn.events();
    let mut stdout = io::stdout();
    while let Some(event) = events.try_next().await? {
        if event.kind == EventKind::Beacon(None) {
            tracing::warn!(cmd = event.cmd, "beacon without coordinator");
            continue;
        }
        print_event(&mut stdout, &event, &mut config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{encode, is_usage};

    fn timestamp(args: &[&str]) -> Result<TimestampMode> {
        match encode(handle_monitor, args)? {
            (Action::Monitor { timestamp }, attrs) if attrs.is_empty() => Ok(timestamp),
            (other, _) => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_monitor_flags() {
        assert_eq!(timestamp(&[]).unwrap(), TimestampMode::None);
        assert_eq!(timestamp(&["-t"]).unwrap(), TimestampMode::Absolute);
        assert_eq!(timestamp(&["-f", "-r"]).unwrap(), TimestampMode::Relative);
    }

    #[test]
    fn test_monitor_rejects() {
        assert!(is_usage(timestamp(&["-t", "-r"])));
        assert!(is_usage(timestamp(&["-x"])));
    }
}
