//! wpan-hwsim - manage the virtual radios of `mac802154_hwsim`.
//!
//! Without a command, prints every radio and its edges.

mod error;
mod topology;

use std::io::{self, Write};

use clap::{ArgAction, Parser, Subcommand};
use wpan_nlink::netlink::genl::hwsim::HwsimConnection;
use wpan_nlink::util::{get_u8, get_u32};

use error::{HwsimError, Result};

#[derive(Parser, Debug)]
#[command(
    name = "wpan-hwsim",
    version,
    disable_version_flag = true,
    about = "IEEE 802.15.4 hwsim radio management"
)]
struct Cli {
    /// Show version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Trace every netlink message sent and received.
    #[arg(long)]
    debug: bool,

    /// Dump topology as dot format.
    #[arg(short, long)]
    dot: bool,

    /// Filter one radio from the dump (useful for virtual monitors).
    #[arg(short, long, value_name = "IDX", value_parser = parse_index)]
    ignore: Option<u32>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Cmd {
    /// Add a new hwsim radio.
    Add,
    /// Delete the hwsim radio with index IDX.
    Del {
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx: u32,
    },
    /// Manage the edges between radios.
    #[command(subcommand)]
    Edge(EdgeCmd),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum EdgeCmd {
    /// Add an edge between radios.
    Add {
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx: u32,
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx2: u32,
    },
    /// Delete an edge between radios.
    Del {
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx: u32,
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx2: u32,
    },
    /// Set the LQI value of an edge.
    Lqi {
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx: u32,
        #[arg(value_name = "IDX", value_parser = parse_index)]
        idx2: u32,
        #[arg(value_parser = parse_lqi)]
        lqi: u8,
    },
}

fn parse_index(s: &str) -> std::result::Result<u32, String> {
    get_u32(s).map_err(|_| format!("invalid radio index {}", s))
}

fn parse_lqi(s: &str) -> std::result::Result<u8, String> {
    get_u8(s).map_err(|_| format!("invalid lqi value {}", s))
}

async fn run(cli: &Cli) -> Result<()> {
    let conn = HwsimConnection::new().await.map_err(HwsimError::connect)?;
    let mut stdout = io::stdout();

    match &cli.command {
        None => {
            let radios = topology::filter(&conn.radios().await?, cli.ignore);
            if cli.dot {
                topology::write_dot(&mut stdout, &radios)?;
            } else {
                topology::write_text(&mut stdout, &radios)?;
            }
        }
        Some(Cmd::Add) => {
            let idx = conn
                .new_radio()
                .await
                .map_err(HwsimError::request("add radio"))?;
            writeln!(stdout, "wpan_hwsim radio{} registered.", idx)?;
        }
        Some(Cmd::Del { idx }) => conn
            .del_radio(*idx)
            .await
            .map_err(HwsimError::request("remove radio"))?,
        Some(Cmd::Edge(EdgeCmd::Add { idx, idx2 })) => conn
            .new_edge(*idx, *idx2)
            .await
            .map_err(HwsimError::request("add edge"))?,
        Some(Cmd::Edge(EdgeCmd::Del { idx, idx2 })) => conn
            .del_edge(*idx, *idx2)
            .await
            .map_err(HwsimError::request("remove edge"))?,
        Some(Cmd::Edge(EdgeCmd::Lqi { idx, idx2, lqi })) => conn
            .set_edge_lqi(*idx, *idx2, *lqi)
            .await
            .map_err(HwsimError::request("set edge lqi"))?,
    }
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // help and version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("wpan-hwsim").chain(args.iter().copied()))
    }

    #[test]
    fn test_dump_options() {
        let cli = parse(&["-d", "-i", "0x2"]).unwrap();
        assert!(cli.dot);
        assert_eq!(cli.ignore, Some(2));
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_edge_lqi() {
        let cli = parse(&["edge", "lqi", "0", "1", "0x80"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Cmd::Edge(EdgeCmd::Lqi { idx: 0, idx2: 1, lqi: 0x80 }))
        );
    }

    #[test]
    fn test_indices_accept_any_radix() {
        let cli = parse(&["del", "010"]).unwrap();
        assert_eq!(cli.command, Some(Cmd::Del { idx: 8 }));
    }

    #[test]
    fn test_lqi_out_of_range() {
        let err = parse(&["edge", "lqi", "0", "1", "256"]).unwrap_err();
        assert!(err.to_string().contains("invalid lqi value 256"));
    }

    #[test]
    fn test_edge_needs_two_radios() {
        assert!(parse(&["edge", "add", "0"]).is_err());
        assert!(parse(&["edge", "swap", "0", "1"]).is_err());
    }

    #[test]
    fn test_version_short_flag() {
        let err = parse(&["-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
