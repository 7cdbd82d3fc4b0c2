//! iwpan - configure IEEE 802.15.4 devices through nl802154.

mod dispatch;
mod error;
mod handlers;
mod registry;

use std::io;

use clap::Parser;
use wpan_nlink::output::{OutputFormat, OutputOptions};

use dispatch::Output;
use registry::Registry;

#[derive(Parser)]
#[command(name = "iwpan", version, about = "IEEE 802.15.4 configuration utility")]
struct Cli {
    /// Trace every netlink message sent and received.
    #[arg(long)]
    debug: bool,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// [dev <devname> | phy <phyname> | phy#<index> | wdev <idx>] <command> [args...]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let out = Output {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
        opts: OutputOptions { pretty: cli.pretty },
    };

    let mut registry = Registry::new();
    handlers::register_all(&mut registry);

    if cli.command.is_empty() {
        // Nothing to write to if stderr is gone.
        let _ = registry.write_help(&mut io::stderr(), None);
        std::process::exit(1);
    }

    if let Err(e) = dispatch::run(&registry, &cli.command, &out).await {
        // usage errors already printed their usage line
        if !e.is_usage() {
            eprintln!("{}", e);
        }
        std::process::exit(e.exit_code());
    }
}
