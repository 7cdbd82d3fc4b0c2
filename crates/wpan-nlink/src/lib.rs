//! Async nl802154 generic netlink library for IEEE 802.15.4 devices.
//!
//! This crate drives the kernel's `nl802154` family: PHY and interface
//! queries, MAC parameter changes, PAN scans and associations, link-layer
//! security tables, and the multicast notifications that report them.
//!
//! # Features
//!
//! - `output` - JSON/text output formatting
//!
//! # Example
//!
//! ```rust,no_run
//! use wpan_nlink::netlink::genl::nl802154::{Nl802154Cmd, Nl802154Connection, WpanPhy};
//!
//! #[tokio::main]
//! async fn main() -> wpan_nlink::Result<()> {
//!     let conn = Nl802154Connection::new().await?;
//!
//!     let request = conn.new_request(Nl802154Cmd::GetWpanPhy, true);
//!     for msg in conn.execute(request).await? {
//!         let phy = WpanPhy::parse(&msg.attrs)?;
//!         println!("{:?}: channel {:?}", phy.name, phy.channel);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod netlink;
pub mod util;

#[cfg(feature = "output")]
pub mod output;

pub use netlink::{Error, Result};
