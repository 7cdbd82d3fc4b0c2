//! Async netlink protocol implementation for Linux.
//!
//! This module carries the wire layer (message and attribute framing, the
//! request builder, declarative attribute policies) and a generic netlink
//! client with the typed `nl802154` family on top.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wpan_nlink::netlink::genl::nl802154::{Nl802154Cmd, Nl802154Connection, WpanInterface};
//!
//! # async fn example() -> wpan_nlink::Result<()> {
//! let conn = Nl802154Connection::new().await?;
//!
//! let request = conn.new_request(Nl802154Cmd::GetInterface, true);
//! for msg in conn.execute(request).await? {
//!     let iface = WpanInterface::parse(&msg.attrs)?;
//!     println!("{:?} pan_id {:?}", iface.ifname, iface.pan_id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Event Monitoring
//!
//! ```rust,no_run
//! use wpan_nlink::netlink::genl::nl802154::{MCAST_GROUP_SCAN, Nl802154Connection};
//!
//! # async fn example() -> wpan_nlink::Result<()> {
//! let mut conn = Nl802154Connection::new().await?;
//! conn.subscribe(MCAST_GROUP_SCAN).await?;
//!
//! loop {
//!     let event = conn.next_event().await?;
//!     println!("{:?}", event.kind);
//! }
//! # }
//! ```

pub mod attr;
pub mod builder;
mod error;
pub mod genl;
pub mod message;
pub mod policy;
pub mod socket;

pub use builder::MessageBuilder;
pub use error::{Error, Result};
pub use socket::{NetlinkSocket, Protocol};
