//! Virtual radio management via the `MAC802154_HWSIM` generic netlink family.
//!
//! The `mac802154_hwsim` kernel module simulates a set of 802.15.4 radios.
//! Radios hear each other only along directed edges, each carrying the link
//! quality indicator reported for frames received over it.
//!
//! # Example
//!
//! ```rust,no_run
//! use wpan_nlink::netlink::genl::hwsim::HwsimConnection;
//!
//! # async fn example() -> wpan_nlink::Result<()> {
//! let conn = HwsimConnection::new().await?;
//! let idx = conn.new_radio().await?;
//! conn.new_edge(0, idx).await?;
//! for radio in conn.radios().await? {
//!     println!("radio{} has {} edges", radio.id, radio.edges.len());
//! }
//! # Ok(())
//! # }
//! ```

mod connection;
mod radio;

pub use connection::HwsimConnection;
pub use radio::{Edge, Radio};

/// Generic netlink family name.
pub const HWSIM_GENL_NAME: &str = "MAC802154_HWSIM";

/// Family version sent in the GENL header.
pub const HWSIM_VERSION: u8 = 0;

/// Link quality assumed for an edge the kernel reports without one.
pub const DEFAULT_LQI: u8 = 0xff;

/// Commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwsimCmd {
    Unspec = 0,
    GetRadio = 1,
    SetRadio = 2,
    NewRadio = 3,
    DelRadio = 4,
    GetEdge = 5,
    SetEdge = 6,
    DelEdge = 7,
    NewEdge = 8,
}

/// Top-level attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwsimAttr {
    Unspec = 0,
    RadioId = 1,
    /// A single edge, in edge requests.
    RadioEdge = 2,
    /// Every edge of a radio, in dump replies.
    RadioEdges = 3,
}

/// Attributes nested in an edge.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAttr {
    Unspec = 0,
    EndpointId = 1,
    Lqi = 2,
}
