//! WPAN PHY name and index resolution through `/sys/class/ieee802154`.

use std::path::Path;

use super::ifname::{self, IfError, Result};

const SYS_CLASS_IEEE802154: &str = "/sys/class/ieee802154";

/// Resolve a PHY name such as `wpan-phy0` to its index.
pub fn name_to_index(name: &str) -> Result<u32> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(IfError::InvalidName(name.to_string()));
    }
    ifname::read_index(Path::new(SYS_CLASS_IEEE802154), name, "index")
}

/// Resolve a PHY index to its current name.
pub fn index_to_name(index: u32) -> Result<String> {
    ifname::find_by_index(Path::new(SYS_CLASS_IEEE802154), index, "index")
}

/// Parse the `phy#<idx>` form.
pub fn parse_phy_hash(s: &str) -> Option<u32> {
    s.strip_prefix("phy#")?.parse().ok()
}
