//! Printable implementations for nl802154 records.

mod event;
mod interface;
mod phy;
mod scan;
mod security;

pub use interface::print_interface_text;
pub use scan::{CoordinatorOnDev, EdScanReport};
pub use security::SecurityDump;

/// Helpers shared by the record printers.
fn opt_json<T: serde::Serialize>(obj: &mut serde_json::Value, key: &str, value: Option<T>) {
    if let Some(v) = value {
        obj[key] = serde_json::json!(v);
    }
}
