//! Shared utilities for wpan-nlink.

pub mod addr;
pub mod ifname;
pub mod parse;
pub mod phy;

pub use addr::{format_extended_addr, format_hex_octets, parse_extended_addr, parse_key};
pub use ifname::{IfError, index_to_name_or_fallback};
pub use parse::{
    ParseError, dbm_to_mbm, get_bool, get_dbm, get_i8, get_u8, get_u8_dec, get_u16, get_u32,
    get_u32_dec, get_u64,
};
