//! IEEE 802.15.4 configuration via the `nl802154` generic netlink family.
//!
//! The family is owned by the kernel; this module mirrors its command and
//! attribute numbering and provides typed decoders for the records it
//! returns, plus request encoders for the nested attribute layouts.
//!
//! # Example
//!
//! ```rust,no_run
//! use wpan_nlink::netlink::genl::nl802154::{Nl802154Cmd, Nl802154Connection, WpanPhy};
//!
//! # async fn example() -> wpan_nlink::Result<()> {
//! let conn = Nl802154Connection::new().await?;
//!
//! let request = conn.new_request(Nl802154Cmd::GetWpanPhy, true);
//! for msg in conn.execute(request).await? {
//!     let phy = WpanPhy::parse(&msg.attrs)?;
//!     println!("{:?} {:?}", phy.index, phy.name);
//! }
//! # Ok(())
//! # }
//! ```

mod connection;
mod event;
mod interface;
mod phy;
mod scan;
mod security;
mod types;

pub use connection::{EventStream, Nl802154Connection};
pub use event::{EventKind, Nl802154Event};
pub use interface::{SecParams, WpanInterface};
pub use phy::{PhyCaps, WpanPhy, channel_frequency};
pub use scan::{CoordKey, Coordinator, EdScanResult, Peer, ScanRequest};
pub use security::{KEY_USAGE_FRAME_CMD, SecDevKey, SecDevice, SecKey, SecLevel};
pub use types::{DevAddr, ExtendedAddr, KeyBytes, KeyId};

/// Generic netlink family name.
pub const NL802154_GENL_NAME: &str = "nl802154";

/// Family version sent in the GENL header.
pub const NL802154_VERSION: u8 = 0;

/// Multicast group carrying PHY and interface configuration changes.
pub const MCAST_GROUP_CONFIG: &str = "config";
/// Multicast group carrying scan progress.
pub const MCAST_GROUP_SCAN: &str = "scan";
/// Multicast group carrying MLME notifications.
pub const MCAST_GROUP_MLME: &str = "mlme";

/// Link-layer security key length.
pub const KEY_SIZE: usize = 16;
/// Number of MAC command frame identifiers.
pub const CMD_FRAME_NR_IDS: usize = 256;
/// Largest channel number on any page.
pub const MAX_CHANNEL: u8 = 26;
/// Largest channel page.
pub const MAX_PAGE: u8 = 31;

/// nl802154 commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl802154Cmd {
    Unspec = 0,
    GetWpanPhy = 1,
    SetWpanPhy = 2,
    NewWpanPhy = 3,
    DelWpanPhy = 4,
    GetInterface = 5,
    SetInterface = 6,
    NewInterface = 7,
    DelInterface = 8,
    SetChannel = 9,
    SetPanId = 10,
    SetShortAddr = 11,
    SetTxPower = 12,
    SetCcaMode = 13,
    SetCcaEdLevel = 14,
    SetMaxFrameRetries = 15,
    SetBackoffExponent = 16,
    SetMaxCsmaBackoffs = 17,
    SetLbtMode = 18,
    SetAckreqDefault = 19,
    SetWpanPhyNetns = 20,
    SetSecParams = 21,
    GetSecKey = 22,
    NewSecKey = 23,
    DelSecKey = 24,
    GetSecDev = 25,
    NewSecDev = 26,
    DelSecDev = 27,
    GetSecDevkey = 28,
    NewSecDevkey = 29,
    DelSecDevkey = 30,
    GetSecLevel = 31,
    NewSecLevel = 32,
    DelSecLevel = 33,
    ScanEvent = 34,
    TriggerScan = 35,
    AbortScan = 36,
    ScanDone = 37,
    SendBeacons = 38,
    StopBeacons = 39,
    Associate = 40,
    Disassociate = 41,
    SetMaxAssociations = 42,
    ListAssociations = 43,
    /// Experimental energy detection scan request.
    EdScanReq = 44,
}

/// Top-level nl802154 attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl802154Attr {
    Unspec = 0,
    WpanPhy = 1,
    WpanPhyName = 2,
    Ifindex = 3,
    Ifname = 4,
    Iftype = 5,
    WpanDev = 6,
    Page = 7,
    Channel = 8,
    PanId = 9,
    ShortAddr = 10,
    TxPower = 11,
    CcaMode = 12,
    CcaOpt = 13,
    CcaEdLevel = 14,
    MaxFrameRetries = 15,
    MaxBe = 16,
    MinBe = 17,
    MaxCsmaBackoffs = 18,
    LbtMode = 19,
    Generation = 20,
    ChannelsSupported = 21,
    SupportedChannel = 22,
    ExtendedAddr = 23,
    WpanPhyCaps = 24,
    SupportedCommands = 25,
    AckreqDefault = 26,
    Pad = 27,
    Pid = 28,
    NetnsFd = 29,
    Coordinator = 30,
    ScanType = 31,
    ScanFlags = 32,
    ScanChannels = 33,
    ScanPreambleCodes = 34,
    ScanMeanPrf = 35,
    ScanDuration = 36,
    ScanDoneReason = 37,
    BeaconInterval = 38,
    MaxAssociations = 39,
    Peer = 40,
    SecEnabled = 41,
    SecOutLevel = 42,
    SecOutKeyId = 43,
    SecFrameCounter = 44,
    SecLevel = 45,
    SecDevice = 46,
    SecDevkey = 47,
    SecKey = 48,
    // Experimental energy detection results
    ScanStatus = 49,
    ScanResultListSize = 50,
    ScanEnergyDetectList = 51,
    ScanEnergyDetectListEntry = 52,
    ScanDetectedCategory = 53,
}

/// Interface types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfType {
    Node = 0,
    Monitor = 1,
    Coordinator = 2,
}

impl IfType {
    /// Parse a command-line interface type.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(Self::Node),
            "monitor" => Some(Self::Monitor),
            "coordinator" => Some(Self::Coordinator),
            _ => None,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Node),
            1 => Some(Self::Monitor),
            2 => Some(Self::Coordinator),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Monitor => "monitor",
            Self::Coordinator => "coordinator",
        }
    }
}

/// Human-readable name of a raw interface type.
pub fn iftype_name(value: u32) -> String {
    match IfType::from_u32(value) {
        Some(t) => t.name().to_string(),
        None if value == u32::MAX => "unspecified".to_string(),
        None => format!("Unknown mode ({})", value),
    }
}

/// Clear channel assessment modes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcaMode {
    Energy = 1,
    Carrier = 2,
    EnergyCarrier = 3,
    Aloha = 4,
    UwbShr = 5,
    UwbMultiplexed = 6,
}

/// Logical operator for [`CcaMode::EnergyCarrier`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcaOpt {
    EnergyCarrierAnd = 0,
    EnergyCarrierOr = 1,
}

/// Describe a CCA mode and, for the combined mode, its option.
pub fn cca_mode_description(mode: u32, opt: Option<u32>) -> String {
    match mode {
        m if m == CcaMode::Energy as u32 => "Energy above threshold".to_string(),
        m if m == CcaMode::Carrier as u32 => "Carrier sense only".to_string(),
        m if m == CcaMode::EnergyCarrier as u32 => match opt {
            Some(o) if o == CcaOpt::EnergyCarrierAnd as u32 => {
                "Carrier sense with energy above threshold (logical operator is 'and')"
                    .to_string()
            }
            Some(o) if o == CcaOpt::EnergyCarrierOr as u32 => {
                "Carrier sense with energy above threshold (logical operator is 'or')".to_string()
            }
            Some(o) => format!("Unknown CCA option ({}) for CCA mode ({})", o, mode),
            None => "Carrier sense with energy above threshold".to_string(),
        },
        m if m == CcaMode::Aloha as u32 => "ALOHA".to_string(),
        m if m == CcaMode::UwbShr as u32 => {
            "UWB preamble sense based on the SHR of a frame".to_string()
        }
        m if m == CcaMode::UwbMultiplexed as u32 => {
            "UWB preamble sense based on the packet with the multiplexed preamble".to_string()
        }
        _ => format!("Unknown CCA mode ({})", mode),
    }
}

/// Scan types.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Ed = 0,
    Active = 1,
    Passive = 2,
    EnhancedActive = 3,
    RitPassive = 4,
}

impl ScanType {
    /// Parse a command-line scan type.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ed" => Some(Self::Ed),
            "active" => Some(Self::Active),
            "passive" => Some(Self::Passive),
            "enhanced" => Some(Self::EnhancedActive),
            "rit" => Some(Self::RitPassive),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ed => "ed",
            Self::Active => "active",
            Self::Passive => "passive",
            Self::EnhancedActive => "enhanced",
            Self::RitPassive => "rit",
        }
    }
}

/// Why a scan ended.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDoneReason {
    Finished = 0,
    Aborted = 1,
}

/// Tri-state capability flag.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedBool {
    False = 0,
    True = 1,
    Both = 2,
}

/// Name of a raw tri-state capability value.
pub fn supported_bool_name(value: u32) -> &'static str {
    match value {
        v if v == SupportedBool::False as u32 => "false",
        v if v == SupportedBool::True as u32 => "true",
        v if v == SupportedBool::Both as u32 => "both",
        _ => "unknown",
    }
}

/// Attributes nested in `WPAN_PHY_CAPS`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapAttr {
    Unspec = 0,
    Iftypes = 1,
    Channels = 2,
    TxPowers = 3,
    CcaEdLevels = 4,
    CcaModes = 5,
    CcaOpts = 6,
    MinMinbe = 7,
    MaxMinbe = 8,
    MinMaxbe = 9,
    MaxMaxbe = 10,
    MinCsmaBackoffs = 11,
    MaxCsmaBackoffs = 12,
    MinFrameRetries = 13,
    MaxFrameRetries = 14,
    Lbt = 15,
}

/// Attributes nested in `COORDINATOR`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordAttr {
    Unspec = 0,
    PanId = 1,
    Addr = 2,
    Channel = 3,
    Page = 4,
    PreambleCode = 5,
    MeanPrf = 6,
    SuperframeSpec = 7,
    LinkQuality = 8,
    GtsPermit = 9,
    PayloadData = 10,
    Pad = 11,
}

/// Key identifier modes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIdMode {
    Implicit = 0,
    Index = 1,
    IndexShort = 2,
    IndexExtended = 3,
}

/// Attributes nested in a key identifier.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyIdAttr {
    Unspec = 0,
    Mode = 1,
    Index = 2,
    Implicit = 3,
    SourceShort = 4,
    SourceExtended = 5,
    Pad = 6,
}

/// Device address modes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevAddrMode {
    None = 0,
    Short = 2,
    Extended = 3,
}

/// Attributes nested in a device address (also used for peers).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevAddrAttr {
    Unspec = 0,
    PanId = 1,
    Mode = 2,
    Short = 3,
    Extended = 4,
    Pad = 5,
    PeerType = 6,
}

/// Association peer roles.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerType {
    Unspec = 0,
    Parent = 1,
    Child = 2,
}

/// MAC frame types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Beacon = 0,
    Data = 1,
    Ack = 2,
    Cmd = 3,
}

/// Attributes nested in `SEC_LEVEL`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecLevelAttr {
    Unspec = 0,
    Levels = 1,
    Frame = 2,
    CmdFrame = 3,
    DevOverride = 4,
}

/// Attributes nested in `SEC_DEVICE`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevAttr {
    Unspec = 0,
    FrameCounter = 1,
    PanId = 2,
    ShortAddr = 3,
    ExtendedAddr = 4,
    SeclevelExempt = 5,
    KeyMode = 6,
    Pad = 7,
}

/// Attributes nested in `SEC_DEVKEY`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevkeyAttr {
    Unspec = 0,
    FrameCounter = 1,
    ExtendedAddr = 2,
    Id = 3,
    Pad = 4,
}

/// Attributes nested in `SEC_KEY`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAttr {
    Unspec = 0,
    Id = 1,
    UsageFrames = 2,
    UsageCmds = 3,
    Bytes = 4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iftype_names() {
        assert_eq!(IfType::from_name("coordinator"), Some(IfType::Coordinator));
        assert_eq!(IfType::from_name("router"), None);
        assert_eq!(iftype_name(1), "monitor");
        assert_eq!(iftype_name(9), "Unknown mode (9)");
    }

    #[test]
    fn test_scan_type_names() {
        assert_eq!(ScanType::from_name("enhanced"), Some(ScanType::EnhancedActive));
        assert_eq!(ScanType::from_name("rit").map(|t| t as u8), Some(4));
        assert_eq!(ScanType::from_name("fast"), None);
    }

    #[test]
    fn test_cca_descriptions() {
        assert_eq!(cca_mode_description(1, None), "Energy above threshold");
        assert!(cca_mode_description(3, Some(1)).ends_with("'or')"));
        assert_eq!(
            cca_mode_description(3, Some(7)),
            "Unknown CCA option (7) for CCA mode (3)"
        );
        assert_eq!(cca_mode_description(42, None), "Unknown CCA mode (42)");
    }

    #[test]
    fn test_numbering_anchors() {
        assert_eq!(Nl802154Cmd::TriggerScan as u8, 35);
        assert_eq!(Nl802154Cmd::ListAssociations as u8, 43);
        assert_eq!(Nl802154Attr::Coordinator as u16, 30);
        assert_eq!(Nl802154Attr::SecKey as u16, 48);
    }
}
