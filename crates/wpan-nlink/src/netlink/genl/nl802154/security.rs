//! Link-layer security tables: levels, devices, device keys and keys.
//!
//! Each record is used both ways. Dumps decode it from the nested attribute
//! of the same name, and add/del requests encode the fields that are set.

use std::fmt;

use super::types::{ExtendedAddr, KeyBytes, KeyId};
use super::{
    CMD_FRAME_NR_IDS, DevAttr, DevkeyAttr, FrameType, KEY_SIZE, KeyAttr, Nl802154Attr,
    SecLevelAttr,
};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::Result;
use crate::netlink::policy::{AttrKind, Policy, rule};

/// Bit in a key's frame usage mask selecting MAC command frames.
pub const KEY_USAGE_FRAME_CMD: u8 = 1 << FrameType::Cmd as u8;

const USAGE_CMDS_LEN: usize = CMD_FRAME_NR_IDS / 8;

static SECLEVEL_POLICY: Policy = Policy::new(&[
    rule(SecLevelAttr::Levels as u16, "SECLEVEL_ATTR_LEVELS", AttrKind::U8),
    rule(SecLevelAttr::Frame as u16, "SECLEVEL_ATTR_FRAME", AttrKind::U32),
    rule(SecLevelAttr::CmdFrame as u16, "SECLEVEL_ATTR_CMD_FRAME", AttrKind::U32),
    rule(SecLevelAttr::DevOverride as u16, "SECLEVEL_ATTR_DEV_OVERRIDE", AttrKind::U8),
]);

static DEVICE_POLICY: Policy = Policy::new(&[
    rule(DevAttr::FrameCounter as u16, "DEV_ATTR_FRAME_COUNTER", AttrKind::U32),
    rule(DevAttr::PanId as u16, "DEV_ATTR_PAN_ID", AttrKind::U16),
    rule(DevAttr::ShortAddr as u16, "DEV_ATTR_SHORT_ADDR", AttrKind::U16),
    rule(DevAttr::ExtendedAddr as u16, "DEV_ATTR_EXTENDED_ADDR", AttrKind::U64),
    rule(DevAttr::SeclevelExempt as u16, "DEV_ATTR_SECLEVEL_EXEMPT", AttrKind::U8),
    rule(DevAttr::KeyMode as u16, "DEV_ATTR_KEY_MODE", AttrKind::U32),
]);

static DEVKEY_POLICY: Policy = Policy::new(&[
    rule(DevkeyAttr::FrameCounter as u16, "DEVKEY_ATTR_FRAME_COUNTER", AttrKind::U32),
    rule(DevkeyAttr::ExtendedAddr as u16, "DEVKEY_ATTR_EXTENDED_ADDR", AttrKind::U64),
    rule(DevkeyAttr::Id as u16, "DEVKEY_ATTR_ID", AttrKind::Nested),
]);

static KEY_POLICY: Policy = Policy::new(&[
    rule(KeyAttr::Id as u16, "KEY_ATTR_ID", AttrKind::Nested),
    rule(KeyAttr::UsageFrames as u16, "KEY_ATTR_USAGE_FRAMES", AttrKind::U8),
    rule(
        KeyAttr::UsageCmds as u16,
        "KEY_ATTR_USAGE_CMDS",
        AttrKind::Binary {
            min: USAGE_CMDS_LEN,
            max: USAGE_CMDS_LEN,
        },
    ),
    rule(
        KeyAttr::Bytes as u16,
        "KEY_ATTR_BYTES",
        AttrKind::Binary {
            min: KEY_SIZE,
            max: KEY_SIZE,
        },
    ),
]);

/// Find a top-level nested attribute in a dump reply.
fn find_nested(data: &[u8], kind: Nl802154Attr) -> Option<&[u8]> {
    AttrIter::new(data)
        .find(|(t, _)| *t == kind as u16)
        .map(|(_, p)| p)
}

/// Joins dump fields with single spaces.
fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[String]) -> fmt::Result {
    f.write_str(&fields.join(" "))
}

/// Minimum security level required for one frame type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecLevel {
    /// Bitmask of permitted security levels.
    pub levels: Option<u8>,
    pub frame: Option<u32>,
    /// Command frame identifier, only meaningful for command frames.
    pub cmd_frame: Option<u32>,
    pub dev_override: Option<u8>,
}

impl SecLevel {
    pub fn parse(data: &[u8]) -> Result<Self> {
        SECLEVEL_POLICY.validate(data)?;
        let mut level = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == SecLevelAttr::Levels as u16 => level.levels = Some(get::u8(payload)?),
                t if t == SecLevelAttr::Frame as u16 => level.frame = Some(get::u32_ne(payload)?),
                t if t == SecLevelAttr::CmdFrame as u16 => {
                    level.cmd_frame = Some(get::u32_ne(payload)?)
                }
                t if t == SecLevelAttr::DevOverride as u16 => {
                    level.dev_override = Some(get::u8(payload)?)
                }
                _ => {}
            }
        }
        Ok(level)
    }

    /// Decode the `SEC_LEVEL` entry of a dump reply, if it carries one.
    pub fn from_message(data: &[u8]) -> Result<Option<Self>> {
        find_nested(data, Nl802154Attr::SecLevel)
            .map(Self::parse)
            .transpose()
    }

    pub fn encode(&self, b: &mut MessageBuilder) {
        let nest = b.nest_start(Nl802154Attr::SecLevel as u16);
        if let Some(levels) = self.levels {
            b.append_attr_u8(SecLevelAttr::Levels as u16, levels);
        }
        if let Some(frame) = self.frame {
            b.append_attr_u32(SecLevelAttr::Frame as u16, frame);
        }
        if let Some(cmd) = self.cmd_frame {
            b.append_attr_u32(SecLevelAttr::CmdFrame as u16, cmd);
        }
        if let Some(dev_override) = self.dev_override {
            b.append_attr_u8(SecLevelAttr::DevOverride as u16, dev_override);
        }
        b.nest_end(nest);
    }
}

impl fmt::Display for SecLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(levels) = self.levels {
            fields.push(format!("0x{:02x}", levels));
        }
        if let Some(frame) = self.frame {
            fields.push(frame.to_string());
        }
        if let Some(cmd) = self.cmd_frame {
            fields.push(cmd.to_string());
        }
        if let Some(dev_override) = self.dev_override {
            fields.push(dev_override.to_string());
        }
        write_fields(f, &fields)
    }
}

/// A remote device known to the security layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecDevice {
    pub frame_counter: Option<u32>,
    pub pan_id: Option<u16>,
    pub short_addr: Option<u16>,
    pub extended_addr: Option<ExtendedAddr>,
    pub seclevel_exempt: Option<u8>,
    pub key_mode: Option<u32>,
}

impl SecDevice {
    pub fn parse(data: &[u8]) -> Result<Self> {
        DEVICE_POLICY.validate(data)?;
        let mut dev = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == DevAttr::FrameCounter as u16 => {
                    dev.frame_counter = Some(get::u32_ne(payload)?)
                }
                t if t == DevAttr::PanId as u16 => dev.pan_id = Some(get::u16_le(payload)?),
                t if t == DevAttr::ShortAddr as u16 => dev.short_addr = Some(get::u16_le(payload)?),
                t if t == DevAttr::ExtendedAddr as u16 => {
                    dev.extended_addr = Some(ExtendedAddr::decode(payload)?)
                }
                t if t == DevAttr::SeclevelExempt as u16 => {
                    dev.seclevel_exempt = Some(get::u8(payload)?)
                }
                t if t == DevAttr::KeyMode as u16 => dev.key_mode = Some(get::u32_ne(payload)?),
                _ => {}
            }
        }
        Ok(dev)
    }

    pub fn from_message(data: &[u8]) -> Result<Option<Self>> {
        find_nested(data, Nl802154Attr::SecDevice)
            .map(Self::parse)
            .transpose()
    }

    pub fn encode(&self, b: &mut MessageBuilder) {
        let nest = b.nest_start(Nl802154Attr::SecDevice as u16);
        if let Some(counter) = self.frame_counter {
            b.append_attr_u32(DevAttr::FrameCounter as u16, counter);
        }
        if let Some(pan_id) = self.pan_id {
            b.append_attr_u16_le(DevAttr::PanId as u16, pan_id);
        }
        if let Some(short) = self.short_addr {
            b.append_attr_u16_le(DevAttr::ShortAddr as u16, short);
        }
        if let Some(ext) = self.extended_addr {
            ext.encode(b, DevAttr::ExtendedAddr as u16);
        }
        if let Some(exempt) = self.seclevel_exempt {
            b.append_attr_u8(DevAttr::SeclevelExempt as u16, exempt);
        }
        if let Some(mode) = self.key_mode {
            b.append_attr_u32(DevAttr::KeyMode as u16, mode);
        }
        b.nest_end(nest);
    }
}

impl fmt::Display for SecDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(counter) = self.frame_counter {
            fields.push(format!("0x{:08x}", counter));
        }
        if let Some(pan_id) = self.pan_id {
            fields.push(format!("0x{:04x}", pan_id));
        }
        if let Some(short) = self.short_addr {
            fields.push(format!("0x{:04x}", short));
        }
        if let Some(ext) = self.extended_addr {
            fields.push(ext.to_string());
        }
        if let Some(exempt) = self.seclevel_exempt {
            fields.push(exempt.to_string());
        }
        if let Some(mode) = self.key_mode {
            fields.push(mode.to_string());
        }
        write_fields(f, &fields)
    }
}

/// Per-device state for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecDevKey {
    pub frame_counter: Option<u32>,
    pub extended_addr: Option<ExtendedAddr>,
    pub key_id: Option<KeyId>,
}

impl SecDevKey {
    pub fn parse(data: &[u8]) -> Result<Self> {
        DEVKEY_POLICY.validate(data)?;
        let mut devkey = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == DevkeyAttr::FrameCounter as u16 => {
                    devkey.frame_counter = Some(get::u32_ne(payload)?)
                }
                t if t == DevkeyAttr::ExtendedAddr as u16 => {
                    devkey.extended_addr = Some(ExtendedAddr::decode(payload)?)
                }
                t if t == DevkeyAttr::Id as u16 => devkey.key_id = Some(KeyId::parse(payload)?),
                _ => {}
            }
        }
        Ok(devkey)
    }

    pub fn from_message(data: &[u8]) -> Result<Option<Self>> {
        find_nested(data, Nl802154Attr::SecDevkey)
            .map(Self::parse)
            .transpose()
    }

    pub fn encode(&self, b: &mut MessageBuilder) {
        let nest = b.nest_start(Nl802154Attr::SecDevkey as u16);
        if let Some(counter) = self.frame_counter {
            b.append_attr_u32(DevkeyAttr::FrameCounter as u16, counter);
        }
        if let Some(ext) = self.extended_addr {
            ext.encode(b, DevkeyAttr::ExtendedAddr as u16);
        }
        if let Some(key_id) = &self.key_id {
            key_id.encode(b, DevkeyAttr::Id as u16);
        }
        b.nest_end(nest);
    }
}

impl fmt::Display for SecDevKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(counter) = self.frame_counter {
            fields.push(format!("0x{:08x}", counter));
        }
        if let Some(ext) = self.extended_addr {
            fields.push(ext.to_string());
        }
        if let Some(key_id) = &self.key_id {
            fields.push(key_id.to_string());
        }
        write_fields(f, &fields)
    }
}

/// A link-layer key and the frames it may protect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecKey {
    pub usage_frames: Option<u8>,
    /// Command identifier bitmap, 256 bits as eight words.
    pub usage_cmds: Option<[u32; CMD_FRAME_NR_IDS / 32]>,
    pub key: Option<KeyBytes>,
    pub key_id: Option<KeyId>,
}

impl SecKey {
    pub fn parse(data: &[u8]) -> Result<Self> {
        KEY_POLICY.validate(data)?;
        let mut key = Self::default();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == KeyAttr::UsageFrames as u16 => key.usage_frames = Some(get::u8(payload)?),
                t if t == KeyAttr::UsageCmds as u16 => {
                    let mut cmds = [0u32; CMD_FRAME_NR_IDS / 32];
                    for (word, chunk) in cmds.iter_mut().zip(payload.chunks_exact(4)) {
                        *word = get::u32_ne(chunk)?;
                    }
                    key.usage_cmds = Some(cmds);
                }
                t if t == KeyAttr::Bytes as u16 => {
                    let mut bytes = [0u8; KEY_SIZE];
                    bytes.copy_from_slice(&payload[..KEY_SIZE]);
                    key.key = Some(KeyBytes(bytes));
                }
                t if t == KeyAttr::Id as u16 => key.key_id = Some(KeyId::parse(payload)?),
                _ => {}
            }
        }
        Ok(key)
    }

    pub fn from_message(data: &[u8]) -> Result<Option<Self>> {
        find_nested(data, Nl802154Attr::SecKey)
            .map(Self::parse)
            .transpose()
    }

    pub fn encode(&self, b: &mut MessageBuilder) {
        let nest = b.nest_start(Nl802154Attr::SecKey as u16);
        if let Some(frames) = self.usage_frames {
            b.append_attr_u8(KeyAttr::UsageFrames as u16, frames);
        }
        if let Some(cmds) = &self.usage_cmds {
            let bytes: Vec<u8> = cmds.iter().flat_map(|w| w.to_ne_bytes()).collect();
            b.append_attr(KeyAttr::UsageCmds as u16, &bytes);
        }
        if let Some(key) = &self.key {
            b.append_attr(KeyAttr::Bytes as u16, &key.0);
        }
        if let Some(key_id) = &self.key_id {
            key_id.encode(b, KeyAttr::Id as u16);
        }
        b.nest_end(nest);
    }
}

impl fmt::Display for SecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(frames) = self.usage_frames {
            fields.push(format!("0x{:02x}", frames));
        }
        if let Some(cmds) = &self.usage_cmds {
            fields.push(format!("0x{:08x}", cmds[7]));
        }
        if let Some(key) = &self.key {
            fields.push(key.to_string());
        }
        if let Some(key_id) = &self.key_id {
            fields.push(key_id.to_string());
        }
        write_fields(f, &fields)
    }
}
