//! Declarative attribute policies.
//!
//! A [`Policy`] lists, per attribute type, the expected payload shape. Typed
//! decoders run [`Policy::validate`] over an attribute stream before reading
//! any field, so a reader never sees a short or oversized payload.
//! Attributes not named in a policy are accepted untouched.

use super::attr::{AttrIter, NLA_HDRLEN};
use super::error::{Error, Result};

/// Expected payload shape of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    U8,
    U16,
    U32,
    U64,
    S8,
    S32,
    /// No payload; presence is the value.
    Flag,
    /// Optionally null-terminated UTF-8.
    String,
    /// A nested attribute stream.
    Nested,
    /// Opaque bytes with inclusive length bounds.
    Binary { min: usize, max: usize },
}

impl AttrKind {
    fn check(self, len: usize) -> std::result::Result<(), String> {
        let need = |n: usize| {
            if len < n {
                Err(format!("length {} shorter than {}", len, n))
            } else {
                Ok(())
            }
        };
        match self {
            AttrKind::U8 | AttrKind::S8 => need(1),
            AttrKind::U16 => need(2),
            AttrKind::U32 | AttrKind::S32 => need(4),
            AttrKind::U64 => need(8),
            AttrKind::Flag if len != 0 => Err(format!("flag carries {} bytes", len)),
            AttrKind::Flag | AttrKind::String => Ok(()),
            AttrKind::Nested if len != 0 && len < NLA_HDRLEN => {
                Err(format!("nested payload of {} bytes", len))
            }
            AttrKind::Nested => Ok(()),
            AttrKind::Binary { min, max } if len < min || len > max => {
                Err(format!("length {} not in {}..={}", len, min, max))
            }
            AttrKind::Binary { .. } => Ok(()),
        }
    }
}

/// Rule for a single attribute type.
#[derive(Debug, Clone, Copy)]
pub struct AttrRule {
    pub kind: u16,
    pub name: &'static str,
    pub shape: AttrKind,
}

/// Shorthand for building policy tables.
pub const fn rule(kind: u16, name: &'static str, shape: AttrKind) -> AttrRule {
    AttrRule { kind, name, shape }
}

/// A static attribute policy.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    rules: &'static [AttrRule],
}

impl Policy {
    pub const fn new(rules: &'static [AttrRule]) -> Self {
        Self { rules }
    }

    fn rule(&self, kind: u16) -> Option<&AttrRule> {
        self.rules.iter().find(|r| r.kind == kind)
    }

    /// Name of an attribute type, for error messages.
    pub fn name_of(&self, kind: u16) -> &'static str {
        self.rule(kind).map(|r| r.name).unwrap_or("unknown")
    }

    /// Validate every attribute in `data` against this policy.
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        let mut iter = AttrIter::new(data);
        for (kind, payload) in iter.by_ref() {
            if let Some(rule) = self.rule(kind) {
                rule.shape
                    .check(payload.len())
                    .map_err(|reason| Error::policy(rule.name, reason))?;
            }
        }
        if iter.remainder().len() >= NLA_HDRLEN {
            return Err(Error::InvalidAttribute(format!(
                "{} trailing bytes after last attribute",
                iter.remainder().len()
            )));
        }
        Ok(())
    }

    /// Fail with [`Error::MissingAttribute`] unless `value` is present.
    pub fn require<T>(&self, kind: u16, value: Option<T>) -> Result<T> {
        value.ok_or(Error::MissingAttribute {
            name: self.name_of(kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::message::NLMSG_HDRLEN;

    static TEST_POLICY: Policy = Policy::new(&[
        rule(1, "PAN_ID", AttrKind::U16),
        rule(2, "ADDR", AttrKind::Binary { min: 2, max: 8 }),
        rule(3, "GTS", AttrKind::Flag),
    ]);

    fn body(build: impl FnOnce(&mut MessageBuilder)) -> Vec<u8> {
        let mut b = MessageBuilder::new(0x10, 0);
        build(&mut b);
        b.finish()[NLMSG_HDRLEN..].to_vec()
    }

    #[test]
    fn test_accepts_conforming() {
        let data = body(|b| {
            b.append_attr_u16_le(1, 0x1234);
            b.append_attr(2, &[1, 2]);
            b.append_attr_empty(3);
            b.append_attr_u32(9, 7); // not in policy
        });
        TEST_POLICY.validate(&data).unwrap();
    }

    #[test]
    fn test_rejects_short_fixed() {
        let data = body(|b| b.append_attr_u8(1, 1));
        let err = TEST_POLICY.validate(&data).unwrap_err();
        assert!(matches!(err, Error::Policy { attr: "PAN_ID", .. }));
    }

    #[test]
    fn test_rejects_binary_out_of_bounds() {
        let data = body(|b| b.append_attr(2, &[0; 9]));
        assert!(TEST_POLICY.validate(&data).is_err());
    }

    #[test]
    fn test_rejects_flag_payload() {
        let data = body(|b| b.append_attr_u8(3, 1));
        assert!(TEST_POLICY.validate(&data).is_err());
    }

    #[test]
    fn test_require() {
        assert_eq!(TEST_POLICY.require(1, Some(5u16)).unwrap(), 5);
        let err = TEST_POLICY.require::<u16>(1, None).unwrap_err();
        assert_eq!(err.to_string(), "missing attribute: PAN_ID");
    }
}
