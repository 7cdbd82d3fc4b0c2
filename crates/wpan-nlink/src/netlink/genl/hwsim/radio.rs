//! Radio records returned by `GET_RADIO` dumps.

use super::{DEFAULT_LQI, EdgeAttr, HwsimAttr};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::error::Result;
use crate::netlink::policy::{AttrKind, Policy, rule};

static RADIO_POLICY: Policy = Policy::new(&[
    rule(HwsimAttr::RadioId as u16, "RADIO_ID", AttrKind::U32),
    rule(HwsimAttr::RadioEdge as u16, "RADIO_EDGE", AttrKind::Nested),
    rule(HwsimAttr::RadioEdges as u16, "RADIO_EDGES", AttrKind::Nested),
]);

static EDGE_POLICY: Policy = Policy::new(&[
    rule(EdgeAttr::EndpointId as u16, "EDGE_ENDPOINT_ID", AttrKind::U32),
    rule(EdgeAttr::Lqi as u16, "EDGE_LQI", AttrKind::U8),
]);

/// A directed link from one simulated radio to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub endpoint: u32,
    pub lqi: u8,
}

impl Edge {
    pub fn parse(data: &[u8]) -> Result<Self> {
        EDGE_POLICY.validate(data)?;

        let mut endpoint = None;
        let mut lqi = DEFAULT_LQI;
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == EdgeAttr::EndpointId as u16 => endpoint = Some(get::u32_ne(payload)?),
                t if t == EdgeAttr::Lqi as u16 => lqi = get::u8(payload)?,
                _ => {}
            }
        }

        Ok(Self {
            endpoint: EDGE_POLICY.require(EdgeAttr::EndpointId as u16, endpoint)?,
            lqi,
        })
    }
}

/// A simulated radio and the edges leaving it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Radio {
    pub id: u32,
    pub edges: Vec<Edge>,
}

impl Radio {
    /// Decode one `GET_RADIO` reply.
    pub fn parse(data: &[u8]) -> Result<Self> {
        RADIO_POLICY.validate(data)?;

        let mut id = None;
        let mut edges = Vec::new();
        for (attr_type, payload) in AttrIter::new(data) {
            match attr_type {
                t if t == HwsimAttr::RadioId as u16 => id = Some(get::u32_ne(payload)?),
                t if t == HwsimAttr::RadioEdges as u16 => {
                    for (_, edge) in AttrIter::new(payload) {
                        edges.push(Edge::parse(edge)?);
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            id: RADIO_POLICY.require(HwsimAttr::RadioId as u16, id)?,
            edges,
        })
    }

    /// Copy of this radio without `idx`, or `None` if it is `idx` itself.
    ///
    /// Hides one radio from a topology, typically the one a monitor
    /// interface is attached to.
    pub fn without(&self, idx: u32) -> Option<Self> {
        if self.id == idx {
            return None;
        }
        Some(Self {
            id: self.id,
            edges: self.edges.iter().copied().filter(|e| e.endpoint != idx).collect(),
        })
    }
}
