//! `MAC802154_HWSIM` connection bound to a resolved family.

use super::radio::Radio;
use super::{EdgeAttr, HWSIM_GENL_NAME, HWSIM_VERSION, HwsimAttr, HwsimCmd};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::GenlConnection;

/// A generic netlink connection with the `MAC802154_HWSIM` family resolved.
pub struct HwsimConnection {
    genl: GenlConnection,
    family_id: u16,
}

impl HwsimConnection {
    /// Open a socket and resolve the family.
    ///
    /// Fails with [`Error::FamilyNotFound`] when the `mac802154_hwsim`
    /// module is not loaded.
    pub async fn new() -> Result<Self> {
        let genl = GenlConnection::new()?;
        let family_id = genl.get_family_id(HWSIM_GENL_NAME).await?;
        Ok(Self { genl, family_id })
    }

    pub fn family_id(&self) -> u16 {
        self.family_id
    }

    /// Start a request for `cmd` without a connection.
    pub fn request(cmd: HwsimCmd, dump: bool) -> MessageBuilder {
        GenlConnection::new_request(0, cmd as u8, HWSIM_VERSION, dump)
    }

    /// Encode a request on the edge from `idx` to `idx2`.
    ///
    /// The LQI is only meaningful for `SetEdge`.
    pub fn edge_request(cmd: HwsimCmd, idx: u32, idx2: u32, lqi: Option<u8>) -> MessageBuilder {
        let mut b = Self::request(cmd, false);
        b.append_attr_u32(HwsimAttr::RadioId as u16, idx);
        let edge = b.nest_start(HwsimAttr::RadioEdge as u16);
        b.append_attr_u32(EdgeAttr::EndpointId as u16, idx2);
        if let Some(lqi) = lqi {
            b.append_attr_u8(EdgeAttr::Lqi as u16, lqi);
        }
        b.nest_end(edge);
        b
    }

    async fn execute(&self, mut builder: MessageBuilder) -> Result<i32> {
        builder.set_msg_type(self.family_id);
        let (_, status) = self.genl.execute_with_status(builder).await?;
        Ok(status)
    }

    /// Create a radio and return its index.
    pub async fn new_radio(&self) -> Result<u32> {
        let status = self.execute(Self::request(HwsimCmd::NewRadio, false)).await?;
        let idx = u32::try_from(status).map_err(|_| Error::from_errno(status))?;
        tracing::debug!(idx, "created hwsim radio");
        Ok(idx)
    }

    /// Remove radio `idx`.
    pub async fn del_radio(&self, idx: u32) -> Result<()> {
        let mut req = Self::request(HwsimCmd::DelRadio, false);
        req.append_attr_u32(HwsimAttr::RadioId as u16, idx);
        self.execute(req).await?;
        Ok(())
    }

    /// Every radio with its edges.
    pub async fn radios(&self) -> Result<Vec<Radio>> {
        let mut req = Self::request(HwsimCmd::GetRadio, true);
        req.set_msg_type(self.family_id);
        let replies = self.genl.execute(req).await?;

        let mut radios = Vec::with_capacity(replies.len());
        for msg in &replies {
            match Radio::parse(&msg.attrs) {
                Ok(radio) => radios.push(radio),
                Err(e) => tracing::warn!(error = %e, "skipping malformed radio"),
            }
        }
        Ok(radios)
    }

    /// Let `idx2` hear frames sent by `idx`.
    pub async fn new_edge(&self, idx: u32, idx2: u32) -> Result<()> {
        self.execute(Self::edge_request(HwsimCmd::NewEdge, idx, idx2, None))
            .await?;
        Ok(())
    }

    /// Remove the edge from `idx` to `idx2`.
    pub async fn del_edge(&self, idx: u32, idx2: u32) -> Result<()> {
        self.execute(Self::edge_request(HwsimCmd::DelEdge, idx, idx2, None))
            .await?;
        Ok(())
    }

    /// Set the link quality of the edge from `idx` to `idx2`.
    pub async fn set_edge_lqi(&self, idx: u32, idx2: u32, lqi: u8) -> Result<()> {
        self.execute(Self::edge_request(HwsimCmd::SetEdge, idx, idx2, Some(lqi)))
            .await?;
        Ok(())
    }
}
