//! Generic Netlink connection with family resolution.

use std::collections::{HashMap, VecDeque};
use std::future::poll_fn;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::task::{Context, Poll};

use super::header::{GenlMessage, GenlMsgHdr};
use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NlMsgError};
use crate::netlink::socket::{NetlinkSocket, Protocol};

/// Information about a Generic Netlink family.
#[derive(Debug, Clone)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Header size (additional bytes after genlmsghdr).
    pub hdr_size: u32,
    /// Maximum attribute number.
    pub max_attr: u32,
    /// Multicast groups: name -> group ID.
    pub mcast_groups: HashMap<String, u32>,
}

/// Cache for resolved family information.
#[derive(Debug, Default)]
struct FamilyCache {
    families: HashMap<String, FamilyInfo>,
}

/// Generic Netlink connection.
///
/// Provides family ID resolution and high-level GENL operations.
/// Family IDs are cached to avoid repeated kernel queries.
///
/// Multicast notifications that arrive while a request is waiting for its
/// reply are queued and handed out by [`GenlConnection::next_notification`],
/// so subscribing before sending a request never loses events.
///
/// # Example
///
/// ```rust,no_run
/// use wpan_nlink::netlink::genl::GenlConnection;
///
/// # async fn example() -> wpan_nlink::Result<()> {
/// let conn = GenlConnection::new()?;
///
/// // Get family info (cached after first call)
/// let family = conn.get_family("nl802154").await?;
/// println!("nl802154 family ID: {}", family.id);
/// # Ok(())
/// # }
/// ```
pub struct GenlConnection {
    socket: NetlinkSocket,
    cache: Arc<RwLock<FamilyCache>>,
    pending: Mutex<VecDeque<GenlMessage>>,
}

impl GenlConnection {
    /// Create a new Generic Netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self::from_socket(NetlinkSocket::new(Protocol::Generic)?))
    }

    /// Create a GENL connection from an existing socket.
    ///
    /// The socket must be a `Protocol::Generic` socket.
    pub fn from_socket(socket: NetlinkSocket) -> Self {
        Self {
            socket,
            cache: Arc::new(RwLock::new(FamilyCache::default())),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Get information about a Generic Netlink family.
    ///
    /// The result is cached, so subsequent calls for the same family
    /// do not require kernel communication.
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(info) = cache.families.get(name) {
                return Ok(info.clone());
            }
        }

        let info = self.query_family(name).await?;
        tracing::debug!(family = name, id = info.id, "resolved generic netlink family");

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .families
            .insert(name.to_string(), info.clone());

        Ok(info)
    }

    /// Get the family ID for a given family name.
    pub async fn get_family_id(&self, name: &str) -> Result<u16> {
        Ok(self.get_family(name).await?.id)
    }

    /// Resolve a multicast group exported by a family.
    pub async fn get_mcast_group(&self, family: &str, group: &str) -> Result<u32> {
        let info = self.get_family(family).await?;
        info.mcast_groups
            .get(group)
            .copied()
            .ok_or_else(|| Error::McastGroupNotFound {
                family: family.to_string(),
                group: group.to_string(),
            })
    }

    /// Join a family's multicast group by name.
    pub async fn subscribe(&mut self, family: &str, group: &str) -> Result<()> {
        let id = self.get_mcast_group(family, group).await?;
        self.socket.add_membership(id)?;
        tracing::debug!(family, group, id, "joined multicast group");
        Ok(())
    }

    /// Clear the family cache.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .families
            .clear();
    }

    async fn query_family(&self, name: &str) -> Result<FamilyInfo> {
        let replies = self
            .request(GENL_ID_CTRL, CtrlCmd::GetFamily as u8, 1, |b| {
                b.append_attr_str(CtrlAttr::FamilyName as u16, name);
            })
            .await
            .map_err(|e| {
                if e.errno() == Some(libc::ENOENT) {
                    Error::FamilyNotFound {
                        name: name.to_string(),
                    }
                } else {
                    e
                }
            })?;

        let reply = replies.first().ok_or_else(|| Error::FamilyNotFound {
            name: name.to_string(),
        })?;
        parse_family_attrs(&reply.attrs)
    }

    /// Start a request message: netlink header plus GENL header.
    ///
    /// Dump requests end with NLMSG_DONE; everything else asks for an ACK.
    pub fn new_request(family_id: u16, cmd: u8, version: u8, dump: bool) -> MessageBuilder {
        let flags = if dump {
            NLM_F_REQUEST | NLM_F_DUMP
        } else {
            NLM_F_REQUEST | NLM_F_ACK
        };
        let mut builder = MessageBuilder::new(family_id, flags);
        builder.append(&GenlMsgHdr::new(cmd, version));
        builder
    }

    /// Send a prepared request and collect every reply up to its ACK or DONE.
    pub async fn execute(&self, builder: MessageBuilder) -> Result<Vec<GenlMessage>> {
        Ok(self.execute_with_status(builder).await?.0)
    }

    /// Like [`execute`](Self::execute), but also return the status carried
    /// by the final ACK.
    ///
    /// Negative statuses are errors. Some families report a non-negative
    /// result there instead of in a reply message; `MAC802154_HWSIM` puts
    /// the index of a new radio in it. Dumps always yield 0.
    pub async fn execute_with_status(
        &self,
        mut builder: MessageBuilder,
    ) -> Result<(Vec<GenlMessage>, i32)> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());
        let msg = builder.try_finish()?;

        tracing::trace!(seq, len = msg.len(), "sending generic netlink request");
        self.socket.send(&msg).await?;

        let mut replies = Vec::new();
        loop {
            let data = self.socket.recv_msg().await?;
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(status) = split_batch(&data, seq, &mut replies, &mut pending)? {
                return Ok((replies, status));
            }
        }
    }

    /// Send a GENL command and wait for its ACK.
    pub async fn request(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<GenlMessage>> {
        let mut builder = Self::new_request(family_id, cmd, version, false);
        build_attrs(&mut builder);
        self.execute(builder).await
    }

    /// Send a GENL dump command and collect all responses.
    pub async fn dump(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<GenlMessage>> {
        let mut builder = Self::new_request(family_id, cmd, version, true);
        build_attrs(&mut builder);
        self.execute(builder).await
    }

    /// Poll for the next multicast notification.
    pub fn poll_notification(&self, cx: &mut Context<'_>) -> Poll<Result<GenlMessage>> {
        loop {
            {
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(msg) = pending.pop_front() {
                    return Poll::Ready(Ok(msg));
                }
            }

            let data = match self.socket.poll_recv(cx) {
                Poll::Ready(Ok(data)) => data,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let mut stray = Vec::new();
            if let Err(e) = split_batch(&data, 0, &mut stray, &mut pending) {
                return Poll::Ready(Err(e));
            }
        }
    }

    /// Wait for the next multicast notification.
    pub async fn next_notification(&self) -> Result<GenlMessage> {
        poll_fn(|cx| self.poll_notification(cx)).await
    }
}

/// Sort one received datagram into replies for `seq` and notifications.
///
/// Returns the final status once the exchange for `seq` is finished. With
/// `seq == 0` only notifications are collected and the result is always
/// `None`.
fn split_batch(
    data: &[u8],
    seq: u32,
    replies: &mut Vec<GenlMessage>,
    notifications: &mut VecDeque<GenlMessage>,
) -> Result<Option<i32>> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.is_notification() {
            if header.is_error() || header.is_done() {
                continue;
            }
            notifications.push_back(GenlMessage::parse(header, payload)?);
            continue;
        }

        if seq == 0 || header.nlmsg_seq != seq {
            tracing::trace!(seq = header.nlmsg_seq, "dropping stray reply");
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            if err.error < 0 {
                return Err(Error::from_errno(err.error));
            }
            return Ok(Some(err.error));
        }

        if header.is_done() {
            if let Ok(code) = get::i32_ne(payload)
                && code < 0
            {
                return Err(Error::from_errno(code));
            }
            return Ok(Some(0));
        }

        replies.push(GenlMessage::parse(header, payload)?);
    }
    Ok(None)
}

/// Parse family attributes from a CTRL_CMD_GETFAMILY response.
fn parse_family_attrs(data: &[u8]) -> Result<FamilyInfo> {
    let mut id: Option<u16> = None;
    let mut version: u8 = 0;
    let mut hdr_size: u32 = 0;
    let mut max_attr: u32 = 0;
    let mut mcast_groups = HashMap::new();

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == CtrlAttr::FamilyId as u16 => {
                id = Some(get::u16_ne(payload)?);
            }
            t if t == CtrlAttr::Version as u16 => {
                version = get::u32_ne(payload)? as u8;
            }
            t if t == CtrlAttr::HdrSize as u16 => {
                hdr_size = get::u32_ne(payload)?;
            }
            t if t == CtrlAttr::MaxAttr as u16 => {
                max_attr = get::u32_ne(payload)?;
            }
            t if t == CtrlAttr::McastGroups as u16 => {
                mcast_groups = parse_mcast_groups(payload)?;
            }
            _ => {}
        }
    }

    let id = id.ok_or(Error::MissingAttribute {
        name: "CTRL_ATTR_FAMILY_ID",
    })?;

    Ok(FamilyInfo {
        id,
        version,
        hdr_size,
        max_attr,
        mcast_groups,
    })
}

/// Parse multicast groups from CTRL_ATTR_MCAST_GROUPS.
fn parse_mcast_groups(data: &[u8]) -> Result<HashMap<String, u32>> {
    let mut groups = HashMap::new();

    // Each entry is an indexed nest holding a name and an id
    for (_group_idx, group_payload) in AttrIter::new(data) {
        let mut name: Option<String> = None;
        let mut grp_id: Option<u32> = None;

        for (attr_type, payload) in AttrIter::new(group_payload) {
            match attr_type {
                t if t == CtrlAttrMcastGrp::Name as u16 => {
                    name = Some(get::string(payload)?.to_string());
                }
                t if t == CtrlAttrMcastGrp::Id as u16 => {
                    grp_id = Some(get::u32_ne(payload)?);
                }
                _ => {}
            }
        }

        if let (Some(name), Some(id)) = (name, grp_id) {
            groups.insert(name, id);
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::{NLMSG_HDRLEN, NlMsgHdr, NlMsgType};

    fn raw(ty: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut builder = MessageBuilder::new(ty, 0);
        builder.append_bytes(payload);
        builder.set_seq(seq);
        builder.finish()
    }

    fn genl(ty: u16, seq: u32, cmd: u8) -> Vec<u8> {
        raw(ty, seq, &[cmd, 1, 0, 0])
    }

    fn ack(seq: u32, errno: i32) -> Vec<u8> {
        let mut payload = errno.to_ne_bytes().to_vec();
        payload.extend_from_slice(NlMsgHdr::new(0x1a, 0).as_bytes());
        raw(NlMsgType::ERROR, seq, &payload)
    }

    #[test]
    fn test_split_collects_replies_until_ack() {
        let mut data = genl(0x1a, 5, 1);
        data.extend(genl(0x1a, 0, 34));
        data.extend(ack(5, 0));

        let mut replies = Vec::new();
        let mut notes = VecDeque::new();
        assert_eq!(split_batch(&data, 5, &mut replies, &mut notes).unwrap(), Some(0));
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].cmd, 1);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].cmd, 34);
    }

    #[test]
    fn test_split_reports_kernel_error() {
        let data = ack(9, -libc::EBUSY);
        let mut replies = Vec::new();
        let mut notes = VecDeque::new();
        let err = split_batch(&data, 9, &mut replies, &mut notes).unwrap_err();
        assert!(err.is_busy());
    }

    #[test]
    fn test_split_dump_done_with_error() {
        let data = raw(NlMsgType::DONE, 3, &(-libc::ENODEV).to_ne_bytes());
        let mut replies = Vec::new();
        let mut notes = VecDeque::new();
        let err = split_batch(&data, 3, &mut replies, &mut notes).unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENODEV));
    }

    #[test]
    fn test_split_dump_not_finished() {
        let mut data = genl(0x1a, 3, 1);
        data.extend(genl(0x1a, 3, 1));
        data.extend(genl(0x1a, 2, 1)); // stale
        let mut replies = Vec::new();
        let mut notes = VecDeque::new();
        assert_eq!(split_batch(&data, 3, &mut replies, &mut notes).unwrap(), None);
        assert_eq!(replies.len(), 2);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_split_positive_ack_status() {
        let data = ack(4, 3);
        let mut replies = Vec::new();
        let mut notes = VecDeque::new();
        assert_eq!(split_batch(&data, 4, &mut replies, &mut notes).unwrap(), Some(3));
        assert!(replies.is_empty());
    }

    #[test]
    fn test_parse_family_attrs() {
        let mut b = MessageBuilder::new(GENL_ID_CTRL, 0);
        b.append_attr_u16(CtrlAttr::FamilyId as u16, 0x1c);
        b.append_attr_u32(CtrlAttr::Version as u16, 1);
        let groups = b.nest_start(CtrlAttr::McastGroups as u16);
        let g1 = b.nest_start(1);
        b.append_attr_str(CtrlAttrMcastGrp::Name as u16, "config");
        b.append_attr_u32(CtrlAttrMcastGrp::Id as u16, 7);
        b.nest_end(g1);
        let g2 = b.nest_start(2);
        b.append_attr_str(CtrlAttrMcastGrp::Name as u16, "scan");
        b.append_attr_u32(CtrlAttrMcastGrp::Id as u16, 8);
        b.nest_end(g2);
        b.nest_end(groups);
        let msg = b.finish();

        let info = parse_family_attrs(&msg[NLMSG_HDRLEN..]).unwrap();
        assert_eq!(info.id, 0x1c);
        assert_eq!(info.version, 1);
        assert_eq!(info.mcast_groups.get("config"), Some(&7));
        assert_eq!(info.mcast_groups.get("scan"), Some(&8));
        assert!(!info.mcast_groups.contains_key("mlme"));
    }

    #[test]
    fn test_parse_family_missing_id() {
        let err = parse_family_attrs(&[]).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[test]
    fn test_new_request_flags() {
        let dump = GenlConnection::new_request(0x1c, 1, 1, true).finish();
        let hdr = NlMsgHdr::from_bytes(&dump).unwrap();
        assert_eq!(hdr.nlmsg_flags, NLM_F_REQUEST | NLM_F_DUMP);
        assert_eq!(dump[NLMSG_HDRLEN], 1);

        let ack = GenlConnection::new_request(0x1c, 9, 1, false).finish();
        let hdr = NlMsgHdr::from_bytes(&ack).unwrap();
        assert_eq!(hdr.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK);
    }
}
