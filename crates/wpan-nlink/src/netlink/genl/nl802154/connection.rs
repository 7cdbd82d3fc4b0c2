//! nl802154 connection bound to a resolved family.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio_stream::Stream;

use super::event::Nl802154Event;
use super::{NL802154_GENL_NAME, NL802154_VERSION, Nl802154Attr, Nl802154Cmd};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::Result;
use crate::netlink::genl::{GenlConnection, GenlMessage};

/// A generic netlink connection with the `nl802154` family resolved.
///
/// One connection carries every request of a command invocation, including
/// an abort sent while a scan is being watched.
pub struct Nl802154Connection {
    genl: GenlConnection,
    family_id: u16,
}

impl Nl802154Connection {
    /// Open a socket and resolve the family.
    pub async fn new() -> Result<Self> {
        Self::from_genl(GenlConnection::new()?).await
    }

    pub async fn from_genl(genl: GenlConnection) -> Result<Self> {
        let family_id = genl.get_family_id(NL802154_GENL_NAME).await?;
        Ok(Self { genl, family_id })
    }

    pub fn family_id(&self) -> u16 {
        self.family_id
    }

    pub fn genl(&self) -> &GenlConnection {
        &self.genl
    }

    /// Start a request for `cmd`. Dumps end with DONE, others with an ACK.
    pub fn new_request(&self, cmd: Nl802154Cmd, dump: bool) -> MessageBuilder {
        GenlConnection::new_request(self.family_id, cmd as u8, NL802154_VERSION, dump)
    }

    /// Start a request without a connection.
    ///
    /// Arguments can be encoded before any socket is opened;
    /// [`execute`](Self::execute) fills in the family id.
    pub fn request(cmd: Nl802154Cmd, dump: bool) -> MessageBuilder {
        GenlConnection::new_request(0, cmd as u8, NL802154_VERSION, dump)
    }

    /// Send a request and collect its replies.
    pub async fn execute(&self, mut builder: MessageBuilder) -> Result<Vec<GenlMessage>> {
        builder.set_msg_type(self.family_id);
        let replies = self.genl.execute(builder).await?;
        tracing::debug!(replies = replies.len(), "nl802154 request complete");
        Ok(replies)
    }

    /// Join one of the family's multicast groups.
    pub async fn subscribe(&mut self, group: &str) -> Result<()> {
        self.genl.subscribe(NL802154_GENL_NAME, group).await
    }

    /// Ask the kernel to stop the scan running on `ifindex`.
    pub async fn abort_scan(&self, ifindex: u32) -> Result<()> {
        let mut req = self.new_request(Nl802154Cmd::AbortScan, false);
        req.append_attr_u32(Nl802154Attr::Ifindex as u16, ifindex);
        self.execute(req).await?;
        Ok(())
    }

    fn poll_notification(&self, cx: &mut Context<'_>) -> Poll<Result<GenlMessage>> {
        loop {
            match self.genl.poll_notification(cx) {
                Poll::Ready(Ok(msg)) if msg.family != self.family_id => {
                    tracing::trace!(family = msg.family, "skipping foreign notification");
                }
                Poll::Ready(Ok(msg)) => {
                    tracing::debug!(cmd = msg.cmd, len = msg.attrs.len(), "nl802154 notification");
                    return Poll::Ready(Ok(msg));
                }
                other => return other,
            }
        }
    }

    /// Notifications that fail to decode are logged and skipped; only
    /// socket errors are returned.
    fn poll_event(&self, cx: &mut Context<'_>) -> Poll<Result<Nl802154Event>> {
        loop {
            match self.poll_notification(cx) {
                Poll::Ready(Ok(msg)) => {
                    if let Some(event) = Nl802154Event::decode(&msg) {
                        return Poll::Ready(Ok(event));
                    }
                }
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    /// Wait for the next raw notification of this family.
    pub async fn next_notification(&self) -> Result<GenlMessage> {
        std::future::poll_fn(|cx| self.poll_notification(cx)).await
    }

    /// Wait for the next notification from a joined group.
    pub async fn next_event(&self) -> Result<Nl802154Event> {
        std::future::poll_fn(|cx| self.poll_event(cx)).await
    }

    /// Notifications as a stream. The connection stays usable for requests.
    pub fn events(&self) -> EventStream<'_> {
        EventStream { conn: self }
    }
}

/// Stream of [`Nl802154Event`]s borrowed from a connection.
///
/// # Example
///
/// ```rust,no_run
/// use wpan_nlink::netlink::genl::nl802154::{MCAST_GROUP_CONFIG, Nl802154Connection};
/// use tokio_stream::StreamExt;
///
/// # async fn example() -> wpan_nlink::Result<()> {
/// let mut conn = Nl802154Connection::new().await?;
/// conn.subscribe(MCAST_GROUP_CONFIG).await?;
///
/// let mut events = conn.events();
/// while let Some(event) = events.try_next().await? {
///     println!("{:?}", event.kind);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EventStream<'a> {
    conn: &'a Nl802154Connection,
}

impl Stream for EventStream<'_> {
    type Item = Result<Nl802154Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.conn.poll_event(cx).map(Some)
    }
}
