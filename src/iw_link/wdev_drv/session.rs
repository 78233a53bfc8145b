//! A `Session` owns one connected transport and drives the two request/reply
//! protocols of nl80211:
//!
//! - acknowledged requests, where the kernel answers with an ack or an error;
//! - dumps, where the kernel streams data messages until a done marker, or
//!   an error in the middle of the stream.
//!
//! The socket is released when the session is dropped, on every exit path.
//! A session may be kept and reused across many requests; it must not be
//! shared between concurrent callers.

use log::{debug, error, trace, warn};

use super::{AttrTree, Connector, Reply, Request, Transport};
use crate::error::{Error, Result};

/// Progress of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpState {
    Pending,
    Finished,
    Failed(i32),
}

impl DumpState {
    fn on_reply(self, reply: &Reply) -> Self {
        match (self, reply) {
            (DumpState::Pending, Reply::Row(_)) => DumpState::Pending,
            (DumpState::Pending, Reply::Done | Reply::Ack) => DumpState::Finished,
            (DumpState::Pending, Reply::Error(code)) => DumpState::Failed(*code),
            (state, _) => state,
        }
    }
}

/// An open nl80211 session.
pub struct Session<L: Transport> {
    link: L,
    max_dump_messages: Option<usize>,
}

impl<L: Transport> Session<L> {
    /// Opens a session through `connector`, resolving `family`.
    ///
    /// `if_name` only labels the session in logs, the socket is not bound to
    /// an interface.
    pub fn connect<C>(connector: &C, if_name: &str, family: &str) -> Result<Self>
    where
        C: Connector<Link = L>,
    {
        debug!("Opening {} session for interface {}", family, if_name);
        let link = connector.connect(family).map_err(|e| {
            error!("Failed to open {} session for {}: {}", family, if_name, e);
            e
        })?;
        Ok(Self::from_link(link))
    }

    /// Wraps an already connected transport.
    pub fn from_link(link: L) -> Self {
        Self { link, max_dump_messages: None }
    }

    /// Bounds the number of replies a dump may take, `None` waits forever.
    pub fn with_dump_limit(mut self, limit: Option<usize>) -> Self {
        self.max_dump_messages = limit;
        self
    }

    /// Sends `req` and blocks until the kernel acknowledges it.
    ///
    /// # Errors
    ///
    /// - `KernelRejected` with the kernel's status code verbatim.
    /// - `Io` if the socket fails or the reply ends without an ack.
    pub fn send_and_wait_ack(&mut self, req: Request) -> Result<()> {
        self.link.send(&req)?;
        debug!("Sent {:?}, waiting for ack", req.cmd());

        loop {
            match self.link.recv()? {
                Reply::Ack => return Ok(()),
                Reply::Error(code) => {
                    error!("{:?} rejected by the kernel, err {}", req.cmd(), code);
                    return Err(Error::kernel_rejected(
                        code,
                        &format!("{:?} request rejected", req.cmd()),
                    ));
                }
                Reply::Row(attrs) => {
                    trace!("Ignoring {} byte data reply before ack", attrs.len());
                }
                Reply::Done => {
                    error!("Done marker while waiting for ack of {:?}", req.cmd());
                    return Err(Error::Io(format!(
                        "{:?} request ended without an ack",
                        req.cmd()
                    )));
                }
            }
        }
    }

    /// Sends the dump request `req` and feeds every data reply to `on_row`
    /// until the dump completes.
    ///
    /// A failing `on_row` does not stop the receive loop, the remaining
    /// replies are drained so the session stays usable, and the first row
    /// error is returned once the dump has finished.
    ///
    /// # Errors
    ///
    /// - `KernelRejected` if the kernel reports an error mid-dump.
    /// - `Io` if the socket fails or the configured reply limit is exceeded.
    pub fn send_and_collect<F>(&mut self, req: Request, mut on_row: F) -> Result<()>
    where
        F: FnMut(AttrTree<'_>) -> Result<()>,
    {
        self.link.send(&req)?;
        debug!("Sent {:?} dump", req.cmd());

        let mut state = DumpState::Pending;
        let mut received = 0usize;
        let mut row_error = None;

        while state == DumpState::Pending {
            if let Some(limit) = self.max_dump_messages {
                if received >= limit {
                    error!("Dump of {:?} exceeded {} replies", req.cmd(), limit);
                    return Err(Error::Io(format!(
                        "dump did not complete within {} replies",
                        limit
                    )));
                }
            }

            let reply = self.link.recv()?;
            received += 1;

            if let Reply::Row(attrs) = &reply {
                if row_error.is_none() {
                    if let Err(e) = on_row(AttrTree::new(attrs)) {
                        warn!("Dump row handler failed: {}", e);
                        row_error = Some(e);
                    }
                }
            }

            state = state.on_reply(&reply);
        }

        debug!("Dump of {:?} ended after {} replies: {:?}", req.cmd(), received, state);

        match state {
            DumpState::Finished => row_error.map_or(Ok(()), Err),
            DumpState::Failed(code) => {
                error!("{:?} dump failed, err {}", req.cmd(), code);
                Err(Error::kernel_rejected(code, &format!("{:?} dump failed", req.cmd())))
            }
            DumpState::Pending => Err(Error::Io("dump ended while pending".to_string())),
        }
    }

    /// Closes the session.
    pub fn disconnect(self) {
        drop(self);
    }
}

impl<L: Transport> Drop for Session<L> {
    fn drop(&mut self) {
        debug!("Releasing nl80211 session");
    }
}
