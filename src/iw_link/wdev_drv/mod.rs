//! This module defines the traits that sit between the monitor interface
//! operations and the kernel.
//!
//! - `Transport`: one connected, family-resolved control socket able to send a
//!   request and hand back replies one at a time.
//! - `Connector`: opens a `Transport`. The netlink implementation is chosen
//!   here once, every operation goes through it.
//! - `NetDevQuery`: interface existence and parent radio lookups, answered
//!   outside of nl80211.

mod interface_index;
mod nl80211_drv;
mod session;
mod sysfs;

pub use interface_index::InterfaceIndex;
pub use nl80211_drv::{
    ChannelBlock, ChannelWidthMode, MonitorFlag, NlConnector, NlLink, Request,
    RequestBuilder, DEFAULT_MSG_CAPACITY, NL80211_GENL_NAME,
};
pub use session::Session;
pub use sysfs::SysfsNetDev;

pub(crate) use nl80211_drv::{
    collect_channels, AttrTree, Nl80211Command, Nl80211Iftype,
};
#[cfg(test)]
pub(crate) use nl80211_drv::{
    AttrSet, Nl80211Attribute, Nl80211BandAttr, Nl80211FrequencyAttr,
};

#[cfg(test)]
use mockall::automock;

use crate::error::Result;

/// One reply read from the control socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A data message, holding its encoded attribute stream.
    Row(Vec<u8>),
    /// Positive acknowledgment of the last request.
    Ack,
    /// Error notification carrying the kernel's negative status code.
    Error(i32),
    /// End of a multi-part dump.
    Done,
}

/// A connected control socket bound to the nl80211 family.
#[cfg_attr(test, automock)]
pub trait Transport {
    /// Writes the request to the socket.
    fn send(&mut self, req: &Request) -> Result<()>;

    /// Blocks until the next reply is available.
    fn recv(&mut self) -> Result<Reply>;
}

/// Opens transports. Implementations allocate the socket, connect it and
/// resolve the generic netlink family by name.
#[cfg_attr(test, automock(type Link = MockTransport;))]
pub trait Connector {
    type Link: Transport;

    /// Whether this connector can reach the kernel at all. When it cannot,
    /// operations fail with `Unsupported` before any lookup or socket I/O.
    fn is_supported(&self) -> bool;

    /// Connects and resolves `family`.
    ///
    /// # Errors
    ///
    /// - `Unsupported` if netlink support was not compiled in.
    /// - `Connect` if the socket cannot be allocated or connected.
    /// - `FamilyNotFound` if the kernel does not know `family`.
    fn connect(&self, family: &str) -> Result<Self::Link>;
}

/// Interface lookups that do not go through nl80211.
#[cfg_attr(test, automock)]
pub trait NetDevQuery {
    /// Returns the index of the interface, `None` if it does not exist.
    fn if_index(&self, if_name: &str) -> Option<InterfaceIndex>;

    /// Returns the name of the radio backing the interface, `None` if the
    /// interface does not exist or is not an nl80211 device.
    fn find_parent_radio(&self, if_name: &str) -> Option<String>;
}
