//! This module contains the netlink side of the nl80211 driver.
//!
//! - `nl80211_const`: command and attribute numbers.
//! - `nl80211_attr`: attribute stream encoding and lazy decoding.
//! - `nl80211_msg`: request construction.
//! - `nl80211_parser`: extraction of channel lists from wiphy dumps.
//!
//! `NlConnector` and `NlLink` put requests on a generic netlink socket with
//! the `neli` crate and turn whatever comes back into [`Reply`] values. They
//! are the only place in the crate touching a real socket.

mod nl80211_attr;
mod nl80211_const;
mod nl80211_msg;
mod nl80211_parser;

pub use nl80211_attr::{AttrSet, AttrTree};
pub use nl80211_const::{
    Nl80211Attribute, Nl80211Command, Nl80211Iftype, NL80211_GENL_NAME,
};
#[cfg(test)]
pub use nl80211_const::{Nl80211BandAttr, Nl80211FrequencyAttr};
pub use nl80211_msg::{
    ChannelWidthMode, MonitorFlag, Request, RequestBuilder, DEFAULT_MSG_CAPACITY,
};
pub use nl80211_parser::{collect_channels, ChannelBlock};

use log::{debug, error, trace};
use neli::{
    consts::{
        nl::{NlmF, NlmFFlags, Nlmsg},
        socket::NlFamily,
    },
    err::NlError,
    genl::{Genlmsghdr, Nlattr},
    nl::{NlPayload, Nlmsghdr},
    socket::NlSocketHandle,
    types::{Buffer, GenlBuffer},
};

use super::{Connector, Reply, Transport};
use crate::error::{Error, Result};

type Nl80211Msg = Nlmsghdr<u16, Genlmsghdr<Nl80211Command, Nl80211Attribute>>;

/// Opens generic netlink sockets resolved to the nl80211 family.
#[derive(Debug, Default, Clone, Copy)]
pub struct NlConnector;

impl Connector for NlConnector {
    type Link = NlLink;

    fn is_supported(&self) -> bool {
        cfg!(feature = "netlink")
    }

    #[cfg(feature = "netlink")]
    fn connect(&self, family: &str) -> Result<NlLink> {
        let mut sock = NlSocketHandle::connect(
            NlFamily::Generic, /* family */
            Some(0),           /* pid */
            &[],               /* groups */
        )
        .map_err(|e| {
            error!("Failed to connect generic netlink socket: {}", e);
            Error::Connect(e.to_string())
        })?;

        let family_id = sock.resolve_genl_family(family).map_err(|e| {
            error!("Failed to resolve generic netlink family {}: {}", family, e);
            Error::FamilyNotFound(family.to_string())
        })?;

        debug!("Resolved {} to family id {}", family, family_id);

        Ok(NlLink { sock, family_id, seq: 0 })
    }

    #[cfg(not(feature = "netlink"))]
    fn connect(&self, family: &str) -> Result<NlLink> {
        error!("Cannot open {} session, netlink support not built", family);
        Err(Error::Unsupported(family.to_string()))
    }
}

/// A connected generic netlink socket with its resolved family id.
pub struct NlLink {
    sock: NlSocketHandle,
    family_id: u16,
    seq: u32,
}

impl NlLink {
    /// Converts the encoded request attributes into neli attributes.
    fn genl_attrs(req: &Request) -> Result<GenlBuffer<Nl80211Attribute, Buffer>> {
        let mut attrs = GenlBuffer::new();

        for attr in req.attrs().iter() {
            let nlattr = Nlattr::new(
                false,
                false,
                Nl80211Attribute::from(attr.kind()),
                attr.payload().to_vec(),
            )
            .map_err(|e| {
                error!("Failed to serialize attribute {}: {}", attr.kind(), e);
                Error::ProtocolBuild(e.to_string())
            })?;

            attrs.push(nlattr);
        }

        Ok(attrs)
    }

    /// Re-encodes the attributes of a data message into a raw stream.
    fn row_bytes(genl: &Genlmsghdr<Nl80211Command, Nl80211Attribute>) -> Result<Vec<u8>> {
        let mut row = AttrSet::with_capacity(usize::MAX);

        for attr in genl.get_attr_handle().iter() {
            row.put_raw(u16::from(attr.nla_type.nla_type), attr.nla_payload.as_ref())?;
        }

        Ok(row.into_bytes())
    }
}

impl Transport for NlLink {
    fn send(&mut self, req: &Request) -> Result<()> {
        self.seq = self.seq.wrapping_add(1);

        let flags = if req.is_dump() {
            NlmFFlags::new(&[NlmF::Request, NlmF::Dump])
        } else {
            NlmFFlags::new(&[NlmF::Request, NlmF::Ack])
        };

        let payload = NlPayload::Payload(Genlmsghdr::new(
            req.cmd().clone(),
            0,
            Self::genl_attrs(req)?,
        ));

        let msg: Nl80211Msg = Nlmsghdr::new(
            None,
            self.family_id,
            flags,
            Some(self.seq),
            Some(0),
            payload,
        );

        trace!("Sending {:?} seq {}", req.cmd(), self.seq);

        self.sock.send(msg).map_err(|e| {
            error!("Failed to send {:?}: {}", req.cmd(), e);
            Error::Io(e.to_string())
        })
    }

    fn recv(&mut self) -> Result<Reply> {
        loop {
            let msg: Nl80211Msg = match self.sock.recv() {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    error!("Netlink socket closed while waiting for a reply");
                    return Err(Error::Io("no reply from netlink socket".into()));
                }
                Err(NlError::Nlmsgerr(e)) => return Ok(Reply::Error(e.error)),
                Err(e) => {
                    error!("Failed to receive netlink reply: {}", e);
                    return Err(Error::Io(e.to_string()));
                }
            };

            if msg.nl_type == u16::from(Nlmsg::Done) {
                return Ok(Reply::Done);
            }

            match msg.nl_payload {
                NlPayload::Ack(_) => return Ok(Reply::Ack),
                NlPayload::Err(e) if e.error == 0 => return Ok(Reply::Ack),
                NlPayload::Err(e) => return Ok(Reply::Error(e.error)),
                NlPayload::Payload(genl) => {
                    return Self::row_bytes(&genl).map(Reply::Row);
                }
                _ => trace!("Skipping netlink message of type {}", msg.nl_type),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_support_follows_build_feature() {
        init_logger();
        assert_eq!(NlConnector.is_supported(), cfg!(feature = "netlink"));
    }

    #[cfg(not(feature = "netlink"))]
    #[test]
    fn test_connect_without_netlink() {
        init_logger();
        let result = NlConnector.connect(NL80211_GENL_NAME);

        assert!(matches!(result, Err(Error::Unsupported(_))));
    }
}
