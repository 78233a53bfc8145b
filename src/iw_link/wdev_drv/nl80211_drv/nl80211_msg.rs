//! Construction of nl80211 requests.
//!
//! A [`Request`] is a command plus an ordered attribute stream. It is built
//! with [`RequestBuilder`], whose appending methods consume and return the
//! builder: when an attribute does not fit the builder is dropped together
//! with everything appended so far, so a half written request can never reach
//! a socket.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::nl80211_attr::{AttrSet, AttrTree, NLA_HDRLEN};
use super::nl80211_const::{
    Nl80211Attribute, Nl80211ChannelType, Nl80211Command, Nl80211Iftype,
    Nl80211MntrFlag,
};
use crate::error::{Error, Result};
use crate::iw_link::wdev_drv::InterfaceIndex;

/// Attribute capacity of a request when none is configured.
pub const DEFAULT_MSG_CAPACITY: usize = 4096;

/// Monitor mode behaviour flags selectable by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorFlag {
    /// Placeholder, contributes nothing to the flag set.
    None,
    FcsFail,
    PlcpFail,
    Control,
    OtherBss,
    CookFrames,
}

impl MonitorFlag {
    /// The nl80211 flag, or `None` for [`MonitorFlag::None`].
    fn to_nl80211(self) -> Option<Nl80211MntrFlag> {
        match self {
            MonitorFlag::None => None,
            MonitorFlag::FcsFail => Some(Nl80211MntrFlag::FcsFail),
            MonitorFlag::PlcpFail => Some(Nl80211MntrFlag::PlcpFail),
            MonitorFlag::Control => Some(Nl80211MntrFlag::Control),
            MonitorFlag::OtherBss => Some(Nl80211MntrFlag::OtherBss),
            MonitorFlag::CookFrames => Some(Nl80211MntrFlag::CookFrames),
        }
    }
}

impl std::str::FromStr for MonitorFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(MonitorFlag::None),
            "fcsfail" => Ok(MonitorFlag::FcsFail),
            "plcpfail" => Ok(MonitorFlag::PlcpFail),
            "control" => Ok(MonitorFlag::Control),
            "otherbss" => Ok(MonitorFlag::OtherBss),
            "cookframes" => Ok(MonitorFlag::CookFrames),
            other => {
                Err(Error::InvalidArgument(format!("unknown monitor flag {}", other)))
            }
        }
    }
}

/// Channel width / bonding mode of a channel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelWidthMode {
    NoHt = 0,
    Ht20 = 1,
    Ht40Plus = 2,
    Ht40Minus = 3,
}

impl ChannelWidthMode {
    fn to_nl80211(self) -> Nl80211ChannelType {
        match self {
            ChannelWidthMode::NoHt => Nl80211ChannelType::NoHt,
            ChannelWidthMode::Ht20 => Nl80211ChannelType::Ht20,
            ChannelWidthMode::Ht40Plus => Nl80211ChannelType::Ht40Plus,
            ChannelWidthMode::Ht40Minus => Nl80211ChannelType::Ht40Minus,
        }
    }
}

impl TryFrom<u32> for ChannelWidthMode {
    type Error = Error;

    fn try_from(mode: u32) -> Result<Self> {
        match mode {
            0 => Ok(ChannelWidthMode::NoHt),
            1 => Ok(ChannelWidthMode::Ht20),
            2 => Ok(ChannelWidthMode::Ht40Plus),
            3 => Ok(ChannelWidthMode::Ht40Minus),
            _ => Err(Error::InvalidArgument(format!(
                "invalid channel mode {}",
                mode
            ))),
        }
    }
}

impl fmt::Display for ChannelWidthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelWidthMode::NoHt => "NOHT",
            ChannelWidthMode::Ht20 => "HT20",
            ChannelWidthMode::Ht40Plus => "HT40+",
            ChannelWidthMode::Ht40Minus => "HT40-",
        };
        write!(f, "{}", name)
    }
}

/// A complete nl80211 request, ready to be sent once.
#[derive(Debug, PartialEq)]
pub struct Request {
    cmd: Nl80211Command,
    dump: bool,
    attrs: AttrSet,
}

impl Request {
    pub fn cmd(&self) -> &Nl80211Command {
        &self.cmd
    }

    /// Whether the reply spans several messages ended by a done marker.
    pub fn is_dump(&self) -> bool {
        self.dump
    }

    /// Decoding view over the request attributes.
    pub fn attrs(&self) -> AttrTree<'_> {
        self.attrs.tree()
    }

    /// The target interface, if the request names one.
    pub fn ifindex(&self) -> Option<InterfaceIndex> {
        self.attrs()
            .get(Nl80211Attribute::Ifindex.into())
            .and_then(|attr| attr.as_u32())
            .map(InterfaceIndex)
    }
}

/// Incremental builder of a [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    cmd: Nl80211Command,
    dump: bool,
    attrs: AttrSet,
}

impl RequestBuilder {
    /// Starts a request for `cmd` with the default attribute capacity.
    pub fn new(cmd: Nl80211Command) -> Self {
        Self::with_capacity(cmd, DEFAULT_MSG_CAPACITY)
    }

    /// Starts a request for `cmd` whose attributes may use `capacity` bytes.
    pub fn with_capacity(cmd: Nl80211Command, capacity: usize) -> Self {
        Self { cmd, dump: false, attrs: AttrSet::with_capacity(capacity) }
    }

    /// Marks the request as a dump.
    pub fn dump(mut self) -> Self {
        self.dump = true;
        self
    }

    pub fn ifindex(mut self, ifindex: InterfaceIndex) -> Result<Self> {
        self.attrs.put_u32(Nl80211Attribute::Ifindex.into(), ifindex.into())?;
        Ok(self)
    }

    pub fn iftype(mut self, iftype: Nl80211Iftype) -> Result<Self> {
        self.attrs.put_u32(Nl80211Attribute::Iftype.into(), iftype.into())?;
        Ok(self)
    }

    pub fn ifname(mut self, name: &str) -> Result<Self> {
        self.attrs.put_str(Nl80211Attribute::Ifname.into(), name)?;
        Ok(self)
    }

    /// Sets the operating frequency in MHz.
    pub fn frequency(mut self, freq: u32) -> Result<Self> {
        self.attrs.put_u32(Nl80211Attribute::WiphyFreq.into(), freq)?;
        Ok(self)
    }

    pub fn channel_width(mut self, mode: ChannelWidthMode) -> Result<Self> {
        self.attrs.put_u32(
            Nl80211Attribute::WiphyChannelType.into(),
            mode.to_nl80211().into(),
        )?;
        Ok(self)
    }

    /// Attaches the monitor flags as one nested attribute. `MonitorFlag::None`
    /// entries are skipped, an empty or all-`None` list still attaches an
    /// empty flag set.
    pub fn monitor_flags(mut self, flags: &[MonitorFlag]) -> Result<Self> {
        let mut nested = AttrSet::with_capacity(self.nested_room());

        for flag in flags.iter().filter_map(|flag| flag.to_nl80211()) {
            nested.put_flag(flag.into())?;
        }

        self.attrs.put_nested(Nl80211Attribute::MntrFlags.into(), &nested)?;
        Ok(self)
    }

    /// Finishes the request.
    pub fn build(self) -> Request {
        debug!(
            "Built {:?} request, dump: {}, {} attribute bytes",
            self.cmd,
            self.dump,
            self.attrs.len()
        );
        Request { cmd: self.cmd, dump: self.dump, attrs: self.attrs }
    }

    /// Bytes left for a nested payload once its own header is accounted for.
    fn nested_room(&self) -> usize {
        self.attrs.capacity().saturating_sub(self.attrs.len() + NLA_HDRLEN)
    }
}
