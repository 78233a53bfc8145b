//! This module provides the monitor interface operations.
//!
//! The main components are:
//! - `IwLinkHandler` trait: the four operations callers use (create a monitor
//!   interface, set its monitor flags, tune its channel, list its channels).
//! - `IwLink` struct: implements them over a `Connector` to reach nl80211 and
//!   a `NetDevQuery` to look interfaces up.
//! - `wdev_drv` module: transports, sessions and the nl80211 codec.
//!
//! Every operation opens its own session and releases it before returning.
//! Channel hopping loops can keep one session open with
//! [`IwLink::open_session`] and [`IwLink::set_channel_with_session`].

pub mod wdev_drv;

use log::{debug, error, info};

pub use wdev_drv::{
    ChannelBlock, ChannelWidthMode, Connector, InterfaceIndex, MonitorFlag,
    NetDevQuery, NlConnector, Session, SysfsNetDev, Transport,
    DEFAULT_MSG_CAPACITY, NL80211_GENL_NAME,
};
use wdev_drv::{collect_channels, Nl80211Command, Nl80211Iftype, RequestBuilder};

use crate::channel::channel_to_frequency;
use crate::config::ControlConfig;
use crate::error::{Error, Result};

#[cfg(test)]
use mockall::automock;

/// Monitor interface operations.
#[cfg_attr(test, automock)]
pub trait IwLinkHandler {
    /// Creates the monitor interface `new_name` on the radio behind `parent`.
    ///
    /// Succeeds without touching the kernel if `new_name` already exists.
    ///
    /// # Errors
    ///
    /// - `Unsupported` if netlink support is not built in, before any lookup.
    /// - `NoInterface` if `parent` does not exist.
    /// - `PostconditionFailed` if the kernel acknowledged the request but the
    ///   interface did not appear.
    fn create_vap(&self, parent: &str, new_name: &str) -> Result<()>;

    /// Switches `if_name` to monitor mode with the given flags.
    /// `MonitorFlag::None` entries are ignored.
    fn set_monitor_flags(&self, if_name: &str, flags: &[MonitorFlag]) -> Result<()>;

    /// Tunes the radio behind `if_name` to `channel`.
    ///
    /// # Arguments
    ///
    /// * `channel` - IEEE 802.11 channel number.
    /// * `mode` - Channel width, 0 NOHT, 1 HT20, 2 HT40+, 3 HT40-.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a mode outside `0..=3`, before any I/O.
    fn set_channel(&self, if_name: &str, channel: u32, mode: u32) -> Result<()>;

    /// Lists the enabled channels of the radio behind `if_name`.
    ///
    /// # Errors
    ///
    /// - `NoInterface` if the interface does not exist.
    /// - `NotNl80211` if it exists but is not a wireless device.
    fn get_channel_list(&self, if_name: &str) -> Result<ChannelBlock>;
}

/// Monitor interface operations over a connector and a device lookup.
pub struct IwLink<C: Connector, N: NetDevQuery> {
    connector: C,
    netdev: N,
    config: ControlConfig,
}

impl<C: Connector, N: NetDevQuery> IwLink<C, N> {
    /// Creates a new `IwLink` with the default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use iw_monitor_ctl::{IwLink, NlConnector, SysfsNetDev};
    ///
    /// let iw_link = IwLink::new(NlConnector, SysfsNetDev::default());
    /// ```
    pub fn new(connector: C, netdev: N) -> Self {
        Self::with_config(connector, netdev, ControlConfig::default())
    }

    pub fn with_config(connector: C, netdev: N, config: ControlConfig) -> Self {
        Self { connector, netdev, config }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Opens a session that can be reused across many requests.
    pub fn open_session(&self, if_name: &str) -> Result<Session<C::Link>> {
        self.ensure_supported()?;
        let session =
            Session::connect(&self.connector, if_name, &self.config.family_name)?;
        Ok(session.with_dump_limit(self.config.max_dump_messages))
    }

    /// Like [`IwLinkHandler::set_channel`], over an already open session.
    ///
    /// The session stays open whatever the outcome.
    pub fn set_channel_with_session(
        &self, session: &mut Session<C::Link>, if_name: &str, channel: u32,
        mode: u32,
    ) -> Result<()> {
        let mode = ChannelWidthMode::try_from(mode).map_err(|e| {
            error!("Rejecting channel change of {}: {}", if_name, e);
            e
        })?;
        let ifindex = self.require_ifindex(if_name)?;
        let freq = channel_to_frequency(channel);

        let req = self
            .request(Nl80211Command::SetWiPhy)
            .ifindex(ifindex)?
            .frequency(freq)?
            .channel_width(mode)?
            .build();

        session.send_and_wait_ack(req).map_err(|e| {
            error!("Failed to set channel {} on {}: {}", channel, if_name, e);
            e
        })?;

        info!("Set {} to channel {} ({} MHz, {})", if_name, channel, freq, mode);

        Ok(())
    }

    /// Fails with `Unsupported` when the connector cannot reach nl80211.
    fn ensure_supported(&self) -> Result<()> {
        if self.connector.is_supported() {
            return Ok(());
        }

        error!("Not compiled with netlink/nl80211 support");
        Err(Error::Unsupported(self.config.family_name.clone()))
    }

    fn request(&self, cmd: Nl80211Command) -> RequestBuilder {
        RequestBuilder::with_capacity(cmd, self.config.max_message_size)
    }

    fn require_ifindex(&self, if_name: &str) -> Result<InterfaceIndex> {
        self.netdev.if_index(if_name).ok_or_else(|| {
            error!("Interface {} doesn't exist", if_name);
            Error::NoInterface(if_name.to_string())
        })
    }
}

impl<C: Connector, N: NetDevQuery> IwLinkHandler for IwLink<C, N> {
    fn create_vap(&self, parent: &str, new_name: &str) -> Result<()> {
        self.ensure_supported()?;

        if self.netdev.if_index(new_name).is_some() {
            debug!("Interface {} already exists, nothing to create", new_name);
            return Ok(());
        }

        let parent_idx = self.require_ifindex(parent)?;

        let req = self
            .request(Nl80211Command::NewInterface)
            .ifindex(parent_idx)?
            .ifname(new_name)?
            .iftype(Nl80211Iftype::IftypeMonitor)?
            .build();

        {
            let mut session = self.open_session(parent)?;
            session.send_and_wait_ack(req).map_err(|e| {
                error!("Failed to create {} on {}: {}", new_name, parent, e);
                e
            })?;
        }

        if self.netdev.if_index(new_name).is_none() {
            error!("Kernel acknowledged {} but the interface is missing", new_name);
            return Err(Error::PostconditionFailed(format!(
                "failed to create interface {}, it does not exist after creation",
                new_name
            )));
        }

        info!("Created monitor interface {} on {}", new_name, parent);

        Ok(())
    }

    fn set_monitor_flags(&self, if_name: &str, flags: &[MonitorFlag]) -> Result<()> {
        self.ensure_supported()?;
        let ifindex = self.require_ifindex(if_name)?;

        let req = self
            .request(Nl80211Command::SetInterface)
            .ifindex(ifindex)?
            .iftype(Nl80211Iftype::IftypeMonitor)?
            .monitor_flags(flags)?
            .build();

        let mut session = self.open_session(if_name)?;
        session.send_and_wait_ack(req).map_err(|e| {
            error!("Failed to set monitor flags on {}: {}", if_name, e);
            e
        })?;

        info!("Set monitor flags {:?} on {}", flags, if_name);

        Ok(())
    }

    fn set_channel(&self, if_name: &str, channel: u32, mode: u32) -> Result<()> {
        self.ensure_supported()?;
        ChannelWidthMode::try_from(mode).map_err(|e| {
            error!("Rejecting channel change of {}: {}", if_name, e);
            e
        })?;
        self.require_ifindex(if_name)?;

        let mut session = self.open_session(if_name)?;
        self.set_channel_with_session(&mut session, if_name, channel, mode)
    }

    fn get_channel_list(&self, if_name: &str) -> Result<ChannelBlock> {
        self.ensure_supported()?;

        let phy = match self.netdev.find_parent_radio(if_name) {
            Some(phy) => phy,
            None if self.netdev.if_index(if_name).is_none() => {
                error!("Interface {} doesn't exist", if_name);
                return Err(Error::NoInterface(if_name.to_string()));
            }
            None => {
                error!("Interface {} has no parent phy", if_name);
                return Err(Error::NotNl80211(if_name.to_string()));
            }
        };

        let req = self.request(Nl80211Command::GetWiPhy).dump().build();

        let mut block = ChannelBlock::new(&phy);
        let mut session = self.open_session(if_name)?;
        session
            .send_and_collect(req, |row| collect_channels(&mut block, row))
            .map_err(|e| {
                error!("Failed to get channel list of {}: {}", phy, e);
                e
            })?;

        info!("{} ({}) supports {} channels", if_name, phy, block.count());

        Ok(block)
    }
}
