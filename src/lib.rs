//! Userspace control of Linux 802.11 monitor interfaces over nl80211.
//!
//! The crate creates monitor interfaces, sets their monitor flags, tunes
//! their channel and lists the channels their radio supports. All kernel
//! traffic goes through generic netlink.
//!
//! ```no_run
//! use iw_monitor_ctl::{IwLink, IwLinkHandler, NlConnector, SysfsNetDev};
//!
//! # fn main() -> iw_monitor_ctl::Result<()> {
//! let iw_link = IwLink::new(NlConnector, SysfsNetDev::default());
//! iw_link.create_vap("wlan0", "wlan0mon")?;
//! iw_link.set_channel("wlan0mon", 6, 0)?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod iw_link;

pub use channel::{channel_to_frequency, frequency_to_channel};
pub use config::ControlConfig;
pub use error::{Error, ErrorKind, Result};
pub use iw_link::{
    ChannelBlock, ChannelWidthMode, IwLink, IwLinkHandler, MonitorFlag,
    NlConnector, Session, SysfsNetDev,
};
