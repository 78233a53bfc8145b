//! This module provides constants for interacting with the nl80211
//! subsystem in the Linux kernel. Only the commands and attributes used to
//! manage monitor interfaces and channels are listed, values follow
//! `/usr/include/linux/nl80211.h`.

/// The generic netlink family name for nl80211.
pub const NL80211_GENL_NAME: &str = "nl80211";

/// Enum representing the nl80211 commands used by this crate.
#[neli::neli_enum(serialized_type = "u8")]
pub enum Nl80211Command {
    /// Unspecified command.
    Unspecified = 0,
    /// Get wireless physical device information, or dump all of them.
    GetWiPhy = 1,
    /// Set wiphy parameters such as the operating frequency.
    SetWiPhy = 2,
    /// Wiphy description, reply to `GetWiPhy`.
    NewWiPhy = 3,
    /// Set the type of a virtual interface.
    SetInterface = 6,
    /// Create a new virtual interface.
    NewInterface = 7,
}

/// Implement the `Cmd` trait for `Nl80211Command` to use it as a generic netlink command.
impl neli::consts::genl::Cmd for Nl80211Command {}

/// Enum representing the top level nl80211 attributes used by this crate.
#[neli::neli_enum(serialized_type = "u16")]
pub enum Nl80211Attribute {
    /// Unspecified attribute.
    Unspecified = 0,
    /// Index of the wireless physical device.
    Wiphy = 1,
    /// Name of the wireless physical device, e.g. `phy0`.
    WiphyName = 2,
    /// Network interface index.
    Ifindex = 3,
    /// Network interface name.
    Ifname = 4,
    /// Interface type, see `Nl80211Iftype`.
    Iftype = 5,
    /// Nested list of bands, each holding `Nl80211BandAttr` attributes.
    WiphyBands = 22,
    /// Nested set of `Nl80211MntrFlag` flags.
    MntrFlags = 23,
    /// Frequency in MHz.
    WiphyFreq = 38,
    /// Channel type, see `Nl80211ChannelType`.
    WiphyChannelType = 39,
}

/// Implement the `NlAttrType` trait for `Nl80211Attribute` to use it as a generic netlink attribute type.
impl neli::consts::genl::NlAttrType for Nl80211Attribute {}

/// Enum representing various nl80211 interface types.
#[neli::neli_enum(serialized_type = "u32")]
pub enum Nl80211Iftype {
    /// Unspecified interface type.
    IftypeUnspecified = 0,
    /// Ad-hoc network interface type.
    IftypeAdhoc = 1,
    /// Station (client) network interface type.
    IftypeStation = 2,
    /// Access point (AP) network interface type.
    IftypeAp = 3,
    /// Monitor interface type.
    IftypeMonitor = 6,
}

/// Attributes nested inside each entry of `Nl80211Attribute::WiphyBands`.
#[neli::neli_enum(serialized_type = "u16")]
pub enum Nl80211BandAttr {
    Invalid = 0,
    /// Nested list of frequencies, each holding `Nl80211FrequencyAttr` attributes.
    Freqs = 1,
    Rates = 2,
}

/// Attributes nested inside each entry of `Nl80211BandAttr::Freqs`.
#[neli::neli_enum(serialized_type = "u16")]
pub enum Nl80211FrequencyAttr {
    Invalid = 0,
    /// Frequency in MHz.
    Freq = 1,
    /// Flag, the channel is disabled by regulatory rules.
    Disabled = 2,
}

/// Monitor configuration flags nested inside `Nl80211Attribute::MntrFlags`.
#[neli::neli_enum(serialized_type = "u16")]
pub enum Nl80211MntrFlag {
    Invalid = 0,
    /// Pass frames with bad FCS.
    FcsFail = 1,
    /// Pass frames with bad PLCP.
    PlcpFail = 2,
    /// Pass control frames.
    Control = 3,
    /// Disable BSSID filtering.
    OtherBss = 4,
    /// Report frames after processing.
    CookFrames = 5,
}

/// Channel types carried by `Nl80211Attribute::WiphyChannelType`.
#[neli::neli_enum(serialized_type = "u32")]
pub enum Nl80211ChannelType {
    /// 20 MHz, non-HT channel.
    NoHt = 0,
    /// 20 MHz HT channel.
    Ht20 = 1,
    /// HT40 channel, secondary channel below the control channel.
    Ht40Minus = 2,
    /// HT40 channel, secondary channel above the control channel.
    Ht40Plus = 3,
}
