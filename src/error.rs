//! # Error handling utilities.
//! Every failure of the control client is one of the variants below, each with
//! a human readable message. `ErrorKind` is the fieldless discriminant callers
//! match on when they only care about the category.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the nl80211 control client.
#[derive(Error, Debug)]
pub enum Error {
    /// The crate was built without netlink support, no I/O was attempted.
    #[error("not compiled with netlink/nl80211 support: {0}")]
    Unsupported(String),

    /// Allocating or connecting the generic netlink socket failed.
    #[error("failed to connect to generic netlink: {0}")]
    Connect(String),

    /// The kernel does not expose the nl80211 family.
    #[error("failed to find nl80211 controls, kernel may be too old: {0}")]
    FamilyNotFound(String),

    /// A request could not be encoded, nothing was sent.
    #[error("failed to build nl80211 message: {0}")]
    ProtocolBuild(String),

    /// The kernel answered with a negative status code.
    #[error("kernel rejected request (err {code}): {msg}")]
    KernelRejected { code: i32, msg: String },

    /// Send or receive failed at the socket layer.
    #[error("netlink I/O failure: {0}")]
    Io(String),

    /// A caller supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The network interface does not exist.
    #[error("interface {0} doesn't exist")]
    NoInterface(String),

    /// The interface exists but has no nl80211 parent radio.
    #[error("could not find a parent phy device for interface {0}, it isn't nl80211?")]
    NotNl80211(String),

    /// The kernel acknowledged a request but the expected state is missing.
    #[error("{0}")]
    PostconditionFailed(String),

    /// The configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Fieldless view of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    Connect,
    FamilyNotFound,
    ProtocolBuild,
    KernelRejected,
    Io,
    InvalidArgument,
    NoInterface,
    NotNl80211,
    PostconditionFailed,
    Config,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Connect(_) => ErrorKind::Connect,
            Error::FamilyNotFound(_) => ErrorKind::FamilyNotFound,
            Error::ProtocolBuild(_) => ErrorKind::ProtocolBuild,
            Error::KernelRejected { .. } => ErrorKind::KernelRejected,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NoInterface(_) => ErrorKind::NoInterface,
            Error::NotNl80211(_) => ErrorKind::NotNl80211,
            Error::PostconditionFailed(_) => ErrorKind::PostconditionFailed,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only transient socket failures qualify. Build-time and argument
    /// errors never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Connect(_))
    }

    /// Builds a `KernelRejected` error, appending the errno description.
    pub fn kernel_rejected(code: i32, context: &str) -> Self {
        let errno = std::io::Error::from_raw_os_error(code.saturating_abs());
        Error::KernelRejected {
            code,
            msg: format!("{}: {}", context, errno),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            Error::NoInterface("wlan9".into()).kind(),
            ErrorKind::NoInterface
        );
        assert_eq!(
            Error::kernel_rejected(-22, "set channel").kind(),
            ErrorKind::KernelRejected
        );
    }

    #[test]
    fn test_kernel_rejected_keeps_code_verbatim() {
        match Error::kernel_rejected(-16, "new interface") {
            Error::KernelRejected { code, msg } => {
                assert_eq!(code, -16);
                assert!(msg.starts_with("new interface: "));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Io("recv".into()).is_retryable());
        assert!(Error::Connect("socket".into()).is_retryable());
        assert!(!Error::Unsupported("no netlink".into()).is_retryable());
        assert!(!Error::InvalidArgument("mode 4".into()).is_retryable());
    }

    #[test]
    fn test_display_names_interface() {
        let err = Error::NotNl80211("eth0".into());
        assert!(err.to_string().contains("eth0"));
    }
}
