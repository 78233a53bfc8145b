//! Kernel index of a network interface, as carried by the nl80211 ifindex
//! attribute and exposed in `/sys/class/net/<if>/ifindex`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Index of a network interface. Zero is never assigned by the kernel.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct InterfaceIndex(pub u32);

impl From<InterfaceIndex> for u32 {
    fn from(index: InterfaceIndex) -> u32 {
        index.0
    }
}

impl From<u32> for InterfaceIndex {
    fn from(index: u32) -> Self {
        InterfaceIndex(index)
    }
}

impl FromStr for InterfaceIndex {
    type Err = Error;

    /// Parses the content of an `ifindex` file, surrounding whitespace
    /// included.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u32>() {
            Ok(0) | Err(_) => {
                Err(Error::InvalidArgument(format!("bad interface index {:?}", s)))
            }
            Ok(index) => Ok(InterfaceIndex(index)),
        }
    }
}

impl fmt::Display for InterfaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sysfs_content() {
        assert_eq!("7\n".parse::<InterfaceIndex>().ok(), Some(InterfaceIndex(7)));
        assert!("".parse::<InterfaceIndex>().is_err());
        assert!("0".parse::<InterfaceIndex>().is_err());
        assert!("wlan0".parse::<InterfaceIndex>().is_err());
    }

    #[test]
    fn test_into_u32() {
        let index: u32 = InterfaceIndex(42).into();
        assert_eq!(index, 42);
    }

    #[test]
    fn test_display() {
        assert_eq!(InterfaceIndex(3).to_string(), "3");
    }
}
