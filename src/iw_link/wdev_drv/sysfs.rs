//! Interface queries answered from the sysfs network class tree
//! (`/sys/class/net` by default).
//!
//! Two facts are read from there: whether an interface exists (and its
//! index), and the name of the nl80211 radio behind it.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use super::{InterfaceIndex, NetDevQuery};

/// `NetDevQuery` implementation reading the sysfs network class tree.
#[derive(Debug, Clone)]
pub struct SysfsNetDev {
    root: PathBuf,
}

impl SysfsNetDev {
    /// Creates a resolver rooted at `root`, normally `/sys/class/net`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn iface_dir(&self, if_name: &str) -> PathBuf {
        self.root.join(if_name)
    }

    /// Scans `<if>/phy80211/device` the way older kernels lay it out: either
    /// an `ieee80211:phyN` entry or an `ieee80211/` directory holding `phyN`.
    fn scan_device_dir(device_dir: &Path) -> Option<String> {
        let entries = fs::read_dir(device_dir).ok()?;

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if name.len() < 9 {
                continue;
            }

            if let Some(phy) = name.strip_prefix("ieee80211:") {
                if phy.starts_with("phy") {
                    return Some(phy.to_string());
                }
            }

            if name.starts_with("ieee80211") {
                let ieee_dir = device_dir.join("ieee80211");
                let found = fs::read_dir(&ieee_dir).ok().and_then(|dir| {
                    dir.flatten()
                        .map(|e| e.file_name().to_string_lossy().into_owned())
                        .find(|n| n.starts_with("phy"))
                });

                if found.is_some() {
                    return found;
                }
            }
        }

        None
    }
}

impl Default for SysfsNetDev {
    fn default() -> Self {
        Self::new("/sys/class/net")
    }
}

impl NetDevQuery for SysfsNetDev {
    fn if_index(&self, if_name: &str) -> Option<InterfaceIndex> {
        let path = self.iface_dir(if_name).join("ifindex");
        let index = fs::read_to_string(&path).ok()?.parse::<InterfaceIndex>().ok()?;
        trace!("Interface {} has index {}", if_name, index);
        Some(index)
    }

    fn find_parent_radio(&self, if_name: &str) -> Option<String> {
        let phy_dir = self.iface_dir(if_name).join("phy80211");

        if let Ok(name) = fs::read_to_string(phy_dir.join("name")) {
            let name = name.trim();
            if !name.is_empty() {
                debug!("Interface {} belongs to {}", if_name, name);
                return Some(name.to_string());
            }
        }

        let phy = Self::scan_device_dir(&phy_dir.join("device"));
        debug!("Interface {} parent radio from device scan: {:?}", if_name, phy);
        phy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};

    fn netdev_with_iface(name: &str, ifindex: u32) -> (tempfile::TempDir, SysfsNetDev) {
        let root = tempfile::tempdir().unwrap();
        let iface = root.path().join(name);
        create_dir_all(&iface).unwrap();
        write(iface.join("ifindex"), format!("{}\n", ifindex)).unwrap();
        let netdev = SysfsNetDev::new(root.path());
        (root, netdev)
    }

    #[test]
    fn test_if_index() {
        let (_root, netdev) = netdev_with_iface("wlan0", 3);

        assert_eq!(netdev.if_index("wlan0"), Some(InterfaceIndex(3)));
        assert_eq!(netdev.if_index("nonexistent0"), None);
    }

    #[test]
    fn test_parent_from_name_file() {
        let (root, netdev) = netdev_with_iface("wlan0", 3);
        let phy = root.path().join("wlan0/phy80211");
        create_dir_all(&phy).unwrap();
        write(phy.join("name"), "phy1\n").unwrap();

        assert_eq!(netdev.find_parent_radio("wlan0"), Some("phy1".to_string()));
    }

    #[test]
    fn test_parent_from_device_entry() {
        let (root, netdev) = netdev_with_iface("wlan0", 3);
        let device = root.path().join("wlan0/phy80211/device");
        create_dir_all(device.join("ieee80211:phy2")).unwrap();

        assert_eq!(netdev.find_parent_radio("wlan0"), Some("phy2".to_string()));
    }

    #[test]
    fn test_parent_from_ieee80211_dir() {
        let (root, netdev) = netdev_with_iface("wlan0", 3);
        let device = root.path().join("wlan0/phy80211/device");
        create_dir_all(device.join("ieee80211/phy0")).unwrap();

        assert_eq!(netdev.find_parent_radio("wlan0"), Some("phy0".to_string()));
    }

    #[test]
    fn test_wired_interface_has_no_parent() {
        let (_root, netdev) = netdev_with_iface("eth0", 2);

        assert_eq!(netdev.if_index("eth0"), Some(InterfaceIndex(2)));
        assert_eq!(netdev.find_parent_radio("eth0"), None);
    }
}
