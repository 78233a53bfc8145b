//! This module extracts the list of usable channels from the wiphy
//! descriptions returned by a `GetWiPhy` dump.
//!
//! Each dump row may describe one radio. The bands of a row hold a nested list
//! of frequencies, and every enabled frequency becomes one channel number.

use log::{debug, trace};

use super::nl80211_attr::AttrTree;
use super::nl80211_const::{Nl80211Attribute, Nl80211BandAttr, Nl80211FrequencyAttr};
use crate::channel::frequency_to_channel;
use crate::error::Result;

/// Channels collected for one radio, in the order the kernel reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelBlock {
    phy_name: String,
    channels: Vec<u32>,
}

impl ChannelBlock {
    pub fn new(phy_name: &str) -> Self {
        Self { phy_name: phy_name.to_string(), channels: Vec::new() }
    }

    /// Name of the radio the channels belong to.
    pub fn phy_name(&self) -> &str {
        &self.phy_name
    }

    pub fn count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[u32] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<u32> {
        self.channels
    }
}

/// Frequencies of a band entry that are present and not disabled.
fn enabled_frequencies<'a>(band: AttrTree<'a>) -> impl Iterator<Item = u32> + 'a {
    band.get(Nl80211BandAttr::Freqs.into())
        .map(|freqs| freqs.nested())
        .into_iter()
        .flat_map(|freqs| freqs.iter())
        .filter_map(|entry| {
            let entry = entry.nested();
            if entry.has(Nl80211FrequencyAttr::Disabled.into()) {
                return None;
            }
            entry.get(Nl80211FrequencyAttr::Freq.into()).and_then(|f| f.as_u32())
        })
}

/// Appends the channels described by one dump row to `block`.
///
/// Rows without band information, or naming another radio, are skipped.
/// Matching rows are walked twice: the first pass counts the usable entries
/// so storage is reserved once, the second one converts and appends them.
/// Never fails, the `Result` lets it serve directly as a dump row handler.
pub fn collect_channels(block: &mut ChannelBlock, row: AttrTree<'_>) -> Result<()> {
    let bands = match row.get(Nl80211Attribute::WiphyBands.into()) {
        Some(bands) => bands.nested(),
        None => {
            trace!("Skipping wiphy row without band information");
            return Ok(());
        }
    };

    if let Some(name) = row.get(Nl80211Attribute::WiphyName.into()) {
        if name.as_str() != Some(block.phy_name()) {
            trace!("Skipping wiphy row for {:?}", name.as_str());
            return Ok(());
        }
    }

    let expected: usize = bands
        .iter()
        .map(|band| enabled_frequencies(band.nested()).count())
        .sum();

    block.channels.reserve_exact(expected);
    let start = block.channels.len();

    for band in bands.iter() {
        for freq in enabled_frequencies(band.nested()) {
            block.channels.push(frequency_to_channel(freq));
        }
    }

    let added = block.channels.len() - start;
    debug_assert_eq!(added, expected);

    debug!("Collected {} channels for {}", added, block.phy_name());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iw_link::wdev_drv::nl80211_drv::AttrSet;

    fn freq_entry(freq: u32, disabled: bool) -> AttrSet {
        let mut entry = AttrSet::with_capacity(64);
        entry.put_u32(Nl80211FrequencyAttr::Freq.into(), freq).unwrap();
        if disabled {
            entry.put_flag(Nl80211FrequencyAttr::Disabled.into()).unwrap();
        }
        entry
    }

    fn band(entries: &[(u32, bool)]) -> AttrSet {
        let mut freqs = AttrSet::with_capacity(1024);
        for (i, (freq, disabled)) in entries.iter().enumerate() {
            freqs.put_nested(i as u16, &freq_entry(*freq, *disabled)).unwrap();
        }
        let mut band = AttrSet::with_capacity(1024);
        band.put_nested(Nl80211BandAttr::Freqs.into(), &freqs).unwrap();
        band
    }

    fn row(name: Option<&str>, bands: &[AttrSet]) -> AttrSet {
        let mut row = AttrSet::with_capacity(4096);
        row.put_u32(Nl80211Attribute::Wiphy.into(), 0).unwrap();
        if let Some(name) = name {
            row.put_str(Nl80211Attribute::WiphyName.into(), name).unwrap();
        }
        let mut nested = AttrSet::with_capacity(4096);
        for (i, band) in bands.iter().enumerate() {
            nested.put_nested(i as u16, band).unwrap();
        }
        row.put_nested(Nl80211Attribute::WiphyBands.into(), &nested).unwrap();
        row
    }

    #[test]
    fn test_channels_in_band_order() -> Result<()> {
        let row = row(
            Some("phy0"),
            &[
                band(&[(2412, false), (2437, false), (2462, false)]),
                band(&[(5180, false), (5200, false)]),
            ],
        );
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row.tree())?;

        assert_eq!(block.channels(), &[1, 6, 11, 36, 40]);
        assert_eq!(block.count(), 5);
        Ok(())
    }

    #[test]
    fn test_disabled_frequency_excluded() -> Result<()> {
        let row = row(Some("phy0"), &[band(&[(2412, false), (2467, true), (2484, false)])]);
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row.tree())?;

        assert_eq!(block.into_channels(), vec![1, 14]);
        Ok(())
    }

    #[test]
    fn test_entry_without_frequency_skipped() -> Result<()> {
        let mut freqs = AttrSet::with_capacity(256);
        freqs.put_nested(0, &AttrSet::with_capacity(0)).unwrap();
        freqs.put_nested(1, &freq_entry(2422, false)).unwrap();
        let mut band = AttrSet::with_capacity(256);
        band.put_nested(Nl80211BandAttr::Freqs.into(), &freqs).unwrap();
        let row = row(Some("phy0"), &[band]);
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row.tree())?;

        assert_eq!(block.channels(), &[3]);
        Ok(())
    }

    #[test]
    fn test_other_radio_skipped() -> Result<()> {
        let row = row(Some("phy1"), &[band(&[(2412, false)])]);
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row.tree())?;

        assert_eq!(block.count(), 0);
        Ok(())
    }

    #[test]
    fn test_row_without_bands_skipped() -> Result<()> {
        let mut row = AttrSet::with_capacity(64);
        row.put_str(Nl80211Attribute::WiphyName.into(), "phy0")?;
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row.tree())?;

        assert!(block.channels().is_empty());
        Ok(())
    }

    #[test]
    fn test_rows_accumulate() -> Result<()> {
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row(Some("phy0"), &[band(&[(2412, false)])]).tree())?;
        collect_channels(&mut block, row(None, &[band(&[(5745, false)])]).tree())?;

        assert_eq!(block.channels(), &[1, 149]);
        Ok(())
    }

    #[test]
    fn test_band_without_freqs() -> Result<()> {
        let row = row(Some("phy0"), &[AttrSet::with_capacity(0), band(&[(2432, false)])]);
        let mut block = ChannelBlock::new("phy0");

        collect_channels(&mut block, row.tree())?;

        assert_eq!(block.channels(), &[5]);
        Ok(())
    }
}
