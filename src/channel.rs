//! Conversion between 802.11 channel numbers and center frequencies in MHz,
//! covering the 2.4 GHz, 5 GHz (including the 4.9 GHz public safety range)
//! and 60 GHz DMG channel plans.
//!
//! The two functions are only inverse on the documented channel sets; callers
//! should not assume a round trip for arbitrary values.

/// Returns the center frequency in MHz of the given channel.
///
/// Channel numbers too large for any plan saturate at `u32::MAX`.
pub fn channel_to_frequency(channel: u32) -> u32 {
    match channel {
        14 => 2484,
        0..=13 => 2407 + channel * 5,
        182..=196 => 4000 + channel * 5,
        _ => channel.saturating_mul(5).saturating_add(5000),
    }
}

/// Returns the channel number of the given center frequency in MHz.
///
/// Frequencies outside every known plan are returned unchanged. This covers
/// the gaps 2485-4909 and 4981-4999 MHz, which would map to a negative
/// channel in the 5 GHz formula.
pub fn frequency_to_channel(freq: u32) -> u32 {
    match freq {
        2484 => 14,
        2407..=2483 => (freq - 2407) / 5,
        4910..=4980 => (freq - 4000) / 5,
        // DMG band lower limit
        5000..=45000 => (freq - 5000) / 5,
        58320..=64800 => (freq - 56160) / 2160,
        _ => freq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(channel_to_frequency(14), 2484);
        assert_eq!(channel_to_frequency(6), 2437);
        assert_eq!(channel_to_frequency(1), 2412);
        assert_eq!(channel_to_frequency(36), 5180);
        assert_eq!(channel_to_frequency(184), 4920);
        assert_eq!(frequency_to_channel(2484), 14);
        assert_eq!(frequency_to_channel(2412), 1);
        assert_eq!(frequency_to_channel(5825), 165);
        assert_eq!(frequency_to_channel(4920), 184);
    }

    #[test]
    fn test_round_trip_on_channel_plans() {
        let plan = (1..=14).chain(36..=196);
        for channel in plan {
            assert_eq!(
                frequency_to_channel(channel_to_frequency(channel)),
                channel,
                "channel {}",
                channel
            );
        }
    }

    #[test]
    fn test_dmg_band() {
        assert_eq!(frequency_to_channel(58320), 1);
        assert_eq!(frequency_to_channel(60480), 2);
        assert_eq!(frequency_to_channel(64800), 4);
    }

    #[test]
    fn test_unknown_frequency_is_returned_unchanged() {
        assert_eq!(frequency_to_channel(50000), 50000);
        assert_eq!(frequency_to_channel(900), 900);
        assert_eq!(frequency_to_channel(70000), 70000);
    }

    #[test]
    fn test_gaps_below_5ghz_are_returned_unchanged() {
        assert_eq!(frequency_to_channel(2485), 2485);
        assert_eq!(frequency_to_channel(3000), 3000);
        assert_eq!(frequency_to_channel(4909), 4909);
        assert_eq!(frequency_to_channel(4981), 4981);
        assert_eq!(frequency_to_channel(4999), 4999);
    }

    #[test]
    fn test_huge_channel_saturates() {
        assert_eq!(channel_to_frequency(900_000_000), u32::MAX);
        assert_eq!(channel_to_frequency(u32::MAX), u32::MAX);
        assert_eq!(channel_to_frequency(800_000_000), 4_000_005_000);
    }
}
