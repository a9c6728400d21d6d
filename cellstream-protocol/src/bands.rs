//! LTE band and frequency resolution from fixed lookup tables.
//!
//! Two tables drive the resolver:
//!
//! - [`BandInfo`]: per-band frequency parameters (3GPP TS 36.101 band plan).
//!   Downlink carrier frequency follows the standard formula
//!   `F_dl = F_dl_low + 0.1 * (EARFCN - N_offs_dl)`; uplink analogously
//!   when the band defines an uplink base. TDD bands carry downlink
//!   parameters only.
//! - [`ChannelRange`]: ordered, disjoint EARFCN ranges used to derive a
//!   band when the feed does not report one explicitly. Resolution is
//!   defined as first match in table order.
//!
//! Both tables are immutable module-scoped constants; there is no runtime
//! mutation or I/O here.

/// Frequency parameters for one LTE band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandInfo {
    /// Band number.
    pub band: u16,
    /// Downlink low-edge carrier frequency in MHz.
    pub fdl_low: f64,
    /// Uplink low-edge carrier frequency in MHz; None for downlink-only
    /// and TDD bands.
    pub ful_low: Option<f64>,
    /// Downlink EARFCN offset for this band.
    pub n_offs: u32,
}

/// One EARFCN range claiming a band number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub band: u16,
    pub low: u32,
    pub high: u32,
}

/// LTE band plan. Versioned with the table below; extend both together.
pub const LTE_BANDS: &[BandInfo] = &[
    BandInfo { band: 1, fdl_low: 2110.0, ful_low: Some(1920.0), n_offs: 0 },
    BandInfo { band: 2, fdl_low: 1930.0, ful_low: Some(1850.0), n_offs: 600 },
    BandInfo { band: 3, fdl_low: 1805.0, ful_low: Some(1710.0), n_offs: 1200 },
    BandInfo { band: 4, fdl_low: 2110.0, ful_low: Some(1710.0), n_offs: 1950 },
    BandInfo { band: 5, fdl_low: 869.0, ful_low: Some(824.0), n_offs: 2400 },
    BandInfo { band: 6, fdl_low: 830.0, ful_low: Some(875.0), n_offs: 2650 },
    BandInfo { band: 7, fdl_low: 2620.0, ful_low: Some(2500.0), n_offs: 2750 },
    BandInfo { band: 8, fdl_low: 925.0, ful_low: Some(880.0), n_offs: 3450 },
    BandInfo { band: 9, fdl_low: 1844.9, ful_low: Some(1749.9), n_offs: 3800 },
    BandInfo { band: 10, fdl_low: 2110.0, ful_low: Some(1710.0), n_offs: 4150 },
    BandInfo { band: 11, fdl_low: 1475.9, ful_low: Some(1427.9), n_offs: 4750 },
    BandInfo { band: 12, fdl_low: 729.0, ful_low: Some(699.0), n_offs: 5010 },
    BandInfo { band: 13, fdl_low: 746.0, ful_low: Some(777.0), n_offs: 5180 },
    BandInfo { band: 14, fdl_low: 758.0, ful_low: Some(788.0), n_offs: 5280 },
    BandInfo { band: 17, fdl_low: 734.0, ful_low: Some(704.0), n_offs: 5035 },
    BandInfo { band: 18, fdl_low: 860.0, ful_low: Some(815.0), n_offs: 5850 },
    BandInfo { band: 19, fdl_low: 875.0, ful_low: Some(830.0), n_offs: 6000 },
    BandInfo { band: 20, fdl_low: 791.0, ful_low: Some(832.0), n_offs: 6150 },
    BandInfo { band: 21, fdl_low: 1495.9, ful_low: Some(1447.9), n_offs: 6450 },
    BandInfo { band: 22, fdl_low: 3510.0, ful_low: Some(3410.0), n_offs: 6600 },
    BandInfo { band: 23, fdl_low: 2180.0, ful_low: Some(2000.0), n_offs: 7500 },
    BandInfo { band: 24, fdl_low: 1525.0, ful_low: Some(1626.5), n_offs: 7700 },
    BandInfo { band: 25, fdl_low: 1930.0, ful_low: Some(1850.0), n_offs: 8040 },
    BandInfo { band: 26, fdl_low: 859.0, ful_low: Some(814.0), n_offs: 8690 },
    BandInfo { band: 27, fdl_low: 852.0, ful_low: Some(807.0), n_offs: 9040 },
    BandInfo { band: 28, fdl_low: 758.0, ful_low: Some(703.0), n_offs: 9210 },
    // Downlink-only (SDL) bands
    BandInfo { band: 29, fdl_low: 717.0, ful_low: None, n_offs: 9660 },
    BandInfo { band: 30, fdl_low: 2350.0, ful_low: Some(2305.0), n_offs: 9770 },
    BandInfo { band: 31, fdl_low: 462.5, ful_low: Some(452.5), n_offs: 9870 },
    BandInfo { band: 32, fdl_low: 1452.0, ful_low: None, n_offs: 9920 },
    // TDD bands: no separate uplink base
    BandInfo { band: 33, fdl_low: 1900.0, ful_low: None, n_offs: 36000 },
    BandInfo { band: 34, fdl_low: 2010.0, ful_low: None, n_offs: 36200 },
    BandInfo { band: 35, fdl_low: 1850.0, ful_low: None, n_offs: 36350 },
    BandInfo { band: 36, fdl_low: 1930.0, ful_low: None, n_offs: 36950 },
    BandInfo { band: 37, fdl_low: 1910.0, ful_low: None, n_offs: 37550 },
    BandInfo { band: 38, fdl_low: 2570.0, ful_low: None, n_offs: 37750 },
    BandInfo { band: 39, fdl_low: 1880.0, ful_low: None, n_offs: 38250 },
    BandInfo { band: 40, fdl_low: 2300.0, ful_low: None, n_offs: 38650 },
    BandInfo { band: 41, fdl_low: 2496.0, ful_low: None, n_offs: 39650 },
    BandInfo { band: 42, fdl_low: 3400.0, ful_low: None, n_offs: 41590 },
    BandInfo { band: 43, fdl_low: 3600.0, ful_low: None, n_offs: 43590 },
    BandInfo { band: 48, fdl_low: 3550.0, ful_low: None, n_offs: 55240 },
    BandInfo { band: 65, fdl_low: 2110.0, ful_low: Some(1920.0), n_offs: 65536 },
    BandInfo { band: 66, fdl_low: 2110.0, ful_low: Some(1710.0), n_offs: 66436 },
    BandInfo { band: 67, fdl_low: 738.0, ful_low: None, n_offs: 67336 },
    BandInfo { band: 68, fdl_low: 753.0, ful_low: Some(698.0), n_offs: 68336 },
    BandInfo { band: 71, fdl_low: 617.0, ful_low: Some(663.0), n_offs: 13470 },
];

/// Downlink EARFCN ranges per band. Disjoint by construction; searched
/// linearly, first match wins.
pub const LTE_RANGES: &[ChannelRange] = &[
    ChannelRange { band: 1, low: 0, high: 599 },
    ChannelRange { band: 2, low: 600, high: 1199 },
    ChannelRange { band: 3, low: 1200, high: 1949 },
    ChannelRange { band: 4, low: 1950, high: 2399 },
    ChannelRange { band: 5, low: 2400, high: 2649 },
    ChannelRange { band: 6, low: 2650, high: 2749 },
    ChannelRange { band: 7, low: 2750, high: 3449 },
    ChannelRange { band: 8, low: 3450, high: 3799 },
    ChannelRange { band: 9, low: 3800, high: 4149 },
    ChannelRange { band: 10, low: 4150, high: 4749 },
    ChannelRange { band: 11, low: 4750, high: 4949 },
    ChannelRange { band: 12, low: 5010, high: 5179 },
    ChannelRange { band: 13, low: 5180, high: 5279 },
    ChannelRange { band: 14, low: 5280, high: 5379 },
    ChannelRange { band: 17, low: 5730, high: 5849 },
    ChannelRange { band: 18, low: 5850, high: 5999 },
    ChannelRange { band: 19, low: 6000, high: 6149 },
    ChannelRange { band: 20, low: 6150, high: 6449 },
    ChannelRange { band: 21, low: 6450, high: 6599 },
    ChannelRange { band: 22, low: 6600, high: 7399 },
    ChannelRange { band: 23, low: 7500, high: 7699 },
    ChannelRange { band: 24, low: 7700, high: 8039 },
    ChannelRange { band: 25, low: 8040, high: 8689 },
    ChannelRange { band: 26, low: 8690, high: 9039 },
    ChannelRange { band: 27, low: 9040, high: 9209 },
    ChannelRange { band: 28, low: 9210, high: 9659 },
    ChannelRange { band: 29, low: 9660, high: 9769 },
    ChannelRange { band: 30, low: 9770, high: 9869 },
    ChannelRange { band: 31, low: 9870, high: 9919 },
    ChannelRange { band: 32, low: 9920, high: 10359 },
    ChannelRange { band: 33, low: 36000, high: 36199 },
    ChannelRange { band: 34, low: 36200, high: 36349 },
    ChannelRange { band: 35, low: 36350, high: 36949 },
    ChannelRange { band: 36, low: 36950, high: 37549 },
    ChannelRange { band: 37, low: 37550, high: 37749 },
    ChannelRange { band: 38, low: 37750, high: 38249 },
    ChannelRange { band: 39, low: 38250, high: 38649 },
    ChannelRange { band: 40, low: 38650, high: 39649 },
    ChannelRange { band: 41, low: 39650, high: 41589 },
    ChannelRange { band: 42, low: 41590, high: 43589 },
    ChannelRange { band: 43, low: 43590, high: 45589 },
    ChannelRange { band: 48, low: 55240, high: 56739 },
    ChannelRange { band: 65, low: 65536, high: 66435 },
    ChannelRange { band: 66, low: 66436, high: 67335 },
    ChannelRange { band: 67, low: 67336, high: 67535 },
    ChannelRange { band: 68, low: 68336, high: 68585 },
    ChannelRange { band: 71, low: 13470, high: 13719 },
];

/// Look up frequency parameters for a band number.
pub fn band_info(band: u16) -> Option<&'static BandInfo> {
    LTE_BANDS.iter().find(|b| b.band == band)
}

/// Derive a band number from a downlink channel number. First matching
/// range in table order wins; None when no range claims the channel.
pub fn resolve_band(channel: u32) -> Option<u16> {
    LTE_RANGES
        .iter()
        .find(|r| (r.low..=r.high).contains(&channel))
        .map(|r| r.band)
}

/// Derive (downlink, uplink) carrier frequencies in MHz for a channel on
/// a band. Returns (None, None) when the band is not in the table; uplink
/// is None for bands without an uplink base.
pub fn frequencies(band: u16, channel: u32) -> (Option<f64>, Option<f64>) {
    let Some(info) = band_info(band) else {
        return (None, None);
    };
    let delta = 0.1 * (channel as f64 - info.n_offs as f64);
    let dl = info.fdl_low + delta;
    let ul = info.ful_low.map(|f| f + delta);
    (Some(dl), ul)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_channels() {
        assert_eq!(resolve_band(0), Some(1));
        assert_eq!(resolve_band(1300), Some(3));
        assert_eq!(resolve_band(1949), Some(3));
        assert_eq!(resolve_band(38000), Some(38));
        assert_eq!(resolve_band(66436), Some(66));
    }

    #[test]
    fn test_resolve_gaps_unclaimed() {
        // Gap between band 32 (..=10359) and band 71 (13470..)
        assert_eq!(resolve_band(12000), None);
        // Gap between band 14 (..=5379) and band 17 (5730..)
        assert_eq!(resolve_band(5500), None);
        assert_eq!(resolve_band(100_000), None);
    }

    #[test]
    fn test_ranges_disjoint_and_covered() {
        // Every channel in [low, high] resolves to its own entry's band,
        // and no two entries claim the same channel.
        for (i, r) in LTE_RANGES.iter().enumerate() {
            assert!(r.low <= r.high, "band {} range inverted", r.band);
            for other in &LTE_RANGES[i + 1..] {
                assert!(
                    r.high < other.low || other.high < r.low,
                    "bands {} and {} overlap",
                    r.band,
                    other.band
                );
            }
            for ch in [r.low, (r.low + r.high) / 2, r.high] {
                assert_eq!(resolve_band(ch), Some(r.band));
            }
        }
    }

    #[test]
    fn test_every_range_has_band_info() {
        for r in LTE_RANGES {
            assert!(band_info(r.band).is_some(), "band {} missing from plan", r.band);
        }
    }

    #[test]
    fn test_fdd_frequencies() {
        // Band 3, EARFCN 1300: DL = 1805 + 0.1 * (1300 - 1200) = 1815 MHz
        let (dl, ul) = frequencies(3, 1300);
        assert!((dl.unwrap() - 1815.0).abs() < 1e-9);
        assert!((ul.unwrap() - 1720.0).abs() < 1e-9);
    }

    #[test]
    fn test_tdd_band_has_no_uplink() {
        let (dl, ul) = frequencies(38, 38000);
        assert!((dl.unwrap() - 2595.0).abs() < 1e-9);
        assert_eq!(ul, None);
    }

    #[test]
    fn test_unknown_band() {
        assert_eq!(frequencies(999, 1300), (None, None));
        assert_eq!(band_info(999), None);
    }
}
