// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Shared vocabulary for the concurrency policy engine: connection roles,
//! bands, bandwidths, chain configurations and hardware capabilities.

/// The largest number of connections the policy engine will track at once.
/// Dual-MAC hardware served by this engine supports at most three active
/// vdevs.
pub const MAX_CONCURRENT_CONNECTIONS: usize = 3;

/// Channels 1-14 are 2.4 GHz; everything above is treated as 5 GHz.
const MAX_24GHZ_CHANNEL: u8 = 14;

/// DFS channels require radar detection and are excluded from some PCLs.
const FIRST_DFS_CHANNEL: u8 = 52;
const LAST_DFS_CHANNEL: u8 = 144;

/// The 5 GHz low sub-band (UNII-1/2) ends at channel 64 and the high
/// sub-band (UNII-2e/3) starts at channel 100.  SBS places one MAC on each
/// sub-band.
const LAST_5GHZ_LOW_CHANNEL: u8 = 64;
const FIRST_5GHZ_HIGH_CHANNEL: u8 = 100;

/// The role a connection plays.  Mirrors the operating modes the host
/// driver can bring up on a vdev.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ConnMode {
    Sta,
    Sap,
    P2pClient,
    P2pGo,
    Ibss,
}

/// Frequency band of a channel.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Band {
    TwoFourGhz,
    FiveGhz,
}

impl Band {
    pub fn of_channel(channel: u8) -> Band {
        if channel <= MAX_24GHZ_CHANNEL {
            Band::TwoFourGhz
        } else {
            Band::FiveGhz
        }
    }
}

/// Returns true if the channel falls in the DFS range.
pub fn is_dfs_channel(channel: u8) -> bool {
    (FIRST_DFS_CHANNEL..=LAST_DFS_CHANNEL).contains(&channel)
}

/// Returns true if two 5 GHz channels land on opposite sub-bands and can
/// therefore be operated simultaneously in SBS mode.
pub fn is_valid_5ghz_sbs_pair(chan_a: u8, chan_b: u8) -> bool {
    if Band::of_channel(chan_a) != Band::FiveGhz || Band::of_channel(chan_b) != Band::FiveGhz {
        return false;
    }
    (chan_a <= LAST_5GHZ_LOW_CHANNEL && chan_b >= FIRST_5GHZ_HIGH_CHANNEL)
        || (chan_b <= LAST_5GHZ_LOW_CHANNEL && chan_a >= FIRST_5GHZ_HIGH_CHANNEL)
}

/// Channel bandwidth negotiated for a connection.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Bandwidth {
    None,
    Mhz5,
    Mhz10,
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz80P80,
    Mhz160,
}

/// Tx/Rx chain configuration advertised for a connection.  Asymmetric
/// configurations are not supported by the hardware this engine serves.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChainMode {
    OneByOne,
    TwoByTwo,
}

impl ChainMode {
    /// The spatial stream count this chain configuration can carry.
    pub fn max_nss(&self) -> u8 {
        match self {
            ChainMode::OneByOne => 1,
            ChainMode::TwoByTwo => 2,
        }
    }
}

/// Hardware capability flags reported by firmware at init or on a
/// capability-change event.  Read-only as far as this engine is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HwModeCaps {
    /// The radio can run two MACs on different bands simultaneously.
    pub dbs_supported: bool,
    /// The radio can run two MACs on the two 5 GHz sub-bands simultaneously.
    pub sbs_supported: bool,
    /// Spatial streams available per MAC when both MACs are active.
    pub max_nss_per_mac: u8,
}

/// Action the firmware dispatcher should take to host a new connection
/// combination.  These are recommendations only; issuing the corresponding
/// firmware command is the dispatcher's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConcNextAction {
    /// No reconfiguration required.
    Nop,
    /// Switch to DBS mode.
    Dbs,
    /// Switch to DBS mode and downgrade connections to 1x1.
    DbsDowngrade,
    /// Switch to DBS mode and restore connections to 2x2.
    DbsUpgrade,
    /// Switch to single-MAC (SCC/MCC) mode.
    SingleMac,
    /// Switch to single-MAC mode and restore connections to 2x2.
    SingleMacUpgrade,
    /// Switch to SBS mode.
    Sbs,
    /// Switch to SBS mode and downgrade connections to 1x1.
    SbsDowngrade,
    /// Downgrade connections to 1x1 without a mode switch.
    Downgrade,
    /// Restore connections to 2x2 without a mode switch.
    Upgrade,
}

/// System-wide tradeoff steering PCL selection.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ConcPriority {
    Throughput,
    Powersave,
    Latency,
}

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    #[test_case(1, Band::TwoFourGhz; "channel 1")]
    #[test_case(11, Band::TwoFourGhz; "channel 11")]
    #[test_case(14, Band::TwoFourGhz; "channel 14 is still 2.4 GHz")]
    #[test_case(36, Band::FiveGhz; "channel 36")]
    #[test_case(165, Band::FiveGhz; "channel 165")]
    fn band_of_channel(channel: u8, expected: Band) {
        assert_eq!(Band::of_channel(channel), expected);
    }

    #[test]
    fn dfs_range() {
        assert!(!is_dfs_channel(36));
        assert!(is_dfs_channel(52));
        assert!(is_dfs_channel(100));
        assert!(is_dfs_channel(144));
        assert!(!is_dfs_channel(149));
    }

    #[test_case(36, 100, true; "low paired with high")]
    #[test_case(149, 64, true; "high paired with low")]
    #[test_case(36, 40, false; "both low")]
    #[test_case(100, 149, false; "both high")]
    #[test_case(6, 100, false; "2.4 GHz cannot participate")]
    fn sbs_pairing(chan_a: u8, chan_b: u8, expected: bool) {
        assert_eq!(is_valid_5ghz_sbs_pair(chan_a, chan_b), expected);
    }

    #[test]
    fn chain_mode_nss() {
        assert_eq!(ChainMode::OneByOne.max_nss(), 1);
        assert_eq!(ChainMode::TwoByTwo.max_nss(), 2);
    }
}
