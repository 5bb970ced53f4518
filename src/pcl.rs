// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Preferred channel list construction.
//!
//! A PCL type names up to four channel groups in priority order (for
//! example "the SCC channel, then the 2.4 GHz channels").  Each group is
//! assigned a weight tier; valid channels outside every group receive a
//! token weight so the firmware can still pick them as a last resort, and
//! regulatory-blocked channels are weighted to zero.

use crate::{
    connection_table::ConnectionRecord,
    types::{is_dfs_channel, is_valid_5ghz_sbs_pair, Band, ConcPriority, ConnMode},
};

/// Hard cap on PCL length.  Entries past the cap are dropped, not
/// compacted.
pub const MAX_CHANNEL_LIST: usize = 128;

/// Weight of the highest-priority channel group.
pub const GROUP1_WEIGHT: u8 = 255;
/// Fixed weight difference between adjacent groups.
pub const GROUP_WEIGHT_STEP: u8 = 20;
/// Weight of valid channels outside every group.
pub const NON_PCL_WEIGHT: u8 = 1;
/// Weight of regulatory-blocked channels.
pub const DISALLOWED_WEIGHT: u8 = 0;

/// The closed set of preferred-channel-list shapes.  Each variant names
/// its channel groups in priority order.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum PclType {
    /// No channel preference.
    None,
    /// 2.4 GHz channels only.
    TwoFourGhz,
    /// 5 GHz channels only.
    FiveGhz,
    /// Channels of the existing connection(s) only.
    SccCh,
    /// Same group content as `SccCh`; named separately because the caller
    /// is accepting an MCC arrangement rather than sharing a channel.
    MccCh,
    /// SBS-compatible 5 GHz channels only.
    SbsCh,
    /// SCC channel, then 2.4 GHz channels.
    SccChThen24ghz,
    /// SCC channel, then 5 GHz channels.
    SccChThen5ghz,
    /// 2.4 GHz channels, then the SCC channel.
    TwoFourGhzThenSccCh,
    /// 5 GHz channels, then the SCC channel.
    FiveGhzThenSccCh,
    /// SCC channel on 5 GHz, SCC channel on 2.4 GHz, then 2.4 GHz channels.
    SccOn5SccOn24Then24ghz,
    /// SCC channel on 5 GHz, SCC channel on 2.4 GHz, then 5 GHz channels.
    SccOn5SccOn24Then5ghz,
    /// SCC channel on 2.4 GHz, SCC channel on 5 GHz, then 2.4 GHz channels.
    SccOn24SccOn5Then24ghz,
    /// SCC channel on 2.4 GHz, SCC channel on 5 GHz, then 5 GHz channels.
    SccOn24SccOn5Then5ghz,
    /// SCC channel on 5 GHz, then SCC channel on 2.4 GHz.
    SccOn5SccOn24,
    /// SCC channel on 2.4 GHz, then SCC channel on 5 GHz.
    SccOn24SccOn5,
    /// MCC channels, then 2.4 GHz channels.
    MccChThen24ghz,
    /// MCC channels, then 5 GHz channels.
    MccChThen5ghz,
    /// 2.4 GHz channels, then MCC channels.
    TwoFourGhzThenMccCh,
    /// 5 GHz channels, then MCC channels.
    FiveGhzThenMccCh,
    /// SBS channels, then the rest of the 5 GHz channels.
    SbsChThen5ghz,
    /// 2.4 GHz channels, SCC channel, then SBS channels.
    TwoFourGhzSccChSbsCh,
    /// 2.4 GHz channels, SCC channel, SBS channels, then the rest of the
    /// 5 GHz channels.
    TwoFourGhzSccChSbsChThen5ghz,
    /// 2.4 GHz channels, SBS channels, then MCC channels.
    TwoFourGhzSbsChThenMccCh,
}

/// Band ordering applied to the assembled list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PclChannelOrder {
    None,
    TwoFourGhzThenFiveGhz,
    FiveGhzThenTwoFourGhz,
}

/// One weighted channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PclEntry {
    pub channel: u8,
    pub weight: u8,
}

/// The assembled preferred channel list, at most [`MAX_CHANNEL_LIST`]
/// entries long.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PclList {
    pub entries: Vec<PclEntry>,
}

impl PclList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn channels(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.channel).collect()
    }

    pub fn weights(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.weight).collect()
    }
}

/// PCL shape for the very first connection in the system.  A station takes
/// no preference; master modes are steered to 5 GHz regardless of the
/// system priority tradeoff.
pub fn first_connection_pcl(mode: ConnMode, _pref: ConcPriority) -> PclType {
    match mode {
        ConnMode::Sta | ConnMode::Ibss => PclType::None,
        ConnMode::Sap | ConnMode::P2pClient | ConnMode::P2pGo => PclType::FiveGhz,
    }
}

/// Channel groups named by the PCL types, derived from the snapshot and
/// the valid channel list.
struct ChannelGroups {
    /// Channels the existing connections operate on, slot order.
    conn: Vec<u8>,
    /// Existing connection channels, 2.4 GHz first.
    conn_24_then_5: Vec<u8>,
    /// Existing connection channels, 5 GHz first.
    conn_5_then_24: Vec<u8>,
    /// Valid 2.4 GHz channels.
    ch_24: Vec<u8>,
    /// Valid 5 GHz channels (DFS-filtered when the rule applies).
    ch_5: Vec<u8>,
    /// Valid 5 GHz channels on the opposite sub-band of the current 5 GHz
    /// connection(s).
    sbs: Vec<u8>,
}

impl ChannelGroups {
    fn new(snapshot: &[ConnectionRecord], valid_channels: &[u8], skip_dfs: bool) -> Self {
        let usable = |channel: u8| !(skip_dfs && is_dfs_channel(channel));

        let ch_24: Vec<u8> = valid_channels
            .iter()
            .copied()
            .filter(|&c| Band::of_channel(c) == Band::TwoFourGhz)
            .collect();
        let ch_5: Vec<u8> = valid_channels
            .iter()
            .copied()
            .filter(|&c| Band::of_channel(c) == Band::FiveGhz && usable(c))
            .collect();

        let conn: Vec<u8> =
            snapshot.iter().map(|r| r.channel).filter(|&c| usable(c)).collect();
        let conn_24: Vec<u8> = conn
            .iter()
            .copied()
            .filter(|&c| Band::of_channel(c) == Band::TwoFourGhz)
            .collect();
        let conn_5: Vec<u8> =
            conn.iter().copied().filter(|&c| Band::of_channel(c) == Band::FiveGhz).collect();

        let mut conn_24_then_5 = conn_24.clone();
        conn_24_then_5.extend(&conn_5);
        let mut conn_5_then_24 = conn_5.clone();
        conn_5_then_24.extend(&conn_24);

        // With one 5 GHz connection the SBS group is every valid 5 GHz
        // channel on the opposite sub-band.  With two we are already in
        // SBS, so the connection channels themselves are the group.
        let sbs = match conn_5.as_slice() {
            [] => Vec::new(),
            [current] => {
                ch_5.iter().copied().filter(|&c| is_valid_5ghz_sbs_pair(*current, c)).collect()
            }
            _ => conn.clone(),
        };

        ChannelGroups { conn, conn_24_then_5, conn_5_then_24, ch_24, ch_5, sbs }
    }

    /// The groups for a PCL type, priority order.
    fn for_type(&self, pcl_type: PclType) -> Vec<&[u8]> {
        match pcl_type {
            PclType::None => vec![],
            PclType::TwoFourGhz => vec![&self.ch_24],
            PclType::FiveGhz => vec![&self.ch_5],
            PclType::SccCh | PclType::MccCh => vec![&self.conn],
            PclType::SccChThen24ghz | PclType::MccChThen24ghz => vec![&self.conn, &self.ch_24],
            PclType::SccChThen5ghz | PclType::MccChThen5ghz => vec![&self.conn, &self.ch_5],
            PclType::TwoFourGhzThenSccCh | PclType::TwoFourGhzThenMccCh => {
                vec![&self.ch_24, &self.conn]
            }
            PclType::FiveGhzThenSccCh | PclType::FiveGhzThenMccCh => {
                vec![&self.ch_5, &self.conn]
            }
            PclType::SccOn5SccOn24 => vec![&self.conn_5_then_24],
            PclType::SccOn24SccOn5 => vec![&self.conn_24_then_5],
            PclType::SccOn5SccOn24Then24ghz => vec![&self.conn_5_then_24, &self.ch_24],
            PclType::SccOn5SccOn24Then5ghz => vec![&self.conn_5_then_24, &self.ch_5],
            PclType::SccOn24SccOn5Then24ghz => vec![&self.conn_24_then_5, &self.ch_24],
            PclType::SccOn24SccOn5Then5ghz => vec![&self.conn_24_then_5, &self.ch_5],
            PclType::SbsCh => vec![&self.sbs],
            PclType::SbsChThen5ghz => vec![&self.sbs, &self.ch_5],
            PclType::TwoFourGhzSccChSbsCh => vec![&self.ch_24, &self.conn, &self.sbs],
            PclType::TwoFourGhzSccChSbsChThen5ghz => {
                vec![&self.ch_24, &self.conn, &self.sbs, &self.ch_5]
            }
            PclType::TwoFourGhzSbsChThenMccCh => vec![&self.ch_24, &self.sbs, &self.conn],
        }
    }

    fn group_weight(group_index: usize) -> u8 {
        GROUP1_WEIGHT - GROUP_WEIGHT_STEP * group_index as u8
    }
}

/// Builds the weighted channel list steering a new `mode` connection.
///
/// Group channels come first in tier order; valid channels outside every
/// group follow with [`NON_PCL_WEIGHT`].  A channel in several groups keeps
/// the weight of the highest-priority group containing it.  Channels in
/// `disallowed` are kept in place but weighted [`DISALLOWED_WEIGHT`].  The
/// result is truncated at [`MAX_CHANNEL_LIST`] entries.
///
/// When `mode` is a master mode (SAP or P2P GO) and a station connection
/// exists, DFS channels are excluded from the 5 GHz and connection groups:
/// the station may be forced to a DFS channel by its AP but a master mode
/// should not elect one while sharing the radio.
pub fn build_pcl(
    snapshot: &[ConnectionRecord],
    mode: ConnMode,
    pcl_type: PclType,
    order: PclChannelOrder,
    valid_channels: &[u8],
    disallowed: &[u8],
) -> PclList {
    let sta_present = snapshot.iter().any(|r| r.mode == ConnMode::Sta);
    let skip_dfs = sta_present && matches!(mode, ConnMode::Sap | ConnMode::P2pGo);
    let groups = ChannelGroups::new(snapshot, valid_channels, skip_dfs);

    let mut entries: Vec<PclEntry> = Vec::new();
    let seen = |entries: &[PclEntry], channel: u8| entries.iter().any(|e| e.channel == channel);

    for (index, group) in groups.for_type(pcl_type).into_iter().enumerate() {
        let weight = ChannelGroups::group_weight(index);
        for &channel in group {
            // First-group-wins: an SCC channel that is also a 2.4 GHz
            // channel keeps the SCC weight.
            if !seen(&entries, channel) {
                entries.push(PclEntry { channel, weight });
            }
        }
    }

    for &channel in valid_channels {
        if !seen(&entries, channel) {
            entries.push(PclEntry { channel, weight: NON_PCL_WEIGHT });
        }
    }

    for entry in entries.iter_mut() {
        if disallowed.contains(&entry.channel) {
            entry.weight = DISALLOWED_WEIGHT;
        }
    }

    match order {
        PclChannelOrder::None => {}
        PclChannelOrder::TwoFourGhzThenFiveGhz => {
            entries.sort_by_key(|e| Band::of_channel(e.channel) == Band::FiveGhz);
        }
        PclChannelOrder::FiveGhzThenTwoFourGhz => {
            entries.sort_by_key(|e| Band::of_channel(e.channel) == Band::TwoFourGhz);
        }
    }

    entries.truncate(MAX_CHANNEL_LIST);
    PclList { entries }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::{Bandwidth, ChainMode},
        test_case::test_case,
    };

    fn record(mode: ConnMode, channel: u8) -> ConnectionRecord {
        ConnectionRecord {
            mode,
            channel,
            bandwidth: Bandwidth::Mhz20,
            mac_id: 0,
            chain_mask: ChainMode::TwoByTwo,
            original_nss: 2,
            vdev_id: u32::from(channel),
        }
    }

    #[test]
    fn idle_24ghz_pcl_weights_the_24ghz_group_only() {
        let pcl = build_pcl(
            &[],
            ConnMode::Sap,
            PclType::TwoFourGhz,
            PclChannelOrder::None,
            &[1, 6, 11, 36, 40],
            &[],
        );
        assert_eq!(pcl.channels(), vec![1, 6, 11, 36, 40]);
        assert_eq!(pcl.weights(), vec![255, 255, 255, 1, 1]);
    }

    #[test]
    fn scc_then_24ghz_tiers_the_groups() {
        let snapshot = [record(ConnMode::Sta, 36)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::P2pClient,
            PclType::SccChThen24ghz,
            PclChannelOrder::None,
            &[1, 6, 36, 40],
            &[],
        );
        assert_eq!(pcl.channels(), vec![36, 1, 6, 40]);
        assert_eq!(pcl.weights(), vec![255, 235, 235, 1]);
    }

    #[test]
    fn overlapping_channel_keeps_first_group_weight() {
        // The SCC channel 6 is also a 2.4 GHz channel; it must keep the
        // group-1 weight and appear once.
        let snapshot = [record(ConnMode::Sta, 6)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::P2pClient,
            PclType::SccChThen24ghz,
            PclChannelOrder::None,
            &[1, 6, 11],
            &[],
        );
        assert_eq!(pcl.channels(), vec![6, 1, 11]);
        assert_eq!(pcl.weights(), vec![255, 235, 235]);
    }

    #[test]
    fn group_weights_are_strictly_decreasing_across_tiers() {
        let snapshot = [record(ConnMode::Sta, 6), record(ConnMode::Sap, 36)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::P2pClient,
            PclType::SccOn24SccOn5Then5ghz,
            PclChannelOrder::None,
            &[1, 6, 36, 40, 149],
            &[],
        );
        // Group 1 is the connection channels 6 then 36, group 2 the
        // remaining valid 5 GHz channels; everything else is non-PCL.
        let weight_of = |channel: u8| {
            pcl.entries.iter().find(|e| e.channel == channel).map(|e| e.weight).unwrap()
        };
        assert!(weight_of(6) > weight_of(40));
        assert!(weight_of(36) > weight_of(40));
        assert!(weight_of(40) > weight_of(1));
        assert_eq!(weight_of(40), weight_of(149));
    }

    #[test]
    fn disallowed_channels_are_zero_weighted_in_place() {
        let pcl = build_pcl(
            &[],
            ConnMode::Sta,
            PclType::TwoFourGhz,
            PclChannelOrder::None,
            &[1, 6, 11],
            &[6],
        );
        assert_eq!(pcl.channels(), vec![1, 6, 11]);
        assert_eq!(pcl.weights(), vec![255, 0, 255]);
    }

    #[test]
    fn list_is_capped_without_panicking() {
        let valid: Vec<u8> = (1..=200).collect();
        let pcl = build_pcl(
            &[],
            ConnMode::Sta,
            PclType::FiveGhz,
            PclChannelOrder::None,
            &valid,
            &[],
        );
        assert_eq!(pcl.len(), MAX_CHANNEL_LIST);
    }

    #[test]
    fn band_order_resorts_without_changing_weights() {
        let snapshot = [record(ConnMode::Sta, 36)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::P2pClient,
            PclType::SccChThen24ghz,
            PclChannelOrder::TwoFourGhzThenFiveGhz,
            &[1, 6, 36, 40],
            &[],
        );
        // 2.4 GHz channels move ahead of 36 but keep their tier weights.
        assert_eq!(pcl.channels(), vec![1, 6, 36, 40]);
        assert_eq!(pcl.weights(), vec![235, 235, 255, 1]);
    }

    #[test]
    fn sbs_group_targets_the_opposite_sub_band() {
        let snapshot = [record(ConnMode::Sta, 36)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::P2pClient,
            PclType::SbsChThen5ghz,
            PclChannelOrder::None,
            &[36, 40, 100, 149],
            &[],
        );
        // 100 and 149 are across the sub-band split from channel 36.
        assert_eq!(pcl.channels(), vec![100, 149, 36, 40]);
        assert_eq!(pcl.weights(), vec![255, 255, 235, 235]);
    }

    #[test]
    fn dfs_channels_are_skipped_for_master_modes_when_sta_present() {
        let snapshot = [record(ConnMode::Sta, 36)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::Sap,
            PclType::FiveGhz,
            PclChannelOrder::None,
            &[36, 52, 100, 149],
            &[],
        );
        // 52 and 100 are DFS; they fall out of the 5 GHz group and, being
        // filtered rather than disallowed, out of the group tier entirely.
        let weight_of = |channel: u8| {
            pcl.entries.iter().find(|e| e.channel == channel).map(|e| e.weight).unwrap()
        };
        assert_eq!(weight_of(36), 255);
        assert_eq!(weight_of(149), 255);
        assert_eq!(weight_of(52), NON_PCL_WEIGHT);
        assert_eq!(weight_of(100), NON_PCL_WEIGHT);
    }

    #[test]
    fn dfs_channels_stay_for_sta_requests() {
        let snapshot = [record(ConnMode::Sta, 36)];
        let pcl = build_pcl(
            &snapshot,
            ConnMode::Sta,
            PclType::FiveGhz,
            PclChannelOrder::None,
            &[36, 52, 149],
            &[],
        );
        assert_eq!(pcl.weights(), vec![255, 255, 255]);
    }

    #[test_case(ConnMode::Sta, PclType::None; "sta has no preference")]
    #[test_case(ConnMode::Sap, PclType::FiveGhz; "sap is steered to 5 GHz")]
    #[test_case(ConnMode::P2pGo, PclType::FiveGhz; "p2p go is steered to 5 GHz")]
    #[test_case(ConnMode::P2pClient, PclType::FiveGhz; "p2p client is steered to 5 GHz")]
    fn first_connection_table(mode: ConnMode, expected: PclType) {
        for pref in [ConcPriority::Throughput, ConcPriority::Powersave, ConcPriority::Latency] {
            assert_eq!(first_connection_pcl(mode, pref), expected);
        }
    }

    #[test]
    fn none_pcl_yields_only_non_pcl_weights() {
        let pcl = build_pcl(
            &[],
            ConnMode::Sta,
            PclType::None,
            PclChannelOrder::None,
            &[1, 36],
            &[],
        );
        assert_eq!(pcl.weights(), vec![NON_PCL_WEIGHT, NON_PCL_WEIGHT]);
    }
}
