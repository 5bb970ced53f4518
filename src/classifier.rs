// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Stateless classification of a connection table snapshot into a mode
//! category.  The category is the lookup key every downstream policy
//! decision (PCL selection, hardware mode planning) is made on.
//!
//! Categories are structured keys rather than a flat enumeration of every
//! role/band/chain combination, so growing the hardware capability space
//! cannot leave holes in the classification.

use {
    crate::{
        connection_table::ConnectionRecord,
        types::{is_valid_5ghz_sbs_pair, Band, ChainMode, ConnMode},
    },
    log::debug,
};

/// How two concurrent connections share the radio.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ConcRelationship {
    /// Same channel, same MAC.
    Scc,
    /// Different channels time-sliced on one MAC.
    Mcc,
    /// Two MACs on the two 5 GHz sub-bands.
    Sbs,
    /// Two MACs on different bands.
    Dbs,
}

/// Derived classification of the current connection combination.  Computed
/// on demand and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeCategory {
    /// No active connections.
    Idle,
    /// Exactly one active connection.
    Single { mode: ConnMode, band: Band, chain: ChainMode },
    /// Exactly two active connections.  `chain` collapses to the weaker of
    /// the two connections' chain configurations.
    Pair {
        modes: (ConnMode, ConnMode),
        relationship: ConcRelationship,
        bands: (Band, Band),
        chain: ChainMode,
    },
    /// Three or more active connections.  The two-connection combination
    /// model does not extend past pairs, so anything larger lands in this
    /// bucket.
    Multi,
}

/// Determines how two connections share the radio.  SCC is checked before
/// MCC, and SBS before DBS, so the most specific relationship wins when
/// several could describe the pair.
pub fn relationship(a: &ConnectionRecord, b: &ConnectionRecord) -> ConcRelationship {
    if a.mac_id == b.mac_id {
        if a.channel == b.channel {
            ConcRelationship::Scc
        } else {
            ConcRelationship::Mcc
        }
    } else if is_valid_5ghz_sbs_pair(a.channel, b.channel) {
        ConcRelationship::Sbs
    } else {
        ConcRelationship::Dbs
    }
}

/// Classifies a snapshot.  Total: every reachable snapshot maps to a
/// category, including the empty and full ones.
pub fn classify(snapshot: &[ConnectionRecord]) -> ModeCategory {
    let category = match snapshot {
        [] => ModeCategory::Idle,
        [only] => ModeCategory::Single {
            mode: only.mode,
            band: Band::of_channel(only.channel),
            chain: only.chain_mask,
        },
        [first, second] => ModeCategory::Pair {
            modes: (first.mode, second.mode),
            relationship: relationship(first, second),
            bands: (Band::of_channel(first.channel), Band::of_channel(second.channel)),
            chain: first.chain_mask.min(second.chain_mask),
        },
        _ => ModeCategory::Multi,
    };
    debug!("Classified {} connection(s) as {:?}", snapshot.len(), category);
    category
}
