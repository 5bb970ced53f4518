// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Hardware mode transition planning.  Given the mode category before and
//! after a connection change, decides what the firmware dispatcher should
//! do: nothing, switch MAC mode, or adjust spatial streams.
//!
//! DBS is preferred over single-MAC MCC whenever the hardware supports it
//! and the bands differ; SBS is preferred over MCC for a pair on opposite
//! 5 GHz sub-bands.  Stream downgrades are chosen only when the target
//! mode's per-MAC chain budget cannot carry the existing configuration.

use {
    crate::{
        classifier::{ConcRelationship, ModeCategory},
        types::{ChainMode, ConcNextAction, HwModeCaps},
    },
    log::warn,
};

/// Spatial streams available to a connection when a single MAC owns every
/// chain.
const FULL_NSS: u8 = 2;

/// The MAC arrangement a category should run under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HwMode {
    SingleMac,
    Dbs,
    Sbs,
}

/// The arrangement best suited to a category on this hardware, or `None`
/// when the planner has no opinion.
fn target_mode(category: &ModeCategory, caps: &HwModeCaps) -> Option<HwMode> {
    match category {
        ModeCategory::Idle | ModeCategory::Single { .. } => Some(HwMode::SingleMac),
        ModeCategory::Pair { relationship, bands, .. } => Some(match relationship {
            // Sharing a channel costs nothing; stay on one MAC.
            ConcRelationship::Scc => HwMode::SingleMac,
            ConcRelationship::Sbs if caps.sbs_supported => HwMode::Sbs,
            ConcRelationship::Sbs => HwMode::SingleMac,
            // Splitting the bands across MACs beats time-slicing them on
            // one, whether the pair currently shares a MAC (MCC) or not.
            ConcRelationship::Mcc | ConcRelationship::Dbs => {
                if bands.0 != bands.1 && caps.dbs_supported {
                    HwMode::Dbs
                } else {
                    HwMode::SingleMac
                }
            }
        }),
        ModeCategory::Multi => None,
    }
}

/// Streams each connection can keep in the given arrangement.
fn nss_budget(mode: HwMode, caps: &HwModeCaps) -> u8 {
    match mode {
        HwMode::SingleMac => FULL_NSS,
        HwMode::Dbs | HwMode::Sbs => caps.max_nss_per_mac,
    }
}

fn chain_of(category: &ModeCategory) -> Option<ChainMode> {
    match category {
        ModeCategory::Single { chain, .. } | ModeCategory::Pair { chain, .. } => Some(*chain),
        ModeCategory::Idle | ModeCategory::Multi => None,
    }
}

/// Plans the action taking the hardware from `old` to `new`.
///
/// Identical categories plan to [`ConcNextAction::Nop`], as does any
/// category the planner has no target for.  Otherwise the action names the
/// new category's target arrangement, with a downgrade attached when the
/// target's chain budget cannot carry a 2x2 configuration and an upgrade
/// attached when leaving a budget-constrained split arrangement.
pub fn plan_transition(
    old: ModeCategory,
    new: ModeCategory,
    caps: &HwModeCaps,
) -> ConcNextAction {
    if old == new {
        return ConcNextAction::Nop;
    }
    let new_target = match target_mode(&new, caps) {
        Some(target) => target,
        None => {
            warn!("No planned arrangement for {:?}; leaving hardware mode unchanged", new);
            return ConcNextAction::Nop;
        }
    };
    let old_target = target_mode(&old, caps);

    let needs_downgrade =
        chain_of(&new) == Some(ChainMode::TwoByTwo) && nss_budget(new_target, caps) < FULL_NSS;
    let leaving_reduced_split = matches!(old_target, Some(HwMode::Dbs) | Some(HwMode::Sbs))
        && caps.max_nss_per_mac < FULL_NSS;

    if old_target == Some(new_target) {
        // The MAC arrangement already fits; a pure chain change is an
        // in-place stream adjustment.
        match (chain_of(&old), chain_of(&new)) {
            (Some(ChainMode::TwoByTwo), Some(ChainMode::OneByOne)) => {
                return ConcNextAction::Downgrade;
            }
            (Some(ChainMode::OneByOne), Some(ChainMode::TwoByTwo)) if !needs_downgrade => {
                return ConcNextAction::Upgrade;
            }
            _ => {}
        }
    }

    match new_target {
        HwMode::Dbs => {
            if needs_downgrade {
                ConcNextAction::DbsDowngrade
            } else {
                ConcNextAction::Dbs
            }
        }
        HwMode::Sbs => {
            if needs_downgrade {
                ConcNextAction::SbsDowngrade
            } else {
                ConcNextAction::Sbs
            }
        }
        HwMode::SingleMac => {
            if leaving_reduced_split {
                ConcNextAction::SingleMacUpgrade
            } else {
                ConcNextAction::SingleMac
            }
        }
    }
}
