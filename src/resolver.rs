// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The concurrency resolver owns the connection table and sequences every
//! policy decision against a consistent view of it.  Callers submit
//! admit/release requests and receive the firmware action and stream
//! advisories implied by the change; channel preference queries run under
//! the same lock so they never observe a torn table.

use {
    crate::{
        classifier::{classify, ModeCategory},
        connection_table::{ConnectionRecord, ConnectionTable, SlotHandle, TableError},
        pcl::{build_pcl, first_connection_pcl, PclChannelOrder, PclList, PclType},
        transition::plan_transition,
        types::{Band, ConcNextAction, ConcPriority, ConnMode, HwModeCaps},
    },
    log::info,
    parking_lot::Mutex,
};

/// Recommended spatial stream count for an existing connection, produced
/// when a planned action changes what the hardware can carry.  The
/// connection manager owns issuing the matching PHY reconfiguration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NssAdvisory {
    pub vdev_id: u32,
    pub recommended_nss: u8,
}

/// Outcome of admitting a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmitDecision {
    /// Slot the record was stored in.
    pub slot: SlotHandle,
    /// Firmware reconfiguration the new combination calls for.
    pub action: ConcNextAction,
    /// Stream adjustments for connections affected by the action.
    pub advisories: Vec<NssAdvisory>,
}

/// Outcome of releasing a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseDecision {
    pub action: ConcNextAction,
    pub advisories: Vec<NssAdvisory>,
}

/// Serializes all connection bookkeeping and policy decisions.
pub struct ConcurrencyResolver {
    table: Mutex<ConnectionTable>,
    caps: HwModeCaps,
}

impl ConcurrencyResolver {
    pub fn new(caps: HwModeCaps) -> Self {
        ConcurrencyResolver { table: Mutex::new(ConnectionTable::new()), caps }
    }

    /// Records a newly established connection and plans the hardware
    /// reconfiguration the combination calls for.  Table errors are
    /// surfaced unchanged; the caller must reject the connection attempt.
    pub fn admit(&self, record: ConnectionRecord) -> Result<AdmitDecision, TableError> {
        let mut table = self.table.lock();
        let before = classify(&table.snapshot());
        let slot = table.add_connection(record)?;
        let snapshot = table.snapshot();
        let after = classify(&snapshot);
        let action = plan_transition(before, after, &self.caps);
        let advisories = self.stream_advisories(action, &snapshot);
        info!(
            "Admitted vdev {} ({:?} on channel {}): {:?} -> {:?}, action {:?}",
            record.vdev_id, record.mode, record.channel, before, after, action
        );
        Ok(AdmitDecision { slot, action, advisories })
    }

    /// Clears a torn-down connection and plans the reconfiguration for the
    /// surviving combination.  Releasing an unknown vdev reports `NotFound`
    /// and leaves the table untouched.
    pub fn release(&self, vdev_id: u32) -> Result<ReleaseDecision, TableError> {
        let mut table = self.table.lock();
        let before = classify(&table.snapshot());
        table.remove_connection(vdev_id)?;
        let snapshot = table.snapshot();
        let after = classify(&snapshot);
        let action = plan_transition(before, after, &self.caps);
        let advisories = self.stream_advisories(action, &snapshot);
        info!("Released vdev {}: {:?} -> {:?}, action {:?}", vdev_id, before, after, action);
        Ok(ReleaseDecision { action, advisories })
    }

    /// Weighted channel list steering channel selection for a prospective
    /// `mode` connection, given the current table contents.
    pub fn preferred_channels(
        &self,
        mode: ConnMode,
        pref: ConcPriority,
        order: PclChannelOrder,
        valid_channels: &[u8],
        disallowed: &[u8],
    ) -> PclList {
        let table = self.table.lock();
        let snapshot = table.snapshot();
        let pcl_type = if snapshot.is_empty() {
            first_connection_pcl(mode, pref)
        } else {
            follow_on_pcl(&classify(&snapshot), pref, &self.caps)
        };
        build_pcl(&snapshot, mode, pcl_type, order, valid_channels, disallowed)
    }

    /// Current table contents, slot order.
    pub fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.table.lock().snapshot()
    }

    /// Category of the current table contents.
    pub fn current_category(&self) -> ModeCategory {
        classify(&self.table.lock().snapshot())
    }

    /// Stream recommendations implied by an action.  Any move into a split
    /// arrangement squeezes connections into the per-MAC budget, whether or
    /// not the category was coarse enough to name the downgrade; upgrades
    /// restore each connection to its negotiated count.  Connections that
    /// negotiated a single stream are never advised.
    fn stream_advisories(
        &self,
        action: ConcNextAction,
        snapshot: &[ConnectionRecord],
    ) -> Vec<NssAdvisory> {
        let per_mac = self.caps.max_nss_per_mac;
        match action {
            ConcNextAction::Dbs
            | ConcNextAction::Sbs
            | ConcNextAction::DbsDowngrade
            | ConcNextAction::SbsDowngrade => snapshot
                .iter()
                .filter(|r| r.original_nss > per_mac)
                .map(|r| NssAdvisory { vdev_id: r.vdev_id, recommended_nss: per_mac })
                .collect(),
            // An in-place downgrade always means dropping to one stream.
            ConcNextAction::Downgrade => snapshot
                .iter()
                .filter(|r| r.original_nss > 1)
                .map(|r| NssAdvisory { vdev_id: r.vdev_id, recommended_nss: 1 })
                .collect(),
            ConcNextAction::SingleMacUpgrade | ConcNextAction::Upgrade => snapshot
                .iter()
                .filter(|r| r.original_nss > 1)
                .map(|r| NssAdvisory { vdev_id: r.vdev_id, recommended_nss: r.original_nss })
                .collect(),
            ConcNextAction::DbsUpgrade => snapshot
                .iter()
                .filter(|r| r.original_nss > 1)
                .map(|r| NssAdvisory {
                    vdev_id: r.vdev_id,
                    recommended_nss: r.original_nss.min(per_mac),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// PCL shape for a connection joining existing ones.  Power-save and
/// latency tradeoffs colocate everything on the channels already lit;
/// throughput spreads across MACs when the hardware can split.
fn follow_on_pcl(category: &ModeCategory, pref: ConcPriority, caps: &HwModeCaps) -> PclType {
    match (category, pref) {
        (ModeCategory::Idle, _) => PclType::None,
        (_, ConcPriority::Powersave) | (_, ConcPriority::Latency) => PclType::SccCh,
        (ModeCategory::Single { band: Band::TwoFourGhz, .. }, ConcPriority::Throughput) => {
            if caps.dbs_supported {
                PclType::FiveGhzThenSccCh
            } else {
                PclType::SccChThen5ghz
            }
        }
        (ModeCategory::Single { band: Band::FiveGhz, .. }, ConcPriority::Throughput) => {
            if caps.sbs_supported {
                PclType::SbsChThen5ghz
            } else if caps.dbs_supported {
                PclType::TwoFourGhzThenSccCh
            } else {
                PclType::SccChThen24ghz
            }
        }
        (ModeCategory::Pair { .. }, ConcPriority::Throughput)
        | (ModeCategory::Multi, ConcPriority::Throughput) => PclType::SccCh,
    }
}
