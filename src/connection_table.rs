// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Registry of active connections.  The table is the only mutable state in
//! the policy engine; every classification and planning decision is derived
//! from a snapshot of it.

use {
    crate::types::{Bandwidth, ChainMode, ConnMode, MAX_CONCURRENT_CONNECTIONS},
    log::warn,
    thiserror::Error,
};

/// One active radio connection as tracked by the policy engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// Role this connection plays.
    pub mode: ConnMode,
    /// Operating channel number.
    pub channel: u8,
    /// Channel bandwidth in use.
    pub bandwidth: Bandwidth,
    /// Physical MAC the connection is bound to (0 or 1 on dual-MAC parts).
    pub mac_id: u8,
    /// Chain configuration the hardware advertised for this connection.
    pub chain_mask: ChainMode,
    /// Spatial stream count negotiated at connection time.
    pub original_nss: u8,
    /// Host driver handle for the vdev carrying this connection.
    pub vdev_id: u32,
}

/// Identifies the table slot a record was stored in.  Slots are reused
/// after removal but never reordered, so snapshot order is stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotHandle(pub(crate) usize);

/// Errors raised while mutating the connection table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("all {} connection slots are in use", MAX_CONCURRENT_CONNECTIONS)]
    TableFull,
    #[error("vdev {vdev_id} already has an active connection")]
    DuplicateVdev { vdev_id: u32 },
    #[error("vdev {vdev_id} has no active connection")]
    NotFound { vdev_id: u32 },
}

/// Fixed-capacity table of active connections.  Empty slots are `None`;
/// occupancy replaces the `in_use` flag a firmware-facing layout would
/// carry.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    slots: [Option<ConnectionRecord>; MAX_CONCURRENT_CONNECTIONS],
}

impl ConnectionTable {
    pub fn new() -> Self {
        ConnectionTable { slots: [None; MAX_CONCURRENT_CONNECTIONS] }
    }

    /// Stores a record in the first free slot.  Fails if the table is full
    /// or the vdev already has an active entry, which indicates stale
    /// bookkeeping in the caller.
    pub fn add_connection(&mut self, record: ConnectionRecord) -> Result<SlotHandle, TableError> {
        if self.slots.iter().flatten().any(|r| r.vdev_id == record.vdev_id) {
            return Err(TableError::DuplicateVdev { vdev_id: record.vdev_id });
        }
        match self.slots.iter().position(|slot| slot.is_none()) {
            Some(index) => {
                self.slots[index] = Some(record);
                Ok(SlotHandle(index))
            }
            None => Err(TableError::TableFull),
        }
    }

    /// Clears the slot holding the given vdev.  Removal of an absent vdev
    /// is reported but leaves the table untouched; teardown paths race and
    /// double-removal is expected.
    pub fn remove_connection(&mut self, vdev_id: u32) -> Result<(), TableError> {
        for slot in self.slots.iter_mut() {
            if slot.map(|r| r.vdev_id) == Some(vdev_id) {
                *slot = None;
                return Ok(());
            }
        }
        warn!("Removal requested for vdev {} which has no active connection", vdev_id);
        Err(TableError::NotFound { vdev_id })
    }

    /// Returns the active records in slot order.
    pub fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.slots.iter().flatten().copied().collect()
    }

    /// Number of active connections operating in the given role.
    pub fn count_of_mode(&self, mode: ConnMode) -> usize {
        self.slots.iter().flatten().filter(|r| r.mode == mode).count()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }
}
