// Copyright 2022 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Concurrency policy engine for dual-MAC WLAN hardware.
//!
//! The engine tracks active connections in a fixed-capacity table,
//! classifies the current combination into a mode category, and derives
//! two kinds of policy output from it: a weighted preferred channel list
//! steering where a new connection should land, and a hardware mode
//! transition action (switch to DBS/SBS, collapse to a single MAC, adjust
//! spatial streams) whenever a connection is admitted or released.
//!
//! Nothing here talks to firmware.  The [`resolver::ConcurrencyResolver`]
//! produces recommendations; issuing the matching commands and PHY
//! reconfigurations belongs to the surrounding driver.

pub mod classifier;
pub mod connection_table;
pub mod pcl;
pub mod resolver;
pub mod transition;
pub mod types;

pub use {
    classifier::{classify, ConcRelationship, ModeCategory},
    connection_table::{ConnectionRecord, ConnectionTable, SlotHandle, TableError},
    pcl::{build_pcl, first_connection_pcl, PclChannelOrder, PclEntry, PclList, PclType},
    resolver::{AdmitDecision, ConcurrencyResolver, NssAdvisory, ReleaseDecision},
    transition::plan_transition,
    types::{
        Band, Bandwidth, ChainMode, ConcNextAction, ConcPriority, ConnMode, HwModeCaps,
        MAX_CONCURRENT_CONNECTIONS,
    },
};
