// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Coordination bus: leased liveness records, append-only event logs, and
//! latest-state singletons, backed by etcd in production and by an
//! in-process `BTreeMap` double in tests or when `ETCD_ENDPOINTS` is unset.

mod bus;
mod error;
mod etcd;
mod keys;
mod memory;

pub use bus::{BusEvent, CoordinationBus, EVENT_LEASE_SECS, HEARTBEAT_LEASE_SECS};
pub use error::BusError;
pub use etcd::EtcdBus;
pub use keys::{event_key, event_prefix, node_heartbeat_key, state_key};
pub use memory::MemoryBus;
