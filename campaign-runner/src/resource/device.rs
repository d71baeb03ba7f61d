// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arena-addressed devices and ports (§4.B, §9).

use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;

/// Dense index into [`super::pool::ResourcePool::devices`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceIndex(pub(crate) usize);

/// Dense index into [`super::pool::ResourcePool::ports`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortIndex(pub(crate) usize);

/// A resource device. Ports are referenced by index rather than owned inline so a
/// port can cheaply carry a back-reference (`parent`) to its device without the
/// device/port pair being a cyclic Rc/RefCell graph (§9).
#[derive(Clone, Debug)]
pub struct Device {
    pub name: String,
    pub device_type: String,
    pub description: String,
    pub pre_connect: bool,
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Port name -> index, insertion ordered to match device/port iteration order
    /// during `collect_device`.
    pub ports: IndexMap<String, PortIndex>,
}

/// A device port. `remote_ports` is a set, not a list: the undirected link graph
/// must stay symmetric and duplicate-free after load (§3 invariant).
#[derive(Clone, Debug)]
pub struct Port {
    pub name: String,
    pub port_type: String,
    pub description: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub parent: DeviceIndex,
    pub remote_ports: IndexSet<PortIndex>,
}
