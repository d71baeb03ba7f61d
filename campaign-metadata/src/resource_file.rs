// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The on-disk JSON shape of a resource pool file (§6 of the design).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root object of a resource file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceFileSummary {
    /// Free-form information bag.
    #[serde(default)]
    pub info: BTreeMap<String, serde_json::Value>,

    /// The current reservation, if any.
    #[serde(default)]
    pub reserved: Option<ReservationSummary>,

    /// Devices keyed by name. Insertion order matters: `collect_device` walks devices in
    /// this order.
    pub devices: IndexMap<String, DeviceSummary>,
}

/// A reservation record: who holds the pool, and since when.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub owner: String,
    pub date: String,
}

/// A device entry in the resource file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pre_connect: bool,
    pub ports: IndexMap<String, PortSummary>,

    /// Any other custom attributes (e.g. `version`, management endpoint) the device
    /// carries. Round-tripped verbatim.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A port entry in the resource file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub remote_ports: Vec<RemotePortRef>,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// A reference to a remote `(device, port)` pair, used to resolve the link graph on
/// load without requiring cyclic references in the wire format itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemotePortRef {
    pub device: String,
    pub port: String,
}
