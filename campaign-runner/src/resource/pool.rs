// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resource pool: load/save, selection, and reservation (§4.B).

use camino::{Utf8Path, Utf8PathBuf};
use campaign_metadata::resource_file::{DeviceSummary, PortSummary, RemotePortRef, ReservationSummary, ResourceFileSummary};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;

use crate::errors::ResourceError;

use super::constraint::{Constraint, ConnectionConstraint};
use super::device::{Device, DeviceIndex, Port, PortIndex};
use super::registry::ResourceRegistry;

/// A loaded resource pool: two dense arenas plus the device-name index, matching the
/// topology design in §4.B/§9.
pub struct ResourcePool {
    devices: Vec<Device>,
    ports: Vec<Port>,
    /// device name -> arena index, insertion ordered (selection iterates in this
    /// order).
    by_name: IndexMap<String, DeviceIndex>,
    pub information: BTreeMap<String, serde_json::Value>,
    pub reservation: Option<ReservationSummary>,
    pub loaded_from: Option<Utf8PathBuf>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            ports: Vec::new(),
            by_name: IndexMap::new(),
            information: BTreeMap::new(),
            reservation: None,
            loaded_from: None,
        }
    }

    pub fn device(&self, index: DeviceIndex) -> &Device {
        &self.devices[index.0]
    }

    pub fn port(&self, index: PortIndex) -> &Port {
        &self.ports[index.0]
    }

    pub fn device_by_name(&self, name: &str) -> Option<DeviceIndex> {
        self.by_name.get(name).copied()
    }

    pub fn remote_ports(&self, port: PortIndex) -> &IndexSet<PortIndex> {
        &self.ports[port.0].remote_ports
    }

    pub fn ports_of_type<'a>(&'a self, device: DeviceIndex, port_type: &'a str) -> impl Iterator<Item = PortIndex> + 'a {
        self.devices[device.0]
            .ports
            .values()
            .copied()
            .filter(move |&idx| self.ports[idx.0].port_type == port_type)
    }

    /// Test/fixture helper: real loads go through [`Self::load`].
    pub fn add_device(&mut self, name: &str, device_type: &str, pre_connect: bool) -> DeviceIndex {
        let index = DeviceIndex(self.devices.len());
        self.devices.push(Device {
            name: name.to_string(),
            device_type: device_type.to_string(),
            description: String::new(),
            pre_connect,
            attributes: BTreeMap::new(),
            ports: IndexMap::new(),
        });
        self.by_name.insert(name.to_string(), index);
        index
    }

    pub fn add_port(&mut self, device: DeviceIndex, name: &str, port_type: &str) -> PortIndex {
        let index = PortIndex(self.ports.len());
        self.ports.push(Port {
            name: name.to_string(),
            port_type: port_type.to_string(),
            description: String::new(),
            attributes: BTreeMap::new(),
            parent: device,
            remote_ports: IndexSet::new(),
        });
        self.devices[device.0].ports.insert(name.to_string(), index);
        index
    }

    /// Link two ports symmetrically: `a->b` implies `b->a` (§3 invariant).
    pub fn link_ports(&mut self, a: PortIndex, b: PortIndex) {
        self.ports[a.0].remote_ports.insert(b);
        self.ports[b.0].remote_ports.insert(a);
    }

    /// `collect_device(type, count, constraints)`: iterate devices in insertion
    /// order, keep the first `count` whose every constraint is met.
    pub fn collect_device(&self, device_type: &str, count: usize, constraints: &[Box<dyn Constraint>]) -> Vec<DeviceIndex> {
        self.all_matching(device_type, constraints).take(count).collect()
    }

    pub fn collect_all_device(&self, device_type: &str, constraints: &[Box<dyn Constraint>]) -> Vec<DeviceIndex> {
        self.all_matching(device_type, constraints).collect()
    }

    fn all_matching<'a>(&'a self, device_type: &'a str, constraints: &'a [Box<dyn Constraint>]) -> impl Iterator<Item = DeviceIndex> + 'a {
        self.by_name.values().copied().filter(move |&idx| {
            self.devices[idx.0].device_type == device_type
                && constraints.iter().all(|c| c.is_meet(self, idx))
        })
    }

    /// `collect_connection_route`: every constraint must be a connection constraint
    /// and yield at least one endpoint; the route is their concatenated endpoints.
    pub fn collect_connection_route(
        &self,
        device: DeviceIndex,
        constraints: &[Box<dyn ConnectionConstraint>],
    ) -> Result<Vec<PortIndex>, ResourceError> {
        let mut route = Vec::new();
        for constraint in constraints {
            let endpoints = constraint.get_connection(self, device);
            if endpoints.is_empty() {
                return Err(ResourceError::UnregisteredType(format!(
                    "constraint `{}` not met",
                    constraint.description()
                )));
            }
            route.extend(endpoints);
        }
        Ok(route)
    }

    /// `reserve(owner)`: re-read the on-disk file, require no reservation or a
    /// reservation already held by `owner`, then persist.
    pub fn reserve(&mut self, path: &Utf8Path, owner: &str) -> Result<(), crate::errors::EngineError> {
        let summary = load_summary(path)?;
        if let Some(existing) = &summary.reserved {
            if existing.owner != owner {
                return Err(crate::errors::EngineError::ResourceReservedByOther {
                    path: path.to_path_buf(),
                    owner: existing.owner.clone(),
                });
            }
        }
        let reservation = ReservationSummary {
            owner: owner.to_string(),
            date: chrono::Local::now().to_rfc3339(),
        };
        let mut summary = summary;
        summary.reserved = Some(reservation.clone());
        save_summary(path, &summary)?;
        self.reservation = Some(reservation);
        Ok(())
    }

    /// `release(owner)`: re-read, clear if owned by `owner`, persist.
    pub fn release(&mut self, path: &Utf8Path, owner: &str) -> Result<(), crate::errors::EngineError> {
        let mut summary = load_summary(path)?;
        match &summary.reserved {
            Some(existing) if existing.owner == owner => {
                summary.reserved = None;
                save_summary(path, &summary)?;
                self.reservation = None;
                Ok(())
            }
            Some(existing) => Err(crate::errors::EngineError::ResourceReservedByOther {
                path: path.to_path_buf(),
                owner: existing.owner.clone(),
            }),
            None => {
                self.reservation = None;
                Ok(())
            }
        }
    }

    /// Load a resource pool owned by `owner`; fails if reserved by someone else.
    /// Every device with `pre_connect` then gets a best-effort connect sweep run by
    /// the caller via [`Self::pre_connect_sweep`] (kept separate since it needs the
    /// registry, which the pool itself doesn't own).
    pub fn load(path: &Utf8Path, owner: &str) -> Result<Self, crate::errors::EngineError> {
        let summary = load_summary(path)?;
        if let Some(reservation) = &summary.reserved {
            if reservation.owner != owner {
                return Err(crate::errors::EngineError::ResourceReservedByOther {
                    path: path.to_path_buf(),
                    owner: reservation.owner.clone(),
                });
            }
        }
        let mut pool = Self::new();
        pool.loaded_from = Some(path.to_path_buf());
        pool.reservation = summary.reserved.clone();
        pool.information = summary.info.clone();

        for (name, device_summary) in &summary.devices {
            let device_index = pool.add_device(name, &device_summary.device_type, device_summary.pre_connect);
            pool.devices[device_index.0].description = device_summary.description.clone().unwrap_or_default();
            pool.devices[device_index.0].attributes = device_summary.attributes.clone();
            for (port_name, port_summary) in &device_summary.ports {
                let port_index = pool.add_port(device_index, port_name, &port_summary.port_type);
                pool.ports[port_index.0].description = port_summary.description.clone().unwrap_or_default();
                pool.ports[port_index.0].attributes = port_summary.attributes.clone();
            }
        }

        // Second pass: remote-port references may point forward to devices/ports
        // not yet seen in the first pass.
        for (device_name, device_summary) in &summary.devices {
            let device_index = *pool.by_name.get(device_name).expect("just inserted");
            for (port_name, port_summary) in &device_summary.ports {
                let port_index = pool.devices[device_index.0].ports[port_name];
                for remote in &port_summary.remote_ports {
                    let remote_port = pool.resolve_remote(remote).map_err(|source| crate::errors::EngineError::ResourceLoad {
                        path: path.to_path_buf(),
                        source,
                    })?;
                    pool.ports[port_index.0].remote_ports.insert(remote_port);
                }
            }
        }

        Ok(pool)
    }

    fn resolve_remote(&self, remote: &RemotePortRef) -> Result<PortIndex, ResourceError> {
        let device_index = self.by_name.get(&remote.device).ok_or_else(|| ResourceError::DanglingRemotePort {
            device: remote.device.clone(),
            port: remote.port.clone(),
        })?;
        self.devices[device_index.0]
            .ports
            .get(&remote.port)
            .copied()
            .ok_or_else(|| ResourceError::DanglingRemotePort {
                device: remote.device.clone(),
                port: remote.port.clone(),
            })
    }

    /// Pre-connect sweep (§4.B): best-effort, failures are logged, never abort load.
    pub fn pre_connect_sweep(&self, registry: &ResourceRegistry) {
        for device in &self.devices {
            if !device.pre_connect {
                continue;
            }
            match registry.get_comm_instance(&device.device_type, &device.name) {
                Ok(instance) => {
                    if let Err(err) = instance.connect() {
                        tracing::warn!(device = %device.name, error = %err, "pre-connect failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(device = %device.name, error = %err, "pre-connect instance unavailable");
                }
            }
        }
    }

    pub fn to_summary(&self) -> ResourceFileSummary {
        let mut devices = IndexMap::new();
        for (name, &device_index) in &self.by_name {
            let device = &self.devices[device_index.0];
            let mut ports = IndexMap::new();
            for (port_name, &port_index) in &device.ports {
                let port = &self.ports[port_index.0];
                let remote_ports = port
                    .remote_ports
                    .iter()
                    .map(|&remote_index| {
                        let remote_port = &self.ports[remote_index.0];
                        let remote_device = &self.devices[remote_port.parent.0];
                        RemotePortRef {
                            device: remote_device.name.clone(),
                            port: remote_port.name.clone(),
                        }
                    })
                    .collect();
                ports.insert(
                    port_name.clone(),
                    PortSummary {
                        name: port.name.clone(),
                        port_type: port.port_type.clone(),
                        description: Some(port.description.clone()),
                        remote_ports,
                        attributes: port.attributes.clone(),
                    },
                );
            }
            devices.insert(
                name.clone(),
                DeviceSummary {
                    name: device.name.clone(),
                    device_type: device.device_type.clone(),
                    description: Some(device.description.clone()),
                    pre_connect: device.pre_connect,
                    ports,
                    attributes: device.attributes.clone(),
                },
            );
        }
        ResourceFileSummary {
            info: self.information.clone(),
            reserved: self.reservation.clone(),
            devices,
        }
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), crate::errors::EngineError> {
        save_summary(path, &self.to_summary())
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new()
    }
}

fn load_summary(path: &Utf8Path) -> Result<ResourceFileSummary, crate::errors::EngineError> {
    let text = std::fs::read_to_string(path).map_err(|err| crate::errors::EngineError::ResourceLoad {
        path: path.to_path_buf(),
        source: ResourceError::Metadata(campaign_metadata::MetadataError::io(path, err)),
    })?;
    serde_json::from_str(&text).map_err(|err| crate::errors::EngineError::ResourceLoad {
        path: path.to_path_buf(),
        source: ResourceError::Metadata(campaign_metadata::MetadataError::json(path, err)),
    })
}

fn save_summary(path: &Utf8Path, summary: &ResourceFileSummary) -> Result<(), crate::errors::EngineError> {
    let text = serde_json::to_string_pretty(summary).map_err(|err| crate::errors::EngineError::ResourceLoad {
        path: path.to_path_buf(),
        source: ResourceError::Metadata(campaign_metadata::MetadataError::json(path, err)),
    })?;
    std::fs::write(path, text).map_err(|err| crate::errors::EngineError::ResourceLoad {
        path: path.to_path_buf(),
        source: ResourceError::Metadata(campaign_metadata::MetadataError::io(path, err)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_ports_is_symmetric() {
        let mut pool = ResourcePool::new();
        let a = pool.add_device("a", "AP", false);
        let b = pool.add_device("b", "STA", false);
        let pa = pool.add_port(a, "p0", "radio");
        let pb = pool.add_port(b, "p0", "radio");
        pool.link_ports(pa, pb);
        assert!(pool.remote_ports(pa).contains(&pb));
        assert!(pool.remote_ports(pb).contains(&pa));
    }

    #[test]
    fn collect_device_respects_count_and_order() {
        let mut pool = ResourcePool::new();
        pool.add_device("a1", "AP", false);
        pool.add_device("a2", "AP", false);
        pool.add_device("s1", "STA", false);
        let found = pool.collect_device("AP", 1, &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(pool.device(found[0]).name, "a1");
    }

    #[test]
    fn round_trips_through_summary() {
        let mut pool = ResourcePool::new();
        let a = pool.add_device("a", "AP", true);
        let b = pool.add_device("b", "STA", false);
        let pa = pool.add_port(a, "p0", "radio");
        let pb = pool.add_port(b, "p0", "radio");
        pool.link_ports(pa, pb);

        let summary = pool.to_summary();
        let json = serde_json::to_string(&summary).unwrap();
        let back: ResourceFileSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.devices.len(), 2);
        assert_eq!(back.devices["a"].ports["p0"].remote_ports[0].device, "b");
    }
}
