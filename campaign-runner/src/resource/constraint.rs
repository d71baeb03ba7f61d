// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Constraints and the connection-constraint traversal algebra (§4.B).

use super::device::{DeviceIndex, PortIndex};
use super::pool::ResourcePool;

/// A predicate over a device plus a human-readable description, used both to filter
/// `collect_device`/`collect_all_device` and as the embedded device-filter half of a
/// [`ConnectionConstraint`].
pub trait Constraint: Send + Sync {
    fn is_meet(&self, pool: &ResourcePool, device: DeviceIndex) -> bool;

    fn description(&self) -> &str;
}

/// A constraint that, in addition to filtering, can traverse the connection graph
/// from a device to a set of remote endpoints that satisfy it.
///
/// `get_connection` returning an empty vec means "failed": `collect_connection_route`
/// treats that as a whole-route failure, not as "zero endpoints found but otherwise
/// fine" (§4.B).
pub trait ConnectionConstraint: Constraint {
    fn get_connection(&self, pool: &ResourcePool, device: DeviceIndex) -> Vec<PortIndex>;
}

/// A connection constraint that finds a local port of `local_port_type`, follows its
/// remote ports to devices of `remote_device_type` meeting `device_filters`, and
/// (optionally) re-enters connection traversal on each qualified remote device via
/// `onward`. This is the general shape the AP→STA→TrafficGen example in §4.B
/// reduces to: a flat `PortConnection` with an empty `onward` list IS the AP-STA leg;
/// nesting another `PortConnection` in `onward` extends the route one hop further.
pub struct PortConnection {
    pub local_port_type: String,
    pub remote_device_type: String,
    pub device_filters: Vec<Box<dyn Constraint>>,
    pub onward: Vec<Box<dyn ConnectionConstraint>>,
    pub description: String,
}

impl Constraint for PortConnection {
    fn is_meet(&self, pool: &ResourcePool, device: DeviceIndex) -> bool {
        !self.get_connection(pool, device).is_empty()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl ConnectionConstraint for PortConnection {
    fn get_connection(&self, pool: &ResourcePool, device: DeviceIndex) -> Vec<PortIndex> {
        let mut endpoints = Vec::new();
        for port_index in pool.ports_of_type(device, &self.local_port_type) {
            for &remote_port_index in pool.remote_ports(port_index) {
                let remote_device = pool.port(remote_port_index).parent;
                if pool.device(remote_device).device_type != self.remote_device_type {
                    continue;
                }
                if !self
                    .device_filters
                    .iter()
                    .all(|filter| filter.is_meet(pool, remote_device))
                {
                    continue;
                }
                if !self.onward.is_empty()
                    && !self
                        .onward
                        .iter()
                        .all(|next| !next.get_connection(pool, remote_device).is_empty())
                {
                    continue;
                }
                endpoints.push(remote_port_index);
            }
        }
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::super::pool::ResourcePool;
    use super::*;

    struct AlwaysTrue;
    impl Constraint for AlwaysTrue {
        fn is_meet(&self, _pool: &ResourcePool, _device: DeviceIndex) -> bool {
            true
        }
        fn description(&self) -> &str {
            "always true"
        }
    }

    #[test]
    fn direct_connection_finds_linked_device() {
        let mut pool = ResourcePool::new();
        let ap = pool.add_device("ap1", "AP", false);
        let sta = pool.add_device("sta1", "STA", false);
        let ap_port = pool.add_port(ap, "wifi0", "radio");
        let sta_port = pool.add_port(sta, "wifi0", "radio");
        pool.link_ports(ap_port, sta_port);

        let constraint = PortConnection {
            local_port_type: "radio".to_string(),
            remote_device_type: "STA".to_string(),
            device_filters: vec![Box::new(AlwaysTrue)],
            onward: vec![],
            description: "ap-to-sta".to_string(),
        };
        let endpoints = constraint.get_connection(&pool, ap);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(pool.port(endpoints[0]).parent, sta);
    }

    #[test]
    fn unmatched_device_filter_excludes_endpoint() {
        struct NeverMeets;
        impl Constraint for NeverMeets {
            fn is_meet(&self, _pool: &ResourcePool, _device: DeviceIndex) -> bool {
                false
            }
            fn description(&self) -> &str {
                "never"
            }
        }

        let mut pool = ResourcePool::new();
        let ap = pool.add_device("ap1", "AP", false);
        let sta = pool.add_device("sta1", "STA", false);
        let ap_port = pool.add_port(ap, "wifi0", "radio");
        let sta_port = pool.add_port(sta, "wifi0", "radio");
        pool.link_ports(ap_port, sta_port);

        let constraint = PortConnection {
            local_port_type: "radio".to_string(),
            remote_device_type: "STA".to_string(),
            device_filters: vec![Box::new(NeverMeets)],
            onward: vec![],
            description: "ap-to-sta".to_string(),
        };
        assert!(constraint.get_connection(&pool, ap).is_empty());
        assert!(!constraint.is_meet(&pool, ap));
    }
}
