// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide device/port factory registry (§4.B).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ResourceError;

/// A live communication instance for a device, as produced by a registered factory.
/// Most devices never get one unless `pre_connect` or a case explicitly asks for it.
pub trait CommInstance: Send + Sync {
    fn connect(&self) -> Result<(), String>;
}

type DeviceFactory = Arc<dyn Fn(&str) -> Arc<dyn CommInstance> + Send + Sync>;
type PortFactory = Arc<dyn Fn(&str, &str) -> Arc<dyn CommInstance> + Send + Sync>;

/// *register_resource(category, type, factory)* (§4.B): two process-wide mappings
/// from resource type name to factory, one for devices and one for ports (the
/// reference source keeps `_resource_device_mapping` and `_resource_port_mapping`
/// as separate dicts keyed by `category`). An explicit object (not a global
/// singleton) so tests can build a private registry.
#[derive(Default)]
pub struct ResourceRegistry {
    device_factories: HashMap<String, DeviceFactory>,
    port_factories: HashMap<String, PortFactory>,
    /// Cached comm instances, one per device name, populated lazily.
    instances: Mutex<HashMap<String, Arc<dyn CommInstance>>>,
    /// Cached comm instances, keyed by `device.port` since port names repeat
    /// across devices.
    port_instances: Mutex<HashMap<String, Arc<dyn CommInstance>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_device_type(&mut self, device_type: impl Into<String>, factory: DeviceFactory) {
        self.device_factories.insert(device_type.into(), factory);
    }

    pub fn register_port_type(&mut self, port_type: impl Into<String>, factory: PortFactory) {
        self.port_factories.insert(port_type.into(), factory);
    }

    /// `device.get_comm_instance(new=False)`: returns the cached instance or builds
    /// one via the registered factory; fails if the device type was never
    /// registered. `new=true` forces recreation.
    pub fn get_comm_instance(&self, device_type: &str, device_name: &str) -> Result<Arc<dyn CommInstance>, ResourceError> {
        self.get_comm_instance_inner(device_type, device_name, false)
    }

    pub fn get_new_comm_instance(&self, device_type: &str, device_name: &str) -> Result<Arc<dyn CommInstance>, ResourceError> {
        self.get_comm_instance_inner(device_type, device_name, true)
    }

    fn get_comm_instance_inner(&self, device_type: &str, device_name: &str, force_new: bool) -> Result<Arc<dyn CommInstance>, ResourceError> {
        let mut instances = self.instances.lock();
        if !force_new {
            if let Some(existing) = instances.get(device_name) {
                return Ok(Arc::clone(existing));
            }
        }
        let factory = self
            .device_factories
            .get(device_type)
            .ok_or_else(|| ResourceError::UnregisteredType(device_type.to_string()))?;
        let instance = factory(device_name);
        instances.insert(device_name.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// `port.get_comm_instance(new=False)`, the port-side counterpart.
    pub fn get_port_comm_instance(&self, port_type: &str, device_name: &str, port_name: &str) -> Result<Arc<dyn CommInstance>, ResourceError> {
        self.get_port_comm_instance_inner(port_type, device_name, port_name, false)
    }

    pub fn get_new_port_comm_instance(&self, port_type: &str, device_name: &str, port_name: &str) -> Result<Arc<dyn CommInstance>, ResourceError> {
        self.get_port_comm_instance_inner(port_type, device_name, port_name, true)
    }

    fn get_port_comm_instance_inner(
        &self,
        port_type: &str,
        device_name: &str,
        port_name: &str,
        force_new: bool,
    ) -> Result<Arc<dyn CommInstance>, ResourceError> {
        let key = format!("{device_name}.{port_name}");
        let mut instances = self.port_instances.lock();
        if !force_new {
            if let Some(existing) = instances.get(&key) {
                return Ok(Arc::clone(existing));
            }
        }
        let factory = self
            .port_factories
            .get(port_type)
            .ok_or_else(|| ResourceError::UnregisteredType(port_type.to_string()))?;
        let instance = factory(device_name, port_name);
        instances.insert(key, Arc::clone(&instance));
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeInstance;
    impl CommInstance for FakeInstance {
        fn connect(&self) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn unregistered_type_fails() {
        let registry = ResourceRegistry::new();
        let result = registry.get_comm_instance("AP", "ap1");
        assert!(matches!(result, Err(ResourceError::UnregisteredType(_))));
    }

    #[test]
    fn cached_instance_is_reused_unless_forced() {
        let mut registry = ResourceRegistry::new();
        registry.register_device_type("AP", Arc::new(|_name: &str| Arc::new(FakeInstance) as Arc<dyn CommInstance>));
        let first = registry.get_comm_instance("AP", "ap1").unwrap();
        let second = registry.get_comm_instance("AP", "ap1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let forced = registry.get_new_comm_instance("AP", "ap1").unwrap();
        assert!(!Arc::ptr_eq(&first, &forced));
    }

    #[test]
    fn port_factory_is_a_mapping_distinct_from_device_factory() {
        let mut registry = ResourceRegistry::new();
        let result = registry.get_port_comm_instance("Ethernet", "switch1", "ETH1/1");
        assert!(matches!(result, Err(ResourceError::UnregisteredType(_))));

        registry.register_port_type("Ethernet", Arc::new(|_device: &str, _port: &str| Arc::new(FakeInstance) as Arc<dyn CommInstance>));
        let first = registry.get_port_comm_instance("Ethernet", "switch1", "ETH1/1").unwrap();
        let second = registry.get_port_comm_instance("Ethernet", "switch1", "ETH1/1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Same port name on a different device is a distinct cached instance.
        let other_device = registry.get_port_comm_instance("Ethernet", "switch2", "ETH1/1").unwrap();
        assert!(!Arc::ptr_eq(&first, &other_device));
    }
}
