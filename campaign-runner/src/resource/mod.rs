// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resource pool, constraints, reservation and the device/port registry (§4.B).

mod constraint;
mod device;
mod pool;
mod registry;

pub use constraint::{Constraint, ConnectionConstraint, PortConnection};
pub use device::{Device, DeviceIndex, Port, PortIndex};
pub use pool::ResourcePool;
pub use registry::{CommInstance, ResourceRegistry};
