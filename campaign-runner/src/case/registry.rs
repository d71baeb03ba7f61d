// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide, write-once case registry (§4.H).

use std::collections::HashMap;

use super::descriptor::{CaseConstructor, CaseDescriptor};

/// Maps the textual `"module.Class"` type id preserved from test-list files to a
/// constructor closure and its descriptor. Populated by explicit registration calls
/// the binary wires up at startup, replacing runtime dotted-name class discovery
/// (§4.H, §9).
#[derive(Default)]
pub struct CaseRegistry {
    entries: HashMap<String, (CaseDescriptor, CaseConstructor)>,
}

impl CaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: CaseDescriptor, constructor: CaseConstructor) {
        self.entries.insert(descriptor.type_id.clone(), (descriptor, constructor));
    }

    pub fn lookup(&self, type_id: &str) -> Option<(&CaseDescriptor, &CaseConstructor)> {
        self.entries.get(type_id).map(|(descriptor, ctor)| (descriptor, ctor))
    }

    pub fn is_registered(&self, type_id: &str) -> bool {
        self.entries.contains_key(type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::descriptor::Case;

    struct Noop;
    impl Case for Noop {
        fn test(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unregistered_type_id_resolves_to_none() {
        let registry = CaseRegistry::new();
        assert!(registry.lookup("mod.Missing").is_none());
    }

    #[test]
    fn registered_type_id_resolves() {
        let mut registry = CaseRegistry::new();
        registry.register(CaseDescriptor::new("mod.Case"), std::sync::Arc::new(|_ctx| Box::new(Noop) as Box<dyn Case>));
        assert!(registry.is_registered("mod.Case"));
    }
}
