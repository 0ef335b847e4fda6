//! Switch UUID registry.
//!
//! Switches are addressed externally by UUID; the UUID is used only for
//! lookup and never changes after discovery.

use std::collections::HashMap;
use uuid::Uuid;

/// UUID → switch id lookup table.
#[derive(Debug, Clone, Default)]
pub struct SwitchRegistry {
    by_uuid: HashMap<Uuid, u16>,
}

impl SwitchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a switch under its external UUID.
    pub fn register(&mut self, uuid: Uuid, switch_id: u16) {
        self.by_uuid.insert(uuid, switch_id);
    }

    /// Looks up the switch id behind a UUID.
    pub fn switch_id(&self, uuid: &Uuid) -> Option<u16> {
        self.by_uuid.get(uuid).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SwitchRegistry::new();
        let uuid = Uuid::new_v4();
        registry.register(uuid, 2);
        assert_eq!(registry.switch_id(&uuid), Some(2));
        assert_eq!(registry.switch_id(&Uuid::new_v4()), None);
    }
}
