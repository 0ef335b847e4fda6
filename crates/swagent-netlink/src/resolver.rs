//! Interface name/index resolution seam.
//!
//! Builders and dump parsers need the kernel's name↔index mapping. Putting
//! it behind a trait keeps the codec testable with synthetic indexes and
//! lets simulated runs supply a fixed table.

use std::collections::HashMap;
use std::ffi::CStr;

/// Resolves interface names to kernel interface indexes and back.
pub trait IfaceResolver: Send + Sync {
    /// Returns the interface index for `name`, if the interface exists.
    fn index_of(&self, name: &str) -> Option<u32>;

    /// Returns the interface name for `index`, if the interface exists.
    fn name_of(&self, index: u32) -> Option<String>;
}

/// Resolution through the OS (`if_nametoindex`/`if_indextoname`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SysResolver;

impl IfaceResolver for SysResolver {
    fn index_of(&self, name: &str) -> Option<u32> {
        match nix::net::if_::if_nametoindex(name) {
            Ok(0) | Err(_) => None,
            Ok(index) => Some(index),
        }
    }

    fn name_of(&self, index: u32) -> Option<String> {
        let mut buf = [0 as libc::c_char; libc::IF_NAMESIZE];
        let name = unsafe { libc::if_indextoname(index, buf.as_mut_ptr()) };
        if name.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(name) };
        name.to_str().ok().map(str::to_string)
    }
}

/// Fixed name↔index table, for tests and simulated runs.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    by_name: HashMap<String, u32>,
    by_index: HashMap<u32, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one interface to the table.
    pub fn with(mut self, name: &str, index: u32) -> Self {
        self.by_name.insert(name.to_string(), index);
        self.by_index.insert(index, name.to_string());
        self
    }
}

impl IfaceResolver for StaticResolver {
    fn index_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    fn name_of(&self, index: u32) -> Option<String> {
        self.by_index.get(&index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolver() {
        let resolver = StaticResolver::new().with("sw0p1", 7).with("sw0p2", 8);
        assert_eq!(resolver.index_of("sw0p1"), Some(7));
        assert_eq!(resolver.name_of(8).as_deref(), Some("sw0p2"));
        assert_eq!(resolver.index_of("sw0p9"), None);
        assert_eq!(resolver.name_of(99), None);
    }
}
