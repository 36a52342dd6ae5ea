//! Plugin registry: resolves plugin names to descriptors.
//!
//! Descriptors live in named lookup locations searched in order: the local
//! (override) location first, then the shared namespace. The first hit wins.
//! The locations are filled from a discovery table at startup; nothing is
//! searched on disk.
use std::collections::{HashMap, HashSet};

use orbit_core::OrbitError;
use tracing::{debug, info};

use crate::descriptor::PluginDescriptor;

pub const LOCAL_LOCATION: &str = "local";
pub const SHARED_LOCATION: &str = "shared";

struct LookupLocation {
    name: String,
    descriptors: HashMap<String, PluginDescriptor>,
}

pub struct PluginRegistry {
    locations: Vec<LookupLocation>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// Registry with the `local` and `shared` locations.
    pub fn new() -> Self {
        Self::with_locations([LOCAL_LOCATION, SHARED_LOCATION])
    }

    /// Registry with custom lookup locations, searched in the given order.
    pub fn with_locations<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locations = locations
            .into_iter()
            .map(|name| LookupLocation { name: name.into(), descriptors: HashMap::new() })
            .collect();
        Self { locations }
    }

    /// Register into the shared namespace.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<(), OrbitError> {
        self.register_in(SHARED_LOCATION, descriptor)
    }

    /// Register into the local location, shadowing any shared descriptor of
    /// the same name.
    pub fn register_override(&mut self, descriptor: PluginDescriptor) -> Result<(), OrbitError> {
        self.register_in(LOCAL_LOCATION, descriptor)
    }

    pub fn register_in(&mut self, location: &str, descriptor: PluginDescriptor) -> Result<(), OrbitError> {
        let slot = self
            .locations
            .iter_mut()
            .find(|l| l.name == location)
            .ok_or_else(|| OrbitError::Config(format!("unknown plugin lookup location: {location}")))?;
        if slot.descriptors.contains_key(descriptor.name()) {
            return Err(OrbitError::DuplicatePlugin(descriptor.name().to_string()));
        }
        debug!(plugin = descriptor.name(), location, phase = %descriptor.phase(), "Registered plugin descriptor");
        slot.descriptors.insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    /// First descriptor named `name`, searching locations in order.
    pub fn lookup(&self, name: &str) -> Option<&PluginDescriptor> {
        self.locations.iter().find_map(|l| l.descriptors.get(name))
    }

    /// Every name resolvable through this registry, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .locations
            .iter()
            .flat_map(|l| l.descriptors.keys().map(String::as_str))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort_unstable();
        names
    }

    /// Resolve `names` to descriptors in attach order.
    ///
    /// Fails on the first name that no location knows, or on a name that is
    /// requested twice. The result is sorted by phase, then priority; equal
    /// keys keep the requested order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PluginDescriptor>, OrbitError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(OrbitError::DuplicatePlugin(name.to_string()));
            }
            let descriptor = self.lookup(name).ok_or_else(|| OrbitError::PluginNotFound {
                name: name.to_string(),
                searched: self.location_names().join(", "),
            })?;
            resolved.push(descriptor.clone());
        }
        sort_for_attach(&mut resolved);
        info!(
            order = ?resolved.iter().map(PluginDescriptor::name).collect::<Vec<_>>(),
            "Resolved plugins"
        );
        Ok(resolved)
    }

    fn location_names(&self) -> Vec<&str> {
        self.locations.iter().map(|l| l.name.as_str()).collect()
    }
}

/// Stable sort by phase order, then priority ascending.
pub fn sort_for_attach(descriptors: &mut [PluginDescriptor]) {
    descriptors.sort_by_key(|d| (d.phase(), d.priority()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::LifecyclePhase;

    fn plugin(name: &str, phase: LifecyclePhase, priority: i32) -> PluginDescriptor {
        PluginDescriptor::new(name, phase, |_, _| Ok(None)).with_priority(priority)
    }

    fn names(descriptors: &[PluginDescriptor]) -> Vec<&str> {
        descriptors.iter().map(PluginDescriptor::name).collect()
    }

    #[test]
    fn local_location_shadows_shared() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("amqp", LifecyclePhase::Transport, 0)).unwrap();
        registry.register_override(plugin("amqp", LifecyclePhase::Transport, 7)).unwrap();
        assert_eq!(registry.lookup("amqp").unwrap().priority(), 7);
        assert_eq!(registry.names(), vec!["amqp"]);
    }

    #[test]
    fn missing_plugin_is_fatal_and_names_locations() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("amqp", LifecyclePhase::Transport, 0)).unwrap();
        let err = registry.resolve(&["amqp", "kafka"]).unwrap_err();
        match err {
            OrbitError::PluginNotFound { name, searched } => {
                assert_eq!(name, "kafka");
                assert_eq!(searched, "local, shared");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_request_is_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("http", LifecyclePhase::Transport, 0)).unwrap();
        let err = registry.resolve(&["http", "http"]).unwrap_err();
        assert!(matches!(err, OrbitError::DuplicatePlugin(ref n) if n == "http"));
    }

    #[test]
    fn duplicate_registration_in_one_location_is_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(plugin("http", LifecyclePhase::Transport, 0)).unwrap();
        assert!(registry.register(plugin("http", LifecyclePhase::Transport, 1)).is_err());
        assert!(registry.register_in("vendor", plugin("x", LifecyclePhase::Essential, 0)).is_err());
    }

    #[test]
    fn sorted_by_phase_then_priority_stably() {
        let mut registry = PluginRegistry::new();
        for d in [
            plugin("router", LifecyclePhase::Application, 0),
            plugin("amqp", LifecyclePhase::Transport, 0),
            plugin("http", LifecyclePhase::Transport, -1),
            plugin("pg", LifecyclePhase::Database, 0),
            plugin("validator", LifecyclePhase::Essential, 0),
            plugin("redis", LifecyclePhase::Database, 0),
        ] {
            registry.register(d).unwrap();
        }
        let resolved = registry
            .resolve(&["router", "amqp", "http", "redis", "pg", "validator"])
            .unwrap();
        assert_eq!(names(&resolved), vec!["validator", "redis", "pg", "http", "amqp", "router"]);
    }

    #[test]
    fn custom_locations_are_searched_in_order() {
        let mut registry = PluginRegistry::with_locations(["app", "vendor", "core"]);
        registry.register_in("core", plugin("pg", LifecyclePhase::Database, 0)).unwrap();
        registry.register_in("vendor", plugin("pg", LifecyclePhase::Database, 3)).unwrap();
        assert_eq!(registry.lookup("pg").unwrap().priority(), 3);
        assert!(registry.register(plugin("other", LifecyclePhase::Database, 0)).is_err());
    }
}
