//! Plugin kernel of an orbit service: descriptors, the plugin registry, the
//! lifecycle orchestrator and the `Service` aggregate built on top of them.

pub mod descriptor;
pub mod event_bus;
pub mod lifecycle;
pub mod registry;
pub mod service;

pub use descriptor::{AttachFn, PluginDescriptor};
pub use event_bus::EventBus;
pub use lifecycle::{AttachContext, ConnectorEntry, Contributions, DestructorEntry, LifecycleOrchestrator};
pub use registry::{LOCAL_LOCATION, PluginRegistry, SHARED_LOCATION, sort_for_attach};
pub use service::{Service, ServiceBuilder};
