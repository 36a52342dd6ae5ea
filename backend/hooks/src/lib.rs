pub mod escalation;
pub mod extensions;
pub mod registry;
pub mod types;

pub use escalation::{ErrorChannel, ErrorReporter};
pub use extensions::ExtensionEngine;
pub use registry::HookBus;
pub use types::{ErrorListener, ExtensionHandler, ExtensionRegistration, HookListener};
