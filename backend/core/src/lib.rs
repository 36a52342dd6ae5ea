//! Core vocabulary of the orbit lifecycle kernel: phases, handler traits,
//! lifecycle events and the kernel error type.

pub mod error;
pub mod event;
pub mod extension_points;
pub mod panic;
pub mod phase;
pub mod traits;

pub use error::{OrbitError, Result};
pub use event::{LifecycleEvent, LifecycleEventKind};
pub use panic::panic_message;
pub use phase::LifecyclePhase;
pub use traits::{Connector, Destructor, HealthCheck, HealthProbe, PluginInterface};
