pub mod shutdown;
pub mod signals;

pub use shutdown::{ShutdownOutcome, ShutdownSupervisor};
pub use signals::{spawn_signal_listener, wait_for_signal};
