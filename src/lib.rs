//! Launch core of a distribution-driven Minecraft launcher: compiles a
//! server's module tree, manifests and settings into a concrete process
//! invocation and supervises the running game.

pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::launch::{LaunchPlan, ProcessSupervisor};
pub use crate::core::session::LaunchSession;

/// Initialize structured logging. Respects `RUST_LOG`; defaults to `info`
/// with crate-level debug.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,embark=debug")),
        )
        .init();
}
