// ─── Launch Pipeline ───
// From resolved inputs to a running, supervised game process.

pub mod args;
pub mod classpath;
pub mod compiler;
pub mod modlist;
pub mod natives;
pub mod resolver;
pub mod supervisor;

pub use compiler::{compile, CompileInputs, LaunchPlan};
pub use natives::sweep_stale_natives;
pub use resolver::{resolve_modules, ResolutionResult, ResolvedMod};
pub use supervisor::{
    PresenceUpdate, ProcessSupervisor, SupervisorEvents, SupervisorState,
};
