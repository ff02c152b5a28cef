//! hostsweep-exec: Command execution abstraction
//!
//! Provides the executor trait the orchestrator issues external commands through,
//! and a local implementation backed by `tokio::process`

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use command::CommandSpec;
pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::CommandExecutor;
