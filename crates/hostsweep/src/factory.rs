//! Executor and pipeline construction

use std::sync::Arc;

use hostsweep_core::{Pipeline, SweepConfig, needs_sudo};
use hostsweep_exec::LocalExecutor;
use hostsweep_pkg::{BinaryProbe, PathProbe};

/// Create the local executor, elevating privileged commands per config
pub async fn create_executor(config: &SweepConfig) -> LocalExecutor {
    let use_sudo = needs_sudo(config.general.privilege, &LocalExecutor::new()).await;
    tracing::debug!(use_sudo, privilege = ?config.general.privilege, "created local executor");
    LocalExecutor::new().with_sudo(use_sudo)
}

/// Probe used for detection on this host
pub fn create_probe() -> Arc<dyn BinaryProbe> {
    Arc::new(PathProbe)
}

/// Wire up a pipeline for the local host
pub async fn create_pipeline(config: SweepConfig) -> Pipeline {
    let executor = create_executor(&config).await;
    Pipeline::new(Arc::new(executor), create_probe(), config)
}
