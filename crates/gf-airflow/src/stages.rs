//! Stage registrations for the remote deployment.
//!
//! Every stage body is the same monitoring loop; only CLEANUP additionally
//! flips the project's persisted completion flag once the remote pipeline
//! has finished with it.

use std::sync::Arc;

use gf_project::ProjectStore;
use gf_sim::{DeploymentProfile, RegistryBuilder, StageContext, StageName, StageTask, TaskResult};
use tracing::debug;

use crate::lifecycle::WorkflowLifecycle;
use crate::service::WorkflowService;

fn monitored(service: &Arc<WorkflowService>) -> Arc<dyn StageTask> {
    let service = service.clone();
    Arc::new(move |ctx: &StageContext<'_>| {
        debug!(stage = %ctx.stage, "launching remote task");
        service.monitor_stage(ctx.run_token, ctx.chapter, ctx.stage)
    })
}

/// Register the complete remote-profile table.
pub fn register_airflow_backend(
    builder: &mut RegistryBuilder,
    service: Arc<WorkflowService>,
    store: Arc<dyn ProjectStore>,
) {
    for stage in StageName::ALL {
        if stage == StageName::Cleanup {
            continue;
        }
        builder.register_task(DeploymentProfile::Remote, stage, monitored(&service));
    }

    let cleanup_service = service.clone();
    builder.register_task(
        DeploymentProfile::Remote,
        StageName::Cleanup,
        Arc::new(move |ctx: &StageContext<'_>| -> TaskResult<()> {
            cleanup_service.monitor_stage(ctx.run_token, ctx.chapter, ctx.stage)?;
            store.mark_finished(&ctx.metadata.project_id, true)?;
            Ok(())
        }),
    );

    builder.register_lifecycle(
        DeploymentProfile::Remote,
        Arc::new(WorkflowLifecycle::new(service)),
    );
}
