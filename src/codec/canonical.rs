//! Deterministic ordering for collections the remote service returns in no
//! particular order.
//!
//! Canonicalizing never changes the meaning of a plan, only the order of
//! collections whose order is not significant. It is idempotent.

use crate::config::tree::{ExecutionBlockConfigTree, PlanTree, StepTree, WorkflowTree};
use crate::model::{Plan, WireEnum, WorkflowTargetAction};

pub trait Canonicalize: Sized {
    fn canonicalize(self) -> Self;
}

pub fn canonicalize<T: Canonicalize>(value: T) -> T {
    value.canonicalize()
}

/// Domain plans only need workflow ordering; their maps have no order.
impl Canonicalize for Plan {
    fn canonicalize(mut self) -> Self {
        // Vec::sort_by_key is stable, so same-action workflows keep their order
        self.workflows.sort_by_key(|w| w.workflow_target_action);
        self
    }
}

/// Config trees are sorted wherever a list stands in for a map:
///
/// - workflows: every `activate` workflow before any `deactivate` one,
///   stable within each action, unparseable actions last
/// - associated alarms by name
/// - routing controls by region
/// - scaling resources of each namespace by resource name
impl Canonicalize for PlanTree {
    fn canonicalize(mut self) -> Self {
        self.workflow.sort_by_key(workflow_rank);
        self.associated_alarms
            .sort_by(|a, b| a.name.cmp(&b.name));
        for workflow in &mut self.workflow {
            for step in &mut workflow.step {
                canonicalize_step(step);
            }
        }
        self
    }
}

fn workflow_rank(workflow: &WorkflowTree) -> usize {
    workflow
        .workflow_target_action
        .as_deref()
        .and_then(WorkflowTargetAction::from_wire)
        .map_or(WorkflowTargetAction::variants().len(), |action| action as usize)
}

fn canonicalize_step(step: &mut StepTree) {
    let Some(config) = step.execution_block_configuration.as_mut() else {
        return;
    };
    canonicalize_block(config);
}

fn canonicalize_block(config: &mut ExecutionBlockConfigTree) {
    if let Some(routing) = config.arc_routing_control_config.as_mut() {
        routing
            .region_and_routing_controls
            .sort_by(|a, b| a.region.cmp(&b.region));
    }
    if let Some(eks) = config.eks_resource_scaling_config.as_mut() {
        for namespace in &mut eks.scaling_resources {
            namespace
                .resources
                .sort_by(|a, b| a.resource_name.cmp(&b.resource_name));
        }
    }
    if let Some(parallel) = config.parallel_config.as_mut() {
        for step in &mut parallel.step {
            canonicalize_step(step);
        }
    }
}
