//! Domain plan to config tree.
//!
//! Flatten cannot fail: every domain value has a tree rendering. Each step
//! fills exactly one block slot and leaves the others empty, and the result
//! is canonicalized so repeated reads of the same remote plan compare equal.

use tracing::{debug, trace};

use super::canonical::Canonicalize;
use super::structural::{flatten_routing_controls, flatten_scaling_resources, sorted_entries};
use crate::config::tree::{
    ArcRoutingControlConfigTree, AsgTree, AssociatedAlarmTree, CapacityUngracefulTree,
    ConditionTree, CustomActionLambdaConfigTree, Ec2AsgCapacityIncreaseConfigTree,
    EcsCapacityIncreaseConfigTree, EcsServiceTree, EksClusterTree, EksResourceScalingConfigTree,
    ExecutionApprovalConfigTree, ExecutionBlockConfigTree, GlobalAuroraConfigTree,
    GlobalAuroraUngracefulTree, KubernetesResourceTypeTree, LambdaTree, LambdaUngracefulTree,
    ParallelConfigTree, PlanTree, RecordSetTree, Route53HealthCheckConfigTree, StepTree,
    TriggerTree, WorkflowTree,
};
use crate::model::{
    ArcRoutingControlConfig, CapacityUngraceful, Count, CustomActionLambdaConfig,
    Ec2AsgCapacityIncreaseConfig, EcsCapacityIncreaseConfig, EksResourceScalingConfig,
    ExecutionBlock, GlobalAuroraConfig, ManualApprovalConfig, ParallelConfig, Plan,
    Route53HealthCheckConfig, Step, Trigger, WireEnum, Workflow,
};

pub fn flatten(plan: &Plan) -> PlanTree {
    debug!(
        "Flattening plan '{}' ({}, {}, {})",
        plan.name,
        Count(plan.workflows.len(), "workflow"),
        Count(plan.step_count(), "step"),
        Count(plan.triggers.len(), "trigger")
    );

    PlanTree {
        name: Some(plan.name.clone()),
        execution_role: Some(plan.execution_role.clone()),
        recovery_approach: Some(wire(plan.recovery_approach)),
        regions: plan.regions.clone(),
        description: plan.description.clone(),
        primary_region: plan.primary_region.clone(),
        recovery_time_objective_minutes: plan.recovery_time_objective_minutes.map(i64::from),
        associated_alarms: sorted_entries(&plan.associated_alarms)
            .into_iter()
            .map(|(name, alarm)| AssociatedAlarmTree {
                name: Some(name.clone()),
                alarm_type: Some(wire(alarm.alarm_type)),
                resource_identifier: Some(alarm.resource_identifier.clone()),
                cross_account_role: alarm.cross_account_role.clone(),
                external_id: alarm.external_id.clone(),
            })
            .collect(),
        workflow: plan.workflows.iter().map(workflow).collect(),
        triggers: plan.triggers.iter().map(trigger).collect(),
    }
    .canonicalize()
}

fn wire<E: WireEnum>(value: E) -> String {
    value.as_str().to_string()
}

fn workflow(workflow: &Workflow) -> WorkflowTree {
    WorkflowTree {
        workflow_target_action: Some(wire(workflow.workflow_target_action)),
        workflow_target_region: workflow.workflow_target_region.clone(),
        workflow_description: workflow.workflow_description.clone(),
        step: workflow.steps.iter().map(step).collect(),
    }
}

fn step(step: &Step) -> StepTree {
    trace!("Flattening step '{}' ({})", step.name, step.execution_block_type());
    StepTree {
        name: Some(step.name.clone()),
        execution_block_type: Some(wire(step.execution_block_type())),
        description: step.description.clone(),
        execution_block_configuration: Some(block(&step.execution_block)),
    }
}

fn trigger(trigger: &Trigger) -> TriggerTree {
    TriggerTree {
        action: Some(wire(trigger.action)),
        description: trigger.description.clone(),
        min_delay_minutes_between_executions: Some(i64::from(
            trigger.min_delay_minutes_between_executions,
        )),
        target_region: Some(trigger.target_region.clone()),
        conditions: trigger
            .conditions
            .iter()
            .map(|c| ConditionTree {
                associated_alarm_name: Some(c.associated_alarm_name.clone()),
                condition: Some(wire(c.condition)),
            })
            .collect(),
    }
}

/// Fill the one slot matching the block; every other slot stays `None`.
fn block(block: &ExecutionBlock) -> ExecutionBlockConfigTree {
    let mut config = ExecutionBlockConfigTree::default();
    match block {
        ExecutionBlock::ManualApproval(c) => config.execution_approval_config = Some(manual_approval(c)),
        ExecutionBlock::Route53HealthCheck(c) => {
            config.route53_health_check_config = Some(route53_health_check(c))
        }
        ExecutionBlock::CustomActionLambda(c) => {
            config.custom_action_lambda_config = Some(custom_action_lambda(c))
        }
        ExecutionBlock::GlobalAurora(c) => config.global_aurora_config = Some(global_aurora(c)),
        ExecutionBlock::Ec2AsgCapacityIncrease(c) => {
            config.ec2_asg_capacity_increase_config = Some(ec2_asg_capacity_increase(c))
        }
        ExecutionBlock::EcsCapacityIncrease(c) => {
            config.ecs_capacity_increase_config = Some(ecs_capacity_increase(c))
        }
        ExecutionBlock::EksResourceScaling(c) => {
            config.eks_resource_scaling_config = Some(eks_resource_scaling(c))
        }
        ExecutionBlock::ArcRoutingControl(c) => {
            config.arc_routing_control_config = Some(arc_routing_control(c))
        }
        ExecutionBlock::Parallel(c) => config.parallel_config = Some(parallel(c)),
    }
    config
}

fn manual_approval(c: &ManualApprovalConfig) -> ExecutionApprovalConfigTree {
    ExecutionApprovalConfigTree {
        approval_role: Some(c.approval_role.clone()),
        timeout_minutes: c.timeout_minutes.map(i64::from),
    }
}

fn route53_health_check(c: &Route53HealthCheckConfig) -> Route53HealthCheckConfigTree {
    Route53HealthCheckConfigTree {
        hosted_zone_id: Some(c.hosted_zone_id.clone()),
        record_name: Some(c.record_name.clone()),
        cross_account_role: c.cross_account_role.clone(),
        external_id: c.external_id.clone(),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        record_sets: c
            .record_sets
            .iter()
            .map(|r| RecordSetTree {
                record_set_identifier: Some(r.record_set_identifier.clone()),
                region: Some(r.region.clone()),
            })
            .collect(),
    }
}

fn custom_action_lambda(c: &CustomActionLambdaConfig) -> CustomActionLambdaConfigTree {
    CustomActionLambdaConfigTree {
        region_to_run: Some(wire(c.region_to_run)),
        retry_interval_minutes: Some(c.retry_interval_minutes),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        lambda: c
            .lambdas
            .iter()
            .map(|l| LambdaTree {
                arn: Some(l.arn.clone()),
                cross_account_role: l.cross_account_role.clone(),
                external_id: l.external_id.clone(),
            })
            .collect(),
        ungraceful: c.ungraceful.as_ref().map(|u| LambdaUngracefulTree {
            behavior: Some(wire(u.behavior)),
        }),
    }
}

fn global_aurora(c: &GlobalAuroraConfig) -> GlobalAuroraConfigTree {
    GlobalAuroraConfigTree {
        behavior: Some(wire(c.behavior)),
        global_cluster_identifier: Some(c.global_cluster_identifier.clone()),
        database_cluster_arns: c.database_cluster_arns.clone(),
        cross_account_role: c.cross_account_role.clone(),
        external_id: c.external_id.clone(),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        ungraceful: c.ungraceful.as_ref().map(|u| GlobalAuroraUngracefulTree {
            ungraceful: Some(wire(u.ungraceful)),
        }),
    }
}

fn capacity_ungraceful(u: &Option<CapacityUngraceful>) -> Option<CapacityUngracefulTree> {
    u.as_ref().map(|u| CapacityUngracefulTree {
        minimum_success_percentage: Some(i64::from(u.minimum_success_percentage)),
    })
}

fn ec2_asg_capacity_increase(c: &Ec2AsgCapacityIncreaseConfig) -> Ec2AsgCapacityIncreaseConfigTree {
    Ec2AsgCapacityIncreaseConfigTree {
        capacity_monitoring_approach: Some(wire(c.capacity_monitoring_approach)),
        target_percent: Some(i64::from(c.target_percent)),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        asgs: c
            .asgs
            .iter()
            .map(|a| AsgTree {
                arn: Some(a.arn.clone()),
                cross_account_role: a.cross_account_role.clone(),
                external_id: a.external_id.clone(),
            })
            .collect(),
        ungraceful: capacity_ungraceful(&c.ungraceful),
    }
}

fn ecs_capacity_increase(c: &EcsCapacityIncreaseConfig) -> EcsCapacityIncreaseConfigTree {
    EcsCapacityIncreaseConfigTree {
        capacity_monitoring_approach: Some(wire(c.capacity_monitoring_approach)),
        target_percent: Some(i64::from(c.target_percent)),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        services: c
            .services
            .iter()
            .map(|s| EcsServiceTree {
                cluster_arn: Some(s.cluster_arn.clone()),
                service_arn: Some(s.service_arn.clone()),
                cross_account_role: s.cross_account_role.clone(),
                external_id: s.external_id.clone(),
            })
            .collect(),
        ungraceful: capacity_ungraceful(&c.ungraceful),
    }
}

fn eks_resource_scaling(c: &EksResourceScalingConfig) -> EksResourceScalingConfigTree {
    EksResourceScalingConfigTree {
        capacity_monitoring_approach: Some(wire(c.capacity_monitoring_approach)),
        target_percent: Some(i64::from(c.target_percent)),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        kubernetes_resource_type: c.kubernetes_resource_type.as_ref().map(|k| {
            KubernetesResourceTypeTree {
                api_version: Some(k.api_version.clone()),
                kind: Some(k.kind.clone()),
            }
        }),
        eks_clusters: c
            .eks_clusters
            .iter()
            .map(|e| EksClusterTree {
                cluster_arn: Some(e.cluster_arn.clone()),
                cross_account_role: e.cross_account_role.clone(),
                external_id: e.external_id.clone(),
            })
            .collect(),
        scaling_resources: flatten_scaling_resources(&c.scaling_resources),
        ungraceful: capacity_ungraceful(&c.ungraceful),
    }
}

fn arc_routing_control(c: &ArcRoutingControlConfig) -> ArcRoutingControlConfigTree {
    ArcRoutingControlConfigTree {
        cross_account_role: c.cross_account_role.clone(),
        external_id: c.external_id.clone(),
        timeout_minutes: c.timeout_minutes.map(i64::from),
        region_and_routing_controls: flatten_routing_controls(&c.region_and_routing_controls),
    }
}

fn parallel(c: &ParallelConfig) -> ParallelConfigTree {
    ParallelConfigTree {
        step: c
            .steps
            .iter()
            .map(|s| step(&Step::from(s.clone())))
            .collect(),
    }
}
