//! Config tree to domain plan.
//!
//! Expand walks the tree top-down and stops at the first problem, reporting
//! it with the path of the offending value. Nothing is defaulted except the
//! routing control state, which the tree cannot express.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use super::error::{ExpandError, FieldPath};
use super::fields::{
    arn_list, optional_i32, required_arn, required_enum, required_i32, required_str,
};
use super::structural::{expand_routing_controls, expand_scaling_resources, keyed_entries};
use crate::config::tree::{
    ArcRoutingControlConfigTree, AssociatedAlarmTree, CapacityUngracefulTree,
    CustomActionLambdaConfigTree, Ec2AsgCapacityIncreaseConfigTree, EcsCapacityIncreaseConfigTree,
    EksResourceScalingConfigTree, ExecutionApprovalConfigTree, ExecutionBlockConfigTree,
    GlobalAuroraConfigTree, ParallelConfigTree, PlanTree, Route53HealthCheckConfigTree, StepTree,
    TriggerTree, WorkflowTree,
};
use crate::model::{
    ArcRoutingControlConfig, Asg, AssociatedAlarm, CapacityUngraceful, Count,
    CustomActionLambdaConfig, Ec2AsgCapacityIncreaseConfig, EcsCapacityIncreaseConfig, EcsService,
    EksCluster, EksResourceScalingConfig, ExecutionBlock, ExecutionBlockType, GlobalAuroraConfig,
    GlobalAuroraUngraceful, KubernetesResourceType, Lambda, LambdaUngraceful,
    ManualApprovalConfig, ParallelConfig, Plan, RestrictedBlock, RestrictedStep,
    Route53HealthCheckConfig, Route53ResourceRecordSet, Step, Trigger, TriggerCondition, Workflow,
};

/// What to do with a step whose configuration populates several blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnionPolicy {
    /// Fail with [`ExpandError::AmbiguousUnion`].
    #[default]
    Strict,
    /// Keep the first populated block in
    /// [`ExecutionBlockConfigTree::PRECEDENCE`] order and log the others.
    FirstMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    pub union_policy: UnionPolicy,
}

impl ExpandOptions {
    pub fn first_match() -> Self {
        Self {
            union_policy: UnionPolicy::FirstMatch,
        }
    }
}

/// Expand with the default options.
pub fn expand(tree: &PlanTree) -> Result<Plan, ExpandError> {
    expand_with(tree, &ExpandOptions::default())
}

pub fn expand_with(tree: &PlanTree, options: &ExpandOptions) -> Result<Plan, ExpandError> {
    debug!(
        "Expanding plan '{}' ({}, {}, {})",
        tree.name.as_deref().unwrap_or("<unnamed>"),
        Count(tree.workflow.len(), "workflow"),
        Count(tree.step_count(), "step"),
        Count(tree.triggers.len(), "trigger")
    );
    Expander { options }.plan(tree)
}

struct Expander<'a> {
    options: &'a ExpandOptions,
}

impl Expander<'_> {
    // ===== Plan =====

    fn plan(&self, tree: &PlanTree) -> Result<Plan, ExpandError> {
        let root = FieldPath::root();

        let name = required_str(&tree.name, &root.field("name"))?;
        let execution_role = required_arn(&tree.execution_role, &root.field("execution_role"))?;
        let recovery_approach =
            required_enum(&tree.recovery_approach, &root.field("recovery_approach"))?;
        let regions = regions(&tree.regions, &root.field("regions"))?;

        if let Some(primary) = &tree.primary_region {
            if !regions.contains(primary) {
                return Err(ExpandError::invariant(
                    root.field("primary_region"),
                    format!("primary region '{}' is not one of the plan's regions", primary),
                ));
            }
        }

        let recovery_time_objective_minutes = optional_i32(
            tree.recovery_time_objective_minutes,
            &root.field("recovery_time_objective_minutes"),
        )?;

        let associated_alarms: HashMap<String, AssociatedAlarm> = keyed_entries(
            &tree.associated_alarms,
            &root.field("associated_alarms"),
            associated_alarm,
        )?
        .into_iter()
        .collect();

        let workflows = tree
            .workflow
            .iter()
            .enumerate()
            .map(|(i, w)| self.workflow(w, &root.field("workflow").index(i)))
            .collect::<Result<Vec<_>, _>>()?;

        let triggers = tree
            .triggers
            .iter()
            .enumerate()
            .map(|(i, t)| trigger(t, &root.field("triggers").index(i), &associated_alarms))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Plan {
            name,
            execution_role,
            recovery_approach,
            regions,
            primary_region: tree.primary_region.clone(),
            description: tree.description.clone(),
            recovery_time_objective_minutes,
            associated_alarms,
            workflows,
            triggers,
        })
    }

    fn workflow(&self, tree: &WorkflowTree, path: &FieldPath) -> Result<Workflow, ExpandError> {
        let workflow_target_action = required_enum(
            &tree.workflow_target_action,
            &path.field("workflow_target_action"),
        )?;
        let steps = step_sequence(&tree.step, &path.field("step"), |step, step_path| {
            self.step(step, step_path)
        })?;

        Ok(Workflow {
            workflow_target_action,
            workflow_target_region: tree.workflow_target_region.clone(),
            workflow_description: tree.workflow_description.clone(),
            steps,
        })
    }

    // ===== Steps =====

    fn step(&self, tree: &StepTree, path: &FieldPath) -> Result<Step, ExpandError> {
        let name = required_str(&tree.name, &path.field("name"))?;
        let declared = required_enum(&tree.execution_block_type, &path.field("execution_block_type"))?;
        let (block_type, config) = self.resolve_block(tree, &name, declared, path, false)?;
        let execution_block =
            self.block(block_type, config, &path.field("execution_block_configuration"))?;

        trace!("Expanded step '{}' at {} as {}", name, path, block_type);
        Ok(Step {
            name,
            description: tree.description.clone(),
            execution_block,
        })
    }

    fn restricted_step(&self, tree: &StepTree, path: &FieldPath) -> Result<RestrictedStep, ExpandError> {
        let name = required_str(&tree.name, &path.field("name"))?;
        let type_path = path.field("execution_block_type");
        let declared: ExecutionBlockType = required_enum(&tree.execution_block_type, &type_path)?;
        if !RestrictedBlock::allows(declared) {
            return Err(ExpandError::UnsupportedNesting {
                path: type_path,
                block: declared,
            });
        }

        let (block_type, config) = self.resolve_block(tree, &name, declared, path, true)?;
        let config_path = path.field("execution_block_configuration");
        let block = self.block(block_type, config, &config_path)?;
        let execution_block =
            RestrictedBlock::try_from(block).map_err(|block| ExpandError::UnsupportedNesting {
                path: config_path.field(ExecutionBlockConfigTree::slot_name(block)),
                block,
            })?;

        trace!("Expanded parallel step '{}' at {} as {}", name, path, block_type);
        Ok(RestrictedStep {
            name,
            description: tree.description.clone(),
            execution_block,
        })
    }

    /// Pick the populated block of a step and check it against the declared
    /// type. Steps inside a parallel block (`restricted`) may only populate
    /// the blocks a [`RestrictedBlock`] allows.
    fn resolve_block<'t>(
        &self,
        tree: &'t StepTree,
        name: &str,
        declared: ExecutionBlockType,
        path: &FieldPath,
        restricted: bool,
    ) -> Result<(ExecutionBlockType, &'t ExecutionBlockConfigTree), ExpandError> {
        let config_path = path.field("execution_block_configuration");
        let config = tree
            .execution_block_configuration
            .as_ref()
            .ok_or_else(|| ExpandError::missing(config_path.clone()))?;

        let populated = config.populated();
        if restricted {
            if let Some(block) = populated.iter().copied().find(|t| !RestrictedBlock::allows(*t)) {
                return Err(ExpandError::UnsupportedNesting {
                    path: config_path.field(ExecutionBlockConfigTree::slot_name(block)),
                    block,
                });
            }
        }

        let selected = match populated.as_slice() {
            [] => return Err(ExpandError::missing(config_path)),
            [only] => *only,
            [first, rest @ ..] => {
                let slots: Vec<&'static str> = populated
                    .iter()
                    .map(|t| ExecutionBlockConfigTree::slot_name(*t))
                    .collect();
                match self.options.union_policy {
                    UnionPolicy::Strict => {
                        return Err(ExpandError::AmbiguousUnion {
                            path: path.clone(),
                            step: name.to_string(),
                            slots,
                        })
                    }
                    UnionPolicy::FirstMatch => {
                        warn!(
                            "Step '{}' at {} populates {}; keeping {} and discarding {}",
                            name,
                            path,
                            slots.join(", "),
                            first,
                            Count(rest.len(), "block")
                        );
                        *first
                    }
                }
            }
        };

        if selected != declared {
            return Err(ExpandError::invariant(
                path.field("execution_block_type"),
                format!(
                    "step '{}' declares {} but populates {}",
                    name,
                    declared,
                    ExecutionBlockConfigTree::slot_name(selected)
                ),
            ));
        }

        Ok((selected, config))
    }

    fn block(
        &self,
        block_type: ExecutionBlockType,
        config: &ExecutionBlockConfigTree,
        path: &FieldPath,
    ) -> Result<ExecutionBlock, ExpandError> {
        let slot = path.field(ExecutionBlockConfigTree::slot_name(block_type));
        let block = match block_type {
            ExecutionBlockType::ManualApproval => ExecutionBlock::ManualApproval(manual_approval(
                present(&config.execution_approval_config, &slot)?,
                &slot,
            )?),
            ExecutionBlockType::Route53HealthCheck => {
                ExecutionBlock::Route53HealthCheck(route53_health_check(
                    present(&config.route53_health_check_config, &slot)?,
                    &slot,
                )?)
            }
            ExecutionBlockType::CustomActionLambda => {
                ExecutionBlock::CustomActionLambda(custom_action_lambda(
                    present(&config.custom_action_lambda_config, &slot)?,
                    &slot,
                )?)
            }
            ExecutionBlockType::GlobalAurora => ExecutionBlock::GlobalAurora(global_aurora(
                present(&config.global_aurora_config, &slot)?,
                &slot,
            )?),
            ExecutionBlockType::Ec2AsgCapacityIncrease => {
                ExecutionBlock::Ec2AsgCapacityIncrease(ec2_asg_capacity_increase(
                    present(&config.ec2_asg_capacity_increase_config, &slot)?,
                    &slot,
                )?)
            }
            ExecutionBlockType::EcsCapacityIncrease => {
                ExecutionBlock::EcsCapacityIncrease(ecs_capacity_increase(
                    present(&config.ecs_capacity_increase_config, &slot)?,
                    &slot,
                )?)
            }
            ExecutionBlockType::EksResourceScaling => {
                ExecutionBlock::EksResourceScaling(eks_resource_scaling(
                    present(&config.eks_resource_scaling_config, &slot)?,
                    &slot,
                )?)
            }
            ExecutionBlockType::ArcRoutingControl => {
                ExecutionBlock::ArcRoutingControl(arc_routing_control(
                    present(&config.arc_routing_control_config, &slot)?,
                    &slot,
                )?)
            }
            ExecutionBlockType::Parallel => ExecutionBlock::Parallel(
                self.parallel(present(&config.parallel_config, &slot)?, &slot)?,
            ),
        };
        Ok(block)
    }

    /// Exactly one level of nesting: the inner steps are restricted steps,
    /// and a parallel block among them is rejected rather than recursed into.
    fn parallel(&self, tree: &ParallelConfigTree, path: &FieldPath) -> Result<ParallelConfig, ExpandError> {
        let steps = step_sequence(&tree.step, &path.field("step"), |step, step_path| {
            self.restricted_step(step, step_path)
        })?;
        Ok(ParallelConfig { steps })
    }
}

/// Expand a step sequence, rejecting a name that repeats within it.
fn step_sequence<S, F>(trees: &[StepTree], path: &FieldPath, mut build: F) -> Result<Vec<S>, ExpandError>
where
    F: FnMut(&StepTree, &FieldPath) -> Result<S, ExpandError>,
{
    let mut seen = HashSet::with_capacity(trees.len());
    let mut steps = Vec::with_capacity(trees.len());

    for (i, tree) in trees.iter().enumerate() {
        let step_path = path.index(i);
        if let Some(name) = tree.name.as_deref().filter(|n| !n.is_empty()) {
            if !seen.insert(name) {
                return Err(ExpandError::invariant(
                    step_path.field("name"),
                    format!("step name '{}' is used more than once in this sequence", name),
                ));
            }
        }
        steps.push(build(tree, &step_path)?);
    }

    Ok(steps)
}

fn present<'t, T>(slot: &'t Option<T>, path: &FieldPath) -> Result<&'t T, ExpandError> {
    slot.as_ref().ok_or_else(|| ExpandError::missing(path.clone()))
}

fn regions(values: &[String], path: &FieldPath) -> Result<Vec<String>, ExpandError> {
    let mut seen = HashSet::with_capacity(values.len());
    for (i, region) in values.iter().enumerate() {
        if region.is_empty() {
            return Err(ExpandError::missing(path.index(i)));
        }
        if !seen.insert(region.as_str()) {
            return Err(ExpandError::invariant(
                path.index(i),
                format!("region '{}' is listed more than once", region),
            ));
        }
    }
    if values.len() < 2 {
        return Err(ExpandError::invariant(
            path.clone(),
            format!(
                "a plan needs at least two regions, found {}",
                values.len()
            ),
        ));
    }
    Ok(values.to_vec())
}

// ===== Alarms and triggers =====

fn associated_alarm(tree: &AssociatedAlarmTree, path: &FieldPath) -> Result<AssociatedAlarm, ExpandError> {
    Ok(AssociatedAlarm {
        alarm_type: required_enum(&tree.alarm_type, &path.field("alarm_type"))?,
        resource_identifier: required_str(&tree.resource_identifier, &path.field("resource_identifier"))?,
        cross_account_role: tree.cross_account_role.clone(),
        external_id: tree.external_id.clone(),
    })
}

fn trigger(
    tree: &TriggerTree,
    path: &FieldPath,
    alarms: &HashMap<String, AssociatedAlarm>,
) -> Result<Trigger, ExpandError> {
    let conditions = tree
        .conditions
        .iter()
        .enumerate()
        .map(|(i, c)| -> Result<_, ExpandError> {
            let condition_path = path.field("conditions").index(i);
            let name_path = condition_path.field("associated_alarm_name");
            let associated_alarm_name = required_str(&c.associated_alarm_name, &name_path)?;
            if !alarms.contains_key(&associated_alarm_name) {
                return Err(ExpandError::invariant(
                    name_path,
                    format!("no associated alarm is named '{}'", associated_alarm_name),
                ));
            }
            Ok(TriggerCondition {
                associated_alarm_name,
                condition: required_enum(&c.condition, &condition_path.field("condition"))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Trigger {
        action: required_enum(&tree.action, &path.field("action"))?,
        description: tree.description.clone(),
        min_delay_minutes_between_executions: required_i32(
            tree.min_delay_minutes_between_executions,
            &path.field("min_delay_minutes_between_executions"),
        )?,
        target_region: required_str(&tree.target_region, &path.field("target_region"))?,
        conditions,
    })
}

// ===== Execution blocks =====

fn manual_approval(
    tree: &ExecutionApprovalConfigTree,
    path: &FieldPath,
) -> Result<ManualApprovalConfig, ExpandError> {
    Ok(ManualApprovalConfig {
        approval_role: required_str(&tree.approval_role, &path.field("approval_role"))?,
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
    })
}

fn route53_health_check(
    tree: &Route53HealthCheckConfigTree,
    path: &FieldPath,
) -> Result<Route53HealthCheckConfig, ExpandError> {
    let record_sets = tree
        .record_sets
        .iter()
        .enumerate()
        .map(|(i, r)| -> Result<_, ExpandError> {
            let record_path = path.field("record_sets").index(i);
            Ok(Route53ResourceRecordSet {
                record_set_identifier: required_str(
                    &r.record_set_identifier,
                    &record_path.field("record_set_identifier"),
                )?,
                region: required_str(&r.region, &record_path.field("region"))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Route53HealthCheckConfig {
        hosted_zone_id: required_str(&tree.hosted_zone_id, &path.field("hosted_zone_id"))?,
        record_name: required_str(&tree.record_name, &path.field("record_name"))?,
        cross_account_role: tree.cross_account_role.clone(),
        external_id: tree.external_id.clone(),
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        record_sets,
    })
}

fn custom_action_lambda(
    tree: &CustomActionLambdaConfigTree,
    path: &FieldPath,
) -> Result<CustomActionLambdaConfig, ExpandError> {
    let lambdas = tree
        .lambda
        .iter()
        .enumerate()
        .map(|(i, l)| -> Result<_, ExpandError> {
            Ok(Lambda {
                arn: required_str(&l.arn, &path.field("lambda").index(i).field("arn"))?,
                cross_account_role: l.cross_account_role.clone(),
                external_id: l.external_id.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ungraceful = tree
        .ungraceful
        .as_ref()
        .map(|u| {
            Ok::<_, ExpandError>(LambdaUngraceful {
                behavior: required_enum(&u.behavior, &path.field("ungraceful").field("behavior"))?,
            })
        })
        .transpose()?;

    Ok(CustomActionLambdaConfig {
        region_to_run: required_enum(&tree.region_to_run, &path.field("region_to_run"))?,
        retry_interval_minutes: tree
            .retry_interval_minutes
            .ok_or_else(|| ExpandError::missing(path.field("retry_interval_minutes")))?,
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        lambdas,
        ungraceful,
    })
}

fn global_aurora(
    tree: &GlobalAuroraConfigTree,
    path: &FieldPath,
) -> Result<GlobalAuroraConfig, ExpandError> {
    let ungraceful = tree
        .ungraceful
        .as_ref()
        .map(|u| {
            Ok::<_, ExpandError>(GlobalAuroraUngraceful {
                ungraceful: required_enum(
                    &u.ungraceful,
                    &path.field("ungraceful").field("ungraceful"),
                )?,
            })
        })
        .transpose()?;

    Ok(GlobalAuroraConfig {
        behavior: required_enum(&tree.behavior, &path.field("behavior"))?,
        global_cluster_identifier: required_str(
            &tree.global_cluster_identifier,
            &path.field("global_cluster_identifier"),
        )?,
        database_cluster_arns: arn_list(
            &tree.database_cluster_arns,
            &path.field("database_cluster_arns"),
        )?,
        cross_account_role: tree.cross_account_role.clone(),
        external_id: tree.external_id.clone(),
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        ungraceful,
    })
}

fn capacity_ungraceful(
    tree: &Option<CapacityUngracefulTree>,
    path: &FieldPath,
) -> Result<Option<CapacityUngraceful>, ExpandError> {
    tree.as_ref()
        .map(|u| {
            Ok::<_, ExpandError>(CapacityUngraceful {
                minimum_success_percentage: required_i32(
                    u.minimum_success_percentage,
                    &path.field("ungraceful").field("minimum_success_percentage"),
                )?,
            })
        })
        .transpose()
}

fn ec2_asg_capacity_increase(
    tree: &Ec2AsgCapacityIncreaseConfigTree,
    path: &FieldPath,
) -> Result<Ec2AsgCapacityIncreaseConfig, ExpandError> {
    let asgs = tree
        .asgs
        .iter()
        .enumerate()
        .map(|(i, a)| -> Result<_, ExpandError> {
            Ok(Asg {
                arn: required_str(&a.arn, &path.field("asgs").index(i).field("arn"))?,
                cross_account_role: a.cross_account_role.clone(),
                external_id: a.external_id.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Ec2AsgCapacityIncreaseConfig {
        capacity_monitoring_approach: required_enum(
            &tree.capacity_monitoring_approach,
            &path.field("capacity_monitoring_approach"),
        )?,
        target_percent: required_i32(tree.target_percent, &path.field("target_percent"))?,
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        asgs,
        ungraceful: capacity_ungraceful(&tree.ungraceful, path)?,
    })
}

fn ecs_capacity_increase(
    tree: &EcsCapacityIncreaseConfigTree,
    path: &FieldPath,
) -> Result<EcsCapacityIncreaseConfig, ExpandError> {
    let services = tree
        .services
        .iter()
        .enumerate()
        .map(|(i, s)| -> Result<_, ExpandError> {
            let service_path = path.field("services").index(i);
            Ok(EcsService {
                cluster_arn: required_str(&s.cluster_arn, &service_path.field("cluster_arn"))?,
                service_arn: required_str(&s.service_arn, &service_path.field("service_arn"))?,
                cross_account_role: s.cross_account_role.clone(),
                external_id: s.external_id.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EcsCapacityIncreaseConfig {
        capacity_monitoring_approach: required_enum(
            &tree.capacity_monitoring_approach,
            &path.field("capacity_monitoring_approach"),
        )?,
        target_percent: required_i32(tree.target_percent, &path.field("target_percent"))?,
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        services,
        ungraceful: capacity_ungraceful(&tree.ungraceful, path)?,
    })
}

fn eks_resource_scaling(
    tree: &EksResourceScalingConfigTree,
    path: &FieldPath,
) -> Result<EksResourceScalingConfig, ExpandError> {
    let kubernetes_resource_type = tree
        .kubernetes_resource_type
        .as_ref()
        .map(|k| {
            let type_path = path.field("kubernetes_resource_type");
            Ok::<_, ExpandError>(KubernetesResourceType {
                api_version: required_str(&k.api_version, &type_path.field("api_version"))?,
                kind: required_str(&k.kind, &type_path.field("kind"))?,
            })
        })
        .transpose()?;

    let eks_clusters = tree
        .eks_clusters
        .iter()
        .enumerate()
        .map(|(i, c)| -> Result<_, ExpandError> {
            Ok(EksCluster {
                cluster_arn: required_str(
                    &c.cluster_arn,
                    &path.field("eks_clusters").index(i).field("cluster_arn"),
                )?,
                cross_account_role: c.cross_account_role.clone(),
                external_id: c.external_id.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EksResourceScalingConfig {
        capacity_monitoring_approach: required_enum(
            &tree.capacity_monitoring_approach,
            &path.field("capacity_monitoring_approach"),
        )?,
        target_percent: required_i32(tree.target_percent, &path.field("target_percent"))?,
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        kubernetes_resource_type,
        eks_clusters,
        scaling_resources: expand_scaling_resources(
            &tree.scaling_resources,
            &path.field("scaling_resources"),
        )?,
        ungraceful: capacity_ungraceful(&tree.ungraceful, path)?,
    })
}

fn arc_routing_control(
    tree: &ArcRoutingControlConfigTree,
    path: &FieldPath,
) -> Result<ArcRoutingControlConfig, ExpandError> {
    Ok(ArcRoutingControlConfig {
        cross_account_role: tree.cross_account_role.clone(),
        external_id: tree.external_id.clone(),
        timeout_minutes: optional_i32(tree.timeout_minutes, &path.field("timeout_minutes"))?,
        region_and_routing_controls: expand_routing_controls(
            &tree.region_and_routing_controls,
            &path.field("region_and_routing_controls"),
        )?,
    })
}
