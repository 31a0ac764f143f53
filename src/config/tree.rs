//! Config tree for region switch plans
//!
//! This is the operator-authored shape: every scalar is optional so that
//! expand can report exactly which required field is missing, enumerations
//! are plain strings, and every sequence is present (possibly empty), never
//! null. Maps on the wire (alarms, routing controls, scaling resources) are
//! ordered lists here so diffs stay stable.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::Canonicalize;
use crate::model::ExecutionBlockType;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlanTree {
    pub name: Option<String>,
    pub execution_role: Option<String>,
    pub recovery_approach: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    pub description: Option<String>,
    pub primary_region: Option<String>,
    pub recovery_time_objective_minutes: Option<i64>,
    #[serde(default)]
    pub associated_alarms: Vec<AssociatedAlarmTree>,
    #[serde(default)]
    pub workflow: Vec<WorkflowTree>,
    #[serde(default)]
    pub triggers: Vec<TriggerTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssociatedAlarmTree {
    pub name: Option<String>,
    pub alarm_type: Option<String>,
    pub resource_identifier: Option<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowTree {
    pub workflow_target_action: Option<String>,
    pub workflow_target_region: Option<String>,
    pub workflow_description: Option<String>,
    #[serde(default)]
    pub step: Vec<StepTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StepTree {
    pub name: Option<String>,
    pub execution_block_type: Option<String>,
    pub description: Option<String>,
    pub execution_block_configuration: Option<ExecutionBlockConfigTree>,
}

/// One slot per execution block variant.
///
/// The tree can hold several populated slots at once; expand rejects that.
/// Flatten always fills exactly one slot and leaves the others empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionBlockConfigTree {
    pub execution_approval_config: Option<ExecutionApprovalConfigTree>,
    pub route53_health_check_config: Option<Route53HealthCheckConfigTree>,
    pub custom_action_lambda_config: Option<CustomActionLambdaConfigTree>,
    pub global_aurora_config: Option<GlobalAuroraConfigTree>,
    pub ec2_asg_capacity_increase_config: Option<Ec2AsgCapacityIncreaseConfigTree>,
    pub ecs_capacity_increase_config: Option<EcsCapacityIncreaseConfigTree>,
    pub eks_resource_scaling_config: Option<EksResourceScalingConfigTree>,
    pub arc_routing_control_config: Option<ArcRoutingControlConfigTree>,
    pub parallel_config: Option<ParallelConfigTree>,
}

impl ExecutionBlockConfigTree {
    /// Slot precedence, used when several slots are populated and the
    /// caller asked for first-match resolution.
    pub const PRECEDENCE: [ExecutionBlockType; 9] = [
        ExecutionBlockType::ManualApproval,
        ExecutionBlockType::Route53HealthCheck,
        ExecutionBlockType::CustomActionLambda,
        ExecutionBlockType::GlobalAurora,
        ExecutionBlockType::Ec2AsgCapacityIncrease,
        ExecutionBlockType::EcsCapacityIncrease,
        ExecutionBlockType::EksResourceScaling,
        ExecutionBlockType::ArcRoutingControl,
        ExecutionBlockType::Parallel,
    ];

    /// Field name of the slot holding a block type.
    pub fn slot_name(block_type: ExecutionBlockType) -> &'static str {
        match block_type {
            ExecutionBlockType::ManualApproval => "execution_approval_config",
            ExecutionBlockType::Route53HealthCheck => "route53_health_check_config",
            ExecutionBlockType::CustomActionLambda => "custom_action_lambda_config",
            ExecutionBlockType::GlobalAurora => "global_aurora_config",
            ExecutionBlockType::Ec2AsgCapacityIncrease => "ec2_asg_capacity_increase_config",
            ExecutionBlockType::EcsCapacityIncrease => "ecs_capacity_increase_config",
            ExecutionBlockType::EksResourceScaling => "eks_resource_scaling_config",
            ExecutionBlockType::ArcRoutingControl => "arc_routing_control_config",
            ExecutionBlockType::Parallel => "parallel_config",
        }
    }

    pub fn is_populated(&self, block_type: ExecutionBlockType) -> bool {
        match block_type {
            ExecutionBlockType::ManualApproval => self.execution_approval_config.is_some(),
            ExecutionBlockType::Route53HealthCheck => self.route53_health_check_config.is_some(),
            ExecutionBlockType::CustomActionLambda => self.custom_action_lambda_config.is_some(),
            ExecutionBlockType::GlobalAurora => self.global_aurora_config.is_some(),
            ExecutionBlockType::Ec2AsgCapacityIncrease => {
                self.ec2_asg_capacity_increase_config.is_some()
            }
            ExecutionBlockType::EcsCapacityIncrease => self.ecs_capacity_increase_config.is_some(),
            ExecutionBlockType::EksResourceScaling => self.eks_resource_scaling_config.is_some(),
            ExecutionBlockType::ArcRoutingControl => self.arc_routing_control_config.is_some(),
            ExecutionBlockType::Parallel => self.parallel_config.is_some(),
        }
    }

    /// Populated slots in precedence order.
    pub fn populated(&self) -> Vec<ExecutionBlockType> {
        Self::PRECEDENCE
            .iter()
            .copied()
            .filter(|t| self.is_populated(*t))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionApprovalConfigTree {
    pub approval_role: Option<String>,
    pub timeout_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route53HealthCheckConfigTree {
    pub hosted_zone_id: Option<String>,
    pub record_name: Option<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
    pub timeout_minutes: Option<i64>,
    #[serde(default)]
    pub record_sets: Vec<RecordSetTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSetTree {
    pub record_set_identifier: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CustomActionLambdaConfigTree {
    pub region_to_run: Option<String>,
    pub retry_interval_minutes: Option<f64>,
    pub timeout_minutes: Option<i64>,
    #[serde(default)]
    pub lambda: Vec<LambdaTree>,
    pub ungraceful: Option<LambdaUngracefulTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LambdaTree {
    pub arn: Option<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LambdaUngracefulTree {
    pub behavior: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalAuroraConfigTree {
    pub behavior: Option<String>,
    pub global_cluster_identifier: Option<String>,
    #[serde(default)]
    pub database_cluster_arns: Vec<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
    pub timeout_minutes: Option<i64>,
    pub ungraceful: Option<GlobalAuroraUngracefulTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalAuroraUngracefulTree {
    pub ungraceful: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CapacityUngracefulTree {
    pub minimum_success_percentage: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Ec2AsgCapacityIncreaseConfigTree {
    pub capacity_monitoring_approach: Option<String>,
    pub target_percent: Option<i64>,
    pub timeout_minutes: Option<i64>,
    #[serde(default)]
    pub asgs: Vec<AsgTree>,
    pub ungraceful: Option<CapacityUngracefulTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AsgTree {
    pub arn: Option<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EcsCapacityIncreaseConfigTree {
    pub capacity_monitoring_approach: Option<String>,
    pub target_percent: Option<i64>,
    pub timeout_minutes: Option<i64>,
    #[serde(default)]
    pub services: Vec<EcsServiceTree>,
    pub ungraceful: Option<CapacityUngracefulTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EcsServiceTree {
    pub cluster_arn: Option<String>,
    pub service_arn: Option<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EksResourceScalingConfigTree {
    pub capacity_monitoring_approach: Option<String>,
    pub target_percent: Option<i64>,
    pub timeout_minutes: Option<i64>,
    pub kubernetes_resource_type: Option<KubernetesResourceTypeTree>,
    #[serde(default)]
    pub eks_clusters: Vec<EksClusterTree>,
    #[serde(default)]
    pub scaling_resources: Vec<ScalingResourcesTree>,
    pub ungraceful: Option<CapacityUngracefulTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KubernetesResourceTypeTree {
    pub api_version: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EksClusterTree {
    pub cluster_arn: Option<String>,
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
}

/// Resources of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScalingResourcesTree {
    pub namespace: Option<String>,
    #[serde(default)]
    pub resources: Vec<KubernetesScalingResourceTree>,
}

/// `resource_name` exists only here; on the domain side it is the map key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KubernetesScalingResourceTree {
    pub resource_name: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub hpa_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArcRoutingControlConfigTree {
    pub cross_account_role: Option<String>,
    pub external_id: Option<String>,
    pub timeout_minutes: Option<i64>,
    #[serde(default)]
    pub region_and_routing_controls: Vec<RegionAndRoutingControlsTree>,
}

/// Routing controls of one region. There is no per-control state; expand
/// always switches the controls on.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegionAndRoutingControlsTree {
    pub region: Option<String>,
    #[serde(default)]
    pub routing_control_arns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelConfigTree {
    #[serde(default)]
    pub step: Vec<StepTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerTree {
    pub action: Option<String>,
    pub description: Option<String>,
    pub min_delay_minutes_between_executions: Option<i64>,
    pub target_region: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionTree {
    pub associated_alarm_name: Option<String>,
    pub condition: Option<String>,
}

impl PlanTree {
    /// SHA-256 of the canonical JSON rendering.
    ///
    /// Two reads of the same remote plan hash identically even when the
    /// service returned their collections in a different order.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let canonical = self.clone().canonicalize();
        let bytes = serde_json::to_vec(&canonical)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }

    /// Fields whose change cannot be applied in place and forces the remote
    /// plan to be replaced.
    pub fn replacement_fields(previous: &PlanTree, next: &PlanTree) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if previous.name != next.name {
            fields.push("name");
        }
        if previous.recovery_approach != next.recovery_approach {
            fields.push("recovery_approach");
        }
        if previous.regions != next.regions {
            fields.push("regions");
        }
        fields
    }

    /// Number of steps, counting steps nested in parallel blocks.
    pub fn step_count(&self) -> usize {
        self.workflow
            .iter()
            .flat_map(|w| &w.step)
            .map(|s| {
                1 + s
                    .execution_block_configuration
                    .as_ref()
                    .and_then(|c| c.parallel_config.as_ref())
                    .map_or(0, |p| p.step.len())
            })
            .sum()
    }
}
