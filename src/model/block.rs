//! Steps and their execution blocks
//!
//! An execution block is a genuine sum type: a [`Step`] holds exactly one
//! [`ExecutionBlock`] variant. Steps nested in a parallel block use the
//! narrower [`RestrictedBlock`], so a parallel block inside a parallel block
//! cannot be constructed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

wire_enum! {
    /// Discriminant of an execution block.
    ExecutionBlockType ("execution block type") {
        ManualApproval => "ManualApproval",
        Route53HealthCheck => "Route53HealthCheck",
        CustomActionLambda => "CustomActionLambda",
        GlobalAurora => "AuroraGlobalDatabase",
        Ec2AsgCapacityIncrease => "EC2AutoScaling",
        EcsCapacityIncrease => "ECSServiceScaling",
        EksResourceScaling => "EKSResourceScaling",
        ArcRoutingControl => "ARCRoutingControl",
        Parallel => "Parallel",
    }
}

wire_enum! {
    RegionToRunIn ("region to run in") {
        ActivatingRegion => "activatingRegion",
        DeactivatingRegion => "deactivatingRegion",
    }
}

wire_enum! {
    LambdaUngracefulBehavior ("lambda ungraceful behavior") {
        Skip => "skip",
    }
}

wire_enum! {
    GlobalAuroraDefaultBehavior ("global aurora behavior") {
        SwitchoverOnly => "switchoverOnly",
        Failover => "failover",
    }
}

wire_enum! {
    GlobalAuroraUngracefulBehavior ("global aurora ungraceful behavior") {
        Failover => "failover",
    }
}

wire_enum! {
    Ec2AsgCapacityMonitoringApproach ("EC2 capacity monitoring approach") {
        SampledMaxInLast24Hours => "sampledMaxInLast24Hours",
        AutoscalingMaxInLast24Hours => "autoscalingMaxInLast24Hours",
    }
}

wire_enum! {
    EcsCapacityMonitoringApproach ("ECS capacity monitoring approach") {
        SampledMaxInLast24Hours => "sampledMaxInLast24Hours",
        ContainerInsightsMaxInLast24Hours => "containerInsightsMaxInLast24Hours",
    }
}

wire_enum! {
    EksCapacityMonitoringApproach ("EKS capacity monitoring approach") {
        SampledMaxInLast24Hours => "sampledMaxInLast24Hours",
    }
}

wire_enum! {
    RoutingControlState ("routing control state") {
        On => "On",
        Off => "Off",
    }
}

// ============================================================================
// Block configurations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualApprovalConfig {
    pub approval_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route53HealthCheckConfig {
    pub hosted_zone_id: String,
    pub record_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    #[serde(default)]
    pub record_sets: Vec<Route53ResourceRecordSet>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route53ResourceRecordSet {
    pub record_set_identifier: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomActionLambdaConfig {
    pub region_to_run: RegionToRunIn,
    pub retry_interval_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    #[serde(default)]
    pub lambdas: Vec<Lambda>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ungraceful: Option<LambdaUngraceful>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lambda {
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LambdaUngraceful {
    pub behavior: LambdaUngracefulBehavior,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAuroraConfig {
    pub behavior: GlobalAuroraDefaultBehavior,
    pub global_cluster_identifier: String,
    #[serde(default)]
    pub database_cluster_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ungraceful: Option<GlobalAuroraUngraceful>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlobalAuroraUngraceful {
    pub ungraceful: GlobalAuroraUngracefulBehavior,
}

/// Fallback for the capacity blocks (EC2, ECS, EKS): how much of the target
/// capacity must be reached before the step counts as a success.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityUngraceful {
    pub minimum_success_percentage: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2AsgCapacityIncreaseConfig {
    pub capacity_monitoring_approach: Ec2AsgCapacityMonitoringApproach,
    pub target_percent: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    #[serde(default)]
    pub asgs: Vec<Asg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ungraceful: Option<CapacityUngraceful>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asg {
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsCapacityIncreaseConfig {
    pub capacity_monitoring_approach: EcsCapacityMonitoringApproach,
    pub target_percent: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    #[serde(default)]
    pub services: Vec<EcsService>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ungraceful: Option<CapacityUngraceful>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsService {
    pub cluster_arn: String,
    pub service_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// One element of an EKS block's scaling resources: namespace to
/// (resource name to resource).
///
/// The wire format keeps a list of single-namespace maps rather than one
/// merged map, and so does the domain model.
pub type ScalingResourceSet = HashMap<String, HashMap<String, KubernetesScalingResource>>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EksResourceScalingConfig {
    pub capacity_monitoring_approach: EksCapacityMonitoringApproach,
    pub target_percent: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_resource_type: Option<KubernetesResourceType>,
    #[serde(default)]
    pub eks_clusters: Vec<EksCluster>,
    #[serde(default)]
    pub scaling_resources: Vec<ScalingResourceSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ungraceful: Option<CapacityUngraceful>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesResourceType {
    pub api_version: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EksCluster {
    pub cluster_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesScalingResource {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpa_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcRoutingControlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<i32>,
    /// Region to the routing controls switched in that region
    #[serde(default)]
    pub region_and_routing_controls: HashMap<String, Vec<ArcRoutingControlState>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcRoutingControlState {
    pub routing_control_arn: String,
    pub state: RoutingControlState,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParallelConfig {
    #[serde(default)]
    pub steps: Vec<RestrictedStep>,
}

// ============================================================================
// Sum types
// ============================================================================

/// The polymorphic payload of a step. Serializes as the remote union: a
/// single-key object naming the populated member.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ExecutionBlock {
    #[serde(rename = "executionApprovalConfig")]
    ManualApproval(ManualApprovalConfig),
    #[serde(rename = "route53HealthCheckConfig")]
    Route53HealthCheck(Route53HealthCheckConfig),
    #[serde(rename = "customActionLambdaConfig")]
    CustomActionLambda(CustomActionLambdaConfig),
    #[serde(rename = "globalAuroraConfig")]
    GlobalAurora(GlobalAuroraConfig),
    #[serde(rename = "ec2AsgCapacityIncreaseConfig")]
    Ec2AsgCapacityIncrease(Ec2AsgCapacityIncreaseConfig),
    #[serde(rename = "ecsCapacityIncreaseConfig")]
    EcsCapacityIncrease(EcsCapacityIncreaseConfig),
    #[serde(rename = "eksResourceScalingConfig")]
    EksResourceScaling(EksResourceScalingConfig),
    #[serde(rename = "arcRoutingControlConfig")]
    ArcRoutingControl(ArcRoutingControlConfig),
    #[serde(rename = "parallelConfig")]
    Parallel(ParallelConfig),
}

impl ExecutionBlock {
    pub fn block_type(&self) -> ExecutionBlockType {
        match self {
            ExecutionBlock::ManualApproval(_) => ExecutionBlockType::ManualApproval,
            ExecutionBlock::Route53HealthCheck(_) => ExecutionBlockType::Route53HealthCheck,
            ExecutionBlock::CustomActionLambda(_) => ExecutionBlockType::CustomActionLambda,
            ExecutionBlock::GlobalAurora(_) => ExecutionBlockType::GlobalAurora,
            ExecutionBlock::Ec2AsgCapacityIncrease(_) => {
                ExecutionBlockType::Ec2AsgCapacityIncrease
            }
            ExecutionBlock::EcsCapacityIncrease(_) => ExecutionBlockType::EcsCapacityIncrease,
            ExecutionBlock::EksResourceScaling(_) => ExecutionBlockType::EksResourceScaling,
            ExecutionBlock::ArcRoutingControl(_) => ExecutionBlockType::ArcRoutingControl,
            ExecutionBlock::Parallel(_) => ExecutionBlockType::Parallel,
        }
    }
}

/// Execution blocks allowed inside a parallel block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum RestrictedBlock {
    #[serde(rename = "executionApprovalConfig")]
    ManualApproval(ManualApprovalConfig),
    #[serde(rename = "customActionLambdaConfig")]
    CustomActionLambda(CustomActionLambdaConfig),
}

impl RestrictedBlock {
    pub fn block_type(&self) -> ExecutionBlockType {
        match self {
            RestrictedBlock::ManualApproval(_) => ExecutionBlockType::ManualApproval,
            RestrictedBlock::CustomActionLambda(_) => ExecutionBlockType::CustomActionLambda,
        }
    }

    /// Whether a block of this type may run inside a parallel block.
    pub fn allows(block_type: ExecutionBlockType) -> bool {
        matches!(
            block_type,
            ExecutionBlockType::ManualApproval | ExecutionBlockType::CustomActionLambda
        )
    }
}

impl From<RestrictedBlock> for ExecutionBlock {
    fn from(block: RestrictedBlock) -> Self {
        match block {
            RestrictedBlock::ManualApproval(c) => ExecutionBlock::ManualApproval(c),
            RestrictedBlock::CustomActionLambda(c) => ExecutionBlock::CustomActionLambda(c),
        }
    }
}

impl TryFrom<ExecutionBlock> for RestrictedBlock {
    type Error = ExecutionBlockType;

    fn try_from(block: ExecutionBlock) -> Result<Self, Self::Error> {
        match block {
            ExecutionBlock::ManualApproval(c) => Ok(RestrictedBlock::ManualApproval(c)),
            ExecutionBlock::CustomActionLambda(c) => Ok(RestrictedBlock::CustomActionLambda(c)),
            other => Err(other.block_type()),
        }
    }
}

// ============================================================================
// Steps
// ============================================================================

/// A declared block type that disagrees with the populated block.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("execution block type {declared} does not match the populated {populated} block")]
pub struct BlockTypeMismatch {
    pub declared: ExecutionBlockType,
    pub populated: ExecutionBlockType,
}

/// Wire shape of a step: the declared block type travels next to the union.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepWire<B> {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub execution_block_type: ExecutionBlockType,
    pub execution_block_configuration: B,
}

/// One unit of work in a workflow.
///
/// The block type is derived from the block itself, so a step cannot
/// disagree with its own discriminant.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    try_from = "StepWire<ExecutionBlock>",
    into = "StepWire<ExecutionBlock>"
)]
pub struct Step {
    pub name: String,
    pub description: Option<String>,
    pub execution_block: ExecutionBlock,
}

impl Step {
    pub fn execution_block_type(&self) -> ExecutionBlockType {
        self.execution_block.block_type()
    }
}

impl TryFrom<StepWire<ExecutionBlock>> for Step {
    type Error = BlockTypeMismatch;

    fn try_from(wire: StepWire<ExecutionBlock>) -> Result<Self, Self::Error> {
        check_block_type(wire.execution_block_type, wire.execution_block_configuration.block_type())?;
        Ok(Step {
            name: wire.name,
            description: wire.description,
            execution_block: wire.execution_block_configuration,
        })
    }
}

impl From<Step> for StepWire<ExecutionBlock> {
    fn from(step: Step) -> Self {
        StepWire {
            execution_block_type: step.execution_block.block_type(),
            name: step.name,
            description: step.description,
            execution_block_configuration: step.execution_block,
        }
    }
}

/// A step inside a parallel block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    try_from = "StepWire<RestrictedBlock>",
    into = "StepWire<RestrictedBlock>"
)]
pub struct RestrictedStep {
    pub name: String,
    pub description: Option<String>,
    pub execution_block: RestrictedBlock,
}

impl RestrictedStep {
    pub fn execution_block_type(&self) -> ExecutionBlockType {
        self.execution_block.block_type()
    }
}

impl TryFrom<StepWire<RestrictedBlock>> for RestrictedStep {
    type Error = BlockTypeMismatch;

    fn try_from(wire: StepWire<RestrictedBlock>) -> Result<Self, Self::Error> {
        check_block_type(wire.execution_block_type, wire.execution_block_configuration.block_type())?;
        Ok(RestrictedStep {
            name: wire.name,
            description: wire.description,
            execution_block: wire.execution_block_configuration,
        })
    }
}

impl From<RestrictedStep> for StepWire<RestrictedBlock> {
    fn from(step: RestrictedStep) -> Self {
        StepWire {
            execution_block_type: step.execution_block.block_type(),
            name: step.name,
            description: step.description,
            execution_block_configuration: step.execution_block,
        }
    }
}

impl From<RestrictedStep> for Step {
    fn from(step: RestrictedStep) -> Self {
        Step {
            name: step.name,
            description: step.description,
            execution_block: step.execution_block.into(),
        }
    }
}

fn check_block_type(
    declared: ExecutionBlockType,
    populated: ExecutionBlockType,
) -> Result<(), BlockTypeMismatch> {
    if declared == populated {
        Ok(())
    } else {
        Err(BlockTypeMismatch {
            declared,
            populated,
        })
    }
}
