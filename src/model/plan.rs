use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::block::Step;

wire_enum! {
    /// How the plan's regions share traffic.
    RecoveryApproach ("recovery approach") {
        ActiveActive => "activeActive",
        ActivePassive => "activePassive",
    }
}

wire_enum! {
    /// Ordering of the variants is significant: canonical workflow order
    /// places every `Activate` workflow before any `Deactivate` workflow.
    WorkflowTargetAction ("workflow target action") {
        Activate => "activate",
        Deactivate => "deactivate",
    }
}

wire_enum! {
    AlarmType ("alarm type") {
        ApplicationHealth => "applicationHealth",
        Trigger => "trigger",
    }
}

wire_enum! {
    AlarmCondition ("alarm condition") {
        Red => "red",
        Green => "green",
    }
}

/// A region switch plan as exchanged with the remote service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: String,

    /// ARN of the role the service assumes while executing the plan
    pub execution_role: String,

    pub recovery_approach: RecoveryApproach,

    /// Participating regions, at least two
    pub regions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_time_objective_minutes: Option<i32>,

    /// Alarms keyed by their name
    #[serde(default)]
    pub associated_alarms: HashMap<String, AssociatedAlarm>,

    #[serde(default)]
    pub workflows: Vec<Workflow>,

    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedAlarm {
    pub alarm_type: AlarmType,
    pub resource_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_account_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Steps run when the plan activates or deactivates a region.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub workflow_target_action: WorkflowTargetAction,

    /// Absent means the workflow applies to every region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_target_region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_description: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Automatic execution of a workflow when alarm conditions are met.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub action: WorkflowTargetAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub min_delay_minutes_between_executions: i32,

    pub target_region: String,

    #[serde(default)]
    pub conditions: Vec<TriggerCondition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCondition {
    pub associated_alarm_name: String,
    pub condition: AlarmCondition,
}

impl Plan {
    /// Total number of steps, counting the steps nested in parallel blocks.
    pub fn step_count(&self) -> usize {
        self.workflows
            .iter()
            .flat_map(|w| &w.steps)
            .map(|s| match &s.execution_block {
                super::ExecutionBlock::Parallel(p) => 1 + p.steps.len(),
                _ => 1,
            })
            .sum()
    }
}

/// Payload of the remote update operation.
///
/// Name, recovery approach and regions cannot be changed in place, so they
/// are not part of an update; changing them replaces the plan.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdate {
    pub arn: String,
    pub execution_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_time_objective_minutes: Option<i32>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub associated_alarms: HashMap<String, AssociatedAlarm>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl PlanUpdate {
    pub fn from_plan(arn: impl Into<String>, plan: &Plan) -> Self {
        Self {
            arn: arn.into(),
            execution_role: plan.execution_role.clone(),
            description: plan.description.clone(),
            recovery_time_objective_minutes: plan.recovery_time_objective_minutes,
            workflows: plan.workflows.clone(),
            associated_alarms: plan.associated_alarms.clone(),
            triggers: plan.triggers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExecutionBlock, ManualApprovalConfig};
    use serde_json::json;

    fn sample_plan() -> Plan {
        Plan {
            name: "checkout".to_string(),
            execution_role: "arn:aws:iam::123456789012:role/switch".to_string(),
            recovery_approach: RecoveryApproach::ActivePassive,
            regions: vec!["us-east-1".to_string(), "us-west-2".to_string()],
            primary_region: Some("us-east-1".to_string()),
            description: None,
            recovery_time_objective_minutes: Some(30),
            associated_alarms: HashMap::new(),
            workflows: vec![Workflow {
                workflow_target_action: WorkflowTargetAction::Activate,
                workflow_target_region: None,
                workflow_description: None,
                steps: vec![Step {
                    name: "approve".to_string(),
                    description: None,
                    execution_block: ExecutionBlock::ManualApproval(ManualApprovalConfig {
                        approval_role: "arn:aws:iam::123456789012:role/approver".to_string(),
                        timeout_minutes: Some(60),
                    }),
                }],
            }],
            triggers: vec![],
        }
    }

    #[test]
    fn test_plan_serializes_camel_case() {
        let value = serde_json::to_value(sample_plan()).unwrap();
        assert_eq!(value["executionRole"], "arn:aws:iam::123456789012:role/switch");
        assert_eq!(value["recoveryApproach"], "activePassive");
        assert_eq!(value["recoveryTimeObjectiveMinutes"], 30);
        assert_eq!(
            value["workflows"][0]["workflowTargetAction"],
            json!("activate")
        );
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_plan_deserializes_without_optional_collections() {
        let plan: Plan = serde_json::from_value(json!({
            "name": "p",
            "executionRole": "arn:aws:iam::123456789012:role/r",
            "recoveryApproach": "activeActive",
            "regions": ["eu-west-1", "eu-central-1"]
        }))
        .unwrap();
        assert!(plan.workflows.is_empty());
        assert!(plan.associated_alarms.is_empty());
        assert!(plan.triggers.is_empty());
    }

    #[test]
    fn test_step_count() {
        let plan = sample_plan();
        assert_eq!(plan.step_count(), 1);
    }

    #[test]
    fn test_update_keeps_only_updatable_fields() {
        let plan = sample_plan();
        let update = PlanUpdate::from_plan("arn:aws:arc-region-switch::123456789012:plan/p", &plan);
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value["arn"], "arn:aws:arc-region-switch::123456789012:plan/p");
        assert!(value.get("name").is_none());
        assert!(value.get("regions").is_none());
        assert!(value.get("recoveryApproach").is_none());
        assert_eq!(update.workflows, plan.workflows);
    }
}
