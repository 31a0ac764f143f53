//! Expand/flatten round trips over complete plans

mod common;

use std::collections::HashMap;

use arcplan::codec::{canonicalize, expand, flatten};
use arcplan::config::{parse_tree, render_tree, DocumentFormat, ExecutionBlockConfigTree};
use arcplan::model::*;

use common::{full_plan, routing_control, scaling_resource, step};

fn with_step(block: ExecutionBlock) -> Plan {
    let mut plan = full_plan();
    plan.workflows = vec![Workflow {
        workflow_target_action: WorkflowTargetAction::Activate,
        workflow_target_region: None,
        workflow_description: None,
        steps: vec![step("only", block)],
    }];
    plan
}

#[test]
fn test_full_plan_round_trip() {
    let plan = full_plan();
    let tree = flatten(&plan);
    assert_eq!(expand(&tree).unwrap(), canonicalize(plan));
}

#[test]
fn test_flatten_is_stable_across_reads() {
    let plan = full_plan();
    let first = flatten(&plan);
    let second = flatten(&expand(&first).unwrap());
    assert_eq!(first, second);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

#[test]
fn test_round_trip_through_yaml_document() {
    let plan = full_plan();
    let yaml = render_tree(&flatten(&plan), DocumentFormat::Yaml).unwrap();
    let tree = parse_tree(&yaml, DocumentFormat::Yaml).unwrap();
    assert_eq!(expand(&tree).unwrap(), canonicalize(plan));
}

#[test]
fn test_round_trip_through_wire_json() {
    let plan = canonicalize(full_plan());
    let wire = serde_json::to_string(&plan).unwrap();
    let decoded: Plan = serde_json::from_str(&wire).unwrap();
    assert_eq!(decoded, plan);
    assert_eq!(expand(&flatten(&decoded)).unwrap(), plan);
}

#[test]
fn test_every_flattened_step_fills_exactly_one_slot() {
    let tree = flatten(&full_plan());
    for workflow in &tree.workflow {
        for step in &workflow.step {
            let config = step.execution_block_configuration.as_ref().unwrap();
            assert_eq!(config.populated().len(), 1, "step {:?}", step.name);
            let declared = step.execution_block_type.as_deref().unwrap();
            assert_eq!(config.populated()[0].as_str(), declared);

            if let Some(parallel) = &config.parallel_config {
                for nested in &parallel.step {
                    let nested_config = nested.execution_block_configuration.as_ref().unwrap();
                    assert_eq!(nested_config.populated().len(), 1);
                }
            }
        }
    }
}

#[test]
fn test_workflow_order_is_canonical() {
    let mut plan = full_plan();
    let workflow = |action, region: &str| Workflow {
        workflow_target_action: action,
        workflow_target_region: Some(region.to_string()),
        workflow_description: None,
        steps: vec![],
    };
    plan.workflows = vec![
        workflow(WorkflowTargetAction::Deactivate, "B"),
        workflow(WorkflowTargetAction::Activate, "A"),
        workflow(WorkflowTargetAction::Deactivate, "D"),
        workflow(WorkflowTargetAction::Activate, "C"),
    ];

    let tree = flatten(&plan);
    let order: Vec<_> = tree
        .workflow
        .iter()
        .map(|w| {
            (
                w.workflow_target_action.clone().unwrap(),
                w.workflow_target_region.clone().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("activate".to_string(), "A".to_string()),
            ("activate".to_string(), "C".to_string()),
            ("deactivate".to_string(), "B".to_string()),
            ("deactivate".to_string(), "D".to_string()),
        ]
    );
}

#[test]
fn test_scaling_resources_round_trip() {
    let resources = vec![HashMap::from([(
        "default".to_string(),
        HashMap::from([
            ("svc2".to_string(), scaling_resource("svc2", Some("h1"))),
            ("svc1".to_string(), scaling_resource("svc1", None)),
        ]),
    )])];
    let plan = with_step(ExecutionBlock::EksResourceScaling(EksResourceScalingConfig {
        capacity_monitoring_approach: EksCapacityMonitoringApproach::SampledMaxInLast24Hours,
        target_percent: 100,
        timeout_minutes: None,
        kubernetes_resource_type: None,
        eks_clusters: vec![],
        scaling_resources: resources.clone(),
        ungraceful: None,
    }));

    let tree = flatten(&plan);
    let eks = tree.workflow[0].step[0]
        .execution_block_configuration
        .as_ref()
        .and_then(|c| c.eks_resource_scaling_config.as_ref())
        .unwrap();
    assert_eq!(eks.scaling_resources.len(), 1);
    assert_eq!(eks.scaling_resources[0].namespace.as_deref(), Some("default"));
    let names: Vec<_> = eks.scaling_resources[0]
        .resources
        .iter()
        .map(|r| {
            (
                r.resource_name.as_deref().unwrap(),
                r.name.as_deref().unwrap(),
                r.hpa_name.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        names,
        vec![("svc1", "svc1", None), ("svc2", "svc2", Some("h1"))]
    );

    match &expand(&tree).unwrap().workflows[0].steps[0].execution_block {
        ExecutionBlock::EksResourceScaling(c) => assert_eq!(c.scaling_resources, resources),
        other => panic!("unexpected block {:?}", other),
    }
}

#[test]
fn test_routing_controls_flatten_sorted_by_region() {
    let controls = HashMap::from([
        (
            "us-east-1".to_string(),
            vec![ArcRoutingControlState {
                routing_control_arn: "A".to_string(),
                state: RoutingControlState::On,
            }],
        ),
        (
            "eu-west-1".to_string(),
            vec![ArcRoutingControlState {
                routing_control_arn: "B".to_string(),
                state: RoutingControlState::On,
            }],
        ),
    ]);
    let plan = with_step(ExecutionBlock::ArcRoutingControl(ArcRoutingControlConfig {
        cross_account_role: None,
        external_id: None,
        timeout_minutes: None,
        region_and_routing_controls: controls,
    }));

    let tree = flatten(&plan);
    let routing = tree.workflow[0].step[0]
        .execution_block_configuration
        .as_ref()
        .and_then(|c| c.arc_routing_control_config.as_ref())
        .unwrap();
    let flattened: Vec<_> = routing
        .region_and_routing_controls
        .iter()
        .map(|r| (r.region.clone().unwrap(), r.routing_control_arns.clone()))
        .collect();
    assert_eq!(
        flattened,
        vec![
            ("eu-west-1".to_string(), vec!["B".to_string()]),
            ("us-east-1".to_string(), vec!["A".to_string()]),
        ]
    );
}

#[test]
fn test_routing_control_off_state_is_reset_to_on() {
    let plan = with_step(ExecutionBlock::ArcRoutingControl(ArcRoutingControlConfig {
        cross_account_role: None,
        external_id: None,
        timeout_minutes: None,
        region_and_routing_controls: HashMap::from([(
            "us-east-1".to_string(),
            vec![ArcRoutingControlState {
                routing_control_arn: routing_control("east"),
                state: RoutingControlState::Off,
            }],
        )]),
    }));

    let expanded = expand(&flatten(&plan)).unwrap();
    match &expanded.workflows[0].steps[0].execution_block {
        ExecutionBlock::ArcRoutingControl(c) => {
            assert_eq!(
                c.region_and_routing_controls["us-east-1"][0].state,
                RoutingControlState::On
            );
        }
        other => panic!("unexpected block {:?}", other),
    }
}

#[test]
fn test_associated_alarms_flatten_sorted_by_name() {
    let tree = flatten(&full_plan());
    let names: Vec<_> = tree
        .associated_alarms
        .iter()
        .map(|a| a.name.as_deref().unwrap())
        .collect();
    assert_eq!(names, vec!["errors", "latency"]);
}

#[test]
fn test_update_projection_from_expanded_plan() {
    let plan = expand(&flatten(&full_plan())).unwrap();
    let update = PlanUpdate::from_plan("arn:aws:arc-region-switch::123456789012:plan/checkout", &plan);
    assert_eq!(update.workflows, plan.workflows);
    assert_eq!(update.triggers, plan.triggers);
    assert_eq!(update.execution_role, plan.execution_role);
}

#[test]
fn test_slot_names_match_flattened_json() {
    let tree = flatten(&full_plan());
    let value = serde_json::to_value(&tree).unwrap();
    let config = &value["workflow"][0]["step"][0]["execution_block_configuration"];
    for block_type in ExecutionBlockConfigTree::PRECEDENCE {
        let slot = ExecutionBlockConfigTree::slot_name(block_type);
        assert!(config.get(slot).is_some(), "missing slot {}", slot);
    }
}
