//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;

use arcplan::model::*;

pub const ACCOUNT: &str = "123456789012";

pub fn role(name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", ACCOUNT, name)
}

pub fn routing_control(name: &str) -> String {
    format!(
        "arn:aws:route53-recovery-control::{}:controlpanel/main/routingcontrol/{}",
        ACCOUNT, name
    )
}

pub fn step(name: &str, execution_block: ExecutionBlock) -> Step {
    Step {
        name: name.to_string(),
        description: None,
        execution_block,
    }
}

pub fn approval() -> ManualApprovalConfig {
    ManualApprovalConfig {
        approval_role: role("approver"),
        timeout_minutes: Some(60),
    }
}

pub fn lambda() -> CustomActionLambdaConfig {
    CustomActionLambdaConfig {
        region_to_run: RegionToRunIn::ActivatingRegion,
        retry_interval_minutes: 2.5,
        timeout_minutes: None,
        lambdas: vec![Lambda {
            arn: format!("arn:aws:lambda:us-east-1:{}:function:warm-cache", ACCOUNT),
            cross_account_role: Some(role("lambda-invoker")),
            external_id: Some("ext-1".to_string()),
        }],
        ungraceful: Some(LambdaUngraceful {
            behavior: LambdaUngracefulBehavior::Skip,
        }),
    }
}

pub fn scaling_resource(name: &str, hpa_name: Option<&str>) -> KubernetesScalingResource {
    KubernetesScalingResource {
        name: name.to_string(),
        namespace: "default".to_string(),
        hpa_name: hpa_name.map(String::from),
    }
}

/// One step of every block type, across two workflows.
pub fn full_plan() -> Plan {
    let activate = Workflow {
        workflow_target_action: WorkflowTargetAction::Activate,
        workflow_target_region: None,
        workflow_description: Some("bring the standby region up".to_string()),
        steps: vec![
            step("approve", ExecutionBlock::ManualApproval(approval())),
            step(
                "health",
                ExecutionBlock::Route53HealthCheck(Route53HealthCheckConfig {
                    hosted_zone_id: "Z123456".to_string(),
                    record_name: "api.example.com".to_string(),
                    cross_account_role: None,
                    external_id: None,
                    timeout_minutes: Some(10),
                    record_sets: vec![
                        Route53ResourceRecordSet {
                            record_set_identifier: "east".to_string(),
                            region: "us-east-1".to_string(),
                        },
                        Route53ResourceRecordSet {
                            record_set_identifier: "west".to_string(),
                            region: "us-west-2".to_string(),
                        },
                    ],
                }),
            ),
            step(
                "database",
                ExecutionBlock::GlobalAurora(GlobalAuroraConfig {
                    behavior: GlobalAuroraDefaultBehavior::SwitchoverOnly,
                    global_cluster_identifier: "orders-global".to_string(),
                    database_cluster_arns: vec![
                        format!("arn:aws:rds:us-east-1:{}:cluster:orders-east", ACCOUNT),
                        format!("arn:aws:rds:us-west-2:{}:cluster:orders-west", ACCOUNT),
                    ],
                    cross_account_role: None,
                    external_id: None,
                    timeout_minutes: Some(45),
                    ungraceful: Some(GlobalAuroraUngraceful {
                        ungraceful: GlobalAuroraUngracefulBehavior::Failover,
                    }),
                }),
            ),
            step(
                "scale-ec2",
                ExecutionBlock::Ec2AsgCapacityIncrease(Ec2AsgCapacityIncreaseConfig {
                    capacity_monitoring_approach:
                        Ec2AsgCapacityMonitoringApproach::AutoscalingMaxInLast24Hours,
                    target_percent: 100,
                    timeout_minutes: None,
                    asgs: vec![Asg {
                        arn: format!(
                            "arn:aws:autoscaling:us-west-2:{}:autoScalingGroup:1:autoScalingGroupName/web",
                            ACCOUNT
                        ),
                        cross_account_role: None,
                        external_id: None,
                    }],
                    ungraceful: Some(CapacityUngraceful {
                        minimum_success_percentage: 80,
                    }),
                }),
            ),
            step(
                "scale-ecs",
                ExecutionBlock::EcsCapacityIncrease(EcsCapacityIncreaseConfig {
                    capacity_monitoring_approach:
                        EcsCapacityMonitoringApproach::ContainerInsightsMaxInLast24Hours,
                    target_percent: 150,
                    timeout_minutes: Some(20),
                    services: vec![EcsService {
                        cluster_arn: format!("arn:aws:ecs:us-west-2:{}:cluster/main", ACCOUNT),
                        service_arn: format!("arn:aws:ecs:us-west-2:{}:service/main/api", ACCOUNT),
                        cross_account_role: None,
                        external_id: None,
                    }],
                    ungraceful: None,
                }),
            ),
            step(
                "scale-eks",
                ExecutionBlock::EksResourceScaling(EksResourceScalingConfig {
                    capacity_monitoring_approach:
                        EksCapacityMonitoringApproach::SampledMaxInLast24Hours,
                    target_percent: 100,
                    timeout_minutes: None,
                    kubernetes_resource_type: Some(KubernetesResourceType {
                        api_version: "apps/v1".to_string(),
                        kind: "Deployment".to_string(),
                    }),
                    eks_clusters: vec![EksCluster {
                        cluster_arn: format!("arn:aws:eks:us-west-2:{}:cluster/main", ACCOUNT),
                        cross_account_role: None,
                        external_id: None,
                    }],
                    scaling_resources: vec![HashMap::from([(
                        "default".to_string(),
                        HashMap::from([
                            ("svc1".to_string(), scaling_resource("svc1", None)),
                            ("svc2".to_string(), scaling_resource("svc2", Some("h1"))),
                        ]),
                    )])],
                    ungraceful: Some(CapacityUngraceful {
                        minimum_success_percentage: 50,
                    }),
                }),
            ),
            step(
                "switch-traffic",
                ExecutionBlock::ArcRoutingControl(ArcRoutingControlConfig {
                    cross_account_role: None,
                    external_id: None,
                    timeout_minutes: Some(5),
                    region_and_routing_controls: HashMap::from([
                        (
                            "us-west-2".to_string(),
                            vec![ArcRoutingControlState {
                                routing_control_arn: routing_control("west"),
                                state: RoutingControlState::On,
                            }],
                        ),
                        (
                            "us-east-1".to_string(),
                            vec![ArcRoutingControlState {
                                routing_control_arn: routing_control("east"),
                                state: RoutingControlState::On,
                            }],
                        ),
                    ]),
                }),
            ),
        ],
    };

    let deactivate = Workflow {
        workflow_target_action: WorkflowTargetAction::Deactivate,
        workflow_target_region: Some("us-east-1".to_string()),
        workflow_description: None,
        steps: vec![step(
            "drain",
            ExecutionBlock::Parallel(ParallelConfig {
                steps: vec![
                    RestrictedStep {
                        name: "approve".to_string(),
                        description: Some("operator sign-off".to_string()),
                        execution_block: RestrictedBlock::ManualApproval(approval()),
                    },
                    RestrictedStep {
                        name: "flush".to_string(),
                        description: None,
                        execution_block: RestrictedBlock::CustomActionLambda(lambda()),
                    },
                ],
            }),
        )],
    };

    Plan {
        name: "checkout".to_string(),
        execution_role: role("region-switch"),
        recovery_approach: RecoveryApproach::ActivePassive,
        regions: vec!["us-east-1".to_string(), "us-west-2".to_string()],
        primary_region: Some("us-east-1".to_string()),
        description: Some("checkout service failover".to_string()),
        recovery_time_objective_minutes: Some(30),
        associated_alarms: HashMap::from([
            (
                "latency".to_string(),
                AssociatedAlarm {
                    alarm_type: AlarmType::ApplicationHealth,
                    resource_identifier: format!(
                        "arn:aws:cloudwatch:us-east-1:{}:alarm:latency",
                        ACCOUNT
                    ),
                    cross_account_role: None,
                    external_id: None,
                },
            ),
            (
                "errors".to_string(),
                AssociatedAlarm {
                    alarm_type: AlarmType::Trigger,
                    resource_identifier: format!(
                        "arn:aws:cloudwatch:us-east-1:{}:alarm:errors",
                        ACCOUNT
                    ),
                    cross_account_role: Some(role("alarm-reader")),
                    external_id: None,
                },
            ),
        ]),
        workflows: vec![deactivate, activate],
        triggers: vec![Trigger {
            action: WorkflowTargetAction::Activate,
            description: None,
            min_delay_minutes_between_executions: 60,
            target_region: "us-west-2".to_string(),
            conditions: vec![
                TriggerCondition {
                    associated_alarm_name: "errors".to_string(),
                    condition: AlarmCondition::Red,
                },
                TriggerCondition {
                    associated_alarm_name: "latency".to_string(),
                    condition: AlarmCondition::Red,
                },
            ],
        }],
    }
}
