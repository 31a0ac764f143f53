//! Domain model of a region switch plan
//!
//! These types mirror the remote service's plan representation field for
//! field. They carry no behavior beyond small accessors; building them from a
//! config tree (and back) is the job of [`crate::codec`].

use std::fmt;

/// Enumerations exchanged as fixed strings on the wire.
///
/// Config trees carry these values as plain strings, so expand needs a
/// uniform way to parse them and report the accepted spellings.
pub trait WireEnum: Sized + Copy + 'static {
    /// Human readable name used in error messages.
    const KIND: &'static str;

    fn variants() -> &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_wire(value: &str) -> Option<Self> {
        Self::variants()
            .iter()
            .copied()
            .find(|v| v.as_str() == value)
    }

    /// Comma separated list of accepted spellings.
    fn expected() -> String {
        Self::variants()
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant,)+
        }

        impl $crate::model::WireEnum for $name {
            const KIND: &'static str = $kind;

            fn variants() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::model::WireEnum::as_str(self))
            }
        }
    };
}

pub mod block;
pub mod plan;

pub use block::{
    ArcRoutingControlConfig, ArcRoutingControlState, Asg, BlockTypeMismatch, CapacityUngraceful,
    CustomActionLambdaConfig, Ec2AsgCapacityIncreaseConfig, Ec2AsgCapacityMonitoringApproach,
    EcsCapacityIncreaseConfig, EcsCapacityMonitoringApproach, EcsService,
    EksCapacityMonitoringApproach, EksCluster, EksResourceScalingConfig, ExecutionBlock,
    ExecutionBlockType, GlobalAuroraConfig, GlobalAuroraDefaultBehavior, GlobalAuroraUngraceful,
    GlobalAuroraUngracefulBehavior, KubernetesResourceType, KubernetesScalingResource, Lambda,
    LambdaUngraceful, LambdaUngracefulBehavior, ManualApprovalConfig, ParallelConfig,
    RegionToRunIn, RestrictedBlock, RestrictedStep, Route53HealthCheckConfig,
    Route53ResourceRecordSet, RoutingControlState, ScalingResourceSet, Step, StepWire,
};
pub use plan::{
    AlarmCondition, AlarmType, AssociatedAlarm, Plan, PlanUpdate, RecoveryApproach, Trigger,
    TriggerCondition, Workflow, WorkflowTargetAction,
};

/// Short description of a collection size, used in summaries and logs.
pub(crate) struct Count<'a>(pub usize, pub &'a str);

impl fmt::Display for Count<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 1 {
            write!(f, "1 {}", self.1)
        } else {
            write!(f, "{} {}s", self.0, self.1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_enum_round_trip() {
        for action in WorkflowTargetAction::variants() {
            assert_eq!(
                WorkflowTargetAction::from_wire(action.as_str()),
                Some(*action)
            );
        }
        assert_eq!(WorkflowTargetAction::from_wire("Activate"), None);
    }

    #[test]
    fn test_wire_enum_serde_uses_wire_spelling() {
        let json = serde_json::to_string(&RecoveryApproach::ActivePassive).unwrap();
        assert_eq!(json, "\"activePassive\"");

        let parsed: ExecutionBlockType = serde_json::from_str("\"EC2AutoScaling\"").unwrap();
        assert_eq!(parsed, ExecutionBlockType::Ec2AsgCapacityIncrease);
    }

    #[test]
    fn test_expected_lists_all_spellings() {
        assert_eq!(AlarmCondition::expected(), "red, green");
    }

    #[test]
    fn test_count_display() {
        assert_eq!(Count(1, "step").to_string(), "1 step");
        assert_eq!(Count(3, "step").to_string(), "3 steps");
    }
}
