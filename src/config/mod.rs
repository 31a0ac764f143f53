pub mod tree;

pub use tree::{
    ArcRoutingControlConfigTree, AsgTree, AssociatedAlarmTree, CapacityUngracefulTree,
    ConditionTree, CustomActionLambdaConfigTree, Ec2AsgCapacityIncreaseConfigTree,
    EcsCapacityIncreaseConfigTree, EcsServiceTree, EksClusterTree, EksResourceScalingConfigTree,
    ExecutionApprovalConfigTree, ExecutionBlockConfigTree, GlobalAuroraConfigTree,
    GlobalAuroraUngracefulTree, KubernetesResourceTypeTree, KubernetesScalingResourceTree,
    LambdaTree, LambdaUngracefulTree, ParallelConfigTree, PlanTree, RecordSetTree,
    RegionAndRoutingControlsTree, Route53HealthCheckConfigTree, ScalingResourcesTree, StepTree,
    TriggerTree, WorkflowTree,
};

use std::path::Path;

use clap::ValueEnum;
use serde_path_to_error::Segment;
use thiserror::Error;

use crate::codec::{expand_with, ExpandError, ExpandOptions, FieldPath};
use crate::model::Plan;

/// Errors for document loading and rendering
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Expand error: {0}")]
    ExpandError(#[from] ExpandError),

    #[error("Cannot tell the format of {0}; use a .json, .yaml or .yml extension")]
    UnknownFormat(String),
}

/// Serialization of a config tree or plan document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            _ => Err(ConfigError::UnknownFormat(path.display().to_string())),
        }
    }
}

// ============================================================================
// SBIO: Pure parsing and rendering
// ============================================================================

/// Parse a config tree document.
///
/// A document that does not fit the tree shape (wrong type, unknown field)
/// is reported as a shape error at the path of the offending value. Syntax
/// errors that precede any value are reported at the document root.
pub fn parse_tree(content: &str, format: DocumentFormat) -> Result<PlanTree, ConfigError> {
    let decoded: Result<PlanTree, (FieldPath, String)> = match format {
        DocumentFormat::Json => {
            let mut de = serde_json::Deserializer::from_str(content);
            serde_path_to_error::deserialize(&mut de)
                .map_err(|e| (decoder_path(e.path()), e.into_inner().to_string()))
                .and_then(|tree| {
                    de.end()
                        .map(|()| tree)
                        .map_err(|e| (FieldPath::root(), e.to_string()))
                })
        }
        DocumentFormat::Yaml => {
            serde_path_to_error::deserialize(serde_yaml::Deserializer::from_str(content))
                .map_err(|e| (decoder_path(e.path()), e.into_inner().to_string()))
        }
    };
    decoded.map_err(|(path, message)| ExpandError::shape(path, message).into())
}

/// Map the decoder's location onto the path expand reports.
fn decoder_path(path: &serde_path_to_error::Path) -> FieldPath {
    path.iter().fold(FieldPath::root(), |acc, segment| match segment {
        Segment::Seq { index } => acc.index(*index),
        Segment::Map { key } => acc.field(key.clone()),
        Segment::Enum { variant } => acc.field(variant.clone()),
        Segment::Unknown => acc,
    })
}

/// Parse a domain plan in its wire (camelCase) JSON form.
pub fn parse_plan(content: &str) -> Result<Plan, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Render a config tree as a document.
pub fn render_tree(tree: &PlanTree, format: DocumentFormat) -> Result<String, ConfigError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(tree)?),
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(tree)?),
    }
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load a config tree from disk. `format` overrides the extension.
pub fn load_tree_file(path: &Path, format: Option<DocumentFormat>) -> Result<PlanTree, ConfigError> {
    let format = match format {
        Some(f) => f,
        None => DocumentFormat::from_path(path)?,
    };
    let content = std::fs::read_to_string(path)?;
    parse_tree(&content, format)
}

/// Load a wire-format plan from disk.
pub fn load_plan_file(path: &Path) -> Result<Plan, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_plan(&content)
}

/// Load a config tree and expand it.
pub fn load_and_expand(
    path: &Path,
    format: Option<DocumentFormat>,
    options: &ExpandOptions,
) -> Result<Plan, ConfigError> {
    let tree = load_tree_file(path, format)?;
    Ok(expand_with(&tree, options)?)
}
