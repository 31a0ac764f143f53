//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, printing is handled by the caller

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::codec::{expand_with, flatten, ExpandOptions};
use crate::config::{
    load_plan_file, load_tree_file, render_tree, ConfigError, DocumentFormat, PlanTree,
};
use crate::model::{Plan, PlanUpdate};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Expand a tree file and render the plan, or the update payload when an
/// ARN is given, as pretty JSON.
pub fn expand_command(
    path: &Path,
    format: Option<DocumentFormat>,
    options: &ExpandOptions,
    update_arn: Option<&str>,
) -> CommandResult<String> {
    let tree = load_tree_file(path, format)?;
    let plan = expand_with(&tree, options).map_err(ConfigError::from)?;
    info!("Expanded plan '{}' from {}", plan.name, path.display());

    let rendered = match update_arn {
        Some(arn) => serde_json::to_string_pretty(&PlanUpdate::from_plan(arn, &plan))?,
        None => serde_json::to_string_pretty(&plan)?,
    };
    Ok(rendered)
}

/// Flatten a wire-format plan file into a canonical tree document.
pub fn flatten_command(path: &Path, format: DocumentFormat) -> CommandResult<String> {
    let plan = load_plan_file(path)?;
    let tree = flatten(&plan);
    info!("Flattened plan '{}' from {}", plan.name, path.display());
    Ok(render_tree(&tree, format)?)
}

/// Outcome of `check`.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub plan: Plan,
    pub fingerprint: String,
    /// Fields that changed since `--previous` and force replacement
    pub replacement_fields: Option<Vec<&'static str>>,
}

pub fn check_command(
    path: &Path,
    format: Option<DocumentFormat>,
    options: &ExpandOptions,
    previous: Option<&Path>,
) -> CommandResult<CheckReport> {
    let tree = load_tree_file(path, format)?;
    let plan = expand_with(&tree, options).map_err(ConfigError::from)?;
    let fingerprint = tree.fingerprint()?;

    let replacement_fields = match previous {
        Some(previous_path) => {
            let previous_tree = load_tree_file(previous_path, format)?;
            Some(PlanTree::replacement_fields(&previous_tree, &tree))
        }
        None => None,
    };

    Ok(CheckReport {
        plan,
        fingerprint,
        replacement_fields,
    })
}
