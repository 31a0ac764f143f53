//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use super::commands::CheckReport;
use crate::model::{Count, ExecutionBlock, Plan, Step};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a table with upper-cased headers and left-aligned columns
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render = |cells: Vec<String>| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("   ");
        format!("{}\n", line.trim_end())
    };

    let mut output = render(headers.iter().map(|h| h.to_uppercase()).collect());
    for row in rows {
        output.push_str(&render(row.clone()));
    }
    output
}

// ============================================================================
// Check summary
// ============================================================================

fn describe_step(step: &Step) -> String {
    match &step.execution_block {
        ExecutionBlock::Parallel(p) => {
            let inner = p
                .steps
                .iter()
                .map(|s| format!("{} ({})", s.name, s.execution_block_type()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} (Parallel: {})", step.name, inner)
        }
        block => format!("{} ({})", step.name, block.block_type()),
    }
}

fn format_regions(plan: &Plan) -> String {
    plan.regions
        .iter()
        .map(|r| {
            if plan.primary_region.as_deref() == Some(r.as_str()) {
                format!("{} (primary)", r)
            } else {
                r.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format the output of `arcplan check`.
pub fn format_check(report: &CheckReport) -> String {
    let plan = &report.plan;
    let mut output = String::new();

    output.push_str(&format!("Plan: {}\n", plan.name));
    output.push_str(&format!("Recovery approach: {}\n", plan.recovery_approach));
    output.push_str(&format!("Regions: {}\n", format_regions(plan)));
    if let Some(rto) = plan.recovery_time_objective_minutes {
        output.push_str(&format!("Recovery time objective: {} min\n", rto));
    }
    output.push('\n');

    output.push_str(&format!(
        "Workflows ({}, {}):\n",
        plan.workflows.len(),
        Count(plan.step_count(), "step")
    ));
    let rows: Vec<Vec<String>> = plan
        .workflows
        .iter()
        .map(|w| {
            vec![
                w.workflow_target_action.to_string(),
                w.workflow_target_region
                    .clone()
                    .unwrap_or_else(|| "all".to_string()),
                w.steps.iter().map(describe_step).collect::<Vec<_>>().join(", "),
            ]
        })
        .collect();
    output.push_str(&format_table(&["action", "region", "steps"], &rows));
    output.push('\n');

    output.push_str(&format!(
        "Alarms: {}\n",
        Count(plan.associated_alarms.len(), "alarm")
    ));
    output.push_str(&format!("Triggers ({}):\n", plan.triggers.len()));
    for trigger in &plan.triggers {
        output.push_str(&format!(
            "  - {} {} on {}, at most every {} min\n",
            trigger.action,
            trigger.target_region,
            Count(trigger.conditions.len(), "condition"),
            trigger.min_delay_minutes_between_executions
        ));
    }
    output.push('\n');

    output.push_str(&format!("Fingerprint: {}\n", report.fingerprint));
    match &report.replacement_fields {
        Some(fields) if fields.is_empty() => {
            output.push_str("Changes since previous: update in place\n");
        }
        Some(fields) => {
            output.push_str(&format!(
                "Changes since previous: replacement required ({})\n",
                fields.join(", ")
            ));
        }
        None => {}
    }

    output
}
