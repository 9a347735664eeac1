//! Output formatters for introspection results.

use clap::ValueEnum;
use ormgen_core::{unit_context, EmissionPlan, SchemaModel};
use serde_json::Value;

/// What to print after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Intermediate model as JSON
    Model,
    /// Emission plan as JSON
    Plan,
    /// Render context of every unit as JSON
    Contexts,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Model => write!(f, "model"),
            OutputFormat::Plan => write!(f, "plan"),
            OutputFormat::Contexts => write!(f, "contexts"),
        }
    }
}

/// Format a run's results.
pub fn format(
    format: OutputFormat,
    model: &SchemaModel,
    plan: &EmissionPlan,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Summary => Ok(summary(model, plan)),
        OutputFormat::Model => serde_json::to_string_pretty(model),
        OutputFormat::Plan => serde_json::to_string_pretty(plan),
        OutputFormat::Contexts => {
            let contexts: Vec<Value> = plan
                .units
                .iter()
                .map(|unit| Value::Object(unit_context(unit, model)))
                .collect();
            serde_json::to_string_pretty(&contexts)
        }
    }
}

fn summary(model: &SchemaModel, plan: &EmissionPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} table(s), {} relationship(s), {} enum(s), {} composite(s), {} domain(s)\n",
        model.tables.len(),
        model.relationships.len(),
        model.enums.len(),
        model.composites.len(),
        model.domains.len(),
    ));
    out.push_str(&format!("schemas: {}\n", model.schemas().join(", ")));

    for table in &model.tables {
        out.push_str(&format!("\n{} ({}.{})\n", table.model_name, table.schema, table.name));
        for column in &table.columns {
            out.push_str(&format!(
                "  {}: {} -> {}\n",
                column.property_name,
                column.mapping.annotated_expression(),
                column.mapping.host_type_expression,
            ));
        }
        for relationship in model.relationships_for(&table.table_ref()) {
            out.push_str(&format!("  {}\n", relationship.declaration()));
        }
    }

    out.push_str(&format!("\n{} migration unit(s)\n", plan.len()));
    for unit in &plan.units {
        out.push_str(&format!("  {}\n", unit.file_name()));
    }

    let diagnostics = &model.diagnostics;
    if !diagnostics.is_clean() {
        out.push_str("\nwarnings:\n");
        for column in &diagnostics.fallback_columns {
            out.push_str(&format!("  fallback type mapping: {}\n", column));
        }
        if diagnostics.dropped_aliases > 0 {
            out.push_str(&format!(
                "  {} relationship(s) dropped for duplicate aliases\n",
                diagnostics.dropped_aliases
            ));
        }
        if diagnostics.degraded_metadata > 0 {
            out.push_str(&format!(
                "  {} optional metadata lookup(s) failed\n",
                diagnostics.degraded_metadata
            ));
        }
    }

    out
}
