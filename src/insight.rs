use std::fmt;

use crate::chart::{ChartKind, ChartSpec, Role};
use crate::data::Dataset;
use crate::stat;

pub const HEATMAP_INSIGHT: &str =
    "Heatmap Insight: Stronger colors show higher correlation among numerical variables.";

/// Short textual summary shown beside a chart and embedded in the report.
#[derive(Debug, Clone, PartialEq)]
pub enum InsightSummary {
    Stats { column: String, mean: f64, min: f64, max: f64 },
    /// The bound column has no values in the current view.
    NoValues { column: String },
    Correlation,
    /// The kind has no y/value binding to summarize.
    None,
}

impl InsightSummary {
    /// Summarize the y/value-bound column of `spec` over `view`.
    pub fn compute(spec: &ChartSpec, view: &Dataset) -> Self {
        if spec.kind == ChartKind::Heatmap {
            return InsightSummary::Correlation;
        }

        let Some(name) = spec.column(Role::Y).or_else(|| spec.column(Role::Value)) else {
            return InsightSummary::None;
        };

        let values = view.column(name).map(|c| c.numbers()).unwrap_or_default();
        match (stat::mean(&values), stat::min_max(&values)) {
            (Some(mean), Some((min, max))) => InsightSummary::Stats {
                column: name.to_string(),
                mean,
                min,
                max,
            },
            _ => InsightSummary::NoValues { column: name.to_string() },
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            InsightSummary::Stats { column, mean, min, max } => vec![
                format!("Avg {column}: {mean:.2}"),
                format!("Min {column}: {min:.2}"),
                format!("Max {column}: {max:.2}"),
            ],
            InsightSummary::NoValues { column } => vec![format!("{column}: no values in view")],
            InsightSummary::Correlation => vec![HEATMAP_INSIGHT.to_string()],
            InsightSummary::None => vec![],
        }
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, InsightSummary::None)
    }
}

impl fmt::Display for InsightSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join(" | "))
    }
}
