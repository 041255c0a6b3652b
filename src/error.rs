use thiserror::Error;

use crate::chart::{ChartKind, Role};

/// Dataset could not be loaded. Fatal to the session that attempted the load.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed tabular data: {0}")]
    Malformed(#[from] csv::Error),

    #[error("malformed JSON data: {0}")]
    Json(String),

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset has no columns")]
    NoColumns,

    #[error("dataset has no rows (need at least one data row)")]
    NoRows,

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Column selection does not satisfy the chosen chart kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("{kind} requires a {role} column")]
    Missing { kind: ChartKind, role: Role },

    #[error("column '{column}' bound to {role} is not in the current view")]
    UnknownColumn { role: Role, column: String },

    #[error("column '{column}' bound to {role} must be numeric")]
    NotNumeric { role: Role, column: String },

    #[error("Heatmap needs at least 2 numeric columns, found {found}")]
    TooFewNumericColumns { found: usize },
}

/// Backend could not construct or encode the requested chart.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot compute {kind} on an empty view")]
    EmptyView { kind: ChartKind },

    #[error("chart has no {role} column bound")]
    Unbound { role: Role },

    #[error("{0} output is not available for static figures")]
    Unsupported(&'static str),

    #[error("failed to encode figure: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to serialize figure: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Draw(#[from] anyhow::Error),
}

/// Report generation failed. The figure already on display is unaffected.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to rasterize figure for the report: {0}")]
    Encode(#[source] RenderError),

    #[error("failed to stage report image: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("failed to compose report document: {0}")]
    Compose(String),

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Any error the pipeline can raise, one variant per stage.
#[derive(Error, Debug)]
pub enum VizError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, VizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_error_message_names_role() {
        let err = BindingError::NotNumeric {
            role: Role::Y,
            column: "region".to_string(),
        };
        assert_eq!(err.to_string(), "column 'region' bound to y must be numeric");
    }

    #[test]
    fn test_missing_binding_message_uses_label() {
        let err = BindingError::Missing {
            kind: ChartKind::Pie,
            role: Role::Category,
        };
        assert_eq!(err.to_string(), "Pie Chart requires a category column");
    }

    #[test]
    fn test_viz_error_wraps_stage() {
        let err: VizError = ParseError::NoRows.into();
        assert!(matches!(err, VizError::Parse(ParseError::NoRows)));
        assert!(err.to_string().starts_with("parse error"));
    }
}
