// Library exports for vizreport

pub mod data;
pub mod error;
pub mod filter;
pub mod chart;
pub mod insight;
pub mod stat;

// Rendering
pub mod ir;
pub mod scale;
pub mod palette;
pub mod compiler;
pub mod layout;
pub mod dispatch;
pub mod graph;

// Session and outer surfaces
pub mod report;
pub mod session;
pub mod parser;
pub mod surface;

pub use chart::{Backend, Bindings, ChartKind, ChartSpec, Role};
pub use data::Dataset;
pub use dispatch::{render, RenderedFigure};
pub use error::{BindingError, ExportError, ParseError, RenderError, VizError};
pub use filter::FilterCriterion;
pub use insight::InsightSummary;
pub use report::{ReportArtifact, ReportExporter};
pub use session::{Selection, Session};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    #[serde(rename = "json")]
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    /// Overrides the first palette color for single-series charts.
    #[serde(default)]
    pub accent: Option<String>,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
            accent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_from_json() {
        let opts: RenderOptions = serde_json::from_str(r#"{"width": 400}"#).unwrap();
        assert_eq!(opts.width, 400);
        assert_eq!(opts.height, 600);
        assert_eq!(opts.format, OutputFormat::Png);

        let opts: RenderOptions = serde_json::from_str(r##"{"type": "svg", "accent": "#ff0000"}"##).unwrap();
        assert_eq!(opts.format, OutputFormat::Svg);
        assert_eq!(opts.accent.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("PNG".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert!("gif".parse::<OutputFormat>().is_err());
    }
}
