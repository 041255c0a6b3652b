use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::{self, Backend, Bindings, ChartKind, ChartSpec, RequiredBindings};
use crate::data::Dataset;
use crate::dispatch::{self, RenderedFigure};
use crate::error::{BindingError, Result};
use crate::filter::{self, FilterCriterion};
use crate::insight::InsightSummary;
use crate::report::{ReportArtifact, ReportExporter};
use crate::RenderOptions;

/// Everything the user has picked so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub filter: Option<FilterCriterion>,
    pub kind: ChartKind,
    pub backend: Backend,
    pub bindings: Bindings,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            filter: None,
            kind: ChartKind::Scatter,
            backend: Backend::Interactive,
            bindings: Bindings::default(),
        }
    }
}

impl Selection {
    pub fn new(kind: ChartKind, backend: Backend, bindings: Bindings) -> Self {
        Selection { filter: None, kind, backend, bindings }
    }

    pub fn with_filter(mut self, criterion: FilterCriterion) -> Self {
        self.filter = Some(criterion);
        self
    }
}

/// The result of one pass through the pipeline.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub spec: ChartSpec,
    pub figure: RenderedFigure,
    pub insight: InsightSummary,
    pub rows: usize,
}

impl Outcome {
    pub fn status(&self) -> String {
        let mut status = format!("{} ({}) over {} rows", self.spec.kind, self.spec.backend, self.rows);
        if self.figure.is_fallback() {
            status.push_str(&format!(", drawn as {}", self.figure.drawn));
        }
        status
    }
}

/// A loaded dataset plus figure options. The dataset is never modified.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    options: RenderOptions,
}

impl Session {
    pub fn new(dataset: Dataset, options: RenderOptions) -> Self {
        Session { dataset, options }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn view(&self, selection: &Selection) -> Cow<'_, Dataset> {
        match &selection.filter {
            Some(criterion) if !criterion.is_identity() => Cow::Owned(filter::apply(&self.dataset, criterion)),
            _ => Cow::Borrowed(&self.dataset),
        }
    }

    pub fn required(&self, selection: &Selection) -> RequiredBindings {
        chart::resolve(selection.kind, &self.view(selection))
    }

    /// The selection's bindings with every unset role given the picker's first offer.
    pub fn complete_bindings(&self, selection: &Selection) -> Bindings {
        let mut bindings = selection.bindings.clone();
        for picker in self.required(selection).pickers {
            if bindings.get(picker.role).is_none() {
                bindings.set(picker.role, picker.candidates.first().cloned());
            }
        }
        bindings
    }

    pub fn validate(&self, selection: &Selection) -> std::result::Result<ChartSpec, BindingError> {
        let view = self.view(selection);
        chart::validate(selection.kind, selection.backend, &selection.bindings, &view)
    }

    /// Filter, validate, construct and summarize.
    pub fn render(&self, selection: &Selection) -> Result<Outcome> {
        let view = self.view(selection);
        let spec = chart::validate(selection.kind, selection.backend, &selection.bindings, &view)?;
        let figure = dispatch::render(&spec, &view, &self.options)?;
        let insight = InsightSummary::compute(&spec, &view);
        debug!(kind = %spec.kind, rows = view.row_count(), "selection rendered");
        Ok(Outcome { spec, figure, insight, rows: view.row_count() })
    }

    pub fn export(&self, selection: &Selection, exporter: &ReportExporter) -> Result<ReportArtifact> {
        let outcome = self.render(selection)?;
        Ok(exporter.export(&outcome.figure, &outcome.insight)?)
    }
}
