use tracing::{debug, warn};

use crate::chart::{Backend, ChartKind, ChartSpec};
use crate::compiler;
use crate::data::Dataset;
use crate::error::RenderError;
use crate::graph::{self, Raster};
use crate::ir::SceneGraph;
use crate::layout;
use crate::{OutputFormat, RenderOptions};

/// A chart construction routine.
pub type Construct = fn(&ChartSpec, &Dataset, &RenderOptions) -> Result<SceneGraph, RenderError>;

/// Where a (kind, backend) pair is sent, and the kind that actually gets drawn.
#[derive(Clone, Copy)]
pub struct Route {
    pub construct: Construct,
    pub drawn: ChartKind,
}

impl Route {
    fn new(construct: Construct, drawn: ChartKind) -> Self {
        Route { construct, drawn }
    }
}

/// The fixed (kind, backend) table. The static backend has no part-of-whole
/// or bubble charts; those requests become a sorted line chart.
pub fn route(kind: ChartKind, backend: Backend) -> Route {
    match (kind, backend) {
        (ChartKind::Scatter, Backend::Interactive) => Route::new(compiler::scatter, ChartKind::Scatter),
        (ChartKind::Scatter, Backend::Static) => Route::new(compiler::scatter, ChartKind::Scatter),

        (ChartKind::Line, Backend::Interactive) => Route::new(compiler::line_in_row_order, ChartKind::Line),
        (ChartKind::Line, Backend::Static) => Route::new(compiler::line_sorted_mean, ChartKind::Line),

        (ChartKind::Histogram, Backend::Interactive) => Route::new(compiler::histogram_sturges, ChartKind::Histogram),
        (ChartKind::Histogram, Backend::Static) => Route::new(compiler::histogram_with_density, ChartKind::Histogram),

        (ChartKind::Box, Backend::Interactive) => Route::new(compiler::box_plot, ChartKind::Box),
        (ChartKind::Box, Backend::Static) => Route::new(compiler::box_plot, ChartKind::Box),

        (ChartKind::Heatmap, Backend::Interactive) => Route::new(compiler::heatmap_viridis, ChartKind::Heatmap),
        (ChartKind::Heatmap, Backend::Static) => Route::new(compiler::heatmap_coolwarm, ChartKind::Heatmap),

        (ChartKind::Area, Backend::Interactive) => Route::new(compiler::area, ChartKind::Area),
        (ChartKind::Area, Backend::Static) => Route::new(compiler::area, ChartKind::Area),

        (ChartKind::Bar, Backend::Interactive) => Route::new(compiler::bar_sum, ChartKind::Bar),
        (ChartKind::Bar, Backend::Static) => Route::new(compiler::bar_mean, ChartKind::Bar),

        (ChartKind::Pie, Backend::Interactive) => Route::new(layout::pie, ChartKind::Pie),
        (ChartKind::Pie, Backend::Static) => Route::new(compiler::line_fallback, ChartKind::Line),

        (ChartKind::Violin, Backend::Interactive) => Route::new(compiler::violin, ChartKind::Violin),
        (ChartKind::Violin, Backend::Static) => Route::new(compiler::violin, ChartKind::Violin),

        (ChartKind::Bubble, Backend::Interactive) => Route::new(compiler::bubble, ChartKind::Bubble),
        (ChartKind::Bubble, Backend::Static) => Route::new(compiler::line_fallback, ChartKind::Line),

        (ChartKind::Treemap, Backend::Interactive) => Route::new(layout::treemap, ChartKind::Treemap),
        (ChartKind::Treemap, Backend::Static) => Route::new(compiler::line_fallback, ChartKind::Line),

        (ChartKind::Sunburst, Backend::Interactive) => Route::new(layout::sunburst, ChartKind::Sunburst),
        (ChartKind::Sunburst, Backend::Static) => Route::new(compiler::line_fallback, ChartKind::Line),
    }
}

/// Build the scene for a spec without painting it.
pub fn compose(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<(Route, SceneGraph), RenderError> {
    let route = route(spec.kind, spec.backend);
    if route.drawn != spec.kind {
        warn!(
            requested = %spec.kind,
            drawn = %route.drawn,
            backend = %spec.backend,
            "backend cannot draw this kind, using fallback chart"
        );
    }
    let scene = (route.construct)(spec, view, options)?;
    debug!(
        kind = %spec.kind,
        backend = %spec.backend,
        rows = view.row_count(),
        commands = scene.commands.len(),
        "scene constructed"
    );
    Ok((route, scene))
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureBody {
    /// Retained scene, painted on demand.
    Scene(SceneGraph),
    /// Pixels painted at construction time.
    Raster(Raster),
}

/// One backend's chart for one spec and view.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFigure {
    pub requested: ChartKind,
    pub drawn: ChartKind,
    pub backend: Backend,
    pub body: FigureBody,
}

impl RenderedFigure {
    pub fn is_fallback(&self) -> bool {
        self.requested != self.drawn
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        match &self.body {
            FigureBody::Scene(scene) => Some(scene),
            FigureBody::Raster(_) => None,
        }
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        match &self.body {
            FigureBody::Scene(scene) => Ok(graph::rasterize(scene)?.to_png()?),
            FigureBody::Raster(raster) => Ok(raster.to_png()?),
        }
    }

    pub fn to_svg(&self) -> Result<String, RenderError> {
        match &self.body {
            FigureBody::Scene(scene) => Ok(graph::to_svg(scene)?),
            FigureBody::Raster(_) => Err(RenderError::Unsupported("SVG")),
        }
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        match &self.body {
            FigureBody::Scene(scene) => Ok(serde_json::to_string_pretty(scene)?),
            FigureBody::Raster(_) => Err(RenderError::Unsupported("JSON")),
        }
    }

    /// Bytes of the figure in the requested download format.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, RenderError> {
        match format {
            OutputFormat::Png => self.to_png(),
            OutputFormat::Svg => self.to_svg().map(String::into_bytes),
            OutputFormat::Json => self.to_json().map(String::into_bytes),
        }
    }
}

/// Construct the chart for `spec` over `view` with the spec's backend.
pub fn render(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<RenderedFigure, RenderError> {
    let (route, scene) = compose(spec, view, options)?;
    let body = match spec.backend {
        Backend::Interactive => FigureBody::Scene(scene),
        Backend::Static => FigureBody::Raster(graph::rasterize(&scene)?),
    };
    Ok(RenderedFigure {
        requested: spec.kind,
        drawn: route.drawn,
        backend: spec.backend,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{validate, Bindings, Role};
    use crate::filter::{apply, FilterCriterion};
    use crate::ir::{DrawCommand, Frame};

    fn sales() -> Dataset {
        Dataset::load(b"region,sales,cost\nEast,100,40\nWest,80,30\nNortheast,120,50\nSoutheast,70,25\n").unwrap()
    }

    fn bindings_for(kind: ChartKind) -> Bindings {
        let b = Bindings::default();
        match kind {
            ChartKind::Heatmap => b,
            ChartKind::Histogram => b.with(Role::X, "sales"),
            ChartKind::Pie | ChartKind::Treemap | ChartKind::Sunburst => {
                b.with(Role::Category, "region").with(Role::Value, "sales")
            }
            ChartKind::Bubble => b.with(Role::X, "cost").with(Role::Y, "sales").with(Role::Size, "cost"),
            _ => b.with(Role::X, "region").with(Role::Y, "sales"),
        }
    }

    #[test]
    fn test_every_pair_composes() {
        let ds = sales();
        for kind in ChartKind::ALL {
            for backend in [Backend::Interactive, Backend::Static] {
                let spec = validate(kind, backend, &bindings_for(kind), &ds).unwrap();
                let (route, scene) = compose(&spec, &ds, &RenderOptions::default())
                    .unwrap_or_else(|e| panic!("{kind} / {backend}: {e}"));
                assert!(!scene.commands.is_empty(), "{kind} / {backend}");
                assert_eq!(scene.width, 800);
                let falls_back = backend == Backend::Static
                    && matches!(kind, ChartKind::Pie | ChartKind::Bubble | ChartKind::Treemap | ChartKind::Sunburst);
                assert_eq!(route.drawn != kind, falls_back, "{kind} / {backend}");
            }
        }
    }

    #[test]
    fn test_east_bar_scenario() {
        let ds = sales();
        let view = apply(&ds, &FilterCriterion::new("region", "east"));
        assert_eq!(view.row_count(), 3);
        let spec = validate(ChartKind::Bar, Backend::Interactive, &bindings_for(ChartKind::Bar), &view).unwrap();
        let (_, scene) = compose(&spec, &view, &RenderOptions::default()).unwrap();

        match &scene.frame {
            Frame::Cartesian { x, .. } => assert_eq!(x.categories, vec!["East", "Northeast", "Southeast"]),
            other => panic!("unexpected frame {other:?}"),
        }
        let heights: Vec<f64> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { tl, .. } => Some(tl.1),
                _ => None,
            })
            .collect();
        assert_eq!(heights, vec![100.0, 120.0, 70.0]);
    }

    #[test]
    fn test_static_pie_is_line_fallback() {
        let ds = sales();
        let spec = validate(ChartKind::Pie, Backend::Static, &bindings_for(ChartKind::Pie), &ds).unwrap();
        let (first_route, first) = compose(&spec, &ds, &RenderOptions::default()).unwrap();
        let (_, second) = compose(&spec, &ds, &RenderOptions::default()).unwrap();
        assert_eq!(first_route.drawn, ChartKind::Line);
        assert_eq!(first, second);
        assert_eq!(first.count(|c| matches!(c, DrawCommand::Line { .. })), 1);
    }

    #[test]
    fn test_compose_is_pure() {
        let ds = sales();
        let before = ds.clone();
        let spec = validate(ChartKind::Heatmap, Backend::Interactive, &Bindings::default(), &ds).unwrap();
        let a = compose(&spec, &ds, &RenderOptions::default()).unwrap().1;
        let b = compose(&spec, &ds, &RenderOptions::default()).unwrap().1;
        assert_eq!(a, b);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_heatmap_on_empty_view_fails() {
        let ds = sales();
        let view = apply(&ds, &FilterCriterion::new("region", "mars"));
        let spec = validate(ChartKind::Heatmap, Backend::Interactive, &Bindings::default(), &view).unwrap();
        assert!(matches!(render(&spec, &view, &RenderOptions::default()), Err(RenderError::EmptyView { .. })));
    }

    #[test]
    fn test_interactive_figure_downloads() {
        let ds = sales();
        let spec = validate(ChartKind::Scatter, Backend::Interactive, &bindings_for(ChartKind::Scatter), &ds).unwrap();
        let figure = render(&spec, &ds, &RenderOptions { width: 320, height: 240, ..Default::default() }).unwrap();
        assert!(!figure.is_fallback());
        let json: serde_json::Value = serde_json::from_str(&figure.to_json().unwrap()).unwrap();
        assert_eq!(json["frame"]["type"], "cartesian");
        assert!(figure.to_svg().unwrap().contains("<svg"));
        assert_eq!(&figure.to_png().unwrap()[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_static_figure_is_raster_only() {
        let ds = sales();
        let spec = validate(ChartKind::Sunburst, Backend::Static, &bindings_for(ChartKind::Sunburst), &ds).unwrap();
        let figure = render(&spec, &ds, &RenderOptions { width: 320, height: 240, ..Default::default() }).unwrap();
        assert!(figure.is_fallback());
        assert_eq!(figure.requested, ChartKind::Sunburst);
        assert!(matches!(figure.body, FigureBody::Raster(_)));
        assert!(matches!(figure.to_svg(), Err(RenderError::Unsupported("SVG"))));
        assert!(matches!(figure.encode(OutputFormat::Json), Err(RenderError::Unsupported("JSON"))));
        assert_eq!(&figure.to_png().unwrap()[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_oversized_static_canvas_is_a_draw_error() {
        let ds = sales();
        let spec = validate(ChartKind::Scatter, Backend::Static, &bindings_for(ChartKind::Scatter), &ds).unwrap();
        let options = RenderOptions { width: 70_000, height: 70_000, ..Default::default() };
        assert!(matches!(render(&spec, &ds, &options), Err(RenderError::Draw(_))));
    }

    #[test]
    fn test_values_near_f64_max_render() {
        let ds = Dataset::load(b"t,a,b\nx,1e308,2\ny,-1e308,3\n").unwrap();
        let bindings = Bindings::default().with(Role::X, "b").with(Role::Y, "a");
        for backend in [Backend::Interactive, Backend::Static] {
            let spec = validate(ChartKind::Scatter, backend, &bindings, &ds).unwrap();
            let figure = render(&spec, &ds, &RenderOptions { width: 320, height: 240, ..Default::default() }).unwrap();
            assert_eq!(&figure.to_png().unwrap()[0..4], &[137, 80, 78, 71]);
        }
    }
}
