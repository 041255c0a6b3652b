use std::cmp::Ordering;
use tracing::debug;

use crate::chart::{Backend, Bindings, ChartKind, ChartSpec, Role};
use crate::data::{Cell, Column, ColumnKind, Dataset};
use crate::error::RenderError;
use crate::ir::{Color, DrawCommand, Frame, LegendEntry, Scale, SceneGraph};
use crate::palette;
use crate::scale::{category_slots, MinMax, XAxis};
use crate::stat::{self, BoxStats};
use crate::RenderOptions;

/// Annotation placed on charts whose view has nothing to plot.
pub const NO_DATA: &str = "No data";

const STATIC_HISTOGRAM_BINS: usize = 30;

// =============================================================================
// Shared scene scaffolding
// =============================================================================

/// The colors a backend draws with.
#[derive(Debug, Clone)]
pub struct Look {
    pub palette: &'static [Color],
    pub background: Color,
    pub panel: Color,
    /// Single-series color.
    pub primary: Color,
    backend: Backend,
}

impl Look {
    pub fn for_backend(backend: Backend, options: &RenderOptions) -> Self {
        let (colors, panel): (&'static [Color], Color) = match backend {
            Backend::Interactive => (&palette::INTERACTIVE, Color(0xe5, 0xec, 0xf6)),
            Backend::Static => (&palette::STATIC, Color::WHITE),
        };
        let primary = options
            .accent
            .as_deref()
            .and_then(palette::parse_color)
            .unwrap_or(colors[0]);
        Look { palette: colors, background: Color::WHITE, panel, primary, backend }
    }

    pub fn series(&self, i: usize) -> Color {
        palette::cycle(self.palette, i)
    }

    /// Per-group color: the static backend colors each group, the interactive one keeps one hue.
    fn group(&self, i: usize) -> Color {
        match self.backend {
            Backend::Interactive => self.primary,
            Backend::Static => self.series(i),
        }
    }
}

pub fn title(spec: &ChartSpec) -> String {
    let col = move |role: Role| spec.column(role).unwrap_or("?");
    let label = spec.kind.label();
    match spec.kind {
        ChartKind::Heatmap => "Correlation Heatmap".to_string(),
        ChartKind::Histogram => format!("Histogram of {}", col(Role::X)),
        ChartKind::Pie | ChartKind::Treemap | ChartKind::Sunburst => {
            format!("{}: {} by {}", label, col(Role::Value), col(Role::Category))
        }
        ChartKind::Bubble => format!(
            "{}: {} vs {} (size: {})",
            label,
            col(Role::Y),
            col(Role::X),
            col(Role::Size)
        ),
        _ => format!("{}: {} vs {}", label, col(Role::Y), col(Role::X)),
    }
}

pub(crate) fn bound<'a>(spec: &ChartSpec, view: &'a Dataset, role: Role) -> Result<&'a Column, RenderError> {
    spec.column(role)
        .and_then(|name| view.column(name))
        .ok_or(RenderError::Unbound { role })
}

pub(crate) fn empty_scene(spec: &ChartSpec, options: &RenderOptions, look: &Look, frame: Frame) -> SceneGraph {
    SceneGraph {
        width: options.width,
        height: options.height,
        title: title(spec),
        x_label: None,
        y_label: None,
        background: look.background,
        panel_background: look.panel,
        frame,
        commands: Vec::new(),
        legend: Vec::new(),
    }
}

fn axes_scene(
    spec: &ChartSpec,
    options: &RenderOptions,
    look: &Look,
    x: Scale,
    y: Scale,
    x_label: &str,
    y_label: &str,
) -> SceneGraph {
    let mut scene = empty_scene(spec, options, look, Frame::Cartesian { x, y });
    scene.x_label = Some(x_label.to_string());
    scene.y_label = Some(y_label.to_string());
    scene
}

pub(crate) fn annotate_no_data(scene: &mut SceneGraph) {
    let ((x0, x1), (y0, y1)) = scene.frame.ranges();
    scene.commands.push(DrawCommand::Text {
        at: ((x0 + x1) / 2.0, (y0 + y1) / 2.0),
        text: NO_DATA.to_string(),
        color: Color::GRAY,
        size: 24,
    });
}

/// (x position, y value) for every row where both are present, in data order.
fn xy_points(x: &XAxis, y: &Column) -> Vec<(f64, f64)> {
    x.positions
        .iter()
        .zip(&y.cells)
        .filter_map(|(px, cy)| Some(((*px)?, cy.as_f64()?)))
        .collect()
}

/// Sort by x and average the y values that share an x.
fn mean_by_x(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    let mut acc: Vec<(f64, f64, usize)> = Vec::new();
    for (x, y) in points {
        match acc.last_mut() {
            Some(last) if last.0 == x => {
                last.1 += y;
                last.2 += 1;
            }
            _ => acc.push((x, y, 1)),
        }
    }
    acc.into_iter().map(|(x, sum, n)| (x, sum / n as f64)).collect()
}

/// Per-category (label, sum, count) of `value`, in axis order, skipping missing cells.
/// Categories with no values are dropped.
pub(crate) fn aggregate(category: &Column, value: &Column) -> Vec<(String, f64, usize)> {
    let (categories, slots) = category_slots(category);
    let mut acc = vec![(0.0, 0usize); categories.len()];
    for (slot, cell) in slots.iter().zip(&value.cells) {
        if let (Some(slot), Some(v)) = (slot, cell.as_f64()) {
            let entry = &mut acc[*slot as usize];
            entry.0 += v;
            entry.1 += 1;
        }
    }
    categories
        .into_iter()
        .zip(acc)
        .filter(|(_, (_, n))| *n > 0)
        .map(|(c, (sum, n))| (c, sum, n))
        .collect()
}

/// Values of `value` grouped by the categories of `category`, empty groups dropped.
fn group_values(category: &Column, value: &Column) -> Vec<(String, Vec<f64>)> {
    let (categories, slots) = category_slots(category);
    let mut acc: Vec<Vec<f64>> = vec![Vec::new(); categories.len()];
    for (slot, cell) in slots.iter().zip(&value.cells) {
        if let (Some(slot), Some(v)) = (slot, cell.as_f64()) {
            acc[*slot as usize].push(v);
        }
    }
    categories
        .into_iter()
        .zip(acc)
        .filter(|(_, vs)| !vs.is_empty())
        .collect()
}

fn bar_rect(x: f64, half_width: f64, bottom: f64, top: f64, fill: Color, border: Option<Color>) -> DrawCommand {
    DrawCommand::Rect {
        tl: (x - half_width, top.max(bottom)),
        br: (x + half_width, top.min(bottom)),
        fill,
        alpha: 1.0,
        border,
    }
}

// =============================================================================
// Scatter / Line / Area
// =============================================================================

pub fn scatter(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let (xc, yc) = (bound(spec, view, Role::X)?, bound(spec, view, Role::Y)?);
    let axis = XAxis::for_column(xc);
    let points = xy_points(&axis, yc);

    let mut y = MinMax::default();
    y.extend(points.iter().map(|p| p.1));
    let mut scene = axes_scene(spec, options, &look, axis.scale, Scale::continuous(y.padded()), &xc.name, &yc.name);
    if points.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    let radius = match spec.backend {
        Backend::Interactive => 5,
        Backend::Static => 4,
    };
    scene.commands.push(DrawCommand::Marker { points, color: look.primary, radius, alpha: 0.8 });
    Ok(scene)
}

fn line_through(
    spec: &ChartSpec,
    view: &Dataset,
    options: &RenderOptions,
    points_of: fn(Vec<(f64, f64)>) -> Vec<(f64, f64)>,
) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let (xc, yc) = (bound(spec, view, Role::X)?, bound(spec, view, Role::Y)?);
    let axis = XAxis::for_column(xc);
    let points = points_of(xy_points(&axis, yc));

    let mut y = MinMax::default();
    y.extend(points.iter().map(|p| p.1));
    let mut scene = axes_scene(spec, options, &look, axis.scale, Scale::continuous(y.padded()), &xc.name, &yc.name);
    if points.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    scene.commands.push(DrawCommand::Line { points, color: look.primary, width: 2 });
    Ok(scene)
}

/// Points joined in row order.
pub fn line_in_row_order(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    line_through(spec, view, options, |points| points)
}

/// Points sorted by x, duplicates averaged.
pub fn line_sorted_mean(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    line_through(spec, view, options, mean_by_x)
}

/// Stand-in for kinds the static backend cannot draw: a sorted line over the
/// kind's own two primary bindings.
pub fn line_fallback(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let (x_role, y_role) = match spec.kind {
        ChartKind::Pie | ChartKind::Treemap | ChartKind::Sunburst => (Role::Category, Role::Value),
        _ => (Role::X, Role::Y),
    };
    let x = bound(spec, view, x_role)?;
    let y = bound(spec, view, y_role)?;
    let as_line = ChartSpec {
        kind: ChartKind::Line,
        backend: spec.backend,
        bindings: Bindings::default()
            .with(Role::X, x.name.clone())
            .with(Role::Y, y.name.clone()),
    };
    debug!(requested = %spec.kind, x = %x.name, y = %y.name, "building line fallback");
    line_sorted_mean(&as_line, view, options)
}

pub fn area(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let (xc, yc) = (bound(spec, view, Role::X)?, bound(spec, view, Role::Y)?);
    let axis = XAxis::for_column(xc);
    let points = mean_by_x(xy_points(&axis, yc));

    let mut y = MinMax::default();
    y.extend(points.iter().map(|p| p.1));
    let mut scene = axes_scene(
        spec,
        options,
        &look,
        axis.scale,
        Scale::continuous(y.padded_from_zero()),
        &xc.name,
        &yc.name,
    );
    let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
        annotate_no_data(&mut scene);
        return Ok(scene);
    };

    let mut outline = Vec::with_capacity(points.len() + 2);
    outline.push((first.0, 0.0));
    outline.extend(points.iter().copied());
    outline.push((last.0, 0.0));

    scene.commands.push(DrawCommand::Polygon { points: outline, fill: look.primary, alpha: 0.4, border: None });
    scene.commands.push(DrawCommand::Line { points, color: look.primary, width: 2 });
    Ok(scene)
}

// =============================================================================
// Bar / Bubble
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Aggregate {
    Sum,
    Mean,
}

fn bars(spec: &ChartSpec, view: &Dataset, options: &RenderOptions, how: Aggregate) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let (xc, yc) = (bound(spec, view, Role::X)?, bound(spec, view, Role::Y)?);
    let totals = aggregate(xc, yc);

    let heights: Vec<f64> = totals
        .iter()
        .map(|(_, sum, n)| match how {
            Aggregate::Sum => *sum,
            Aggregate::Mean => sum / *n as f64,
        })
        .collect();

    let mut y = MinMax::default();
    y.extend(heights.iter().copied());
    let categories = totals.iter().map(|(c, _, _)| c.clone()).collect();
    let mut scene = axes_scene(
        spec,
        options,
        &look,
        Scale::categorical(categories),
        Scale::continuous(y.padded_from_zero()),
        &xc.name,
        &yc.name,
    );
    if heights.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    for (i, h) in heights.into_iter().enumerate() {
        scene.commands.push(bar_rect(i as f64, 0.4, 0.0, h, look.group(i), None));
    }
    Ok(scene)
}

/// One bar per category holding the category's total.
pub fn bar_sum(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    bars(spec, view, options, Aggregate::Sum)
}

/// One bar per category holding the category's mean.
pub fn bar_mean(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    bars(spec, view, options, Aggregate::Mean)
}

const BUBBLE_MIN_RADIUS: f64 = 4.0;
const BUBBLE_MAX_RADIUS: f64 = 30.0;

pub fn bubble(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let xc = bound(spec, view, Role::X)?;
    let yc = bound(spec, view, Role::Y)?;
    let sc = bound(spec, view, Role::Size)?;
    let axis = XAxis::for_column(xc);
    let categories = axis.scale.categories.clone();

    let rows: Vec<(f64, f64, f64)> = axis
        .positions
        .iter()
        .zip(&yc.cells)
        .zip(&sc.cells)
        .filter_map(|((px, cy), cs)| Some(((*px)?, cy.as_f64()?, cs.as_f64()?)))
        .collect();

    let mut y = MinMax::default();
    y.extend(rows.iter().map(|r| r.1));
    let mut scene = axes_scene(spec, options, &look, axis.scale, Scale::continuous(y.padded()), &xc.name, &yc.name);
    if rows.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    // Bubbles are colored by x: one series per category, or a gradient over numeric x
    let xs: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let (x_lo, x_hi) = stat::min_max(&xs).unwrap_or((0.0, 0.0));
    let color_of = |x: f64| {
        if categories.is_empty() {
            let t = if x_hi > x_lo { (x - x_lo) / (x_hi - x_lo) } else { 0.5 };
            palette::viridis(t)
        } else {
            look.series(x as usize)
        }
    };
    scene.legend = categories
        .iter()
        .enumerate()
        .map(|(slot, label)| LegendEntry { label: label.clone(), color: look.series(slot) })
        .collect();

    let sizes: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let (lo, hi) = stat::min_max(&sizes).unwrap_or((0.0, 0.0));
    for (x, y, s) in rows {
        // Area proportional to size
        let t = if hi > lo { ((s - lo) / (hi - lo)).sqrt() } else { 0.5 };
        let radius = (BUBBLE_MIN_RADIUS + t * (BUBBLE_MAX_RADIUS - BUBBLE_MIN_RADIUS)).round() as u32;
        scene.commands.push(DrawCommand::Marker { points: vec![(x, y)], color: color_of(x), radius, alpha: 0.6 });
    }
    Ok(scene)
}

// =============================================================================
// Histogram
// =============================================================================

fn histogram(
    spec: &ChartSpec,
    view: &Dataset,
    options: &RenderOptions,
    bin_count: fn(usize) -> usize,
    with_density: bool,
) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let xc = bound(spec, view, Role::X)?;
    let border = match spec.backend {
        Backend::Interactive => Some(Color::WHITE),
        Backend::Static => Some(Color::BLACK),
    };

    // Text columns are counted per category
    if !xc.is_numeric() {
        let ones = ones_like(xc);
        let counts = aggregate(xc, &ones);
        let mut y = MinMax::default();
        y.extend(counts.iter().map(|c| c.2 as f64));
        let categories = counts.iter().map(|c| c.0.clone()).collect();
        let mut scene = axes_scene(
            spec,
            options,
            &look,
            Scale::categorical(categories),
            Scale::continuous(y.padded_from_zero()),
            &xc.name,
            "count",
        );
        if counts.is_empty() {
            annotate_no_data(&mut scene);
        }
        for (i, (_, _, n)) in counts.into_iter().enumerate() {
            scene.commands.push(bar_rect(i as f64, 0.45, 0.0, n as f64, look.primary, border));
        }
        return Ok(scene);
    }

    let values = xc.numbers();
    if values.is_empty() {
        let mut scene = axes_scene(
            spec,
            options,
            &look,
            Scale::continuous((0.0, 1.0)),
            Scale::continuous((0.0, 1.0)),
            &xc.name,
            "count",
        );
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    let bins = stat::histogram(&values, bin_count(values.len()));
    let density = (with_density && values.len() >= 2).then(|| stat::kde(&values, 200));

    let mut x = MinMax::default();
    let mut y = MinMax::default();
    x.push(bins.start);
    x.push(bins.start + bins.width * bins.counts.len() as f64);
    y.extend(bins.counts.iter().map(|&c| c as f64));

    // Density scaled to the count axis
    let curve: Option<Vec<(f64, f64)>> = density.map(|d| {
        let scale = values.len() as f64 * bins.width;
        d.grid.iter().zip(&d.density).map(|(&g, &p)| (g, p * scale)).collect()
    });
    if let Some(points) = &curve {
        x.extend(points.iter().map(|p| p.0));
        y.extend(points.iter().map(|p| p.1));
    }

    let mut scene = axes_scene(
        spec,
        options,
        &look,
        Scale::continuous(x.padded()),
        Scale::continuous(y.padded_from_zero()),
        &xc.name,
        "count",
    );
    for (i, &count) in bins.counts.iter().enumerate() {
        let (lo, hi) = bins.edges(i);
        scene.commands.push(DrawCommand::Rect {
            tl: (lo, count as f64),
            br: (hi, 0.0),
            fill: look.primary,
            alpha: 0.75,
            border,
        });
    }
    if let Some(points) = curve {
        scene.commands.push(DrawCommand::Line { points, color: look.series(1), width: 2 });
    }
    Ok(scene)
}

/// A numeric column of ones aligned with `column`, missing where it is missing.
fn ones_like(column: &Column) -> Column {
    Column {
        name: column.name.clone(),
        kind: ColumnKind::Numeric,
        cells: column
            .cells
            .iter()
            .map(|c| if c.is_missing() { Cell::Missing } else { Cell::Int(1) })
            .collect(),
    }
}

/// Sturges' rule bin count.
pub fn histogram_sturges(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    histogram(spec, view, options, stat::sturges_bins, false)
}

/// Fixed 30 bins with a kernel-density overlay.
pub fn histogram_with_density(
    spec: &ChartSpec,
    view: &Dataset,
    options: &RenderOptions,
) -> Result<SceneGraph, RenderError> {
    histogram(spec, view, options, |_| STATIC_HISTOGRAM_BINS, true)
}

// =============================================================================
// Box / Violin
// =============================================================================

/// Computed geometry for a single boxplot, expressed as primitive shapes
struct BoxplotGeometry {
    lower_whisker: Vec<(f64, f64)>,
    upper_whisker: Vec<(f64, f64)>,
    min_cap: Vec<(f64, f64)>,
    max_cap: Vec<(f64, f64)>,
    box_tl: (f64, f64),
    box_br: (f64, f64),
    median_line: Vec<(f64, f64)>,
    outlier_points: Vec<(f64, f64)>,
}

fn compute_boxplot_geometry(x: f64, width: f64, stats: &BoxStats) -> BoxplotGeometry {
    let half_width = width / 2.0;
    let cap_half = width * 0.2;

    BoxplotGeometry {
        lower_whisker: vec![(x, stats.lower_whisker), (x, stats.q1)],
        upper_whisker: vec![(x, stats.q3), (x, stats.upper_whisker)],
        min_cap: vec![(x - cap_half, stats.lower_whisker), (x + cap_half, stats.lower_whisker)],
        max_cap: vec![(x - cap_half, stats.upper_whisker), (x + cap_half, stats.upper_whisker)],
        box_tl: (x - half_width, stats.q3),
        box_br: (x + half_width, stats.q1),
        median_line: vec![(x - half_width, stats.median), (x + half_width, stats.median)],
        outlier_points: stats.outliers.iter().map(|&v| (x, v)).collect(),
    }
}

fn grouped_axes(
    spec: &ChartSpec,
    view: &Dataset,
    options: &RenderOptions,
    look: &Look,
    y_extent: impl Fn(&[f64]) -> Vec<f64>,
) -> Result<(SceneGraph, Vec<(String, Vec<f64>)>), RenderError> {
    let (xc, yc) = (bound(spec, view, Role::X)?, bound(spec, view, Role::Y)?);
    let groups = group_values(xc, yc);

    let mut y = MinMax::default();
    for (_, values) in &groups {
        y.extend(y_extent(values));
    }
    let categories = groups.iter().map(|g| g.0.clone()).collect();
    let mut scene = axes_scene(
        spec,
        options,
        look,
        Scale::categorical(categories),
        Scale::continuous(y.padded()),
        &xc.name,
        &yc.name,
    );
    if groups.is_empty() {
        annotate_no_data(&mut scene);
    }
    Ok((scene, groups))
}

pub fn box_plot(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let (mut scene, groups) = grouped_axes(spec, view, options, &look, |v| v.to_vec())?;

    for (i, (_, values)) in groups.iter().enumerate() {
        let Some(stats) = stat::box_stats(values) else { continue };
        let geom = compute_boxplot_geometry(i as f64, 0.6, &stats);
        let color = look.group(i);

        for points in [geom.lower_whisker, geom.upper_whisker, geom.min_cap, geom.max_cap] {
            scene.commands.push(DrawCommand::Line { points, color, width: 2 });
        }
        scene.commands.push(DrawCommand::Rect {
            tl: geom.box_tl,
            br: geom.box_br,
            fill: color,
            alpha: 0.5,
            border: Some(color),
        });
        scene.commands.push(DrawCommand::Line { points: geom.median_line, color: Color::WHITE, width: 2 });
        if !geom.outlier_points.is_empty() {
            scene.commands.push(DrawCommand::Marker { points: geom.outlier_points, color, radius: 3, alpha: 1.0 });
        }
    }
    Ok(scene)
}

pub fn violin(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    // The density tails extend past the data, so the axis covers the KDE grid
    let (mut scene, groups) = grouped_axes(spec, view, options, &look, |v| {
        if v.len() >= 2 { stat::kde(v, 2).grid } else { v.to_vec() }
    })?;

    const HALF_WIDTH: f64 = 0.4;
    for (i, (_, values)) in groups.iter().enumerate() {
        let x = i as f64;
        let color = look.group(i);

        if values.len() >= 2 {
            let density = stat::kde(values, 100);
            let widths = density.normalized();
            let mut outline: Vec<(f64, f64)> = density
                .grid
                .iter()
                .zip(&widths)
                .map(|(&y, &w)| (x + w * HALF_WIDTH, y))
                .collect();
            outline.extend(density.grid.iter().zip(&widths).rev().map(|(&y, &w)| (x - w * HALF_WIDTH, y)));
            scene.commands.push(DrawCommand::Polygon { points: outline, fill: color, alpha: 0.5, border: Some(color) });
        }

        if let Some(stats) = stat::box_stats(values) {
            scene.commands.push(DrawCommand::Line {
                points: vec![(x, stats.lower_whisker), (x, stats.upper_whisker)],
                color: Color::BLACK,
                width: 1,
            });
            scene.commands.push(bar_rect(x, 0.03, stats.q1, stats.q3, Color::BLACK, None));
            scene.commands.push(DrawCommand::Marker {
                points: vec![(x, stats.median)],
                color: Color::WHITE,
                radius: 3,
                alpha: 1.0,
            });
        }
    }
    Ok(scene)
}

// =============================================================================
// Heatmap
// =============================================================================

fn heatmap(
    spec: &ChartSpec,
    view: &Dataset,
    options: &RenderOptions,
    colormap: fn(f64) -> Color,
) -> Result<SceneGraph, RenderError> {
    if view.is_empty() {
        return Err(RenderError::EmptyView { kind: spec.kind });
    }
    let matrix = stat::correlation_matrix(view);
    let n = matrix.columns.len();
    if n == 0 {
        return Err(RenderError::EmptyView { kind: spec.kind });
    }

    let look = Look::for_backend(spec.backend, options);
    // First column on the top row
    let rows: Vec<String> = matrix.columns.iter().rev().cloned().collect();
    let mut scene = empty_scene(
        spec,
        options,
        &look,
        Frame::Cartesian {
            x: Scale::categorical(matrix.columns.clone()),
            y: Scale::categorical(rows),
        },
    );

    for i in 0..n {
        let y = (n - 1 - i) as f64;
        for j in 0..n {
            let x = j as f64;
            let r = matrix.get(i, j);
            let (fill, text) = if r.is_nan() {
                (palette::NEUTRAL, "nan".to_string())
            } else {
                (colormap((r + 1.0) / 2.0), format!("{:.2}", r))
            };
            scene.commands.push(DrawCommand::Rect {
                tl: (x - 0.5, y + 0.5),
                br: (x + 0.5, y - 0.5),
                fill,
                alpha: 1.0,
                border: Some(Color::WHITE),
            });
            scene.commands.push(DrawCommand::Text { at: (x, y), text, color: fill.contrasting_text(), size: 12 });
        }
    }

    scene.legend = [(-1.0, "-1.0"), (0.0, "0.0"), (1.0, "1.0")]
        .into_iter()
        .map(|(r, label)| LegendEntry { label: label.to_string(), color: colormap((r + 1.0) / 2.0) })
        .collect();
    Ok(scene)
}

pub fn heatmap_viridis(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    heatmap(spec, view, options, palette::viridis)
}

pub fn heatmap_coolwarm(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    heatmap(spec, view, options, palette::coolwarm)
}
