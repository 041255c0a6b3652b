//! Part-of-whole charts: pie, treemap and sunburst. These live in a plain
//! frame without axes.

use std::f64::consts::{FRAC_PI_2, TAU};
use tracing::debug;

use crate::chart::{ChartSpec, Role};
use crate::compiler::{aggregate, annotate_no_data, bound, empty_scene, Look};
use crate::data::Dataset;
use crate::error::RenderError;
use crate::ir::{Color, DrawCommand, Frame, LegendEntry, SceneGraph};
use crate::RenderOptions;

const POLAR_FRAME: Frame = Frame::Plain { x: (-1.2, 1.2), y: (-1.2, 1.2), square: true };
const SUNBURST_HOLE: f64 = 0.3;
/// Slices smaller than this share carry no percentage label.
const MIN_LABELLED_SHARE: f64 = 0.04;

/// Positive per-category totals of the value column, in category order.
fn parts(spec: &ChartSpec, view: &Dataset) -> Result<Vec<(String, f64)>, RenderError> {
    let category = bound(spec, view, Role::Category)?;
    let value = bound(spec, view, Role::Value)?;
    let (kept, dropped): (Vec<_>, Vec<_>) = aggregate(category, value)
        .into_iter()
        .map(|(label, sum, _)| (label, sum))
        .partition(|(_, sum)| *sum > 0.0);
    if !dropped.is_empty() {
        debug!(dropped = dropped.len(), "categories with non-positive totals left out");
    }
    Ok(kept)
}

/// Points along a circular arc, counter-clockwise angles in radians.
fn arc(radius: f64, from: f64, to: f64) -> Vec<(f64, f64)> {
    let steps = (((to - from).abs() / TAU) * 120.0).ceil().max(2.0) as usize;
    (0..=steps)
        .map(|i| {
            let a = from + (to - from) * i as f64 / steps as f64;
            (radius * a.cos(), radius * a.sin())
        })
        .collect()
}

/// Angular extent of each part, clockwise from twelve o'clock.
fn sweeps(parts: &[(String, f64)]) -> Vec<(f64, f64)> {
    let total: f64 = parts.iter().map(|p| p.1).sum();
    let mut start = FRAC_PI_2;
    parts
        .iter()
        .map(|(_, v)| {
            let end = start - TAU * v / total;
            let span = (start, end);
            start = end;
            span
        })
        .collect()
}

fn polar_scene(spec: &ChartSpec, options: &RenderOptions, look: &Look) -> SceneGraph {
    let mut scene = empty_scene(spec, options, look, POLAR_FRAME);
    scene.panel_background = look.background;
    scene
}

pub fn pie(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let parts = parts(spec, view)?;
    let mut scene = polar_scene(spec, options, &look);
    if parts.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    let total: f64 = parts.iter().map(|p| p.1).sum();
    for (i, ((label, value), (from, to))) in parts.iter().zip(sweeps(&parts)).enumerate() {
        let color = look.series(i);
        let mut wedge = vec![(0.0, 0.0)];
        wedge.extend(arc(1.0, from, to));
        scene.commands.push(DrawCommand::Polygon { points: wedge, fill: color, alpha: 1.0, border: Some(Color::WHITE) });

        let share = value / total;
        if share >= MIN_LABELLED_SHARE {
            let mid = (from + to) / 2.0;
            scene.commands.push(DrawCommand::Text {
                at: (0.65 * mid.cos(), 0.65 * mid.sin()),
                text: format!("{:.1}%", share * 100.0),
                color: color.contrasting_text(),
                size: 12,
            });
        }
        scene.legend.push(LegendEntry { label: label.clone(), color });
    }
    Ok(scene)
}

pub fn sunburst(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let parts = parts(spec, view)?;
    let mut scene = polar_scene(spec, options, &look);
    if parts.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    for (i, ((label, _), (from, to))) in parts.iter().zip(sweeps(&parts)).enumerate() {
        let color = look.series(i);
        let mut ring = arc(1.0, from, to);
        ring.extend(arc(SUNBURST_HOLE, to, from));
        scene.commands.push(DrawCommand::Polygon { points: ring, fill: color, alpha: 1.0, border: Some(Color::WHITE) });

        let mid = (from + to) / 2.0;
        let r = (1.0 + SUNBURST_HOLE) / 2.0;
        scene.commands.push(DrawCommand::Text {
            at: (r * mid.cos(), r * mid.sin()),
            text: label.clone(),
            color: color.contrasting_text(),
            size: 11,
        });
    }

    let total: f64 = parts.iter().map(|p| p.1).sum();
    scene.commands.push(DrawCommand::Text {
        at: (0.0, 0.0),
        text: format_total(total),
        color: Color::BLACK,
        size: 14,
    });
    Ok(scene)
}

fn format_total(total: f64) -> String {
    if total == total.trunc() {
        format!("Total: {}", total as i64)
    } else {
        format!("Total: {:.2}", total)
    }
}

/// An axis-aligned tile, origin at its lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Tile {
    pub fn area(&self) -> f64 {
        self.w * self.h
    }
}

/// Squarified treemap layout of `values` (descending, positive) inside `bounds`.
pub fn squarify(values: &[f64], bounds: Tile) -> Vec<Tile> {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return Vec::new();
    }
    let scaled: Vec<f64> = values.iter().map(|v| v / total * bounds.area()).collect();

    let mut tiles = Vec::with_capacity(values.len());
    let mut rest = bounds;
    let mut row: Vec<f64> = Vec::new();
    let mut i = 0;
    while i < scaled.len() {
        let side = rest.w.min(rest.h);
        let mut candidate = row.clone();
        candidate.push(scaled[i]);
        if row.is_empty() || worst_ratio(&candidate, side) <= worst_ratio(&row, side) {
            row = candidate;
            i += 1;
        } else {
            rest = lay_row(&row, rest, &mut tiles);
            row.clear();
        }
    }
    if !row.is_empty() {
        lay_row(&row, rest, &mut tiles);
    }
    tiles
}

fn worst_ratio(row: &[f64], side: f64) -> f64 {
    let sum: f64 = row.iter().sum();
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
    let (s2, w2) = (sum * sum, side * side);
    f64::max(w2 * max / s2, s2 / (w2 * min))
}

/// Lay `row` along the shorter side of `rest` and return what remains.
fn lay_row(row: &[f64], rest: Tile, out: &mut Vec<Tile>) -> Tile {
    let sum: f64 = row.iter().sum();
    if rest.w >= rest.h {
        let strip = sum / rest.h;
        let mut y = rest.y;
        for &a in row {
            let h = a / strip;
            out.push(Tile { x: rest.x, y, w: strip, h });
            y += h;
        }
        Tile { x: rest.x + strip, y: rest.y, w: rest.w - strip, h: rest.h }
    } else {
        let strip = sum / rest.w;
        let mut x = rest.x;
        for &a in row {
            let w = a / strip;
            out.push(Tile { x, y: rest.y, w, h: strip });
            x += w;
        }
        Tile { x: rest.x, y: rest.y + strip, w: rest.w, h: rest.h - strip }
    }
}

pub fn treemap(spec: &ChartSpec, view: &Dataset, options: &RenderOptions) -> Result<SceneGraph, RenderError> {
    let look = Look::for_backend(spec.backend, options);
    let mut parts = parts(spec, view)?;
    let mut scene = empty_scene(spec, options, &look, Frame::Plain { x: (0.0, 1.0), y: (0.0, 1.0), square: false });
    if parts.is_empty() {
        annotate_no_data(&mut scene);
        return Ok(scene);
    }

    parts.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let values: Vec<f64> = parts.iter().map(|p| p.1).collect();
    let tiles = squarify(&values, Tile { x: 0.0, y: 0.0, w: 1.0, h: 1.0 });

    for (i, ((label, _), tile)) in parts.iter().zip(tiles).enumerate() {
        let color = look.series(i);
        // Largest tile in the top-left corner
        let top = 1.0 - tile.y;
        scene.commands.push(DrawCommand::Rect {
            tl: (tile.x, top),
            br: (tile.x + tile.w, top - tile.h),
            fill: color,
            alpha: 1.0,
            border: Some(Color::WHITE),
        });
        scene.commands.push(DrawCommand::Text {
            at: (tile.x + tile.w / 2.0, top - tile.h / 2.0),
            text: label.clone(),
            color: color.contrasting_text(),
            size: 12,
        });
    }
    Ok(scene)
}
