use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::ir::{Color, DrawCommand, Frame, SceneGraph};

const MARGIN: u32 = 10;
const CAPTION_SIZE: u32 = 20;

/// An RGB pixel buffer, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Encode the buffer as PNG
    pub fn to_png(&self) -> std::result::Result<Vec<u8>, image::ImageError> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder.write_image(&self.pixels, self.width, self.height, image::ColorType::Rgb8)?;
        }
        Ok(png_bytes)
    }
}

/// Paint a scene into a fresh pixel buffer.
pub fn rasterize(scene: &SceneGraph) -> Result<Raster> {
    check_size(scene)?;
    let mut pixels = vec![0u8; buffer_len(scene)?];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (scene.width, scene.height)).into_drawing_area();
        paint(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(Raster { width: scene.width, height: scene.height, pixels })
}

/// Paint a scene as an SVG document.
pub fn to_svg(scene: &SceneGraph) -> Result<String> {
    check_size(scene)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        paint(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

// 16k x 16k
const MAX_PIXELS: u64 = 1 << 28;

fn check_size(scene: &SceneGraph) -> Result<()> {
    if scene.width == 0 || scene.height == 0 {
        anyhow::bail!("figure size must be positive (got {}x{})", scene.width, scene.height);
    }
    if u64::from(scene.width) * u64::from(scene.height) > MAX_PIXELS {
        anyhow::bail!(
            "figure size {}x{} exceeds the {} pixel limit",
            scene.width,
            scene.height,
            MAX_PIXELS
        );
    }
    Ok(())
}

/// Bytes needed for an RGB buffer of the scene's size.
fn buffer_len(scene: &SceneGraph) -> Result<usize> {
    (scene.width as usize)
        .checked_mul(scene.height as usize)
        .and_then(|n| n.checked_mul(3))
        .context("figure buffer size overflows")
}

fn check_domain(name: &str, (lo, hi): (f64, f64)) -> Result<()> {
    if !(hi - lo).is_finite() || hi <= lo {
        anyhow::bail!("{} axis range {}..{} cannot be drawn", name, lo, hi);
    }
    Ok(())
}

fn rgb(c: Color) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Widen one of the ranges so a data unit spans the same pixels on both axes.
fn square_ranges(scene: &SceneGraph, x: (f64, f64), y: (f64, f64)) -> ((f64, f64), (f64, f64)) {
    let w = scene.width.saturating_sub(2 * MARGIN).max(1) as f64;
    let h = scene.height.saturating_sub(2 * MARGIN + 2 * CAPTION_SIZE).max(1) as f64;
    let (cx, cy) = ((x.0 + x.1) / 2.0, (y.0 + y.1) / 2.0);
    let (mut rx, mut ry) = ((x.1 - x.0) / 2.0, (y.1 - y.0) / 2.0);
    if w / h > rx / ry {
        rx = ry * w / h;
    } else {
        ry = rx * h / w;
    }
    ((cx - rx, cx + rx), (cy - ry, cy + ry))
}

fn paint<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&rgb(scene.background)).context("Failed to fill background")?;

    let ((x0, x1), (y0, y1)) = match &scene.frame {
        Frame::Plain { x, y, square: true } => square_ranges(scene, *x, *y),
        frame => frame.ranges(),
    };
    check_domain("x", (x0, x1))?;
    check_domain("y", (y0, y1))?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(MARGIN).caption(&scene.title, ("sans-serif", CAPTION_SIZE));
    if let Frame::Cartesian { .. } = scene.frame {
        builder.x_label_area_size(40).y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .context("Failed to build chart")?;

    chart
        .plotting_area()
        .fill(&rgb(scene.panel_background))
        .context("Failed to fill panel")?;

    if let Frame::Cartesian { x, y } = &scene.frame {
        let x_fmt = |v: &f64| x.label_at(*v);
        let y_fmt = |v: &f64| y.label_at(*v);
        // Category slots sit on integers; one label per slot plus slack
        let x_labels = if x.is_categorical { x.categories.len() + 1 } else { 10 };
        let y_labels = if y.is_categorical { y.categories.len() + 1 } else { 10 };

        chart
            .configure_mesh()
            .x_labels(x_labels)
            .y_labels(y_labels)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc(scene.x_label.as_deref().unwrap_or(""))
            .y_desc(scene.y_label.as_deref().unwrap_or(""))
            .light_line_style(WHITE.mix(0.6))
            .draw()
            .context("Failed to draw mesh")?;
    }

    for command in &scene.commands {
        match command {
            DrawCommand::Line { points, color, width } => {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        points.clone(),
                        rgb(*color).stroke_width(*width),
                    )))
                    .context("Failed to draw line")?;
            }
            DrawCommand::Marker { points, color, radius, alpha } => {
                let (color, radius, alpha) = (rgb(*color), *radius as i32, *alpha);
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, radius, color.mix(alpha).filled())))
                    .context("Failed to draw markers")?;
            }
            DrawCommand::Rect { tl, br, fill, alpha, border } => {
                chart
                    .draw_series(std::iter::once(Rectangle::new([*tl, *br], rgb(*fill).mix(*alpha).filled())))
                    .context("Failed to draw rectangle")?;
                if let Some(border) = border {
                    chart
                        .draw_series(std::iter::once(Rectangle::new([*tl, *br], rgb(*border).stroke_width(1))))
                        .context("Failed to draw rectangle border")?;
                }
            }
            DrawCommand::Polygon { points, fill, alpha, border } => {
                chart
                    .draw_series(std::iter::once(Polygon::new(points.clone(), rgb(*fill).mix(*alpha).filled())))
                    .context("Failed to draw polygon")?;
                if let (Some(border), Some(first)) = (border, points.first()) {
                    let mut outline = points.clone();
                    outline.push(*first);
                    chart
                        .draw_series(std::iter::once(PathElement::new(outline, rgb(*border).stroke_width(1))))
                        .context("Failed to draw polygon border")?;
                }
            }
            DrawCommand::Text { at, text, color, size } => {
                let style = ("sans-serif", *size as f64)
                    .into_font()
                    .color(&rgb(*color))
                    .pos(Pos::new(HPos::Center, VPos::Center));
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), *at, style)))
                    .context("Failed to draw text")?;
            }
        }
    }

    if !scene.legend.is_empty() {
        for entry in &scene.legend {
            let color = rgb(entry.color);
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
                .context("Failed to register legend entry")?
                .label(entry.label.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{LegendEntry, Scale};

    fn scene() -> SceneGraph {
        SceneGraph {
            width: 320,
            height: 240,
            title: "test".to_string(),
            x_label: Some("x".to_string()),
            y_label: Some("y".to_string()),
            background: Color::WHITE,
            panel_background: Color(0xe5, 0xec, 0xf6),
            frame: Frame::Cartesian {
                x: Scale::categorical(vec!["a".into(), "b".into()]),
                y: Scale::continuous((0.0, 10.0)),
            },
            commands: vec![
                DrawCommand::Rect { tl: (-0.4, 5.0), br: (0.4, 0.0), fill: Color(255, 0, 0), alpha: 1.0, border: None },
                DrawCommand::Line { points: vec![(0.0, 1.0), (1.0, 9.0)], color: Color::BLACK, width: 2 },
                DrawCommand::Text { at: (1.0, 5.0), text: "note".into(), color: Color::BLACK, size: 12 },
            ],
            legend: vec![LegendEntry { label: "a".into(), color: Color(255, 0, 0) }],
        }
    }

    #[test]
    fn test_rasterize_paints_background_and_marks() {
        let raster = rasterize(&scene()).unwrap();
        assert_eq!(raster.pixels.len(), 320 * 240 * 3);
        // Top-left corner is outside every chart element
        assert_eq!(&raster.pixels[0..3], &[255, 255, 255]);
        assert!(raster.pixels.chunks(3).any(|p| p == [255, 0, 0]));
    }

    #[test]
    fn test_png_magic() {
        let png = rasterize(&scene()).unwrap().to_png().unwrap();
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_svg_output() {
        let svg = to_svg(&scene()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("note"));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let mut s = scene();
        s.width = 0;
        assert!(rasterize(&s).is_err());
    }

    #[test]
    fn test_oversized_canvas_is_rejected() {
        let mut s = scene();
        s.width = 70_000;
        s.height = 70_000;
        let err = rasterize(&s).unwrap_err();
        assert!(err.to_string().contains("pixel limit"));
        assert!(to_svg(&s).is_err());
    }

    #[test]
    fn test_infinite_domain_is_rejected() {
        let mut s = scene();
        s.frame = Frame::Cartesian {
            x: Scale::continuous((-1e308, 1e308)),
            y: Scale::continuous((0.0, 10.0)),
        };
        let err = rasterize(&s).unwrap_err();
        assert!(err.to_string().contains("x axis range"));
    }

    #[test]
    fn test_square_ranges_widen_x() {
        let s = scene();
        let ((x0, x1), (y0, y1)) = square_ranges(&s, (-1.0, 1.0), (-1.0, 1.0));
        assert_eq!((y0, y1), (-1.0, 1.0));
        assert!(x1 - x0 > 2.0);
    }
}
