use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use tempfile::NamedTempFile;
use textwrap::wrap;
use tracing::{debug, info, warn};

use crate::dispatch::RenderedFigure;
use crate::error::ExportError;
use crate::insight::InsightSummary;

pub const REPORT_TITLE: &str = "Data Visualization Report";

// A4 portrait, millimetres from the bottom-left corner
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TITLE_TOP: f32 = 10.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 7.0;
const LEFT: f32 = 10.0;
const IMAGE_TOP: f32 = 80.0;
const IMAGE_WIDTH: f32 = 180.0;
const WRAP_COLUMNS: usize = 85;

const MM_PER_POINT: f32 = 0.3528;
const MM_PER_INCH: f32 = 25.4;

/// A report document written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
}

/// Writes single-page reports for the figure on display.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
    scratch_dir: Option<PathBuf>,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ReportExporter { output_dir: output_dir.into(), scratch_dir: None }
    }

    /// Stage the intermediate image under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn export(&self, figure: &RenderedFigure, insight: &InsightSummary) -> Result<ReportArtifact, ExportError> {
        self.export_at(figure, insight, Local::now())
    }

    /// Export with an explicit timestamp for the file name.
    pub fn export_at(
        &self,
        figure: &RenderedFigure,
        insight: &InsightSummary,
        now: DateTime<Local>,
    ) -> Result<ReportArtifact, ExportError> {
        let png = figure.to_png().map_err(ExportError::Encode)?;
        let staged = self.stage(&png)?;
        debug!(path = %staged.path().display(), bytes = png.len(), "staged report image");

        let path = self.output_dir.join(report_file_name(now));
        let written = compose(figure, insight, staged.path(), &path);

        // The staged image goes away whether or not the document was written
        if let Err(e) = staged.close() {
            warn!(error = %e, "failed to remove staged report image");
        }
        written?;

        info!(path = %path.display(), kind = %figure.requested, "report written");
        Ok(ReportArtifact { path, created_at: now })
    }

    fn stage(&self, png: &[u8]) -> Result<NamedTempFile, ExportError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("vizreport-").suffix(".png");
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ExportError::Scratch)?;

        file.write_all(png).map_err(ExportError::Scratch)?;
        file.flush().map_err(ExportError::Scratch)?;
        Ok(file)
    }
}

pub fn report_file_name(now: DateTime<Local>) -> String {
    format!("visualization_report_{}.pdf", now.format("%Y%m%d_%H%M%S"))
}

/// Insight text as printed on the page, wrapped to the body width.
fn insight_lines(insight: &InsightSummary) -> Vec<String> {
    if insight.is_empty() {
        return Vec::new();
    }
    wrap(&insight.text(), WRAP_COLUMNS).into_iter().map(|line| line.into_owned()).collect()
}

fn compose_error(e: printpdf::Error) -> ExportError {
    ExportError::Compose(e.to_string())
}

/// Rough advance width for Helvetica; good enough for centering a title.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * MM_PER_POINT
}

fn baseline(top: f32, size: f32) -> Mm {
    Mm(PAGE_HEIGHT - top - size * MM_PER_POINT)
}

fn write_line(layer: &PdfLayerReference, text: &str, size: f32, x: f32, top: f32, font: &IndirectFontRef) {
    layer.use_text(text, size, Mm(x), baseline(top, size), font);
}

fn compose(
    figure: &RenderedFigure,
    insight: &InsightSummary,
    image_path: &Path,
    out: &Path,
) -> Result<(), ExportError> {
    let (doc, page, layer) = PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(compose_error)?;
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(compose_error)?;
    let layer = doc.get_page(page).get_layer(layer);

    let title_x = ((PAGE_WIDTH - text_width(REPORT_TITLE, TITLE_SIZE)) / 2.0).max(LEFT);
    write_line(&layer, REPORT_TITLE, TITLE_SIZE, title_x, TITLE_TOP, &bold);

    let mut top = TITLE_TOP + 12.0;
    let selected = format!("Selected Plot: {}", figure.requested.label());
    write_line(&layer, &selected, BODY_SIZE, LEFT, top, &bold);

    for line in insight_lines(insight) {
        top += LINE_HEIGHT;
        write_line(&layer, &line, BODY_SIZE, LEFT, top, &regular);
    }

    let decoded = image::open(image_path).map_err(|e| ExportError::Compose(e.to_string()))?;
    let (px_width, px_height) = (decoded.width() as f32, decoded.height() as f32);
    // Pick the dpi that makes the image exactly IMAGE_WIDTH wide
    let dpi = px_width * MM_PER_INCH / IMAGE_WIDTH;
    let height_mm = px_height * MM_PER_INCH / dpi;
    Image::from_dynamic_image(&decoded).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(LEFT)),
            translate_y: Some(Mm(PAGE_HEIGHT - IMAGE_TOP - height_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    write_document(out, |w| doc.save(w))
}

/// Create `out` and fill it; a document that fails halfway is removed.
fn write_document<F, E>(out: &Path, fill: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), E>,
    E: std::fmt::Display,
{
    let file = File::create(out).map_err(|source| ExportError::Write {
        path: out.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    if let Err(e) = fill(&mut writer) {
        drop(writer);
        if let Err(remove) = std::fs::remove_file(out) {
            warn!(path = %out.display(), error = %remove, "failed to remove partial report");
        }
        return Err(ExportError::Compose(e.to_string()));
    }
    Ok(())
}
