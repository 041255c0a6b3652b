use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vizreport::chart::{Backend, Bindings, ChartKind, Role};
use vizreport::surface::Surface;
use vizreport::{stat, Dataset, FilterCriterion, OutputFormat, RenderOptions, ReportExporter, Selection, Session};

#[derive(Parser, Debug)]
#[command(name = "vizreport")]
#[command(about = "Filter a CSV file, chart it, and export a PDF report", long_about = None)]
struct Args {
    /// CSV file (or JSON records with a .json extension) to load, or '-' for CSV on stdin
    input: String,

    /// Column the filter applies to
    #[arg(long, requires = "filter")]
    filter_column: Option<String>,

    /// Keep rows whose filter column contains this text (case-insensitive)
    #[arg(long, requires = "filter_column")]
    filter: Option<String>,

    /// Chart kind (scatter, line, histogram, box, heatmap, area, bar, pie, violin, bubble, treemap, sunburst)
    #[arg(long, default_value = "scatter")]
    kind: ChartKind,

    /// Rendering backend (interactive or static)
    #[arg(long, default_value = "interactive")]
    backend: Backend,

    #[arg(short = 'x', long = "x")]
    x: Option<String>,

    #[arg(short = 'y', long = "y")]
    y: Option<String>,

    #[arg(long)]
    size: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    value: Option<String>,

    /// Where to write the figure (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Figure format: png, svg or json
    #[arg(long)]
    format: Option<OutputFormat>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Render options as JSON, e.g. '{"width": 1024, "accent": "#ff7f0e"}'
    #[arg(long)]
    options: Option<String>,

    /// Also write a PDF report of the figure
    #[arg(long)]
    report: bool,

    /// Directory for the PDF report
    #[arg(long, default_value = ".")]
    report_dir: PathBuf,

    /// Print summary statistics of the (filtered) data and exit
    #[arg(long)]
    describe: bool,

    /// Print the first N rows of the (filtered) data and exit
    #[arg(long, value_name = "N")]
    head: Option<usize>,

    /// Read commands from stdin instead of rendering once
    #[arg(long)]
    interactive: bool,
}

impl Args {
    fn render_options(&self) -> Result<RenderOptions> {
        let mut options = match &self.options {
            Some(json) => serde_json::from_str(json).context("Failed to parse --options")?,
            None => RenderOptions::default(),
        };
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(format) = self.format {
            options.format = format;
        }
        Ok(options)
    }

    fn selection(&self) -> Selection {
        let mut bindings = Bindings::default();
        let flags = [
            (Role::X, &self.x),
            (Role::Y, &self.y),
            (Role::Size, &self.size),
            (Role::Category, &self.category),
            (Role::Value, &self.value),
        ];
        for (role, column) in flags {
            if let Some(column) = column {
                bindings.set(role, Some(column.clone()));
            }
        }

        let mut selection = Selection::new(self.kind, self.backend, bindings);
        if let (Some(column), Some(substring)) = (&self.filter_column, &self.filter) {
            selection = selection.with_filter(FilterCriterion::new(column.as_str(), substring.as_str()));
        }
        selection
    }
}

fn load_dataset(input: &str) -> Result<Dataset> {
    if input == "-" {
        let mut raw = Vec::new();
        io::stdin()
            .read_to_end(&mut raw)
            .context("Failed to read CSV from stdin")?;
        Ok(Dataset::load(&raw).context("Failed to parse CSV from stdin")?)
    } else if input.ends_with(".json") {
        let raw = fs::read(input).with_context(|| format!("Failed to load {}", input))?;
        let value: serde_json::Value =
            serde_json::from_slice(&raw).with_context(|| format!("Failed to parse {}", input))?;
        Ok(Dataset::from_json(&value).with_context(|| format!("Failed to load {}", input))?)
    } else {
        Ok(Dataset::load_path(input).with_context(|| format!("Failed to load {}", input))?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.interactive && args.input == "-" {
        bail!("--interactive reads commands from stdin, so the CSV must come from a file");
    }

    let dataset = load_dataset(&args.input)?;
    let session = Session::new(dataset, args.render_options()?);
    let mut selection = args.selection();
    let exporter = ReportExporter::new(&args.report_dir);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.describe || args.head.is_some() {
        let view = session.view(&selection);
        if let Some(n) = args.head {
            write!(handle, "{}", view.preview(n)).context("Failed to write preview")?;
        }
        if args.describe {
            write!(handle, "{}", stat::describe_table(&view)).context("Failed to write summary")?;
        }
        return Ok(());
    }

    if args.interactive {
        let stdin = io::stdin();
        let mut surface = Surface::new(&session, exporter, selection);
        surface
            .run(stdin.lock(), &mut handle)
            .context("Interactive session failed")?;
        return Ok(());
    }

    selection.bindings = session.complete_bindings(&selection);
    let outcome = session.render(&selection).context("Failed to render chart")?;
    if outcome.figure.is_fallback() {
        eprintln!(
            "Note: {} is not available on the {} backend, drawing a {} instead",
            outcome.figure.requested, outcome.figure.backend, outcome.figure.drawn
        );
    }

    let bytes = outcome
        .figure
        .encode(session.options().format)
        .context("Failed to encode figure")?;
    match &args.output {
        Some(path) => fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            handle.write_all(&bytes).context("Failed to write figure to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    if args.report {
        let artifact = exporter
            .export(&outcome.figure, &outcome.insight)
            .context("Failed to export report")?;
        eprintln!("Report written to {}", artifact.path.display());
    }

    Ok(())
}
