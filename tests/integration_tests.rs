use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use vizreport::chart::{Backend, Bindings, ChartKind, Role};
use vizreport::dispatch::FigureBody;
use vizreport::{Dataset, FilterCriterion, RenderOptions, ReportExporter, Selection, Session};

/// Run the binary with `args`, feeding `stdin` if given
fn run_vizreport(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_vizreport"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn vizreport");

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle.write_all(input.as_bytes()).expect("Failed to write to stdin");
        }
    }

    child.wait_with_output().expect("Failed to wait for vizreport")
}

fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn small() -> RenderOptions {
    RenderOptions { width: 400, height: 300, ..Default::default() }
}

fn pdfs_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".pdf"))
        .collect()
}

#[test]
fn test_end_to_end_filtered_bar_chart() {
    let output = run_vizreport(
        &[
            "test/sales.csv",
            "--filter-column",
            "region",
            "--filter",
            "east",
            "--kind",
            "bar",
            "-x",
            "region",
            "-y",
            "sales",
        ],
        None,
    );
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    assert!(is_valid_png(&output.stdout), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_csv_from_stdin() {
    let csv = fs::read_to_string("test/scatter.csv").expect("Failed to read test CSV");
    let output = run_vizreport(&["-", "--kind", "scatter", "-x", "height", "-y", "weight"], Some(&csv));
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    assert!(is_valid_png(&output.stdout));
}

#[test]
fn test_end_to_end_default_bindings() {
    // No -x/-y: the first offered column is used for each role
    let output = run_vizreport(&["test/timeseries.csv", "--kind", "line", "--backend", "static"], None);
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    assert!(is_valid_png(&output.stdout));
}

#[test]
fn test_end_to_end_static_pie_falls_back() {
    let output = run_vizreport(
        &[
            "test/sales.csv",
            "--kind",
            "pie",
            "--backend",
            "static",
            "--category",
            "region",
            "--value",
            "sales",
        ],
        None,
    );
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    assert!(is_valid_png(&output.stdout));
    assert!(stderr(&output).contains("drawing a Line Plot instead"));
}

#[test]
fn test_end_to_end_svg_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("chart.svg");
    let output = run_vizreport(
        &[
            "test/sales.csv",
            "--kind",
            "treemap",
            "--category",
            "region",
            "--value",
            "sales",
            "--format",
            "svg",
            "--output",
            out.to_str().unwrap(),
        ],
        None,
    );
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    assert!(output.stdout.is_empty());
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Northeast"));
}

#[test]
fn test_end_to_end_json_scene() {
    let output = run_vizreport(
        &["test/sales.csv", "--kind", "heatmap", "--format", "json", "--options", r#"{"width": 500}"#],
        None,
    );
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    let scene: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(scene["width"], 500);
    assert_eq!(scene["height"], 600);
    assert_eq!(scene["legend"].as_array().unwrap().len(), 3);
}

#[test]
fn test_end_to_end_static_json_is_rejected() {
    let output = run_vizreport(
        &["test/sales.csv", "--backend", "static", "--format", "json", "-x", "cost", "-y", "sales"],
        None,
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not available for static figures"));
}

#[test]
fn test_end_to_end_heatmap_needs_numeric_columns() {
    let output = run_vizreport(&["test/text_only.csv", "--kind", "heatmap"], None);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("at least 2 numeric columns"), "{}", stderr(&output));
}

#[test]
fn test_end_to_end_missing_file() {
    let output = run_vizreport(&["test/does_not_exist.csv"], None);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load"));
}

#[test]
fn test_end_to_end_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_vizreport(
        &[
            "test/sales.csv",
            "--kind",
            "box",
            "-x",
            "region",
            "-y",
            "cost",
            "--output",
            dir.path().join("box.png").to_str().unwrap(),
            "--report",
            "--report-dir",
            dir.path().to_str().unwrap(),
        ],
        None,
    );
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    let pdfs = pdfs_in(dir.path());
    assert_eq!(pdfs.len(), 1);
    assert!(pdfs[0].starts_with("visualization_report_"));
    // visualization_report_YYYYMMDD_HHMMSS.pdf
    assert_eq!(pdfs[0].len(), "visualization_report_".len() + 15 + 4);
    let bytes = fs::read(dir.path().join(&pdfs[0])).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_end_to_end_describe_and_head() {
    let output = run_vizreport(&["test/sales.csv", "--describe", "--head", "2"], None);
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("region"));
    assert!(text.contains("East"));
    assert!(!text.contains("Northeast"));
    assert!(text.contains("mean"));
    assert!(text.contains("75%"));
}

#[test]
fn test_end_to_end_interactive() {
    let script = "columns()\nplot(kind: bar, x: region, y: sales)\nfilter(column: region, value: \"south\")\ninsight()\nquit()\n";
    let output = run_vizreport(&["test/sales.csv", "--interactive"], Some(script));
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("sales (numeric)"));
    assert!(text.contains("Bar Plot (Interactive) over 6 rows"));
    assert!(text.contains("over 2 rows"));
    assert!(text.contains("Avg sales: 65.00"));
}

#[test]
fn test_every_kind_renders_on_both_backends() {
    let session = Session::new(Dataset::load_path("test/sales.csv").unwrap(), small());
    for kind in ChartKind::ALL {
        for backend in [Backend::Interactive, Backend::Static] {
            let mut selection = Selection::new(kind, backend, Bindings::default());
            selection.bindings = session.complete_bindings(&selection);
            let outcome = session
                .render(&selection)
                .unwrap_or_else(|e| panic!("{kind} on {backend}: {e}"));
            match backend {
                Backend::Interactive => assert!(matches!(outcome.figure.body, FigureBody::Scene(_))),
                Backend::Static => assert!(matches!(outcome.figure.body, FigureBody::Raster(_))),
            }
            assert!(is_valid_png(&outcome.figure.to_png().unwrap()));
        }
    }
}

#[test]
fn test_filter_with_no_matches_renders_no_data() {
    let session = Session::new(Dataset::load_path("test/sales.csv").unwrap(), small());
    let bindings = Bindings::default().with(Role::X, "region").with(Role::Y, "sales");
    let selection = Selection::new(ChartKind::Line, Backend::Interactive, bindings)
        .with_filter(FilterCriterion::new("region", "atlantis"));
    let outcome = session.render(&selection).unwrap();
    assert_eq!(outcome.rows, 0);
    let scene = outcome.figure.scene().unwrap();
    assert!(scene.texts().any(|t| t == "No data"));
    assert_eq!(outcome.insight.lines(), vec!["sales: no values in view"]);
}

#[test]
fn test_session_export_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new(Dataset::load_path("test/scatter.csv").unwrap(), small());
    let bindings = Bindings::default().with(Role::X, "height").with(Role::Y, "weight").with(Role::Size, "age");
    let selection = Selection::new(ChartKind::Bubble, Backend::Static, bindings);
    let artifact = session.export(&selection, &ReportExporter::new(dir.path())).unwrap();
    assert!(artifact.path.exists());
    assert_eq!(pdfs_in(dir.path()).len(), 1);
}

#[test]
fn test_end_to_end_json_records() {
    let output = run_vizreport(&["test/sales.json", "--head", "5"], None);
    assert!(output.status.success(), "Failed: {}", stderr(&output));
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("Northeast"));
    assert!(text.contains("NaN"));
}
