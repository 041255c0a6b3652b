use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::chart::{Bindings, Role};
use crate::data::ColumnKind;
use crate::parser::{self, SurfaceCommand};
use crate::report::ReportExporter;
use crate::session::{Outcome, Selection, Session};
use crate::{stat, OutputFormat};

const PROMPT: &str = "vizreport> ";
const ROLES: [Role; 5] = [Role::X, Role::Y, Role::Size, Role::Category, Role::Value];

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front end over a session. Every failure is printed and the
/// loop keeps going.
pub struct Surface<'a> {
    session: &'a Session,
    exporter: ReportExporter,
    selection: Selection,
    current: Option<Outcome>,
}

impl<'a> Surface<'a> {
    pub fn new(session: &'a Session, exporter: ReportExporter, selection: Selection) -> Self {
        Surface { session, exporter, selection, current: None }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Read commands until `quit()` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        for line in input.lines() {
            let line = line?;
            if self.execute_line(&line, out)? == Flow::Quit {
                return Ok(());
            }
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let commands = match parser::parse_line(line) {
            Ok(commands) => commands,
            Err(message) => {
                writeln!(out, "error: {message}")?;
                return Ok(Flow::Continue);
            }
        };

        for command in commands {
            debug!(?command, "executing");
            if self.execute(command, out)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn execute<W: Write>(&mut self, command: SurfaceCommand, out: &mut W) -> io::Result<Flow> {
        match command {
            SurfaceCommand::Filter(criterion) => {
                self.selection.filter = criterion;
                self.refresh(out)?;
            }
            SurfaceCommand::Plot { kind, bindings } => {
                self.selection.kind = kind;
                merge(&mut self.selection.bindings, &bindings);
                self.selection.bindings = self.session.complete_bindings(&self.selection);
                self.refresh(out)?;
            }
            SurfaceCommand::Bind(bindings) => {
                merge(&mut self.selection.bindings, &bindings);
                self.refresh(out)?;
            }
            SurfaceCommand::Backend(backend) => {
                self.selection.backend = backend;
                self.refresh(out)?;
            }
            SurfaceCommand::Head(n) => {
                write!(out, "{}", self.session.view(&self.selection).preview(n))?;
            }
            SurfaceCommand::Describe => {
                write!(out, "{}", stat::describe_table(&self.session.view(&self.selection)))?;
            }
            SurfaceCommand::Columns => {
                for column in self.session.dataset().columns() {
                    let kind = match column.kind {
                        ColumnKind::Numeric => "numeric",
                        ColumnKind::Text => "text",
                    };
                    writeln!(out, "{} ({})", column.name, kind)?;
                }
            }
            SurfaceCommand::Insight => match &self.current {
                Some(outcome) if !outcome.insight.is_empty() => {
                    for line in outcome.insight.lines() {
                        writeln!(out, "{line}")?;
                    }
                }
                Some(_) => writeln!(out, "no insight for this chart")?,
                None => writeln!(out, "no chart on display")?,
            },
            SurfaceCommand::Save(path) => self.save(Path::new(&path), out)?,
            SurfaceCommand::Export => self.export(out)?,
            SurfaceCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Re-run the pipeline for the current selection.
    fn refresh<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match self.session.render(&self.selection) {
            Ok(outcome) => {
                writeln!(out, "{}", outcome.status())?;
                if !outcome.insight.is_empty() {
                    writeln!(out, "{}", outcome.insight)?;
                }
                self.current = Some(outcome);
            }
            Err(e) => {
                writeln!(out, "error: {e}")?;
                self.current = None;
            }
        }
        Ok(())
    }

    fn save<W: Write>(&self, path: &Path, out: &mut W) -> io::Result<()> {
        let Some(outcome) = &self.current else {
            return writeln!(out, "no chart on display");
        };
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse::<OutputFormat>().ok())
            .unwrap_or_default();

        let written = outcome
            .figure
            .encode(format)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()));
        match written {
            Ok(()) => writeln!(out, "saved {} to {}", format, path.display()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "save failed");
                writeln!(out, "error: {e}")
            }
        }
    }

    fn export<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(outcome) = &self.current else {
            return writeln!(out, "no chart on display");
        };
        match self.exporter.export(&outcome.figure, &outcome.insight) {
            Ok(artifact) => writeln!(out, "report written to {}", artifact.path.display()),
            Err(e) => writeln!(out, "error: {e}"),
        }
    }
}

/// Overwrite the roles `update` sets, keep the rest.
fn merge(bindings: &mut Bindings, update: &Bindings) {
    for role in ROLES {
        if let Some(column) = update.get(role) {
            bindings.set(role, Some(column.to_string()));
        }
    }
}
