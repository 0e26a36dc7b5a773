use std::io::{self, Write};

use colored::Colorize;
use outdiff_diff::ReportObserver;
use outdiff_types::{DiffReport, RecordRef};

use crate::pipeline::{PipelineObserver, PipelineRequest};

/// Prints a run's progress for humans.
///
/// Removals are red, additions green, and each changed file gets a yellow
/// header followed by its coloured diff. Write errors are ignored; the report
/// returned by the pipeline is the authoritative result.
pub struct ConsoleObserver<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportObserver for ConsoleObserver<W> {
    fn removed(&mut self, path: &str) {
        let _ = writeln!(self.out, "{}", format!("File or directory {path} was removed.").red());
    }

    fn added(&mut self, path: &str) {
        let _ = writeln!(self.out, "{}", format!("File or directory {path} was added.").green());
    }

    fn changed(&mut self, path: &str, _diff: &str, colored: &str) {
        let _ = writeln!(self.out, "{}", format!("Diff for {path}").yellow());
        let _ = writeln!(self.out, "{colored}");
    }

    fn finished(&mut self, _report: &DiffReport) {
        let _ = writeln!(self.out, "Done.");
        let _ = self.out.flush();
    }
}

impl<W: Write> PipelineObserver for ConsoleObserver<W> {
    fn started(&mut self, request: &PipelineRequest, records: &[RecordRef]) {
        let fixtures: Vec<String> = records.iter().map(ToString::to_string).collect();
        let _ = writeln!(self.out, "## Diffing plugin output");
        let _ = writeln!(self.out, "# current plugin: {}", request.current_plugin);
        let _ = writeln!(self.out, "# compare plugin: {}", request.compare_plugin);
        let _ = writeln!(self.out, "# ref: {}", request.reference);
        let _ = writeln!(self.out, "# fixtures: {}", fixtures.join(", "));
        let _ = writeln!(self.out);
    }
}
