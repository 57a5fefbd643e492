use std::cell::Cell;

use colored::Colorize;
use lsb_runtime::{Operation, Outcome, Phase, ProgressReport, ProgressSink};

/// Prints one line per phase change.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    last: Cell<Option<(Operation, Phase)>>,
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, report: &ProgressReport) {
        let key = (report.operation, report.phase);
        if self.last.get() == Some(key) {
            return;
        }
        self.last.set(Some(key));
        println!("  {} {}", "·".dimmed(), report.to_string().dimmed());
    }

    fn finished(&self, _operation: Operation, _outcome: &Outcome) {
        self.last.set(None);
    }
}
