use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::outcome::Outcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Export,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Export => "export",
            Operation::Import => "import",
        })
    }
}

/// State-machine phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Structure,
    Document,
    Textures,
    Parse,
    Reupload,
    Rez,
    Apply,
    Assemble,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Structure => "structure",
            Phase::Document => "document",
            Phase::Textures => "textures",
            Phase::Parse => "parse",
            Phase::Reupload => "reupload",
            Phase::Rez => "rez",
            Phase::Apply => "apply",
            Phase::Assemble => "assemble",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of session counters sent to the progress sink.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Textures still to read (export) or upload (import).
    pub textures_remaining: usize,
    /// One-based index of the linkset being worked on.
    pub linkset: usize,
    pub linksets: usize,
    /// Primitives rezzed in the current linkset.
    pub rezzed: usize,
    /// Primitives with attributes applied in the current linkset.
    pub built: usize,
    /// Primitives in the current linkset.
    pub prims: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub operation: Operation,
    pub phase: Phase,
    pub counters: Counters,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counters;
        match self.phase {
            Phase::Textures | Phase::Reupload => {
                write!(f, "{} {}: {} textures remaining", self.operation, self.phase, c.textures_remaining)
            }
            Phase::Rez | Phase::Apply | Phase::Assemble => write!(
                f,
                "{} {}: linkset {}/{}, rezzed {}/{}, built {}/{}",
                self.operation, self.phase, c.linkset, c.linksets, c.rezzed, c.prims, c.built, c.prims
            ),
            _ => write!(f, "{} {}", self.operation, self.phase),
        }
    }
}

/// Receives progress and the final outcome of every session.
pub trait ProgressSink {
    fn report(&self, report: &ProgressReport);

    fn finished(&self, operation: Operation, outcome: &Outcome);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _report: &ProgressReport) {}

    fn finished(&self, _operation: Operation, _outcome: &Outcome) {}
}

/// Logs reports and outcomes through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, report: &ProgressReport) {
        info!(operation = %report.operation, phase = %report.phase, "{report}");
    }

    fn finished(&self, operation: Operation, outcome: &Outcome) {
        info!(operation = %operation, "{operation} finished: {outcome}");
    }
}

/// Keeps every report and outcome. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingProgress {
    reports: Arc<Mutex<Vec<ProgressReport>>>,
    outcomes: Arc<Mutex<Vec<(Operation, Outcome)>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ProgressReport> {
        self.reports.lock().expect("lock poisoned").clone()
    }

    /// Phases reported for `operation`, consecutive repeats collapsed.
    pub fn phases(&self, operation: Operation) -> Vec<Phase> {
        let mut phases: Vec<Phase> = Vec::new();
        for report in self.reports().iter().filter(|r| r.operation == operation) {
            if phases.last() != Some(&report.phase) {
                phases.push(report.phase);
            }
        }
        phases
    }

    pub fn outcomes(&self) -> Vec<(Operation, Outcome)> {
        self.outcomes.lock().expect("lock poisoned").clone()
    }

    /// The most recent outcome of `operation`.
    pub fn last_outcome(&self, operation: Operation) -> Option<Outcome> {
        self.outcomes()
            .into_iter()
            .rev()
            .find(|(op, _)| *op == operation)
            .map(|(_, outcome)| outcome)
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, report: &ProgressReport) {
        self.reports
            .lock()
            .expect("lock poisoned")
            .push(report.clone());
    }

    fn finished(&self, operation: Operation, outcome: &Outcome) {
        self.outcomes
            .lock()
            .expect("lock poisoned")
            .push((operation, outcome.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(phase: Phase) -> ProgressReport {
        ProgressReport {
            operation: Operation::Import,
            phase,
            counters: Counters::default(),
        }
    }

    #[test]
    fn recording_collapses_repeated_phases() {
        let progress = RecordingProgress::new();
        let shared = progress.clone();
        for phase in [Phase::Parse, Phase::Rez, Phase::Rez, Phase::Apply, Phase::Rez] {
            progress.report(&report(phase));
        }
        progress.finished(Operation::Import, &Outcome::Success);
        assert_eq!(
            shared.phases(Operation::Import),
            vec![Phase::Parse, Phase::Rez, Phase::Apply, Phase::Rez]
        );
        assert_eq!(shared.last_outcome(Operation::Import), Some(Outcome::Success));
        assert_eq!(shared.last_outcome(Operation::Export), None);
    }

    #[test]
    fn report_display() {
        let mut r = report(Phase::Apply);
        r.counters = Counters {
            linkset: 1,
            linksets: 2,
            rezzed: 3,
            built: 1,
            prims: 3,
            ..Counters::default()
        };
        assert_eq!(r.to_string(), "import apply: linkset 1/2, rezzed 3/3, built 1/3");
    }
}
