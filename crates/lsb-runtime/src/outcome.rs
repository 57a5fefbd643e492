use std::collections::HashSet;
use std::fmt;

use lsb_types::AssetId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Non-fatal problem with one asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFailureKind {
    /// The actor may not export the texture; the fallback was written.
    BadPermission,
    /// The texture cache does not hold the image.
    Missing,
    /// The cached image is not a JPEG-2000 codestream.
    BadEncoding,
    /// The cache returned an empty image.
    NullTexture,
    /// The companion file could not be written.
    WriteFailed,
    /// The companion file of an imported texture is absent or unreadable.
    CompanionMissing,
    /// The destination asset store rejected the upload.
    UploadFailed,
}

impl fmt::Display for PartialFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PartialFailureKind::BadPermission => "no export permission",
            PartialFailureKind::Missing => "missing from cache",
            PartialFailureKind::BadEncoding => "bad encoding",
            PartialFailureKind::NullTexture => "empty image",
            PartialFailureKind::WriteFailed => "write failed",
            PartialFailureKind::CompanionMissing => "companion image missing",
            PartialFailureKind::UploadFailed => "upload failed",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialFailure {
    pub kind: PartialFailureKind,
    pub asset: AssetId,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.asset, self.kind)
    }
}

/// Partial failures of one session, deduplicated per (kind, asset) and kept
/// in the order first seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialFailures {
    seen: HashSet<PartialFailure>,
    entries: Vec<PartialFailure>,
}

impl PartialFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; returns `false` if it was already recorded.
    pub fn record(&mut self, kind: PartialFailureKind, asset: AssetId) -> bool {
        let failure = PartialFailure { kind, asset };
        if !self.seen.insert(failure) {
            return false;
        }
        debug!(asset = %asset, reason = %kind, "partial failure recorded");
        self.entries.push(failure);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartialFailure> {
        self.entries.iter()
    }

    pub fn count(&self, kind: PartialFailureKind) -> usize {
        self.entries.iter().filter(|f| f.kind == kind).count()
    }

    /// One line per failure kind, e.g. `2 x missing from cache`.
    pub fn summary(&self) -> Vec<String> {
        let mut kinds: Vec<PartialFailureKind> = Vec::new();
        for failure in &self.entries {
            if !kinds.contains(&failure.kind) {
                kinds.push(failure.kind);
            }
        }
        kinds
            .into_iter()
            .map(|kind| format!("{} x {}", self.count(kind), kind))
            .collect()
    }
}

/// Final result of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Completed, with non-fatal failures.
    Partial(PartialFailures),
    /// Aborted; the reason is meant for display.
    Failed(String),
}

impl Outcome {
    /// `Success` when `failures` is empty, `Partial` otherwise.
    pub fn from_failures(failures: PartialFailures) -> Self {
        if failures.is_empty() {
            Outcome::Success
        } else {
            Outcome::Partial(failures)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// `true` unless the session failed.
    pub fn is_completed(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    pub fn failures(&self) -> Option<&PartialFailures> {
        match self {
            Outcome::Partial(failures) => Some(failures),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Partial(failures) => {
                write!(f, "success with {} partial failures", failures.len())
            }
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
