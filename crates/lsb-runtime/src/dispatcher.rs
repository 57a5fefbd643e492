use lsb_types::ObjectId;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};
use crate::generation::Generation;
use crate::request::{RequestKind, RequestTag};

/// How an incoming completion relates to the session's outstanding requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Answers the outstanding request of its kind, which is now cleared.
    Matched,
    /// Issued by another session generation.
    Stale,
    /// Nothing of this kind is outstanding, or it concerns another object.
    Unsolicited,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    subject: Option<ObjectId>,
}

/// Per-session request bookkeeping: one slot per [`RequestKind`].
///
/// Issuing a second request of a kind before the first resolves is refused,
/// which keeps every pipeline stage to a single outstanding operation.
#[derive(Debug)]
pub struct Dispatcher {
    generation: Generation,
    pending: [Option<Pending>; RequestKind::ALL.len()],
}

impl Dispatcher {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            pending: [None; RequestKind::ALL.len()],
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Reserve the slot for `kind` and return the tag to send with it.
    pub fn issue(&mut self, kind: RequestKind) -> RuntimeResult<RequestTag> {
        self.issue_for(kind, None)
    }

    /// Like [`Dispatcher::issue`], but only a completion naming `subject`
    /// will resolve the request.
    pub fn issue_for(
        &mut self,
        kind: RequestKind,
        subject: Option<ObjectId>,
    ) -> RuntimeResult<RequestTag> {
        let slot = &mut self.pending[kind.index()];
        if slot.is_some() {
            return Err(RuntimeError::Busy(kind));
        }
        *slot = Some(Pending { subject });
        let tag = RequestTag::new(self.generation, kind);
        debug!(tag = %tag, subject = ?subject, "request issued");
        Ok(tag)
    }

    /// Match a completion against the outstanding request of its kind.
    pub fn resolve(&mut self, tag: RequestTag, subject: Option<ObjectId>) -> Resolution {
        if tag.generation != self.generation {
            debug!(tag = %tag, session = %self.generation, "stale completion discarded");
            return Resolution::Stale;
        }
        let slot = &mut self.pending[tag.kind.index()];
        let Some(pending) = *slot else {
            debug!(tag = %tag, "unsolicited completion ignored");
            return Resolution::Unsolicited;
        };
        if let (Some(expected), Some(actual)) = (pending.subject, subject) {
            if expected != actual {
                debug!(tag = %tag, expected = %expected, actual = %actual,
                    "completion for another object ignored");
                return Resolution::Unsolicited;
            }
        }
        *slot = None;
        Resolution::Matched
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending[kind.index()].is_some()
    }

    /// Number of outstanding requests across all kinds.
    pub fn outstanding(&self) -> usize {
        self.pending.iter().filter(|p| p.is_some()).count()
    }

    /// Release the slot of `kind` without a completion, e.g. after the
    /// channel refused the request.
    pub fn cancel(&mut self, kind: RequestKind) {
        self.pending[kind.index()] = None;
    }

    /// Drop every outstanding request.
    pub fn clear(&mut self) {
        self.pending = [None; RequestKind::ALL.len()];
    }
}
