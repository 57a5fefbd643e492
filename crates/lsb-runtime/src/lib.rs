//! Session runtime for the linkset backup engine.
//!
//! Exports and imports are cooperative state machines. They never block:
//! each one hands a tagged request to a collaborator channel and suspends
//! until the matching [`Completion`] comes back through the client's
//! [`EventQueue`].
//!
//! # Key Types
//!
//! - [`GenerationCounter`] -- hands out session generations
//! - [`Dispatcher`] -- one outstanding request per [`RequestKind`], stale and
//!   unsolicited completions filtered out
//! - [`Completion`] / [`EventQueue`] -- typed answers on a single queue
//! - [`TextureCacheChannel`], [`AssetUploadChannel`], [`ObjectChannel`] --
//!   collaborator interfaces
//! - [`ProgressSink`] / [`Outcome`] -- what the user sees
//!
//! No request ever times out: a collaborator that never answers leaves its
//! session waiting.

pub mod channels;
pub mod completion;
pub mod dispatcher;
pub mod error;
pub mod generation;
pub mod outcome;
pub mod progress;
pub mod queue;
pub mod request;

pub use channels::{
    AssetUpload, AssetUploadChannel, ObjectChannel, Operator, OperatorSource, TextureCacheChannel,
};
pub use completion::Completion;
pub use dispatcher::{Dispatcher, Resolution};
pub use error::{RuntimeError, RuntimeResult};
pub use generation::{Generation, GenerationCounter};
pub use outcome::{Outcome, PartialFailure, PartialFailureKind, PartialFailures};
pub use progress::{
    Counters, NullProgress, Operation, Phase, ProgressReport, ProgressSink, RecordingProgress,
    TracingProgress,
};
pub use queue::{CompletionSender, EventQueue};
pub use request::{RequestKind, RequestTag};
