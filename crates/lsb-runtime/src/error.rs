use crate::request::RequestKind;

/// Errors produced by the session runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// A request of this kind is already outstanding.
    #[error("a {0} request is already outstanding")]
    Busy(RequestKind),

    /// A collaborator channel refused the request.
    #[error("{channel} channel closed")]
    ChannelClosed { channel: &'static str },

    /// Every sender of the event queue is gone.
    #[error("event queue closed")]
    QueueClosed,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
