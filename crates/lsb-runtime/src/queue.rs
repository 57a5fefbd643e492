use tokio::sync::mpsc;
use tracing::debug;

use crate::completion::Completion;
use crate::error::{RuntimeError, RuntimeResult};

/// Cloneable handle collaborators use to post completions.
#[derive(Clone, Debug)]
pub struct CompletionSender {
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionSender {
    pub fn send(&self, completion: Completion) -> RuntimeResult<()> {
        debug!(tag = %completion.tag(), "completion posted");
        self.tx.send(completion).map_err(|_| RuntimeError::QueueClosed)
    }
}

/// The client's single event queue.
///
/// Completions are drained on one loop, in arrival order. The queue keeps a
/// sender of its own, so receiving never observes a closed channel.
#[derive(Debug)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> CompletionSender {
        CompletionSender {
            tx: self.tx.clone(),
        }
    }

    /// Next queued completion, without waiting.
    pub fn try_next(&mut self) -> Option<Completion> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next completion.
    pub async fn next(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use lsb_types::ObjectId;

    use super::*;
    use crate::generation::Generation;
    use crate::request::{RequestKind, RequestTag};

    fn created(n: u8) -> Completion {
        Completion::ObjectCreated {
            tag: RequestTag::new(Generation::new(1), RequestKind::ObjectCreate),
            object: ObjectId::from_bytes([n; 16]),
        }
    }

    #[test]
    fn drains_in_arrival_order() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        sender.send(created(1)).unwrap();
        sender.send(created(2)).unwrap();
        assert_eq!(queue.try_next(), Some(created(1)));
        assert_eq!(queue.try_next(), Some(created(2)));
        assert_eq!(queue.try_next(), None);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn next_waits_for_a_posted_completion() {
        let mut queue = EventQueue::new();
        let sender = queue.sender();
        tokio::spawn(async move {
            sender.send(created(3)).unwrap();
        });
        assert_eq!(queue.next().await, Some(created(3)));
    }

    #[test]
    fn sending_after_drop_fails() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        drop(queue);
        assert_eq!(sender.send(created(1)), Err(RuntimeError::QueueClosed));
    }
}
