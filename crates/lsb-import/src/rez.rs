use lsb_runtime::{Dispatcher, ObjectChannel, RequestKind, RuntimeResult};
use lsb_types::{ObjectId, Vec3};
use tracing::debug;

/// Creates the placeholder objects of one linkset, one at a time.
///
/// The world does not say which request a new object answers, so objects are
/// matched to records by arrival order: the n-th confirmation belongs to the
/// n-th record of the descriptor.
#[derive(Debug)]
pub struct RezSequencer {
    position: Vec3,
    total: usize,
    created: Vec<ObjectId>,
    waiting: bool,
}

impl RezSequencer {
    /// A sequencer that will create `total` objects at `position`.
    pub fn new(position: Vec3, total: usize) -> Self {
        Self {
            position,
            total,
            created: Vec::with_capacity(total),
            waiting: false,
        }
    }

    /// Request the next placeholder. Returns `false` once every object
    /// exists.
    pub fn request_next(
        &mut self,
        dispatcher: &mut Dispatcher,
        channel: &dyn ObjectChannel,
    ) -> RuntimeResult<bool> {
        if self.is_complete() {
            return Ok(false);
        }
        let tag = dispatcher.issue(RequestKind::ObjectCreate)?;
        if let Err(e) = channel.create_object(tag, self.position) {
            dispatcher.cancel(RequestKind::ObjectCreate);
            return Err(e);
        }
        self.waiting = true;
        debug!(index = self.created.len(), total = self.total, "placeholder requested");
        Ok(true)
    }

    /// Record the object answering the outstanding creation.
    pub fn confirm(&mut self, object: ObjectId) {
        if !self.waiting {
            debug!(object = %object, "creation with nothing requested ignored");
            return;
        }
        self.waiting = false;
        self.created.push(object);
    }

    pub fn rezzed(&self) -> usize {
        self.created.len()
    }

    pub fn is_complete(&self) -> bool {
        self.created.len() >= self.total
    }

    /// Created objects, in creation order.
    pub fn objects(&self) -> &[ObjectId] {
        &self.created
    }
}
