use lsb_runtime::{Dispatcher, ObjectChannel, RequestKind, RuntimeResult};
use lsb_types::{ObjectId, ObjectUpdate, Quat};
use tracing::debug;

/// Where the assembler is within one linkset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssemblyStep {
    #[default]
    Idle,
    /// Waiting for the link acknowledgment.
    Linking,
    /// Waiting for the root rotation acknowledgment.
    Rotating { root: ObjectId },
    Done,
}

/// Links the applied placeholders of one linkset and restores the root's
/// rotation, which linking resets.
#[derive(Debug, Default)]
pub struct LinksetAssembler {
    step: AssemblyStep,
}

impl LinksetAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AssemblyStep {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == AssemblyStep::Done
    }

    /// Link `objects` (creation order, root first). The link request lists
    /// them reversed so the root comes last. A single object needs no link.
    pub fn start(
        &mut self,
        dispatcher: &mut Dispatcher,
        channel: &dyn ObjectChannel,
        objects: &[ObjectId],
    ) -> RuntimeResult<()> {
        if objects.len() < 2 {
            debug!("single primitive, nothing to link");
            self.step = AssemblyStep::Done;
            return Ok(());
        }
        let order: Vec<ObjectId> = objects.iter().rev().copied().collect();
        let tag = dispatcher.issue(RequestKind::ObjectLink)?;
        if let Err(e) = channel.link_objects(tag, order) {
            dispatcher.cancel(RequestKind::ObjectLink);
            return Err(e);
        }
        debug!(objects = objects.len(), "link requested");
        self.step = AssemblyStep::Linking;
        Ok(())
    }

    /// The objects were linked under `root`: send its absolute rotation.
    pub fn linked(
        &mut self,
        dispatcher: &mut Dispatcher,
        channel: &dyn ObjectChannel,
        root: ObjectId,
        rotation: Quat,
    ) -> RuntimeResult<()> {
        let tag = dispatcher.issue_for(RequestKind::ObjectUpdate, Some(root))?;
        if let Err(e) = channel.update_object(tag, ObjectUpdate::Rotation { object: root, rotation })
        {
            dispatcher.cancel(RequestKind::ObjectUpdate);
            return Err(e);
        }
        self.step = AssemblyStep::Rotating { root };
        Ok(())
    }

    /// Record an update acknowledgment. Returns whether it finished the
    /// linkset.
    pub fn rotated(&mut self, object: ObjectId) -> bool {
        match self.step {
            AssemblyStep::Rotating { root } if root == object => {
                self.step = AssemblyStep::Done;
                true
            }
            _ => false,
        }
    }
}
