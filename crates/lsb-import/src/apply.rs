use lsb_assets::AssetIdRemap;
use lsb_runtime::{Dispatcher, ObjectChannel, RequestKind, RuntimeResult};
use lsb_types::{LinksetDescriptor, ObjectId, ObjectUpdate, PrimAttributes, PrimitiveRecord};
use tracing::debug;

use crate::placement::Placement;

/// Attributes for the placeholder of `record`, placed at `placement`, with
/// every texture id rewritten through `remap`.
pub fn attributes_for(
    record: &PrimitiveRecord,
    placement: Placement,
    remap: &AssetIdRemap,
) -> PrimAttributes {
    let mut record = record.clone();
    record.map_assets(|id| remap.resolve(id));
    PrimAttributes::from_record(&record, placement.position, placement.rotation)
}

/// Pushes recorded attributes onto the placeholders of one linkset, one
/// object at a time, in descriptor order.
#[derive(Debug, Default)]
pub struct AttributeApplier {
    next: usize,
    awaiting: Option<ObjectId>,
}

impl AttributeApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the attributes of the next record to its placeholder.
    ///
    /// `objects` holds the placeholders in creation order, which is
    /// descriptor order. Returns `false` once every record was sent.
    pub fn apply_next(
        &mut self,
        dispatcher: &mut Dispatcher,
        channel: &dyn ObjectChannel,
        linkset: &LinksetDescriptor,
        objects: &[ObjectId],
        root: Placement,
        remap: &AssetIdRemap,
    ) -> RuntimeResult<bool> {
        let (Some(record), Some(&object)) = (linkset.prims.get(self.next), objects.get(self.next))
        else {
            return Ok(false);
        };
        let placement = if record.is_root() {
            root
        } else {
            root.child(record)
        };
        let attributes = attributes_for(record, placement, remap);

        let tag = dispatcher.issue_for(RequestKind::ObjectUpdate, Some(object))?;
        let update = ObjectUpdate::Attributes {
            object,
            attributes: Box::new(attributes),
        };
        if let Err(e) = channel.update_object(tag, update) {
            dispatcher.cancel(RequestKind::ObjectUpdate);
            return Err(e);
        }
        debug!(object = %object, prim = %record.local_id, "attributes sent");
        self.awaiting = Some(object);
        self.next += 1;
        Ok(true)
    }

    /// Record the acknowledgment for `object`. Returns whether it was the
    /// one awaited.
    pub fn acknowledge(&mut self, object: ObjectId) -> bool {
        if self.awaiting == Some(object) {
            self.awaiting = None;
            true
        } else {
            false
        }
    }

    /// Records whose update was acknowledged.
    pub fn applied(&self) -> usize {
        self.next - usize::from(self.awaiting.is_some())
    }
}
