use lsb_types::{LinksetDescriptor, PrimitiveRecord, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Where imported content lands relative to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementOptions {
    /// Offset, in the operator's frame, at which placeholders are rezzed.
    pub rez_offset: Vec3,
    /// Offset, in the operator's frame, of the first linkset's root.
    pub placement_offset: Vec3,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            rez_offset: Vec3::new(0.0, 2.0, 0.0),
            placement_offset: Vec3::new(2.0, 0.0, 0.0),
        }
    }
}

/// Absolute transform of a primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Placement {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// `offset` taken in this frame: `position + rotation * offset`.
    pub fn offset(&self, offset: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(offset)
    }

    /// Transform of a child whose record is relative to this root.
    pub fn child(&self, record: &PrimitiveRecord) -> Placement {
        Placement {
            position: self.offset(record.position),
            rotation: self.rotation * record.rotation,
        }
    }
}

/// Placement of the root of `linkset`: in front of the operator, keeping
/// the linkset's offset from the document's first root.
pub fn root_placement(
    operator: Placement,
    options: &PlacementOptions,
    origin: Vec3,
    linkset: &LinksetDescriptor,
    root: &PrimitiveRecord,
) -> Placement {
    let anchor = operator.offset(options.placement_offset);
    Placement::new(anchor + (linkset.root_position - origin), root.rotation)
}
