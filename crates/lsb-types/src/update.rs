use serde::{Deserialize, Serialize};

use crate::identity::ObjectId;
use crate::math::{Quat, Vec3};
use crate::prim::{
    FlexibleParams, LightImageParams, LightParams, PrimFlags, PrimitiveRecord, SculptParams,
    TextureEntry, VolumeParams,
};

/// Every attribute the applier pushes onto a placeholder object.
///
/// Unlike [`PrimitiveRecord`], the transform here is absolute: placement and
/// root composition have already been resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimAttributes {
    pub name: String,
    pub description: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub volume: VolumeParams,
    pub flags: PrimFlags,
    pub material: u8,
    pub click_action: Option<u8>,
    pub light: Option<LightParams>,
    pub light_image: Option<LightImageParams>,
    pub flexible: Option<FlexibleParams>,
    pub sculpt: Option<SculptParams>,
    pub faces: Vec<TextureEntry>,
}

impl PrimAttributes {
    /// Take every non-transform attribute from `record`, with the given
    /// absolute transform.
    pub fn from_record(record: &PrimitiveRecord, position: Vec3, rotation: Quat) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            position,
            rotation,
            scale: record.scale,
            volume: record.volume.clone(),
            flags: record.flags,
            material: record.material,
            click_action: record.click_action,
            light: record.light.clone(),
            light_image: record.light_image.clone(),
            flexible: record.flexible.clone(),
            sculpt: record.sculpt.clone(),
            faces: record.faces.clone(),
        }
    }
}

/// Update request sent over the object channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectUpdate {
    /// Full attribute set for a freshly rezzed placeholder.
    Attributes {
        object: ObjectId,
        attributes: Box<PrimAttributes>,
    },
    /// Absolute rotation only, used after linking.
    Rotation { object: ObjectId, rotation: Quat },
}

impl ObjectUpdate {
    /// The object this update targets.
    pub fn object(&self) -> ObjectId {
        match self {
            ObjectUpdate::Attributes { object, .. } | ObjectUpdate::Rotation { object, .. } => {
                *object
            }
        }
    }
}
