use std::path::Path;

use lsb_export::{SelectedLinkset, WorldPrim};
use lsb_perms::PermissionSet;
use lsb_types::{ActorId, AssetId, ImageCodec, LocalId, PrimitiveRecord, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Where the operator stands when a scene is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneOperator {
    pub id: ActorId,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for SceneOperator {
    fn default() -> Self {
        Self {
            id: ActorId::from_u128(1),
            position: Vec3::new(128.0, 128.0, 25.0),
            rotation: Quat::IDENTITY,
        }
    }
}

/// A primitive placed in the scene. The record's transform is absolute.
/// Without explicit permissions the operator created and owns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenePrim {
    pub local_id: LocalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,
    #[serde(flatten)]
    pub record: PrimitiveRecord,
}

/// A selected linkset, root first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneLinkset {
    pub root: ScenePrim,
    #[serde(default)]
    pub children: Vec<ScenePrim>,
}

/// A texture known to the world: its inventory permissions and, when
/// `data` is present, the cached image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneTexture {
    pub id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,
    #[serde(default = "j2c")]
    pub codec: ImageCodec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

fn j2c() -> ImageCodec {
    ImageCodec::J2c
}

/// JSON description of a world: operator, selection and textures.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub operator: SceneOperator,
    pub linksets: Vec<SceneLinkset>,
    pub textures: Vec<SceneTexture>,
}

impl Scene {
    pub fn from_json(text: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The scene's linksets as the world reports a selection.
    pub fn selection(&self) -> Vec<SelectedLinkset> {
        let owner = self.operator.id;
        self.linksets
            .iter()
            .map(|ls| SelectedLinkset {
                root: world_prim(&ls.root, owner),
                children: ls.children.iter().map(|c| world_prim(c, owner)).collect(),
            })
            .collect()
    }
}

fn world_prim(prim: &ScenePrim, owner: ActorId) -> WorldPrim {
    let mut record = prim.record.clone();
    record.local_id = prim.local_id;
    WorldPrim {
        permissions: prim
            .permissions
            .clone()
            .unwrap_or_else(|| PermissionSet::full(owner, owner)),
        position: record.position,
        rotation: record.rotation,
        record,
    }
}
