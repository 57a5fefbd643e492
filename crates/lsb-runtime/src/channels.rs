//! Collaborator interfaces the engine drives.
//!
//! Every request is fire-and-forget: the call only hands the request over,
//! and the answer arrives later as a [`Completion`](crate::Completion)
//! carrying the same [`RequestTag`]. An `Err` means the request could not be
//! handed over at all.

use bytes::Bytes;
use lsb_types::{ActorId, AssetId, ObjectId, ObjectUpdate, Quat, Vec3};

use crate::error::RuntimeResult;
use crate::request::RequestTag;

/// Read access to the local texture cache.
pub trait TextureCacheChannel {
    fn read_texture(&self, tag: RequestTag, id: AssetId) -> RuntimeResult<()>;
}

/// A new texture asset to store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetUpload {
    pub name: String,
    pub description: String,
    pub data: Bytes,
}

/// Asset store of the destination world.
pub trait AssetUploadChannel {
    fn upload(&self, tag: RequestTag, upload: AssetUpload) -> RuntimeResult<()>;
}

/// Object creation, update and linking in the world.
pub trait ObjectChannel {
    /// Create a placeholder primitive at `position`.
    fn create_object(&self, tag: RequestTag, position: Vec3) -> RuntimeResult<()>;

    fn update_object(&self, tag: RequestTag, update: ObjectUpdate) -> RuntimeResult<()>;

    /// Link `objects` into one linkset; the last object becomes the root.
    fn link_objects(&self, tag: RequestTag, objects: Vec<ObjectId>) -> RuntimeResult<()>;
}

/// Where the operator stands and who they are.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operator {
    pub id: ActorId,
    pub position: Vec3,
    pub rotation: Quat,
}

pub trait OperatorSource {
    fn operator(&self) -> Operator;
}
