//! Foundation types for the linkset backup engine.
//!
//! Every other `lsb-*` crate depends on `lsb-types`. The crate holds plain
//! data only: identifiers, transforms, primitive records and the linkset
//! descriptor that the exporter produces and the importer consumes.
//!
//! # Key Types
//!
//! - [`AssetId`] -- world asset identifier (textures, sculpt maps)
//! - [`ObjectId`] -- server-assigned identifier of a rezzed object
//! - [`LocalId`] -- ephemeral, document-scoped primitive identifier
//! - [`PrimitiveRecord`] -- one serialized primitive
//! - [`LinksetDescriptor`] -- root-first list of records forming one linkset
//! - [`ObjectUpdate`] -- attribute payload sent to a placeholder object

pub mod error;
pub mod identity;
pub mod linkset;
pub mod math;
pub mod prim;
pub mod texture;
pub mod update;

pub use error::TypeError;
pub use identity::{ActorId, AssetId, LocalId, ObjectId};
pub use linkset::LinksetDescriptor;
pub use math::{Color4, Quat, Vec3};
pub use prim::{
    FaceMaterial, FlexibleParams, LightImageParams, LightParams, PathParams, PrimFlags,
    PrimitiveRecord, ProfileParams, SculptParams, SculptType, TextureEntry, VolumeParams,
};
pub use texture::{CacheReadError, CachedTexture, ImageCodec, TextureReference};
pub use update::{ObjectUpdate, PrimAttributes};
