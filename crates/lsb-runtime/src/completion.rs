use lsb_types::{AssetId, CacheReadError, CachedTexture, ObjectId};

use crate::request::{RequestKind, RequestTag};

/// Asynchronous answer from a collaborator, delivered on the client's event
/// queue.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    /// The texture cache finished reading `asset`.
    TextureRead {
        tag: RequestTag,
        asset: AssetId,
        result: Result<CachedTexture, CacheReadError>,
    },
    /// The asset store accepted (new id) or rejected an upload.
    AssetStored {
        tag: RequestTag,
        result: Result<AssetId, String>,
    },
    /// A requested object now exists in the world.
    ObjectCreated { tag: RequestTag, object: ObjectId },
    /// The world acknowledged an update of `object`.
    ObjectUpdated { tag: RequestTag, object: ObjectId },
    /// Objects were linked under `root`.
    ObjectsLinked { tag: RequestTag, root: ObjectId },
}

impl Completion {
    pub fn tag(&self) -> RequestTag {
        match self {
            Completion::TextureRead { tag, .. }
            | Completion::AssetStored { tag, .. }
            | Completion::ObjectCreated { tag, .. }
            | Completion::ObjectUpdated { tag, .. }
            | Completion::ObjectsLinked { tag, .. } => *tag,
        }
    }

    /// The kind of request this completion answers, derived from the variant.
    pub fn kind(&self) -> RequestKind {
        match self {
            Completion::TextureRead { .. } => RequestKind::TextureRead,
            Completion::AssetStored { .. } => RequestKind::AssetUpload,
            Completion::ObjectCreated { .. } => RequestKind::ObjectCreate,
            Completion::ObjectUpdated { .. } => RequestKind::ObjectUpdate,
            Completion::ObjectsLinked { .. } => RequestKind::ObjectLink,
        }
    }

    /// The object an update acknowledgment names; `None` for other variants.
    pub fn subject(&self) -> Option<ObjectId> {
        match self {
            Completion::ObjectUpdated { object, .. } => Some(*object),
            _ => None,
        }
    }
}
