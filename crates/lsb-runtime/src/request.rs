use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generation::Generation;

/// The pipeline stage a request belongs to.
///
/// At most one request of each kind is outstanding per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestKind {
    TextureRead,
    AssetUpload,
    ObjectCreate,
    ObjectUpdate,
    ObjectLink,
}

impl RequestKind {
    pub const ALL: [RequestKind; 5] = [
        RequestKind::TextureRead,
        RequestKind::AssetUpload,
        RequestKind::ObjectCreate,
        RequestKind::ObjectUpdate,
        RequestKind::ObjectLink,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::TextureRead => "texture-read",
            RequestKind::AssetUpload => "asset-upload",
            RequestKind::ObjectCreate => "object-create",
            RequestKind::ObjectUpdate => "object-update",
            RequestKind::ObjectLink => "object-link",
        };
        f.write_str(name)
    }
}

/// Tag attached to every outgoing request and echoed by its completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub generation: Generation,
    pub kind: RequestKind,
}

impl RequestTag {
    pub fn new(generation: Generation, kind: RequestKind) -> Self {
        Self { generation, kind }
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.generation, self.kind)
    }
}
