use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::AssetId;

/// A texture id together with the outcome of its export permission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureReference {
    pub id: AssetId,
    pub valid: bool,
}

impl TextureReference {
    pub fn valid(id: AssetId) -> Self {
        Self { id, valid: true }
    }

    pub fn invalid(id: AssetId) -> Self {
        Self { id, valid: false }
    }
}

/// Encoding of an image held by the texture cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCodec {
    /// JPEG-2000 codestream, the only encoding a backup stores.
    J2c,
    /// Legacy uncompressed Targa, found on some locally baked images.
    Tga,
    Png,
    Jpeg,
    Unknown,
}

impl fmt::Display for ImageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageCodec::J2c => "j2c",
            ImageCodec::Tga => "tga",
            ImageCodec::Png => "png",
            ImageCodec::Jpeg => "jpeg",
            ImageCodec::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Image bytes as delivered by the texture cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedTexture {
    pub codec: ImageCodec,
    pub data: Bytes,
}

impl CachedTexture {
    pub fn new(codec: ImageCodec, data: impl Into<Bytes>) -> Self {
        Self {
            codec,
            data: data.into(),
        }
    }

    pub fn j2c(data: impl Into<Bytes>) -> Self {
        Self::new(ImageCodec::J2c, data)
    }
}

/// Why the texture cache could not deliver an image.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CacheReadError {
    #[error("texture {0} is not in the cache")]
    NotFound(AssetId),

    #[error("texture cache read failed: {0}")]
    Failed(String),
}
