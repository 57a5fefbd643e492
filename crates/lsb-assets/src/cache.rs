use bytes::Bytes;
use lsb_runtime::{
    Dispatcher, PartialFailureKind, RequestKind, RuntimeResult, TextureCacheChannel,
};
use lsb_types::{AssetId, CacheReadError, CachedTexture, ImageCodec};
use tracing::debug;

/// Result of one texture read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureFetch {
    /// A JPEG-2000 codestream ready to store.
    Ready { asset: AssetId, data: Bytes },
    Failed {
        asset: AssetId,
        reason: PartialFailureKind,
    },
}

impl TextureFetch {
    pub fn asset(&self) -> AssetId {
        match self {
            TextureFetch::Ready { asset, .. } | TextureFetch::Failed { asset, .. } => *asset,
        }
    }
}

/// Check a cache answer. Only non-empty JPEG-2000 data is accepted; other
/// encodings are reported, never converted.
pub fn classify(
    asset: AssetId,
    result: Result<CachedTexture, CacheReadError>,
) -> TextureFetch {
    let reason = match result {
        Ok(texture) if texture.data.is_empty() => PartialFailureKind::NullTexture,
        Ok(texture) if texture.codec == ImageCodec::J2c => {
            return TextureFetch::Ready {
                asset,
                data: texture.data,
            }
        }
        Ok(texture) => {
            debug!(asset = %asset, codec = %texture.codec, "unexpected texture encoding");
            PartialFailureKind::BadEncoding
        }
        Err(CacheReadError::NotFound(_)) => PartialFailureKind::Missing,
        Err(CacheReadError::Failed(reason)) => {
            debug!(asset = %asset, reason = %reason, "texture cache read failed");
            PartialFailureKind::Missing
        }
    };
    TextureFetch::Failed { asset, reason }
}

/// Reads textures from the local cache one at a time.
#[derive(Debug, Default)]
pub struct TextureCacheReader {
    in_flight: Option<AssetId>,
}

impl TextureCacheReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a read for `id`. Refused while another read is outstanding.
    pub fn request(
        &mut self,
        dispatcher: &mut Dispatcher,
        channel: &dyn TextureCacheChannel,
        id: AssetId,
    ) -> RuntimeResult<()> {
        let tag = dispatcher.issue(RequestKind::TextureRead)?;
        if let Err(e) = channel.read_texture(tag, id) {
            dispatcher.cancel(RequestKind::TextureRead);
            return Err(e);
        }
        self.in_flight = Some(id);
        Ok(())
    }

    /// Handle the completion of the outstanding read.
    ///
    /// An answer naming another texture does not satisfy the read: the
    /// requested texture is reported missing and the answer is dropped.
    pub fn complete(
        &mut self,
        asset: AssetId,
        result: Result<CachedTexture, CacheReadError>,
    ) -> TextureFetch {
        match self.in_flight.take() {
            Some(expected) if expected != asset => {
                debug!(expected = %expected, actual = %asset, "cache answered for another texture");
                TextureFetch::Failed {
                    asset: expected,
                    reason: PartialFailureKind::Missing,
                }
            }
            _ => classify(asset, result),
        }
    }

    pub fn in_flight(&self) -> Option<AssetId> {
        self.in_flight
    }
}
