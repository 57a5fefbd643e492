use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use lsb_types::AssetId;

use crate::error::{AssetError, AssetResult};

/// Id an asset store assigns to `data`: the first 16 bytes of its BLAKE3
/// hash, domain-separated from other hash uses.
pub fn content_id(data: &[u8]) -> AssetId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"lsb-asset:");
    hasher.update(data);
    let hash = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash.as_bytes()[..16]);
    AssetId::from_bytes(bytes)
}

/// In-memory, content-addressed asset store.
///
/// Storing the same bytes twice yields the same id.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: RwLock<HashMap<AssetId, Bytes>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, data: impl Into<Bytes>) -> AssetResult<AssetId> {
        let data = data.into();
        if data.is_empty() {
            return Err(AssetError::EmptyAsset);
        }
        let id = content_id(&data);
        self.assets
            .write()
            .expect("lock poisoned")
            .entry(id)
            .or_insert(data);
        Ok(id)
    }

    /// Store `data` under a caller-chosen id, e.g. to seed a world with
    /// existing assets.
    pub fn insert(&self, id: AssetId, data: impl Into<Bytes>) {
        self.assets
            .write()
            .expect("lock poisoned")
            .insert(id, data.into());
    }

    pub fn get(&self, id: AssetId) -> AssetResult<Bytes> {
        self.assets
            .read()
            .expect("lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(AssetError::NotFound(id))
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.assets.read().expect("lock poisoned").contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_id() {
        let store = InMemoryAssetStore::new();
        let a = store.put(&b"texture"[..]).unwrap();
        let b = store.put(&b"texture"[..]).unwrap();
        let c = store.put(&b"other"[..]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
        assert_eq!(&store.get(a).unwrap()[..], b"texture");
    }

    #[test]
    fn empty_asset_is_refused() {
        let store = InMemoryAssetStore::new();
        assert_eq!(store.put(Vec::new()), Err(AssetError::EmptyAsset));
        assert!(store.is_empty());
    }

    #[test]
    fn seeded_assets_are_readable() {
        let store = InMemoryAssetStore::new();
        let id = AssetId::from_bytes([3; 16]);
        store.insert(id, vec![1, 2]);
        assert!(store.contains(id));
        assert_eq!(store.get(AssetId::null()), Err(AssetError::NotFound(AssetId::null())));
    }
}
