use std::collections::HashMap;

use lsb_types::AssetId;

use crate::error::{AssetError, AssetResult};

/// Source-to-destination asset id table of one import.
///
/// Entries are add-only: once an id is mapped its destination never changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetIdRemap {
    entries: HashMap<AssetId, AssetId>,
}

impl AssetIdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `original` to `replacement`. Repeating an identical entry is a
    /// no-op; changing an existing one is refused.
    pub fn insert(&mut self, original: AssetId, replacement: AssetId) -> AssetResult<()> {
        match self.entries.get(&original) {
            Some(existing) if *existing == replacement => Ok(()),
            Some(existing) => Err(AssetError::RemapConflict {
                original,
                existing: *existing,
                proposed: replacement,
            }),
            None => {
                self.entries.insert(original, replacement);
                Ok(())
            }
        }
    }

    pub fn get(&self, original: AssetId) -> Option<AssetId> {
        self.entries.get(&original).copied()
    }

    /// The mapped id, or `id` itself when unmapped.
    pub fn resolve(&self, id: AssetId) -> AssetId {
        self.get(id).unwrap_or(id)
    }

    pub fn contains(&self, original: AssetId) -> bool {
        self.entries.contains_key(&original)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &AssetId)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn asset(n: u8) -> AssetId {
        AssetId::from_bytes([n; 16])
    }

    #[test]
    fn unmapped_ids_resolve_to_themselves() {
        let mut remap = AssetIdRemap::new();
        remap.insert(asset(1), asset(10)).unwrap();
        assert_eq!(remap.resolve(asset(1)), asset(10));
        assert_eq!(remap.resolve(asset(2)), asset(2));
    }

    #[test]
    fn entries_cannot_change() {
        let mut remap = AssetIdRemap::new();
        remap.insert(asset(1), asset(10)).unwrap();
        remap.insert(asset(1), asset(10)).unwrap();
        assert_eq!(
            remap.insert(asset(1), asset(11)),
            Err(AssetError::RemapConflict {
                original: asset(1),
                existing: asset(10),
                proposed: asset(11),
            })
        );
        assert_eq!(remap.get(asset(1)), Some(asset(10)));
        assert_eq!(remap.len(), 1);
    }

    proptest! {
        #[test]
        fn mapped_entries_never_change(ops in prop::collection::vec((0u8..8, 0u8..8), 0..64)) {
            let mut remap = AssetIdRemap::new();
            let mut first: HashMap<AssetId, AssetId> = HashMap::new();
            for (from, to) in ops {
                let _ = remap.insert(asset(from), asset(to + 100));
                first.entry(asset(from)).or_insert(asset(to + 100));
                for (k, v) in &first {
                    prop_assert_eq!(remap.get(*k), Some(*v));
                }
                prop_assert_eq!(remap.len(), first.len());
            }
        }
    }
}
