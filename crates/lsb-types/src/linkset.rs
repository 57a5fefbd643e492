use std::collections::HashSet;

use crate::error::TypeError;
use crate::identity::{AssetId, LocalId};
use crate::math::{Quat, Vec3};
use crate::prim::PrimitiveRecord;

/// One linkset: a root primitive followed by its children.
///
/// Invariants (checked by [`LinksetDescriptor::validate`]):
/// - the list is non-empty and the first record is the only parentless one;
/// - local ids are unique;
/// - every child's parent resolves to a record of the same descriptor.
///
/// The document layer owns the on-disk shape; this type is the in-memory form.
#[derive(Clone, Debug, PartialEq)]
pub struct LinksetDescriptor {
    pub root_position: Vec3,
    pub root_rotation: Quat,
    pub prims: Vec<PrimitiveRecord>,
}

impl LinksetDescriptor {
    pub fn new(root_position: Vec3, root_rotation: Quat, prims: Vec<PrimitiveRecord>) -> Self {
        Self {
            root_position,
            root_rotation,
            prims,
        }
    }

    /// Check the structural invariants of the descriptor.
    pub fn validate(&self) -> Result<(), TypeError> {
        let root = self.prims.first().ok_or(TypeError::EmptyLinkset)?;
        if !root.is_root() {
            return Err(TypeError::RootNotFirst(root.local_id));
        }

        let mut seen = HashSet::with_capacity(self.prims.len());
        for prim in &self.prims {
            if !seen.insert(prim.local_id) {
                return Err(TypeError::DuplicateLocalId(prim.local_id));
            }
        }

        for prim in &self.prims[1..] {
            match prim.parent {
                None => return Err(TypeError::MultipleRoots(root.local_id, prim.local_id)),
                Some(parent) if !seen.contains(&parent) => {
                    return Err(TypeError::DanglingParent {
                        child: prim.local_id,
                        parent,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn root(&self) -> Option<&PrimitiveRecord> {
        self.prims.first()
    }

    pub fn children(&self) -> &[PrimitiveRecord] {
        self.prims.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    pub fn find(&self, local_id: LocalId) -> Option<&PrimitiveRecord> {
        self.prims.iter().find(|p| p.local_id == local_id)
    }

    /// Distinct non-null asset ids referenced by the linkset, first-seen order.
    pub fn referenced_assets(&self) -> Vec<AssetId> {
        let mut seen = HashSet::new();
        self.prims
            .iter()
            .flat_map(|p| p.referenced_assets())
            .filter(|id| !id.is_null() && seen.insert(*id))
            .collect()
    }
}
