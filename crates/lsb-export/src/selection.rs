use lsb_perms::PermissionSet;
use lsb_types::{PrimitiveRecord, Quat, Vec3};

/// A selected primitive as the world reports it.
///
/// `position` and `rotation` are absolute region coordinates for every
/// primitive, children included. The transform fields of `record` are
/// ignored; its `local_id` identifies the primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldPrim {
    pub permissions: PermissionSet,
    pub position: Vec3,
    pub rotation: Quat,
    pub record: PrimitiveRecord,
}

/// One selected linkset, root first.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedLinkset {
    pub root: WorldPrim,
    pub children: Vec<WorldPrim>,
}

impl SelectedLinkset {
    pub fn new(root: WorldPrim) -> Self {
        Self {
            root,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: WorldPrim) -> Self {
        self.children.push(child);
        self
    }

    /// Root followed by children.
    pub fn prims(&self) -> impl Iterator<Item = &WorldPrim> {
        std::iter::once(&self.root).chain(self.children.iter())
    }

    pub fn prim_count(&self) -> usize {
        1 + self.children.len()
    }
}

/// The operator's current selection, one entry per selected root.
pub trait SelectionSource {
    fn selected_linksets(&self) -> Vec<SelectedLinkset>;
}
