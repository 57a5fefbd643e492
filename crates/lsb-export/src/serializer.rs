use std::collections::HashSet;

use lsb_perms::{PermissionSource, TextureGate};
use lsb_types::{AssetId, LinksetDescriptor, PrimitiveRecord};
use tracing::debug;

use crate::selection::{SelectedLinkset, WorldPrim};

/// Turns selected linksets into descriptors and collects the textures to
/// copy alongside the document.
///
/// Every texture reference goes through the gate; denied ids are written as
/// the fallback. Harvested ids are distinct and keep first-seen order across
/// all linksets serialized by one serializer.
#[derive(Debug, Default)]
pub struct PrimSerializer {
    textures: Vec<AssetId>,
    seen: HashSet<AssetId>,
}

impl PrimSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialize_linkset(
        &mut self,
        linkset: &SelectedLinkset,
        gate: &mut TextureGate,
        source: &dyn PermissionSource,
    ) -> LinksetDescriptor {
        let root = &linkset.root;
        let mut prims = Vec::with_capacity(linkset.prim_count());
        prims.push(self.serialize_prim(root, None, gate, source));
        for child in &linkset.children {
            prims.push(self.serialize_prim(child, Some(root), gate, source));
        }
        debug!(root = %root.record.local_id, prims = prims.len(), "linkset serialized");
        LinksetDescriptor::new(root.position, root.rotation, prims)
    }

    /// Serialize one primitive. Children are expressed relative to `root`.
    pub fn serialize_prim(
        &mut self,
        prim: &WorldPrim,
        root: Option<&WorldPrim>,
        gate: &mut TextureGate,
        source: &dyn PermissionSource,
    ) -> PrimitiveRecord {
        let mut record = prim.record.clone();
        match root {
            None => {
                record.parent = None;
                record.position = prim.position;
                record.rotation = prim.rotation;
            }
            Some(root) => {
                let inverse = root.rotation.conjugate();
                record.parent = Some(root.record.local_id);
                record.position = inverse.rotate(prim.position - root.position);
                record.rotation = inverse * prim.rotation;
            }
        }

        let defaults = gate.defaults().clone();
        let textures = &mut self.textures;
        let seen = &mut self.seen;
        record.map_assets(|id| {
            let written = gate.substitute(id, source);
            if defaults.is_harvested(written) && seen.insert(written) {
                textures.push(written);
            }
            written
        });
        record
    }

    /// Harvested texture ids so far.
    pub fn textures(&self) -> &[AssetId] {
        &self.textures
    }

    pub fn into_textures(self) -> Vec<AssetId> {
        self.textures
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lsb_perms::{DefaultTextures, ExportPolicy, PermissionSet};
    use lsb_types::{
        ActorId, FaceMaterial, LightImageParams, LocalId, Quat, SculptParams, SculptType,
        TextureEntry, Vec3,
    };

    use super::*;

    struct Inventory(HashMap<AssetId, Vec<PermissionSet>>);

    impl PermissionSource for Inventory {
        fn asset_permissions(&self, asset: AssetId) -> Vec<PermissionSet> {
            self.0.get(&asset).cloned().unwrap_or_default()
        }
    }

    fn me() -> ActorId {
        ActorId::from_bytes([1; 16])
    }

    fn asset(n: u8) -> AssetId {
        AssetId::from_bytes([n; 16])
    }

    fn world_prim(id: u32, position: Vec3, rotation: Quat, faces: &[AssetId]) -> WorldPrim {
        let mut record = PrimitiveRecord::new(LocalId(id), format!("prim {id}"));
        record.faces = faces.iter().copied().map(TextureEntry::new).collect();
        WorldPrim {
            permissions: PermissionSet::full(me(), me()),
            position,
            rotation,
            record,
        }
    }

    fn inventory(owned: &[AssetId]) -> Inventory {
        Inventory(
            owned
                .iter()
                .map(|id| (*id, vec![PermissionSet::full(me(), me())]))
                .collect(),
        )
    }

    #[test]
    fn children_are_relative_to_root() {
        let turn = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), std::f32::consts::FRAC_PI_2);
        let root = world_prim(1, Vec3::new(100.0, 100.0, 20.0), turn, &[]);
        // One metre along the root's local x axis, which points along world y.
        let child = world_prim(2, Vec3::new(100.0, 101.0, 20.0), turn, &[]);
        let linkset = SelectedLinkset::new(root).with_child(child);

        let mut gate = TextureGate::new(ExportPolicy::CreatorOnly, me(), &DefaultTextures::default());
        let descriptor =
            PrimSerializer::new().serialize_linkset(&linkset, &mut gate, &inventory(&[]));

        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.root_position, Vec3::new(100.0, 100.0, 20.0));
        let child = &descriptor.prims[1];
        assert_eq!(child.parent, Some(LocalId(1)));
        assert!(child.position.approx_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
        assert!(child.rotation.approx_eq(Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn denied_textures_become_fallback_and_are_harvested_once() {
        let defaults = DefaultTextures::default();
        let root = world_prim(1, Vec3::ZERO, Quat::IDENTITY, &[asset(1), asset(1), defaults.blank]);
        let child = world_prim(2, Vec3::ONE, Quat::IDENTITY, &[asset(9), asset(1)]);
        let linkset = SelectedLinkset::new(root).with_child(child);

        let mut gate = TextureGate::new(ExportPolicy::CreatorOnly, me(), &defaults);
        let mut serializer = PrimSerializer::new();
        let descriptor = serializer.serialize_linkset(&linkset, &mut gate, &inventory(&[asset(1)]));

        assert_eq!(descriptor.prims[1].faces[0].texture, defaults.plywood);
        assert_eq!(serializer.textures(), &[asset(1), defaults.plywood]);
        assert_eq!(gate.take_denials(), vec![asset(9)]);
    }

    #[test]
    fn material_maps_light_image_and_sculpt_are_gated() {
        let defaults = DefaultTextures::default();
        let mut prim = world_prim(1, Vec3::ZERO, Quat::IDENTITY, &[asset(1)]);
        prim.record.faces[0].material = Some(FaceMaterial {
            normal_map: asset(2),
            specular_map: AssetId::null(),
        });
        prim.record.light_image = Some(LightImageParams {
            texture: asset(3),
            params: [0.5, 0.0, 0.0],
        });
        prim.record.sculpt = Some(SculptParams {
            texture: asset(4),
            sculpt_type: SculptType::Sphere,
            invert: false,
            mirror: false,
        });

        let mut gate = TextureGate::new(ExportPolicy::CreatorOnly, me(), &defaults);
        let mut serializer = PrimSerializer::new();
        let descriptor = serializer.serialize_linkset(
            &SelectedLinkset::new(prim),
            &mut gate,
            &inventory(&[asset(1), asset(3), asset(4)]),
        );

        let record = &descriptor.prims[0];
        let material = record.faces[0].material.as_ref().unwrap();
        assert_eq!(material.normal_map, defaults.plywood);
        assert_eq!(material.specular_map, AssetId::null());
        assert_eq!(record.light_image.as_ref().unwrap().texture, asset(3));
        assert_eq!(
            serializer.into_textures(),
            vec![asset(1), defaults.plywood, asset(3), asset(4)]
        );
    }
}
