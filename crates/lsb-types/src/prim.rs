use serde::{Deserialize, Serialize};

use crate::identity::{AssetId, LocalId};
use crate::math::{Color4, Quat, Vec3};

/// Profile (cross-section) block of the volume parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    /// Profile curve code (circle, square, triangle, half-circle...).
    pub curve: u8,
    pub begin: f32,
    pub end: f32,
    pub hollow: f32,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            curve: 1,
            begin: 0.0,
            end: 1.0,
            hollow: 0.0,
        }
    }
}

/// Path (extrusion) block of the volume parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathParams {
    /// Path curve code (line, circle, flexible...).
    pub curve: u8,
    pub begin: f32,
    pub end: f32,
    pub scale: [f32; 2],
    pub shear: [f32; 2],
    pub twist_begin: f32,
    pub twist_end: f32,
    pub radius_offset: f32,
    pub taper: [f32; 2],
    pub revolutions: f32,
    pub skew: f32,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            curve: 16,
            begin: 0.0,
            end: 1.0,
            scale: [1.0, 1.0],
            shear: [0.0, 0.0],
            twist_begin: 0.0,
            twist_end: 0.0,
            radius_offset: 0.0,
            taper: [0.0, 0.0],
            revolutions: 1.0,
            skew: 0.0,
        }
    }
}

/// Shape of a primitive. Defaults describe a plain box.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeParams {
    pub profile: ProfileParams,
    pub path: PathParams,
}

/// Object flags that survive a backup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimFlags {
    #[serde(default)]
    pub phantom: bool,
    #[serde(default)]
    pub physical: bool,
    #[serde(default)]
    pub cast_shadows: bool,
}

/// Point light emitted by a primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightParams {
    pub color: Color4,
    pub intensity: f32,
    pub radius: f32,
    pub cutoff: f32,
    pub falloff: f32,
}

/// Projected light texture attached to a light.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightImageParams {
    pub texture: AssetId,
    /// Field of view, focus and ambiance.
    pub params: [f32; 3],
}

/// Flexible-path parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlexibleParams {
    pub softness: u8,
    pub gravity: f32,
    pub drag: f32,
    pub wind: f32,
    pub tension: f32,
    pub force: Vec3,
}

/// Base shape a sculpt map is wrapped around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SculptType {
    Sphere,
    Torus,
    Plane,
    Cylinder,
    /// The "texture" is a mesh asset, not an image.
    Mesh,
}

/// Sculpted shape parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SculptParams {
    pub texture: AssetId,
    pub sculpt_type: SculptType,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub mirror: bool,
}

impl SculptParams {
    pub fn is_mesh(&self) -> bool {
        self.sculpt_type == SculptType::Mesh
    }

    /// The sculpt map, if this sculpt is image-based.
    pub fn sculpt_texture(&self) -> Option<AssetId> {
        (!self.is_mesh()).then_some(self.texture)
    }
}

/// Normal and specular maps of one face.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceMaterial {
    pub normal_map: AssetId,
    pub specular_map: AssetId,
}

/// Material assignment of one primitive face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureEntry {
    pub texture: AssetId,
    #[serde(default)]
    pub color: Color4,
    #[serde(default = "unit_repeats")]
    pub repeats: [f32; 2],
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub glow: f32,
    #[serde(default)]
    pub bump: u8,
    #[serde(default)]
    pub shiny: u8,
    #[serde(default)]
    pub fullbright: bool,
    #[serde(default)]
    pub media_flags: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<FaceMaterial>,
}

fn unit_repeats() -> [f32; 2] {
    [1.0, 1.0]
}

impl TextureEntry {
    /// A plain white face showing `texture`.
    pub fn new(texture: AssetId) -> Self {
        Self {
            texture,
            color: Color4::WHITE,
            repeats: unit_repeats(),
            offset: [0.0, 0.0],
            rotation: 0.0,
            glow: 0.0,
            bump: 0,
            shiny: 0,
            fullbright: false,
            media_flags: 0,
            material: None,
        }
    }

    /// Every asset id this face references, diffuse texture first.
    pub fn asset_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        std::iter::once(self.texture).chain(
            self.material
                .iter()
                .flat_map(|m| [m.normal_map, m.specular_map]),
        )
    }
}

/// One serialized primitive.
///
/// Transforms of the root are absolute (region coordinates); transforms of
/// children are relative to the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveRecord {
    #[serde(skip)]
    pub local_id: LocalId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<LocalId>,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub volume: VolumeParams,
    #[serde(default)]
    pub flags: PrimFlags,
    /// Prim material code (stone, metal, wood...).
    #[serde(default)]
    pub material: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_action: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_image: Option<LightImageParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexible: Option<FlexibleParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sculpt: Option<SculptParams>,
    #[serde(default, alias = "textures", alias = "texture")]
    pub faces: Vec<TextureEntry>,
}

fn unit_scale() -> Vec3 {
    Vec3::new(0.5, 0.5, 0.5)
}

impl PrimitiveRecord {
    /// A plain box primitive with no faces.
    pub fn new(local_id: LocalId, name: impl Into<String>) -> Self {
        Self {
            local_id,
            name: name.into(),
            description: String::new(),
            parent: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: unit_scale(),
            volume: VolumeParams::default(),
            flags: PrimFlags::default(),
            material: 3,
            click_action: None,
            light: None,
            light_image: None,
            flexible: None,
            sculpt: None,
            faces: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Every texture-like asset this primitive references, in a stable
    /// order: faces (diffuse, normal, specular), light image, sculpt map.
    pub fn referenced_assets(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self.faces.iter().flat_map(|f| f.asset_ids()).collect();
        if let Some(light_image) = &self.light_image {
            ids.push(light_image.texture);
        }
        if let Some(texture) = self.sculpt.as_ref().and_then(|s| s.sculpt_texture()) {
            ids.push(texture);
        }
        ids
    }

    /// Apply `f` to every asset id this primitive references (faces, face
    /// materials, light image and image-based sculpt map).
    pub fn map_assets(&mut self, mut f: impl FnMut(AssetId) -> AssetId) {
        for face in &mut self.faces {
            face.texture = f(face.texture);
            if let Some(material) = &mut face.material {
                material.normal_map = f(material.normal_map);
                material.specular_map = f(material.specular_map);
            }
        }
        if let Some(light_image) = &mut self.light_image {
            light_image.texture = f(light_image.texture);
        }
        if let Some(sculpt) = &mut self.sculpt {
            if !sculpt.is_mesh() {
                sculpt.texture = f(sculpt.texture);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(n: u8) -> AssetId {
        AssetId::from_bytes([n; 16])
    }

    #[test]
    fn referenced_assets_cover_every_block() {
        let mut prim = PrimitiveRecord::new(LocalId(1), "box");
        let mut face = TextureEntry::new(asset(1));
        face.material = Some(FaceMaterial {
            normal_map: asset(2),
            specular_map: asset(3),
        });
        prim.faces.push(face);
        prim.light_image = Some(LightImageParams {
            texture: asset(4),
            params: [1.0, 0.0, 0.0],
        });
        prim.sculpt = Some(SculptParams {
            texture: asset(5),
            sculpt_type: SculptType::Sphere,
            invert: false,
            mirror: false,
        });
        assert_eq!(
            prim.referenced_assets(),
            vec![asset(1), asset(2), asset(3), asset(4), asset(5)]
        );
    }

    #[test]
    fn mesh_sculpt_is_not_a_texture() {
        let mut prim = PrimitiveRecord::new(LocalId(1), "mesh");
        prim.sculpt = Some(SculptParams {
            texture: asset(9),
            sculpt_type: SculptType::Mesh,
            invert: false,
            mirror: false,
        });
        assert!(prim.referenced_assets().is_empty());
        prim.map_assets(|_| asset(7));
        assert_eq!(prim.sculpt.unwrap().texture, asset(9));
    }

    #[test]
    fn map_assets_rewrites_all_references() {
        let mut prim = PrimitiveRecord::new(LocalId(1), "box");
        prim.faces.push(TextureEntry::new(asset(1)));
        prim.faces.push(TextureEntry::new(asset(2)));
        prim.map_assets(|id| if id == asset(1) { asset(10) } else { id });
        assert_eq!(prim.faces[0].texture, asset(10));
        assert_eq!(prim.faces[1].texture, asset(2));
    }

    #[test]
    fn legacy_texture_key_is_accepted() {
        let json = r#"{
            "name": "old",
            "position": [1.0, 2.0, 3.0],
            "texture": [{"texture": "89556747-24cb-43ed-920b-47caed15465f"}]
        }"#;
        let prim: PrimitiveRecord = serde_json::from_str(json).unwrap();
        assert_eq!(prim.faces.len(), 1);
        assert_eq!(prim.faces[0].repeats, [1.0, 1.0]);
        assert_eq!(prim.scale, Vec3::new(0.5, 0.5, 0.5));
    }
}
