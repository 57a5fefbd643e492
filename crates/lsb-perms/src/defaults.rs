use lsb_types::AssetId;
use serde::{Deserialize, Serialize};

use crate::permissions::ExportPolicy;

const PLYWOOD: AssetId = AssetId::from_u128(0x89556747_24cb_43ed_920b_47caed15465f);
const BLANK: AssetId = AssetId::from_u128(0x5748decc_f629_461c_9a36_a35a221fe21f);
const INVISIBLE: AssetId = AssetId::from_u128(0x38b86f85_2575_52a9_a531_23108d8da837);
const TRANSPARENT: AssetId = AssetId::from_u128(0x8dcd4a48_2d37_4909_9f78_f7a9eb4ef903);
const MEDIA: AssetId = AssetId::from_u128(0x8b5fec65_8d8d_9dc5_cda8_8fdf2716e361);

/// Well-known library textures every grid ships.
///
/// These are always exportable. `plywood` doubles as the fallback written in
/// place of any texture the actor may not export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTextures {
    pub plywood: AssetId,
    pub blank: AssetId,
    pub invisible: AssetId,
    pub transparent: AssetId,
    pub media: AssetId,
}

impl Default for DefaultTextures {
    fn default() -> Self {
        Self {
            plywood: PLYWOOD,
            blank: BLANK,
            invisible: INVISIBLE,
            transparent: TRANSPARENT,
            media: MEDIA,
        }
    }
}

impl DefaultTextures {
    /// Resolve the texture set in effect under `policy`.
    ///
    /// Overrides of plywood, blank and invisible are only honoured under
    /// [`ExportPolicy::Unrestricted`]; other policies use the built-in ids.
    pub fn effective(&self, policy: ExportPolicy) -> DefaultTextures {
        match policy {
            ExportPolicy::Unrestricted => DefaultTextures {
                plywood: self.plywood,
                blank: self.blank,
                invisible: self.invisible,
                ..DefaultTextures::default()
            },
            _ => DefaultTextures::default(),
        }
    }

    /// The id written in place of a texture that failed the gate.
    pub fn fallback(&self) -> AssetId {
        self.plywood
    }

    /// One of the five well-known ids.
    pub fn is_library(&self, id: AssetId) -> bool {
        id == self.plywood
            || id == self.blank
            || id == self.invisible
            || id == self.transparent
            || id == self.media
    }

    /// Whether an export copies the image of `id` next to the document.
    ///
    /// Null, blank and invisible have no image worth keeping. The fallback
    /// is copied like any other texture.
    pub fn is_harvested(&self, id: AssetId) -> bool {
        !id.is_null() && id != self.blank && id != self.invisible
    }

    /// Whether an import uploads `id` again. Library textures exist on
    /// every grid and are never uploaded.
    pub fn is_uploaded(&self, id: AssetId) -> bool {
        !id.is_null() && !self.is_library(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_ids() {
        let d = DefaultTextures::default();
        assert_eq!(d.plywood.to_string(), "89556747-24cb-43ed-920b-47caed15465f");
        assert_eq!(d.media.to_string(), "8b5fec65-8d8d-9dc5-cda8-8fdf2716e361");
        assert_eq!(d.fallback(), d.plywood);
    }

    #[test]
    fn overrides_only_apply_without_enforcement() {
        let custom = AssetId::from_bytes([7; 16]);
        let configured = DefaultTextures {
            plywood: custom,
            ..DefaultTextures::default()
        };
        assert_eq!(configured.effective(ExportPolicy::Unrestricted).plywood, custom);
        assert_eq!(
            configured.effective(ExportPolicy::CreatorOnly),
            DefaultTextures::default()
        );
        assert_eq!(
            configured.effective(ExportPolicy::ExportBit).fallback(),
            DefaultTextures::default().plywood
        );
    }

    #[test]
    fn harvest_and_upload_rules() {
        let d = DefaultTextures::default();
        let custom = AssetId::from_bytes([1; 16]);
        assert!(!d.is_harvested(AssetId::null()));
        assert!(!d.is_harvested(d.blank));
        assert!(!d.is_harvested(d.invisible));
        assert!(d.is_harvested(d.plywood));
        assert!(d.is_harvested(d.transparent));
        assert!(d.is_harvested(custom));

        assert!(!d.is_uploaded(AssetId::null()));
        assert!(!d.is_uploaded(d.plywood));
        assert!(!d.is_uploaded(d.media));
        assert!(d.is_uploaded(custom));
        assert!(!d.is_library(custom));
    }
}
