use serde::{Deserialize, Serialize};

use crate::defaults::DefaultTextures;
use crate::permissions::ExportPolicy;

/// Permission settings of one client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermsConfig {
    /// Export rules enforced by the current grid.
    pub export_policy: ExportPolicy,
    /// Library texture ids; overrides only apply under `Unrestricted`.
    pub default_textures: DefaultTextures,
}

impl PermsConfig {
    pub fn new(export_policy: ExportPolicy) -> Self {
        Self {
            export_policy,
            default_textures: DefaultTextures::default(),
        }
    }

    /// The default textures in effect under the configured policy.
    pub fn effective_defaults(&self) -> DefaultTextures {
        self.default_textures.effective(self.export_policy)
    }
}

#[cfg(test)]
mod tests {
    use lsb_types::AssetId;

    use super::*;

    #[test]
    fn default_is_creator_only() {
        let config = PermsConfig::default();
        assert_eq!(config.export_policy, ExportPolicy::CreatorOnly);
        assert_eq!(config.effective_defaults(), DefaultTextures::default());
    }

    #[test]
    fn loads_partial_toml() {
        let config: PermsConfig = toml::from_str(
            r#"
            export_policy = "unrestricted"

            [default_textures]
            plywood = "00000000-0000-0000-0000-000000000007"
            "#,
        )
        .unwrap();
        assert_eq!(config.export_policy, ExportPolicy::Unrestricted);
        assert_eq!(
            config.effective_defaults().plywood,
            AssetId::from_u128(7)
        );
        assert_eq!(
            config.default_textures.blank,
            DefaultTextures::default().blank
        );
    }

    #[test]
    fn overrides_ignored_under_enforcement() {
        let mut config = PermsConfig::new(ExportPolicy::ExportBit);
        config.default_textures.plywood = AssetId::from_u128(7);
        assert_eq!(config.effective_defaults().plywood, DefaultTextures::default().plywood);
    }
}
