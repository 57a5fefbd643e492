use std::path::Path;

use lsb_export::ExportOptions;
use lsb_import::{ImportOptions, PlacementOptions};
use lsb_perms::{DefaultTextures, ExportPolicy, PermsConfig};
use lsb_types::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Client settings, usually loaded from a TOML file. Every field has a
/// default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub export_policy: ExportPolicy,
    /// Library texture ids; overrides only apply under `Unrestricted`.
    pub default_textures: DefaultTextures,
    pub reupload_textures: bool,
    /// Where placeholders appear, in the operator's frame.
    pub rez_offset: Vec3,
    /// Where the first imported root lands, in the operator's frame.
    pub placement_offset: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_name: Option<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        let placement = PlacementOptions::default();
        Self {
            export_policy: ExportPolicy::default(),
            default_textures: DefaultTextures::default(),
            reupload_textures: true,
            rez_offset: placement.rez_offset,
            placement_offset: placement.placement_offset,
            document_name: None,
            grid_name: None,
        }
    }
}

impl BackupConfig {
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> EngineResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn perms(&self) -> PermsConfig {
        PermsConfig {
            export_policy: self.export_policy,
            default_textures: self.default_textures.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            perms: self.perms(),
            document_name: self.document_name.clone(),
            grid_name: self.grid_name.clone(),
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            reupload_textures: self.reupload_textures,
            placement: PlacementOptions {
                rez_offset: self.rez_offset,
                placement_offset: self.placement_offset,
            },
            default_textures: self.perms().effective_defaults(),
        }
    }
}
