use std::collections::HashSet;

use lsb_types::{ActorId, AssetId, LocalId, SculptParams, TextureReference};
use tracing::debug;

use crate::config::PermsConfig;
use crate::defaults::DefaultTextures;
use crate::error::{PermsError, PermsResult};
use crate::permissions::{ExportPolicy, PermissionSet};

/// Accessor over the permission system: the permission sets of every
/// inventory item that holds `asset`.
///
/// An empty list means the actor holds no copy of the asset.
pub trait PermissionSource {
    fn asset_permissions(&self, asset: AssetId) -> Vec<PermissionSet>;
}

// ---------------------------------------------------------------------------
// TextureGate
// ---------------------------------------------------------------------------

/// Per-session export check for primitives and the textures they reference.
///
/// Denied texture ids are cached for the lifetime of the gate, so the
/// permission source is consulted at most once per denied id and each denial
/// is reported once through [`TextureGate::take_denials`].
#[derive(Debug)]
pub struct TextureGate {
    policy: ExportPolicy,
    actor: ActorId,
    defaults: DefaultTextures,
    denied: HashSet<AssetId>,
    unreported: Vec<AssetId>,
}

impl TextureGate {
    pub fn new(policy: ExportPolicy, actor: ActorId, defaults: &DefaultTextures) -> Self {
        Self {
            policy,
            actor,
            defaults: defaults.effective(policy),
            denied: HashSet::new(),
            unreported: Vec::new(),
        }
    }

    pub fn from_config(config: &PermsConfig, actor: ActorId) -> Self {
        Self::new(config.export_policy, actor, &config.default_textures)
    }

    pub fn policy(&self) -> ExportPolicy {
        self.policy
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Default textures in effect for this session.
    pub fn defaults(&self) -> &DefaultTextures {
        &self.defaults
    }

    /// The id written in place of a denied texture.
    pub fn fallback(&self) -> AssetId {
        self.defaults.fallback()
    }

    /// Check `id` against the gate rules without touching the cache.
    pub fn allows(&self, id: AssetId, source: &dyn PermissionSource) -> bool {
        if id.is_null() || self.defaults.is_library(id) {
            return true;
        }
        if self.policy == ExportPolicy::Unrestricted {
            return true;
        }
        source
            .asset_permissions(id)
            .iter()
            .any(|perms| perms.allow_export_by(self.actor, self.policy))
    }

    /// Validate one texture id, caching denials.
    pub fn validate(&mut self, id: AssetId, source: &dyn PermissionSource) -> TextureReference {
        if self.denied.contains(&id) {
            return TextureReference::invalid(id);
        }
        if self.allows(id, source) {
            return TextureReference::valid(id);
        }
        debug!(texture = %id, actor = %self.actor, policy = %self.policy, "texture denied");
        self.denied.insert(id);
        self.unreported.push(id);
        TextureReference::invalid(id)
    }

    /// `id` if it passes the gate, the fallback otherwise.
    pub fn substitute(&mut self, id: AssetId, source: &dyn PermissionSource) -> AssetId {
        if self.validate(id, source).valid {
            id
        } else {
            self.fallback()
        }
    }

    /// Denied ids not yet handed out, in denial order.
    pub fn take_denials(&mut self) -> Vec<AssetId> {
        std::mem::take(&mut self.unreported)
    }

    /// Number of distinct ids denied so far.
    pub fn denied_count(&self) -> usize {
        self.denied.len()
    }

    /// Check that one selected primitive may leave the world.
    ///
    /// Mesh primitives are always refused; a sculpted primitive also needs
    /// its sculpt map to pass the texture rules.
    pub fn check_prim(
        &self,
        local_id: LocalId,
        permissions: &PermissionSet,
        sculpt: Option<&SculptParams>,
        source: &dyn PermissionSource,
    ) -> PermsResult<()> {
        if !permissions.allow_export_by(self.actor, self.policy) {
            return Err(PermsError::PrimDenied(local_id));
        }
        match sculpt {
            Some(sculpt) if sculpt.is_mesh() => Err(PermsError::MeshNotExportable(local_id)),
            Some(sculpt) if !self.allows(sculpt.texture, source) => {
                Err(PermsError::SculptDenied {
                    prim: local_id,
                    texture: sculpt.texture,
                })
            }
            _ => Ok(()),
        }
    }
}
