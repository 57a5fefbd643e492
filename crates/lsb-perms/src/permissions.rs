use std::fmt;
use std::ops::{BitAnd, BitOr};

use lsb_types::ActorId;
use serde::{Deserialize, Serialize};

/// Permission bits of one mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMask(pub u32);

impl PermissionMask {
    pub const NONE: PermissionMask = PermissionMask(0);
    pub const TRANSFER: PermissionMask = PermissionMask(1 << 13);
    pub const MODIFY: PermissionMask = PermissionMask(1 << 14);
    pub const COPY: PermissionMask = PermissionMask(1 << 15);
    pub const EXPORT: PermissionMask = PermissionMask(1 << 16);
    pub const MOVE: PermissionMask = PermissionMask(1 << 19);
    /// Modify + copy + transfer.
    pub const UNRESTRICTED: PermissionMask = PermissionMask((1 << 13) | (1 << 14) | (1 << 15));
    pub const ALL: PermissionMask = PermissionMask(0x7fff_ffff);

    /// `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: PermissionMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PermissionMask {
    type Output = PermissionMask;

    fn bitor(self, rhs: PermissionMask) -> PermissionMask {
        PermissionMask(self.0 | rhs.0)
    }
}

impl BitAnd for PermissionMask {
    type Output = PermissionMask;

    fn bitand(self, rhs: PermissionMask) -> PermissionMask {
        PermissionMask(self.0 & rhs.0)
    }
}

impl fmt::Debug for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionMask({:#x})", self.0)
    }
}

/// Permissions of one world item (object or inventory item).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub creator: ActorId,
    pub owner: ActorId,
    pub base: PermissionMask,
    pub owner_mask: PermissionMask,
    pub group: PermissionMask,
    pub everyone: PermissionMask,
    pub next_owner: PermissionMask,
}

impl PermissionSet {
    /// Full permissions for `owner`, created by `creator`.
    pub fn full(creator: ActorId, owner: ActorId) -> Self {
        Self {
            creator,
            owner,
            base: PermissionMask::ALL,
            owner_mask: PermissionMask::ALL,
            group: PermissionMask::NONE,
            everyone: PermissionMask::NONE,
            next_owner: PermissionMask::ALL,
        }
    }

    /// Set the export bit in the everyone mask.
    pub fn with_export_bit(mut self) -> Self {
        self.everyone = self.everyone | PermissionMask::EXPORT;
        self
    }

    /// Whether `actor` may export the item under `policy`.
    ///
    /// Only the owner can ever export; a null actor never can.
    pub fn allow_export_by(&self, actor: ActorId, policy: ExportPolicy) -> bool {
        if actor.is_null() || actor != self.owner {
            return false;
        }
        match policy {
            ExportPolicy::CreatorOnly => self.creator == actor,
            ExportPolicy::ExportBit => self.everyone.contains(PermissionMask::EXPORT),
            ExportPolicy::Unrestricted => {
                self.base.contains(PermissionMask::UNRESTRICTED)
                    && self.owner_mask.contains(PermissionMask::UNRESTRICTED)
            }
        }
    }
}

/// How the current grid decides whether content may leave it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPolicy {
    /// Only content the actor created may be exported.
    #[default]
    CreatorOnly,
    /// Content carrying the export permission bit may be exported.
    ExportBit,
    /// The grid enforces nothing; full-permission content may be exported.
    Unrestricted,
}

impl fmt::Display for ExportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportPolicy::CreatorOnly => "creator-only",
            ExportPolicy::ExportBit => "export-bit",
            ExportPolicy::Unrestricted => "unrestricted",
        };
        f.write_str(name)
    }
}

/// Predicate deciding whether an actor may export an item.
pub trait ExportPredicate {
    fn allows(&self, permissions: &PermissionSet, actor: ActorId) -> bool;
}

impl ExportPredicate for ExportPolicy {
    fn allows(&self, permissions: &PermissionSet, actor: ActorId) -> bool {
        permissions.allow_export_by(actor, *self)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn actor(n: u8) -> ActorId {
        ActorId::from_bytes([n; 16])
    }

    #[test]
    fn creator_only_requires_creator() {
        let me = actor(1);
        let other = actor(2);
        assert!(PermissionSet::full(me, me).allow_export_by(me, ExportPolicy::CreatorOnly));
        assert!(!PermissionSet::full(other, me).allow_export_by(me, ExportPolicy::CreatorOnly));
    }

    #[test]
    fn non_owner_is_always_denied() {
        let me = actor(1);
        let owner = actor(2);
        let perms = PermissionSet::full(me, owner).with_export_bit();
        for policy in [
            ExportPolicy::CreatorOnly,
            ExportPolicy::ExportBit,
            ExportPolicy::Unrestricted,
        ] {
            assert!(!perms.allow_export_by(me, policy), "{policy} allowed a non-owner");
        }
    }

    #[test]
    fn null_actor_is_denied() {
        let perms = PermissionSet::full(ActorId::null(), ActorId::null());
        assert!(!perms.allow_export_by(ActorId::null(), ExportPolicy::Unrestricted));
    }

    #[test]
    fn export_bit_policy_checks_everyone_mask() {
        let me = actor(1);
        let creator = actor(9);
        let perms = PermissionSet::full(creator, me);
        assert!(!perms.allow_export_by(me, ExportPolicy::ExportBit));
        assert!(perms.with_export_bit().allow_export_by(me, ExportPolicy::ExportBit));
    }

    #[test]
    fn unrestricted_policy_needs_full_owner_rights() {
        let me = actor(1);
        let mut perms = PermissionSet::full(actor(9), me);
        assert!(perms.allow_export_by(me, ExportPolicy::Unrestricted));
        perms.owner_mask = PermissionMask::MODIFY | PermissionMask::COPY;
        assert!(!perms.allow_export_by(me, ExportPolicy::Unrestricted));
    }

    #[test]
    fn policy_is_a_predicate() {
        let me = actor(3);
        let predicate: &dyn ExportPredicate = &ExportPolicy::CreatorOnly;
        assert!(predicate.allows(&PermissionSet::full(me, me), me));
    }

    #[test]
    fn policy_serializes_snake_case() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            policy: ExportPolicy,
        }
        let text = toml::to_string(&Wrapper {
            policy: ExportPolicy::ExportBit,
        })
        .unwrap();
        assert!(text.contains("export_bit"));
    }

    fn any_policy() -> impl Strategy<Value = ExportPolicy> {
        prop_oneof![
            Just(ExportPolicy::CreatorOnly),
            Just(ExportPolicy::ExportBit),
            Just(ExportPolicy::Unrestricted),
        ]
    }

    proptest! {
        #[test]
        fn validation_is_idempotent(
            creator in 0u8..3,
            owner in 0u8..3,
            requester in 0u8..3,
            base in any::<u32>(),
            owner_mask in any::<u32>(),
            everyone in any::<u32>(),
            policy in any_policy(),
        ) {
            let perms = PermissionSet {
                creator: actor(creator),
                owner: actor(owner),
                base: PermissionMask(base),
                owner_mask: PermissionMask(owner_mask),
                group: PermissionMask::NONE,
                everyone: PermissionMask(everyone),
                next_owner: PermissionMask::NONE,
            };
            let first = perms.allow_export_by(actor(requester), policy);
            let second = perms.allow_export_by(actor(requester), policy);
            prop_assert_eq!(first, second);
        }
    }
}
