use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $short:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// The null identifier (all zeros).
            pub const fn null() -> Self {
                Self(Uuid::nil())
            }

            /// Returns `true` if this is the null identifier.
            pub fn is_null(&self) -> bool {
                self.0.is_nil()
            }

            /// A fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Build an identifier from 16 raw bytes.
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            /// Build an identifier from its 128-bit big-endian value.
            pub const fn from_u128(value: u128) -> Self {
                Self(Uuid::from_u128(value))
            }

            /// The wrapped UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse the hyphenated (or simple) UUID text form.
            pub fn parse(s: &str) -> Result<Self, TypeError> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId {
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }

            /// First eight hex characters, for log lines.
            pub fn short(&self) -> String {
                let mut text = self.0.simple().to_string();
                text.truncate(8);
                text
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::null()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($short, "({})"), self.short())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a world asset (texture, sculpt map, normal map...).
    ///
    /// Asset ids are grid-scoped: the same image uploaded to another grid
    /// receives a different id, which is why imports keep a remap table.
    AssetId,
    "AssetId"
);

uuid_identifier!(
    /// Server-assigned identifier of an object that exists in the world.
    ObjectId,
    "ObjectId"
);

uuid_identifier!(
    /// Identity of an avatar acting on objects (owner, creator, operator).
    ActorId,
    "ActorId"
);

/// Ephemeral, document-scoped primitive identifier.
///
/// Local ids only express parent/child relationships inside one backup
/// document. They are never sent to the world and carry no meaning across
/// documents. In the document they appear as decimal strings.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LocalId(pub u32);

impl LocalId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.0)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(LocalId)
            .map_err(|e| TypeError::InvalidId {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<LocalId> for String {
    fn from(id: LocalId) -> Self {
        id.0.to_string()
    }
}

impl TryFrom<String> for LocalId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
