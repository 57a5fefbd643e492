//! On-disk shape of linksets.
//!
//! A linkset is written as `{root_position, root_rotation, prims}` where
//! `prims` is a JSON object keyed by the ephemeral local id. Object key order
//! is the descriptor order, root first.

use std::fmt;

use lsb_types::{LinksetDescriptor, LocalId, PrimitiveRecord, Quat, Vec3};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

struct PrimsRef<'a>(&'a [PrimitiveRecord]);

impl Serialize for PrimsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for prim in self.0 {
            map.serialize_entry(&prim.local_id.to_string(), prim)?;
        }
        map.end()
    }
}

struct Prims(Vec<PrimitiveRecord>);

impl<'de> Deserialize<'de> for Prims {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PrimsVisitor;

        impl<'de> Visitor<'de> for PrimsVisitor {
            type Value = Prims;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of local id to primitive")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Prims, A::Error> {
                let mut prims = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, mut prim)) =
                    access.next_entry::<String, PrimitiveRecord>()?
                {
                    prim.local_id = key.parse::<LocalId>().map_err(de::Error::custom)?;
                    prims.push(prim);
                }
                Ok(Prims(prims))
            }
        }

        deserializer.deserialize_map(PrimsVisitor)
    }
}

#[derive(Serialize)]
struct LinksetRef<'a> {
    root_position: Vec3,
    root_rotation: Quat,
    prims: PrimsRef<'a>,
}

#[derive(Deserialize)]
struct Linkset {
    root_position: Vec3,
    #[serde(default)]
    root_rotation: Quat,
    prims: Prims,
}

/// `serde(with)` adapter for a list of linkset descriptors.
pub(crate) mod linksets {
    use super::*;

    pub fn serialize<S: Serializer>(
        linksets: &[LinksetDescriptor],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(linksets.iter().map(|ls| LinksetRef {
            root_position: ls.root_position,
            root_rotation: ls.root_rotation,
            prims: PrimsRef(&ls.prims),
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<LinksetDescriptor>, D::Error> {
        let raw = Vec::<Linkset>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|ls| LinksetDescriptor::new(ls.root_position, ls.root_rotation, ls.prims.0))
            .collect())
    }
}
