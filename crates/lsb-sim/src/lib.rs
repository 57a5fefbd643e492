//! Simulated world for the linkset backup engine.
//!
//! [`MemoryWorld`] stands in for a live region: it holds a selection, the
//! inventory permissions and cached images of textures, an asset store and
//! the objects an import creates. Every request is answered through the
//! client's event queue, so sessions run exactly as they would against a
//! real world.
//!
//! Scenes are loaded from JSON (see [`Scene`]).

pub mod error;
pub mod scene;
pub mod world;

pub use error::{SimError, SimResult};
pub use scene::{Scene, SceneLinkset, SceneOperator, ScenePrim, SceneTexture};
pub use world::{MemoryWorld, SimObject, SimRequest};
