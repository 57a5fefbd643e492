use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use lsb_assets::InMemoryAssetStore;
use lsb_export::{SelectedLinkset, SelectionSource, WorldPrim};
use lsb_perms::{DefaultTextures, PermissionSet, PermissionSource};
use lsb_runtime::{
    AssetUpload, AssetUploadChannel, Completion, CompletionSender, ObjectChannel, Operator,
    OperatorSource, RequestKind, RequestTag, RuntimeError, RuntimeResult, TextureCacheChannel,
};
use lsb_types::{
    AssetId, CacheReadError, CachedTexture, LocalId, ObjectId, ObjectUpdate, PrimAttributes,
    PrimitiveRecord, Quat, Vec3,
};
use tracing::{debug, warn};

use crate::scene::Scene;

/// A request the world received, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum SimRequest {
    TextureRead { tag: RequestTag, asset: AssetId },
    Upload { tag: RequestTag, name: String, size: usize },
    Create { tag: RequestTag, position: Vec3 },
    Update { tag: RequestTag, update: ObjectUpdate },
    Link { tag: RequestTag, objects: Vec<ObjectId> },
}

impl SimRequest {
    pub fn tag(&self) -> RequestTag {
        match self {
            SimRequest::TextureRead { tag, .. }
            | SimRequest::Upload { tag, .. }
            | SimRequest::Create { tag, .. }
            | SimRequest::Update { tag, .. }
            | SimRequest::Link { tag, .. } => *tag,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.tag().kind
    }
}

/// An object that exists in the simulated world.
#[derive(Clone, Debug, PartialEq)]
pub struct SimObject {
    pub id: ObjectId,
    pub position: Vec3,
    pub rotation: Quat,
    pub parent: Option<ObjectId>,
    /// Last attribute set applied, if any.
    pub attributes: Option<PrimAttributes>,
}

#[derive(Debug, Default)]
struct WorldState {
    operator: Option<Operator>,
    selection: Vec<SelectedLinkset>,
    permissions: HashMap<AssetId, Vec<PermissionSet>>,
    cache: HashMap<AssetId, CachedTexture>,
    objects: Vec<SimObject>,
    requests: Vec<SimRequest>,
    next_object: u128,
    failing_uploads: HashSet<String>,
    dropped: HashSet<RequestKind>,
    unsolicited_updates: bool,
    sender: Option<CompletionSender>,
}

impl WorldState {
    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SimObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Post `completion` unless acknowledgments of its kind are dropped.
    fn answer(&self, completion: Completion) -> RuntimeResult<()> {
        if self.dropped.contains(&completion.kind()) {
            debug!(tag = %completion.tag(), "acknowledgment dropped");
            return Ok(());
        }
        match &self.sender {
            Some(sender) => sender.send(completion),
            None => Err(RuntimeError::QueueClosed),
        }
    }
}

/// An in-memory world that answers every collaborator request through the
/// client's event queue.
///
/// Clones share the same world. Every request is recorded. Faults can be
/// injected per upload or per acknowledgment kind.
#[derive(Clone, Debug)]
pub struct MemoryWorld {
    state: Arc<Mutex<WorldState>>,
    assets: Arc<InMemoryAssetStore>,
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorld {
    /// An empty world whose cache and asset store hold the library
    /// textures.
    pub fn new() -> Self {
        let world = Self {
            state: Arc::new(Mutex::new(WorldState::default())),
            assets: Arc::new(InMemoryAssetStore::new()),
        };
        let library = DefaultTextures::default();
        for id in [
            library.plywood,
            library.blank,
            library.invisible,
            library.transparent,
            library.media,
        ] {
            let data = Bytes::from(id.to_string().into_bytes());
            world.assets.insert(id, data.clone());
            world.cache_texture(id, CachedTexture::j2c(data));
        }
        world
    }

    /// A world holding everything `scene` describes, with the scene's
    /// linksets selected.
    pub fn from_scene(scene: &Scene) -> Self {
        let world = Self::new();
        let owner = scene.operator.id;
        world.set_operator(Operator {
            id: owner,
            position: scene.operator.position,
            rotation: scene.operator.rotation,
        });
        for texture in &scene.textures {
            let permissions = texture
                .permissions
                .clone()
                .unwrap_or_else(|| PermissionSet::full(owner, owner));
            world.grant(texture.id, permissions);
            if let Some(data) = &texture.data {
                world.cache_texture(texture.id, CachedTexture::new(texture.codec, data.clone()));
            }
        }
        world.select(scene.selection());
        world
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WorldState> {
        self.state.lock().expect("lock poisoned")
    }

    /// Deliver completions to `sender`, normally the client's event queue.
    pub fn connect(&self, sender: CompletionSender) {
        self.lock().sender = Some(sender);
    }

    pub fn set_operator(&self, operator: Operator) {
        self.lock().operator = Some(operator);
    }

    pub fn select(&self, selection: Vec<SelectedLinkset>) {
        self.lock().selection = selection;
    }

    /// Add an inventory permission record for `asset`.
    pub fn grant(&self, asset: AssetId, permissions: PermissionSet) {
        self.lock()
            .permissions
            .entry(asset)
            .or_default()
            .push(permissions);
    }

    pub fn cache_texture(&self, asset: AssetId, texture: CachedTexture) {
        self.lock().cache.insert(asset, texture);
    }

    /// Reject the upload of the companion image exported from `source`.
    pub fn fail_upload(&self, source: AssetId) {
        self.lock().failing_uploads.insert(source.to_string());
    }

    /// Record requests of `kind` but never answer them.
    pub fn drop_acks(&self, kind: RequestKind) {
        self.lock().dropped.insert(kind);
    }

    /// Answer requests of `kind` again.
    pub fn restore_acks(&self, kind: RequestKind) {
        self.lock().dropped.remove(&kind);
    }

    /// Precede every update acknowledgment with one for an unrelated object.
    pub fn emit_unsolicited_updates(&self, enabled: bool) {
        self.lock().unsolicited_updates = enabled;
    }

    /// Post an arbitrary completion, e.g. a late answer to an old session.
    pub fn post(&self, completion: Completion) -> RuntimeResult<()> {
        self.lock().answer(completion)
    }

    pub fn requests(&self) -> Vec<SimRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self, kind: RequestKind) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.kind() == kind)
            .count()
    }

    /// Every object, in creation order.
    pub fn objects(&self) -> Vec<SimObject> {
        self.lock().objects.clone()
    }

    pub fn object(&self, id: ObjectId) -> Option<SimObject> {
        self.lock().objects.iter().find(|o| o.id == id).cloned()
    }

    /// Stored asset bytes.
    pub fn asset(&self, id: AssetId) -> Option<Bytes> {
        self.assets.get(id).ok()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// The linkset rooted at `root` as the world would report it when
    /// selected. Local ids follow creation order, starting at 1.
    pub fn linkset_of(&self, root: ObjectId) -> Option<SelectedLinkset> {
        let state = self.lock();
        let owner = state.operator.map(|o| o.id).unwrap_or_default();
        let permissions = PermissionSet::full(owner, owner);
        let root_object = state.objects.iter().find(|o| o.id == root)?;
        let mut linkset = SelectedLinkset::new(world_prim(root_object, 1, &permissions));
        let children = state.objects.iter().filter(|o| o.parent == Some(root));
        for (n, child) in children.enumerate() {
            linkset = linkset.with_child(world_prim(child, n as u32 + 2, &permissions));
        }
        Some(linkset)
    }
}

fn world_prim(object: &SimObject, local_id: u32, permissions: &PermissionSet) -> WorldPrim {
    let mut record = PrimitiveRecord::new(LocalId(local_id), "Object");
    if let Some(attrs) = &object.attributes {
        record.name = attrs.name.clone();
        record.description = attrs.description.clone();
        record.scale = attrs.scale;
        record.volume = attrs.volume.clone();
        record.flags = attrs.flags;
        record.material = attrs.material;
        record.click_action = attrs.click_action;
        record.light = attrs.light.clone();
        record.light_image = attrs.light_image.clone();
        record.flexible = attrs.flexible.clone();
        record.sculpt = attrs.sculpt.clone();
        record.faces = attrs.faces.clone();
    }
    WorldPrim {
        permissions: permissions.clone(),
        position: object.position,
        rotation: object.rotation,
        record,
    }
}

// ---------------------------------------------------------------------------
// Collaborator implementations
// ---------------------------------------------------------------------------

impl SelectionSource for MemoryWorld {
    fn selected_linksets(&self) -> Vec<SelectedLinkset> {
        self.lock().selection.clone()
    }
}

impl PermissionSource for MemoryWorld {
    fn asset_permissions(&self, asset: AssetId) -> Vec<PermissionSet> {
        self.lock()
            .permissions
            .get(&asset)
            .cloned()
            .unwrap_or_default()
    }
}

impl OperatorSource for MemoryWorld {
    fn operator(&self) -> Operator {
        self.lock().operator.unwrap_or(Operator {
            id: Default::default(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        })
    }
}

impl TextureCacheChannel for MemoryWorld {
    fn read_texture(&self, tag: RequestTag, id: AssetId) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.requests.push(SimRequest::TextureRead { tag, asset: id });
        let result = state
            .cache
            .get(&id)
            .cloned()
            .ok_or(CacheReadError::NotFound(id));
        state.answer(Completion::TextureRead {
            tag,
            asset: id,
            result,
        })
    }
}

impl AssetUploadChannel for MemoryWorld {
    fn upload(&self, tag: RequestTag, upload: AssetUpload) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.requests.push(SimRequest::Upload {
            tag,
            name: upload.name.clone(),
            size: upload.data.len(),
        });
        let result = if state.failing_uploads.contains(&upload.name) {
            warn!(name = %upload.name, "upload rejected");
            Err("upload rejected by asset server".to_string())
        } else {
            self.assets.put(upload.data).map_err(|e| e.to_string())
        };
        state.answer(Completion::AssetStored { tag, result })
    }
}

impl ObjectChannel for MemoryWorld {
    fn create_object(&self, tag: RequestTag, position: Vec3) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.requests.push(SimRequest::Create { tag, position });
        state.next_object += 1;
        let id = ObjectId::from_u128(0x0b1e_c700_0000 + state.next_object);
        state.objects.push(SimObject {
            id,
            position,
            rotation: Quat::IDENTITY,
            parent: None,
            attributes: None,
        });
        debug!(object = %id, "object created");
        state.answer(Completion::ObjectCreated { tag, object: id })
    }

    fn update_object(&self, tag: RequestTag, update: ObjectUpdate) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.requests.push(SimRequest::Update {
            tag,
            update: update.clone(),
        });
        let id = update.object();
        let Some(object) = state.object_mut(id) else {
            warn!(object = %id, "update for unknown object");
            return Ok(());
        };
        match update {
            ObjectUpdate::Attributes { attributes, .. } => {
                object.position = attributes.position;
                object.rotation = attributes.rotation;
                object.attributes = Some(*attributes);
            }
            ObjectUpdate::Rotation { rotation, .. } => object.rotation = rotation,
        }
        if state.unsolicited_updates {
            state.answer(Completion::ObjectUpdated {
                tag,
                object: ObjectId::random(),
            })?;
        }
        state.answer(Completion::ObjectUpdated { tag, object: id })
    }

    fn link_objects(&self, tag: RequestTag, objects: Vec<ObjectId>) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.requests.push(SimRequest::Link {
            tag,
            objects: objects.clone(),
        });
        let Some(&root) = objects.last() else {
            warn!("link with no objects");
            return Ok(());
        };
        for id in &objects[..objects.len() - 1] {
            if let Some(child) = state.object_mut(*id) {
                child.parent = Some(root);
            }
        }
        // Linking leaves the new root unrotated.
        if let Some(root_object) = state.object_mut(root) {
            root_object.rotation = Quat::IDENTITY;
        }
        state.answer(Completion::ObjectsLinked { tag, root })
    }
}
