use lsb_assets::{AssetIdRemap, Reuploader};
use lsb_document::{BackupDocument, BackupStore};
use lsb_perms::DefaultTextures;
use lsb_runtime::{
    AssetUploadChannel, Completion, Counters, Dispatcher, Generation, ObjectChannel, Operation,
    OperatorSource, Outcome, PartialFailures, Phase, ProgressReport, ProgressSink, Resolution,
};
use lsb_types::{LinksetDescriptor, ObjectId, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::apply::AttributeApplier;
use crate::assemble::LinksetAssembler;
use crate::error::ImportError;
use crate::placement::{root_placement, Placement, PlacementOptions};
use crate::rez::RezSequencer;

/// Everything an import needs from the world.
pub trait ImportWorld: AssetUploadChannel + ObjectChannel + OperatorSource {}

impl<T: AssetUploadChannel + ObjectChannel + OperatorSource> ImportWorld for T {}

/// Settings of one import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Upload companion images and rewrite faces to the new ids. When off,
    /// faces keep their recorded ids.
    pub reupload_textures: bool,
    #[serde(flatten)]
    pub placement: PlacementOptions,
    /// Library textures are never uploaded.
    pub default_textures: DefaultTextures,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            reupload_textures: true,
            placement: PlacementOptions::default(),
            default_textures: DefaultTextures::default(),
        }
    }
}

/// One import: PARSE -> REUPLOAD -> (REZ -> APPLY -> ASSEMBLE) per linkset
/// -> DONE, or FAILED when the document cannot be read.
///
/// Every stage keeps a single request in flight; each matching completion
/// moves the session one request further.
pub struct ImportSession {
    dispatcher: Dispatcher,
    phase: Phase,
    options: ImportOptions,
    store: Box<dyn BackupStore>,
    document: Option<BackupDocument>,
    operator: Placement,
    uploader: Reuploader,
    index: usize,
    root: Option<Placement>,
    rez: RezSequencer,
    applier: AttributeApplier,
    assembler: LinksetAssembler,
    created: Vec<ObjectId>,
    failures: PartialFailures,
    outcome: Option<Outcome>,
}

impl ImportSession {
    pub fn new(generation: Generation, options: ImportOptions, store: Box<dyn BackupStore>) -> Self {
        Self {
            dispatcher: Dispatcher::new(generation),
            phase: Phase::Parse,
            options,
            store,
            document: None,
            operator: Placement::new(Vec3::ZERO, Quat::IDENTITY),
            uploader: Reuploader::default(),
            index: 0,
            root: None,
            rez: RezSequencer::new(Vec3::ZERO, 0),
            applier: AttributeApplier::new(),
            assembler: LinksetAssembler::new(),
            created: Vec::new(),
            failures: PartialFailures::new(),
            outcome: None,
        }
    }

    pub fn generation(&self) -> Generation {
        self.dispatcher.generation()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn failures(&self) -> &PartialFailures {
        &self.failures
    }

    /// The parsed document, once PARSE succeeded.
    pub fn document(&self) -> Option<&BackupDocument> {
        self.document.as_ref()
    }

    /// Source-to-destination ids of the textures uploaded so far.
    pub fn remap(&self) -> &AssetIdRemap {
        self.uploader.remap()
    }

    /// Objects of every fully assembled linkset, in creation order.
    pub fn created_objects(&self) -> &[ObjectId] {
        &self.created
    }

    /// Parse the document and issue the first request.
    pub fn start<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        info!(
            generation = %self.generation(),
            reupload = self.options.reupload_textures,
            "import started"
        );
        self.enter(Phase::Parse, progress);
        let document = match self.store.read_document() {
            Ok(document) => document,
            Err(e) => {
                self.fail(e.into(), progress);
                return;
            }
        };
        info!(
            linksets = document.linksets.len(),
            prims = document.prim_count(),
            "document parsed"
        );
        let operator = world.operator();
        self.operator = Placement::new(operator.position, operator.rotation);

        if self.options.reupload_textures {
            let defaults = &self.options.default_textures;
            let ids: Vec<_> = document
                .referenced_assets()
                .into_iter()
                .filter(|id| defaults.is_uploaded(*id))
                .collect();
            self.uploader = Reuploader::new(ids);
            self.document = Some(document);
            self.enter(Phase::Reupload, progress);
            self.next_upload(world, progress);
        } else {
            self.document = Some(document);
            self.begin_linkset(world, progress);
        }
    }

    /// Feed a completion to the session. Completions of other generations,
    /// that nothing is waiting for, or that name another object are dropped.
    pub fn on_completion<W: ImportWorld>(
        &mut self,
        completion: Completion,
        world: &W,
        progress: &dyn ProgressSink,
    ) {
        if self.is_finished() {
            debug!(tag = %completion.tag(), "import finished, completion dropped");
            return;
        }
        if self.dispatcher.resolve(completion.tag(), completion.subject()) != Resolution::Matched {
            return;
        }
        match completion {
            Completion::AssetStored { result, .. } => {
                self.uploader.complete(result, &mut self.failures);
                self.next_upload(world, progress);
            }
            Completion::ObjectCreated { object, .. } => {
                self.rez.confirm(object);
                self.next_rez(world, progress);
            }
            Completion::ObjectUpdated { object, .. } => match self.phase {
                Phase::Apply => {
                    self.applier.acknowledge(object);
                    self.next_apply(world, progress);
                }
                Phase::Assemble => {
                    if self.assembler.rotated(object) {
                        self.finish_linkset(world, progress);
                    }
                }
                phase => debug!(object = %object, phase = %phase, "update acknowledged"),
            },
            Completion::ObjectsLinked { root, .. } => self.on_linked(root, world, progress),
            other => debug!(tag = %other.tag(), "import has no use for this completion"),
        }
    }

    fn next_upload<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        let sent = self.uploader.advance(
            &mut self.dispatcher,
            world,
            self.store.as_ref(),
            &mut self.failures,
        );
        match sent {
            Ok(true) => self.report(progress),
            Ok(false) => {
                info!(mapped = self.uploader.remap().len(), "textures uploaded");
                self.begin_linkset(world, progress);
            }
            Err(e) => self.fail(e.into(), progress),
        }
    }

    fn begin_linkset<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        let Some(document) = self.document.as_ref() else {
            return;
        };
        let Some(linkset) = document.linksets.get(self.index) else {
            self.finish(progress);
            return;
        };
        let Some(root) = linkset.root() else {
            let index = self.index;
            self.fail(ImportError::NoRoot { linkset: index }, progress);
            return;
        };
        let placement = root_placement(
            self.operator,
            &self.options.placement,
            document.origin(),
            linkset,
            root,
        );
        let prims = linkset.len();
        let rez_at = self.operator.offset(self.options.placement.rez_offset);

        info!(linkset = self.index + 1, prims, "linkset started");
        self.root = Some(placement);
        self.rez = RezSequencer::new(rez_at, prims);
        self.applier = AttributeApplier::new();
        self.assembler = LinksetAssembler::new();
        self.enter(Phase::Rez, progress);
        self.next_rez(world, progress);
    }

    fn next_rez<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        match self.rez.request_next(&mut self.dispatcher, world) {
            Ok(true) => self.report(progress),
            Ok(false) => {
                self.enter(Phase::Apply, progress);
                self.next_apply(world, progress);
            }
            Err(e) => self.fail(e.into(), progress),
        }
    }

    fn next_apply<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        let linkset = self
            .document
            .as_ref()
            .and_then(|d| d.linksets.get(self.index));
        let (Some(linkset), Some(root)) = (linkset, self.root) else {
            return;
        };
        let sent = self.applier.apply_next(
            &mut self.dispatcher,
            world,
            linkset,
            self.rez.objects(),
            root,
            self.uploader.remap(),
        );
        match sent {
            Ok(true) => self.report(progress),
            Ok(false) => self.begin_assembly(world, progress),
            Err(e) => self.fail(e.into(), progress),
        }
    }

    fn begin_assembly<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        self.enter(Phase::Assemble, progress);
        match self
            .assembler
            .start(&mut self.dispatcher, world, self.rez.objects())
        {
            Ok(()) if self.assembler.is_done() => self.finish_linkset(world, progress),
            Ok(()) => {}
            Err(e) => self.fail(e.into(), progress),
        }
    }

    fn on_linked<W: ImportWorld>(&mut self, root: ObjectId, world: &W, progress: &dyn ProgressSink) {
        let Some(placement) = self.root else {
            return;
        };
        debug!(root = %root, "objects linked");
        if let Err(e) = self
            .assembler
            .linked(&mut self.dispatcher, world, root, placement.rotation)
        {
            self.fail(e.into(), progress);
        }
    }

    fn finish_linkset<W: ImportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        self.created.extend_from_slice(self.rez.objects());
        info!(linkset = self.index + 1, objects = self.rez.rezzed(), "linkset assembled");
        self.index += 1;
        self.begin_linkset(world, progress);
    }

    fn current_linkset(&self) -> Option<&LinksetDescriptor> {
        self.document.as_ref()?.linksets.get(self.index)
    }

    fn finish(&mut self, progress: &dyn ProgressSink) {
        for line in self.failures.summary() {
            warn!("import partial failure: {line}");
        }
        let outcome = Outcome::from_failures(self.failures.clone());
        info!(generation = %self.generation(), objects = self.created.len(), "import {outcome}");
        self.enter(Phase::Done, progress);
        progress.finished(Operation::Import, &outcome);
        self.outcome = Some(outcome);
    }

    fn fail(&mut self, error: ImportError, progress: &dyn ProgressSink) {
        warn!(generation = %self.generation(), error = %error, "import failed");
        self.dispatcher.clear();
        self.enter(Phase::Failed, progress);
        let outcome = Outcome::Failed(error.to_string());
        progress.finished(Operation::Import, &outcome);
        self.outcome = Some(outcome);
    }

    fn enter(&mut self, phase: Phase, progress: &dyn ProgressSink) {
        debug!(from = %self.phase, to = %phase, "import phase");
        self.phase = phase;
        self.report(progress);
    }

    fn report(&self, progress: &dyn ProgressSink) {
        let linksets = self.document.as_ref().map_or(0, |d| d.linksets.len());
        progress.report(&ProgressReport {
            operation: Operation::Import,
            phase: self.phase,
            counters: Counters {
                textures_remaining: self.uploader.remaining(),
                linkset: (self.index + 1).min(linksets),
                linksets,
                rezzed: self.rez.rezzed(),
                built: self.applier.applied(),
                prims: self.current_linkset().map_or(0, LinksetDescriptor::len),
            },
        });
    }
}

impl std::fmt::Debug for ImportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSession")
            .field("generation", &self.generation())
            .field("phase", &self.phase)
            .field("linkset", &self.index)
            .field("failures", &self.failures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use lsb_document::MemoryBackup;
    use lsb_runtime::{
        AssetUpload, Operator, PartialFailureKind, RecordingProgress, RequestKind, RequestTag,
        RuntimeResult,
    };
    use lsb_types::{ActorId, AssetId, LocalId, ObjectUpdate, PrimitiveRecord, TextureEntry};

    use super::*;

    fn asset(n: u8) -> AssetId {
        AssetId::from_bytes([n; 16])
    }

    #[derive(Clone, Debug)]
    enum Request {
        Upload(RequestTag, AssetUpload),
        Create(RequestTag, Vec3),
        Update(RequestTag, ObjectUpdate),
        Link(RequestTag, Vec<ObjectId>),
    }

    #[derive(Default)]
    struct World {
        requests: RefCell<Vec<Request>>,
        next_object: Cell<u8>,
        reject_uploads: bool,
    }

    impl AssetUploadChannel for World {
        fn upload(&self, tag: RequestTag, upload: AssetUpload) -> RuntimeResult<()> {
            self.requests.borrow_mut().push(Request::Upload(tag, upload));
            Ok(())
        }
    }

    impl ObjectChannel for World {
        fn create_object(&self, tag: RequestTag, position: Vec3) -> RuntimeResult<()> {
            self.requests.borrow_mut().push(Request::Create(tag, position));
            Ok(())
        }

        fn update_object(&self, tag: RequestTag, update: ObjectUpdate) -> RuntimeResult<()> {
            self.requests.borrow_mut().push(Request::Update(tag, update));
            Ok(())
        }

        fn link_objects(&self, tag: RequestTag, objects: Vec<ObjectId>) -> RuntimeResult<()> {
            self.requests.borrow_mut().push(Request::Link(tag, objects));
            Ok(())
        }
    }

    impl OperatorSource for World {
        fn operator(&self) -> Operator {
            Operator {
                id: ActorId::from_bytes([1; 16]),
                position: Vec3::new(50.0, 50.0, 20.0),
                rotation: Quat::IDENTITY,
            }
        }
    }

    impl World {
        /// Answer the last request the way the world would.
        fn answer(&self) -> Completion {
            let last = self.requests.borrow().last().cloned().unwrap();
            match last {
                Request::Upload(tag, upload) => {
                    let result = if self.reject_uploads {
                        Err("asset server refused".to_string())
                    } else {
                        Ok(AssetId::from_bytes([upload.data[0].wrapping_add(100); 16]))
                    };
                    Completion::AssetStored { tag, result }
                }
                Request::Create(tag, _) => {
                    let n = self.next_object.get() + 1;
                    self.next_object.set(n);
                    Completion::ObjectCreated {
                        tag,
                        object: ObjectId::from_bytes([n; 16]),
                    }
                }
                Request::Update(tag, update) => Completion::ObjectUpdated {
                    tag,
                    object: update.object(),
                },
                Request::Link(tag, objects) => Completion::ObjectsLinked {
                    tag,
                    root: *objects.last().unwrap(),
                },
            }
        }

        fn count(&self, f: impl Fn(&Request) -> bool) -> usize {
            self.requests.borrow().iter().filter(|r| f(r)).count()
        }
    }

    fn two_prim_document() -> BackupDocument {
        let mut root = PrimitiveRecord::new(LocalId(1), "base");
        root.position = Vec3::new(100.0, 100.0, 25.0);
        root.faces = vec![TextureEntry::new(asset(1))];
        let mut child = PrimitiveRecord::new(LocalId(2), "lid");
        child.parent = Some(LocalId(1));
        child.position = Vec3::new(0.0, 0.0, 0.5);
        child.faces = vec![
            TextureEntry::new(asset(2)),
            TextureEntry::new(DefaultTextures::default().plywood),
        ];
        BackupDocument::new(vec![LinksetDescriptor::new(
            root.position,
            Quat::IDENTITY,
            vec![root, child],
        )])
    }

    fn session(backup: &MemoryBackup, reupload: bool) -> ImportSession {
        let options = ImportOptions {
            reupload_textures: reupload,
            ..ImportOptions::default()
        };
        ImportSession::new(Generation::new(1), options, Box::new(backup.clone()))
    }

    fn run(session: &mut ImportSession, world: &World, progress: &RecordingProgress) {
        session.start(world, progress);
        while !session.is_finished() {
            session.on_completion(world.answer(), world, progress);
        }
    }

    fn attribute_updates(world: &World) -> Vec<ObjectUpdate> {
        world
            .requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Request::Update(_, u @ ObjectUpdate::Attributes { .. }) => Some(u.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unreadable_document_fails_in_parse() {
        let backup = MemoryBackup::with_text("{ definitely not a backup");
        let world = World::default();
        let progress = RecordingProgress::new();
        let mut s = session(&backup, true);
        s.start(&world, &progress);
        assert_eq!(s.phase(), Phase::Failed);
        assert!(matches!(s.outcome(), Some(Outcome::Failed(reason)) if reason.contains("backup")));
        assert_eq!(progress.phases(Operation::Import), vec![Phase::Parse, Phase::Failed]);
        assert!(world.requests.borrow().is_empty());
    }

    #[test]
    fn builds_linkset_without_reupload() {
        let backup = MemoryBackup::with_document(&two_prim_document()).unwrap();
        let world = World::default();
        let progress = RecordingProgress::new();
        let mut s = session(&backup, false);
        run(&mut s, &world, &progress);

        assert_eq!(s.outcome(), Some(&Outcome::Success));
        assert_eq!(world.count(|r| matches!(r, Request::Upload(..))), 0);
        assert_eq!(world.count(|r| matches!(r, Request::Create(..))), 2);
        let updates = attribute_updates(&world);
        assert_eq!(updates.len(), 2);
        let objects = [ObjectId::from_bytes([1; 16]), ObjectId::from_bytes([2; 16])];
        assert_eq!(updates[0].object(), objects[0]);
        assert_eq!(updates[1].object(), objects[1]);

        let links: Vec<Vec<ObjectId>> = world
            .requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Request::Link(_, objects) => Some(objects.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(links, vec![vec![objects[1], objects[0]]]);
        assert!(matches!(
            world.requests.borrow().last(),
            Some(Request::Update(_, ObjectUpdate::Rotation { object, .. })) if *object == objects[0]
        ));
        assert_eq!(s.created_objects(), &objects);
        assert_eq!(
            progress.phases(Operation::Import),
            vec![Phase::Parse, Phase::Rez, Phase::Apply, Phase::Assemble, Phase::Done]
        );
    }

    #[test]
    fn placement_follows_operator() {
        let backup = MemoryBackup::with_document(&two_prim_document()).unwrap();
        let world = World::default();
        let mut s = session(&backup, false);
        run(&mut s, &world, &RecordingProgress::new());

        let creates: Vec<Vec3> = world
            .requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Request::Create(_, at) => Some(*at),
                _ => None,
            })
            .collect();
        assert!(creates
            .iter()
            .all(|at| at.approx_eq(Vec3::new(50.0, 52.0, 20.0), 1e-5)));

        let updates = attribute_updates(&world);
        let position = |u: &ObjectUpdate| match u {
            ObjectUpdate::Attributes { attributes, .. } => attributes.position,
            _ => unreachable!(),
        };
        assert!(position(&updates[0]).approx_eq(Vec3::new(52.0, 50.0, 20.0), 1e-5));
        assert!(position(&updates[1]).approx_eq(Vec3::new(52.0, 50.0, 20.5), 1e-5));
    }

    #[test]
    fn reupload_rewrites_faces_and_skips_library_textures() {
        let backup = MemoryBackup::with_document(&two_prim_document()).unwrap();
        backup.insert_texture(asset(1), vec![1u8, 1, 1]);
        let world = World::default();
        let mut s = session(&backup, true);
        run(&mut s, &world, &RecordingProgress::new());

        // asset(2) has no companion image; plywood is never uploaded.
        assert_eq!(world.count(|r| matches!(r, Request::Upload(..))), 1);
        let failures = s.outcome().and_then(Outcome::failures).unwrap();
        assert_eq!(failures.count(PartialFailureKind::CompanionMissing), 1);
        assert_eq!(s.remap().get(asset(1)), Some(asset(101)));

        let updates = attribute_updates(&world);
        let faces = |u: &ObjectUpdate| match u {
            ObjectUpdate::Attributes { attributes, .. } => attributes.faces.clone(),
            _ => unreachable!(),
        };
        assert_eq!(faces(&updates[0])[0].texture, asset(101));
        assert_eq!(faces(&updates[1])[0].texture, asset(2));
        assert_eq!(faces(&updates[1])[1].texture, DefaultTextures::default().plywood);
    }

    #[test]
    fn rejected_upload_leaves_texture_unmapped() {
        let backup = MemoryBackup::with_document(&two_prim_document()).unwrap();
        backup.insert_texture(asset(1), vec![1u8]);
        backup.insert_texture(asset(2), vec![2u8]);
        let world = World {
            reject_uploads: true,
            ..World::default()
        };
        let mut s = session(&backup, true);
        run(&mut s, &world, &RecordingProgress::new());

        let failures = s.outcome().and_then(Outcome::failures).unwrap();
        assert_eq!(failures.count(PartialFailureKind::UploadFailed), 2);
        assert!(s.remap().is_empty());
        assert_eq!(s.phase(), Phase::Done);
    }

    #[test]
    fn acknowledgment_for_another_object_is_ignored() {
        let backup = MemoryBackup::with_document(&two_prim_document()).unwrap();
        let world = World::default();
        let progress = RecordingProgress::new();
        let mut s = session(&backup, false);
        s.start(&world, &progress);
        s.on_completion(world.answer(), &world, &progress);
        s.on_completion(world.answer(), &world, &progress);
        assert_eq!(s.phase(), Phase::Apply);

        let Some(Request::Update(tag, _)) = world.requests.borrow().last().cloned() else {
            panic!("expected an update");
        };
        let requests = world.requests.borrow().len();
        let stray = Completion::ObjectUpdated {
            tag,
            object: ObjectId::from_bytes([9; 16]),
        };
        s.on_completion(stray, &world, &progress);
        assert_eq!(world.requests.borrow().len(), requests);
        assert!(s.dispatcher.is_pending(RequestKind::ObjectUpdate));

        s.on_completion(world.answer(), &world, &progress);
        assert_eq!(world.requests.borrow().len(), requests + 1);
    }

    #[test]
    fn single_prim_linksets_are_not_linked() {
        let first = LinksetDescriptor::new(
            Vec3::new(10.0, 10.0, 10.0),
            Quat::IDENTITY,
            vec![PrimitiveRecord::new(LocalId(1), "a")],
        );
        let second = LinksetDescriptor::new(
            Vec3::new(12.0, 10.0, 10.0),
            Quat::IDENTITY,
            vec![PrimitiveRecord::new(LocalId(2), "b")],
        );
        let backup = MemoryBackup::with_document(&BackupDocument::new(vec![first, second])).unwrap();
        let world = World::default();
        let mut s = session(&backup, false);
        run(&mut s, &world, &RecordingProgress::new());

        assert_eq!(s.outcome(), Some(&Outcome::Success));
        assert_eq!(world.count(|r| matches!(r, Request::Link(..))), 0);
        assert_eq!(s.created_objects().len(), 2);
    }
}
