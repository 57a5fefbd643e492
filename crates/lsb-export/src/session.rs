use std::collections::VecDeque;

use lsb_assets::{TextureCacheReader, TextureFetch};
use lsb_document::{BackupDocument, BackupStore};
use lsb_perms::{PermissionSource, PermsConfig, TextureGate};
use lsb_runtime::{
    Completion, Counters, Dispatcher, Generation, Operation, Outcome, PartialFailureKind,
    PartialFailures, Phase, ProgressReport, ProgressSink, Resolution, TextureCacheChannel,
};
use lsb_types::{ActorId, AssetId, LinksetDescriptor};
use tracing::{debug, info, warn};

use crate::error::{ExportError, ExportResult};
use crate::selection::SelectionSource;
use crate::serializer::PrimSerializer;

/// Everything an export needs from the world.
pub trait ExportWorld: SelectionSource + PermissionSource + TextureCacheChannel {}

impl<T: SelectionSource + PermissionSource + TextureCacheChannel> ExportWorld for T {}

/// Settings of one export.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    pub perms: PermsConfig,
    /// Stored in the document metadata.
    pub document_name: Option<String>,
    pub grid_name: Option<String>,
}

/// One export: INIT -> STRUCTURE -> DOCUMENT -> TEXTURES -> DONE, or FAILED.
///
/// [`ExportSession::start`] runs synchronously up to the first texture read;
/// each texture completion then advances the session by one read.
pub struct ExportSession {
    dispatcher: Dispatcher,
    phase: Phase,
    options: ExportOptions,
    gate: TextureGate,
    store: Box<dyn BackupStore>,
    linksets: Vec<LinksetDescriptor>,
    textures: VecDeque<AssetId>,
    reader: TextureCacheReader,
    written: Vec<AssetId>,
    failures: PartialFailures,
    outcome: Option<Outcome>,
}

impl ExportSession {
    pub fn new(
        generation: Generation,
        options: ExportOptions,
        actor: ActorId,
        store: Box<dyn BackupStore>,
    ) -> Self {
        let gate = TextureGate::from_config(&options.perms, actor);
        Self {
            dispatcher: Dispatcher::new(generation),
            phase: Phase::Init,
            options,
            gate,
            store,
            linksets: Vec::new(),
            textures: VecDeque::new(),
            reader: TextureCacheReader::new(),
            written: Vec::new(),
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

    /// Descriptors built during STRUCTURE.
    pub fn linksets(&self) -> &[LinksetDescriptor] {
        &self.linksets
    }

    /// Textures whose companion image was written.
    pub fn written_textures(&self) -> &[AssetId] {
        &self.written
    }

    pub fn failures(&self) -> &PartialFailures {
        &self.failures
    }

    /// Run INIT, STRUCTURE and DOCUMENT, then issue the first texture read.
    pub fn start<W: ExportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        info!(generation = %self.generation(), policy = %self.gate.policy(), "export started");
        self.enter(Phase::Init, progress);
        if let Err(e) = self.build(world, progress) {
            self.fail(e, progress);
            return;
        }
        self.enter(Phase::Textures, progress);
        self.next_texture(world, progress);
    }

    fn build<W: ExportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) -> ExportResult<()> {
        let selection = world.selected_linksets();
        if selection.is_empty() {
            return Err(ExportError::NothingSelected);
        }
        for linkset in &selection {
            for prim in linkset.prims() {
                self.gate.check_prim(
                    prim.record.local_id,
                    &prim.permissions,
                    prim.record.sculpt.as_ref(),
                    world,
                )?;
            }
        }

        self.enter(Phase::Structure, progress);
        let mut serializer = PrimSerializer::new();
        for linkset in &selection {
            let descriptor = serializer.serialize_linkset(linkset, &mut self.gate, world);
            self.linksets.push(descriptor);
        }
        for denied in self.gate.take_denials() {
            self.failures.record(PartialFailureKind::BadPermission, denied);
        }
        self.textures = serializer.into_textures().into();

        self.enter(Phase::Document, progress);
        let mut document = BackupDocument::new(self.linksets.clone());
        if let Some(name) = &self.options.document_name {
            document = document.with_name(name.clone());
        }
        if let Some(grid) = &self.options.grid_name {
            document = document.with_grid(grid.clone());
        }
        self.store.write_document(&document)?;
        info!(
            linksets = document.linksets.len(),
            prims = document.prim_count(),
            textures = self.textures.len(),
            "document written"
        );
        Ok(())
    }

    /// Feed a completion to the session. Completions of other generations,
    /// or that nothing is waiting for, are dropped.
    pub fn on_completion<W: ExportWorld>(
        &mut self,
        completion: Completion,
        world: &W,
        progress: &dyn ProgressSink,
    ) {
        if self.is_finished() {
            debug!(tag = %completion.tag(), "export finished, completion dropped");
            return;
        }
        let (tag, asset, result) = match completion {
            Completion::TextureRead { tag, asset, result } => (tag, asset, result),
            other => {
                debug!(tag = %other.tag(), "export has no use for this completion");
                return;
            }
        };
        if self.dispatcher.resolve(tag, None) != Resolution::Matched {
            return;
        }
        match self.reader.complete(asset, result) {
            TextureFetch::Ready { asset, data } => match self.store.write_texture(asset, &data) {
                Ok(()) => self.written.push(asset),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "companion image not written");
                    self.failures.record(PartialFailureKind::WriteFailed, asset);
                }
            },
            TextureFetch::Failed { asset, reason } => {
                self.failures.record(reason, asset);
            }
        }
        self.next_texture(world, progress);
    }

    fn next_texture<W: ExportWorld>(&mut self, world: &W, progress: &dyn ProgressSink) {
        while let Some(id) = self.textures.pop_front() {
            match self.reader.request(&mut self.dispatcher, world, id) {
                Ok(()) => {
                    self.report(progress);
                    return;
                }
                Err(e) => {
                    warn!(asset = %id, error = %e, "texture read not sent");
                    self.failures.record(PartialFailureKind::Missing, id);
                }
            }
        }
        self.finish(progress);
    }

    fn finish(&mut self, progress: &dyn ProgressSink) {
        for line in self.failures.summary() {
            warn!("export partial failure: {line}");
        }
        let outcome = Outcome::from_failures(self.failures.clone());
        info!(generation = %self.generation(), textures = self.written.len(), "export {outcome}");
        self.enter(Phase::Done, progress);
        progress.finished(Operation::Export, &outcome);
        self.outcome = Some(outcome);
    }

    fn fail(&mut self, error: ExportError, progress: &dyn ProgressSink) {
        warn!(generation = %self.generation(), error = %error, "export failed");
        self.dispatcher.clear();
        self.enter(Phase::Failed, progress);
        let outcome = Outcome::Failed(error.to_string());
        progress.finished(Operation::Export, &outcome);
        self.outcome = Some(outcome);
    }

    fn enter(&mut self, phase: Phase, progress: &dyn ProgressSink) {
        debug!(from = %self.phase, to = %phase, "export phase");
        self.phase = phase;
        self.report(progress);
    }

    fn report(&self, progress: &dyn ProgressSink) {
        let in_flight = usize::from(self.reader.in_flight().is_some());
        progress.report(&ProgressReport {
            operation: Operation::Export,
            phase: self.phase,
            counters: Counters {
                textures_remaining: self.textures.len() + in_flight,
                linkset: self.linksets.len(),
                linksets: self.linksets.len(),
                prims: self.linksets.iter().map(LinksetDescriptor::len).sum(),
                ..Counters::default()
            },
        });
    }
}

impl std::fmt::Debug for ExportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSession")
            .field("generation", &self.generation())
            .field("phase", &self.phase)
            .field("textures", &self.textures.len())
            .field("failures", &self.failures.len())
            .finish()
    }
}
