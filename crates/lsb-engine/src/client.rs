use lsb_document::BackupStore;
use lsb_export::{ExportSession, ExportWorld};
use lsb_import::{ImportSession, ImportWorld};
use lsb_runtime::{
    Completion, CompletionSender, EventQueue, Generation, GenerationCounter, Operation, Outcome,
    Phase, ProgressSink, RequestKind,
};
use tracing::{debug, info};

use crate::config::BackupConfig;

/// Everything the client needs from the world.
pub trait World: ExportWorld + ImportWorld {}

impl<T: ExportWorld + ImportWorld> World for T {}

/// Owns the world collaborators, the sessions and the event queue.
///
/// At most one export and one import are active at a time. Starting a new
/// one replaces the active session of that kind; completions still in flight
/// for the old session carry its generation and are discarded.
pub struct BackupClient<W> {
    world: W,
    config: BackupConfig,
    progress: Box<dyn ProgressSink>,
    generations: GenerationCounter,
    queue: EventQueue,
    export: Option<ExportSession>,
    import: Option<ImportSession>,
    last_export: Option<Outcome>,
    last_import: Option<Outcome>,
}

impl<W: World> BackupClient<W> {
    pub fn new(world: W, config: BackupConfig, progress: Box<dyn ProgressSink>) -> Self {
        Self {
            world,
            config,
            progress,
            generations: GenerationCounter::new(),
            queue: EventQueue::new(),
            export: None,
            import: None,
            last_export: None,
            last_import: None,
        }
    }

    /// Handle collaborators use to post completions.
    pub fn sender(&self) -> CompletionSender {
        self.queue.sender()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Export the current selection into `store`.
    pub fn start_export(&mut self, store: Box<dyn BackupStore>) -> Generation {
        let generation = self.generations.advance();
        if let Some(old) = self.export.take() {
            info!(old = %old.generation(), new = %generation, "active export replaced");
        }
        let actor = self.world.operator().id;
        let mut session =
            ExportSession::new(generation, self.config.export_options(), actor, store);
        session.start(&self.world, self.progress.as_ref());
        self.export = Some(session);
        self.reap();
        generation
    }

    /// Rebuild the backup in `store` in front of the operator.
    pub fn start_import(&mut self, store: Box<dyn BackupStore>) -> Generation {
        let generation = self.generations.advance();
        if let Some(old) = self.import.take() {
            info!(old = %old.generation(), new = %generation, "active import replaced");
        }
        let mut session = ImportSession::new(generation, self.config.import_options(), store);
        session.start(&self.world, self.progress.as_ref());
        self.import = Some(session);
        self.reap();
        generation
    }

    /// Route one completion to the session of its kind.
    pub fn dispatch(&mut self, completion: Completion) {
        let progress = self.progress.as_ref();
        match completion.kind() {
            RequestKind::TextureRead => match &mut self.export {
                Some(session) => session.on_completion(completion, &self.world, progress),
                None => debug!(tag = %completion.tag(), "no export active, completion dropped"),
            },
            _ => match &mut self.import {
                Some(session) => session.on_completion(completion, &self.world, progress),
                None => debug!(tag = %completion.tag(), "no import active, completion dropped"),
            },
        }
        self.reap();
    }

    /// Dispatch every completion already queued. Returns how many there were.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(completion) = self.queue.try_next() {
            self.dispatch(completion);
            handled += 1;
        }
        handled
    }

    /// Wait for and dispatch completions until no session is active.
    ///
    /// A collaborator that never answers keeps this waiting.
    pub async fn run_until_idle(&mut self) {
        while !self.is_idle() {
            match self.queue.next().await {
                Some(completion) => self.dispatch(completion),
                None => break,
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.export.is_none() && self.import.is_none()
    }

    /// The active session of `operation`, if any.
    pub fn phase(&self, operation: Operation) -> Option<Phase> {
        match operation {
            Operation::Export => self.export.as_ref().map(ExportSession::phase),
            Operation::Import => self.import.as_ref().map(ImportSession::phase),
        }
    }

    pub fn export_session(&self) -> Option<&ExportSession> {
        self.export.as_ref()
    }

    pub fn import_session(&self) -> Option<&ImportSession> {
        self.import.as_ref()
    }

    /// Outcome of the most recently finished session of `operation`.
    pub fn last_outcome(&self, operation: Operation) -> Option<&Outcome> {
        match operation {
            Operation::Export => self.last_export.as_ref(),
            Operation::Import => self.last_import.as_ref(),
        }
    }

    /// Drop sessions that reached DONE or FAILED, keeping their outcome.
    fn reap(&mut self) {
        if let Some(session) = self.export.take_if(|s| s.is_finished()) {
            debug!(generation = %session.generation(), "export session released");
            self.last_export = session.outcome().cloned();
        }
        if let Some(session) = self.import.take_if(|s| s.is_finished()) {
            debug!(generation = %session.generation(), "import session released");
            self.last_import = session.outcome().cloned();
        }
    }
}

impl<W> std::fmt::Debug for BackupClient<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupClient")
            .field("generation", &self.generations.current())
            .field("export", &self.export)
            .field("import", &self.import)
            .finish()
    }
}
