use std::collections::VecDeque;

use lsb_document::BackupStore;
use lsb_runtime::{
    AssetUpload, AssetUploadChannel, Dispatcher, PartialFailureKind, PartialFailures, RequestKind,
    RuntimeResult,
};
use lsb_types::AssetId;
use tracing::{debug, info, warn};

use crate::remap::AssetIdRemap;

/// Uploads the companion images of an import, one at a time, and records
/// where each one landed.
///
/// A texture that cannot be read or uploaded stays unmapped, so faces keep
/// referencing its original id.
#[derive(Debug, Default)]
pub struct Reuploader {
    queue: VecDeque<AssetId>,
    current: Option<AssetId>,
    remap: AssetIdRemap,
}

impl Reuploader {
    pub fn new(ids: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            queue: ids.into_iter().collect(),
            current: None,
            remap: AssetIdRemap::new(),
        }
    }

    /// Textures not yet uploaded, including the one in flight.
    pub fn remaining(&self) -> usize {
        self.queue.len() + usize::from(self.current.is_some())
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() && self.current.is_none()
    }

    pub fn current(&self) -> Option<AssetId> {
        self.current
    }

    /// Start the next upload.
    ///
    /// Ids whose companion image is unavailable, or that the channel refuses,
    /// are recorded in `failures` and skipped. Returns `false` once nothing is
    /// left to upload.
    pub fn advance(
        &mut self,
        dispatcher: &mut Dispatcher,
        channel: &dyn AssetUploadChannel,
        store: &dyn BackupStore,
        failures: &mut PartialFailures,
    ) -> RuntimeResult<bool> {
        while let Some(id) = self.queue.pop_front() {
            let data = match store.read_texture(id) {
                Ok(data) => data,
                Err(e) => {
                    debug!(asset = %id, error = %e, "companion image unavailable");
                    failures.record(PartialFailureKind::CompanionMissing, id);
                    continue;
                }
            };
            let upload = AssetUpload {
                name: id.to_string(),
                description: id.to_string(),
                data,
            };
            let tag = dispatcher.issue(RequestKind::AssetUpload)?;
            match channel.upload(tag, upload) {
                Ok(()) => {
                    self.current = Some(id);
                    return Ok(true);
                }
                Err(e) => {
                    dispatcher.cancel(RequestKind::AssetUpload);
                    warn!(asset = %id, error = %e, "upload not sent");
                    failures.record(PartialFailureKind::UploadFailed, id);
                }
            }
        }
        Ok(false)
    }

    /// Record the answer to the upload in flight.
    pub fn complete(&mut self, result: Result<AssetId, String>, failures: &mut PartialFailures) {
        let Some(original) = self.current.take() else {
            debug!("upload answer with nothing in flight");
            return;
        };
        match result {
            Ok(stored) => match self.remap.insert(original, stored) {
                Ok(()) => info!(original = %original, stored = %stored, "texture uploaded"),
                Err(e) => warn!(error = %e, "remap entry kept"),
            },
            Err(reason) => {
                warn!(asset = %original, reason = %reason, "upload rejected");
                failures.record(PartialFailureKind::UploadFailed, original);
            }
        }
    }

    pub fn remap(&self) -> &AssetIdRemap {
        &self.remap
    }

    pub fn into_remap(self) -> AssetIdRemap {
        self.remap
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use lsb_document::MemoryBackup;
    use lsb_runtime::{Generation, RequestTag};

    use super::*;

    fn asset(n: u8) -> AssetId {
        AssetId::from_bytes([n; 16])
    }

    #[derive(Default)]
    struct Uploads {
        sent: RefCell<Vec<(RequestTag, AssetUpload)>>,
    }

    impl AssetUploadChannel for Uploads {
        fn upload(&self, tag: RequestTag, upload: AssetUpload) -> RuntimeResult<()> {
            self.sent.borrow_mut().push((tag, upload));
            Ok(())
        }
    }

    #[test]
    fn uploads_sequentially_and_maps_results() {
        let backup = MemoryBackup::new();
        backup.insert_texture(asset(1), vec![1u8]);
        backup.insert_texture(asset(2), vec![2u8]);
        let channel = Uploads::default();
        let mut dispatcher = Dispatcher::new(Generation::new(1));
        let mut failures = PartialFailures::new();
        let mut uploader = Reuploader::new([asset(1), asset(2)]);

        assert!(uploader
            .advance(&mut dispatcher, &channel, &backup, &mut failures)
            .unwrap());
        assert_eq!(uploader.remaining(), 2);
        assert_eq!(channel.sent.borrow()[0].1.name, asset(1).to_string());
        assert!(dispatcher.is_pending(RequestKind::AssetUpload));

        let tag = channel.sent.borrow()[0].0;
        dispatcher.resolve(tag, None);
        uploader.complete(Ok(asset(11)), &mut failures);
        assert!(uploader
            .advance(&mut dispatcher, &channel, &backup, &mut failures)
            .unwrap());
        uploader.complete(Err("quota".into()), &mut failures);

        assert!(uploader.is_finished());
        assert_eq!(uploader.remap().get(asset(1)), Some(asset(11)));
        assert_eq!(uploader.remap().get(asset(2)), None);
        assert_eq!(failures.count(PartialFailureKind::UploadFailed), 1);
    }

    #[test]
    fn missing_companion_is_skipped() {
        let backup = MemoryBackup::new();
        let channel = Uploads::default();
        let mut dispatcher = Dispatcher::new(Generation::new(1));
        let mut failures = PartialFailures::new();
        let mut uploader = Reuploader::new([asset(5)]);

        assert!(!uploader
            .advance(&mut dispatcher, &channel, &backup, &mut failures)
            .unwrap());
        assert!(channel.sent.borrow().is_empty());
        assert_eq!(failures.count(PartialFailureKind::CompanionMissing), 1);
        assert!(uploader.remap().is_empty());
    }
}
