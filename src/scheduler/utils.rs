use super::super::{
    Blob, BoundedSlicingAlgorithm, Error, ErrorKind, Manifest, NamingStrategy, ObjectStorageClient,
    PartAttemptFailedInfo, PartDescriptor, PartRetrier, PartUploadedInfo, PayloadSlice, PayloadSlicer, Reset,
    SlicingAlgorithm, UploadCallbacks, UploadPlan, UploadResult, ZeroPaddedNamingStrategy,
};
use log::{debug, error, info};
use std::{
    collections::HashMap,
    num::{NonZeroU64, NonZeroUsize},
    sync::Arc,
};

/// 两种上传策略共用的上传组件
#[derive(Debug)]
pub(super) struct UploadContext {
    pub(super) client: Arc<dyn ObjectStorageClient>,
    pub(super) slicing_algorithm: Box<dyn SlicingAlgorithm>,
    pub(super) naming_strategy: Box<dyn NamingStrategy>,
    pub(super) callbacks: Arc<UploadCallbacks>,
}

impl UploadContext {
    pub(super) fn new(client: Arc<dyn ObjectStorageClient>) -> Self {
        Self {
            client,
            slicing_algorithm: Box::<BoundedSlicingAlgorithm>::default(),
            naming_strategy: Box::<ZeroPaddedNamingStrategy>::default(),
            callbacks: Default::default(),
        }
    }

    pub(super) fn plan(&self, blob: &Blob) -> UploadResult<UploadPlan> {
        let Some(content_length) = blob.payload().content_length() else {
            return Err(Error::new_with_msg(
                ErrorKind::PreconditionFailed,
                format!("Content length of {} must be set before uploading", blob.key()),
            ));
        };
        let plan = self.slicing_algorithm.plan(content_length)?;
        debug!(
            "Planned upload of {}: {} bytes, {} part(s) of {} bytes",
            blob.key(),
            plan.total_length(),
            plan.part_count(),
            plan.chunk_size().as_u64()
        );
        Ok(plan)
    }

    pub(super) fn put_whole(
        &self,
        region: &str,
        container: &str,
        blob: &Blob,
        plan: &UploadPlan,
    ) -> UploadResult<String> {
        let length = PayloadSlicer.verify_length(blob.payload())?;
        debug_assert_eq!(length, plan.total_length());
        let mut payload = blob.payload().slice_range(0, length)?;
        let object_id = self.client.put_whole(region, container, blob.key(), &mut payload)?;
        info!(
            "Uploaded {} ({} bytes) in a single request: {}",
            blob.key(),
            plan.total_length(),
            object_id
        );
        Ok(object_id)
    }

    pub(super) fn publish(
        &self,
        region: &str,
        container: &str,
        key: &str,
        manifest: &Manifest,
    ) -> UploadResult<String> {
        let object_id = self
            .client
            .replace_manifest(region, container, key, manifest, &HashMap::new())?;
        info!(
            "Published manifest of {} with {} part(s), {} bytes: {}",
            key,
            manifest.len(),
            manifest.total_size(),
            object_id
        );
        Ok(object_id)
    }
}

/// 分片上传任务
///
/// 提交时即确定所有参数，之后由执行者独占
#[derive(Debug)]
pub(super) struct PartUploadTask {
    pub(super) client: Arc<dyn ObjectStorageClient>,
    pub(super) callbacks: Arc<UploadCallbacks>,
    pub(super) retrier: PartRetrier,
    pub(super) region: Arc<str>,
    pub(super) container: Arc<str>,
    pub(super) part_number: NonZeroUsize,
    pub(super) part_name: String,
    pub(super) slice: PayloadSlice,
}

impl PartUploadTask {
    pub(super) fn run(self) -> UploadResult<PartDescriptor> {
        let Self {
            client,
            callbacks,
            retrier,
            region,
            container,
            part_number,
            part_name,
            mut slice,
        } = self;
        let size = NonZeroU64::new(slice.len()).ok_or_else(|| {
            Error::new_with_msg(ErrorKind::LengthMismatch, format!("Part {part_name} is empty"))
        })?;
        let (etag, attempts) = retrier.retry(
            &part_name,
            || {
                slice.reset()?;
                client.put_part(&region, &container, &part_name, &mut slice)
            },
            |attempt, err| {
                callbacks.part_attempt_failed(&PartAttemptFailedInfo::new(part_number, &part_name, attempt, err))
            },
        )?;
        debug!("Uploaded part {} ({} bytes): {}", part_name, size, etag);
        let part = PartDescriptor::new(part_name, size, etag);
        callbacks.part_uploaded(&PartUploadedInfo::new(part_number, &part, attempts));
        Ok(part)
    }
}

/// 已经有分片上传成功时，将错误包装为上传中止错误
pub(super) fn abort_if_started(key: &str, started: bool, err: Error) -> Error {
    if started {
        error!("Aborting multipart upload of {}: {}", key, err);
        Error::upload_aborted(key, err)
    } else {
        err
    }
}
