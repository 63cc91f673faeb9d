use super::{
    super::{
        Blob, Manifest, NamingStrategy, ObjectStorageClient, PartNumberAllocator, PartRetrier, PayloadSlicer,
        SlicingAlgorithm, UploadCallbacks, UploadResult,
    },
    utils::{abort_if_started, PartUploadTask, UploadContext},
    MultipartUploadStrategy,
};
use log::debug;
use std::{num::NonZeroUsize, sync::Arc};

/// 串行分片上传策略
///
/// 在调用者线程上按顺序逐个上传分片，不会重试。
/// 任意分片上传失败都会立即终止上传，已上传的分片不会被清理。
#[derive(Debug)]
pub struct SequentialMultipartUploadStrategy {
    context: UploadContext,
}

impl SequentialMultipartUploadStrategy {
    /// 创建串行分片上传策略
    #[inline]
    pub fn new(client: impl ObjectStorageClient + 'static) -> Self {
        Self::new_with_shared_client(Arc::new(client))
    }

    #[inline]
    pub fn new_with_shared_client(client: Arc<dyn ObjectStorageClient>) -> Self {
        Self {
            context: UploadContext::new(client),
        }
    }
}

impl MultipartUploadStrategy for SequentialMultipartUploadStrategy {
    #[inline]
    fn set_slicing_algorithm(&mut self, slicing_algorithm: Box<dyn SlicingAlgorithm>) {
        self.context.slicing_algorithm = slicing_algorithm;
    }

    #[inline]
    fn set_naming_strategy(&mut self, naming_strategy: Box<dyn NamingStrategy>) {
        self.context.naming_strategy = naming_strategy;
    }

    #[inline]
    fn set_callbacks(&mut self, callbacks: UploadCallbacks) {
        self.context.callbacks = Arc::new(callbacks);
    }

    fn execute(&self, region: &str, container: &str, blob: Blob) -> UploadResult<String> {
        let plan = self.context.plan(&blob)?;
        if !plan.is_multi_parts() {
            return self.context.put_whole(region, container, &blob, &plan);
        }

        let key = blob.key();
        let region: Arc<str> = region.into();
        let container: Arc<str> = container.into();
        let allocator = PartNumberAllocator::new();
        let retrier = PartRetrier::new(NonZeroUsize::MIN);
        let mut manifest = Manifest::with_capacity(plan.part_count());
        let slices = PayloadSlicer.slice(blob.payload(), plan.chunk_size())?;
        for slice in slices {
            let slice = slice.map_err(|err| abort_if_started(key, !manifest.is_empty(), err))?;
            let part_number = allocator.next_part_number();
            let part_name = self
                .context
                .naming_strategy
                .part_name(key, part_number, plan.part_count());
            debug!("Uploading part {} ({} bytes at offset {})", part_name, slice.len(), slice.offset());
            let task = PartUploadTask {
                client: self.context.client.to_owned(),
                callbacks: self.context.callbacks.to_owned(),
                retrier: retrier.to_owned(),
                region: region.to_owned(),
                container: container.to_owned(),
                part_number,
                part_name,
                slice,
            };
            let part = task
                .run()
                .map_err(|err| abort_if_started(key, !manifest.is_empty(), err))?;
            manifest.push(part);
        }
        debug_assert_eq!(manifest.len(), plan.part_count());
        self.context.publish(&region, &container, key, &manifest)
    }
}
