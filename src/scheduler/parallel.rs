use super::{
    super::{
        config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_RETRIES, DEFAULT_WORKER_COUNT},
        Backoff, Blob, Error, Manifest, NamingStrategy, ObjectStorageClient, PartNumberAllocator, PartRetrier,
        PayloadSlicer, SlicingAlgorithm, UploadCallbacks, UploadResult, WorkerPool,
    },
    utils::{abort_if_started, PartUploadTask, UploadContext},
    MultipartUploadStrategy,
};
use log::{debug, error};
use std::{num::NonZeroUsize, sync::Arc};

const THREAD_NAME_PREFIX: &str = "multipart-upload-manager.parallel";

/// 并行分片上传策略
///
/// 由固定数量的工作线程并行上传分片，分片任务队列已满时提交者阻塞等待。
/// 每个分片最多尝试若干次，任意分片耗尽重试次数后中止整个上传，
/// 不会取消已经提交的其他分片，它们的结果会被丢弃。
///
/// 无论分片完成的先后顺序如何，分片清单总是按提交顺序组装。
#[derive(Debug)]
pub struct ParallelMultipartUploadStrategy {
    context: UploadContext,
    worker_count: NonZeroUsize,
    queue_capacity: NonZeroUsize,
    retrier: PartRetrier,
}

impl ParallelMultipartUploadStrategy {
    /// 创建并行分片上传策略
    ///
    /// 默认 10 个工作线程，任务队列容量 10000，每个分片最多尝试 10 次
    #[inline]
    pub fn new(client: impl ObjectStorageClient + 'static) -> Self {
        Self::new_with_shared_client(Arc::new(client))
    }

    #[allow(unsafe_code)]
    pub fn new_with_shared_client(client: Arc<dyn ObjectStorageClient>) -> Self {
        unsafe {
            Self {
                context: UploadContext::new(client),
                worker_count: NonZeroUsize::new_unchecked(DEFAULT_WORKER_COUNT),
                queue_capacity: NonZeroUsize::new_unchecked(DEFAULT_QUEUE_CAPACITY),
                retrier: PartRetrier::new(NonZeroUsize::new_unchecked(DEFAULT_RETRIES)),
            }
        }
    }

    /// 设置工作线程数量
    #[inline]
    pub fn set_worker_count(&mut self, worker_count: NonZeroUsize) {
        self.worker_count = worker_count;
    }

    /// 设置分片任务队列容量
    #[inline]
    pub fn set_queue_capacity(&mut self, queue_capacity: NonZeroUsize) {
        self.queue_capacity = queue_capacity;
    }

    /// 设置每个分片的最大尝试次数
    #[inline]
    pub fn set_retries(&mut self, retries: NonZeroUsize) {
        self.retrier = PartRetrier::new(retries);
    }

    /// 设置每个分片的最大尝试次数和退避策略
    #[inline]
    pub fn set_retries_with_backoff(&mut self, retries: NonZeroUsize, backoff: impl Backoff + 'static) {
        self.retrier = PartRetrier::new_with_backoff(retries, backoff);
    }

    #[inline]
    pub fn worker_count(&self) -> NonZeroUsize {
        self.worker_count
    }

    #[inline]
    pub fn queue_capacity(&self) -> NonZeroUsize {
        self.queue_capacity
    }

    #[inline]
    pub fn retries(&self) -> NonZeroUsize {
        self.retrier.retries()
    }
}

impl MultipartUploadStrategy for ParallelMultipartUploadStrategy {
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
        let slices = PayloadSlicer.slice(blob.payload(), plan.chunk_size())?;
        let pool = WorkerPool::new(self.worker_count, self.queue_capacity, THREAD_NAME_PREFIX)?;
        let region: Arc<str> = region.into();
        let container: Arc<str> = container.into();
        let allocator = PartNumberAllocator::new();
        let mut pending_results = Vec::with_capacity(plan.part_count());
        for slice in slices {
            let slice = slice.map_err(|err| abort_if_started(key, !pending_results.is_empty(), err))?;
            let part_number = allocator.next_part_number();
            let part_name = self
                .context
                .naming_strategy
                .part_name(key, part_number, plan.part_count());
            debug!(
                "Submitting part {} ({} bytes at offset {})",
                part_name,
                slice.len(),
                slice.offset()
            );
            let task = PartUploadTask {
                client: self.context.client.to_owned(),
                callbacks: self.context.callbacks.to_owned(),
                retrier: self.retrier.to_owned(),
                region: region.to_owned(),
                container: container.to_owned(),
                part_number,
                part_name,
                slice,
            };
            let pending = pool
                .submit(move || task.run())
                .map_err(|err| abort_if_started(key, !pending_results.is_empty(), err))?;
            pending_results.push(pending);
        }

        let mut manifest = Manifest::with_capacity(pending_results.len());
        for pending in pending_results {
            match pending.wait().and_then(|result| result) {
                Ok(part) => manifest.push(part),
                Err(err) => {
                    error!("Aborting multipart upload of {}: {}", key, err);
                    return Err(Error::upload_aborted(key, err));
                }
            }
        }
        debug_assert_eq!(manifest.len(), plan.part_count());
        self.context.publish(&region, &container, key, &manifest)
    }
}
