use super::{
    BoundedSlicingAlgorithm, Error, ErrorKind, FixedBackoff, MultipartUploadStrategy, ObjectStorageClient,
    ParallelMultipartUploadStrategy, SequentialMultipartUploadStrategy, UploadResult,
};
use serde::{Deserialize, Serialize};
use std::{num::NonZeroUsize, sync::Arc, time::Duration};

/// 默认工作线程数量
pub const DEFAULT_WORKER_COUNT: usize = 10;
/// 默认分片任务队列容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 10000;
/// 默认每个分片的最大尝试次数
pub const DEFAULT_RETRIES: usize = 10;
/// 默认最小分片大小，同时也是分片上传阈值
pub const DEFAULT_MIN_PART_SIZE: u64 = 5 << 20;
/// 默认最大分片大小
pub const DEFAULT_MAX_PART_SIZE: u64 = 5 << 30;
/// 默认最大分片数量
pub const DEFAULT_MAX_PART_COUNT: usize = 10000;

/// 上传策略类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// 串行上传
    Sequential,

    /// 并行上传
    #[default]
    Parallel,
}

/// 分片上传配置
///
/// 所有字段均可省略，省略的字段使用默认值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MultipartUploadConfig {
    strategy: StrategyKind,
    worker_count: usize,
    queue_capacity: usize,
    retries: usize,
    min_part_size: u64,
    max_part_size: u64,
    max_part_count: usize,
    retry_backoff_millis: u64,
}

impl Default for MultipartUploadConfig {
    #[inline]
    fn default() -> Self {
        Self {
            strategy: Default::default(),
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retries: DEFAULT_RETRIES,
            min_part_size: DEFAULT_MIN_PART_SIZE,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_part_count: DEFAULT_MAX_PART_COUNT,
            retry_backoff_millis: 0,
        }
    }
}

impl MultipartUploadConfig {
    /// 创建分片上传配置构建器
    #[inline]
    pub fn builder() -> MultipartUploadConfigBuilder {
        MultipartUploadConfigBuilder {
            inner: Default::default(),
        }
    }

    /// 从 JSON 中解析分片上传配置
    ///
    /// 解析后会校验配置
    pub fn from_json_slice(json: &[u8]) -> UploadResult<Self> {
        let config: Self = serde_json::from_slice(json).map_err(|err| Error::new(ErrorKind::InvalidArgument, err))?;
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    #[inline]
    pub fn retries(&self) -> usize {
        self.retries
    }

    #[inline]
    pub fn min_part_size(&self) -> u64 {
        self.min_part_size
    }

    #[inline]
    pub fn max_part_size(&self) -> u64 {
        self.max_part_size
    }

    #[inline]
    pub fn max_part_count(&self) -> usize {
        self.max_part_count
    }

    #[inline]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_millis)
    }

    /// 校验配置
    ///
    /// 任意数量为 `0`，或最小分片大小大于最大分片大小时，返回 [`ErrorKind::InvalidArgument`]
    pub fn validate(&self) -> UploadResult<()> {
        non_zero(self.worker_count, "worker-count")?;
        non_zero(self.queue_capacity, "queue-capacity")?;
        non_zero(self.retries, "retries")?;
        self.slicing_algorithm().map(|_| ())
    }

    fn slicing_algorithm(&self) -> UploadResult<BoundedSlicingAlgorithm> {
        BoundedSlicingAlgorithm::new(self.min_part_size, self.max_part_size, self.max_part_count)
    }
}

/// 分片上传配置构建器
#[derive(Debug, Clone)]
pub struct MultipartUploadConfigBuilder {
    inner: MultipartUploadConfig,
}

impl MultipartUploadConfigBuilder {
    #[inline]
    pub fn strategy(&mut self, strategy: StrategyKind) -> &mut Self {
        self.inner.strategy = strategy;
        self
    }

    /// 设置工作线程数量，仅对并行上传有效
    #[inline]
    pub fn worker_count(&mut self, worker_count: usize) -> &mut Self {
        self.inner.worker_count = worker_count;
        self
    }

    /// 设置分片任务队列容量，仅对并行上传有效
    #[inline]
    pub fn queue_capacity(&mut self, queue_capacity: usize) -> &mut Self {
        self.inner.queue_capacity = queue_capacity;
        self
    }

    /// 设置每个分片的最大尝试次数，仅对并行上传有效
    #[inline]
    pub fn retries(&mut self, retries: usize) -> &mut Self {
        self.inner.retries = retries;
        self
    }

    #[inline]
    pub fn min_part_size(&mut self, min_part_size: u64) -> &mut Self {
        self.inner.min_part_size = min_part_size;
        self
    }

    #[inline]
    pub fn max_part_size(&mut self, max_part_size: u64) -> &mut Self {
        self.inner.max_part_size = max_part_size;
        self
    }

    #[inline]
    pub fn max_part_count(&mut self, max_part_count: usize) -> &mut Self {
        self.inner.max_part_count = max_part_count;
        self
    }

    /// 设置分片重试前的等待时长，仅对并行上传有效
    #[inline]
    pub fn retry_backoff(&mut self, retry_backoff: Duration) -> &mut Self {
        self.inner.retry_backoff_millis = u64::try_from(retry_backoff.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 构建分片上传配置
    #[inline]
    pub fn build(&self) -> UploadResult<MultipartUploadConfig> {
        self.inner.validate()?;
        Ok(self.inner.to_owned())
    }
}

/// 根据配置创建上传策略
pub fn build_strategy(
    config: &MultipartUploadConfig,
    client: impl ObjectStorageClient + 'static,
) -> UploadResult<Box<dyn MultipartUploadStrategy>> {
    config.validate()?;
    let client: Arc<dyn ObjectStorageClient> = Arc::new(client);
    let slicing_algorithm = Box::new(config.slicing_algorithm()?);
    let mut strategy: Box<dyn MultipartUploadStrategy> = match config.strategy {
        StrategyKind::Sequential => Box::new(SequentialMultipartUploadStrategy::new_with_shared_client(client)),
        StrategyKind::Parallel => {
            let mut strategy = ParallelMultipartUploadStrategy::new_with_shared_client(client);
            strategy.set_worker_count(non_zero(config.worker_count, "worker-count")?);
            strategy.set_queue_capacity(non_zero(config.queue_capacity, "queue-capacity")?);
            strategy.set_retries_with_backoff(
                non_zero(config.retries, "retries")?,
                FixedBackoff::new(config.retry_backoff()),
            );
            Box::new(strategy)
        }
    };
    strategy.set_slicing_algorithm(slicing_algorithm);
    Ok(strategy)
}

fn non_zero(value: usize, name: &str) -> UploadResult<NonZeroUsize> {
    NonZeroUsize::new(value)
        .ok_or_else(|| Error::new_with_msg(ErrorKind::InvalidArgument, format!("{name} must be positive")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Blob, BytesPayload, Manifest, PayloadSlice};
    use anyhow::Result;
    use dashmap::DashMap;
    use std::{
        collections::HashMap,
        io::{copy as io_copy, sink},
    };

    #[test]
    fn test_default_config() -> Result<()> {
        let config = MultipartUploadConfig::from_json_slice(b"{}")?;
        assert_eq!(config, MultipartUploadConfig::default());
        assert_eq!(config.strategy(), StrategyKind::Parallel);
        assert_eq!(config.worker_count(), 10);
        assert_eq!(config.queue_capacity(), 10000);
        assert_eq!(config.retries(), 10);
        assert_eq!(config.min_part_size(), 5_242_880);
        assert_eq!(config.max_part_size(), 5_368_709_120);
        assert_eq!(config.max_part_count(), 10000);
        assert_eq!(config.retry_backoff(), Duration::ZERO);
        Ok(())
    }

    #[test]
    fn test_kebab_case_keys() -> Result<()> {
        let config = MultipartUploadConfig::from_json_slice(
            br#"{"strategy": "sequential", "worker-count": 4, "min-part-size": 1024, "retry-backoff-millis": 250}"#,
        )?;
        assert_eq!(config.strategy(), StrategyKind::Sequential);
        assert_eq!(config.worker_count(), 4);
        assert_eq!(config.min_part_size(), 1024);
        assert_eq!(config.retry_backoff(), Duration::from_millis(250));
        assert_eq!(config.queue_capacity(), 10000);
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        for json in [
            &br#"{"worker-count": 0}"#[..],
            br#"{"queue-capacity": 0}"#,
            br#"{"retries": 0}"#,
            br#"{"min-part-size": 0}"#,
            br#"{"max-part-count": 0}"#,
            br#"{"min-part-size": 100, "max-part-size": 99}"#,
            br#"{"strategy": "random"}"#,
        ] {
            let err = MultipartUploadConfig::from_json_slice(json).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        let err = MultipartUploadConfig::builder().retries(0).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[derive(Debug, Default)]
    struct PartsOnly {
        parts: DashMap<String, u64>,
    }

    impl ObjectStorageClient for PartsOnly {
        fn put_part(
            &self,
            _region: &str,
            _container: &str,
            part_name: &str,
            part: &mut PayloadSlice,
        ) -> UploadResult<String> {
            let size = io_copy(part, &mut sink())?;
            self.parts.insert(part_name.to_owned(), size);
            Ok(part_name.to_owned())
        }

        fn put_whole(
            &self,
            _region: &str,
            _container: &str,
            _key: &str,
            _payload: &mut PayloadSlice,
        ) -> UploadResult<String> {
            Err(Error::new_with_msg(ErrorKind::StorageError, "Direct upload is not expected"))
        }

        fn replace_manifest(
            &self,
            _region: &str,
            _container: &str,
            key: &str,
            manifest: &Manifest,
            _metadata: &HashMap<String, String>,
        ) -> UploadResult<String> {
            Ok(format!("{key}:{}", manifest.len()))
        }
    }

    #[test]
    fn test_build_strategy_from_config() -> Result<()> {
        for strategy in [StrategyKind::Sequential, StrategyKind::Parallel] {
            let config = MultipartUploadConfig::builder()
                .strategy(strategy)
                .worker_count(2)
                .queue_capacity(1)
                .min_part_size(5_000_000)
                .max_part_size(5_000_000)
                .build()?;
            let client = Arc::new(PartsOnly::default());
            let blob = Blob::builder("key")
                .payload(BytesPayload::new(vec![0u8; 25_000_000]))
                .build()
                .unwrap();
            let object_id = build_strategy(&config, client.to_owned())?.execute("region", "bucket", blob)?;
            assert_eq!(object_id, "key:5");
            assert_eq!(client.parts.len(), 5);
            assert!(client.parts.iter().all(|part| *part.value() == 5_000_000));
        }
        Ok(())
    }
}
