use super::{
    Blob, BytesPayload, NamingStrategy, SeekablePayload, SlicingAlgorithm, UploadCallbacks, UploadResult,
};
use auto_impl::auto_impl;
use std::{fmt::Debug, path::Path, sync::Arc};

/// 分片上传策略接口
///
/// 负责分片上传的调度，包括切分数据源、上传分片、发布分片清单。
/// 不超过分片阈值的数据源会被直接上传。
#[auto_impl(&mut, Box)]
pub trait MultipartUploadStrategy: Send + Sync + Debug {
    /// 设置分片切分算法
    fn set_slicing_algorithm(&mut self, slicing_algorithm: Box<dyn SlicingAlgorithm>);

    /// 设置分片命名策略
    fn set_naming_strategy(&mut self, naming_strategy: Box<dyn NamingStrategy>);

    /// 设置上传回调
    fn set_callbacks(&mut self, callbacks: UploadCallbacks);

    /// 上传对象
    ///
    /// 返回对象 ID。分片上传时为发布分片清单的结果，直接上传时为直接上传的结果。
    fn execute(&self, region: &str, container: &str, blob: Blob) -> UploadResult<String>;
}

/// 分片上传策略扩展接口
pub trait MultipartUploadStrategyExt: MultipartUploadStrategy {
    /// 上传指定路径的文件
    fn upload_path(&self, region: &str, container: &str, key: &str, path: impl AsRef<Path>) -> UploadResult<String> {
        self.execute(region, container, Blob::new(key, SeekablePayload::open(path)?))
    }

    /// 上传内存数据
    fn upload_bytes(
        &self,
        region: &str,
        container: &str,
        key: &str,
        data: impl Into<Arc<[u8]>>,
    ) -> UploadResult<String> {
        self.execute(region, container, Blob::new(key, BytesPayload::new(data)))
    }
}

impl<T: MultipartUploadStrategy> MultipartUploadStrategyExt for T {}

mod utils;

mod sequential;
pub use sequential::SequentialMultipartUploadStrategy;

mod parallel;
pub use parallel::ParallelMultipartUploadStrategy;

#[cfg(test)]
mod mock;
