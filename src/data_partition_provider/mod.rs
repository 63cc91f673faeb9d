use super::UploadResult;
use auto_impl::auto_impl;
use std::{fmt::Debug, num::NonZeroU64, ops::Deref};

/// 分片切分算法接口
///
/// 根据数据源的总长度计算分片大小和分片数量
#[auto_impl(&, &mut, Box, Arc)]
pub trait SlicingAlgorithm: Debug + Sync + Send {
    /// 计算上传计划
    ///
    /// 如果返回的计划中分片数量为 `0`，则调用方应当直接上传整个数据源，而不是使用分片上传。
    fn plan(&self, total_length: u64) -> UploadResult<UploadPlan>;
}

/// 分片大小
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartSize(NonZeroU64);

impl PartSize {
    /// 创建分片大小
    ///
    /// 如果传入 `0` 将返回 [`None`]。
    #[inline]
    pub fn new(part_size: u64) -> Option<Self> {
        NonZeroU64::new(part_size).map(Self)
    }

    #[inline]
    pub fn as_non_zero_u64(&self) -> NonZeroU64 {
        self.0
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.as_non_zero_u64().get()
    }
}

impl From<NonZeroU64> for PartSize {
    #[inline]
    fn from(size: NonZeroU64) -> Self {
        Self(size)
    }
}

impl From<PartSize> for NonZeroU64 {
    #[inline]
    fn from(size: PartSize) -> Self {
        size.as_non_zero_u64()
    }
}

impl From<PartSize> for u64 {
    #[inline]
    fn from(size: PartSize) -> Self {
        size.as_u64()
    }
}

impl Deref for PartSize {
    type Target = NonZeroU64;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// 上传计划
///
/// 分片数量为 `0` 时表示数据源足够小，应当直接上传；
/// 否则满足 `(part_count - 1) * chunk_size < total_length <= part_count * chunk_size`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    total_length: u64,
    chunk_size: PartSize,
    part_count: usize,
}

impl UploadPlan {
    pub(crate) fn single(total_length: u64, chunk_size: PartSize) -> Self {
        Self {
            total_length,
            chunk_size,
            part_count: 0,
        }
    }

    pub(crate) fn multi_parts(total_length: u64, chunk_size: PartSize, part_count: usize) -> Self {
        Self {
            total_length,
            chunk_size,
            part_count,
        }
    }

    /// 获取数据源总长度
    #[inline]
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// 获取分片大小
    #[inline]
    pub fn chunk_size(&self) -> PartSize {
        self.chunk_size
    }

    /// 获取分片数量
    #[inline]
    pub fn part_count(&self) -> usize {
        self.part_count
    }

    /// 是否需要分片上传
    #[inline]
    pub fn is_multi_parts(&self) -> bool {
        self.part_count > 0
    }
}

pub(crate) fn ceil_div(dividend: u64, divisor: NonZeroU64) -> u64 {
    let divisor = divisor.get();
    dividend / divisor + u64::from(dividend % divisor != 0)
}

mod bounded;
pub use bounded::{plan, BoundedSlicingAlgorithm};
