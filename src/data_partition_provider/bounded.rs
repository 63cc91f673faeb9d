use super::{
    super::{
        config::{DEFAULT_MAX_PART_COUNT, DEFAULT_MAX_PART_SIZE, DEFAULT_MIN_PART_SIZE},
        Error, ErrorKind,
    },
    ceil_div, PartSize, SlicingAlgorithm, UploadPlan, UploadResult,
};
use log::debug;
use std::num::{NonZeroU64, NonZeroUsize};

/// 有界分片切分算法
///
/// 在 `[min_part_size, max_part_size]` 范围内选出最小的分片大小，使得分片数量不超过 `max_part_count`。
/// 总长度不超过 `min_part_size` 的数据源不需要分片。
#[derive(Debug, Clone, Copy)]
pub struct BoundedSlicingAlgorithm {
    min_part_size: NonZeroU64,
    max_part_size: NonZeroU64,
    max_part_count: NonZeroUsize,
}

impl BoundedSlicingAlgorithm {
    /// 创建有界分片切分算法
    ///
    /// 任意一个参数为 `0`，或最小分片大小大于最大分片大小时，返回 [`ErrorKind::InvalidArgument`]。
    pub fn new(min_part_size: u64, max_part_size: u64, max_part_count: usize) -> UploadResult<Self> {
        let (Some(min), Some(max), Some(count)) = (
            NonZeroU64::new(min_part_size),
            NonZeroU64::new(max_part_size),
            NonZeroUsize::new(max_part_count),
        ) else {
            return Err(Error::new_with_msg(
                ErrorKind::InvalidArgument,
                format!(
                    "Slicing bounds must be positive: min_part_size={min_part_size}, \
                     max_part_size={max_part_size}, max_part_count={max_part_count}"
                ),
            ));
        };
        if min > max {
            return Err(Error::new_with_msg(
                ErrorKind::InvalidArgument,
                format!("min_part_size {min} is greater than max_part_size {max}"),
            ));
        }
        Ok(Self {
            min_part_size: min,
            max_part_size: max,
            max_part_count: count,
        })
    }

    #[inline]
    pub fn min_part_size(&self) -> NonZeroU64 {
        self.min_part_size
    }

    #[inline]
    pub fn max_part_size(&self) -> NonZeroU64 {
        self.max_part_size
    }

    #[inline]
    pub fn max_part_count(&self) -> NonZeroUsize {
        self.max_part_count
    }
}

impl Default for BoundedSlicingAlgorithm {
    /// 默认分片大小范围为 5 MiB 到 5 GiB，最多 10000 个分片
    #[inline]
    #[allow(unsafe_code)]
    fn default() -> Self {
        unsafe {
            Self {
                min_part_size: NonZeroU64::new_unchecked(DEFAULT_MIN_PART_SIZE),
                max_part_size: NonZeroU64::new_unchecked(DEFAULT_MAX_PART_SIZE),
                max_part_count: NonZeroUsize::new_unchecked(DEFAULT_MAX_PART_COUNT),
            }
        }
    }
}

impl SlicingAlgorithm for BoundedSlicingAlgorithm {
    fn plan(&self, total_length: u64) -> UploadResult<UploadPlan> {
        if total_length <= self.min_part_size.get() {
            debug!(
                "{} bytes fit in a single part (threshold {}), no multipart upload needed",
                total_length, self.min_part_size
            );
            return Ok(UploadPlan::single(total_length, self.min_part_size.into()));
        }

        let max_part_count = NonZeroU64::try_from(self.max_part_count)
            .map_err(|err| Error::new(ErrorKind::InvalidArgument, err))?;
        let chunk_size = ceil_div(total_length, max_part_count).max(self.min_part_size.get());
        if chunk_size > self.max_part_size.get() {
            return Err(Error::new_with_msg(
                ErrorKind::InvalidArgument,
                format!(
                    "{} bytes can not be split into at most {} parts of at most {} bytes",
                    total_length, self.max_part_count, self.max_part_size
                ),
            ));
        }
        let chunk_size = PartSize::new(chunk_size).ok_or_else(|| {
            Error::new_with_msg(ErrorKind::InvalidArgument, "Computed chunk size is zero")
        })?;
        let part_count = ceil_div(total_length, chunk_size.as_non_zero_u64());
        let part_count = usize::try_from(part_count).map_err(|err| Error::new(ErrorKind::InvalidArgument, err))?;
        debug!(
            "{} bytes will be uploaded in {} parts of {} bytes",
            total_length, part_count, chunk_size.as_u64()
        );
        Ok(UploadPlan::multi_parts(total_length, chunk_size, part_count))
    }
}

/// 根据总长度和分片边界计算上传计划
#[inline]
pub fn plan(
    total_length: u64,
    min_part_size: u64,
    max_part_size: u64,
    max_part_count: usize,
) -> UploadResult<UploadPlan> {
    BoundedSlicingAlgorithm::new(min_part_size, max_part_size, max_part_count)?.plan(total_length)
}
