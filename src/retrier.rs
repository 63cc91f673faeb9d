use super::{Error, UploadResult};
use auto_impl::auto_impl;
use log::{error, warn};
use std::{fmt::Debug, num::NonZeroUsize, sync::Arc, thread::sleep, time::Duration};

/// 退避时长获取接口
///
/// 分片上传失败后，在下一次尝试前等待的时长
#[auto_impl(&, &mut, Box, Arc)]
pub trait Backoff: Debug + Sync + Send {
    /// 获取退避时长
    ///
    /// `attempt` 为刚刚失败的尝试次数，从 `1` 开始
    fn delay(&self, part_name: &str, attempt: usize) -> Duration;
}

/// 无退避，失败后立即重试
pub const NO_BACKOFF: FixedBackoff = FixedBackoff::new(Duration::ZERO);

/// 固定时长退避
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    #[inline]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[inline]
    pub fn fixed_delay(&self) -> Duration {
        self.delay
    }
}

impl Backoff for FixedBackoff {
    #[inline]
    fn delay(&self, _part_name: &str, _attempt: usize) -> Duration {
        self.delay
    }
}

/// 分片重试器
///
/// 每个分片最多尝试 `retries` 次，耗尽后返回 [`super::ErrorKind::PartUploadFailed`]，并携带最后一次的错误
#[derive(Debug, Clone)]
pub struct PartRetrier {
    retries: NonZeroUsize,
    backoff: Arc<dyn Backoff>,
}

impl PartRetrier {
    /// 创建分片重试器，失败后立即重试
    #[inline]
    pub fn new(retries: NonZeroUsize) -> Self {
        Self::new_with_backoff(retries, NO_BACKOFF)
    }

    /// 创建分片重试器，并指定退避策略
    #[inline]
    pub fn new_with_backoff(retries: NonZeroUsize, backoff: impl Backoff + 'static) -> Self {
        Self {
            retries,
            backoff: Arc::new(backoff),
        }
    }

    #[inline]
    pub fn retries(&self) -> NonZeroUsize {
        self.retries
    }

    /// 反复调用 `attempt` 直到成功或耗尽重试次数
    ///
    /// 成功时返回结果和实际尝试的次数，每次失败都会调用 `on_failure`
    pub fn retry<T>(
        &self,
        part_name: &str,
        mut attempt: impl FnMut() -> UploadResult<T>,
        mut on_failure: impl FnMut(usize, &Error),
    ) -> UploadResult<(T, usize)> {
        let retries = self.retries.get();
        let mut tried = 1;
        loop {
            match attempt() {
                Ok(value) => return Ok((value, tried)),
                Err(err) => {
                    warn!("Failed to upload part {} (attempt {}/{}): {}", part_name, tried, retries, err);
                    on_failure(tried, &err);
                    if tried >= retries {
                        error!("Part {} failed after {} attempt(s)", part_name, tried);
                        return Err(Error::part_upload_failed(part_name, tried, err));
                    }
                    let delay = self.backoff.delay(part_name, tried);
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                    tried += 1;
                }
            }
        }
    }
}
