use super::{Error, PartDescriptor};
use std::{
    fmt::{self, Debug},
    num::NonZeroUsize,
};

type PartUploadedCallback = Box<dyn Fn(&PartUploadedInfo) + Send + Sync>;
type PartAttemptFailedCallback = Box<dyn Fn(&PartAttemptFailedInfo) + Send + Sync>;

/// 上传回调
///
/// 回调只用于观察上传进度，无法取消上传。
/// 并行上传时回调会在工作线程中被调用。
#[derive(Default)]
pub struct UploadCallbacks {
    part_uploaded_callbacks: Vec<PartUploadedCallback>,
    part_attempt_failed_callbacks: Vec<PartAttemptFailedCallback>,
}

impl UploadCallbacks {
    /// 设置分片上传成功回调
    #[inline]
    pub fn on_part_uploaded(&mut self, callback: impl Fn(&PartUploadedInfo) + Send + Sync + 'static) -> &mut Self {
        self.part_uploaded_callbacks.push(Box::new(callback));
        self
    }

    /// 设置分片单次上传失败回调
    #[inline]
    pub fn on_part_attempt_failed(
        &mut self,
        callback: impl Fn(&PartAttemptFailedInfo) + Send + Sync + 'static,
    ) -> &mut Self {
        self.part_attempt_failed_callbacks.push(Box::new(callback));
        self
    }

    pub(crate) fn part_uploaded(&self, info: &PartUploadedInfo) {
        for callback in self.part_uploaded_callbacks.iter() {
            callback(info);
        }
    }

    pub(crate) fn part_attempt_failed(&self, info: &PartAttemptFailedInfo) {
        for callback in self.part_attempt_failed_callbacks.iter() {
            callback(info);
        }
    }
}

impl Debug for UploadCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCallbacks").finish()
    }
}

/// 分片上传成功信息
#[derive(Debug)]
pub struct PartUploadedInfo<'a> {
    part_number: NonZeroUsize,
    part: &'a PartDescriptor,
    attempts: usize,
}

impl<'a> PartUploadedInfo<'a> {
    pub(crate) fn new(part_number: NonZeroUsize, part: &'a PartDescriptor, attempts: usize) -> Self {
        Self {
            part_number,
            part,
            attempts,
        }
    }

    #[inline]
    pub fn part_number(&self) -> NonZeroUsize {
        self.part_number
    }

    #[inline]
    pub fn part(&self) -> &'a PartDescriptor {
        self.part
    }

    /// 获取上传该分片所用的尝试次数
    #[inline]
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

/// 分片单次上传失败信息
#[derive(Debug)]
pub struct PartAttemptFailedInfo<'a> {
    part_number: NonZeroUsize,
    part_name: &'a str,
    attempt: usize,
    error: &'a Error,
}

impl<'a> PartAttemptFailedInfo<'a> {
    pub(crate) fn new(part_number: NonZeroUsize, part_name: &'a str, attempt: usize, error: &'a Error) -> Self {
        Self {
            part_number,
            part_name,
            attempt,
            error,
        }
    }

    #[inline]
    pub fn part_number(&self) -> NonZeroUsize {
        self.part_number
    }

    #[inline]
    pub fn part_name(&self) -> &'a str {
        self.part_name
    }

    #[inline]
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    #[inline]
    pub fn error(&self) -> &'a Error {
        self.error
    }
}
