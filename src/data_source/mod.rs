use assert_impl::assert_impl;
use auto_impl::auto_impl;
use std::{
    fmt::Debug,
    io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult},
    sync::{Mutex, MutexGuard},
};

/// 可重置接口
///
/// 重置后可以从头重新读取数据，重试上传分片时需要重新读取分片数据。
pub trait Reset {
    /// 重置输入流
    fn reset(&mut self) -> IoResult<()>;
}

/// 数据源接口
///
/// 提供上传所用的数据源，必须声明数据长度，并且能够提供任意区间的独立读取视图。
#[auto_impl(&, &mut, Box, Arc)]
pub trait Payload: Debug + Sync + Send {
    /// 获取数据源声明的长度
    ///
    /// 返回 [`None`] 表示长度未知，此时无法进行分片上传。
    fn content_length(&self) -> Option<u64>;

    /// 获取数据源实际可读取的长度
    fn readable_length(&self) -> IoResult<u64>;

    /// 获取数据源指定区间的读取视图
    ///
    /// 返回的视图可以被独立读取，不需要将整个数据源读入内存。
    fn slice_range(&self, offset: u64, len: u64) -> IoResult<PayloadSlice>;
}

/// 数据源分片
///
/// 数据源中一段有界的区间，可以被独立读取和重置
#[derive(Debug)]
pub struct PayloadSlice {
    inner: PayloadSliceInner,
    offset: u64,
    len: u64,
}

#[derive(Debug)]
enum PayloadSliceInner {
    Seekable(SeekableSource),
    InMemory(InMemorySource),
}

impl PayloadSlice {
    #[inline]
    fn seekable(offset: u64, source: SeekableSource) -> Self {
        Self {
            offset,
            len: source.len(),
            inner: PayloadSliceInner::Seekable(source),
        }
    }

    /// 创建内存数据源分片
    ///
    /// `offset` 为分片在数据源中的偏移量
    #[inline]
    pub fn in_memory(offset: u64, source: InMemorySource) -> Self {
        Self {
            offset,
            len: source.len(),
            inner: PayloadSliceInner::InMemory(source),
        }
    }

    /// 获取分片在数据源中的偏移量
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 获取分片长度
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Read for PayloadSlice {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        match &mut self.inner {
            PayloadSliceInner::Seekable(source) => source.read(buf),
            PayloadSliceInner::InMemory(source) => source.read(buf),
        }
    }
}

impl Reset for PayloadSlice {
    #[inline]
    fn reset(&mut self) -> IoResult<()> {
        match &mut self.inner {
            PayloadSliceInner::Seekable(source) => source.reset(),
            PayloadSliceInner::InMemory(source) => source.reset(),
        }
    }
}

pub(super) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> IoResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| IoError::new(IoErrorKind::Other, "payload source lock is poisoned"))
}

mod seekable;
use seekable::SeekableSource;
pub use seekable::SeekablePayload;

mod bytes;
pub use bytes::{BytesPayload, InMemorySource};

mod slicer;
pub use slicer::{PayloadSlicer, Slices};
