use super::{Payload, PayloadSlice, Reset};
use std::{
    io::{Read, Result as IoResult},
    sync::Arc,
};

/// 内存数据源
///
/// 所有分片共享同一块内存，切片时不会复制数据
#[derive(Debug, Clone)]
pub struct BytesPayload {
    data: Arc<[u8]>,
    content_length: Option<u64>,
}

impl BytesPayload {
    /// 创建内存数据源
    ///
    /// 数据长度即为声明的数据长度
    #[inline]
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        let content_length = Some(data.len() as u64);
        Self { data, content_length }
    }

    /// 创建内存数据源，并指定声明的数据长度
    ///
    /// 声明的数据长度可以为空，或与实际数据长度不一致，此时数据源无法被切片
    #[inline]
    pub fn with_content_length(data: impl Into<Arc<[u8]>>, content_length: Option<u64>) -> Self {
        Self {
            data: data.into(),
            content_length,
        }
    }
}

impl Payload for BytesPayload {
    #[inline]
    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    #[inline]
    fn readable_length(&self) -> IoResult<u64> {
        Ok(self.data.len() as u64)
    }

    #[inline]
    fn slice_range(&self, offset: u64, len: u64) -> IoResult<PayloadSlice> {
        Ok(PayloadSlice::in_memory(
            offset,
            InMemorySource::new(self.data.to_owned(), offset, len),
        ))
    }
}

/// 内存数据源分片
#[derive(Debug, Clone)]
pub struct InMemorySource {
    data: Arc<[u8]>,
    start: usize,
    end: usize,
    pos: usize,
}

impl InMemorySource {
    /// 创建内存数据源分片
    ///
    /// 超出数据范围的部分将被截断
    #[inline]
    pub fn new(data: Arc<[u8]>, offset: u64, len: u64) -> Self {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let end = usize::try_from(offset.saturating_add(len))
            .unwrap_or(usize::MAX)
            .min(data.len());
        Self {
            data,
            start,
            end,
            pos: start,
        }
    }

    pub(super) fn len(&self) -> u64 {
        (self.end - self.start) as u64
    }
}

impl Read for InMemorySource {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let have_read = (&self.data[self.pos..self.end]).read(buf)?;
        self.pos += have_read;
        Ok(have_read)
    }
}

impl Reset for InMemorySource {
    #[inline]
    fn reset(&mut self) -> IoResult<()> {
        self.pos = self.start;
        Ok(())
    }
}
