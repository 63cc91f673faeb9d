use super::{lock, Payload, PayloadSlice, Reset};
use std::{
    fmt::Debug,
    fs::File,
    io::{Read, Result as IoResult, Seek, SeekFrom},
    path::Path,
    sync::{Arc, Mutex},
};

/// 可寻址的数据源
///
/// 任何实现了 [`Read`] 和 [`Seek`] 的输入流都可以作为数据源，例如文件。
/// 所有分片共享同一个输入流，读取时按需寻址，不会将数据读入内存。
#[derive(Debug, Clone)]
pub struct SeekablePayload {
    stream: Arc<Mutex<SharedStream>>,
    base_offset: u64,
    content_length: Option<u64>,
}

impl SeekablePayload {
    /// 创建可寻址的数据源
    ///
    /// 数据源从输入流的当前位置开始，`content_length` 为声明的数据长度。
    pub fn new(mut stream: impl Read + Seek + Debug + Send + 'static, content_length: Option<u64>) -> IoResult<Self> {
        let base_offset = stream.stream_position()?;
        Ok(Self {
            stream: Arc::new(Mutex::new(SharedStream {
                stream: Box::new(stream),
                position: Some(base_offset),
            })),
            base_offset,
            content_length,
        })
    }

    /// 打开文件作为数据源
    ///
    /// 文件大小即为声明的数据长度
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        let file = File::open(path.as_ref())?;
        let content_length = file.metadata()?.len();
        Self::new(file, Some(content_length))
    }
}

impl Payload for SeekablePayload {
    #[inline]
    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn readable_length(&self) -> IoResult<u64> {
        let end = lock(&self.stream)?.end()?;
        Ok(end.saturating_sub(self.base_offset))
    }

    #[inline]
    fn slice_range(&self, offset: u64, len: u64) -> IoResult<PayloadSlice> {
        let window = SeekableSource {
            stream: self.stream.to_owned(),
            start: self.base_offset + offset,
            len,
            consumed: 0,
        };
        Ok(PayloadSlice::seekable(offset, window))
    }
}

/// 共享输入流上的一段读取窗口
#[derive(Debug)]
pub(super) struct SeekableSource {
    stream: Arc<Mutex<SharedStream>>,
    start: u64,
    len: u64,
    consumed: u64,
}

impl SeekableSource {
    #[inline]
    pub(super) fn len(&self) -> u64 {
        self.len
    }
}

impl Read for SeekableSource {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let remaining = self.len - self.consumed;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let limit = usize::try_from(remaining).map_or(buf.len(), |remaining| remaining.min(buf.len()));
        let have_read = lock(&self.stream)?.read_at(self.start + self.consumed, &mut buf[..limit])?;
        self.consumed += have_read as u64;
        Ok(have_read)
    }
}

impl Reset for SeekableSource {
    #[inline]
    fn reset(&mut self) -> IoResult<()> {
        self.consumed = 0;
        Ok(())
    }
}

trait ReadSeek: Read + Seek + Send + Debug {}
impl<T: Read + Seek + Send + Debug> ReadSeek for T {}

/// 被多个窗口共享的输入流，缓存当前位置以省去连续读取时的寻址
#[derive(Debug)]
struct SharedStream {
    stream: Box<dyn ReadSeek>,
    position: Option<u64>,
}

impl SharedStream {
    fn read_at(&mut self, position: u64, buf: &mut [u8]) -> IoResult<usize> {
        if self.position != Some(position) {
            self.position = None;
            self.stream.seek(SeekFrom::Start(position))?;
        }
        let have_read = self.stream.read(buf)?;
        self.position = Some(position + have_read as u64);
        Ok(have_read)
    }

    fn end(&mut self) -> IoResult<u64> {
        self.position = None;
        let end = self.stream.seek(SeekFrom::End(0))?;
        self.position = Some(end);
        Ok(end)
    }
}
