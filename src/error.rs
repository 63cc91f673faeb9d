use anyhow::Error as AnyError;
use assert_impl::assert_impl;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io::Error as IoError,
    result::Result as StdResult,
};

/// 上传错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 参数错误
    ///
    /// 分片大小边界非法，或对象大小无法在最大分片数内被切分
    InvalidArgument,

    /// 前置条件不满足
    ///
    /// 数据源未声明长度
    PreconditionFailed,

    /// 数据源声明的长度与实际可读取的长度不一致
    LengthMismatch,

    /// 分片上传失败
    ///
    /// 并行上传时表示分片已经耗尽重试次数，串行上传时表示分片上传失败一次
    PartUploadFailed,

    /// 上传被中止
    ///
    /// 至少有一个分片可能已经上传成功，已上传的分片不会被清理
    UploadAborted,

    /// 存储服务调用失败
    StorageError,

    /// 本地 IO 错误
    LocalIoError,

    /// 系统调用失败
    SystemCallError,
}

/// 上传错误
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
}

/// 上传结果
pub type UploadResult<T> = StdResult<T, Error>;

impl Error {
    /// 创建上传错误
    #[inline]
    pub fn new(kind: ErrorKind, err: impl Into<AnyError>) -> Self {
        Self {
            kind,
            error: err.into(),
        }
    }

    /// 创建上传错误
    #[inline]
    pub fn new_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self {
            kind,
            error: AnyError::msg(msg),
        }
    }

    /// 获取上传错误类型
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误内部信息
    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }

    pub(crate) fn part_upload_failed(part_name: &str, attempts: usize, last_error: Error) -> Self {
        Self::new(
            ErrorKind::PartUploadFailed,
            AnyError::new(last_error).context(format!("Could not upload part {part_name} after {attempts} attempt(s)")),
        )
    }

    pub(crate) fn upload_aborted(key: &str, cause: Error) -> Self {
        Self::new(
            ErrorKind::UploadAborted,
            AnyError::new(cause).context(format!("Multipart upload of {key} was aborted")),
        )
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:?}] {:#}", self.kind, self.error)
    }
}

impl StdError for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

impl From<IoError> for Error {
    #[inline]
    fn from(error: IoError) -> Self {
        Self::new(ErrorKind::LocalIoError, error)
    }
}
