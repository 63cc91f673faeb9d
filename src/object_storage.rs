use super::{PayloadSlice, UploadResult};
use auto_impl::auto_impl;
use serde::Serialize;
use std::{collections::HashMap, fmt::Debug, num::NonZeroU64, slice::Iter};

/// 对象存储客户端接口
///
/// 分片上传引擎只依赖这三个操作，签名、区域解析和 HTTP 传输都由实现者负责。
/// 所有操作都是阻塞的。
#[auto_impl(&, &mut, Box, Arc)]
pub trait ObjectStorageClient: Debug + Sync + Send {
    /// 上传一个分片，返回分片的 ETag
    ///
    /// 相同名称的分片可能被重复上传，实现者应当直接覆盖。
    fn put_part(&self, region: &str, container: &str, part_name: &str, part: &mut PayloadSlice)
        -> UploadResult<String>;

    /// 直接上传整个对象，返回对象 ID
    fn put_whole(&self, region: &str, container: &str, key: &str, payload: &mut PayloadSlice) -> UploadResult<String>;

    /// 发布分片清单，将按顺序拼接后的分片作为一个对象，返回对象 ID
    fn replace_manifest(
        &self,
        region: &str,
        container: &str,
        key: &str,
        manifest: &Manifest,
        metadata: &HashMap<String, String>,
    ) -> UploadResult<String>;
}

/// 已上传的分片
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartDescriptor {
    name: String,
    size_bytes: NonZeroU64,
    etag: String,
}

impl PartDescriptor {
    #[inline]
    pub fn new(name: impl Into<String>, size_bytes: NonZeroU64, etag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            etag: etag.into(),
        }
    }

    /// 获取分片名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取分片大小
    #[inline]
    pub fn size_bytes(&self) -> NonZeroU64 {
        self.size_bytes
    }

    /// 获取分片 ETag
    #[inline]
    pub fn etag(&self) -> &str {
        &self.etag
    }
}

/// 分片清单
///
/// 按分片编号升序排列，也就是按分片在数据源中的偏移量升序排列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    parts: Vec<PartDescriptor>,
}

impl Manifest {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            parts: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, part: PartDescriptor) {
        self.parts.push(part);
    }

    #[inline]
    pub fn parts(&self) -> &[PartDescriptor] {
        &self.parts
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, PartDescriptor> {
        self.parts.iter()
    }

    /// 获取所有分片的总大小
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.parts.iter().map(|part| part.size_bytes.get()).sum()
    }
}

impl From<Vec<PartDescriptor>> for Manifest {
    #[inline]
    fn from(parts: Vec<PartDescriptor>) -> Self {
        Self { parts }
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a PartDescriptor;
    type IntoIter = Iter<'a, PartDescriptor>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}
