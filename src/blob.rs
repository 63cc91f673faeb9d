use super::Payload;

/// 待上传的对象
///
/// 包含对象名称和数据源
#[derive(Debug)]
pub struct Blob {
    key: String,
    payload: Box<dyn Payload>,
}

impl Blob {
    /// 创建待上传的对象
    #[inline]
    pub fn new(key: impl Into<String>, payload: impl Payload + 'static) -> Self {
        Self {
            key: key.into(),
            payload: Box::new(payload),
        }
    }

    /// 创建待上传的对象构建器
    #[inline]
    pub fn builder(key: impl Into<String>) -> BlobBuilder {
        BlobBuilder {
            key: key.into(),
            payload: None,
        }
    }

    /// 获取对象名称
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 获取数据源
    #[inline]
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    #[inline]
    pub fn into_parts(self) -> (String, Box<dyn Payload>) {
        (self.key, self.payload)
    }
}

/// 待上传的对象构建器
#[derive(Debug)]
pub struct BlobBuilder {
    key: String,
    payload: Option<Box<dyn Payload>>,
}

impl BlobBuilder {
    /// 设置数据源
    #[inline]
    pub fn payload(&mut self, payload: impl Payload + 'static) -> &mut Self {
        self.payload = Some(Box::new(payload));
        self
    }

    /// 构建待上传的对象
    ///
    /// 如果没有设置数据源，返回 [`None`]
    #[inline]
    pub fn build(&mut self) -> Option<Blob> {
        self.payload.take().map(|payload| Blob {
            key: self.key.to_owned(),
            payload,
        })
    }
}
