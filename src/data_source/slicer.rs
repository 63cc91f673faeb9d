use super::{
    super::{data_partition_provider::ceil_div, Error, ErrorKind, PartSize, UploadResult},
    Payload, PayloadSlice,
};
use std::iter::FusedIterator;

/// 数据源切片器
///
/// 将数据源切分为长度为 `chunk_size` 的若干分片，最后一个分片的长度可能小于 `chunk_size`。
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadSlicer;

impl PayloadSlicer {
    /// 切分数据源
    ///
    /// 切分前会通过 [`PayloadSlicer::verify_length`] 检查数据源的长度。
    ///
    /// 返回的分片序列是惰性的，只能向前遍历一次。
    pub fn slice<'p>(&self, payload: &'p dyn Payload, chunk_size: PartSize) -> UploadResult<Slices<'p>> {
        let total_length = self.verify_length(payload)?;
        Ok(Slices {
            payload,
            chunk_size,
            total_length,
            offset: 0,
        })
    }

    /// 检查数据源声明的长度
    ///
    /// 如果未声明长度，或声明的长度与实际可读取的长度不一致，将返回 [`ErrorKind::LengthMismatch`]。
    pub fn verify_length(&self, payload: &dyn Payload) -> UploadResult<u64> {
        let Some(declared) = payload.content_length() else {
            return Err(Error::new_with_msg(
                ErrorKind::LengthMismatch,
                "Payload does not declare its content length",
            ));
        };
        let readable = payload.readable_length()?;
        if declared != readable {
            return Err(Error::new_with_msg(
                ErrorKind::LengthMismatch,
                format!("Payload declares {declared} bytes but {readable} bytes are readable"),
            ));
        }
        Ok(declared)
    }
}

/// 数据源分片序列
#[derive(Debug)]
pub struct Slices<'p> {
    payload: &'p dyn Payload,
    chunk_size: PartSize,
    total_length: u64,
    offset: u64,
}

impl Slices<'_> {
    /// 获取剩余的分片数量
    #[inline]
    pub fn remaining(&self) -> u64 {
        ceil_div(self.total_length - self.offset, self.chunk_size.as_non_zero_u64())
    }
}

impl Iterator for Slices<'_> {
    type Item = UploadResult<PayloadSlice>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.total_length {
            return None;
        }
        let len = self.chunk_size.as_u64().min(self.total_length - self.offset);
        match self.payload.slice_range(self.offset, len) {
            Ok(slice) => {
                self.offset += len;
                Some(Ok(slice))
            }
            Err(err) => {
                self.offset = self.total_length;
                Some(Err(err.into()))
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for Slices<'_> {}

#[cfg(test)]
mod tests {
    use super::{super::BytesPayload, *};
    use anyhow::Result;
    use std::io::Read;

    fn part_size(size: u64) -> PartSize {
        PartSize::new(size).unwrap()
    }

    #[test]
    fn test_slices_cover_whole_payload() -> Result<()> {
        let data = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();
        let payload = BytesPayload::new(data.to_owned());
        let slices = PayloadSlicer.slice(&payload, part_size(300))?;
        assert_eq!(slices.remaining(), 4);

        let mut lengths = Vec::new();
        let mut joined = Vec::new();
        for slice in slices {
            let mut slice = slice?;
            assert_eq!(slice.offset(), joined.len() as u64);
            lengths.push(slice.len());
            slice.read_to_end(&mut joined)?;
        }
        assert_eq!(lengths, vec![300, 300, 300, 100]);
        assert_eq!(joined, data);
        Ok(())
    }

    #[test]
    fn test_evenly_divisible_payload() -> Result<()> {
        let payload = BytesPayload::new(vec![0u8; 25]);
        let lengths = PayloadSlicer
            .slice(&payload, part_size(5))?
            .map(|slice| slice.map(|slice| slice.len()))
            .collect::<UploadResult<Vec<_>>>()?;
        assert_eq!(lengths, vec![5; 5]);
        Ok(())
    }

    #[test]
    fn test_slices_are_lazy() -> Result<()> {
        let payload = BytesPayload::new(vec![0u8; 10]);
        let mut slices = PayloadSlicer.slice(&payload, part_size(4))?;
        assert_eq!(slices.size_hint(), (3, Some(3)));
        slices.next().unwrap()?;
        assert_eq!(slices.remaining(), 2);
        slices.next().unwrap()?;
        slices.next().unwrap()?;
        assert!(slices.next().is_none());
        assert!(slices.next().is_none());
        Ok(())
    }

    #[test]
    fn test_length_mismatch() {
        let absent = BytesPayload::with_content_length(vec![0u8; 10], None);
        let err = PayloadSlicer.slice(&absent, part_size(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);

        let wrong = BytesPayload::with_content_length(vec![0u8; 10], Some(12));
        let err = PayloadSlicer.slice(&wrong, part_size(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);

        let longer = BytesPayload::with_content_length(vec![0u8; 10], Some(8));
        let err = PayloadSlicer.verify_length(&longer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LengthMismatch);
    }
}
