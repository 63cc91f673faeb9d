use auto_impl::auto_impl;
use std::{fmt::Debug, num::NonZeroUsize};

/// 分片命名策略接口
///
/// 对于同一次上传，不同的分片编号必须得到不同的分片名称，相同的输入必须得到相同的分片名称。
#[auto_impl(&, &mut, Box, Arc)]
pub trait NamingStrategy: Debug + Sync + Send {
    /// 获取分片名称
    fn part_name(&self, base_key: &str, part_number: NonZeroUsize, part_count: usize) -> String;
}

/// 补零命名策略
///
/// 分片名称为 `{base_key}-{part_number}`，其中分片编号左侧补零至分片数量的位数，
/// 使分片名称的字典序与分片编号的顺序一致。
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPaddedNamingStrategy;

impl NamingStrategy for ZeroPaddedNamingStrategy {
    #[inline]
    fn part_name(&self, base_key: &str, part_number: NonZeroUsize, part_count: usize) -> String {
        let width = digit_count(part_count.max(part_number.get()));
        format!("{base_key}-{part_number:0width$}")
    }
}

fn digit_count(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
