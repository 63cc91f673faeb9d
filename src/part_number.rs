use std::{
    num::NonZeroUsize,
    sync::atomic::{AtomicUsize, Ordering},
};

/// 分片编号分配器
///
/// 从 `1` 开始单调递增分配分片编号，可以被多个线程同时调用。
/// 每次上传都应当使用新的分配器，不可在不同上传之间复用。
#[derive(Debug)]
pub struct PartNumberAllocator {
    next: AtomicUsize,
}

impl PartNumberAllocator {
    #[inline]
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(1),
        }
    }

    /// 分配下一个分片编号
    #[inline]
    pub fn next_part_number(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.next.fetch_add(1, Ordering::SeqCst)).expect("Part number is too big")
    }

    /// 获取已经分配的分片数量
    #[inline]
    pub fn allocated(&self) -> usize {
        self.next.load(Ordering::SeqCst) - 1
    }
}

impl Default for PartNumberAllocator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeSet, sync::Arc, thread::spawn as spawn_thread};

    #[test]
    fn test_part_numbers_start_at_one() {
        let allocator = PartNumberAllocator::new();
        assert_eq!(allocator.allocated(), 0);
        assert_eq!(allocator.next_part_number().get(), 1);
        assert_eq!(allocator.next_part_number().get(), 2);
        assert_eq!(allocator.next_part_number().get(), 3);
        assert_eq!(allocator.allocated(), 3);
    }

    #[test]
    fn test_concurrent_allocations_are_unique() {
        let allocator = Arc::new(PartNumberAllocator::new());
        let threads = (0..8)
            .map(|_| {
                let allocator = allocator.to_owned();
                spawn_thread(move || (0..1000).map(|_| allocator.next_part_number().get()).collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();
        let numbers = threads
            .into_iter()
            .flat_map(|thread| thread.join().unwrap())
            .collect::<BTreeSet<_>>();
        assert_eq!(numbers.len(), 8000);
        assert_eq!(numbers.first(), Some(&1));
        assert_eq!(numbers.last(), Some(&8000));
    }
}
