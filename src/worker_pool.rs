use super::{Error, ErrorKind, UploadResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use std::{num::NonZeroUsize, thread::Builder as ThreadBuilder};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// 有界工作线程池
///
/// 固定数量的工作线程从容量有限的任务队列中取出任务执行。
/// 队列已满时提交任务会阻塞提交者，直到有工作线程取走任务。
///
/// 线程池被丢弃后，已经提交的任务仍会被执行完毕，之后工作线程自行退出，不会取消任何任务。
#[derive(Debug)]
pub struct WorkerPool {
    sender: Sender<Job>,
    worker_count: NonZeroUsize,
    queue_capacity: NonZeroUsize,
}

impl WorkerPool {
    /// 创建有界工作线程池
    ///
    /// 工作线程名称为 `{thread_name_prefix}.{index}`
    pub fn new(
        worker_count: NonZeroUsize,
        queue_capacity: NonZeroUsize,
        thread_name_prefix: &str,
    ) -> UploadResult<Self> {
        let (sender, receiver) = bounded::<Job>(queue_capacity.get());
        for index in 0..worker_count.get() {
            let receiver = receiver.to_owned();
            ThreadBuilder::new()
                .name(format!("{thread_name_prefix}.{index}"))
                .spawn(move || work(receiver))
                .map_err(|err| Error::new(ErrorKind::SystemCallError, err))?;
        }
        Ok(Self {
            sender,
            worker_count,
            queue_capacity,
        })
    }

    #[inline]
    pub fn worker_count(&self) -> NonZeroUsize {
        self.worker_count
    }

    #[inline]
    pub fn queue_capacity(&self) -> NonZeroUsize {
        self.queue_capacity
    }

    /// 提交任务
    ///
    /// 任务队列已满时阻塞。返回的 [`PendingResult`] 可以用于等待任务结果。
    pub fn submit<T: Send + 'static>(
        &self,
        task: impl FnOnce() -> T + Send + 'static,
    ) -> UploadResult<PendingResult<T>> {
        let (result_sender, result_receiver) = bounded(1);
        let job: Job = Box::new(move || {
            result_sender.send(task()).ok();
        });
        self.sender
            .send(job)
            .map_err(|_| Error::new_with_msg(ErrorKind::SystemCallError, "All workers of the pool have exited"))?;
        Ok(PendingResult {
            receiver: result_receiver,
        })
    }
}

fn work(receiver: Receiver<Job>) {
    for job in receiver.iter() {
        job();
    }
    debug!("Task queue is closed, worker exits");
}

/// 等待中的任务结果
#[derive(Debug)]
pub struct PendingResult<T> {
    receiver: Receiver<T>,
}

impl<T> PendingResult<T> {
    /// 阻塞等待任务结果
    #[inline]
    pub fn wait(self) -> UploadResult<T> {
        self.receiver.recv().map_err(|_| {
            Error::new_with_msg(
                ErrorKind::SystemCallError,
                "Worker exited without reporting the task result",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread::{current as current_thread, sleep, spawn as spawn_thread},
        time::Duration,
    };

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_results_are_collected_in_submission_order() -> Result<()> {
        let pool = WorkerPool::new(nz(4), nz(16), "test-pool")?;
        let pending = (0..32u64)
            .map(|i| {
                pool.submit(move || {
                    sleep(Duration::from_millis((32 - i) % 7));
                    i
                })
            })
            .collect::<UploadResult<Vec<_>>>()?;
        let results = pending
            .into_iter()
            .map(PendingResult::wait)
            .collect::<UploadResult<Vec<_>>>()?;
        assert_eq!(results, (0..32).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_workers_are_named() -> Result<()> {
        let pool = WorkerPool::new(nz(1), nz(1), "named-pool")?;
        let name = pool.submit(|| current_thread().name().map(ToOwned::to_owned))?.wait()?;
        assert_eq!(name.as_deref(), Some("named-pool.0"));
        Ok(())
    }

    #[test]
    fn test_submission_blocks_when_queue_is_full() -> Result<()> {
        let pool = WorkerPool::new(nz(1), nz(1), "backpressure-pool")?;
        let (release_sender, release_receiver) = bounded::<()>(0);
        let submitted = Arc::new(AtomicUsize::new(0));

        let submitter = {
            let submitted = submitted.to_owned();
            spawn_thread(move || -> UploadResult<Vec<PendingResult<usize>>> {
                let mut pending = Vec::new();
                for i in 0..3 {
                    let release_receiver = release_receiver.to_owned();
                    pending.push(pool.submit(move || {
                        release_receiver.recv().ok();
                        i
                    })?);
                    submitted.fetch_add(1, Ordering::SeqCst);
                }
                Ok(pending)
            })
        };

        sleep(Duration::from_millis(300));
        assert_eq!(submitted.load(Ordering::SeqCst), 2);

        release_sender.send(())?;
        for _ in 0..100 {
            if submitted.load(Ordering::SeqCst) == 3 {
                break;
            }
            sleep(Duration::from_millis(10));
        }
        assert_eq!(submitted.load(Ordering::SeqCst), 3);

        release_sender.send(())?;
        release_sender.send(())?;
        let results = submitter
            .join()
            .unwrap()?
            .into_iter()
            .map(PendingResult::wait)
            .collect::<UploadResult<Vec<_>>>()?;
        assert_eq!(results, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_dropped_pool_finishes_queued_tasks() -> Result<()> {
        let finished = Arc::new(AtomicUsize::new(0));
        let pending = {
            let pool = WorkerPool::new(nz(2), nz(8), "drained-pool")?;
            (0..8)
                .map(|_| {
                    let finished = finished.to_owned();
                    pool.submit(move || {
                        sleep(Duration::from_millis(5));
                        finished.fetch_add(1, Ordering::SeqCst);
                    })
                })
                .collect::<UploadResult<Vec<_>>>()?
        };
        for result in pending {
            result.wait()?;
        }
        assert_eq!(finished.load(Ordering::SeqCst), 8);
        Ok(())
    }
}
