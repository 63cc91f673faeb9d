use super::super::{Error, ErrorKind, Manifest, ObjectStorageClient, PayloadSlice, UploadResult};
use crossbeam_channel::{unbounded, Receiver, Sender};
use dashmap::DashMap;
use md5::{Digest, Md5};
use rand::{thread_rng, Rng};
use std::{
    collections::HashMap,
    io::Read,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread::sleep,
    time::Duration,
};

/// 内存中的对象存储
#[derive(Debug, Default)]
pub(super) struct MockStorage {
    parts: DashMap<String, Vec<u8>>,
    objects: DashMap<String, Vec<u8>>,
    manifests: Mutex<Vec<(String, Manifest)>>,
    failures: DashMap<String, usize>,
    put_part_calls: AtomicUsize,
    put_whole_calls: AtomicUsize,
    replace_manifest_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    max_delay_millis: u64,
    reject_manifest: bool,
    gate: Option<Receiver<()>>,
}

impl MockStorage {
    pub(super) fn with_random_delay(max_delay_millis: u64) -> Self {
        Self {
            max_delay_millis,
            ..Default::default()
        }
    }

    pub(super) fn rejecting_manifest() -> Self {
        Self {
            reject_manifest: true,
            ..Default::default()
        }
    }

    /// 每次上传分片前都需要从返回的发送端获得一次放行
    pub(super) fn gated() -> (Self, Sender<()>) {
        let (sender, receiver) = unbounded();
        let storage = Self {
            gate: Some(receiver),
            ..Default::default()
        };
        (storage, sender)
    }

    /// 令指定分片的前 `times` 次上传失败
    pub(super) fn fail_part(&self, part_name: &str, times: usize) {
        self.failures.insert(part_name.to_owned(), times);
    }

    pub(super) fn put_part_calls(&self) -> usize {
        self.put_part_calls.load(Ordering::SeqCst)
    }

    pub(super) fn put_whole_calls(&self) -> usize {
        self.put_whole_calls.load(Ordering::SeqCst)
    }

    pub(super) fn replace_manifest_calls(&self) -> usize {
        self.replace_manifest_calls.load(Ordering::SeqCst)
    }

    pub(super) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(super) fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.get(key).map(|object| object.to_owned())
    }

    pub(super) fn part(&self, part_name: &str) -> Option<Vec<u8>> {
        self.parts.get(part_name).map(|part| part.to_owned())
    }

    pub(super) fn last_manifest(&self) -> Option<(String, Manifest)> {
        self.manifests.lock().unwrap().last().cloned()
    }

    /// 按清单顺序拼接已上传的分片
    pub(super) fn assemble(&self, manifest: &Manifest) -> Vec<u8> {
        manifest
            .iter()
            .flat_map(|part| self.part(part.name()).unwrap_or_default())
            .collect()
    }

    fn take_failure(&self, part_name: &str) -> bool {
        if let Some(mut remaining) = self.failures.get_mut(part_name) {
            if *remaining > 0 {
                *remaining -= 1;
                return true;
            }
        }
        false
    }

    fn random_delay(&self) {
        if self.max_delay_millis > 0 {
            sleep(Duration::from_millis(thread_rng().gen_range(0..=self.max_delay_millis)));
        }
    }
}

pub(super) fn etag_of(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

impl ObjectStorageClient for MockStorage {
    fn put_part(
        &self,
        _region: &str,
        _container: &str,
        part_name: &str,
        part: &mut PayloadSlice,
    ) -> UploadResult<String> {
        self.put_part_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.recv().ok();
        }
        self.random_delay();
        let result = if self.take_failure(part_name) {
            Err(Error::new_with_msg(
                ErrorKind::StorageError,
                format!("Injected failure of {part_name}"),
            ))
        } else {
            let mut data = Vec::new();
            part.read_to_end(&mut data)
                .map(|_| {
                    let etag = etag_of(&data);
                    self.parts.insert(part_name.to_owned(), data);
                    etag
                })
                .map_err(Error::from)
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn put_whole(
        &self,
        _region: &str,
        _container: &str,
        key: &str,
        payload: &mut PayloadSlice,
    ) -> UploadResult<String> {
        self.put_whole_calls.fetch_add(1, Ordering::SeqCst);
        let mut data = Vec::new();
        payload.read_to_end(&mut data)?;
        let etag = etag_of(&data);
        self.objects.insert(key.to_owned(), data);
        Ok(etag)
    }

    fn replace_manifest(
        &self,
        _region: &str,
        container: &str,
        key: &str,
        manifest: &Manifest,
        metadata: &HashMap<String, String>,
    ) -> UploadResult<String> {
        self.replace_manifest_calls.fetch_add(1, Ordering::SeqCst);
        assert!(metadata.is_empty());
        if self.reject_manifest {
            return Err(Error::new_with_msg(ErrorKind::StorageError, "Manifest is rejected"));
        }
        self.objects.insert(key.to_owned(), self.assemble(manifest));
        self.manifests
            .lock()
            .unwrap()
            .push((key.to_owned(), manifest.to_owned()));
        Ok(format!("{container}/{key}"))
    }
}
