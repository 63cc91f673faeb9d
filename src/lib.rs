#![deny(
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    non_ascii_idents,
    indirect_structural_match,
    trivial_numeric_casts,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

//! # multipart-upload-manager
//!
//! 分片上传引擎
//!
//! 将大对象切分为若干分片，串行或并行上传到分段式对象存储，最后发布按顺序排列的分片清单，
//! 使存储服务将其作为一个对象对外提供。不超过分片阈值的对象会被直接上传。
//!
//! 签名、区域解析和 HTTP 传输都不在本库范围内，由 [`ObjectStorageClient`] 的实现者负责。

mod blob;
mod callbacks;
mod config;
mod data_partition_provider;
mod data_source;
mod error;
mod naming_strategy;
mod object_storage;
mod part_number;
mod retrier;
mod scheduler;
mod worker_pool;

pub use blob::{Blob, BlobBuilder};
pub use callbacks::{PartAttemptFailedInfo, PartUploadedInfo, UploadCallbacks};
pub use config::{
    build_strategy, MultipartUploadConfig, MultipartUploadConfigBuilder, StrategyKind, DEFAULT_MAX_PART_COUNT,
    DEFAULT_MAX_PART_SIZE, DEFAULT_MIN_PART_SIZE, DEFAULT_QUEUE_CAPACITY, DEFAULT_RETRIES, DEFAULT_WORKER_COUNT,
};
pub use data_partition_provider::{plan, BoundedSlicingAlgorithm, PartSize, SlicingAlgorithm, UploadPlan};
pub use data_source::{
    BytesPayload, InMemorySource, Payload, PayloadSlice, PayloadSlicer, Reset, SeekablePayload, Slices,
};
pub use error::{Error, ErrorKind, UploadResult};
pub use naming_strategy::{NamingStrategy, ZeroPaddedNamingStrategy};
pub use object_storage::{Manifest, ObjectStorageClient, PartDescriptor};
pub use part_number::PartNumberAllocator;
pub use retrier::{Backoff, FixedBackoff, PartRetrier, NO_BACKOFF};
pub use scheduler::{
    MultipartUploadStrategy, MultipartUploadStrategyExt, ParallelMultipartUploadStrategy,
    SequentialMultipartUploadStrategy,
};
pub use worker_pool::{PendingResult, WorkerPool};

pub mod prelude {
    pub use super::{MultipartUploadStrategy, MultipartUploadStrategyExt, ObjectStorageClient, Payload, Reset};
}
