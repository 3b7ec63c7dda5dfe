//! Fracture capture for VEPS.
//!
//! A fracture is the immutable audit record of a vetoed event. This crate
//! provides the [`FractureArchive`] trait over the date-partitioned
//! append-only archive, an in-memory implementation for tests, a local
//! directory implementation writing hour-bucket JSONL files, and the
//! [`FractureRecorder`] that captures rejections fire-and-forget.

pub mod archive;
pub mod dir;
pub mod error;
pub mod layout;
pub mod memory;
pub mod recorder;

pub use archive::FractureArchive;
pub use dir::LocalDirArchive;
pub use error::{ArchiveError, ArchiveResult};
pub use layout::{bucket_path, date_prefix, fracture_bucket, group_by_bucket, CONTENT_TYPE};
pub use memory::InMemoryArchive;
pub use recorder::FractureRecorder;
