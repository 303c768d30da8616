//! Blob storage.
//!
//! The [`backend::BlobStore`] trait abstracts over where uploaded bytes
//! physically live.  Implementations cover the local filesystem and an
//! in-memory map.

pub mod backend;
pub mod local;
pub mod memory;
pub mod probe;
