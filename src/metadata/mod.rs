//! Metadata storage layer.
//!
//! The metadata store maps a generated filename to its declared content
//! type and blob path.  The [`store::MetadataStore`] trait defines the
//! interface; [`sqlite::SqliteMetadataStore`] is the default
//! implementation.

pub mod memory;
pub mod sqlite;
pub mod store;
