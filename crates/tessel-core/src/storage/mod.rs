//! # Storage Backends
//!
//! Disk persistence for sale state.

mod redb_store;

pub use redb_store::RedbStore;
