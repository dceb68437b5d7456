//! Persistence of map hash tables.
//!
//! [`MapHashTable::save`](crate::map::MapHashTable::save) and
//! [`MapHashTable::load`](crate::map::MapHashTable::load) work on any
//! `bytes` buffer; [`HashTableFile`] stores a table on disk.

mod codec;
mod file;

pub use file::HashTableFile;
