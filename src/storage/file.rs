//! File persistence for map hash tables.
//!
//! A table file is a short header followed by the table buffer. Saves go to
//! a temporary file that atomically replaces the previous one.

use crate::error::{MapGridError, Result};
use crate::map::{ItemStore, MapHashTable};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TABLE_MAGIC: &[u8] = b"MAPGRID_HASH";
const TABLE_VERSION: u8 = 1;

/// A hash table stored on disk.
#[derive(Debug, Clone)]
pub struct HashTableFile {
    path: PathBuf,
}

impl HashTableFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the table, resolving items against `store`.
    pub fn load<S: ItemStore>(&self, store: Arc<S>) -> Result<MapHashTable<S>> {
        let mut data = Bytes::from(std::fs::read(&self.path)?);

        let header_len = TABLE_MAGIC.len() + 4 + 1;
        if data.remaining() < header_len {
            return Err(MapGridError::UnexpectedEof {
                needed: header_len,
                remaining: data.remaining(),
            });
        }
        if data.split_to(TABLE_MAGIC.len()) != TABLE_MAGIC {
            return Err(MapGridError::InvalidFormat(format!(
                "{} is not a hash table file",
                self.path.display()
            )));
        }
        let version = data.get_u8();
        if version != TABLE_VERSION {
            return Err(MapGridError::InvalidFormat(format!(
                "unsupported hash table version {}",
                version
            )));
        }
        let map_id = data.get_u32();
        if map_id != store.map_id() {
            return Err(MapGridError::InvalidInput(format!(
                "table in {} belongs to map {}, store holds map {}",
                self.path.display(),
                map_id,
                store.map_id()
            )));
        }

        let table = MapHashTable::load(store, &mut data)?;
        if data.has_remaining() {
            log::warn!(
                "{} trailing bytes after hash table in {}",
                data.remaining(),
                self.path.display()
            );
        }
        Ok(table)
    }

    /// Write `table`, replacing any previous file.
    pub fn save<S: ItemStore>(&self, table: &MapHashTable<S>) -> Result<()> {
        let mut buf = BytesMut::with_capacity(
            TABLE_MAGIC.len() + 1 + 4 + table.size_in_data_buffer(),
        );
        buf.put_slice(TABLE_MAGIC);
        buf.put_u8(TABLE_VERSION);
        buf.put_u32(table.map_id());
        table.save(&mut buf);

        let temp_path = self.temp_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;
        self.sync_parent_dir()?;

        log::debug!(
            "saved hash table for map {} to {} ({} bytes)",
            table.map_id(),
            self.path.display(),
            buf.len()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let mut new_name = name.to_string_lossy().into_owned();
            new_name.push_str(".tmp");
            temp.set_file_name(new_name);
        }
        temp
    }

    fn sync_parent_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                File::open(parent)?.sync_all()?;
            }
            _ => {}
        }
        Ok(())
    }
}
