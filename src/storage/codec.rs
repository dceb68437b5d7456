//! Binary layout of a [`MapHashTable`].
//!
//! All values are big-endian:
//!
//! ```text
//! i32 left, right, bottom, top
//! i32 nbr_vertical_cells, nbr_horizontal_cells
//! i32 horizontal_shift, vertical_shift
//! u32 id_count, then id_count x u32 item id
//! per cell, row-major: u32 index, u32 size
//! ```

use crate::error::{MapGridError, Result};
use crate::grid::{GridParams, LocationHashTable};
use crate::map::{ItemStore, MapHashCell, MapHashTable};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use mapgrid_types::item::ItemId;
use std::sync::Arc;

const HEADER_LEN: usize = 8 * 4;
const CELL_LEN: usize = 2 * 4;

impl<S: ItemStore> MapHashTable<S> {
    /// Exact number of bytes [`save`](Self::save) writes.
    pub fn size_in_data_buffer(&self) -> usize {
        HEADER_LEN + 4 + 4 * self.item_ids().len() + CELL_LEN * self.cells().len()
    }

    /// Write the table to `buf`.
    pub fn save<B: BufMut>(&self, buf: &mut B) {
        let params = self.params();
        buf.put_i32(params.left_horizontal());
        buf.put_i32(params.right_horizontal());
        buf.put_i32(params.bottom_vertical());
        buf.put_i32(params.top_vertical());
        buf.put_i32(params.nbr_vertical_cells() as i32);
        buf.put_i32(params.nbr_horizontal_cells() as i32);
        buf.put_i32(params.horizontal_shift() as i32);
        buf.put_i32(params.vertical_shift() as i32);

        buf.put_u32(self.item_ids().len() as u32);
        for &id in self.item_ids() {
            buf.put_u32(id);
        }

        for cell in self.cells() {
            buf.put_u32(cell.index());
            buf.put_u32(cell.size());
        }
    }

    /// The table serialized into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size_in_data_buffer());
        self.save(&mut buf);
        buf.freeze()
    }

    /// Read a table previously written by [`save`](Self::save).
    ///
    /// Cell bounds are recomputed from the grid parameters. The filter
    /// starts out empty.
    pub fn load<B: Buf>(store: Arc<S>, buf: &mut B) -> Result<Self> {
        let (grid, item_ids) = decode(buf)?;
        log::debug!(
            "loaded hash table for map {}: {} cells, {} ids",
            store.map_id(),
            grid.cells().len(),
            item_ids.len()
        );
        Ok(MapHashTable::assemble(grid, item_ids, store))
    }

    /// Replace grid and contents with a table read from `buf`.
    ///
    /// Nothing of the previous contents survives. On error the table is
    /// left unchanged.
    pub fn reload<B: Buf>(&mut self, buf: &mut B) -> Result<()> {
        let (grid, item_ids) = decode(buf)?;
        self.replace_contents(grid, item_ids);
        Ok(())
    }
}

fn decode<B: Buf>(buf: &mut B) -> Result<(LocationHashTable<MapHashCell>, Vec<ItemId>)> {
    ensure_remaining(buf, HEADER_LEN)?;
    let left = buf.get_i32();
    let right = buf.get_i32();
    let bottom = buf.get_i32();
    let top = buf.get_i32();
    let nbr_vertical = read_count(buf, "vertical cell count")?;
    let nbr_horizontal = read_count(buf, "horizontal cell count")?;
    let horizontal_shift = read_count(buf, "horizontal shift")?;
    let vertical_shift = read_count(buf, "vertical shift")?;
    let params = GridParams::from_raw(
        left,
        right,
        bottom,
        top,
        nbr_vertical,
        nbr_horizontal,
        horizontal_shift,
        vertical_shift,
    )?;

    ensure_remaining(buf, 4)?;
    let nbr_ids = buf.get_u32() as usize;
    ensure_remaining(buf, nbr_ids * 4)?;
    let mut item_ids = Vec::with_capacity(nbr_ids);
    for _ in 0..nbr_ids {
        item_ids.push(buf.get_u32());
    }

    ensure_remaining(buf, params.nbr_cells() * CELL_LEN)?;
    let mut cells = Vec::with_capacity(params.nbr_cells());
    for v in 0..params.nbr_vertical_cells() {
        for h in 0..params.nbr_horizontal_cells() {
            let index = buf.get_u32();
            let size = buf.get_u32();
            let cell = MapHashCell::new(params.cell_bounds(h, v), index, size);
            if cell.span().end > nbr_ids {
                return Err(MapGridError::InvalidFormat(format!(
                    "cell ({}, {}) spans {}..{} of {} ids",
                    h,
                    v,
                    index,
                    cell.span().end,
                    nbr_ids
                )));
            }
            cells.push(cell);
        }
    }

    Ok((LocationHashTable::from_parts(params, cells), item_ids))
}

fn read_count<B: Buf>(buf: &mut B, what: &str) -> Result<u32> {
    let value = buf.get_i32();
    u32::try_from(value)
        .map_err(|_| MapGridError::InvalidFormat(format!("negative {}: {}", what, value)))
}

fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(MapGridError::UnexpectedEof { needed, remaining });
    }
    Ok(())
}
