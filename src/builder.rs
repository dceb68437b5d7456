//! Building map hash tables
//!
//! Tables are built in two stages. [`MapHashTableBuilder`] collects item ids
//! into growable per-cell lists; [`finalize`](MapHashTableBuilder::finalize)
//! then moves them into the compact form where every cell is a span into one
//! shared id array and identical cell contents share storage.

use crate::config::HashTableConfig;
use crate::error::{MapGridError, Result};
use crate::grid::{GridParams, HashCell, LocationHashTable};
use crate::map::{Item, ItemStore, MapHashCell, MapHashTable};
use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::item::ItemId;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A build-time cell owning its list of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCell {
    bounds: BoundingBox,
    item_ids: Vec<ItemId>,
}

impl BuildCell {
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }
}

impl HashCell for BuildCell {
    fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    fn nbr_elements(&self) -> u32 {
        self.item_ids.len() as u32
    }
}

/// Offsets of distinct cell contents within a shared id array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellOffsetMap {
    offsets: FxHashMap<Vec<ItemId>, u32>,
}

impl CellOffsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the sequence `item_ids` starts at `offset`.
    pub fn insert(&mut self, item_ids: Vec<ItemId>, offset: u32) {
        self.offsets.insert(item_ids, offset);
    }

    pub fn get(&self, item_ids: &[ItemId]) -> Option<u32> {
        self.offsets.get(item_ids).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Lay out the distinct sequences in `cells` back to back.
    ///
    /// Sequences are written in lexicographic order of their contents, each
    /// once, so the result does not depend on cell order. Returns the shared
    /// array and where each sequence starts in it.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgrid::builder::CellOffsetMap;
    ///
    /// let cells: [&[u32]; 4] = [&[5, 1], &[], &[2], &[5, 1]];
    /// let (item_ids, offsets) = CellOffsetMap::from_cells(cells);
    /// assert_eq!(item_ids, vec![2, 5, 1]);
    /// assert_eq!(offsets.get(&[5, 1]), Some(1));
    /// assert_eq!(offsets.get(&[]), Some(0));
    /// ```
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a [ItemId]>) -> (Vec<ItemId>, Self) {
        let distinct: BTreeSet<&[ItemId]> = cells.into_iter().collect();
        let mut item_ids = Vec::with_capacity(distinct.iter().map(|ids| ids.len()).sum());
        let mut offsets = Self::new();
        for ids in distinct {
            offsets.insert(ids.to_vec(), item_ids.len() as u32);
            item_ids.extend_from_slice(ids);
        }
        (item_ids, offsets)
    }
}

/// Collects items into a grid before compaction.
#[derive(Debug)]
pub struct MapHashTableBuilder<S: ItemStore> {
    grid: LocationHashTable<BuildCell>,
    store: Arc<S>,
    nbr_added: usize,
    nbr_skipped: usize,
}

impl<S: ItemStore> MapHashTableBuilder<S> {
    /// Create an empty builder over `world`.
    pub fn new(
        store: Arc<S>,
        world: &BoundingBox,
        nbr_vertical_cells: u32,
        nbr_horizontal_cells: u32,
    ) -> Result<Self> {
        let params = GridParams::new(world, nbr_vertical_cells, nbr_horizontal_cells)?;
        let grid = LocationHashTable::new(params, |bounds| BuildCell {
            bounds,
            item_ids: Vec::new(),
        });
        Ok(Self {
            grid,
            store,
            nbr_added: 0,
            nbr_skipped: 0,
        })
    }

    /// Create an empty builder covering the store's map, sized by `config`.
    pub fn for_store(store: Arc<S>, config: &HashTableConfig) -> Result<Self> {
        config.validate().map_err(MapGridError::InvalidInput)?;
        let Some(world) = store.bounding_box() else {
            return Err(MapGridError::InvalidInput(format!(
                "map {} has no geometry to index",
                store.map_id()
            )));
        };
        let cells = config.cells_for_level(store.map_level());
        Self::new(store, &world, cells, cells)
    }

    pub fn params(&self) -> &GridParams {
        self.grid.params()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cells(&self) -> &[BuildCell] {
        self.grid.cells()
    }

    pub fn cell(&self, h: u32, v: u32) -> &BuildCell {
        self.grid.cell(h, v)
    }

    /// Number of items added so far.
    pub fn nbr_added(&self) -> usize {
        self.nbr_added
    }

    /// Number of items skipped for lack of geometry.
    pub fn nbr_skipped(&self) -> usize {
        self.nbr_skipped
    }

    /// Add `item` to every cell its bounding box touches.
    ///
    /// Items without geometry are skipped; returns whether the item was added.
    pub fn add_item(&mut self, item: &Item<'_>) -> bool {
        match item.gfx().and_then(|gfx| gfx.bounding_box()) {
            Some(bbox) => {
                self.add_item_bbox(&bbox, item.id);
                self.nbr_added += 1;
                true
            }
            None => {
                log::trace!("item {} has no geometry, not indexed", item.id);
                self.nbr_skipped += 1;
                false
            }
        }
    }

    /// Resolve `id` in the store and add it.
    pub fn add_item_id(&mut self, id: ItemId) -> bool {
        let store = Arc::clone(&self.store);
        match store.item(id) {
            Some(item) => self.add_item(&item),
            None => {
                self.nbr_skipped += 1;
                false
            }
        }
    }

    /// Add every item of the store.
    pub fn add_all_items(&mut self) {
        let store = Arc::clone(&self.store);
        for id in store.item_ids() {
            if let Some(item) = store.item(id) {
                self.add_item(&item);
            }
        }
    }

    /// Append `id` to every cell in the hash range of `bbox`.
    ///
    /// Insertion order is kept and duplicates are not removed.
    pub fn add_item_bbox(&mut self, bbox: &BoundingBox, id: ItemId) {
        let (start_h, start_v) = self.grid.hash_index(bbox.min_lon, bbox.min_lat);
        let (end_h, end_v) = self.grid.hash_index(bbox.max_lon, bbox.max_lat);
        for v in start_v..=end_v {
            for h in start_h..=end_h {
                self.grid.cell_mut(h, v).item_ids.push(id);
            }
        }
    }

    /// Shared id array and offsets for the current cell contents.
    pub fn group_cells(&self) -> (Vec<ItemId>, CellOffsetMap) {
        CellOffsetMap::from_cells(self.grid.cells().iter().map(BuildCell::item_ids))
    }

    /// Convert into a compact [`MapHashTable`].
    ///
    /// Each cell becomes the span of `item_ids` that `offsets` gives for its
    /// contents; the build-time lists are released.
    ///
    /// # Panics
    ///
    /// Panics if the contents of some cell are missing from `offsets`, or if
    /// a span would reach past the end of `item_ids`.
    pub fn finalize(self, item_ids: Vec<ItemId>, offsets: &CellOffsetMap) -> MapHashTable<S> {
        let (params, cells) = self.grid.into_parts();
        let cells: Vec<MapHashCell> = cells
            .into_iter()
            .map(|cell| {
                let Some(index) = offsets.get(&cell.item_ids) else {
                    panic!(
                        "no offset for cell {:?} with {} items",
                        cell.bounds,
                        cell.item_ids.len()
                    );
                };
                MapHashCell::new(cell.bounds, index, cell.item_ids.len() as u32)
            })
            .collect();

        log::debug!(
            "finalized hash table for map {}: {}x{} cells, {} ids ({} items, {} skipped)",
            self.store.map_id(),
            params.nbr_horizontal_cells(),
            params.nbr_vertical_cells(),
            item_ids.len(),
            self.nbr_added,
            self.nbr_skipped
        );

        MapHashTable::assemble(
            LocationHashTable::from_parts(params, cells),
            item_ids,
            self.store,
        )
    }

    /// Group the cells and finalize in one step.
    pub fn build(self) -> MapHashTable<S> {
        let (item_ids, offsets) = self.group_cells();
        self.finalize(item_ids, &offsets)
    }
}

/// Build a hash table over every item of `store`.
///
/// The world is the store's bounding box and the cell count comes from
/// `config` according to the map level.
pub fn build_hash_table<S: ItemStore>(
    store: Arc<S>,
    config: &HashTableConfig,
) -> Result<MapHashTable<S>> {
    let mut builder = MapHashTableBuilder::for_store(store, config)?;
    builder.add_all_items();
    Ok(builder.build())
}
