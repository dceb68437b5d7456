use super::distance::min_square_dist;
use super::filter::ItemFilter;
use super::store::{ItemGfx, ItemStore};
use crate::grid::{CellElements, ClosestMatch, GridParams, HashCell, LocationHashTable};
use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::item::{ItemId, ItemType, UserRights};
use mapgrid_types::scale::meters_to_mc2;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

/// A cell of a [`MapHashTable`]: a span into the table's shared id array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHashCell {
    bounds: BoundingBox,
    index: u32,
    size: u32,
}

impl MapHashCell {
    pub fn new(bounds: BoundingBox, index: u32, size: u32) -> Self {
        Self {
            bounds,
            index,
            size,
        }
    }

    /// Offset of the cell's first id in the shared array.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Range of the cell's ids in the shared array.
    pub fn span(&self) -> Range<usize> {
        let start = self.index as usize;
        start..start + self.size as usize
    }
}

impl HashCell for MapHashCell {
    fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    fn nbr_elements(&self) -> u32 {
        self.size
    }
}

/// Spatial index over the items of one map.
///
/// Cells do not own their items. Each cell is an `(index, size)` span into a
/// single shared id array, and cells with identical contents share a span.
/// Item type, geometry and rights are resolved through the [`ItemStore`] on
/// every query, filtered by the table's [`ItemFilter`].
///
/// Queries take `&self`. Changing the filter takes `&mut self`, so a filter
/// can never change under a running query.
#[derive(Debug)]
pub struct MapHashTable<S: ItemStore> {
    grid: LocationHashTable<MapHashCell>,
    item_ids: Vec<ItemId>,
    store: Arc<S>,
    filter: ItemFilter,
    horizontal_factor: f64,
}

impl<S: ItemStore> MapHashTable<S> {
    /// Assemble a table from compacted cells.
    ///
    /// # Panics
    ///
    /// Panics if a cell span reaches past the end of `item_ids`.
    pub(crate) fn assemble(
        grid: LocationHashTable<MapHashCell>,
        item_ids: Vec<ItemId>,
        store: Arc<S>,
    ) -> Self {
        assert!(
            grid.cells().iter().all(|cell| cell.span().end <= item_ids.len()),
            "cell span outside item id array of length {}",
            item_ids.len()
        );
        let horizontal_factor = store.horizontal_factor();
        Self {
            grid,
            item_ids,
            store,
            filter: ItemFilter::new(),
            horizontal_factor,
        }
    }

    /// Swap in new grid contents, keeping store and filter.
    pub(crate) fn replace_contents(
        &mut self,
        grid: LocationHashTable<MapHashCell>,
        item_ids: Vec<ItemId>,
    ) {
        self.grid = grid;
        self.item_ids = item_ids;
    }

    pub fn params(&self) -> &GridParams {
        self.grid.params()
    }

    pub fn cells(&self) -> &[MapHashCell] {
        self.grid.cells()
    }

    pub fn cell(&self, h: u32, v: u32) -> &MapHashCell {
        self.grid.cell(h, v)
    }

    /// Ids stored in the cell at `(h, v)`, in insertion order.
    pub fn cell_item_ids(&self, h: u32, v: u32) -> &[ItemId] {
        &self.item_ids[self.grid.cell(h, v).span()]
    }

    /// The shared id array all cells point into.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Mutable access to the shared id array, for remapping ids in place.
    ///
    /// Cells that share a span see the same change.
    pub fn item_ids_mut(&mut self) -> &mut [ItemId] {
        &mut self.item_ids
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn map_id(&self) -> u32 {
        self.store.map_id()
    }

    pub fn horizontal_factor(&self) -> f64 {
        self.horizontal_factor
    }

    pub fn hash_index(&self, lon: i32, lat: i32) -> (u32, u32) {
        self.grid.hash_index(lon, lat)
    }

    pub fn inv_hash_index(&self, h: u32, v: u32) -> (i32, i32) {
        self.grid.inv_hash_index(h, v)
    }

    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    /// Allow every item type again and drop any rights.
    pub fn clear_allowed_item_types(&mut self) {
        self.filter.clear();
    }

    pub fn add_allowed_item_type(&mut self, item_type: ItemType) {
        self.filter.add_allowed_type(item_type);
    }

    /// Replace the allowed types. With `rights` set, items the store refuses
    /// for those rights are excluded as well.
    pub fn set_allowed_item_types(
        &mut self,
        types: impl IntoIterator<Item = ItemType>,
        rights: Option<UserRights>,
    ) {
        self.filter.set_allowed_types(types, rights);
    }

    pub fn is_item_type_allowed(&self, item_type: ItemType) -> bool {
        self.filter.is_type_allowed(item_type)
    }

    /// The closest item to `(lon, lat)` passing the filter, with its squared
    /// distance in MC2 units.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgrid::prelude::*;
    /// use mapgrid::memory::MemoryItemStore;
    /// use std::sync::Arc;
    ///
    /// let mut store = MemoryItemStore::new(1).with_horizontal_factor(1.0);
    /// store.insert_point(10, ItemType::PointOfInterest, 10, 10);
    /// store.insert_point(11, ItemType::PointOfInterest, 990, 990);
    ///
    /// let config = HashTableConfig::default().with_cells_per_axis(4);
    /// let table = build_hash_table(Arc::new(store), &config)?;
    /// assert_eq!(table.get_closest(0, 0), Some((10, 200)));
    /// # Ok::<(), MapGridError>(())
    /// ```
    pub fn get_closest(&self, lon: i32, lat: i32) -> Option<(ItemId, u64)> {
        self.get_closest_match(lon, lat)
            .map(|found| (self.match_item_id(&found), found.square_dist))
    }

    /// Like [`get_closest`](Self::get_closest), returning the cell and slot.
    pub fn get_closest_match(&self, lon: i32, lat: i32) -> Option<ClosestMatch> {
        self.grid.get_closest(&self.elements(), lon, lat)
    }

    /// The area item passing the filter whose polygon contains `(lon, lat)`.
    ///
    /// Polylines and items without real geometry are never returned. With
    /// nested areas the result is any one of them; restrict the allowed
    /// item types to pick a level, such as municipals or built-up areas.
    pub fn get_closest_area(&self, lon: i32, lat: i32) -> Option<(ItemId, u64)> {
        self.grid
            .get_closest_area(&self.elements(), lon, lat)
            .map(|found| (self.match_item_id(&found), found.square_dist))
    }

    /// Items within `radius` MC2 units of `(lon, lat)`.
    pub fn get_all_within_radius_native(&self, lon: i32, lat: i32, radius: i32) -> BTreeSet<ItemId> {
        self.grid
            .get_all_within_radius(&self.elements(), lon, lat, radius)
    }

    /// Items within `radius_meters` of `(lon, lat)`.
    pub fn get_all_within_radius_meters(
        &self,
        lon: i32,
        lat: i32,
        radius_meters: f64,
    ) -> BTreeSet<ItemId> {
        self.get_all_within_radius_native(lon, lat, meters_to_mc2(radius_meters))
    }

    /// Items whose bounding box overlaps `bbox`.
    pub fn get_all_within_bbox(&self, bbox: &BoundingBox) -> BTreeSet<ItemId> {
        self.grid.get_all_within_bbox(&self.elements(), bbox)
    }

    /// Approximate bytes held by the table, excluding the store.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() - std::mem::size_of::<LocationHashTable<MapHashCell>>()
            + self.grid.memory_usage()
            + self.item_ids.capacity() * std::mem::size_of::<ItemId>()
            + self.filter.allowed_types().len() * std::mem::size_of::<ItemType>()
    }

    fn match_item_id(&self, found: &ClosestMatch) -> ItemId {
        let cell = self.grid.cell(found.cell.0, found.cell.1);
        self.item_ids[cell.index as usize + found.index as usize]
    }

    fn elements(&self) -> MapElements<'_, S> {
        MapElements {
            item_ids: &self.item_ids,
            store: &self.store,
            filter: &self.filter,
            horizontal_factor: self.horizontal_factor,
        }
    }
}

/// Tables are equal when they cover the same grid for the same map and
/// every cell lists the same ids in the same order.
impl<S: ItemStore> PartialEq for MapHashTable<S> {
    fn eq(&self, other: &Self) -> bool {
        self.params() == other.params()
            && self.map_id() == other.map_id()
            && self
                .cells()
                .iter()
                .zip(other.cells())
                .all(|(a, b)| {
                    a.bounds == b.bounds
                        && self.item_ids[a.span()] == other.item_ids[b.span()]
                })
    }
}

/// Query-time view resolving cell slots through the store and filter.
struct MapElements<'a, S: ItemStore> {
    item_ids: &'a [ItemId],
    store: &'a S,
    filter: &'a ItemFilter,
    horizontal_factor: f64,
}

impl<'a, S: ItemStore> MapElements<'a, S> {
    fn gfx(&self, cell: &MapHashCell, index: u32) -> Option<ItemGfx<'a>> {
        let id = self.item_id(cell, index);
        self.filter.lookup(self.store, id)?.gfx()
    }

    fn gfx_bbox(&self, cell: &MapHashCell, index: u32) -> Option<BoundingBox> {
        self.gfx(cell, index)?.bounding_box()
    }
}

impl<S: ItemStore> CellElements<MapHashCell> for MapElements<'_, S> {
    fn item_id(&self, cell: &MapHashCell, index: u32) -> ItemId {
        self.item_ids[cell.index as usize + index as usize]
    }

    fn is_item_allowed(&self, item_id: ItemId) -> bool {
        self.filter.lookup(self.store, item_id).is_some()
    }

    fn min_squaredist_to_bbox(
        &self,
        cell: &MapHashCell,
        index: u32,
        lon: i32,
        lat: i32,
        max_dist: u64,
    ) -> Option<u64> {
        let dist = self
            .gfx_bbox(cell, index)?
            .min_square_dist_to(lon, lat, self.horizontal_factor);
        (dist <= max_dist).then_some(dist)
    }

    fn max_squaredist_to_bbox(
        &self,
        cell: &MapHashCell,
        index: u32,
        lon: i32,
        lat: i32,
    ) -> Option<u64> {
        Some(
            self.gfx_bbox(cell, index)?
                .max_square_dist_to(lon, lat, self.horizontal_factor),
        )
    }

    fn min_squaredist(&self, cell: &MapHashCell, index: u32, lon: i32, lat: i32) -> Option<u64> {
        let gfx = self.gfx(cell, index)?;
        gfx.bounding_box()?;
        Some(min_square_dist(&gfx, lon, lat, self.horizontal_factor))
    }

    fn inside_bbox(&self, cell: &MapHashCell, index: u32, bbox: &BoundingBox) -> bool {
        self.gfx_bbox(cell, index)
            .is_some_and(|item_bbox| item_bbox.overlaps(bbox))
    }

    fn inside_polygon(&self, cell: &MapHashCell, index: u32, lon: i32, lat: i32) -> bool {
        match self.gfx(cell, index) {
            Some(ItemGfx::Real(geometry)) => geometry.contains_point(lon, lat),
            _ => false,
        }
    }

    fn horizontal_factor(&self) -> f64 {
        self.horizontal_factor
    }
}
