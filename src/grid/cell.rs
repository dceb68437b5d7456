//! The contract between the grid and the elements stored in its cells.
//!
//! The grid only knows cell rectangles and element counts. Everything about
//! the elements themselves (their identifiers, whether they are currently
//! allowed, and their distances) is answered by a [`CellElements`]
//! implementation passed into each query.

use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::item::ItemId;
use std::collections::BTreeSet;

/// A single cell of a [`LocationHashTable`](super::LocationHashTable).
pub trait HashCell {
    /// The rectangle this cell covers.
    fn bounds(&self) -> &BoundingBox;

    /// Number of element slots in the cell, valid or not.
    fn nbr_elements(&self) -> u32;
}

/// Resolves the elements of a cell during a query.
///
/// Distances are squared MC2 units with longitude differences multiplied by
/// [`horizontal_factor`](Self::horizontal_factor). For any valid element the
/// three distance functions must satisfy
/// `min_squaredist_to_bbox <= min_squaredist <= max_squaredist_to_bbox`.
///
/// `None` means the element is currently invalid: filtered out, not
/// resolvable, or lacking geometry. Invalid elements never appear in results.
pub trait CellElements<C: HashCell> {
    /// Identifier stored in slot `index` of `cell`.
    fn item_id(&self, cell: &C, index: u32) -> ItemId;

    /// Whether the item passes the active filter.
    fn is_item_allowed(&self, item_id: ItemId) -> bool;

    /// Lower bound of the distance from `(lon, lat)` to the element, using
    /// its bounding box. Returns `None` if the element is invalid or the
    /// bound exceeds `max_dist`.
    fn min_squaredist_to_bbox(
        &self,
        cell: &C,
        index: u32,
        lon: i32,
        lat: i32,
        max_dist: u64,
    ) -> Option<u64>;

    /// Upper bound of the distance from `(lon, lat)` to the nearest part of
    /// the element, using its bounding box.
    fn max_squaredist_to_bbox(&self, cell: &C, index: u32, lon: i32, lat: i32) -> Option<u64>;

    /// Exact distance from `(lon, lat)` to the element.
    fn min_squaredist(&self, cell: &C, index: u32, lon: i32, lat: i32) -> Option<u64>;

    /// True if the element is valid and its bounding box overlaps `bbox`.
    fn inside_bbox(&self, cell: &C, index: u32, bbox: &BoundingBox) -> bool;

    /// True if the element is a valid area whose interior contains
    /// `(lon, lat)`. Elements without an interior never contain a point.
    fn inside_polygon(&self, cell: &C, index: u32, lon: i32, lat: i32) -> bool;

    /// Multiplier applied to longitude differences.
    fn horizontal_factor(&self) -> f64 {
        1.0
    }

    /// True if any slot of `cell` holds an allowed item.
    fn contains_valid_element(&self, cell: &C) -> bool {
        (0..cell.nbr_elements()).any(|index| self.is_item_allowed(self.item_id(cell, index)))
    }
}

/// Closest element of a single cell.
///
/// With `bound` set, only elements strictly closer than `bound` are
/// considered. Without it, the bound is taken as the smallest
/// [`max_squaredist_to_bbox`](CellElements::max_squaredist_to_bbox) of the
/// cell, which some element is guaranteed to beat or meet. Candidates whose
/// bounding box lies beyond the running limit are skipped without computing
/// their exact distance.
///
/// With `area_only` set, only elements whose interior contains the query
/// point are candidates, as decided by
/// [`inside_polygon`](CellElements::inside_polygon).
///
/// Returns the slot index and the exact squared distance.
pub fn closest_in_cell<C, E>(
    elements: &E,
    cell: &C,
    lon: i32,
    lat: i32,
    bound: Option<u64>,
    area_only: bool,
) -> Option<(u32, u64)>
where
    C: HashCell,
    E: CellElements<C> + ?Sized,
{
    let nbr_elements = cell.nbr_elements();
    let candidate = |index: u32| !area_only || elements.inside_polygon(cell, index, lon, lat);
    let mut limit = match bound {
        Some(bound) => bound,
        None => (0..nbr_elements)
            .filter(|&index| candidate(index))
            .filter_map(|index| elements.max_squaredist_to_bbox(cell, index, lon, lat))
            .min()?,
    };

    let mut best: Option<(u32, u64)> = None;
    for index in 0..nbr_elements {
        if elements
            .min_squaredist_to_bbox(cell, index, lon, lat, limit)
            .is_none()
            || !candidate(index)
        {
            continue;
        }
        let Some(dist) = elements.min_squaredist(cell, index, lon, lat) else {
            continue;
        };
        let improves = match best {
            Some((_, best_dist)) => dist < best_dist,
            None => bound.is_none_or(|bound| dist < bound),
        };
        if improves {
            best = Some((index, dist));
            limit = dist;
        }
    }
    best
}

/// Add every element of `cell` within `sqradius` of `(lon, lat)` to `out`.
///
/// Elements whose farthest bounding box corner is inside the radius are taken
/// directly, and elements whose bounding box is entirely outside are dropped.
/// Only the rest pay for an exact distance.
pub fn within_radius_in_cell<C, E>(
    elements: &E,
    cell: &C,
    lon: i32,
    lat: i32,
    sqradius: u64,
    out: &mut BTreeSet<ItemId>,
) where
    C: HashCell,
    E: CellElements<C> + ?Sized,
{
    for index in 0..cell.nbr_elements() {
        let item_id = elements.item_id(cell, index);
        if out.contains(&item_id) {
            continue;
        }
        let Some(max_dist) = elements.max_squaredist_to_bbox(cell, index, lon, lat) else {
            continue;
        };
        let inside = max_dist <= sqradius
            || (elements
                .min_squaredist_to_bbox(cell, index, lon, lat, sqradius)
                .is_some()
                && elements
                    .min_squaredist(cell, index, lon, lat)
                    .is_some_and(|dist| dist <= sqradius));
        if inside {
            out.insert(item_id);
        }
    }
}

/// Add every element of `cell` whose bounding box overlaps `bbox` to `out`.
pub fn within_bbox_in_cell<C, E>(
    elements: &E,
    cell: &C,
    bbox: &BoundingBox,
    out: &mut BTreeSet<ItemId>,
) where
    C: HashCell,
    E: CellElements<C> + ?Sized,
{
    for index in 0..cell.nbr_elements() {
        if elements.inside_bbox(cell, index, bbox) {
            out.insert(elements.item_id(cell, index));
        }
    }
}

/// Add every allowed element of `cell` to `out`.
pub fn all_items_in_cell<C, E>(elements: &E, cell: &C, out: &mut BTreeSet<ItemId>)
where
    C: HashCell,
    E: CellElements<C> + ?Sized,
{
    for index in 0..cell.nbr_elements() {
        let item_id = elements.item_id(cell, index);
        if elements.is_item_allowed(item_id) {
            out.insert(item_id);
        }
    }
}
