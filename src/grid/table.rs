use super::cell::{
    all_items_in_cell, closest_in_cell, within_bbox_in_cell, within_radius_in_cell, CellElements,
    HashCell,
};
use super::params::GridParams;
use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::item::ItemId;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// `(dh, dv)` offsets of the eight cells around a home cell.
const NEIGHBOUR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Result of a nearest-element search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosestMatch {
    /// `(horizontal, vertical)` index of the winning cell.
    pub cell: (u32, u32),
    /// Slot of the element within that cell.
    pub index: u32,
    /// Exact squared distance to the element.
    pub square_dist: u64,
}

/// A uniform grid of cells in row-major order (`v * nbr_horizontal + h`).
///
/// The table owns its cells but not the elements they reference. Queries
/// take a [`CellElements`] that resolves slots to items and distances, so
/// the same search code serves both the build-time grid and the compact
/// persisted one.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationHashTable<C> {
    params: GridParams,
    cells: Vec<C>,
}

impl<C: HashCell> LocationHashTable<C> {
    /// Allocate every cell with `make_cell`, which receives the cell's bounds.
    pub fn new(params: GridParams, mut make_cell: impl FnMut(BoundingBox) -> C) -> Self {
        let mut cells = Vec::with_capacity(params.nbr_cells());
        for v in 0..params.nbr_vertical_cells() {
            for h in 0..params.nbr_horizontal_cells() {
                cells.push(make_cell(params.cell_bounds(h, v)));
            }
        }
        Self { params, cells }
    }

    /// Wrap cells that are already laid out row-major.
    ///
    /// # Panics
    ///
    /// Panics if the number of cells does not match `params`.
    pub fn from_parts(params: GridParams, cells: Vec<C>) -> Self {
        assert_eq!(
            cells.len(),
            params.nbr_cells(),
            "cell count does not match grid parameters"
        );
        Self { params, cells }
    }

    pub fn into_parts(self) -> (GridParams, Vec<C>) {
        (self.params, self.cells)
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    pub fn cell(&self, h: u32, v: u32) -> &C {
        &self.cells[self.params.flat_index(h, v)]
    }

    pub fn cell_mut(&mut self, h: u32, v: u32) -> &mut C {
        let index = self.params.flat_index(h, v);
        &mut self.cells[index]
    }

    pub fn hash_index(&self, lon: i32, lat: i32) -> (u32, u32) {
        self.params.hash_index(lon, lat)
    }

    pub fn inv_hash_index(&self, h: u32, v: u32) -> (i32, i32) {
        self.params.inv_hash_index(h, v)
    }

    /// Bytes held by the table itself, excluding anything the cells point to.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.cells.capacity() * std::mem::size_of::<C>()
    }

    /// Find the valid element closest to `(lon, lat)`.
    ///
    /// The home cell is searched first, then the eight neighbours in order of
    /// their distance, then rings of cells further out. A cell is only opened
    /// when its rectangle is no farther than the best element found so far,
    /// and the ring expansion stops once no remaining cell can hold anything
    /// closer. The result therefore equals an exhaustive search; ties are
    /// broken by visiting order.
    pub fn get_closest<E>(&self, elements: &E, lon: i32, lat: i32) -> Option<ClosestMatch>
    where
        E: CellElements<C> + ?Sized,
    {
        self.closest(elements, lon, lat, false)
    }

    /// Find the closest valid element whose interior contains `(lon, lat)`,
    /// such as the municipal or built-up area a position lies in.
    ///
    /// Searches like [`get_closest`](Self::get_closest) but skips every
    /// element for which [`CellElements::inside_polygon`] is false.
    pub fn get_closest_area<E>(&self, elements: &E, lon: i32, lat: i32) -> Option<ClosestMatch>
    where
        E: CellElements<C> + ?Sized,
    {
        self.closest(elements, lon, lat, true)
    }

    fn closest<E>(&self, elements: &E, lon: i32, lat: i32, area_only: bool) -> Option<ClosestMatch>
    where
        E: CellElements<C> + ?Sized,
    {
        let factor = elements.horizontal_factor();
        let (home_h, home_v) = self.params.hash_index(lon, lat);
        let mut best = None;

        self.search_cell(elements, (home_h, home_v), lon, lat, area_only, &mut best);

        let mut neighbours: SmallVec<[(u64, u32, u32); 8]> = SmallVec::new();
        for (dh, dv) in NEIGHBOUR_OFFSETS {
            let Some((h, v)) = self.offset(home_h, home_v, dh, dv) else {
                continue;
            };
            let cell = self.cell(h, v);
            let cell_dist = cell.bounds().min_square_dist_to(lon, lat, factor);
            if cell_dist <= best_dist(&best) && elements.contains_valid_element(cell) {
                neighbours.push((cell_dist, h, v));
            }
        }
        neighbours.sort_unstable_by_key(|&(cell_dist, _, _)| cell_dist);
        for (cell_dist, h, v) in neighbours {
            if cell_dist > best_dist(&best) {
                break;
            }
            self.search_cell(elements, (h, v), lon, lat, area_only, &mut best);
        }

        let max_layer = self.max_layer(home_h, home_v);
        for layer in 2..=max_layer {
            let Some(ring_dist) = self.ring_lower_bound(home_h, home_v, layer, lon, lat, factor)
            else {
                break;
            };
            if ring_dist > best_dist(&best) {
                break;
            }
            self.search_ring(elements, (home_h, home_v), layer, (lon, lat), area_only, &mut best);
        }

        if let Some(found) = &best {
            log::trace!(
                "closest to ({}, {}) in cell {:?} at square distance {}",
                lon,
                lat,
                found.cell,
                found.square_dist
            );
        }
        best
    }

    /// All valid elements within `radius` MC2 units of `(lon, lat)`.
    ///
    /// The horizontal half-width of the scanned block is divided by the
    /// horizontal factor so scaled distances stay covered.
    /// A negative radius yields an empty set.
    pub fn get_all_within_radius<E>(
        &self,
        elements: &E,
        lon: i32,
        lat: i32,
        radius: i32,
    ) -> BTreeSet<ItemId>
    where
        E: CellElements<C> + ?Sized,
    {
        let mut result = BTreeSet::new();
        if radius < 0 {
            return result;
        }

        let factor = elements.horizontal_factor();
        let sqradius = (radius as u64) * (radius as u64);
        // Squared distances are whole numbers, so anything counted as inside
        // is closer than sqrt(r^2 + 1) in scaled units.
        let horizontal_radius = if factor > 0.0 && factor < 1.0 {
            ((sqradius as f64 + 1.0).sqrt() / factor)
                .ceil()
                .min(f64::from(i32::MAX)) as i64
        } else {
            i64::from(radius)
        };

        let (start_h, start_v) = self.params.hash_index(
            saturating_coord(i64::from(lon) - horizontal_radius),
            saturating_coord(i64::from(lat) - i64::from(radius)),
        );
        let (end_h, end_v) = self.params.hash_index(
            saturating_coord(i64::from(lon) + horizontal_radius),
            saturating_coord(i64::from(lat) + i64::from(radius)),
        );

        if start_h == end_h && start_v == end_v {
            let cell = self.cell(start_h, start_v);
            within_radius_in_cell(elements, cell, lon, lat, sqradius, &mut result);
            return result;
        }

        for v in start_v..=end_v {
            for h in start_h..=end_h {
                let cell = self.cell(h, v);
                if cell.bounds().min_square_dist_to(lon, lat, factor) <= sqradius {
                    within_radius_in_cell(elements, cell, lon, lat, sqradius, &mut result);
                }
            }
        }
        result
    }

    /// All valid elements whose bounding box overlaps `bbox`.
    ///
    /// Cells strictly inside the block spanned by `bbox` contribute all of
    /// their allowed elements without per-element tests.
    pub fn get_all_within_bbox<E>(&self, elements: &E, bbox: &BoundingBox) -> BTreeSet<ItemId>
    where
        E: CellElements<C> + ?Sized,
    {
        let mut result = BTreeSet::new();
        if !bbox.is_valid() {
            return result;
        }

        let (start_h, start_v) = self.params.hash_index(bbox.min_lon, bbox.min_lat);
        let (end_h, end_v) = self.params.hash_index(bbox.max_lon, bbox.max_lat);

        for v in start_v..=end_v {
            for h in start_h..=end_h {
                let cell = self.cell(h, v);
                let interior = h > start_h && h < end_h && v > start_v && v < end_v;
                if interior {
                    all_items_in_cell(elements, cell, &mut result);
                } else {
                    within_bbox_in_cell(elements, cell, bbox, &mut result);
                }
            }
        }
        result
    }

    fn search_cell<E>(
        &self,
        elements: &E,
        (h, v): (u32, u32),
        lon: i32,
        lat: i32,
        area_only: bool,
        best: &mut Option<ClosestMatch>,
    ) where
        E: CellElements<C> + ?Sized,
    {
        let bound = best.as_ref().map(|found| found.square_dist);
        let cell = self.cell(h, v);
        if let Some((index, square_dist)) = closest_in_cell(elements, cell, lon, lat, bound, area_only)
        {
            *best = Some(ClosestMatch {
                cell: (h, v),
                index,
                square_dist,
            });
        }
    }

    fn search_ring<E>(
        &self,
        elements: &E,
        (home_h, home_v): (u32, u32),
        layer: u32,
        (lon, lat): (i32, i32),
        area_only: bool,
        best: &mut Option<ClosestMatch>,
    ) where
        E: CellElements<C> + ?Sized,
    {
        let factor = elements.horizontal_factor();
        let last_h = i64::from(self.params.nbr_horizontal_cells()) - 1;
        let last_v = i64::from(self.params.nbr_vertical_cells()) - 1;
        let layer = i64::from(layer);
        let (low_h, high_h) = (i64::from(home_h) - layer, i64::from(home_h) + layer);
        let (low_v, high_v) = (i64::from(home_v) - layer, i64::from(home_v) + layer);

        let mut ring: Vec<(u32, u32)> = Vec::new();
        for v in [low_v, high_v] {
            if (0..=last_v).contains(&v) {
                for h in low_h.max(0)..=high_h.min(last_h) {
                    ring.push((h as u32, v as u32));
                }
            }
        }
        for h in [low_h, high_h] {
            if (0..=last_h).contains(&h) {
                for v in (low_v + 1).max(0)..=(high_v - 1).min(last_v) {
                    ring.push((h as u32, v as u32));
                }
            }
        }

        for (h, v) in ring {
            let cell_dist = self
                .cell(h, v)
                .bounds()
                .min_square_dist_to(lon, lat, factor);
            if cell_dist <= best_dist(best) {
                self.search_cell(elements, (h, v), lon, lat, area_only, best);
            }
        }
    }

    /// Smallest distance from `(lon, lat)` to any cell at Chebyshev distance
    /// `layer` or more from the home cell, or `None` when no such cell exists.
    fn ring_lower_bound(
        &self,
        home_h: u32,
        home_v: u32,
        layer: u32,
        lon: i32,
        lat: i32,
        factor: f64,
    ) -> Option<u64> {
        let params = &self.params;
        let (home_h, home_v, layer) = (i64::from(home_h), i64::from(home_v), i64::from(layer));
        let (lon, lat) = (i64::from(lon), i64::from(lat));
        let mut gaps: SmallVec<[f64; 4]> = SmallVec::new();

        if home_h - layer >= 0 {
            let edge = i64::from(params.horizontal_edge(home_h - layer + 1));
            gaps.push((lon - edge).max(0) as f64 * factor);
        }
        if home_h + layer < i64::from(params.nbr_horizontal_cells()) {
            let edge = i64::from(params.horizontal_edge(home_h + layer));
            gaps.push((edge - lon).max(0) as f64 * factor);
        }
        if home_v - layer >= 0 {
            let edge = i64::from(params.vertical_edge(home_v - layer + 1));
            gaps.push((lat - edge).max(0) as f64);
        }
        if home_v + layer < i64::from(params.nbr_vertical_cells()) {
            let edge = i64::from(params.vertical_edge(home_v + layer));
            gaps.push((edge - lat).max(0) as f64);
        }

        gaps.into_iter()
            .map(|gap| (gap * gap).floor() as u64)
            .min()
    }

    fn max_layer(&self, home_h: u32, home_v: u32) -> u32 {
        let last_h = self.params.nbr_horizontal_cells() - 1;
        let last_v = self.params.nbr_vertical_cells() - 1;
        home_h
            .max(last_h - home_h)
            .max(home_v)
            .max(last_v - home_v)
    }

    fn offset(&self, h: u32, v: u32, dh: i64, dv: i64) -> Option<(u32, u32)> {
        let h = i64::from(h) + dh;
        let v = i64::from(v) + dv;
        let in_range = (0..i64::from(self.params.nbr_horizontal_cells())).contains(&h)
            && (0..i64::from(self.params.nbr_vertical_cells())).contains(&v);
        in_range.then_some((h as u32, v as u32))
    }
}

fn best_dist(best: &Option<ClosestMatch>) -> u64 {
    best.as_ref().map_or(u64::MAX, |found| found.square_dist)
}

fn saturating_coord(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// A cell holding plain points.
    #[derive(Debug, Clone)]
    struct PointCell {
        bounds: BoundingBox,
        points: Vec<(ItemId, i32, i32)>,
    }

    impl HashCell for PointCell {
        fn bounds(&self) -> &BoundingBox {
            &self.bounds
        }

        fn nbr_elements(&self) -> u32 {
            self.points.len() as u32
        }
    }

    /// Points in `areas` behave as regions covering every query point.
    struct Points {
        factor: f64,
        forbidden: BTreeSet<ItemId>,
        areas: BTreeSet<ItemId>,
    }

    impl Points {
        fn new() -> Self {
            Self {
                factor: 1.0,
                forbidden: BTreeSet::new(),
                areas: BTreeSet::new(),
            }
        }

        fn point(&self, cell: &PointCell, index: u32) -> Option<BoundingBox> {
            let (id, lon, lat) = cell.points[index as usize];
            (!self.forbidden.contains(&id)).then(|| BoundingBox::from_point(lon, lat))
        }
    }

    impl CellElements<PointCell> for Points {
        fn item_id(&self, cell: &PointCell, index: u32) -> ItemId {
            cell.points[index as usize].0
        }

        fn is_item_allowed(&self, item_id: ItemId) -> bool {
            !self.forbidden.contains(&item_id)
        }

        fn min_squaredist_to_bbox(
            &self,
            cell: &PointCell,
            index: u32,
            lon: i32,
            lat: i32,
            max_dist: u64,
        ) -> Option<u64> {
            let dist = self
                .point(cell, index)?
                .min_square_dist_to(lon, lat, self.factor);
            (dist <= max_dist).then_some(dist)
        }

        fn max_squaredist_to_bbox(
            &self,
            cell: &PointCell,
            index: u32,
            lon: i32,
            lat: i32,
        ) -> Option<u64> {
            Some(
                self.point(cell, index)?
                    .max_square_dist_to(lon, lat, self.factor),
            )
        }

        fn min_squaredist(&self, cell: &PointCell, index: u32, lon: i32, lat: i32) -> Option<u64> {
            Some(
                self.point(cell, index)?
                    .min_square_dist_to(lon, lat, self.factor),
            )
        }

        fn inside_bbox(&self, cell: &PointCell, index: u32, bbox: &BoundingBox) -> bool {
            self.point(cell, index)
                .is_some_and(|point| point.overlaps(bbox))
        }

        fn inside_polygon(&self, cell: &PointCell, index: u32, _lon: i32, _lat: i32) -> bool {
            self.point(cell, index).is_some()
                && self.areas.contains(&self.item_id(cell, index))
        }

        fn horizontal_factor(&self) -> f64 {
            self.factor
        }
    }

    fn table_with(
        world: BoundingBox,
        cells: u32,
        points: &[(ItemId, i32, i32)],
    ) -> LocationHashTable<PointCell> {
        let params = GridParams::new(&world, cells, cells).unwrap();
        let mut table = LocationHashTable::new(params, |bounds| PointCell {
            bounds,
            points: Vec::new(),
        });
        for &(id, lon, lat) in points {
            let (h, v) = table.hash_index(lon, lat);
            table.cell_mut(h, v).points.push((id, lon, lat));
        }
        table
    }

    fn random_points(rng: &mut StdRng, count: u32, extent: i32) -> Vec<(ItemId, i32, i32)> {
        (0..count)
            .map(|id| (id, rng.gen_range(0..=extent), rng.gen_range(0..=extent)))
            .collect()
    }

    fn brute_force_closest(
        points: &[(ItemId, i32, i32)],
        elements: &Points,
        lon: i32,
        lat: i32,
    ) -> Option<u64> {
        points
            .iter()
            .filter(|(id, _, _)| elements.is_item_allowed(*id))
            .map(|&(_, plon, plat)| {
                BoundingBox::from_point(plon, plat).min_square_dist_to(lon, lat, elements.factor)
            })
            .min()
    }

    #[test]
    fn test_cells_are_row_major() {
        let table = table_with(BoundingBox::new(0, 0, 1000, 1000), 4, &[]);
        assert_eq!(table.cells().len(), 16);
        assert_eq!(
            *table.cell(2, 1).bounds(),
            BoundingBox::new(512, 256, 768, 512)
        );
    }

    #[test]
    fn test_closest_in_home_cell() {
        let points = [(1, 10, 10), (2, 990, 990), (3, 500, 500)];
        let table = table_with(BoundingBox::new(0, 0, 1000, 1000), 4, &points);
        let found = table.get_closest(&Points::new(), 0, 0).unwrap();
        assert_eq!(found.cell, (0, 0));
        assert_eq!(found.square_dist, 200);
    }

    #[test]
    fn test_closest_far_away_uses_rings() {
        let points = [(7, 995, 995)];
        let table = table_with(BoundingBox::new(0, 0, 1000, 1000), 10, &points);
        let found = table.get_closest(&Points::new(), 0, 0).unwrap();
        let cell = table.cell(found.cell.0, found.cell.1);
        assert_eq!(cell.points[found.index as usize].0, 7);
    }

    #[test]
    fn test_closest_empty_table() {
        let table = table_with(BoundingBox::new(0, 0, 1000, 1000), 4, &[]);
        assert!(table.get_closest(&Points::new(), 500, 500).is_none());
    }

    #[test]
    fn test_closest_skips_filtered_items() {
        let points = [(1, 10, 10), (2, 900, 900)];
        let table = table_with(BoundingBox::new(0, 0, 1000, 1000), 4, &points);
        let mut elements = Points::new();
        elements.forbidden.insert(1);
        let found = table.get_closest(&elements, 0, 0).unwrap();
        let cell = table.cell(found.cell.0, found.cell.1);
        assert_eq!(cell.points[found.index as usize].0, 2);

        elements.forbidden.insert(2);
        assert!(table.get_closest(&elements, 0, 0).is_none());
    }

    #[test]
    fn test_closest_beyond_first_hit_ring() {
        // Cells are 128 wide. The home cell is empty, the diagonal neighbour
        // holds a far corner point and a ring-two cell holds a closer one.
        let world = BoundingBox::new(0, 0, 1000, 1000);
        let points = [(1, 255, 255), (2, 260, 5)];
        let table = table_with(world, 10, &points);
        assert_eq!(table.params().cell_width(), 128);
        let found = table.get_closest(&Points::new(), 120, 5).unwrap();
        assert_eq!(found.cell, (2, 0));
        let cell = table.cell(found.cell.0, found.cell.1);
        assert_eq!(cell.points[found.index as usize].0, 2);
        assert_eq!(found.square_dist, 140 * 140);
    }

    #[test]
    fn test_closest_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let world = BoundingBox::new(0, 0, 100_000, 100_000);
        let points = random_points(&mut rng, 300, 100_000);
        let table = table_with(world, 16, &points);
        let mut elements = Points::new();

        for round in 0..2 {
            if round == 1 {
                elements.factor = 0.6;
                elements.forbidden.extend(points.iter().step_by(3).map(|p| p.0));
            }
            for _ in 0..300 {
                let lon = rng.gen_range(-20_000..=120_000);
                let lat = rng.gen_range(-20_000..=120_000);
                let expected = brute_force_closest(&points, &elements, lon, lat);
                let found = table
                    .get_closest(&elements, lon, lat)
                    .map(|found| found.square_dist);
                assert_eq!(found, expected, "query ({}, {})", lon, lat);
            }

            for v in 0..=table.params().nbr_vertical_cells() {
                for h in 0..=table.params().nbr_horizontal_cells() {
                    let (lon, lat) = table.inv_hash_index(h, v);
                    let expected = brute_force_closest(&points, &elements, lon, lat);
                    let found = table
                        .get_closest(&elements, lon, lat)
                        .map(|found| found.square_dist);
                    assert_eq!(found, expected, "cell corner ({}, {})", lon, lat);
                }
            }
        }
    }

    #[test]
    fn test_sparse_grid_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let world = BoundingBox::new(-50_000, -50_000, 50_000, 50_000);
        let points: Vec<_> = random_points(&mut rng, 5, 100_000)
            .into_iter()
            .map(|(id, lon, lat)| (id, lon - 50_000, lat - 50_000))
            .collect();
        let table = table_with(world, 40, &points);
        let elements = Points::new();

        for _ in 0..200 {
            let lon = rng.gen_range(-50_000..=50_000);
            let lat = rng.gen_range(-50_000..=50_000);
            let expected = brute_force_closest(&points, &elements, lon, lat);
            let found = table
                .get_closest(&elements, lon, lat)
                .map(|found| found.square_dist);
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_radius_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(1234);
        let world = BoundingBox::new(0, 0, 50_000, 50_000);
        let points = random_points(&mut rng, 400, 50_000);
        let table = table_with(world, 20, &points);
        let mut elements = Points::new();

        for factor in [1.0, 0.5] {
            elements.factor = factor;
            for _ in 0..100 {
                let lon = rng.gen_range(0..=50_000);
                let lat = rng.gen_range(0..=50_000);
                let radius = rng.gen_range(0..=8_000);
                let sqradius = (radius as u64) * (radius as u64);
                let expected: BTreeSet<ItemId> = points
                    .iter()
                    .filter(|&&(_, plon, plat)| {
                        BoundingBox::from_point(plon, plat).min_square_dist_to(lon, lat, factor)
                            <= sqradius
                    })
                    .map(|p| p.0)
                    .collect();
                assert_eq!(
                    table.get_all_within_radius(&elements, lon, lat, radius),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_radius_edge_cases() {
        let points = [(1, 500, 500), (2, 503, 504)];
        let table = table_with(BoundingBox::new(0, 0, 1000, 1000), 4, &points);
        let elements = Points::new();

        assert!(table.get_all_within_radius(&elements, 500, 500, -1).is_empty());
        assert_eq!(
            table.get_all_within_radius(&elements, 500, 500, 0),
            BTreeSet::from([1])
        );
        assert_eq!(
            table.get_all_within_radius(&elements, 500, 500, 5),
            BTreeSet::from([1, 2])
        );
        assert_eq!(
            table
                .get_all_within_radius(&elements, 500, 500, i32::MAX)
                .len(),
            2
        );
    }

    #[test]
    fn test_bbox_query() {
        let mut rng = StdRng::seed_from_u64(99);
        let world = BoundingBox::new(0, 0, 10_000, 10_000);
        let points = random_points(&mut rng, 500, 10_000);
        let table = table_with(world, 12, &points);
        let elements = Points::new();

        for _ in 0..50 {
            let lon = rng.gen_range(-1_000..=10_000);
            let lat = rng.gen_range(-1_000..=10_000);
            let query = BoundingBox::new(
                lon,
                lat,
                lon + rng.gen_range(0..=6_000),
                lat + rng.gen_range(0..=6_000),
            );
            let expected: BTreeSet<ItemId> = points
                .iter()
                .filter(|&&(_, plon, plat)| query.contains(plon, plat))
                .map(|p| p.0)
                .collect();
            assert_eq!(table.get_all_within_bbox(&elements, &query), expected);
        }

        let inverted = BoundingBox::new(10, 10, 0, 0);
        assert!(table.get_all_within_bbox(&elements, &inverted).is_empty());
    }

    #[test]
    fn test_closest_in_cell_with_bound() {
        let cell = PointCell {
            bounds: BoundingBox::new(0, 0, 100, 100),
            points: vec![(1, 10, 0), (2, 5, 0), (3, 50, 50)],
        };
        let elements = Points::new();
        assert_eq!(closest_in_cell(&elements, &cell, 0, 0, None, false), Some((1, 25)));
        assert_eq!(closest_in_cell(&elements, &cell, 0, 0, Some(25), false), None);
        assert_eq!(
            closest_in_cell(&elements, &cell, 0, 0, Some(26), false),
            Some((1, 25))
        );
    }

    #[test]
    fn test_closest_in_cell_area_only() {
        let cell = PointCell {
            bounds: BoundingBox::new(0, 0, 100, 100),
            points: vec![(1, 10, 0), (2, 5, 0), (3, 50, 50)],
        };
        let mut elements = Points::new();
        assert_eq!(closest_in_cell(&elements, &cell, 0, 0, None, true), None);

        // The nearer non-area element must not cap the search.
        elements.areas.insert(3);
        assert_eq!(
            closest_in_cell(&elements, &cell, 0, 0, None, true),
            Some((2, 5000))
        );
        assert_eq!(closest_in_cell(&elements, &cell, 0, 0, Some(5000), true), None);
    }

    #[test]
    fn test_closest_area_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(11);
        let world = BoundingBox::new(0, 0, 100_000, 100_000);
        let points = random_points(&mut rng, 300, 100_000);
        let table = table_with(world, 16, &points);
        let mut elements = Points::new();
        elements.areas.extend(points.iter().step_by(7).map(|p| p.0));
        elements.forbidden.insert(points[0].0);

        for _ in 0..200 {
            let lon = rng.gen_range(-20_000..=120_000);
            let lat = rng.gen_range(-20_000..=120_000);
            let expected = points
                .iter()
                .filter(|(id, _, _)| elements.is_item_allowed(*id) && elements.areas.contains(id))
                .map(|&(_, plon, plat)| {
                    BoundingBox::from_point(plon, plat).min_square_dist_to(lon, lat, 1.0)
                })
                .min();
            let found = table.get_closest_area(&elements, lon, lat);
            assert_eq!(found.map(|found| found.square_dist), expected);
            if let Some(found) = found {
                let cell = table.cell(found.cell.0, found.cell.1);
                assert!(elements.areas.contains(&cell.points[found.index as usize].0));
            }
        }

        elements.areas.clear();
        assert!(table.get_closest_area(&elements, 50_000, 50_000).is_none());
    }
}
