//! Grid geometry: world bounds, cell counts and the bit-shift hash.

use crate::error::{MapGridError, Result};
use mapgrid_types::bbox::BoundingBox;

/// Upper limit on cells per axis, for built and for persisted grids.
pub const MAX_CELLS_PER_AXIS: u32 = 1 << 16;

/// Largest requested cell count that always yields a grid within
/// [`MAX_CELLS_PER_AXIS`]. The actual count can exceed the request by one.
pub const MAX_REQUESTED_CELLS_PER_AXIS: u32 = MAX_CELLS_PER_AXIS - 1;

/// Parameters of a uniform grid over a rectangular world.
///
/// A coordinate maps to its cell with `(coord - origin) >> shift`, clamped
/// into the grid. Shifts and cell counts are fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridParams {
    left_horizontal: i32,
    right_horizontal: i32,
    bottom_vertical: i32,
    top_vertical: i32,
    nbr_vertical_cells: u32,
    nbr_horizontal_cells: u32,
    horizontal_shift: u32,
    vertical_shift: u32,
}

impl GridParams {
    /// Derive grid parameters from the world box and the requested cell counts.
    ///
    /// The shift on each axis is the smallest `s` with
    /// `requested << s >= extent`, and the actual number of cells is
    /// `(extent >> s) + 1`, which may differ slightly from the request.
    /// A grid with more than [`MAX_CELLS_PER_AXIS`] cells on either axis is
    /// rejected with [`MapGridError::InvalidInput`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgrid::grid::GridParams;
    /// use mapgrid_types::bbox::BoundingBox;
    ///
    /// let params = GridParams::new(&BoundingBox::new(0, 0, 1000, 1000), 4, 4)?;
    /// assert_eq!(params.nbr_horizontal_cells(), 4);
    /// assert_eq!(params.cell_width(), 256);
    /// # Ok::<(), mapgrid::MapGridError>(())
    /// ```
    pub fn new(
        world: &BoundingBox,
        nbr_vertical_cells: u32,
        nbr_horizontal_cells: u32,
    ) -> Result<Self> {
        if world.max_lon <= world.min_lon || world.max_lat <= world.min_lat {
            return Err(MapGridError::InvalidBounds {
                min_lon: world.min_lon,
                max_lon: world.max_lon,
                min_lat: world.min_lat,
                max_lat: world.max_lat,
            });
        }

        let vertical_shift = shift_for(world.height(), nbr_vertical_cells);
        let horizontal_shift = shift_for(world.width(), nbr_horizontal_cells);

        Ok(Self {
            left_horizontal: world.min_lon,
            right_horizontal: world.max_lon,
            bottom_vertical: world.min_lat,
            top_vertical: world.max_lat,
            nbr_vertical_cells: cells_for("vertical", world.height(), vertical_shift)?,
            nbr_horizontal_cells: cells_for("horizontal", world.width(), horizontal_shift)?,
            horizontal_shift,
            vertical_shift,
        })
    }

    /// Rebuild parameters read back from persisted data, checking that they
    /// describe a usable grid.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        left_horizontal: i32,
        right_horizontal: i32,
        bottom_vertical: i32,
        top_vertical: i32,
        nbr_vertical_cells: u32,
        nbr_horizontal_cells: u32,
        horizontal_shift: u32,
        vertical_shift: u32,
    ) -> Result<Self> {
        if right_horizontal <= left_horizontal || top_vertical <= bottom_vertical {
            return Err(MapGridError::InvalidBounds {
                min_lon: left_horizontal,
                max_lon: right_horizontal,
                min_lat: bottom_vertical,
                max_lat: top_vertical,
            });
        }
        if horizontal_shift > 32 || vertical_shift > 32 {
            return Err(MapGridError::InvalidFormat(format!(
                "shift out of range: horizontal {}, vertical {}",
                horizontal_shift, vertical_shift
            )));
        }
        for (axis, cells) in [
            ("vertical", nbr_vertical_cells),
            ("horizontal", nbr_horizontal_cells),
        ] {
            if cells == 0 || cells > MAX_CELLS_PER_AXIS {
                return Err(MapGridError::InvalidFormat(format!(
                    "{} cell count {} out of range",
                    axis, cells
                )));
            }
        }

        Ok(Self {
            left_horizontal,
            right_horizontal,
            bottom_vertical,
            top_vertical,
            nbr_vertical_cells,
            nbr_horizontal_cells,
            horizontal_shift,
            vertical_shift,
        })
    }

    pub fn left_horizontal(&self) -> i32 {
        self.left_horizontal
    }

    pub fn right_horizontal(&self) -> i32 {
        self.right_horizontal
    }

    pub fn bottom_vertical(&self) -> i32 {
        self.bottom_vertical
    }

    pub fn top_vertical(&self) -> i32 {
        self.top_vertical
    }

    pub fn nbr_vertical_cells(&self) -> u32 {
        self.nbr_vertical_cells
    }

    pub fn nbr_horizontal_cells(&self) -> u32 {
        self.nbr_horizontal_cells
    }

    pub fn horizontal_shift(&self) -> u32 {
        self.horizontal_shift
    }

    pub fn vertical_shift(&self) -> u32 {
        self.vertical_shift
    }

    /// Total number of cells.
    pub fn nbr_cells(&self) -> usize {
        self.nbr_vertical_cells as usize * self.nbr_horizontal_cells as usize
    }

    /// Cell width in MC2 units.
    pub fn cell_width(&self) -> i64 {
        1i64 << self.horizontal_shift
    }

    /// Cell height in MC2 units.
    pub fn cell_height(&self) -> i64 {
        1i64 << self.vertical_shift
    }

    /// The world bounding box.
    pub fn world(&self) -> BoundingBox {
        BoundingBox::new(
            self.left_horizontal,
            self.bottom_vertical,
            self.right_horizontal,
            self.top_vertical,
        )
    }

    /// Map a coordinate to `(horizontal, vertical)` cell indices.
    ///
    /// Coordinates outside the world are clamped to the nearest edge cell.
    pub fn hash_index(&self, lon: i32, lat: i32) -> (u32, u32) {
        let h = clamp_index(
            (i64::from(lon) - i64::from(self.left_horizontal)) >> self.horizontal_shift,
            self.nbr_horizontal_cells,
        );
        let v = clamp_index(
            (i64::from(lat) - i64::from(self.bottom_vertical)) >> self.vertical_shift,
            self.nbr_vertical_cells,
        );
        (h, v)
    }

    /// Lower-left corner `(lon, lat)` of the cell at `(h, v)`.
    ///
    /// Indices one past the last cell are accepted and give the upper edge
    /// of the grid; results saturate at the `i32` range.
    pub fn inv_hash_index(&self, h: u32, v: u32) -> (i32, i32) {
        (
            self.horizontal_edge(i64::from(h)),
            self.vertical_edge(i64::from(v)),
        )
    }

    /// Bounding box of the cell at `(h, v)`. Neighbouring cells share edges.
    pub fn cell_bounds(&self, h: u32, v: u32) -> BoundingBox {
        let (min_lon, min_lat) = self.inv_hash_index(h, v);
        let (max_lon, max_lat) = self.inv_hash_index(h + 1, v + 1);
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Row-major position of the cell at `(h, v)`.
    pub fn flat_index(&self, h: u32, v: u32) -> usize {
        v as usize * self.nbr_horizontal_cells as usize + h as usize
    }

    pub(crate) fn horizontal_edge(&self, h: i64) -> i32 {
        saturate(i64::from(self.left_horizontal) + (h << self.horizontal_shift))
    }

    pub(crate) fn vertical_edge(&self, v: i64) -> i32 {
        saturate(i64::from(self.bottom_vertical) + (v << self.vertical_shift))
    }
}

fn shift_for(extent: i64, requested_cells: u32) -> u32 {
    let requested = i64::from(requested_cells.max(1));
    let mut shift = 0;
    while (requested << shift) < extent {
        shift += 1;
    }
    shift
}

fn cells_for(axis: &str, extent: i64, shift: u32) -> Result<u32> {
    let cells = (extent >> shift) as u64 + 1;
    u32::try_from(cells)
        .ok()
        .filter(|&cells| cells <= MAX_CELLS_PER_AXIS)
        .ok_or_else(|| {
            MapGridError::InvalidInput(format!(
                "{} cell count {} exceeds the limit of {}",
                axis, cells, MAX_CELLS_PER_AXIS
            ))
        })
}

fn clamp_index(index: i64, nbr_cells: u32) -> u32 {
    index.clamp(0, i64::from(nbr_cells) - 1) as u32
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
