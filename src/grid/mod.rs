//! Generic uniform-grid spatial hash.
//!
//! [`GridParams`] maps coordinates to cells, [`LocationHashTable`] holds the
//! cells and runs nearest, radius and bounding box searches against any
//! element source implementing [`CellElements`].

pub mod cell;
mod params;
mod table;

pub use cell::{CellElements, HashCell};
pub use params::{GridParams, MAX_CELLS_PER_AXIS, MAX_REQUESTED_CELLS_PER_AXIS};
pub use table::{ClosestMatch, LocationHashTable};
