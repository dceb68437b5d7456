//! Uniform-grid spatial hash index for map items.
//!
//! The world is divided into power-of-two sized cells. Each cell lists the
//! items whose bounding box touches it, and queries find the nearest item,
//! every item within a radius, or every item overlapping a box. Items stay
//! in an [`ItemStore`] and are resolved on demand, filtered by type and
//! user rights.
//!
//! ```rust
//! use mapgrid::prelude::*;
//! use mapgrid::memory::MemoryItemStore;
//! use std::sync::Arc;
//!
//! let mut store = MemoryItemStore::new(1)
//!     .with_bounding_box(BoundingBox::new(0, 0, 1000, 1000))
//!     .with_horizontal_factor(1.0);
//! store.insert_point(1, ItemType::PointOfInterest, 10, 10);
//! store.insert_point(2, ItemType::PointOfInterest, 990, 990);
//! store.insert_point(3, ItemType::Building, 500, 500);
//!
//! let config = HashTableConfig::default().with_cells_per_axis(4);
//! let mut table = build_hash_table(Arc::new(store), &config)?;
//!
//! assert_eq!(table.get_closest(0, 0).map(|(id, _)| id), Some(1));
//! assert!(table.get_all_within_radius_native(500, 500, 5).contains(&3));
//!
//! table.add_allowed_item_type(ItemType::Building);
//! assert_eq!(table.get_closest(0, 0).map(|(id, _)| id), Some(3));
//! # Ok::<(), mapgrid::MapGridError>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod grid;
pub mod map;
pub mod memory;
pub mod storage;

pub use builder::{CellOffsetMap, MapHashTableBuilder, build_hash_table};
pub use config::HashTableConfig;
pub use error::{MapGridError, Result};
pub use grid::{GridParams, LocationHashTable};
pub use map::{Item, ItemFilter, ItemGfx, ItemStore, MapHashCell, MapHashTable};
pub use storage::HashTableFile;

pub use mapgrid_types::bbox::BoundingBox;
pub use mapgrid_types::geometry::ItemGeometry;
pub use mapgrid_types::item::{INVALID_ITEM_ID, ItemId, ItemType, UserRights};
pub use mapgrid_types::scale;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{MapGridError, Result};

    pub use crate::{HashTableConfig, MapHashTable, MapHashTableBuilder, build_hash_table};

    pub use crate::{Item, ItemFilter, ItemGfx, ItemStore};

    pub use crate::{BoundingBox, ItemGeometry, ItemId, ItemType, UserRights};

    pub use crate::HashTableFile;
}
