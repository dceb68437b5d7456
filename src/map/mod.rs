//! Map-specific hash table.
//!
//! [`MapHashTable`] indexes the items of one map by identifier. The items
//! themselves stay in an [`ItemStore`]; the table resolves them on demand
//! and applies an [`ItemFilter`] to every query.

mod distance;
mod filter;
mod store;
mod table;

pub use distance::min_square_dist;
pub use filter::ItemFilter;
pub use store::{Item, ItemGfx, ItemStore};
pub use table::{MapHashCell, MapHashTable};
