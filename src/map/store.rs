//! The item store a map hash table resolves its identifiers against.

use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::geometry::ItemGeometry;
use mapgrid_types::item::{ItemId, ItemType, UserRights};

/// Owner of the items of one map.
///
/// The hash table stores only item identifiers and asks the store for type,
/// geometry and access rights whenever a query needs them. Stores are shared
/// between tables and query threads, hence `Send + Sync`.
pub trait ItemStore: Send + Sync {
    /// Identifier of the map this store holds.
    fn map_id(&self) -> u32;

    /// Zoom level of the map. Higher levels are overview maps covering
    /// larger areas.
    fn map_level(&self) -> u32 {
        0
    }

    /// Bounding box of all geometry in the map, or `None` for a map without
    /// any.
    fn bounding_box(&self) -> Option<BoundingBox>;

    /// Look up an item. `None` means the identifier does not resolve.
    fn item(&self, id: ItemId) -> Option<Item<'_>>;

    /// Identifiers of every item in the map.
    fn item_ids(&self) -> Box<dyn Iterator<Item = ItemId> + '_>;

    /// Whether a user with `rights` may see the item.
    fn item_allowed_by_rights(&self, _id: ItemId, _rights: &UserRights) -> bool {
        true
    }

    /// Multiplier applied to longitude differences in distance computations.
    ///
    /// Defaults to the cosine of the map's middle latitude.
    fn horizontal_factor(&self) -> f64 {
        self.bounding_box().map_or(1.0, |bbox| bbox.cos_lat())
    }
}

/// A borrowed view of one map item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item<'a> {
    pub id: ItemId,
    pub item_type: ItemType,
    /// Drawn geometry, if the item has any.
    pub geometry: Option<&'a ItemGeometry>,
    /// Position of point-like items without their own geometry, such as
    /// points of interest.
    pub anchor: Option<(i32, i32)>,
}

impl<'a> Item<'a> {
    pub fn new(id: ItemId, item_type: ItemType, geometry: Option<&'a ItemGeometry>) -> Self {
        Self {
            id,
            item_type,
            geometry,
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, lon: i32, lat: i32) -> Self {
        self.anchor = Some((lon, lat));
        self
    }

    /// The geometry used for indexing and distances.
    ///
    /// Real geometry wins; otherwise an anchored item gets a single-point
    /// geometry. Items with neither are not indexable.
    pub fn gfx(&self) -> Option<ItemGfx<'a>> {
        match (self.geometry, self.anchor) {
            (Some(geometry), _) => Some(ItemGfx::Real(geometry)),
            (None, Some((lon, lat))) => Some(ItemGfx::Synthetic { lon, lat }),
            (None, None) => None,
        }
    }
}

/// Geometry of an item as seen by the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemGfx<'a> {
    /// The item's own geometry, borrowed from the store.
    Real(&'a ItemGeometry),
    /// A single point standing in for a point-like item.
    Synthetic { lon: i32, lat: i32 },
}

impl ItemGfx<'_> {
    /// Integer bounding box, or `None` for geometry without coordinates.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            ItemGfx::Real(geometry) => geometry.bounding_box(),
            ItemGfx::Synthetic { lon, lat } => Some(BoundingBox::from_point(*lon, *lat)),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, ItemGfx::Synthetic { .. })
    }
}
