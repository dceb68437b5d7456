//! In-memory item store.
//!
//! Useful for tests, tools and small maps that are built on the fly. Items
//! are kept in a `BTreeMap`, so iteration is in id order and table builds
//! are reproducible.

use crate::map::{Item, ItemStore};
use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::geometry::ItemGeometry;
use mapgrid_types::item::{ItemId, ItemType, UserRights};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredItem {
    item_type: ItemType,
    geometry: Option<ItemGeometry>,
    anchor: Option<(i32, i32)>,
    required_rights: u64,
}

/// An [`ItemStore`] holding its items in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryItemStore {
    map_id: u32,
    map_level: u32,
    items: BTreeMap<ItemId, StoredItem>,
    bounding_box: Option<BoundingBox>,
    horizontal_factor: Option<f64>,
}

impl MemoryItemStore {
    pub fn new(map_id: u32) -> Self {
        Self {
            map_id,
            ..Self::default()
        }
    }

    pub fn with_map_level(mut self, map_level: u32) -> Self {
        self.map_level = map_level;
        self
    }

    /// Fix the map bounding box instead of deriving it from the items.
    pub fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Fix the horizontal factor instead of deriving it from the latitude.
    pub fn with_horizontal_factor(mut self, factor: f64) -> Self {
        self.horizontal_factor = Some(factor);
        self
    }

    /// Insert or replace an item with its own geometry.
    pub fn insert(&mut self, id: ItemId, item_type: ItemType, geometry: ItemGeometry) {
        self.items.insert(
            id,
            StoredItem {
                item_type,
                geometry: Some(geometry),
                anchor: None,
                required_rights: 0,
            },
        );
    }

    /// Insert or replace a point-like item located at `(lon, lat)`.
    pub fn insert_point(&mut self, id: ItemId, item_type: ItemType, lon: i32, lat: i32) {
        self.items.insert(
            id,
            StoredItem {
                item_type,
                geometry: None,
                anchor: Some((lon, lat)),
                required_rights: 0,
            },
        );
    }

    /// Insert an item without any geometry. Such items are never indexed.
    pub fn insert_bare(&mut self, id: ItemId, item_type: ItemType) {
        self.items.insert(
            id,
            StoredItem {
                item_type,
                geometry: None,
                anchor: None,
                required_rights: 0,
            },
        );
    }

    /// Require the bits of `mask` to see item `id`. Returns false if the
    /// item does not exist.
    pub fn set_required_rights(&mut self, id: ItemId, mask: u64) -> bool {
        match self.items.get_mut(&id) {
            Some(stored) => {
                stored.required_rights = mask;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        self.items.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemStore for MemoryItemStore {
    fn map_id(&self) -> u32 {
        self.map_id
    }

    fn map_level(&self) -> u32 {
        self.map_level
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        if self.bounding_box.is_some() {
            return self.bounding_box;
        }
        let mut bbox = BoundingBox::empty();
        for id in self.items.keys() {
            if let Some(item_bbox) = self.item(*id).and_then(|item| item.gfx()?.bounding_box()) {
                bbox.update(&item_bbox);
            }
        }
        bbox.is_valid().then_some(bbox)
    }

    fn item(&self, id: ItemId) -> Option<Item<'_>> {
        let stored = self.items.get(&id)?;
        let item = Item::new(id, stored.item_type, stored.geometry.as_ref());
        Some(match stored.anchor {
            Some((lon, lat)) => item.with_anchor(lon, lat),
            None => item,
        })
    }

    fn item_ids(&self) -> Box<dyn Iterator<Item = ItemId> + '_> {
        Box::new(self.items.keys().copied())
    }

    fn item_allowed_by_rights(&self, id: ItemId, rights: &UserRights) -> bool {
        self.items
            .get(&id)
            .is_some_and(|stored| rights.allows(stored.required_rights))
    }

    fn horizontal_factor(&self) -> f64 {
        match self.horizontal_factor {
            Some(factor) => factor,
            None => self.bounding_box().map_or(1.0, |bbox| bbox.cos_lat()),
        }
    }
}
