use super::store::{Item, ItemStore};
use mapgrid_types::item::{ItemId, ItemType, UserRights};
use smallvec::SmallVec;

/// Restricts which items map queries may return.
///
/// An empty type list allows every type. When rights are set, items the
/// store refuses for those rights are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    allowed_types: SmallVec<[ItemType; 8]>,
    rights: Option<UserRights>,
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow every type and drop any rights.
    pub fn clear(&mut self) {
        self.allowed_types.clear();
        self.rights = None;
    }

    /// Add `item_type` to the allowed types. Adding a type twice has no effect.
    pub fn add_allowed_type(&mut self, item_type: ItemType) {
        if !self.allowed_types.contains(&item_type) {
            self.allowed_types.push(item_type);
        }
    }

    /// Replace the allowed types and rights.
    pub fn set_allowed_types(
        &mut self,
        types: impl IntoIterator<Item = ItemType>,
        rights: Option<UserRights>,
    ) {
        self.clear();
        for item_type in types {
            self.add_allowed_type(item_type);
        }
        self.rights = rights;
    }

    pub fn is_type_allowed(&self, item_type: ItemType) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.contains(&item_type)
    }

    pub fn allowed_types(&self) -> &[ItemType] {
        &self.allowed_types
    }

    pub fn rights(&self) -> Option<&UserRights> {
        self.rights.as_ref()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.allowed_types.is_empty() && self.rights.is_none()
    }

    /// Resolve `id` in `store`, returning it only if it passes the filter.
    pub fn lookup<'s, S>(&self, store: &'s S, id: ItemId) -> Option<Item<'s>>
    where
        S: ItemStore + ?Sized,
    {
        if let Some(rights) = &self.rights {
            if !store.item_allowed_by_rights(id, rights) {
                log::trace!("item {} hidden by rights {:#x}", id, rights.mask());
                return None;
            }
        }
        let item = store.item(id)?;
        self.is_type_allowed(item.item_type).then_some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = ItemFilter::new();
        assert!(filter.is_unrestricted());
        assert!(ItemType::all().all(|t| filter.is_type_allowed(t)));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut filter = ItemFilter::new();
        filter.add_allowed_type(ItemType::Park);
        filter.add_allowed_type(ItemType::Park);
        filter.add_allowed_type(ItemType::Water);
        assert_eq!(filter.allowed_types(), &[ItemType::Park, ItemType::Water]);
        assert!(filter.is_type_allowed(ItemType::Water));
        assert!(!filter.is_type_allowed(ItemType::StreetSegment));
    }

    #[test]
    fn test_set_replaces_and_clear_resets() {
        let mut filter = ItemFilter::new();
        filter.add_allowed_type(ItemType::Park);
        filter.set_allowed_types(
            [ItemType::Building, ItemType::Building],
            Some(UserRights::new(0b10)),
        );
        assert_eq!(filter.allowed_types(), &[ItemType::Building]);
        assert_eq!(filter.rights(), Some(&UserRights::new(0b10)));

        filter.clear();
        assert!(filter.is_unrestricted());
    }
}
