use serde::{Deserialize, Serialize};

/// Identifier of an item within one map.
pub type ItemId = u32;

/// Sentinel for "no item".
pub const INVALID_ITEM_ID: ItemId = u32::MAX;

/// The kind of a map item.
///
/// The numeric codes are part of the map data format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ItemType {
    StreetSegment = 0,
    Municipal = 1,
    Water = 2,
    Park = 3,
    Forest = 4,
    Building = 5,
    Railway = 6,
    Island = 7,
    Street = 8,
    Null = 9,
    ZipCode = 10,
    BuiltUpArea = 11,
    CityPart = 12,
    ZipArea = 13,
    PointOfInterest = 14,
    Category = 15,
    Routeable = 16,
    BusRoute = 17,
    Ferry = 18,
    Airport = 19,
    AircraftRoad = 20,
    PedestrianArea = 21,
    MilitaryBase = 22,
    IndividualBuilding = 23,
    SubwayLine = 24,
    NotUsed = 25,
    Border = 26,
    Cartographic = 27,
}

impl ItemType {
    /// Number of item types.
    pub const COUNT: usize = 28;

    const ALL: [ItemType; Self::COUNT] = [
        ItemType::StreetSegment,
        ItemType::Municipal,
        ItemType::Water,
        ItemType::Park,
        ItemType::Forest,
        ItemType::Building,
        ItemType::Railway,
        ItemType::Island,
        ItemType::Street,
        ItemType::Null,
        ItemType::ZipCode,
        ItemType::BuiltUpArea,
        ItemType::CityPart,
        ItemType::ZipArea,
        ItemType::PointOfInterest,
        ItemType::Category,
        ItemType::Routeable,
        ItemType::BusRoute,
        ItemType::Ferry,
        ItemType::Airport,
        ItemType::AircraftRoad,
        ItemType::PedestrianArea,
        ItemType::MilitaryBase,
        ItemType::IndividualBuilding,
        ItemType::SubwayLine,
        ItemType::NotUsed,
        ItemType::Border,
        ItemType::Cartographic,
    ];

    /// Numeric code of the type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a type by its numeric code.
    ///
    /// ```
    /// use mapgrid_types::item::ItemType;
    ///
    /// assert_eq!(ItemType::from_code(14), Some(ItemType::PointOfInterest));
    /// assert_eq!(ItemType::from_code(28), None);
    /// ```
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// All types in code order.
    pub fn all() -> impl Iterator<Item = ItemType> {
        Self::ALL.into_iter()
    }
}

impl TryFrom<u8> for ItemType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// Rights held by the requesting user, as a bit mask.
///
/// The item store decides what bits an item requires; the index only
/// carries the mask through to the item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UserRights {
    mask: u64,
}

impl UserRights {
    pub fn new(mask: u64) -> Self {
        Self { mask }
    }

    /// Rights holding every bit.
    pub fn all() -> Self {
        Self { mask: u64::MAX }
    }

    /// Rights holding no bits.
    pub fn none() -> Self {
        Self { mask: 0 }
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Add the bits of `mask`.
    pub fn with(mut self, mask: u64) -> Self {
        self.mask |= mask;
        self
    }

    /// True if every bit in `required` is held.
    pub fn allows(&self, required: u64) -> bool {
        self.mask & required == required
    }
}
