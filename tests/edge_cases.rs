use mapgrid::grid::GridParams;
use mapgrid::memory::MemoryItemStore;
use mapgrid::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn single_point_table(world: BoundingBox, cells: u32, lon: i32, lat: i32) -> MapHashTable<MemoryItemStore> {
    let mut store = MemoryItemStore::new(1)
        .with_bounding_box(world)
        .with_horizontal_factor(1.0);
    store.insert_point(1, ItemType::PointOfInterest, lon, lat);
    let mut builder = MapHashTableBuilder::new(Arc::new(store), &world, cells, cells)
        .expect("Failed to create builder");
    builder.add_all_items();
    builder.build()
}

/// Queries far outside the world clamp to the edge cells.
#[test]
fn test_query_outside_world() {
    let table = single_point_table(BoundingBox::new(0, 0, 1000, 1000), 8, 999, 1);
    assert_eq!(table.get_closest(i32::MAX, i32::MIN).map(|(id, _)| id), Some(1));
    assert_eq!(table.get_closest(i32::MIN, i32::MAX).map(|(id, _)| id), Some(1));
    assert!(table
        .get_all_within_radius_native(i32::MIN, i32::MIN, 1000)
        .is_empty());
    assert_eq!(
        table.get_all_within_bbox(&BoundingBox::new(900, -5000, 5000, 50)),
        BTreeSet::from([1])
    );
}

/// The largest possible world still hashes without overflow.
#[test]
fn test_extreme_world() {
    let world = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
    let table = single_point_table(world, 300, i32::MAX, i32::MAX);

    let (id, dist) = table.get_closest(0, 0).expect("Expected an item");
    assert_eq!(id, 1);
    let expected = 2.0 * (f64::from(i32::MAX)).powi(2);
    assert!((dist as f64 - expected).abs() / expected < 1e-9);

    // Squared distances across the whole range saturate.
    assert_eq!(table.get_closest(i32::MIN, i32::MIN), Some((1, u64::MAX)));

    assert_eq!(
        table.get_all_within_radius_native(i32::MAX - 10, i32::MAX - 10, 15),
        BTreeSet::from([1])
    );
}

#[test]
fn test_single_cell_grid() {
    let params = GridParams::new(&BoundingBox::new(0, 0, 1, 1), 1, 1).unwrap();
    assert_eq!(params.nbr_cells(), 4);
    let table = single_point_table(BoundingBox::new(0, 0, 1, 1), 1, 1, 1);
    assert_eq!(table.get_closest(0, 0), Some((1, 2)));
}

#[test]
fn test_invalid_world_rejected() {
    let store = Arc::new(MemoryItemStore::new(1));
    let result = MapHashTableBuilder::new(store, &BoundingBox::new(5, 5, 5, 10), 4, 4);
    assert!(matches!(result, Err(MapGridError::InvalidBounds { .. })));
}

#[test]
fn test_empty_table() {
    let store = Arc::new(MemoryItemStore::new(1));
    let builder = MapHashTableBuilder::new(store, &BoundingBox::new(0, 0, 100, 100), 4, 4)
        .expect("Failed to create builder");
    let table = builder.build();

    assert!(table.item_ids().is_empty());
    assert_eq!(table.get_closest(50, 50), None);
    assert!(table.get_all_within_radius_native(50, 50, 100).is_empty());
    assert!(table
        .get_all_within_bbox(&BoundingBox::new(0, 0, 100, 100))
        .is_empty());

    let loaded = MapHashTable::load(Arc::clone(table.store()), &mut table.to_bytes()).unwrap();
    assert_eq!(loaded, table);
}

/// Ids that no longer resolve in the store are skipped by every query.
#[test]
fn test_dangling_ids_are_ignored() {
    let world = BoundingBox::new(0, 0, 1000, 1000);
    let mut store = MemoryItemStore::new(1)
        .with_bounding_box(world)
        .with_horizontal_factor(1.0);
    store.insert_point(1, ItemType::PointOfInterest, 100, 100);
    let mut builder = MapHashTableBuilder::new(Arc::new(store), &world, 4, 4).unwrap();
    builder.add_all_items();
    builder.add_item_bbox(&BoundingBox::from_point(110, 110), 99);
    let table = builder.build();

    assert_eq!(table.get_closest(110, 110).map(|(id, _)| id), Some(1));
    assert_eq!(
        table.get_all_within_radius_native(110, 110, 50),
        BTreeSet::from([1])
    );
    assert_eq!(table.get_all_within_bbox(&world), BTreeSet::from([1]));
}

#[test]
fn test_items_without_geometry_are_not_indexed() {
    let world = BoundingBox::new(0, 0, 1000, 1000);
    let mut store = MemoryItemStore::new(1).with_bounding_box(world);
    store.insert_bare(1, ItemType::Category);
    store.insert_point(2, ItemType::PointOfInterest, 10, 10);
    let store = Arc::new(store);

    let mut builder = MapHashTableBuilder::new(Arc::clone(&store), &world, 4, 4).unwrap();
    assert!(!builder.add_item(&store.item(1).unwrap()));
    assert!(builder.add_item(&store.item(2).unwrap()));
    assert!(!builder.add_item_id(3));
    assert_eq!(builder.nbr_skipped(), 2);

    let table = builder.build();
    assert_eq!(table.item_ids(), &[2]);
}

#[test]
fn test_zero_and_negative_radius() {
    let table = single_point_table(BoundingBox::new(0, 0, 1000, 1000), 4, 500, 500);
    assert_eq!(
        table.get_all_within_radius_native(500, 500, 0),
        BTreeSet::from([1])
    );
    assert!(table.get_all_within_radius_native(501, 500, 0).is_empty());
    assert!(table.get_all_within_radius_native(500, 500, -10).is_empty());
    assert!(table.get_all_within_radius_meters(500, 500, -1.0).is_empty());
}

#[test]
fn test_corrupt_buffers_rejected() {
    let table = single_point_table(BoundingBox::new(0, 0, 1000, 1000), 4, 500, 500);
    let store = Arc::clone(table.store());
    let bytes = table.to_bytes();

    // Negative cell count.
    let mut raw = bytes.to_vec();
    raw[16..20].copy_from_slice(&(-1i32).to_be_bytes());
    assert!(matches!(
        MapHashTable::load(Arc::clone(&store), &mut raw.as_slice()),
        Err(MapGridError::InvalidFormat(_))
    ));

    // Inverted world.
    let mut raw = bytes.to_vec();
    raw[0..4].copy_from_slice(&2000i32.to_be_bytes());
    assert!(matches!(
        MapHashTable::load(Arc::clone(&store), &mut raw.as_slice()),
        Err(MapGridError::InvalidBounds { .. })
    ));

    // Id count larger than the buffer.
    let mut raw = bytes.to_vec();
    raw[32..36].copy_from_slice(&u32::MAX.to_be_bytes());
    assert!(matches!(
        MapHashTable::load(store, &mut raw.as_slice()),
        Err(MapGridError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_radius_beyond_world_diagonal() {
    let world = BoundingBox::new(0, 0, 1000, 1000);
    let mut store = MemoryItemStore::new(1)
        .with_bounding_box(world)
        .with_horizontal_factor(1.0);
    store.insert_point(1, ItemType::PointOfInterest, 10, 10);
    store.insert_point(2, ItemType::PointOfInterest, 990, 990);
    store.insert_point(3, ItemType::PointOfInterest, 500, 500);
    let mut builder = MapHashTableBuilder::new(Arc::new(store), &world, 4, 4).unwrap();
    builder.add_all_items();
    let table = builder.build();

    assert_eq!(
        table.get_all_within_radius_native(0, 0, 2000),
        BTreeSet::from([1, 2, 3])
    );
    assert_eq!(
        table.get_all_within_radius_native(-5000, 7000, i32::MAX),
        BTreeSet::from([1, 2, 3])
    );
}

/// Every grid the builder accepts can be written and read back.
#[test]
fn test_grid_limits_match_persisted_limits() {
    let wide = BoundingBox::new(0, 0, 1 << 20, 1);
    let store = Arc::new(MemoryItemStore::new(1).with_bounding_box(wide));
    let result = MapHashTableBuilder::new(Arc::clone(&store), &wide, 1, 1 << 17);
    assert!(matches!(result, Err(MapGridError::InvalidInput(_))));

    let full = BoundingBox::new(i32::MIN, 0, i32::MAX, 10);
    let result = MapHashTableBuilder::new(Arc::clone(&store), &full, 1, u32::MAX);
    assert!(matches!(result, Err(MapGridError::InvalidInput(_))));

    let config = HashTableConfig {
        cells_per_axis: 1 << 17,
        ..HashTableConfig::default()
    };
    assert!(matches!(
        build_hash_table(Arc::clone(&store), &config),
        Err(MapGridError::InvalidInput(_))
    ));

    let exact = BoundingBox::new(0, 0, i32::from(u16::MAX), 1);
    let mut store = MemoryItemStore::new(1).with_bounding_box(exact);
    store.insert_point(1, ItemType::PointOfInterest, 65_000, 1);
    let mut builder = MapHashTableBuilder::new(
        Arc::new(store),
        &exact,
        1,
        mapgrid::grid::MAX_REQUESTED_CELLS_PER_AXIS,
    )
    .expect("Failed to create builder");
    builder.add_all_items();
    let table = builder.build();
    assert_eq!(
        table.params().nbr_horizontal_cells(),
        mapgrid::grid::MAX_CELLS_PER_AXIS
    );

    let loaded = MapHashTable::load(Arc::clone(table.store()), &mut table.to_bytes())
        .expect("Failed to load table");
    assert_eq!(loaded, table);
    assert_eq!(loaded.get_closest(65_000, 0).map(|(id, _)| id), Some(1));
}
