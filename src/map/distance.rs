//! Exact item distances.

use super::store::ItemGfx;
use geo::{Coord, Distance, Euclidean, MapCoords, Point};
use mapgrid_types::bbox::BoundingBox;
use mapgrid_types::geometry::ItemGeometry;

/// Squared distance from `(lon, lat)` to the nearest part of `gfx`, with
/// longitude differences scaled by `horizontal_factor`.
///
/// Points inside a closed geometry are at distance zero. Single points use
/// the same floored arithmetic as the bounding box bounds, so the three
/// measures order consistently.
pub fn min_square_dist(gfx: &ItemGfx<'_>, lon: i32, lat: i32, horizontal_factor: f64) -> u64 {
    match gfx {
        ItemGfx::Synthetic { lon: plon, lat: plat } => {
            BoundingBox::from_point(*plon, *plat).min_square_dist_to(lon, lat, horizontal_factor)
        }
        ItemGfx::Real(geometry) => {
            let dist = geometry_distance(geometry, lon, lat, horizontal_factor);
            (dist * dist).round() as u64
        }
    }
}

fn geometry_distance(geometry: &ItemGeometry, lon: i32, lat: i32, horizontal_factor: f64) -> f64 {
    let query = Point::new(f64::from(lon) * horizontal_factor, f64::from(lat));
    let scale = |c: Coord<f64>| Coord {
        x: c.x * horizontal_factor,
        y: c.y,
    };
    let unscaled = horizontal_factor == 1.0;

    match geometry {
        ItemGeometry::Polygon(polygon) if unscaled => Euclidean.distance(&query, polygon),
        ItemGeometry::Polygon(polygon) => Euclidean.distance(&query, &polygon.map_coords(scale)),
        ItemGeometry::Polyline(line) if unscaled => Euclidean.distance(&query, line),
        ItemGeometry::Polyline(line) => Euclidean.distance(&query, &line.map_coords(scale)),
    }
}
