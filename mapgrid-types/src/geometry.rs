use crate::bbox::BoundingBox;
use geo::{BoundingRect, Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// The drawn geometry of a map item, in MC2 coordinates.
///
/// `x` is longitude and `y` is latitude. Area items such as parks and
/// municipals are closed polygons; street segments, railways and borders
/// are open polylines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemGeometry {
    /// Closed area geometry. Points inside are at distance zero.
    Polygon(Polygon<f64>),
    /// Open line geometry.
    Polyline(LineString<f64>),
}

impl ItemGeometry {
    /// Build a geometry from integer `(lon, lat)` coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgrid_types::bbox::BoundingBox;
    /// use mapgrid_types::geometry::ItemGeometry;
    ///
    /// let park = ItemGeometry::from_coords(true, &[(0, 0), (10, 0), (10, 10), (0, 10)]);
    /// assert!(park.is_closed());
    /// assert_eq!(park.bounding_box(), Some(BoundingBox::new(0, 0, 10, 10)));
    /// ```
    pub fn from_coords(closed: bool, coords: &[(i32, i32)]) -> Self {
        let line: LineString<f64> = coords
            .iter()
            .map(|&(lon, lat)| Coord {
                x: f64::from(lon),
                y: f64::from(lat),
            })
            .collect();
        if closed {
            Self::Polygon(Polygon::new(line, Vec::new()))
        } else {
            Self::Polyline(line)
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Polygon(_))
    }

    /// Integer bounding box, or `None` for a geometry without coordinates.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let rect = match self {
            Self::Polygon(polygon) => polygon.bounding_rect(),
            Self::Polyline(line) => line.bounding_rect(),
        }?;
        Some(BoundingBox::from_rect(&rect))
    }

    /// Number of coordinates in the exterior ring or line.
    pub fn nbr_coordinates(&self) -> usize {
        match self {
            Self::Polygon(polygon) => polygon.exterior().0.len(),
            Self::Polyline(line) => line.0.len(),
        }
    }

    /// True if `(lon, lat)` lies in the interior of a polygon. Points on the
    /// boundary are outside, and polylines contain nothing.
    pub fn contains_point(&self, lon: i32, lat: i32) -> bool {
        match self {
            Self::Polygon(polygon) => {
                polygon.contains(&Point::new(f64::from(lon), f64::from(lat)))
            }
            Self::Polyline(_) => false,
        }
    }
}
