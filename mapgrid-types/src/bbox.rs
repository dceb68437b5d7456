use crate::scale::mc2_to_degrees;
use geo::Rect;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in MC2 coordinates.
///
/// The horizontal axis is longitude and the vertical axis is latitude. Both
/// bounds are inclusive, so a box built from a single coordinate has zero
/// width and height but still contains that coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Smallest longitude (left edge)
    pub min_lon: i32,
    /// Smallest latitude (bottom edge)
    pub min_lat: i32,
    /// Largest longitude (right edge)
    pub max_lon: i32,
    /// Largest latitude (top edge)
    pub max_lat: i32,
}

impl BoundingBox {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapgrid_types::bbox::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(0, 0, 1000, 500);
    /// assert_eq!(bbox.width(), 1000);
    /// assert_eq!(bbox.height(), 500);
    /// ```
    pub fn new(min_lon: i32, min_lat: i32, max_lon: i32, max_lat: i32) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Create a degenerate box covering a single coordinate.
    pub fn from_point(lon: i32, lat: i32) -> Self {
        Self::new(lon, lat, lon, lat)
    }

    /// An inverted box that becomes valid on the first [`update_point`](Self::update_point).
    pub fn empty() -> Self {
        Self::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN)
    }

    /// True if the minimum corner is not above the maximum corner.
    pub fn is_valid(&self) -> bool {
        self.min_lon <= self.max_lon && self.min_lat <= self.max_lat
    }

    /// Width in MC2 units.
    pub fn width(&self) -> i64 {
        i64::from(self.max_lon) - i64::from(self.min_lon)
    }

    /// Height in MC2 units.
    pub fn height(&self) -> i64 {
        i64::from(self.max_lat) - i64::from(self.min_lat)
    }

    /// Grow the box so it covers the coordinate.
    pub fn update_point(&mut self, lon: i32, lat: i32) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Grow the box so it covers `other`.
    pub fn update(&mut self, other: &BoundingBox) {
        self.update_point(other.min_lon, other.min_lat);
        self.update_point(other.max_lon, other.max_lat);
    }

    /// Check if a coordinate is inside the box (edges included).
    pub fn contains(&self, lon: i32, lat: i32) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if this box shares at least one coordinate with `other`.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !(self.max_lon < other.min_lon
            || self.min_lon > other.max_lon
            || self.max_lat < other.min_lat
            || self.min_lat > other.max_lat)
    }

    /// Check if this box lies entirely within `other`.
    pub fn inside(&self, other: &BoundingBox) -> bool {
        self.min_lon >= other.min_lon
            && self.max_lon <= other.max_lon
            && self.min_lat >= other.min_lat
            && self.max_lat <= other.max_lat
    }

    /// Cosine of the middle latitude, used to scale longitude differences.
    pub fn cos_lat(&self) -> f64 {
        let mid = (i64::from(self.min_lat) + i64::from(self.max_lat)) / 2;
        mc2_to_degrees(mid as i32).to_radians().cos()
    }

    /// Lower bound of the squared distance from `(lon, lat)` to anything inside the box.
    ///
    /// Longitude differences are multiplied by `horizontal_factor` before
    /// squaring. The result is floored so it never exceeds the exact
    /// distance of any geometry within the box.
    pub fn min_square_dist_to(&self, lon: i32, lat: i32, horizontal_factor: f64) -> u64 {
        let dlon = axis_gap(lon, self.min_lon, self.max_lon) as f64 * horizontal_factor;
        let dlat = axis_gap(lat, self.min_lat, self.max_lat) as f64;
        (dlon * dlon + dlat * dlat).floor() as u64
    }

    /// Upper bound of the distance from `(lon, lat)` to the nearest part of a
    /// geometry whose bounding box is this box: the squared distance to the
    /// farthest corner, ceiled.
    pub fn max_square_dist_to(&self, lon: i32, lat: i32, horizontal_factor: f64) -> u64 {
        let lon = i64::from(lon);
        let lat = i64::from(lat);
        let dlon = (lon - i64::from(self.min_lon))
            .abs()
            .max((lon - i64::from(self.max_lon)).abs()) as f64
            * horizontal_factor;
        let dlat = (lat - i64::from(self.min_lat))
            .abs()
            .max((lat - i64::from(self.max_lat)).abs()) as f64;
        (dlon * dlon + dlat * dlat).ceil() as u64
    }

    /// Convert to a `geo::Rect` with x as longitude and y as latitude.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            geo::coord! { x: f64::from(self.min_lon), y: f64::from(self.min_lat) },
            geo::coord! { x: f64::from(self.max_lon), y: f64::from(self.max_lat) },
        )
    }

    /// Smallest integer box covering `rect`.
    pub fn from_rect(rect: &Rect<f64>) -> Self {
        Self::new(
            rect.min().x.floor() as i32,
            rect.min().y.floor() as i32,
            rect.max().x.ceil() as i32,
            rect.max().y.ceil() as i32,
        )
    }
}

/// Distance from `value` to the interval `[min, max]`, zero when inside.
fn axis_gap(value: i32, min: i32, max: i32) -> i64 {
    let value = i64::from(value);
    if value < i64::from(min) {
        i64::from(min) - value
    } else if value > i64::from(max) {
        value - i64::from(max)
    } else {
        0
    }
}
