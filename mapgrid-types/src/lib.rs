//! # mapgrid-types
//!
//! Core value types for the mapgrid spatial index.
//!
//! - **Bounding boxes**: [`bbox::BoundingBox`] in MC2 integer coordinates
//! - **Items**: [`item::ItemId`], [`item::ItemType`], [`item::UserRights`]
//! - **Geometry**: [`geometry::ItemGeometry`] built on the `geo` crate
//! - **Units**: MC2, meter and degree conversions in [`scale`]
//!
//! ## Examples
//!
//! ```rust
//! use mapgrid_types::bbox::BoundingBox;
//! use mapgrid_types::scale::degrees_to_mc2;
//!
//! let lund = BoundingBox::new(
//!     degrees_to_mc2(13.15),
//!     degrees_to_mc2(55.68),
//!     degrees_to_mc2(13.24),
//!     degrees_to_mc2(55.73),
//! );
//! assert!(lund.contains(degrees_to_mc2(13.19), degrees_to_mc2(55.70)));
//! ```

pub mod bbox;
pub mod geometry;
pub mod item;
pub mod scale;
