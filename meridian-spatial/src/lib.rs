//! # meridian-spatial
//!
//! Geometry value model and planar spatial kernel for the Meridian
//! extension:
//!
//! - [`Geometry`]: one vector geometry in any of the seven OGC Simple
//!   Features classes and four dimensional families (XY, XYZ, XYM, XYZM),
//!   tagged with a SRID, convertible to and from EWKT and EWKB.
//! - [`SpatialOperations`]: stateless planar measures, relations and
//!   validity checks.
//! - [`overlay`]: convex hull, topological union, buffer and collection.
//! - [`CrsService`]: process-wide coordinate reference service with
//!   lazily created, cached transformation pipelines.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod ewkb;
pub mod geometry;
pub mod operations;
pub mod overlay;
pub mod wkt;

pub use bbox::BoundingBox;
pub use crs::{
    BuiltinProjections, CoordinatePipeline, CrsService, ProjectionBackend, WEB_MERCATOR_SRID,
    WGS84_SRID,
};
pub use error::{SpatialError, SpatialResult};
pub use geometry::{Coord, Dimension, Geometry, GeometryType, Ring, Shape, UNDEFINED_SRID};
pub use operations::SpatialOperations;
