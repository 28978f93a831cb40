//! Core spatial geometry value following the OGC Simple Features classes.
//!
//! A [`Geometry`] is one of seven variants (Point through
//! GeometryCollection) in one of four dimensional families (XY, XYZ, XYM,
//! XYZM), tagged with a spatial reference identifier. Values are built by
//! the EWKT/EWKB parsers or by constructor functions and are never mutated
//! afterwards, with the single exception of SRID reassignment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SRID value denoting an undefined spatial reference.
pub const UNDEFINED_SRID: i32 = -1;

/// Per-coordinate arity family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Planar coordinates, two doubles per tuple.
    Xy,
    /// Planar plus elevation, three doubles per tuple.
    Xyz,
    /// Planar plus measure, three doubles per tuple.
    Xym,
    /// Planar plus elevation and measure, four doubles per tuple.
    Xyzm,
}

impl Dimension {
    /// Number of doubles in one coordinate tuple.
    pub fn coord_size(self) -> usize {
        match self {
            Dimension::Xy => 2,
            Dimension::Xyz | Dimension::Xym => 3,
            Dimension::Xyzm => 4,
        }
    }

    pub fn has_z(self) -> bool {
        matches!(self, Dimension::Xyz | Dimension::Xyzm)
    }

    pub fn has_m(self) -> bool {
        matches!(self, Dimension::Xym | Dimension::Xyzm)
    }

    /// WKT dimension tag, if the family carries one.
    pub fn wkt_tag(self) -> Option<&'static str> {
        match self {
            Dimension::Xy => None,
            Dimension::Xyz => Some("Z"),
            Dimension::Xym => Some("M"),
            Dimension::Xyzm => Some("ZM"),
        }
    }

    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimension::Xy,
            (true, false) => Dimension::Xyz,
            (false, true) => Dimension::Xym,
            (true, true) => Dimension::Xyzm,
        }
    }
}

/// One coordinate tuple. The populated optional fields always agree with
/// the owning geometry's [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }

    pub fn new(x: f64, y: f64, z: Option<f64>, m: Option<f64>) -> Self {
        Self { x, y, z, m }
    }

    /// Planar Euclidean distance to another coordinate.
    pub fn distance_2d(&self, other: &Coord) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A closed polygon ring: first and last coordinates identical, at least
/// four tuples. Ring 0 of a polygon is the exterior boundary.
pub type Ring = Vec<Coord>;

/// The OGC geometry class of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Unknown,
}

impl GeometryType {
    /// WKT keyword for the class.
    pub fn wkt_keyword(self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
            GeometryType::Unknown => "UNKNOWN",
        }
    }

    /// PostGIS-compatible type name, as reported by `ST_GeometryType`.
    pub fn postgis_name(self) -> &'static str {
        match self {
            GeometryType::Point => "ST_Point",
            GeometryType::LineString => "ST_LineString",
            GeometryType::Polygon => "ST_Polygon",
            GeometryType::MultiPoint => "ST_MultiPoint",
            GeometryType::MultiLineString => "ST_MultiLineString",
            GeometryType::MultiPolygon => "ST_MultiPolygon",
            GeometryType::GeometryCollection => "ST_GeometryCollection",
            GeometryType::Unknown => "ST_Unknown",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wkt_keyword())
    }
}

/// Variant-shaped coordinate storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Ring>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Ring>>),
    Collection(Vec<Geometry>),
}

impl Shape {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Shape::Point(_) => GeometryType::Point,
            Shape::LineString(_) => GeometryType::LineString,
            Shape::Polygon(_) => GeometryType::Polygon,
            Shape::MultiPoint(_) => GeometryType::MultiPoint,
            Shape::MultiLineString(_) => GeometryType::MultiLineString,
            Shape::MultiPolygon(_) => GeometryType::MultiPolygon,
            Shape::Collection(_) => GeometryType::GeometryCollection,
        }
    }
}

/// A spatial geometry value: variant-shaped coordinates, dimensional
/// family, and spatial reference identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub srid: i32,
    pub dimension: Dimension,
    pub shape: Shape,
}

impl Geometry {
    pub fn new(srid: i32, dimension: Dimension, shape: Shape) -> Self {
        Self {
            srid,
            dimension,
            shape,
        }
    }

    /// Create a 2D point. The SRID defaults to undefined when `None`.
    pub fn point(x: f64, y: f64, srid: Option<i32>) -> Self {
        Self {
            srid: srid.unwrap_or(UNDEFINED_SRID),
            dimension: Dimension::Xy,
            shape: Shape::Point(Coord::xy(x, y)),
        }
    }

    /// Create a 3D point with elevation.
    pub fn point_z(x: f64, y: f64, z: f64, srid: Option<i32>) -> Self {
        Self {
            srid: srid.unwrap_or(UNDEFINED_SRID),
            dimension: Dimension::Xyz,
            shape: Shape::Point(Coord::xyz(x, y, z)),
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.shape.geometry_type()
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// Reassign the SRID without touching coordinates. Collection children
    /// always share the SRID of their parent.
    pub fn set_srid(&mut self, srid: i32) {
        self.srid = srid;
        if let Shape::Collection(children) = &mut self.shape {
            for child in children {
                child.set_srid(srid);
            }
        }
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.set_srid(srid);
        self
    }

    pub fn coord_dim(&self) -> usize {
        self.dimension.coord_size()
    }

    pub fn is_3d(&self) -> bool {
        self.dimension.has_z()
    }

    pub fn has_m(&self) -> bool {
        self.dimension.has_m()
    }

    /// True when the top-level ordered sequence holds no elements. A point
    /// always carries exactly one tuple and is therefore never empty.
    pub fn is_empty(&self) -> bool {
        match &self.shape {
            Shape::Point(_) => false,
            Shape::LineString(coords) => coords.is_empty(),
            Shape::Polygon(rings) => rings.is_empty(),
            Shape::MultiPoint(coords) => coords.is_empty(),
            Shape::MultiLineString(lines) => lines.is_empty(),
            Shape::MultiPolygon(polygons) => polygons.is_empty(),
            Shape::Collection(children) => children.is_empty(),
        }
    }

    /// Visit every coordinate tuple reachable from this value, depth first.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, f: &mut F) {
        match &self.shape {
            Shape::Point(c) => f(c),
            Shape::LineString(coords) | Shape::MultiPoint(coords) => {
                coords.iter().for_each(&mut *f)
            }
            Shape::Polygon(rings) => {
                for ring in rings {
                    ring.iter().for_each(&mut *f);
                }
            }
            Shape::MultiLineString(lines) => {
                for line in lines {
                    line.iter().for_each(&mut *f);
                }
            }
            Shape::MultiPolygon(polygons) => {
                for rings in polygons {
                    for ring in rings {
                        ring.iter().for_each(&mut *f);
                    }
                }
            }
            Shape::Collection(children) => {
                for child in children {
                    child.for_each_coord(f);
                }
            }
        }
    }

    /// Total number of coordinate tuples in the value.
    pub fn coord_count(&self) -> usize {
        let mut n = 0;
        self.for_each_coord(&mut |_| n += 1);
        n
    }

    /// Derive a new value by applying `f` to every coordinate tuple.
    /// SRID and dimension carry over unchanged.
    pub fn map_coords<F: Fn(&Coord) -> Coord + Copy>(&self, f: F) -> Geometry {
        let shape = match &self.shape {
            Shape::Point(c) => Shape::Point(f(c)),
            Shape::LineString(coords) => Shape::LineString(coords.iter().map(|c| f(c)).collect()),
            Shape::MultiPoint(coords) => Shape::MultiPoint(coords.iter().map(|c| f(c)).collect()),
            Shape::Polygon(rings) => Shape::Polygon(map_rings(rings, f)),
            Shape::MultiLineString(lines) => Shape::MultiLineString(
                lines
                    .iter()
                    .map(|line| line.iter().map(|c| f(c)).collect())
                    .collect(),
            ),
            Shape::MultiPolygon(polygons) => {
                Shape::MultiPolygon(polygons.iter().map(|rings| map_rings(rings, f)).collect())
            }
            Shape::Collection(children) => {
                Shape::Collection(children.iter().map(|child| child.map_coords(f)).collect())
            }
        };
        Geometry {
            srid: self.srid,
            dimension: self.dimension,
            shape,
        }
    }

    fn with_dimension(mut self, dimension: Dimension) -> Geometry {
        self.set_dimension_recursive(dimension);
        self
    }

    fn set_dimension_recursive(&mut self, dimension: Dimension) {
        self.dimension = dimension;
        if let Shape::Collection(children) = &mut self.shape {
            for child in children {
                child.set_dimension_recursive(dimension);
            }
        }
    }

    /// Drop Z and M from every coordinate, yielding an XY value.
    pub fn force_2d(&self) -> Geometry {
        self.map_coords(|c| Coord::xy(c.x, c.y))
            .with_dimension(Dimension::Xy)
    }

    /// Ensure a Z component on every coordinate. XY becomes XYZ and XYM
    /// becomes XYZM with `z_default` inserted; values that already carry Z
    /// are returned unchanged.
    pub fn force_3d(&self, z_default: f64) -> Geometry {
        match self.dimension {
            Dimension::Xyz | Dimension::Xyzm => self.clone(),
            Dimension::Xy => self
                .map_coords(|c| Coord::xyz(c.x, c.y, z_default))
                .with_dimension(Dimension::Xyz),
            Dimension::Xym => self
                .map_coords(|c| Coord::new(c.x, c.y, Some(z_default), c.m))
                .with_dimension(Dimension::Xyzm),
        }
    }

    /// X coordinate, defined for Point values only.
    pub fn x(&self) -> Option<f64> {
        match &self.shape {
            Shape::Point(c) => Some(c.x),
            _ => None,
        }
    }

    /// Y coordinate, defined for Point values only.
    pub fn y(&self) -> Option<f64> {
        match &self.shape {
            Shape::Point(c) => Some(c.y),
            _ => None,
        }
    }

    /// Z coordinate of a 3D Point, if present.
    pub fn z(&self) -> Option<f64> {
        match &self.shape {
            Shape::Point(c) => c.z,
            _ => None,
        }
    }

    /// M value of a measured Point, if present.
    pub fn m(&self) -> Option<f64> {
        match &self.shape {
            Shape::Point(c) => c.m,
            _ => None,
        }
    }
}

fn map_rings<F: Fn(&Coord) -> Coord>(rings: &[Ring], f: F) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| ring.iter().map(|c| f(c)).collect())
        .collect()
}
