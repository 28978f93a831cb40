//! Planar measures, relations and validity over geometry values.
//!
//! Every operation works in the XY plane of the value; Z and M are carried
//! by the value model but ignored here. Binary operations refuse inputs
//! whose SRIDs conflict; an undefined SRID (-1) on either side is treated
//! as compatible.

use geo::algorithm::area::Area;
use geo::algorithm::centroid::Centroid;
use geo::algorithm::contains::Contains;
use geo::algorithm::euclidean_distance::EuclideanDistance;
use geo::algorithm::euclidean_length::EuclideanLength;
use geo::algorithm::intersects::Intersects;

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::{Coord, Geometry, GeometryType, Ring, Shape, UNDEFINED_SRID};

// ---------------------------------------------------------------------------
// Projection into planar geo types
// ---------------------------------------------------------------------------

pub(crate) fn to_geo_coord(c: &Coord) -> geo::Coord<f64> {
    geo::Coord { x: c.x, y: c.y }
}

pub(crate) fn to_geo_linestring(coords: &[Coord]) -> geo::LineString<f64> {
    geo::LineString::new(coords.iter().map(to_geo_coord).collect())
}

pub(crate) fn to_geo_polygon(rings: &[Ring]) -> geo::Polygon<f64> {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            to_geo_linestring(exterior),
            interiors.iter().map(|r| to_geo_linestring(r)).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

pub(crate) fn to_geo(geom: &Geometry) -> geo::Geometry<f64> {
    match &geom.shape {
        Shape::Point(c) => geo::Geometry::Point(geo::Point(to_geo_coord(c))),
        Shape::LineString(coords) => geo::Geometry::LineString(to_geo_linestring(coords)),
        Shape::Polygon(rings) => geo::Geometry::Polygon(to_geo_polygon(rings)),
        Shape::MultiPoint(coords) => geo::Geometry::MultiPoint(geo::MultiPoint(
            coords.iter().map(|c| geo::Point(to_geo_coord(c))).collect(),
        )),
        Shape::MultiLineString(lines) => geo::Geometry::MultiLineString(geo::MultiLineString(
            lines.iter().map(|l| to_geo_linestring(l)).collect(),
        )),
        Shape::MultiPolygon(polygons) => geo::Geometry::MultiPolygon(geo::MultiPolygon(
            polygons.iter().map(|p| to_geo_polygon(p)).collect(),
        )),
        Shape::Collection(children) => geo::Geometry::GeometryCollection(
            geo::GeometryCollection(children.iter().map(to_geo).collect()),
        ),
    }
}

pub(crate) fn from_geo_polygon(polygon: &geo::Polygon<f64>) -> Vec<Ring> {
    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    rings.push(ring_coords(polygon.exterior()));
    for interior in polygon.interiors() {
        rings.push(ring_coords(interior));
    }
    rings
}

fn ring_coords(line: &geo::LineString<f64>) -> Ring {
    line.coords().map(|c| Coord::xy(c.x, c.y)).collect()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Stateless planar kernel.
pub struct SpatialOperations;

impl SpatialOperations {
    /// Enclosed area of a Polygon or MultiPolygon; holes are subtracted and
    /// empty geometries measure zero. Other variants are a domain error.
    pub fn area(geom: &Geometry) -> SpatialResult<f64> {
        match &geom.shape {
            Shape::Polygon(rings) => Ok(to_geo_polygon(rings).unsigned_area()),
            Shape::MultiPolygon(polygons) => Ok(polygons
                .iter()
                .map(|rings| to_geo_polygon(rings).unsigned_area())
                .sum()),
            _ => Err(SpatialError::domain(
                "area",
                geom.geometry_type().postgis_name(),
            )),
        }
    }

    /// Total ring length of a Polygon or MultiPolygon.
    pub fn perimeter(geom: &Geometry) -> SpatialResult<f64> {
        match &geom.shape {
            Shape::Polygon(rings) => Ok(rings_length(rings)),
            Shape::MultiPolygon(polygons) => Ok(polygons.iter().map(|p| rings_length(p)).sum()),
            _ => Err(SpatialError::domain(
                "perimeter",
                geom.geometry_type().postgis_name(),
            )),
        }
    }

    /// Total segment length of a LineString or MultiLineString.
    pub fn length(geom: &Geometry) -> SpatialResult<f64> {
        match &geom.shape {
            Shape::LineString(coords) => Ok(to_geo_linestring(coords).euclidean_length()),
            Shape::MultiLineString(lines) => Ok(lines
                .iter()
                .map(|l| to_geo_linestring(l).euclidean_length())
                .sum()),
            _ => Err(SpatialError::domain(
                "length",
                geom.geometry_type().postgis_name(),
            )),
        }
    }

    /// Measure-weighted centroid: by area for surfaces, by length for
    /// lines, by point mean otherwise. Fails for empty geometries.
    pub fn centroid(geom: &Geometry) -> SpatialResult<Geometry> {
        let center = to_geo(geom)
            .centroid()
            .ok_or_else(|| SpatialError::domain("centroid", "empty geometry".to_string()))?;
        Ok(Geometry::point(center.x(), center.y(), Some(geom.srid())))
    }

    /// Minimum planar Euclidean distance between the two point sets.
    pub fn distance(a: &Geometry, b: &Geometry) -> SpatialResult<f64> {
        check_srid(a, b)?;
        if a.is_empty() || b.is_empty() {
            return Err(SpatialError::domain("distance", "empty geometry".to_string()));
        }
        if to_geo(a).intersects(&to_geo(b)) {
            return Ok(0.0);
        }
        let left = Primitives::from_geometry(a);
        let right = Primitives::from_geometry(b);
        Ok(left.min_distance(&right))
    }

    /// True when the two point sets share at least one point.
    pub fn intersects(a: &Geometry, b: &Geometry) -> SpatialResult<bool> {
        check_srid(a, b)?;
        Ok(to_geo(a).intersects(&to_geo(b)))
    }

    /// True when `a` lies completely inside `b`. Only pairs inside the
    /// supported matrix are evaluated; anything else is false.
    pub fn within(a: &Geometry, b: &Geometry) -> SpatialResult<bool> {
        Self::contains(b, a)
    }

    /// True when `a` completely contains `b`. The container must be a
    /// Polygon or MultiPolygon and the containee any non-collection
    /// variant; unsupported pairs are false, never an error.
    pub fn contains(a: &Geometry, b: &Geometry) -> SpatialResult<bool> {
        check_srid(a, b)?;
        if !contains_pair_supported(a.geometry_type(), b.geometry_type()) {
            return Ok(false);
        }
        if a.is_empty() || b.is_empty() {
            return Ok(false);
        }
        Ok(to_geo(a).contains(&to_geo(b)))
    }

    /// True when the minimum distance between the inputs does not exceed
    /// `distance`.
    pub fn dwithin(a: &Geometry, b: &Geometry, distance: f64) -> SpatialResult<bool> {
        Ok(Self::distance(a, b)? <= distance)
    }

    /// Structural and topological validity. Never errors: anything that
    /// cannot be interpreted is simply invalid.
    pub fn is_valid(geom: &Geometry) -> bool {
        let finite = {
            let mut ok = true;
            geom.for_each_coord(&mut |c| {
                ok &= c.x.is_finite() && c.y.is_finite();
            });
            ok
        };
        if !finite {
            return false;
        }
        match &geom.shape {
            Shape::Point(_)
            | Shape::LineString(_)
            | Shape::MultiPoint(_)
            | Shape::MultiLineString(_) => true,
            Shape::Polygon(rings) => polygon_is_valid(rings),
            Shape::MultiPolygon(polygons) => {
                polygons.iter().all(|p| polygon_is_valid(p))
                    && multipolygon_members_disjoint(polygons)
            }
            Shape::Collection(children) => children.iter().all(Self::is_valid),
        }
    }
}

fn rings_length(rings: &[Ring]) -> f64 {
    rings
        .iter()
        .map(|r| to_geo_linestring(r).euclidean_length())
        .sum()
}

fn check_srid(a: &Geometry, b: &Geometry) -> SpatialResult<()> {
    if a.srid() != UNDEFINED_SRID && b.srid() != UNDEFINED_SRID && a.srid() != b.srid() {
        return Err(SpatialError::SridMismatch {
            left: a.srid(),
            right: b.srid(),
        });
    }
    Ok(())
}

fn contains_pair_supported(container: GeometryType, containee: GeometryType) -> bool {
    let container_ok = matches!(
        container,
        GeometryType::Polygon | GeometryType::MultiPolygon
    );
    let containee_ok = matches!(
        containee,
        GeometryType::Point
            | GeometryType::LineString
            | GeometryType::Polygon
            | GeometryType::MultiPoint
            | GeometryType::MultiLineString
            | GeometryType::MultiPolygon
    );
    container_ok && containee_ok
}

// ---------------------------------------------------------------------------
// Distance decomposition
// ---------------------------------------------------------------------------

/// A geometry flattened into the primitives geo measures distances
/// between. The minimum over all cross pairs is the geometry distance
/// whenever the inputs do not intersect.
struct Primitives {
    points: Vec<geo::Point<f64>>,
    lines: Vec<geo::LineString<f64>>,
    polygons: Vec<geo::Polygon<f64>>,
}

impl Primitives {
    fn from_geometry(geom: &Geometry) -> Self {
        let mut prims = Primitives {
            points: Vec::new(),
            lines: Vec::new(),
            polygons: Vec::new(),
        };
        prims.collect(geom);
        prims
    }

    fn collect(&mut self, geom: &Geometry) {
        match &geom.shape {
            Shape::Point(c) => self.points.push(geo::Point(to_geo_coord(c))),
            Shape::LineString(coords) => self.lines.push(to_geo_linestring(coords)),
            Shape::Polygon(rings) => self.polygons.push(to_geo_polygon(rings)),
            Shape::MultiPoint(coords) => self
                .points
                .extend(coords.iter().map(|c| geo::Point(to_geo_coord(c)))),
            Shape::MultiLineString(lines) => {
                self.lines.extend(lines.iter().map(|l| to_geo_linestring(l)))
            }
            Shape::MultiPolygon(polygons) => self
                .polygons
                .extend(polygons.iter().map(|p| to_geo_polygon(p))),
            Shape::Collection(children) => children.iter().for_each(|c| self.collect(c)),
        }
    }

    fn min_distance(&self, other: &Primitives) -> f64 {
        let mut best = f64::INFINITY;
        for p in &self.points {
            for q in &other.points {
                best = best.min(p.euclidean_distance(q));
            }
            for l in &other.lines {
                best = best.min(p.euclidean_distance(l));
            }
            for poly in &other.polygons {
                best = best.min(p.euclidean_distance(poly));
            }
        }
        for l in &self.lines {
            for q in &other.points {
                best = best.min(q.euclidean_distance(l));
            }
            for m in &other.lines {
                best = best.min(l.euclidean_distance(m));
            }
            for poly in &other.polygons {
                best = best.min(l.euclidean_distance(poly));
            }
        }
        for poly in &self.polygons {
            for q in &other.points {
                best = best.min(q.euclidean_distance(poly));
            }
            for m in &other.lines {
                best = best.min(m.euclidean_distance(poly));
            }
            for other_poly in &other.polygons {
                best = best.min(poly.euclidean_distance(other_poly));
            }
        }
        best
    }
}

// ---------------------------------------------------------------------------
// Validity helpers
// ---------------------------------------------------------------------------

fn cross_sign(o: &Coord, a: &Coord, b: &Coord) -> i8 {
    let v = (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn on_segment(a: &Coord, b: &Coord, p: &Coord) -> bool {
    cross_sign(a, b, p) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Segment intersection test including collinear overlap and endpoint
/// touches.
fn segments_intersect(p1: &Coord, p2: &Coord, p3: &Coord, p4: &Coord) -> bool {
    let d1 = cross_sign(p3, p4, p1);
    let d2 = cross_sign(p3, p4, p2);
    let d3 = cross_sign(p1, p2, p3);
    let d4 = cross_sign(p1, p2, p4);
    if ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0)) {
        return true;
    }
    (d1 == 0 && on_segment(p3, p4, p1))
        || (d2 == 0 && on_segment(p3, p4, p2))
        || (d3 == 0 && on_segment(p1, p2, p3))
        || (d4 == 0 && on_segment(p1, p2, p4))
}

/// Strict crossing: the segment interiors share a point.
fn segments_cross(p1: &Coord, p2: &Coord, p3: &Coord, p4: &Coord) -> bool {
    let d1 = cross_sign(p3, p4, p1);
    let d2 = cross_sign(p3, p4, p2);
    let d3 = cross_sign(p1, p2, p3);
    let d4 = cross_sign(p1, p2, p4);
    ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0))
}

/// No two non-adjacent segments of the ring may touch. The ring is given
/// closed; the closing vertex makes the first and last segments adjacent.
fn ring_is_simple(ring: &[Coord]) -> bool {
    if ring.len() < 4 {
        return false;
    }
    let n = ring.len() - 1;
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            if segments_intersect(&ring[i], &ring[i + 1], &ring[j], &ring[j + 1]) {
                return false;
            }
        }
    }
    true
}

/// Ray-casting interior test against a single closed ring.
fn point_in_ring(point: &Coord, ring: &[Coord]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        if ((ring[i].y > point.y) != (ring[j].y > point.y))
            && (point.x
                < (ring[j].x - ring[i].x) * (point.y - ring[i].y) / (ring[j].y - ring[i].y)
                    + ring[i].x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn point_on_ring(point: &Coord, ring: &[Coord]) -> bool {
    ring.windows(2)
        .any(|seg| on_segment(&seg[0], &seg[1], point))
}

fn rings_cross(a: &[Coord], b: &[Coord]) -> bool {
    for sa in a.windows(2) {
        for sb in b.windows(2) {
            if segments_cross(&sa[0], &sa[1], &sb[0], &sb[1]) {
                return true;
            }
        }
    }
    false
}

fn polygon_is_valid(rings: &[Ring]) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return true;
    };
    if !ring_is_simple(outer) {
        return false;
    }
    for (i, hole) in holes.iter().enumerate() {
        if !ring_is_simple(hole) {
            return false;
        }
        // Holes stay inside the exterior and never cross it.
        if rings_cross(outer, hole) {
            return false;
        }
        if !hole
            .iter()
            .all(|c| point_in_ring(c, outer) || point_on_ring(c, outer))
        {
            return false;
        }
        // Holes may touch each other but not overlap.
        for other in &holes[i + 1..] {
            if rings_cross(hole, other) {
                return false;
            }
            if hole.iter().any(|c| point_in_ring(c, other))
                || other.iter().any(|c| point_in_ring(c, hole))
            {
                return false;
            }
        }
    }
    true
}

fn multipolygon_members_disjoint(polygons: &[Vec<Ring>]) -> bool {
    for i in 0..polygons.len() {
        for j in (i + 1)..polygons.len() {
            let (a, b) = (&polygons[i], &polygons[j]);
            let (Some(outer_a), Some(outer_b)) = (a.first(), b.first()) else {
                continue;
            };
            if rings_cross(outer_a, outer_b) {
                return false;
            }
            if outer_a.iter().any(|c| point_in_ring(c, outer_b))
                || outer_b.iter().any(|c| point_in_ring(c, outer_a))
            {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(ewkt: &str) -> Geometry {
        Geometry::from_ewkt(ewkt).unwrap()
    }

    #[test]
    fn area_of_square() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!((SpatialOperations::area(&square).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn area_subtracts_holes() {
        let ring = geom("POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 4,2 2))");
        assert!((SpatialOperations::area(&ring).unwrap() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn area_of_multipolygon_sums_members() {
        let multi = geom("MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)),((5 5,7 5,7 7,5 7,5 5)))");
        assert!((SpatialOperations::area(&multi).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn area_is_a_domain_error_for_points() {
        let point = geom("POINT(1 2)");
        assert!(matches!(
            SpatialOperations::area(&point),
            Err(SpatialError::Domain { .. })
        ));
    }

    #[test]
    fn area_of_empty_polygon_is_zero() {
        let empty = geom("POLYGON EMPTY");
        assert_eq!(SpatialOperations::area(&empty).unwrap(), 0.0);
    }

    #[test]
    fn perimeter_of_square() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!((SpatialOperations::perimeter(&square).unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn length_of_linestring() {
        let line = geom("LINESTRING(0 0,0 1,1 1)");
        assert!((SpatialOperations::length(&line).unwrap() - 2.0).abs() < 1e-9);
        let multi = geom("MULTILINESTRING((0 0,3 4),(0 0,0 1))");
        assert!((SpatialOperations::length(&multi).unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn length_rejects_polygons() {
        assert!(SpatialOperations::length(&geom("POLYGON((0 0,1 0,1 1,0 0))")).is_err());
    }

    #[test]
    fn centroid_of_square_is_center() {
        let square = geom("SRID=4326;POLYGON((0 0,10 0,10 10,0 10,0 0))");
        let center = SpatialOperations::centroid(&square).unwrap();
        assert!((center.x().unwrap() - 5.0).abs() < 1e-9);
        assert!((center.y().unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(center.srid(), 4326);
    }

    #[test]
    fn centroid_of_empty_fails() {
        assert!(SpatialOperations::centroid(&geom("MULTIPOINT EMPTY")).is_err());
    }

    #[test]
    fn distance_between_points() {
        let a = geom("SRID=4326;POINT(0 0)");
        let b = geom("SRID=4326;POINT(3 4)");
        assert!((SpatialOperations::distance(&a, &b).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn distance_to_polygon_boundary() {
        let point = geom("POINT(15 5)");
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!((SpatialOperations::distance(&point, &square).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn distance_of_intersecting_geometries_is_zero() {
        let a = geom("LINESTRING(0 0,10 10)");
        let b = geom("LINESTRING(0 10,10 0)");
        assert_eq!(SpatialOperations::distance(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert_eq!(SpatialOperations::distance(&square, &square).unwrap(), 0.0);
    }

    #[test]
    fn srid_mismatch_is_an_error() {
        let a = geom("SRID=4326;POINT(0 0)");
        let b = geom("SRID=3857;POINT(1 1)");
        assert!(matches!(
            SpatialOperations::distance(&a, &b),
            Err(SpatialError::SridMismatch { .. })
        ));
        // An undefined side is compatible with anything.
        let c = geom("POINT(1 1)");
        assert!(SpatialOperations::distance(&a, &c).is_ok());
    }

    #[test]
    fn intersects_self() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!(SpatialOperations::intersects(&square, &square).unwrap());
    }

    #[test]
    fn intersects_point_in_polygon() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!(SpatialOperations::intersects(&square, &geom("POINT(5 5)")).unwrap());
        assert!(!SpatialOperations::intersects(&square, &geom("POINT(50 50)")).unwrap());
    }

    #[test]
    fn contains_point_inside_polygon() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!(SpatialOperations::contains(&square, &geom("POINT(5 5)")).unwrap());
        assert!(!SpatialOperations::contains(&square, &geom("POINT(15 5)")).unwrap());
    }

    #[test]
    fn contains_respects_holes() {
        let donut = geom("POLYGON((0 0,10 0,10 10,0 10,0 0),(4 4,6 4,6 6,4 6,4 4))");
        assert!(!SpatialOperations::contains(&donut, &geom("POINT(5 5)")).unwrap());
        assert!(SpatialOperations::contains(&donut, &geom("POINT(2 2)")).unwrap());
    }

    #[test]
    fn within_mirrors_contains() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!(SpatialOperations::within(&geom("POINT(5 5)"), &square).unwrap());
        let inner = geom("POLYGON((2 2,4 2,4 4,2 4,2 2))");
        assert!(SpatialOperations::within(&inner, &square).unwrap());
    }

    #[test]
    fn unsupported_contains_pairs_are_false_not_error() {
        let point = geom("POINT(0 0)");
        let line = geom("LINESTRING(0 0,1 1)");
        assert!(!SpatialOperations::contains(&point, &line).unwrap());
        assert!(!SpatialOperations::contains(&line, &point).unwrap());
        let collection = geom("GEOMETRYCOLLECTION(POINT(1 1))");
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        assert!(!SpatialOperations::contains(&square, &collection).unwrap());
    }

    #[test]
    fn dwithin_thresholds() {
        let a = geom("POINT(0 0)");
        let b = geom("POINT(3 4)");
        assert!(SpatialOperations::dwithin(&a, &b, 6.0).unwrap());
        assert!(!SpatialOperations::dwithin(&a, &b, 4.0).unwrap());
    }

    #[test]
    fn simple_shapes_are_valid() {
        assert!(SpatialOperations::is_valid(&geom("POINT(1 2)")));
        assert!(SpatialOperations::is_valid(&geom("LINESTRING(0 0,1 1)")));
        assert!(SpatialOperations::is_valid(&geom(
            "POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,4 2,4 4,2 4,2 2))"
        )));
    }

    #[test]
    fn bowtie_ring_is_invalid() {
        assert!(!SpatialOperations::is_valid(&geom(
            "POLYGON((0 0,4 4,4 0,0 4,0 0))"
        )));
    }

    #[test]
    fn hole_outside_shell_is_invalid() {
        assert!(!SpatialOperations::is_valid(&geom(
            "POLYGON((0 0,4 0,4 4,0 4,0 0),(10 10,12 10,12 12,10 12,10 10))"
        )));
    }

    #[test]
    fn overlapping_multipolygon_members_are_invalid() {
        assert!(!SpatialOperations::is_valid(&geom(
            "MULTIPOLYGON(((0 0,4 0,4 4,0 4,0 0)),((2 2,6 2,6 6,2 6,2 2)))"
        )));
        assert!(SpatialOperations::is_valid(&geom(
            "MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)),((5 5,6 5,6 6,5 6,5 5)))"
        )));
    }

    #[test]
    fn nonfinite_coordinates_are_invalid() {
        let mut point = geom("POINT(1 2)");
        if let Shape::Point(c) = &mut point.shape {
            c.x = f64::NAN;
        }
        assert!(!SpatialOperations::is_valid(&point));
    }
}
