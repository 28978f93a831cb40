//! Set-combining operations: convex hull, union, buffer and collection.
//!
//! These all reduce one or many geometry values into a single combined
//! value. Like the rest of the kernel they work in the XY plane.

use geo::algorithm::area::Area;
use geo::algorithm::bool_ops::BooleanOps;
use geo::algorithm::convex_hull::ConvexHull;

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::{Coord, Dimension, Geometry, GeometryType, Ring, Shape};
use crate::operations::{from_geo_polygon, to_geo_coord, to_geo_polygon};

/// Vertices used to approximate one full circle in buffer offsets.
pub const CIRCLE_SEGMENTS: usize = 36;

/// Wrap inputs sharing one singular variant into the matching Multi
/// geometry; anything else becomes a GeometryCollection. Inputs that
/// disagree on dimension are flattened to XY first so the result stays
/// representable.
pub fn collect(geometries: Vec<Geometry>, srid: i32) -> SpatialResult<Geometry> {
    if geometries.is_empty() {
        return Err(SpatialError::domain("collect", "empty input".to_string()));
    }
    let first_type = geometries[0].geometry_type();
    let dimension = geometries[0].dimension;
    let uniform = geometries
        .iter()
        .all(|g| g.geometry_type() == first_type && g.dimension == dimension);

    if uniform {
        let shape = match first_type {
            GeometryType::Point => Some(Shape::MultiPoint(
                geometries
                    .iter()
                    .filter_map(|g| match &g.shape {
                        Shape::Point(c) => Some(*c),
                        _ => None,
                    })
                    .collect(),
            )),
            GeometryType::LineString => Some(Shape::MultiLineString(
                geometries
                    .iter()
                    .filter_map(|g| match &g.shape {
                        Shape::LineString(coords) => Some(coords.clone()),
                        _ => None,
                    })
                    .collect(),
            )),
            GeometryType::Polygon => Some(Shape::MultiPolygon(
                geometries
                    .iter()
                    .filter_map(|g| match &g.shape {
                        Shape::Polygon(rings) => Some(rings.clone()),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        };
        if let Some(shape) = shape {
            return Ok(Geometry::new(srid, dimension, shape));
        }
    }

    let same_dimension = geometries.iter().all(|g| g.dimension == dimension);
    let children: Vec<Geometry> = if same_dimension {
        geometries
            .into_iter()
            .map(|g| g.with_srid(srid))
            .collect()
    } else {
        geometries
            .into_iter()
            .map(|g| g.force_2d().with_srid(srid))
            .collect()
    };
    let dim = children[0].dimension;
    Ok(Geometry::new(srid, dim, Shape::Collection(children)))
}

/// Planar convex hull over every coordinate of every input, as a closed
/// counter-clockwise polygon.
pub fn convex_hull(geometries: &[Geometry], srid: i32) -> SpatialResult<Geometry> {
    let mut points: Vec<geo::Point<f64>> = Vec::new();
    for geom in geometries {
        geom.for_each_coord(&mut |c| points.push(geo::Point(to_geo_coord(c))));
    }
    if points.is_empty() {
        return Err(SpatialError::domain("convex_hull", "empty input".to_string()));
    }
    let hull = geo::MultiPoint(points).convex_hull();
    Ok(Geometry::new(
        srid,
        Dimension::Xy,
        Shape::Polygon(from_geo_polygon(&ensure_ccw(hull))),
    ))
}

/// Pairwise topological union in input order. Only Polygon inputs join
/// the reduction; a single input is passed through unchanged.
pub fn union_all(geometries: &[Geometry], srid: i32) -> SpatialResult<Geometry> {
    if geometries.is_empty() {
        return Err(SpatialError::domain("union", "empty input".to_string()));
    }
    if geometries.len() == 1 {
        return Ok(geometries[0].clone().with_srid(srid));
    }

    let mut acc: Option<geo::MultiPolygon<f64>> = None;
    for geom in geometries {
        let Shape::Polygon(rings) = &geom.shape else {
            continue;
        };
        if geom.is_empty() {
            continue;
        }
        let polygon = geo::MultiPolygon(vec![to_geo_polygon(rings)]);
        acc = Some(match acc {
            Some(current) => current.union(&polygon),
            None => polygon,
        });
    }
    let merged = acc.ok_or_else(|| {
        SpatialError::domain("union", "no polygon inputs to merge".to_string())
    })?;
    Ok(multipolygon_to_geometry(merged, srid))
}

/// Planar offset by `distance` with round joins and round ends. Positive
/// distances dilate, negative distances erode areal inputs (possibly to
/// nothing). The result is always a MultiPolygon.
pub fn buffer(geom: &Geometry, distance: f64) -> SpatialResult<Geometry> {
    let srid = geom.srid();
    if distance == 0.0 {
        return Ok(Geometry::new(
            srid,
            Dimension::Xy,
            Shape::MultiPolygon(areal_body(geom)),
        ));
    }
    let result = if distance > 0.0 {
        let mut parts = Vec::new();
        dilation_parts(geom, distance, &mut parts);
        union_parts(parts)
    } else {
        let body = geo::MultiPolygon(
            areal_body(geom)
                .iter()
                .map(|rings| to_geo_polygon(rings))
                .collect(),
        );
        if body.0.is_empty() {
            geo::MultiPolygon(vec![])
        } else {
            let mut rim = Vec::new();
            boundary_stadiums(geom, -distance, &mut rim);
            body.difference(&union_parts(rim))
        }
    };
    Ok(multipolygon_to_geometry(result, srid))
}

fn multipolygon_to_geometry(mp: geo::MultiPolygon<f64>, srid: i32) -> Geometry {
    Geometry::new(
        srid,
        Dimension::Xy,
        Shape::MultiPolygon(mp.0.iter().map(from_geo_polygon).collect()),
    )
}

fn union_parts(parts: Vec<geo::Polygon<f64>>) -> geo::MultiPolygon<f64> {
    let mut acc = geo::MultiPolygon::<f64>(vec![]);
    for part in parts {
        let single = geo::MultiPolygon(vec![part]);
        acc = if acc.0.is_empty() {
            single
        } else {
            acc.union(&single)
        };
    }
    acc
}

/// The polygonal content of a geometry, used as the erosion body and the
/// zero-distance buffer.
fn areal_body(geom: &Geometry) -> Vec<Vec<Ring>> {
    match &geom.shape {
        Shape::Polygon(rings) if !rings.is_empty() => vec![rings.clone()],
        Shape::MultiPolygon(polygons) => polygons.clone(),
        Shape::Collection(children) => children.iter().flat_map(areal_body).collect(),
        _ => Vec::new(),
    }
}

fn dilation_parts(geom: &Geometry, distance: f64, out: &mut Vec<geo::Polygon<f64>>) {
    match &geom.shape {
        Shape::Point(c) => out.push(circle(to_geo_coord(c), distance)),
        Shape::MultiPoint(coords) => {
            out.extend(coords.iter().map(|c| circle(to_geo_coord(c), distance)))
        }
        Shape::LineString(coords) => segment_stadiums(coords, distance, out),
        Shape::MultiLineString(lines) => {
            for line in lines {
                segment_stadiums(line, distance, out);
            }
        }
        Shape::Polygon(rings) => {
            if !rings.is_empty() {
                out.push(to_geo_polygon(rings));
                for ring in rings {
                    segment_stadiums(ring, distance, out);
                }
            }
        }
        Shape::MultiPolygon(polygons) => {
            for rings in polygons {
                if !rings.is_empty() {
                    out.push(to_geo_polygon(rings));
                    for ring in rings {
                        segment_stadiums(ring, distance, out);
                    }
                }
            }
        }
        Shape::Collection(children) => {
            for child in children {
                dilation_parts(child, distance, out);
            }
        }
    }
}

/// Stadium polygons along every boundary segment, used for erosion rims.
fn boundary_stadiums(geom: &Geometry, radius: f64, out: &mut Vec<geo::Polygon<f64>>) {
    match &geom.shape {
        Shape::Polygon(rings) => {
            for ring in rings {
                segment_stadiums(ring, radius, out);
            }
        }
        Shape::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    segment_stadiums(ring, radius, out);
                }
            }
        }
        Shape::Collection(children) => {
            for child in children {
                boundary_stadiums(child, radius, out);
            }
        }
        _ => {}
    }
}

fn segment_stadiums(coords: &[Coord], radius: f64, out: &mut Vec<geo::Polygon<f64>>) {
    if coords.len() == 1 {
        out.push(circle(to_geo_coord(&coords[0]), radius));
        return;
    }
    for pair in coords.windows(2) {
        out.push(stadium(
            to_geo_coord(&pair[0]),
            to_geo_coord(&pair[1]),
            radius,
        ));
    }
}

/// Disc approximated by a closed ring of `CIRCLE_SEGMENTS` vertices.
fn circle(center: geo::Coord<f64>, radius: f64) -> geo::Polygon<f64> {
    let mut ring = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
    for k in 0..CIRCLE_SEGMENTS {
        let angle = std::f64::consts::TAU * (k as f64) / (CIRCLE_SEGMENTS as f64);
        ring.push(geo::Coord {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        });
    }
    ring.push(ring[0]);
    ensure_ccw(geo::Polygon::new(geo::LineString::new(ring), vec![]))
}

/// A segment dilated by `radius`: two offset sides joined by semicircular
/// caps, each cap using half of `CIRCLE_SEGMENTS`.
fn stadium(a: geo::Coord<f64>, b: geo::Coord<f64>, radius: f64) -> geo::Polygon<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return circle(a, radius);
    }
    let heading = dy.atan2(dx);
    let steps = CIRCLE_SEGMENTS / 2;
    let mut ring = Vec::with_capacity(CIRCLE_SEGMENTS + 2);
    // Cap around b, sweeping from the left normal to the right normal.
    for k in 0..=steps {
        let angle = heading + std::f64::consts::FRAC_PI_2
            - std::f64::consts::PI * (k as f64) / (steps as f64);
        ring.push(geo::Coord {
            x: b.x + radius * angle.cos(),
            y: b.y + radius * angle.sin(),
        });
    }
    // Cap around a, continuing the sweep back to the start side.
    for k in 0..=steps {
        let angle = heading - std::f64::consts::FRAC_PI_2
            - std::f64::consts::PI * (k as f64) / (steps as f64);
        ring.push(geo::Coord {
            x: a.x + radius * angle.cos(),
            y: a.y + radius * angle.sin(),
        });
    }
    ring.push(ring[0]);
    ensure_ccw(geo::Polygon::new(geo::LineString::new(ring), vec![]))
}

fn ensure_ccw(polygon: geo::Polygon<f64>) -> geo::Polygon<f64> {
    if polygon.exterior().0.is_empty() || Area::signed_area(&polygon) >= 0.0 {
        polygon
    } else {
        let mut coords: Vec<geo::Coord<f64>> = polygon.exterior().coords().copied().collect();
        coords.reverse();
        geo::Polygon::new(
            geo::LineString::new(coords),
            polygon.interiors().to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::SpatialOperations;

    fn geom(ewkt: &str) -> Geometry {
        Geometry::from_ewkt(ewkt).unwrap()
    }

    #[test]
    fn collect_points_into_multipoint() {
        let merged = collect(
            vec![
                geom("SRID=4326;POINT(0 0)"),
                geom("SRID=4326;POINT(1 0)"),
            ],
            4326,
        )
        .unwrap();
        assert_eq!(merged.geometry_type(), GeometryType::MultiPoint);
        assert_eq!(merged.to_ewkt(), "SRID=4326;MULTIPOINT((0 0),(1 0))");
    }

    #[test]
    fn collect_mixed_into_collection() {
        let merged = collect(
            vec![geom("POINT(0 0)"), geom("LINESTRING(0 0,1 1)")],
            -1,
        )
        .unwrap();
        assert_eq!(merged.geometry_type(), GeometryType::GeometryCollection);
    }

    #[test]
    fn collect_of_multis_stays_a_collection() {
        let merged = collect(
            vec![
                geom("MULTIPOINT((0 0))"),
                geom("MULTIPOINT((1 1))"),
            ],
            -1,
        )
        .unwrap();
        assert_eq!(merged.geometry_type(), GeometryType::GeometryCollection);
    }

    #[test]
    fn collect_mixed_dimensions_flattens() {
        let merged = collect(
            vec![geom("POINT(0 0)"), geom("POINT Z (1 1 1)")],
            -1,
        )
        .unwrap();
        assert_eq!(merged.geometry_type(), GeometryType::GeometryCollection);
        assert_eq!(merged.dimension, Dimension::Xy);
        // The result stays parseable as EWKT.
        assert!(Geometry::from_ewkt(&merged.to_ewkt()).is_ok());
    }

    #[test]
    fn hull_of_triangle_points() {
        let hull = convex_hull(
            &[geom("POINT(0 0)"), geom("POINT(1 0)"), geom("POINT(0 1)")],
            -1,
        )
        .unwrap();
        assert_eq!(hull.geometry_type(), GeometryType::Polygon);
        let Shape::Polygon(rings) = &hull.shape else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0].first(), rings[0].last());
        // Counter-clockwise winding means positive signed area.
        let signed = Area::signed_area(&to_geo_polygon(rings));
        assert!(signed > 0.0);
        assert!((SpatialOperations::area(&hull).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hull_uses_every_coordinate() {
        let hull = convex_hull(
            &[geom("LINESTRING(0 0,2 0)"), geom("POINT(1 3)")],
            -1,
        )
        .unwrap();
        assert!((SpatialOperations::area(&hull).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_disjoint_squares_is_multipolygon() {
        let merged = union_all(
            &[
                geom("POLYGON((0 0,1 0,1 1,0 1,0 0))"),
                geom("POLYGON((5 5,6 5,6 6,5 6,5 5))"),
            ],
            -1,
        )
        .unwrap();
        assert_eq!(merged.geometry_type(), GeometryType::MultiPolygon);
        assert!((SpatialOperations::area(&merged).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn union_of_overlapping_squares_merges() {
        let merged = union_all(
            &[
                geom("POLYGON((0 0,2 0,2 2,0 2,0 0))"),
                geom("POLYGON((1 1,3 1,3 3,1 3,1 1))"),
            ],
            -1,
        )
        .unwrap();
        // Two 4-unit squares overlapping by 1 unit.
        assert!((SpatialOperations::area(&merged).unwrap() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn union_monotonicity() {
        let a = geom("POLYGON((0 0,2 0,2 2,0 2,0 0))");
        let b = geom("POLYGON((1 1,3 1,3 3,1 3,1 1))");
        let merged = union_all(&[a.clone(), b.clone()], -1).unwrap();
        let area = SpatialOperations::area(&merged).unwrap();
        assert!(area >= SpatialOperations::area(&a).unwrap() - 1e-9);
        assert!(area >= SpatialOperations::area(&b).unwrap() - 1e-9);
    }

    #[test]
    fn union_ignores_non_polygons() {
        let merged = union_all(
            &[
                geom("POINT(9 9)"),
                geom("POLYGON((0 0,1 0,1 1,0 1,0 0))"),
                geom("LINESTRING(0 0,9 9)"),
            ],
            -1,
        )
        .unwrap();
        assert!((SpatialOperations::area(&merged).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_single_input_passes_through() {
        let point = geom("POINT(1 2)");
        let merged = union_all(std::slice::from_ref(&point), -1).unwrap();
        assert_eq!(merged, point);
    }

    #[test]
    fn buffer_of_point_approximates_disc() {
        let disc = buffer(&geom("SRID=4326;POINT(0 0)"), 2.0).unwrap();
        assert_eq!(disc.geometry_type(), GeometryType::MultiPolygon);
        assert_eq!(disc.srid(), 4326);
        // Area of the inscribed 36-gon of radius 2.
        let expected = 0.5 * (CIRCLE_SEGMENTS as f64) * (std::f64::consts::TAU / 36.0).sin() * 4.0;
        assert!((SpatialOperations::area(&disc).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn buffer_of_linestring_covers_both_sides() {
        let band = buffer(&geom("LINESTRING(0 0,10 0)"), 1.0).unwrap();
        let area = SpatialOperations::area(&band).unwrap();
        // A 10x2 band plus two half-disc caps.
        assert!(area > 20.0 && area < 20.0 + std::f64::consts::PI + 1e-6);
        assert!(SpatialOperations::contains(&band, &geom("POINT(5 0.9)")).unwrap());
        assert!(SpatialOperations::contains(&band, &geom("POINT(5 -0.9)")).unwrap());
        assert!(!SpatialOperations::contains(&band, &geom("POINT(5 1.5)")).unwrap());
    }

    #[test]
    fn positive_buffer_of_polygon_grows() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        let grown = buffer(&square, 1.0).unwrap();
        let area = SpatialOperations::area(&grown).unwrap();
        assert!(area > 100.0 + 4.0 * 10.0);
        assert!(SpatialOperations::contains(&grown, &geom("POINT(-0.5 5)")).unwrap());
    }

    #[test]
    fn negative_buffer_shrinks_polygon() {
        let square = geom("POLYGON((0 0,10 0,10 10,0 10,0 0))");
        let shrunk = buffer(&square, -1.0).unwrap();
        let area = SpatialOperations::area(&shrunk).unwrap();
        assert!((area - 64.0).abs() < 1.0);
        assert!(SpatialOperations::contains(&shrunk, &geom("POINT(5 5)")).unwrap());
        assert!(!SpatialOperations::intersects(&shrunk, &geom("POINT(0.5 5)")).unwrap());
    }

    #[test]
    fn negative_buffer_can_empty_a_polygon() {
        let small = geom("POLYGON((0 0,1 0,1 1,0 1,0 0))");
        let gone = buffer(&small, -5.0).unwrap();
        assert!(gone.is_empty());
    }

    #[test]
    fn negative_buffer_of_point_is_empty() {
        let gone = buffer(&geom("POINT(0 0)"), -1.0).unwrap();
        assert!(gone.is_empty());
    }
}
