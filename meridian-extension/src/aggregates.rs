//! Aggregate SQL functions: ST_Collect, ST_Union, ST_ConvexHull_Agg and
//! ST_Extent_Agg.
//!
//! Each aggregate owns a per-query context. Steps never raise: the first
//! problem (bad text, unparseable geometry, conflicting SRIDs) marks the
//! context failed and the error surfaces at finalize, after the host has
//! completed its aggregate protocol. Null rows are skipped, and with no
//! accumulated rows the result is null.

use meridian_spatial::{overlay, BoundingBox, Geometry, UNDEFINED_SRID};

use crate::error::{ExtensionError, ExtensionResult};
use crate::host::Aggregate;
use crate::value::SqlValue;

/// Shared row accumulator: parsed geometries, the SRID adopted from the
/// first row that has one, and the sticky failure.
struct GeometryCollector {
    function: &'static str,
    geometries: Vec<Geometry>,
    srid: i32,
    failure: Option<String>,
}

impl GeometryCollector {
    fn new(function: &'static str) -> Self {
        Self {
            function,
            geometries: Vec::new(),
            srid: UNDEFINED_SRID,
            failure: None,
        }
    }

    fn fail(&mut self, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }

    fn step(&mut self, args: &[SqlValue]) {
        if self.failure.is_some() {
            return;
        }
        let Some(value) = args.first() else {
            return;
        };
        if value.is_null() {
            return;
        }
        let SqlValue::Text(text) = value else {
            self.fail("argument must be TEXT");
            return;
        };
        let geom = match Geometry::from_ewkt(text) {
            Ok(geom) => geom,
            Err(_) => {
                self.fail("invalid geometry");
                return;
            }
        };
        if geom.srid() != UNDEFINED_SRID {
            if self.srid == UNDEFINED_SRID {
                self.srid = geom.srid();
            } else if geom.srid() != self.srid {
                self.fail("mixed SRIDs");
                return;
            }
        }
        self.geometries.push(geom);
    }

    /// Resolve the context into either the accumulated rows or the
    /// deferred failure. `None` means no rows arrived.
    fn resolve(self) -> ExtensionResult<Option<(Vec<Geometry>, i32)>> {
        if let Some(reason) = self.failure {
            return Err(ExtensionError::Aggregate {
                function: self.function,
                reason,
            });
        }
        if self.geometries.is_empty() {
            return Ok(None);
        }
        Ok(Some((self.geometries, self.srid)))
    }
}

// ---------------------------------------------------------------------------
// ST_Collect
// ---------------------------------------------------------------------------

struct CollectAggregate {
    collector: GeometryCollector,
}

impl Aggregate for CollectAggregate {
    fn step(&mut self, args: &[SqlValue]) {
        self.collector.step(args);
    }

    fn finalize(self: Box<Self>) -> ExtensionResult<SqlValue> {
        let function = self.collector.function;
        match self.collector.resolve()? {
            None => Ok(SqlValue::Null),
            Some((geometries, srid)) => {
                let merged = overlay::collect(geometries, srid)
                    .map_err(|e| ExtensionError::spatial(function, e))?;
                Ok(merged.to_ewkt().into())
            }
        }
    }
}

pub fn new_collect() -> Box<dyn Aggregate> {
    Box::new(CollectAggregate {
        collector: GeometryCollector::new("ST_Collect"),
    })
}

// ---------------------------------------------------------------------------
// ST_Union
// ---------------------------------------------------------------------------

struct UnionAggregate {
    collector: GeometryCollector,
}

impl Aggregate for UnionAggregate {
    fn step(&mut self, args: &[SqlValue]) {
        self.collector.step(args);
    }

    fn finalize(self: Box<Self>) -> ExtensionResult<SqlValue> {
        let function = self.collector.function;
        match self.collector.resolve()? {
            None => Ok(SqlValue::Null),
            Some((geometries, srid)) => {
                let merged = overlay::union_all(&geometries, srid)
                    .map_err(|e| ExtensionError::spatial(function, e))?;
                Ok(merged.to_ewkt().into())
            }
        }
    }
}

pub fn new_union() -> Box<dyn Aggregate> {
    Box::new(UnionAggregate {
        collector: GeometryCollector::new("ST_Union"),
    })
}

// ---------------------------------------------------------------------------
// ST_ConvexHull_Agg
// ---------------------------------------------------------------------------

struct ConvexHullAggregate {
    collector: GeometryCollector,
}

impl Aggregate for ConvexHullAggregate {
    fn step(&mut self, args: &[SqlValue]) {
        self.collector.step(args);
    }

    fn finalize(self: Box<Self>) -> ExtensionResult<SqlValue> {
        let function = self.collector.function;
        match self.collector.resolve()? {
            None => Ok(SqlValue::Null),
            Some((geometries, srid)) => {
                let hull = overlay::convex_hull(&geometries, srid)
                    .map_err(|e| ExtensionError::spatial(function, e))?;
                Ok(hull.to_ewkt().into())
            }
        }
    }
}

pub fn new_convex_hull() -> Box<dyn Aggregate> {
    Box::new(ConvexHullAggregate {
        collector: GeometryCollector::new("ST_ConvexHull_Agg"),
    })
}

// ---------------------------------------------------------------------------
// ST_Extent_Agg
// ---------------------------------------------------------------------------

/// Extent keeps a running box instead of the rows themselves; the result
/// carries no SRID so rows are not checked for one.
struct ExtentAggregate {
    bbox: Option<BoundingBox>,
    failure: Option<String>,
}

impl Aggregate for ExtentAggregate {
    fn step(&mut self, args: &[SqlValue]) {
        if self.failure.is_some() {
            return;
        }
        let Some(value) = args.first() else {
            return;
        };
        if value.is_null() {
            return;
        }
        let SqlValue::Text(text) = value else {
            self.failure = Some("argument must be TEXT".to_string());
            return;
        };
        let geom = match Geometry::from_ewkt(text) {
            Ok(geom) => geom,
            Err(_) => {
                self.failure = Some("invalid geometry".to_string());
                return;
            }
        };
        if let Some(row_box) = geom.bounding_box() {
            match &mut self.bbox {
                Some(total) => total.expand(&row_box),
                None => self.bbox = Some(row_box),
            }
        }
    }

    fn finalize(self: Box<Self>) -> ExtensionResult<SqlValue> {
        if let Some(reason) = self.failure {
            return Err(ExtensionError::Aggregate {
                function: "ST_Extent_Agg",
                reason,
            });
        }
        Ok(match self.bbox {
            Some(bbox) => bbox.to_box_text().into(),
            None => SqlValue::Null,
        })
    }
}

pub fn new_extent() -> Box<dyn Aggregate> {
    Box::new(ExtentAggregate {
        bbox: None,
        failure: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(factory: fn() -> Box<dyn Aggregate>, rows: &[SqlValue]) -> ExtensionResult<SqlValue> {
        let mut agg = factory();
        for row in rows {
            agg.step(std::slice::from_ref(row));
        }
        agg.finalize()
    }

    fn text(v: &str) -> SqlValue {
        SqlValue::Text(v.to_string())
    }

    #[test]
    fn collect_points() {
        let result = run(
            new_collect,
            &[text("SRID=4326;POINT(0 0)"), text("SRID=4326;POINT(1 1)")],
        )
        .unwrap();
        assert_eq!(result, text("SRID=4326;MULTIPOINT((0 0),(1 1))"));
    }

    #[test]
    fn collect_mixed_becomes_collection() {
        let result = run(
            new_collect,
            &[text("POINT(0 0)"), text("LINESTRING(0 0,1 1)")],
        )
        .unwrap();
        assert_eq!(
            result,
            text("SRID=-1;GEOMETRYCOLLECTION(POINT(0 0),LINESTRING(0 0,1 1))")
        );
    }

    #[test]
    fn empty_group_is_null() {
        assert_eq!(run(new_collect, &[]).unwrap(), SqlValue::Null);
        assert_eq!(run(new_union, &[]).unwrap(), SqlValue::Null);
        assert_eq!(run(new_extent, &[]).unwrap(), SqlValue::Null);
    }

    #[test]
    fn null_rows_are_skipped() {
        let result = run(
            new_collect,
            &[SqlValue::Null, text("POINT(2 3)"), SqlValue::Null],
        )
        .unwrap();
        assert_eq!(result, text("SRID=-1;MULTIPOINT((2 3))"));
    }

    #[test]
    fn srid_adoption_ignores_undefined_rows() {
        let result = run(
            new_collect,
            &[text("POINT(0 0)"), text("SRID=4326;POINT(1 1)")],
        )
        .unwrap();
        assert_eq!(result, text("SRID=4326;MULTIPOINT((0 0),(1 1))"));
    }

    #[test]
    fn mixed_srids_fail_at_finalize() {
        let mut agg = new_collect();
        agg.step(&[text("SRID=4326;POINT(0 0)")]);
        agg.step(&[text("SRID=3857;POINT(1 1)")]);
        // Steps keep accepting rows; the failure is sticky.
        agg.step(&[text("SRID=4326;POINT(2 2)")]);
        assert!(agg.finalize().is_err());
    }

    #[test]
    fn invalid_geometry_fails_at_finalize() {
        let mut agg = new_union();
        agg.step(&[text("POLYGON((0 0,1 0,1 1,0 1,0 0))")]);
        agg.step(&[text("POTATO")]);
        assert!(agg.finalize().is_err());
    }

    #[test]
    fn union_merges_polygons() {
        let result = run(
            new_union,
            &[
                text("SRID=4326;POLYGON((0 0,2 0,2 2,0 2,0 0))"),
                text("SRID=4326;POLYGON((1 1,3 1,3 3,1 3,1 1))"),
            ],
        )
        .unwrap();
        let SqlValue::Text(ewkt) = result else {
            panic!("expected text");
        };
        let merged = Geometry::from_ewkt(&ewkt).unwrap();
        assert_eq!(merged.srid(), 4326);
        let area = meridian_spatial::SpatialOperations::area(&merged).unwrap();
        assert!((area - 7.0).abs() < 1e-6);
    }

    #[test]
    fn extent_covers_all_rows() {
        let result = run(
            new_extent,
            &[text("POINT(0 0)"), text("POINT(3 -1)"), text("POINT(1 5)")],
        )
        .unwrap();
        assert_eq!(result, text("BOX(0 -1, 3 5)"));
    }
}
