//! Coordinate reference service: SRID registry, cached transformation
//! pipelines, and coordinate-by-coordinate reprojection.
//!
//! The service is a process-lifetime singleton. Pipelines are created
//! lazily for each (source, target) pair, cached under a mutex forever,
//! and a failed creation is never cached so the next request retries. The
//! projection math lives behind [`ProjectionBackend`] so tests can swap in
//! a fake pipeline.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::{Coord, Geometry, UNDEFINED_SRID};

/// World Geodetic System 1984, geographic degrees.
pub const WGS84_SRID: i32 = 4326;
/// Spherical Web Mercator, meters.
pub const WEB_MERCATOR_SRID: i32 = 3857;

/// WGS84 equatorial radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// A compiled coordinate transformation from one SRID to another.
pub trait CoordinatePipeline: Send + Sync {
    /// Transform a single coordinate. Z is passed through the pipeline and
    /// comes back unchanged for purely planar projections.
    fn apply_forward(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64);
}

/// Factory for pipelines plus CRS metadata. The built-in backend covers
/// WGS84, spherical Web Mercator and the northern UTM zones; a libproj
/// binding would implement the same trait.
pub trait ProjectionBackend: Send + Sync {
    fn version(&self) -> String;

    /// Human-readable CRS name for a SRID, `None` when unknown.
    fn describe(&self, srid: i32) -> Option<String>;

    fn create_pipeline(
        &self,
        source: i32,
        target: i32,
    ) -> SpatialResult<Arc<dyn CoordinatePipeline>>;
}

/// Long-lived, thread-safe registry of transformation pipelines.
pub struct CrsService {
    backend: Box<dyn ProjectionBackend>,
    pipelines: Mutex<HashMap<(i32, i32), Arc<dyn CoordinatePipeline>>>,
}

impl CrsService {
    pub fn new(backend: Box<dyn ProjectionBackend>) -> Self {
        Self {
            backend,
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide service instance backed by the built-in
    /// projections.
    pub fn global() -> &'static CrsService {
        static GLOBAL: OnceLock<CrsService> = OnceLock::new();
        GLOBAL.get_or_init(|| CrsService::new(Box::new(BuiltinProjections)))
    }

    pub fn version(&self) -> String {
        self.backend.version()
    }

    /// CRS name for a SRID, `"Unknown"` when the backend has no entry.
    pub fn crs_name(&self, srid: i32) -> String {
        self.backend
            .describe(srid)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn pipeline(&self, source: i32, target: i32) -> SpatialResult<Arc<dyn CoordinatePipeline>> {
        let mut cache = self
            .pipelines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(pipeline) = cache.get(&(source, target)) {
            return Ok(Arc::clone(pipeline));
        }
        let pipeline = self.backend.create_pipeline(source, target)?;
        debug!(source, target, "created coordinate pipeline");
        cache.insert((source, target), Arc::clone(&pipeline));
        Ok(pipeline)
    }

    /// Reproject every coordinate of `geom` into `target`. The source SRID
    /// must be defined; same-SRID requests return an unchanged copy.
    pub fn transform(&self, geom: &Geometry, target: i32) -> SpatialResult<Geometry> {
        if geom.srid() == target {
            return Ok(geom.clone());
        }
        if geom.srid() == UNDEFINED_SRID {
            return Err(SpatialError::UndefinedSourceSrid);
        }
        let pipeline = self.pipeline(geom.srid(), target)?;
        let transformed = geom.map_coords(|c| {
            let (x, y, z) = pipeline.apply_forward(c.x, c.y, c.z.unwrap_or(0.0));
            Coord::new(x, y, c.z.map(|_| z), c.m)
        });
        Ok(transformed.with_srid(target))
    }
}

// ---------------------------------------------------------------------------
// Built-in projections
// ---------------------------------------------------------------------------

/// Projections the built-in backend understands, each convertible to and
/// from geographic coordinates so any pair composes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Geographic,
    WebMercator,
    UtmNorth(u8),
}

impl Projection {
    fn for_srid(srid: i32) -> Option<Projection> {
        match srid {
            WGS84_SRID => Some(Projection::Geographic),
            WEB_MERCATOR_SRID => Some(Projection::WebMercator),
            32601..=32660 => Some(Projection::UtmNorth((srid - 32600) as u8)),
            _ => None,
        }
    }

    fn name(self) -> String {
        match self {
            Projection::Geographic => "WGS 84".to_string(),
            Projection::WebMercator => "WGS 84 / Pseudo-Mercator".to_string(),
            Projection::UtmNorth(zone) => format!("WGS 84 / UTM zone {zone}N"),
        }
    }

    fn to_geographic(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (x, y),
            Projection::WebMercator => {
                let lon = (x / EARTH_RADIUS_METERS).to_degrees();
                let lat = (2.0 * (y / EARTH_RADIUS_METERS).exp().atan() - FRAC_PI_2).to_degrees();
                (lon, lat)
            }
            Projection::UtmNorth(zone) => utm_north_to_geographic(x, y, zone),
        }
    }

    fn from_geographic(self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (lon, lat),
            Projection::WebMercator => {
                let x = EARTH_RADIUS_METERS * lon.to_radians();
                let y = EARTH_RADIUS_METERS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                (x, y)
            }
            Projection::UtmNorth(zone) => geographic_to_utm_north(lon, lat, zone),
        }
    }
}

// UTM parameters for the WGS84 ellipsoid.
const UTM_K0: f64 = 0.9996;
const UTM_E: f64 = 0.08181919084262;
const UTM_E_PRIME: f64 = 0.08209443794970;

fn utm_central_meridian(zone: u8) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

fn geographic_to_utm_north(lon: f64, lat: f64, zone: u8) -> (f64, f64) {
    let a = EARTH_RADIUS_METERS;
    let e = UTM_E;
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    let lon_origin = lon_rad - utm_central_meridian(zone);

    let n = a / (1.0 - e * e * lat_rad.sin() * lat_rad.sin()).sqrt();
    let t = lat_rad.tan();
    let c = UTM_E_PRIME * UTM_E_PRIME * lat_rad.cos() * lat_rad.cos();
    let a_coeff = lat_rad.cos() * lon_origin;

    let m = a
        * ((1.0 - e * e / 4.0 - 3.0 * e * e * e * e / 64.0) * lat_rad
            - (3.0 * e * e / 8.0 + 3.0 * e * e * e * e / 32.0) * (2.0 * lat_rad).sin()
            + (15.0 * e * e * e * e / 256.0) * (4.0 * lat_rad).sin());

    let x = UTM_K0 * n * (a_coeff + (1.0 - t * t + c) * a_coeff.powi(3) / 6.0) + 500_000.0;
    let y = UTM_K0
        * (m + n
            * t
            * (a_coeff * a_coeff / 2.0
                + (5.0 - t * t + 9.0 * c + 4.0 * c * c) * a_coeff.powi(4) / 24.0));
    (x, y)
}

fn utm_north_to_geographic(x: f64, y: f64, zone: u8) -> (f64, f64) {
    let a = EARTH_RADIUS_METERS;
    let e = UTM_E;
    let e1 = (1.0 - (1.0 - e * e).sqrt()) / (1.0 + (1.0 - e * e).sqrt());

    let x = x - 500_000.0;
    let m = y / UTM_K0;
    let mu = m / (a * (1.0 - e * e / 4.0 - 3.0 * e * e * e * e / 64.0));

    let lat_rad = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

    let lat = lat_rad.to_degrees();
    let lon = (utm_central_meridian(zone)
        + x / (UTM_K0 * a / (1.0 - e * e * lat_rad.sin() * lat_rad.sin()).sqrt())
            / lat_rad.cos())
    .to_degrees();
    (lon, lat)
}

/// Backend carrying the projection math directly; no native library.
pub struct BuiltinProjections;

impl ProjectionBackend for BuiltinProjections {
    fn version(&self) -> String {
        format!("meridian-builtin {}", env!("CARGO_PKG_VERSION"))
    }

    fn describe(&self, srid: i32) -> Option<String> {
        Projection::for_srid(srid).map(|p| p.name())
    }

    fn create_pipeline(
        &self,
        source: i32,
        target: i32,
    ) -> SpatialResult<Arc<dyn CoordinatePipeline>> {
        let unsupported = || SpatialError::UnsupportedTransformation {
            source_srid: source,
            target,
        };
        let from = Projection::for_srid(source).ok_or_else(unsupported)?;
        let to = Projection::for_srid(target).ok_or_else(unsupported)?;
        Ok(Arc::new(ProjectionPipeline { from, to }))
    }
}

struct ProjectionPipeline {
    from: Projection,
    to: Projection,
}

impl CoordinatePipeline for ProjectionPipeline {
    fn apply_forward(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let (lon, lat) = self.from.to_geographic(x, y);
        let (x, y) = self.to.from_geographic(lon, lat);
        (x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn geom(ewkt: &str) -> Geometry {
        Geometry::from_ewkt(ewkt).unwrap()
    }

    #[test]
    fn wgs84_to_web_mercator() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("SRID=4326;POINT(139.7 35.7)");
        let projected = service.transform(&point, 3857).unwrap();
        assert_eq!(projected.srid(), 3857);
        assert!((projected.x().unwrap() - 15_551_332.86).abs() < 1.0);
        assert!((projected.y().unwrap() - 4_259_419.97).abs() < 1.0);
    }

    #[test]
    fn web_mercator_round_trip() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("SRID=4326;POINT(139.7 35.7)");
        let there = service.transform(&point, 3857).unwrap();
        let back = service.transform(&there, 4326).unwrap();
        assert!((back.x().unwrap() - 139.7).abs() < 1e-6);
        assert!((back.y().unwrap() - 35.7).abs() < 1e-6);
    }

    #[test]
    fn origin_maps_to_origin() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("SRID=4326;POINT(0 0)");
        let projected = service.transform(&point, 3857).unwrap();
        assert!(projected.x().unwrap().abs() < 1e-6);
        assert!(projected.y().unwrap().abs() < 1e-6);
    }

    #[test]
    fn utm_round_trip_is_approximate() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("SRID=4326;POINT(15.5 48)");
        let there = service.transform(&point, 32633).unwrap();
        // Roughly zone 33N easting/northing for Vienna's longitude band.
        assert!((there.x().unwrap() - 537_297.0).abs() < 50.0);
        assert!((there.y().unwrap() - 5_316_421.0).abs() < 50.0);
        let back = service.transform(&there, 4326).unwrap();
        assert!((back.x().unwrap() - 15.5).abs() < 1e-3);
        assert!((back.y().unwrap() - 48.0).abs() < 5e-3);
    }

    #[test]
    fn same_srid_is_identity() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("SRID=4326;POINT(1 2)");
        let unchanged = service.transform(&point, 4326).unwrap();
        assert_eq!(unchanged, point);
    }

    #[test]
    fn undefined_source_srid_is_an_error() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("POINT(1 2)");
        assert!(matches!(
            service.transform(&point, 3857),
            Err(SpatialError::UndefinedSourceSrid)
        ));
    }

    #[test]
    fn unknown_srid_is_unsupported() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let point = geom("SRID=4326;POINT(1 2)");
        assert!(matches!(
            service.transform(&point, 999_999),
            Err(SpatialError::UnsupportedTransformation { .. })
        ));
    }

    #[test]
    fn transform_preserves_shape_and_dimension() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        let line = geom("SRID=4326;LINESTRING Z (10 10 5,20 20 6)");
        let projected = service.transform(&line, 3857).unwrap();
        assert_eq!(projected.dimension, line.dimension);
        assert_eq!(projected.geometry_type(), line.geometry_type());
        assert_eq!(projected.z_min(), Some(5.0));
    }

    #[test]
    fn crs_names() {
        let service = CrsService::new(Box::new(BuiltinProjections));
        assert_eq!(service.crs_name(4326), "WGS 84");
        assert_eq!(service.crs_name(3857), "WGS 84 / Pseudo-Mercator");
        assert_eq!(service.crs_name(32633), "WGS 84 / UTM zone 33N");
        assert_eq!(service.crs_name(12345), "Unknown");
        assert!(service.version().starts_with("meridian-builtin"));
    }

    struct CountingBackend {
        created: Arc<AtomicUsize>,
    }

    struct DoublingPipeline;

    impl CoordinatePipeline for DoublingPipeline {
        fn apply_forward(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
            (x * 2.0, y * 2.0, z)
        }
    }

    impl ProjectionBackend for CountingBackend {
        fn version(&self) -> String {
            "counting 1".to_string()
        }

        fn describe(&self, _srid: i32) -> Option<String> {
            None
        }

        fn create_pipeline(
            &self,
            _source: i32,
            _target: i32,
        ) -> SpatialResult<Arc<dyn CoordinatePipeline>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(DoublingPipeline))
        }
    }

    #[test]
    fn pipelines_are_cached_per_pair() {
        let created = Arc::new(AtomicUsize::new(0));
        let service = CrsService::new(Box::new(CountingBackend {
            created: Arc::clone(&created),
        }));
        let point = geom("SRID=1;POINT(3 4)");
        let first = service.transform(&point, 2).unwrap();
        let second = service.transform(&point, 2).unwrap();
        assert_eq!(first.x(), Some(6.0));
        assert_eq!(second, first);
        assert_eq!(created.load(Ordering::SeqCst), 1);

        // The reverse direction is its own pair.
        let reverse = service.transform(&first, 1).unwrap();
        assert_eq!(reverse.srid(), 1);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }
}
