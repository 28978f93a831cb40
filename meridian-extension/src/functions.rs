//! The scalar SQL function catalog.
//!
//! Every handler follows the same flow: validate arity, propagate nulls,
//! decode arguments (EWKT text or EWKB blobs for geometries), invoke the
//! kernel or the coordinate reference service, and encode the result back
//! into host values. Geometry results are returned as EWKT text.

use meridian_spatial::{
    overlay, CrsService, Geometry, GeometryType, SpatialError, SpatialOperations, UNDEFINED_SRID,
};

use crate::aggregates;
use crate::error::{ExtensionError, ExtensionResult};
use crate::host::FunctionEntry;
use crate::value::SqlValue;

/// The full catalog, scalars and aggregates, in registration order.
pub fn catalog() -> &'static [FunctionEntry] {
    CATALOG
}

/// Case-insensitive catalog lookup.
pub fn find(name: &str) -> Option<&'static FunctionEntry> {
    CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

static CATALOG: &[FunctionEntry] = &[
    // Constructors
    FunctionEntry::scalar("ST_GeomFromText", -1, st_geom_from_text),
    FunctionEntry::scalar("ST_GeomFromEWKT", 1, st_geom_from_ewkt),
    FunctionEntry::scalar("ST_GeomFromEWKB", 1, st_geom_from_ewkb),
    FunctionEntry::scalar("ST_MakePoint", 2, st_make_point),
    FunctionEntry::scalar("ST_MakePointZ", -1, st_make_point_z),
    FunctionEntry::scalar("ST_SetSRID", 2, st_set_srid),
    // Accessors
    FunctionEntry::scalar("ST_AsText", 1, st_as_text),
    FunctionEntry::scalar("ST_AsEWKT", 1, st_as_ewkt),
    FunctionEntry::scalar("ST_AsEWKB", 1, st_as_ewkb),
    FunctionEntry::scalar("ST_GeometryType", 1, st_geometry_type),
    FunctionEntry::scalar("ST_SRID", 1, st_srid),
    FunctionEntry::scalar("ST_X", 1, st_x),
    FunctionEntry::scalar("ST_Y", 1, st_y),
    FunctionEntry::scalar("ST_Z", 1, st_z),
    FunctionEntry::scalar("ST_M", 1, st_m),
    FunctionEntry::scalar("ST_Is3D", 1, st_is_3d),
    FunctionEntry::scalar("ST_CoordDim", 1, st_coord_dim),
    // Measures
    FunctionEntry::scalar("ST_Area", 1, st_area),
    FunctionEntry::scalar("ST_Perimeter", 1, st_perimeter),
    FunctionEntry::scalar("ST_Length", 1, st_length),
    // Bounding boxes
    FunctionEntry::scalar("ST_Envelope", 1, st_envelope),
    FunctionEntry::scalar("ST_Extent", 1, st_extent),
    FunctionEntry::scalar("ST_XMin", 1, st_xmin),
    FunctionEntry::scalar("ST_XMax", 1, st_xmax),
    FunctionEntry::scalar("ST_YMin", 1, st_ymin),
    FunctionEntry::scalar("ST_YMax", 1, st_ymax),
    FunctionEntry::scalar("ST_ZMin", 1, st_zmin),
    FunctionEntry::scalar("ST_ZMax", 1, st_zmax),
    // Relations
    FunctionEntry::scalar("ST_Distance", 2, st_distance),
    FunctionEntry::scalar("ST_Intersects", 2, st_intersects),
    FunctionEntry::scalar("ST_Contains", 2, st_contains),
    FunctionEntry::scalar("ST_Within", 2, st_within),
    FunctionEntry::scalar("ST_DWithin", 3, st_dwithin),
    // Operations
    FunctionEntry::scalar("ST_Centroid", 1, st_centroid),
    FunctionEntry::scalar("ST_Buffer", 2, st_buffer),
    FunctionEntry::scalar("ST_Force2D", 1, st_force_2d),
    FunctionEntry::scalar("ST_Force3D", -1, st_force_3d),
    // Validity
    FunctionEntry::scalar("ST_IsValid", 1, st_is_valid),
    FunctionEntry::scalar("ST_IsEmpty", 1, st_is_empty),
    // Coordinate transformation
    FunctionEntry::scalar("ST_Transform", 2, st_transform),
    FunctionEntry::scalar("PROJ_Version", 0, proj_version),
    FunctionEntry::scalar("PROJ_GetCRSInfo", 1, proj_get_crs_info),
    // Aggregates
    FunctionEntry::aggregate("ST_Collect", 1, aggregates::new_collect),
    FunctionEntry::aggregate("ST_Union", 1, aggregates::new_union),
    FunctionEntry::aggregate("ST_ConvexHull_Agg", 1, aggregates::new_convex_hull),
    FunctionEntry::aggregate("ST_Extent_Agg", 1, aggregates::new_extent),
];

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn check_arity(
    function: &'static str,
    args: &[SqlValue],
    min: usize,
    max: usize,
) -> ExtensionResult<()> {
    if args.len() < min || args.len() > max {
        return Err(ExtensionError::ArgumentCount { function });
    }
    Ok(())
}

fn parse_geometry(function: &'static str, value: &SqlValue) -> ExtensionResult<Geometry> {
    let text = value.as_text(function)?;
    Geometry::from_ewkt(text).map_err(|e| ExtensionError::spatial(function, e))
}

fn spatial(function: &'static str) -> impl Fn(SpatialError) -> ExtensionError {
    move |e| ExtensionError::spatial(function, e)
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

fn st_geom_from_text(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_GeomFromText";
    check_arity(NAME, args, 1, 2)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let wkt = args[0].as_text(NAME)?;
    let srid = if args.len() == 2 {
        args[1].as_int(NAME)? as i32
    } else {
        UNDEFINED_SRID
    };
    let geom = Geometry::from_wkt(wkt, srid).map_err(spatial(NAME))?;
    Ok(geom.to_ewkt().into())
}

fn st_geom_from_ewkt(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_GeomFromEWKT";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(geom.to_ewkt().into())
}

fn st_geom_from_ewkb(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_GeomFromEWKB";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let blob = args[0].as_blob(NAME)?;
    let geom = Geometry::from_ewkb(blob).map_err(spatial(NAME))?;
    Ok(geom.to_ewkt().into())
}

fn st_make_point(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_MakePoint";
    check_arity(NAME, args, 2, 2)?;
    if args.iter().any(SqlValue::is_null) {
        return Ok(SqlValue::Null);
    }
    let x = args[0].as_real(NAME)?;
    let y = args[1].as_real(NAME)?;
    Ok(Geometry::point(x, y, None).to_ewkt().into())
}

fn st_make_point_z(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_MakePointZ";
    check_arity(NAME, args, 3, 4)?;
    if args.iter().any(SqlValue::is_null) {
        return Ok(SqlValue::Null);
    }
    let x = args[0].as_real(NAME)?;
    let y = args[1].as_real(NAME)?;
    let z = args[2].as_real(NAME)?;
    let srid = if args.len() == 4 {
        Some(args[3].as_int(NAME)? as i32)
    } else {
        None
    };
    Ok(Geometry::point_z(x, y, z, srid).to_ewkt().into())
}

fn st_set_srid(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_SetSRID";
    check_arity(NAME, args, 2, 2)?;
    if args[0].is_null() || args[1].is_null() {
        return Ok(SqlValue::Null);
    }
    let mut geom = parse_geometry(NAME, &args[0])?;
    geom.set_srid(args[1].as_int(NAME)? as i32);
    Ok(geom.to_ewkt().into())
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

fn st_as_text(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_AsText";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.to_wkt().into())
}

fn st_as_ewkt(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_AsEWKT";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.to_ewkt().into())
}

fn st_as_ewkb(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_AsEWKB";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.to_ewkb().into())
}

fn st_geometry_type(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_GeometryType";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(geom.geometry_type().postgis_name().into())
}

fn st_srid(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_SRID";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.srid().into())
}

fn point_coordinate(
    name: &'static str,
    args: &[SqlValue],
    pick: fn(&Geometry) -> Option<f64>,
) -> ExtensionResult<SqlValue> {
    check_arity(name, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(name, &args[0])?;
    if geom.geometry_type() != GeometryType::Point {
        return Err(ExtensionError::spatial(
            name,
            SpatialError::Domain {
                operation: "coordinate access",
                detail: geom.geometry_type().postgis_name().to_string(),
            },
        ));
    }
    Ok(match pick(&geom) {
        Some(v) => v.into(),
        None => SqlValue::Null,
    })
}

fn st_x(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    point_coordinate("ST_X", args, Geometry::x)
}

fn st_y(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    point_coordinate("ST_Y", args, Geometry::y)
}

/// Z of a 3D point; null when the point has no elevation.
fn st_z(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    point_coordinate("ST_Z", args, Geometry::z)
}

/// M of a measured point; null when the point has no measure.
fn st_m(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    point_coordinate("ST_M", args, Geometry::m)
}

fn st_is_3d(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Is3D";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.is_3d().into())
}

fn st_coord_dim(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_CoordDim";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok((parse_geometry(NAME, &args[0])?.coord_dim() as i64).into())
}

// ---------------------------------------------------------------------------
// Measures
// ---------------------------------------------------------------------------

fn st_area(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Area";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(SpatialOperations::area(&geom).map_err(spatial(NAME))?.into())
}

fn st_perimeter(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Perimeter";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(SpatialOperations::perimeter(&geom)
        .map_err(spatial(NAME))?
        .into())
}

fn st_length(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Length";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(SpatialOperations::length(&geom)
        .map_err(spatial(NAME))?
        .into())
}

// ---------------------------------------------------------------------------
// Bounding boxes
// ---------------------------------------------------------------------------

fn st_envelope(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Envelope";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(match geom.envelope() {
        Some(envelope) => envelope.to_ewkt().into(),
        None => SqlValue::Null,
    })
}

fn st_extent(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Extent";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(match geom.extent() {
        Some(text) => text.into(),
        None => SqlValue::Null,
    })
}

fn bbox_side(
    name: &'static str,
    args: &[SqlValue],
    pick: fn(&Geometry) -> Option<f64>,
) -> ExtensionResult<SqlValue> {
    check_arity(name, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(name, &args[0])?;
    Ok(match pick(&geom) {
        Some(v) => v.into(),
        None => SqlValue::Null,
    })
}

fn st_xmin(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    bbox_side("ST_XMin", args, Geometry::x_min)
}

fn st_xmax(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    bbox_side("ST_XMax", args, Geometry::x_max)
}

fn st_ymin(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    bbox_side("ST_YMin", args, Geometry::y_min)
}

fn st_ymax(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    bbox_side("ST_YMax", args, Geometry::y_max)
}

fn st_zmin(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    bbox_side("ST_ZMin", args, Geometry::z_min)
}

fn st_zmax(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    bbox_side("ST_ZMax", args, Geometry::z_max)
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

fn binary_inputs(
    name: &'static str,
    args: &[SqlValue],
) -> ExtensionResult<Option<(Geometry, Geometry)>> {
    if args[0].is_null() || args[1].is_null() {
        return Ok(None);
    }
    let a = parse_geometry(name, &args[0])?;
    let b = parse_geometry(name, &args[1])?;
    Ok(Some((a, b)))
}

fn st_distance(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Distance";
    check_arity(NAME, args, 2, 2)?;
    let Some((a, b)) = binary_inputs(NAME, args)? else {
        return Ok(SqlValue::Null);
    };
    Ok(SpatialOperations::distance(&a, &b)
        .map_err(spatial(NAME))?
        .into())
}

fn st_intersects(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Intersects";
    check_arity(NAME, args, 2, 2)?;
    let Some((a, b)) = binary_inputs(NAME, args)? else {
        return Ok(SqlValue::Null);
    };
    Ok(SpatialOperations::intersects(&a, &b)
        .map_err(spatial(NAME))?
        .into())
}

fn st_contains(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Contains";
    check_arity(NAME, args, 2, 2)?;
    let Some((a, b)) = binary_inputs(NAME, args)? else {
        return Ok(SqlValue::Null);
    };
    Ok(SpatialOperations::contains(&a, &b)
        .map_err(spatial(NAME))?
        .into())
}

fn st_within(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Within";
    check_arity(NAME, args, 2, 2)?;
    let Some((a, b)) = binary_inputs(NAME, args)? else {
        return Ok(SqlValue::Null);
    };
    Ok(SpatialOperations::within(&a, &b)
        .map_err(spatial(NAME))?
        .into())
}

fn st_dwithin(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_DWithin";
    check_arity(NAME, args, 3, 3)?;
    if args[2].is_null() {
        return Ok(SqlValue::Null);
    }
    let Some((a, b)) = binary_inputs(NAME, args)? else {
        return Ok(SqlValue::Null);
    };
    let threshold = args[2].as_real(NAME)?;
    Ok(SpatialOperations::dwithin(&a, &b, threshold)
        .map_err(spatial(NAME))?
        .into())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn st_centroid(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Centroid";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    Ok(SpatialOperations::centroid(&geom)
        .map_err(spatial(NAME))?
        .to_ewkt()
        .into())
}

fn st_buffer(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Buffer";
    check_arity(NAME, args, 2, 2)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    let distance = args[1].as_real(NAME)?;
    Ok(overlay::buffer(&geom, distance)
        .map_err(spatial(NAME))?
        .to_ewkt()
        .into())
}

fn st_force_2d(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Force2D";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.force_2d().to_ewkt().into())
}

fn st_force_3d(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Force3D";
    check_arity(NAME, args, 1, 2)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let z_default = if args.len() == 2 {
        args[1].as_real(NAME)?
    } else {
        0.0
    };
    Ok(parse_geometry(NAME, &args[0])?
        .force_3d(z_default)
        .to_ewkt()
        .into())
}

// ---------------------------------------------------------------------------
// Validity
// ---------------------------------------------------------------------------

fn st_is_valid(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_IsValid";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let text = args[0].as_text(NAME)?;
    // Unparseable text is invalid, not an error: validity is defined over
    // arbitrary strings.
    Ok(match Geometry::from_ewkt(text) {
        Ok(geom) => SpatialOperations::is_valid(&geom).into(),
        Err(_) => false.into(),
    })
}

fn st_is_empty(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_IsEmpty";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    Ok(parse_geometry(NAME, &args[0])?.is_empty().into())
}

// ---------------------------------------------------------------------------
// Coordinate transformation
// ---------------------------------------------------------------------------

fn st_transform(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "ST_Transform";
    check_arity(NAME, args, 2, 2)?;
    if args[0].is_null() || args[1].is_null() {
        return Ok(SqlValue::Null);
    }
    let geom = parse_geometry(NAME, &args[0])?;
    let target = args[1].as_int(NAME)? as i32;
    Ok(CrsService::global()
        .transform(&geom, target)
        .map_err(spatial(NAME))?
        .to_ewkt()
        .into())
}

fn proj_version(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "PROJ_Version";
    check_arity(NAME, args, 0, 0)?;
    Ok(CrsService::global().version().into())
}

fn proj_get_crs_info(args: &[SqlValue]) -> ExtensionResult<SqlValue> {
    const NAME: &str = "PROJ_GetCRSInfo";
    check_arity(NAME, args, 1, 1)?;
    if args[0].is_null() {
        return Ok(SqlValue::Null);
    }
    let srid = args[0].as_int(NAME)? as i32;
    Ok(CrsService::global().crs_name(srid).into())
}
