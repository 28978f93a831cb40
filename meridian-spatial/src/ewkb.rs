//! EWKB binary encoding of geometry values.
//!
//! Layout: one byte-order byte (0x00 big endian, 0x01 little endian), a
//! u32 type word whose low 29 bits carry the base geometry type and whose
//! high bits flag SRID (0x20000000), M (0x40000000) and Z (0x80000000)
//! presence, an optional i32 SRID, then variant-shaped coordinates. Nested
//! members carry their own byte-order byte and type word but never a SRID
//! and never a dimension different from their parent. Emission is always
//! little endian with the SRID flag set on the top-level header only.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::{Coord, Dimension, Geometry, GeometryType, Ring, Shape, UNDEFINED_SRID};

/// SRID presence flag in the EWKB type word.
pub const EWKB_SRID_FLAG: u32 = 0x2000_0000;
/// M presence flag in the EWKB type word.
pub const EWKB_M_FLAG: u32 = 0x4000_0000;
/// Z presence flag in the EWKB type word.
pub const EWKB_Z_FLAG: u32 = 0x8000_0000;

const BASE_TYPE_MASK: u32 = 0x1FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Big,
    Little,
}

impl Geometry {
    /// Decode a geometry from EWKB bytes.
    pub fn from_ewkb(data: &[u8]) -> SpatialResult<Geometry> {
        let mut reader = Reader { buf: data };
        let header = Header::read(&mut reader)?;
        let srid = header.srid.unwrap_or(UNDEFINED_SRID);
        let shape = read_body(&mut reader, &header, srid)?;
        if reader.buf.has_remaining() {
            return Err(SpatialError::invalid("trailing bytes after EWKB geometry"));
        }
        Ok(Geometry::new(srid, header.dimension, shape))
    }

    /// Encode this geometry as EWKB, little endian, SRID always present.
    pub fn to_ewkb(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.coord_count() * 8 * self.coord_dim() + 16);
        write_geometry(&mut buf, self, true);
        buf.to_vec()
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

struct Reader<'a> {
    buf: &'a [u8],
}

impl Reader<'_> {
    fn read_u8(&mut self) -> SpatialResult<u8> {
        if self.buf.remaining() < 1 {
            return Err(truncated());
        }
        Ok(self.buf.get_u8())
    }

    fn read_u32(&mut self, order: ByteOrder) -> SpatialResult<u32> {
        if self.buf.remaining() < 4 {
            return Err(truncated());
        }
        Ok(match order {
            ByteOrder::Big => self.buf.get_u32(),
            ByteOrder::Little => self.buf.get_u32_le(),
        })
    }

    fn read_f64(&mut self, order: ByteOrder) -> SpatialResult<f64> {
        if self.buf.remaining() < 8 {
            return Err(truncated());
        }
        Ok(match order {
            ByteOrder::Big => self.buf.get_f64(),
            ByteOrder::Little => self.buf.get_f64_le(),
        })
    }
}

fn truncated() -> SpatialError {
    SpatialError::invalid("truncated EWKB buffer")
}

struct Header {
    order: ByteOrder,
    base: u32,
    dimension: Dimension,
    srid: Option<i32>,
}

impl Header {
    fn read(reader: &mut Reader<'_>) -> SpatialResult<Header> {
        let order = match reader.read_u8()? {
            0x00 => ByteOrder::Big,
            0x01 => ByteOrder::Little,
            other => {
                return Err(SpatialError::invalid(format!(
                    "invalid EWKB byte-order flag 0x{other:02x}"
                )))
            }
        };
        let type_word = reader.read_u32(order)?;
        let base = type_word & BASE_TYPE_MASK;
        if !(1..=7).contains(&base) {
            return Err(SpatialError::invalid(format!(
                "unknown EWKB geometry type {base}"
            )));
        }
        let dimension = Dimension::from_flags(
            type_word & EWKB_Z_FLAG != 0,
            type_word & EWKB_M_FLAG != 0,
        );
        let srid = if type_word & EWKB_SRID_FLAG != 0 {
            Some(reader.read_u32(order)? as i32)
        } else {
            None
        };
        Ok(Header {
            order,
            base,
            dimension,
            srid,
        })
    }

    /// Read a nested member header and check it against the enclosing
    /// geometry: same byte order, same dimension flags, no SRID of its own.
    fn read_child(
        reader: &mut Reader<'_>,
        parent: &Header,
        expected_base: Option<u32>,
    ) -> SpatialResult<Header> {
        let child = Header::read(reader)?;
        if child.order != parent.order {
            return Err(SpatialError::invalid(
                "EWKB member byte order differs from parent",
            ));
        }
        if child.dimension != parent.dimension {
            return Err(SpatialError::invalid(
                "EWKB member dimension differs from parent",
            ));
        }
        if child.srid.is_some() {
            return Err(SpatialError::invalid("EWKB member carries its own SRID"));
        }
        if let Some(expected) = expected_base {
            if child.base != expected {
                return Err(SpatialError::invalid(format!(
                    "unexpected EWKB member type {} inside type {}",
                    child.base, expected
                )));
            }
        }
        Ok(child)
    }
}

fn read_coord(reader: &mut Reader<'_>, order: ByteOrder, dim: Dimension) -> SpatialResult<Coord> {
    let x = reader.read_f64(order)?;
    let y = reader.read_f64(order)?;
    Ok(match dim {
        Dimension::Xy => Coord::xy(x, y),
        Dimension::Xyz => Coord::xyz(x, y, reader.read_f64(order)?),
        Dimension::Xym => Coord::new(x, y, None, Some(reader.read_f64(order)?)),
        Dimension::Xyzm => {
            let z = reader.read_f64(order)?;
            let m = reader.read_f64(order)?;
            Coord::new(x, y, Some(z), Some(m))
        }
    })
}

fn read_count(reader: &mut Reader<'_>, order: ByteOrder) -> SpatialResult<usize> {
    Ok(reader.read_u32(order)? as usize)
}

fn read_line(reader: &mut Reader<'_>, order: ByteOrder, dim: Dimension) -> SpatialResult<Vec<Coord>> {
    let n = read_count(reader, order)?;
    if n == 1 {
        return Err(SpatialError::invalid(
            "linestring requires at least 2 coordinates",
        ));
    }
    let mut coords = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        coords.push(read_coord(reader, order, dim)?);
    }
    Ok(coords)
}

fn read_ring(reader: &mut Reader<'_>, order: ByteOrder, dim: Dimension) -> SpatialResult<Ring> {
    let n = read_count(reader, order)?;
    if n < 4 {
        return Err(SpatialError::invalid(
            "polygon ring requires at least 4 coordinates",
        ));
    }
    let mut ring = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        ring.push(read_coord(reader, order, dim)?);
    }
    if ring.first() != ring.last() {
        return Err(SpatialError::invalid("polygon ring is not closed"));
    }
    Ok(ring)
}

fn read_polygon(
    reader: &mut Reader<'_>,
    order: ByteOrder,
    dim: Dimension,
) -> SpatialResult<Vec<Ring>> {
    let n = read_count(reader, order)?;
    let mut rings = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        rings.push(read_ring(reader, order, dim)?);
    }
    Ok(rings)
}

fn read_body(reader: &mut Reader<'_>, header: &Header, srid: i32) -> SpatialResult<Shape> {
    let order = header.order;
    let dim = header.dimension;
    Ok(match header.base {
        1 => Shape::Point(read_coord(reader, order, dim)?),
        2 => Shape::LineString(read_line(reader, order, dim)?),
        3 => Shape::Polygon(read_polygon(reader, order, dim)?),
        4 => {
            let n = read_count(reader, order)?;
            let mut coords = Vec::with_capacity(n.min(4096));
            for _ in 0..n {
                let child = Header::read_child(reader, header, Some(1))?;
                coords.push(read_coord(reader, child.order, child.dimension)?);
            }
            Shape::MultiPoint(coords)
        }
        5 => {
            let n = read_count(reader, order)?;
            let mut lines = Vec::with_capacity(n.min(4096));
            for _ in 0..n {
                let child = Header::read_child(reader, header, Some(2))?;
                lines.push(read_line(reader, child.order, child.dimension)?);
            }
            Shape::MultiLineString(lines)
        }
        6 => {
            let n = read_count(reader, order)?;
            let mut polygons = Vec::with_capacity(n.min(4096));
            for _ in 0..n {
                let child = Header::read_child(reader, header, Some(3))?;
                polygons.push(read_polygon(reader, child.order, child.dimension)?);
            }
            Shape::MultiPolygon(polygons)
        }
        7 => {
            let n = read_count(reader, order)?;
            let mut children = Vec::with_capacity(n.min(4096));
            for _ in 0..n {
                let child = Header::read_child(reader, header, None)?;
                let shape = read_body(reader, &child, srid)?;
                children.push(Geometry::new(srid, child.dimension, shape));
            }
            Shape::Collection(children)
        }
        _ => unreachable!("base type validated in Header::read"),
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn base_type(gtype: GeometryType) -> u32 {
    match gtype {
        GeometryType::Point => 1,
        GeometryType::LineString => 2,
        GeometryType::Polygon => 3,
        GeometryType::MultiPoint => 4,
        GeometryType::MultiLineString => 5,
        GeometryType::MultiPolygon => 6,
        GeometryType::GeometryCollection => 7,
        GeometryType::Unknown => 0,
    }
}

fn type_word(gtype: GeometryType, dim: Dimension, with_srid: bool) -> u32 {
    let mut word = base_type(gtype);
    if dim.has_z() {
        word |= EWKB_Z_FLAG;
    }
    if dim.has_m() {
        word |= EWKB_M_FLAG;
    }
    if with_srid {
        word |= EWKB_SRID_FLAG;
    }
    word
}

fn write_coord(buf: &mut BytesMut, c: &Coord, dim: Dimension) {
    buf.put_f64_le(c.x);
    buf.put_f64_le(c.y);
    match dim {
        Dimension::Xy => {}
        Dimension::Xyz => buf.put_f64_le(c.z.unwrap_or(0.0)),
        Dimension::Xym => buf.put_f64_le(c.m.unwrap_or(0.0)),
        Dimension::Xyzm => {
            buf.put_f64_le(c.z.unwrap_or(0.0));
            buf.put_f64_le(c.m.unwrap_or(0.0));
        }
    }
}

fn write_line(buf: &mut BytesMut, coords: &[Coord], dim: Dimension) {
    buf.put_u32_le(coords.len() as u32);
    for c in coords {
        write_coord(buf, c, dim);
    }
}

fn write_polygon(buf: &mut BytesMut, rings: &[Ring], dim: Dimension) {
    buf.put_u32_le(rings.len() as u32);
    for ring in rings {
        write_line(buf, ring, dim);
    }
}

fn write_child_header(buf: &mut BytesMut, gtype: GeometryType, dim: Dimension) {
    buf.put_u8(0x01);
    buf.put_u32_le(type_word(gtype, dim, false));
}

fn write_geometry(buf: &mut BytesMut, geom: &Geometry, top_level: bool) {
    let dim = geom.dimension;
    buf.put_u8(0x01);
    buf.put_u32_le(type_word(geom.geometry_type(), dim, top_level));
    if top_level {
        buf.put_i32_le(geom.srid);
    }
    match &geom.shape {
        Shape::Point(c) => write_coord(buf, c, dim),
        Shape::LineString(coords) => write_line(buf, coords, dim),
        Shape::Polygon(rings) => write_polygon(buf, rings, dim),
        Shape::MultiPoint(coords) => {
            buf.put_u32_le(coords.len() as u32);
            for c in coords {
                write_child_header(buf, GeometryType::Point, dim);
                write_coord(buf, c, dim);
            }
        }
        Shape::MultiLineString(lines) => {
            buf.put_u32_le(lines.len() as u32);
            for line in lines {
                write_child_header(buf, GeometryType::LineString, dim);
                write_line(buf, line, dim);
            }
        }
        Shape::MultiPolygon(polygons) => {
            buf.put_u32_le(polygons.len() as u32);
            for rings in polygons {
                write_child_header(buf, GeometryType::Polygon, dim);
                write_polygon(buf, rings, dim);
            }
        }
        Shape::Collection(children) => {
            buf.put_u32_le(children.len() as u32);
            for child in children {
                write_geometry(buf, child, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ewkt: &str) {
        let geom = Geometry::from_ewkt(ewkt).unwrap();
        let bytes = geom.to_ewkb();
        let back = Geometry::from_ewkb(&bytes).unwrap();
        assert_eq!(geom, back, "EWKB round trip failed for {ewkt}");
    }

    #[test]
    fn round_trips_every_variant() {
        round_trip("SRID=4326;POINT(139.69 35.68)");
        round_trip("SRID=-1;POINT(0 0)");
        round_trip("SRID=4326;LINESTRING(0 0,1 1,2 0)");
        round_trip("SRID=4326;POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,3 2,3 3,2 3,2 2))");
        round_trip("SRID=4326;MULTIPOINT((0 0),(1 1))");
        round_trip("SRID=4326;MULTILINESTRING((0 0,1 1),(2 2,3 3))");
        round_trip("SRID=4326;MULTIPOLYGON(((0 0,1 0,1 1,0 0)),((5 5,6 5,6 6,5 5)))");
        round_trip("SRID=4326;GEOMETRYCOLLECTION(POINT(1 2),LINESTRING(0 0,1 1))");
    }

    #[test]
    fn round_trips_every_dimension() {
        round_trip("SRID=4326;POINT Z (1 2 3)");
        round_trip("SRID=4326;POINT M (1 2 4)");
        round_trip("SRID=4326;POINT ZM (1 2 3 4)");
        round_trip("SRID=4326;LINESTRING Z (0 0 1,1 1 2)");
        round_trip("SRID=4326;MULTIPOINT Z ((0 0 1),(1 1 2))");
        round_trip("SRID=4326;POLYGON ZM ((0 0 1 2,1 0 1 2,1 1 1 2,0 0 1 2))");
    }

    #[test]
    fn point_header_layout() {
        let geom = Geometry::from_ewkt("SRID=4326;POINT(1 2)").unwrap();
        let bytes = geom.to_ewkb();
        assert_eq!(bytes.len(), 1 + 4 + 4 + 16);
        assert_eq!(bytes[0], 0x01);
        let word = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        assert_eq!(word, 1 | EWKB_SRID_FLAG);
        let srid = i32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
        assert_eq!(srid, 4326);
    }

    #[test]
    fn z_flag_is_set_for_3d() {
        let geom = Geometry::from_ewkt("SRID=0;POINT Z (1 2 3)").unwrap();
        let bytes = geom.to_ewkb();
        let word = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        assert_eq!(word & EWKB_Z_FLAG, EWKB_Z_FLAG);
        assert_eq!(word & EWKB_M_FLAG, 0);
        assert_eq!(word & BASE_TYPE_MASK, 1);
    }

    #[test]
    fn negative_srid_survives() {
        round_trip("SRID=-1;LINESTRING(0 0,5 5)");
        let geom = Geometry::from_ewkt("SRID=-1;POINT(0 0)").unwrap();
        let back = Geometry::from_ewkb(&geom.to_ewkb()).unwrap();
        assert_eq!(back.srid(), -1);
    }

    #[test]
    fn parses_big_endian_input() {
        // POINT(1 2), big endian, no SRID.
        let mut bytes = vec![0x00, 0x00, 0x00, 0x00, 0x01];
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        bytes.extend_from_slice(&2.0f64.to_be_bytes());
        let geom = Geometry::from_ewkb(&bytes).unwrap();
        assert_eq!(geom.x(), Some(1.0));
        assert_eq!(geom.y(), Some(2.0));
        assert_eq!(geom.srid(), UNDEFINED_SRID);
    }

    #[test]
    fn rejects_bad_input() {
        // Empty and truncated buffers.
        assert!(Geometry::from_ewkb(&[]).is_err());
        assert!(Geometry::from_ewkb(&[0x01, 0x01, 0x00]).is_err());

        // Unknown byte order flag.
        assert!(Geometry::from_ewkb(&[0x07, 0x01, 0x00, 0x00, 0x00]).is_err());

        // Unknown base type 99.
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        bytes.extend_from_slice(&2.0f64.to_le_bytes());
        assert!(Geometry::from_ewkb(&bytes).is_err());

        // Truncated coordinate payload.
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        assert!(Geometry::from_ewkb(&bytes).is_err());

        // Trailing garbage.
        let mut bytes = Geometry::from_ewkt("POINT(1 2)").unwrap().to_ewkb();
        bytes.push(0xFF);
        assert!(Geometry::from_ewkb(&bytes).is_err());
    }

    #[test]
    fn rejects_inconsistent_members() {
        // MULTIPOINT whose member claims a Z dimension the parent lacks.
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(0x01);
        bytes.extend_from_slice(&(1u32 | EWKB_Z_FLAG).to_le_bytes());
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        bytes.extend_from_slice(&2.0f64.to_le_bytes());
        bytes.extend_from_slice(&3.0f64.to_le_bytes());
        assert!(Geometry::from_ewkb(&bytes).is_err());

        // Member carrying its own SRID.
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(0x01);
        bytes.extend_from_slice(&(1u32 | EWKB_SRID_FLAG).to_le_bytes());
        bytes.extend_from_slice(&4326u32.to_le_bytes());
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        bytes.extend_from_slice(&2.0f64.to_le_bytes());
        assert!(Geometry::from_ewkb(&bytes).is_err());

        // Member with a different byte order than its parent.
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(0x00);
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&1.0f64.to_be_bytes());
        bytes.extend_from_slice(&2.0f64.to_be_bytes());
        assert!(Geometry::from_ewkb(&bytes).is_err());
    }

    #[test]
    fn rejects_unclosed_ring() {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        for (x, y) in [(0.0f64, 0.0f64), (1.0, 0.0), (1.0, 1.0), (0.5, 0.5)] {
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
        }
        assert!(Geometry::from_ewkb(&bytes).is_err());
    }

    #[test]
    fn ewkt_to_ewkb_to_ewkt_is_identity() {
        let samples = [
            "SRID=4326;POINT(139.69 35.68)",
            "SRID=4326;POLYGON((0 0,10 0,10 10,0 10,0 0))",
            "SRID=4326;GEOMETRYCOLLECTION Z (POINT Z (1 2 3),LINESTRING Z (0 0 0,1 1 1))",
        ];
        for sample in samples {
            let geom = Geometry::from_ewkt(sample).unwrap();
            let back = Geometry::from_ewkb(&geom.to_ewkb()).unwrap();
            assert_eq!(back.to_ewkt(), sample);
        }
    }
}
