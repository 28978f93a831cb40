//! EWKT and WKT text encoding of geometry values.
//!
//! The accepted form is an optional case-insensitive `SRID=<n>;` prefix
//! followed by a WKT body: a variant keyword, an optional dimension tag
//! (`Z`, `M`, `ZM`, also spelled `Z M`, `MZ` or `M Z`), and parenthesized
//! coordinates shaped by the variant. Emission is canonical: uppercase
//! keyword, tag set apart by single spaces, tuples separated by bare
//! commas, numbers in shortest round-trip form.

use crate::error::{SpatialError, SpatialResult};
use crate::geometry::{Coord, Dimension, Geometry, GeometryType, Ring, Shape, UNDEFINED_SRID};
use std::fmt;

impl Geometry {
    /// Parse an EWKT string (`SRID=n;...` prefix optional, absent means an
    /// undefined SRID).
    pub fn from_ewkt(input: &str) -> SpatialResult<Geometry> {
        let mut parser = Parser::new(input);
        parser.skip_ws();
        let srid = parser.srid_prefix()?;
        let geom = parser.geometry(srid.unwrap_or(UNDEFINED_SRID), None)?;
        parser.expect_end()?;
        Ok(geom)
    }

    /// Parse a plain WKT string with an explicitly supplied SRID. An
    /// embedded `SRID=` prefix is rejected here.
    pub fn from_wkt(input: &str, srid: i32) -> SpatialResult<Geometry> {
        let mut parser = Parser::new(input);
        parser.skip_ws();
        if parser.srid_prefix()?.is_some() {
            return Err(SpatialError::invalid("unexpected SRID prefix in WKT"));
        }
        let geom = parser.geometry(srid, None)?;
        parser.expect_end()?;
        Ok(geom)
    }

    /// Canonical WKT without SRID information.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }

    /// Canonical EWKT. The SRID prefix is always present, also for -1.
    pub fn to_ewkt(&self) -> String {
        format!("SRID={};{}", self.srid, self)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> SpatialResult<()> {
        self.skip_ws();
        if self.eat(expected) {
            Ok(())
        } else {
            Err(SpatialError::invalid(format!(
                "expected '{expected}' near position {}",
                self.pos
            )))
        }
    }

    fn expect_end(&mut self) -> SpatialResult<()> {
        self.skip_ws();
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(SpatialError::invalid(format!(
                "trailing input after geometry at position {}",
                self.pos
            )))
        }
    }

    /// Read a run of ASCII letters, uppercased. Empty when the next char is
    /// not a letter.
    fn word(&mut self) -> String {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let word = rest[..len].to_ascii_uppercase();
        self.pos += len;
        word
    }

    /// Consume the optional `SRID=<signed int>;` prefix. A prefix that
    /// starts but does not carry a well-formed integer is a parse error.
    fn srid_prefix(&mut self) -> SpatialResult<Option<i32>> {
        let start = self.pos;
        if self.word() != "SRID" {
            self.pos = start;
            return Ok(None);
        }
        self.skip_ws();
        if !self.eat('=') {
            self.pos = start;
            return Ok(None);
        }
        self.skip_ws();
        let srid = self.signed_int()?;
        self.skip_ws();
        if !self.eat(';') {
            return Err(SpatialError::invalid("missing ';' after SRID prefix"));
        }
        self.skip_ws();
        Ok(Some(srid))
    }

    fn signed_int(&mut self) -> SpatialResult<i32> {
        let rest = self.rest();
        let mut len = 0;
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '+' || c == '-' {
                len += 1;
            }
        }
        len += rest[len..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - len);
        let slice = &rest[..len];
        let value = slice
            .parse::<i32>()
            .map_err(|_| SpatialError::invalid(format!("malformed SRID value '{slice}'")))?;
        self.pos += len;
        Ok(value)
    }

    fn number(&mut self) -> SpatialResult<f64> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| {
                !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
            })
            .unwrap_or(rest.len());
        let slice = &rest[..len];
        if slice.is_empty() {
            return Err(SpatialError::invalid(format!(
                "expected number near position {}",
                self.pos
            )));
        }
        let value = slice
            .parse::<f64>()
            .map_err(|_| SpatialError::invalid(format!("malformed number '{slice}'")))?;
        self.pos += len;
        Ok(value)
    }

    /// Optional dimension tag after the keyword. `Z M` and `M Z` spellings
    /// collapse to ZM.
    fn dimension_tag(&mut self) -> SpatialResult<Option<Dimension>> {
        self.skip_ws();
        let start = self.pos;
        let first = self.word();
        let mut has_z;
        let mut has_m;
        match first.as_str() {
            "Z" => {
                has_z = true;
                has_m = false;
            }
            "M" => {
                has_z = false;
                has_m = true;
            }
            "ZM" | "MZ" => {
                has_z = true;
                has_m = true;
            }
            _ => {
                self.pos = start;
                return Ok(None);
            }
        }
        // A second single-letter word extends Z or M to the combined tag.
        if !has_z || !has_m {
            let before_second = self.pos;
            self.skip_ws();
            match self.word().as_str() {
                "Z" if !has_z => has_z = true,
                "M" if !has_m => has_m = true,
                _ => self.pos = before_second,
            }
        }
        Ok(Some(Dimension::from_flags(has_z, has_m)))
    }

    /// True when the next word is EMPTY; consumes it.
    fn empty_body(&mut self) -> bool {
        self.skip_ws();
        let start = self.pos;
        if self.word() == "EMPTY" {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn geometry(&mut self, srid: i32, inherited: Option<Dimension>) -> SpatialResult<Geometry> {
        self.skip_ws();
        let keyword = self.word();
        let gtype = match keyword.as_str() {
            "POINT" => GeometryType::Point,
            "LINESTRING" => GeometryType::LineString,
            "POLYGON" => GeometryType::Polygon,
            "MULTIPOINT" => GeometryType::MultiPoint,
            "MULTILINESTRING" => GeometryType::MultiLineString,
            "MULTIPOLYGON" => GeometryType::MultiPolygon,
            "GEOMETRYCOLLECTION" => GeometryType::GeometryCollection,
            other => {
                return Err(SpatialError::invalid(format!(
                    "unknown geometry keyword '{other}'"
                )))
            }
        };

        let tag = self.dimension_tag()?;
        if let (Some(tag), Some(inherited)) = (tag, inherited) {
            if tag != inherited {
                return Err(SpatialError::invalid(
                    "dimension tag differs from enclosing geometry",
                ));
            }
        }
        let declared = tag.or(inherited);

        if gtype == GeometryType::GeometryCollection {
            return self.collection(srid, declared);
        }

        let dim = declared.unwrap_or(Dimension::Xy);
        if self.empty_body() {
            let shape = match gtype {
                GeometryType::Point => {
                    return Err(SpatialError::invalid(
                        "POINT EMPTY is not representable; a point carries one tuple",
                    ))
                }
                GeometryType::LineString => Shape::LineString(vec![]),
                GeometryType::Polygon => Shape::Polygon(vec![]),
                GeometryType::MultiPoint => Shape::MultiPoint(vec![]),
                GeometryType::MultiLineString => Shape::MultiLineString(vec![]),
                GeometryType::MultiPolygon => Shape::MultiPolygon(vec![]),
                _ => unreachable!(),
            };
            return Ok(Geometry::new(srid, dim, shape));
        }

        self.expect('(')?;
        let shape = match gtype {
            GeometryType::Point => Shape::Point(self.coord(dim)?),
            GeometryType::LineString => Shape::LineString(self.line_body(dim)?),
            GeometryType::Polygon => Shape::Polygon(self.polygon_body(dim)?),
            GeometryType::MultiPoint => Shape::MultiPoint(self.multipoint_body(dim)?),
            GeometryType::MultiLineString => {
                let mut lines = Vec::new();
                loop {
                    self.expect('(')?;
                    lines.push(self.line_body(dim)?);
                    self.expect(')')?;
                    self.skip_ws();
                    if !self.eat(',') {
                        break;
                    }
                }
                Shape::MultiLineString(lines)
            }
            GeometryType::MultiPolygon => {
                let mut polygons = Vec::new();
                loop {
                    self.expect('(')?;
                    polygons.push(self.polygon_body(dim)?);
                    self.expect(')')?;
                    self.skip_ws();
                    if !self.eat(',') {
                        break;
                    }
                }
                Shape::MultiPolygon(polygons)
            }
            _ => unreachable!(),
        };
        self.expect(')')?;
        Ok(Geometry::new(srid, dim, shape))
    }

    fn collection(&mut self, srid: i32, declared: Option<Dimension>) -> SpatialResult<Geometry> {
        if self.empty_body() {
            return Ok(Geometry::new(
                srid,
                declared.unwrap_or(Dimension::Xy),
                Shape::Collection(vec![]),
            ));
        }
        self.expect('(')?;
        let mut children = Vec::new();
        loop {
            let child = self.geometry(srid, declared)?;
            children.push(child);
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
        }
        self.expect(')')?;

        let dim = declared.unwrap_or_else(|| children[0].dimension);
        if children.iter().any(|c| c.dimension != dim) {
            return Err(SpatialError::invalid(
                "collection members disagree on dimension",
            ));
        }
        Ok(Geometry::new(srid, dim, Shape::Collection(children)))
    }

    /// One coordinate tuple; the number of doubles must match the declared
    /// dimension exactly.
    fn coord(&mut self, dim: Dimension) -> SpatialResult<Coord> {
        let mut values = [0.0f64; 4];
        let mut count = 0;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => {
                    if count == 4 {
                        return Err(SpatialError::invalid("coordinate tuple has too many values"));
                    }
                    values[count] = self.number()?;
                    count += 1;
                }
                _ => break,
            }
        }
        if count != dim.coord_size() {
            return Err(SpatialError::invalid(format!(
                "coordinate tuple has {count} values, expected {}",
                dim.coord_size()
            )));
        }
        Ok(match dim {
            Dimension::Xy => Coord::xy(values[0], values[1]),
            Dimension::Xyz => Coord::xyz(values[0], values[1], values[2]),
            Dimension::Xym => Coord::new(values[0], values[1], None, Some(values[2])),
            Dimension::Xyzm => Coord::new(values[0], values[1], Some(values[2]), Some(values[3])),
        })
    }

    fn coord_sequence(&mut self, dim: Dimension) -> SpatialResult<Vec<Coord>> {
        let mut coords = Vec::new();
        loop {
            coords.push(self.coord(dim)?);
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
        }
        Ok(coords)
    }

    fn line_body(&mut self, dim: Dimension) -> SpatialResult<Vec<Coord>> {
        let coords = self.coord_sequence(dim)?;
        if coords.len() < 2 {
            return Err(SpatialError::invalid(
                "linestring requires at least 2 coordinates",
            ));
        }
        Ok(coords)
    }

    fn ring_body(&mut self, dim: Dimension) -> SpatialResult<Ring> {
        let coords = self.coord_sequence(dim)?;
        if coords.len() < 4 {
            return Err(SpatialError::invalid(
                "polygon ring requires at least 4 coordinates",
            ));
        }
        if coords.first() != coords.last() {
            return Err(SpatialError::invalid("polygon ring is not closed"));
        }
        Ok(coords)
    }

    fn polygon_body(&mut self, dim: Dimension) -> SpatialResult<Vec<Ring>> {
        let mut rings = Vec::new();
        loop {
            self.expect('(')?;
            rings.push(self.ring_body(dim)?);
            self.expect(')')?;
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
        }
        Ok(rings)
    }

    /// MultiPoint members appear either bare (`0 0, 1 1`) or parenthesized
    /// (`(0 0),(1 1)`).
    fn multipoint_body(&mut self, dim: Dimension) -> SpatialResult<Vec<Coord>> {
        let mut coords = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('(') {
                coords.push(self.coord(dim)?);
                self.expect(')')?;
            } else {
                coords.push(self.coord(dim)?);
            }
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
        }
        Ok(coords)
    }
}

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.geometry_type().wkt_keyword())?;
        if self.is_empty() {
            if let Some(tag) = self.dimension.wkt_tag() {
                write!(f, " {tag}")?;
            }
            return f.write_str(" EMPTY");
        }
        match self.dimension.wkt_tag() {
            Some(tag) => write!(f, " {tag} (")?,
            None => f.write_str("(")?,
        }
        match &self.shape {
            Shape::Point(c) => write_coord(f, c, self.dimension)?,
            Shape::LineString(coords) | Shape::MultiPoint(coords) => {
                // MultiPoint members are parenthesized individually.
                let wrap = matches!(self.shape, Shape::MultiPoint(_));
                write_coord_list(f, coords, self.dimension, wrap)?;
            }
            Shape::Polygon(rings) => write_rings(f, rings, self.dimension)?,
            Shape::MultiLineString(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("(")?;
                    write_coord_list(f, line, self.dimension, false)?;
                    f.write_str(")")?;
                }
            }
            Shape::MultiPolygon(polygons) => {
                for (i, rings) in polygons.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("(")?;
                    write_rings(f, rings, self.dimension)?;
                    f.write_str(")")?;
                }
            }
            Shape::Collection(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    fmt::Display::fmt(child, f)?;
                }
            }
        }
        f.write_str(")")
    }
}

fn write_coord(f: &mut fmt::Formatter<'_>, c: &Coord, dim: Dimension) -> fmt::Result {
    write!(f, "{} {}", c.x, c.y)?;
    match dim {
        Dimension::Xy => Ok(()),
        Dimension::Xyz => write!(f, " {}", c.z.unwrap_or(0.0)),
        Dimension::Xym => write!(f, " {}", c.m.unwrap_or(0.0)),
        Dimension::Xyzm => write!(f, " {} {}", c.z.unwrap_or(0.0), c.m.unwrap_or(0.0)),
    }
}

fn write_coord_list(
    f: &mut fmt::Formatter<'_>,
    coords: &[Coord],
    dim: Dimension,
    wrap: bool,
) -> fmt::Result {
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        if wrap {
            f.write_str("(")?;
        }
        write_coord(f, c, dim)?;
        if wrap {
            f.write_str(")")?;
        }
    }
    Ok(())
}

fn write_rings(f: &mut fmt::Formatter<'_>, rings: &[Ring], dim: Dimension) -> fmt::Result {
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        f.write_str("(")?;
        write_coord_list(f, ring, dim, false)?;
        f.write_str(")")?;
    }
    Ok(())
}
