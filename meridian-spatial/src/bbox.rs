//! Axis-aligned bounding boxes, envelopes and extents.

use serde::{Deserialize, Serialize};

use crate::geometry::{Coord, Dimension, Geometry, Shape};

/// Planar bounding box with optional vertical extent. `min_z`/`max_z` are
/// populated only for geometries that carry Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub min_z: Option<f64>,
    pub max_z: Option<f64>,
    pub srid: i32,
}

impl BoundingBox {
    fn from_coord(c: &Coord, srid: i32) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
            min_z: c.z,
            max_z: c.z,
            srid,
        }
    }

    fn include(&mut self, c: &Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
        if let Some(z) = c.z {
            self.min_z = Some(self.min_z.map_or(z, |v| v.min(z)));
            self.max_z = Some(self.max_z.map_or(z, |v| v.max(z)));
        }
    }

    /// Grow this box to cover another box.
    pub fn expand(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        match (self.min_z, other.min_z) {
            (Some(a), Some(b)) => self.min_z = Some(a.min(b)),
            (None, Some(b)) => self.min_z = Some(b),
            _ => {}
        }
        match (self.max_z, other.max_z) {
            (Some(a), Some(b)) => self.max_z = Some(a.max(b)),
            (None, Some(b)) => self.max_z = Some(b),
            _ => {}
        }
    }

    /// The extent as `BOX(x_min y_min, x_max y_max)` text.
    pub fn to_box_text(&self) -> String {
        format!(
            "BOX({} {}, {} {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }

    /// The box as a closed counter-clockwise XY polygon with the same SRID.
    pub fn to_polygon(&self) -> Geometry {
        let ring = vec![
            Coord::xy(self.min_x, self.min_y),
            Coord::xy(self.max_x, self.min_y),
            Coord::xy(self.max_x, self.max_y),
            Coord::xy(self.min_x, self.max_y),
            Coord::xy(self.min_x, self.min_y),
        ];
        Geometry::new(self.srid, Dimension::Xy, Shape::Polygon(vec![ring]))
    }
}

impl Geometry {
    /// Bounding box over every coordinate reachable from this value, or
    /// `None` when the geometry is empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        self.for_each_coord(&mut |c| match &mut bbox {
            Some(b) => b.include(c),
            None => bbox = Some(BoundingBox::from_coord(c, self.srid)),
        });
        bbox
    }

    pub fn x_min(&self) -> Option<f64> {
        self.bounding_box().map(|b| b.min_x)
    }

    pub fn x_max(&self) -> Option<f64> {
        self.bounding_box().map(|b| b.max_x)
    }

    pub fn y_min(&self) -> Option<f64> {
        self.bounding_box().map(|b| b.min_y)
    }

    pub fn y_max(&self) -> Option<f64> {
        self.bounding_box().map(|b| b.max_y)
    }

    /// Minimum Z of the bounding box; `None` for 2D or empty geometries.
    pub fn z_min(&self) -> Option<f64> {
        self.bounding_box().and_then(|b| b.min_z)
    }

    /// Maximum Z of the bounding box; `None` for 2D or empty geometries.
    pub fn z_max(&self) -> Option<f64> {
        self.bounding_box().and_then(|b| b.max_z)
    }

    /// The bounding rectangle as a closed XY polygon, `None` when empty.
    pub fn envelope(&self) -> Option<Geometry> {
        self.bounding_box().map(|b| b.to_polygon())
    }

    /// The bounding rectangle as `BOX(...)` text, `None` when empty.
    pub fn extent(&self) -> Option<String> {
        self.bounding_box().map(|b| b.to_box_text())
    }
}
