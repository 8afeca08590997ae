//! Geometry values carried by entity properties.
//!
//! Coordinates use `geo` types with `x = longitude` and `y = latitude`. The
//! service exchanges these values as Well-Known Text; see [`crate::wkt`].

use std::fmt;
use std::str::FromStr;

use geo::{Coord, LineString};

use crate::wkt::{self, WktError};

/// A point, line string or polygon stored in a geometry column.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use tabula_core::Geometry;
///
/// let point = Geometry::from_wkt("POINT (1.0 2.0)").expect("valid WKT");
/// assert_eq!(point, Geometry::Point(Coord { x: 1.0, y: 2.0 }));
/// assert_eq!(point.as_wkt(), "POINT (1.0 2.0)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Coord<f64>),
    /// An ordered sequence of positions.
    LineString(LineString<f64>),
    /// A boundary ring with at most one hole.
    Polygon(Polygon),
}

/// Polygon made of a boundary ring and an optional hole ring.
///
/// Rings are kept exactly as parsed; they are not closed automatically.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Outer ring.
    pub boundary: LineString<f64>,
    /// Inner ring cut out of the boundary, if any.
    pub hole: Option<LineString<f64>>,
}

impl Polygon {
    /// Construct a polygon from its rings.
    #[must_use]
    pub const fn new(boundary: LineString<f64>, hole: Option<LineString<f64>>) -> Self {
        Self { boundary, hole }
    }
}

impl Geometry {
    /// Name of the geometry variant as used by the service.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
        }
    }

    /// Parse Well-Known Text, discarding the reason on failure.
    ///
    /// Use [`wkt::parse_wkt`] when the failure reason matters.
    #[must_use]
    pub fn from_wkt(text: &str) -> Option<Self> {
        wkt::parse_wkt(text).ok()
    }

    /// Render the geometry as Well-Known Text.
    #[must_use]
    pub fn as_wkt(&self) -> String {
        wkt::to_wkt(self)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wkt())
    }
}

impl FromStr for Geometry {
    type Err = WktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        wkt::parse_wkt(s)
    }
}

impl From<Geometry> for geo::Geometry<f64> {
    fn from(geometry: Geometry) -> Self {
        match geometry {
            Geometry::Point(coord) => Self::Point(geo::Point::from(coord)),
            Geometry::LineString(line) => Self::LineString(line),
            Geometry::Polygon(polygon) => Self::Polygon(geo::Polygon::new(
                polygon.boundary,
                polygon.hole.into_iter().collect(),
            )),
        }
    }
}
