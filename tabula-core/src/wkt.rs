//! Well-Known Text reading and writing for [`Geometry`] values.
//!
//! The reader accepts the subset the data service emits: `POINT`,
//! `LINESTRING` and `POLYGON` with at most one hole. It is deliberately
//! lenient about coordinates, mirroring what the service's other clients do:
//!
//! - a point with a malformed coordinate reads that coordinate as `0.0`;
//! - a line string or ring silently skips pairs that are not numeric.
//!
//! Coordinates are written in their shortest round-trip form, keeping a
//! trailing `.0` on integral values so `POINT (1.0 2.0)` survives a
//! parse/write cycle unchanged.

use geo::{Coord, LineString};
use thiserror::Error;

use crate::geometry::{Geometry, Polygon};

/// Keyword introducing a point.
pub const POINT_KEYWORD: &str = "POINT";
/// Keyword introducing a line string.
pub const LINESTRING_KEYWORD: &str = "LINESTRING";
/// Keyword introducing a polygon.
pub const POLYGON_KEYWORD: &str = "POLYGON";

const PAIR_SEPARATOR: &str = ", ";
const RING_SEPARATOR: &str = "), ";

/// Errors raised by [`parse_wkt`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WktError {
    /// The text names none of the supported geometry types.
    #[error("unsupported geometry in {text:?}")]
    UnknownType {
        /// Offending input.
        text: String,
    },
    /// The text does not start with the expected keyword and parenthesis.
    #[error("expected `{keyword}` followed by `{opening}`")]
    MissingKeyword {
        /// Geometry keyword that was expected.
        keyword: &'static str,
        /// Opening delimiter that was expected after it.
        opening: &'static str,
    },
    /// A polygon carried no ring text at all.
    #[error("polygon has no boundary ring")]
    MissingBoundary,
    /// A polygon carried more than one hole.
    #[error("polygon has {holes} holes but at most one is supported")]
    TooManyRings {
        /// Number of hole rings found.
        holes: usize,
    },
}

/// Parse a WKT string into a [`Geometry`].
///
/// The geometry type is chosen by the first keyword found in the text, in the
/// order `POINT`, `LINESTRING`, `POLYGON`.
///
/// # Examples
///
/// ```
/// use tabula_core::{Geometry, wkt::parse_wkt};
///
/// let polygon = parse_wkt("POLYGON ((0 0, 0 4, 4 4, 4 0, 0 0), (1 1, 1 2, 2 2, 2 1, 1 1))")?;
/// let Geometry::Polygon(polygon) = polygon else { unreachable!() };
/// assert_eq!(polygon.boundary.0.len(), 5);
/// assert_eq!(polygon.hole.map(|hole| hole.0.len()), Some(5));
/// # Ok::<(), tabula_core::wkt::WktError>(())
/// ```
pub fn parse_wkt(text: &str) -> Result<Geometry, WktError> {
    if text.contains(POINT_KEYWORD) {
        parse_point(text).map(Geometry::Point)
    } else if text.contains(LINESTRING_KEYWORD) {
        parse_line_string(text).map(Geometry::LineString)
    } else if text.contains(POLYGON_KEYWORD) {
        parse_polygon(text).map(Geometry::Polygon)
    } else {
        Err(WktError::UnknownType {
            text: text.to_owned(),
        })
    }
}

/// Render a [`Geometry`] as WKT.
#[must_use]
pub fn to_wkt(geometry: &Geometry) -> String {
    match geometry {
        Geometry::Point(coord) => format!("{POINT_KEYWORD} ({})", format_coord(*coord)),
        Geometry::LineString(line) => format!("{LINESTRING_KEYWORD} ({})", format_ring(line)),
        Geometry::Polygon(polygon) => {
            let rings: Vec<String> = std::iter::once(&polygon.boundary)
                .chain(polygon.hole.as_ref())
                .filter(|ring| !ring.0.is_empty())
                .map(|ring| format!("({})", format_ring(ring)))
                .collect();
            format!("{POLYGON_KEYWORD} ({})", rings.join(PAIR_SEPARATOR))
        }
    }
}

fn parse_point(text: &str) -> Result<Coord<f64>, WktError> {
    let body = strip_header(text, POINT_KEYWORD, "(")?;
    let mut tokens = body
        .split(|ch: char| ch.is_whitespace() || ch == ')')
        .filter(|token| !token.is_empty());
    let x = tokens.next().and_then(parse_coordinate);
    // A malformed `x` leaves the scan position on the same token, so `y`
    // cannot be read either.
    let y = match x {
        Some(_) => tokens.next().and_then(parse_coordinate),
        None => None,
    };
    Ok(Coord {
        x: x.unwrap_or_default(),
        y: y.unwrap_or_default(),
    })
}

fn parse_line_string(text: &str) -> Result<LineString<f64>, WktError> {
    let body = strip_header(text, LINESTRING_KEYWORD, "(")?;
    let coordinates = body.split(')').next().unwrap_or_default();
    Ok(parse_ring(coordinates.trim_start()))
}

fn parse_polygon(text: &str) -> Result<Polygon, WktError> {
    let body = strip_header(text, POLYGON_KEYWORD, "((")?;
    let coordinates = body.trim_start().split("))").next().unwrap_or_default();
    if coordinates.is_empty() {
        return Err(WktError::MissingBoundary);
    }

    let mut rings = coordinates
        .split(RING_SEPARATOR)
        .map(|ring| parse_ring(&ring.replace(['(', ')'], "")));
    let boundary = rings.next().ok_or(WktError::MissingBoundary)?;
    let hole = rings.next();
    let extra = rings.count();
    if extra > 0 {
        return Err(WktError::TooManyRings { holes: extra + 1 });
    }
    Ok(Polygon::new(boundary, hole))
}

fn parse_ring(text: &str) -> LineString<f64> {
    text.split(PAIR_SEPARATOR).filter_map(parse_pair).collect()
}

/// Read `x` from the first space-separated token and `y` from the last.
fn parse_pair(pair: &str) -> Option<Coord<f64>> {
    let mut tokens = pair.split(' ');
    let first = tokens.next()?;
    let last = tokens.next_back().unwrap_or(first);
    Some(Coord {
        x: parse_coordinate(first)?,
        y: parse_coordinate(last)?,
    })
}

fn parse_coordinate(token: &str) -> Option<f64> {
    token.parse().ok()
}

/// Consume `keyword` and then `opening`, each after optional whitespace and
/// ignoring ASCII case.
fn strip_header<'a>(
    text: &'a str,
    keyword: &'static str,
    opening: &'static str,
) -> Result<&'a str, WktError> {
    strip_prefix_ignore_case(text.trim_start(), keyword)
        .and_then(|rest| strip_prefix_ignore_case(rest.trim_start(), opening))
        .ok_or(WktError::MissingKeyword { keyword, opening })
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    match text.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => text.get(prefix.len()..),
        _ => None,
    }
}

fn format_ring(ring: &LineString<f64>) -> String {
    ring.coords()
        .map(|coord| format_coord(*coord))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR)
}

fn format_coord(coord: Coord<f64>) -> String {
    format!("{:?} {:?}", coord.x, coord.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(points: &[(f64, f64)]) -> LineString<f64> {
        points.iter().copied().collect()
    }

    #[rstest]
    #[case("POINT (1.0 2.0)")]
    #[case("LINESTRING (30.0 10.0, 10.0 30.0, 40.0 40.0)")]
    #[case("POLYGON ((30.0 10.0, 40.0 40.0, 20.0 40.0, 10.0 20.0, 30.0 10.0))")]
    #[case("POLYGON ((0.0 0.0, 0.0 4.0, 4.0 4.0, 0.0 0.0), (1.0 1.0, 1.0 2.0, 2.0 2.0, 1.0 1.0))")]
    fn canonical_text_round_trips(#[case] text: &str) {
        let geometry = parse_wkt(text).expect("valid WKT");
        assert_eq!(to_wkt(&geometry), text);
    }

    #[rstest]
    fn polygon_with_hole_keeps_both_rings() {
        let geometry =
            parse_wkt("POLYGON ((0 0, 0 4, 4 4, 4 0, 0 0), (1 1, 1 2, 2 2, 2 1, 1 1))")
                .expect("valid WKT");

        let Geometry::Polygon(polygon) = geometry else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.boundary.0.len(), 5);
        assert_eq!(
            polygon.hole,
            Some(line(&[
                (1.0, 1.0),
                (1.0, 2.0),
                (2.0, 2.0),
                (2.0, 1.0),
                (1.0, 1.0)
            ]))
        );
    }

    #[rstest]
    #[case("POINT (abc 2.0)", Coord { x: 0.0, y: 0.0 })]
    #[case("POINT (1.5 oops)", Coord { x: 1.5, y: 0.0 })]
    #[case("POINT (1.5)", Coord { x: 1.5, y: 0.0 })]
    #[case("POINT ()", Coord { x: 0.0, y: 0.0 })]
    fn malformed_point_coordinates_read_as_zero(#[case] text: &str, #[case] expected: Coord<f64>) {
        assert_eq!(parse_wkt(text), Ok(Geometry::Point(expected)));
    }

    #[rstest]
    fn keyword_match_ignores_case_and_leading_space() {
        assert_eq!(
            parse_wkt("  point(3 4)"),
            Err(WktError::UnknownType {
                text: "  point(3 4)".to_owned()
            })
        );
        assert_eq!(
            parse_wkt("  Point(3 4) POINT"),
            Ok(Geometry::Point(Coord { x: 3.0, y: 4.0 }))
        );
    }

    #[rstest]
    fn line_string_skips_non_numeric_pairs() {
        let geometry = parse_wkt("LINESTRING (1 2, x y, 3 4)").expect("valid WKT");
        assert_eq!(
            geometry,
            Geometry::LineString(line(&[(1.0, 2.0), (3.0, 4.0)]))
        );
    }

    #[rstest]
    fn empty_line_string_has_no_points() {
        let geometry = parse_wkt("LINESTRING ()").expect("valid WKT");
        assert_eq!(geometry, Geometry::LineString(line(&[])));
        assert_eq!(to_wkt(&geometry), "LINESTRING ()");
    }

    #[rstest]
    #[case("MULTIPOINT ((1 2))", POINT_KEYWORD)]
    #[case("LINESTRING 1 2, 3 4", LINESTRING_KEYWORD)]
    #[case("POLYGON (0 0, 1 1)", POLYGON_KEYWORD)]
    fn missing_header_is_rejected(#[case] text: &str, #[case] keyword: &str) {
        match parse_wkt(text) {
            Err(WktError::MissingKeyword { keyword: found, .. }) => assert_eq!(found, keyword),
            other => panic!("expected MissingKeyword, got {other:?}"),
        }
    }

    #[rstest]
    fn polygon_without_rings_is_rejected() {
        assert_eq!(parse_wkt("POLYGON (())"), Err(WktError::MissingBoundary));
    }

    #[rstest]
    fn polygon_with_two_holes_is_rejected() {
        let text = "POLYGON ((0 0, 0 9, 9 9, 0 0), (1 1, 1 2, 2 2, 1 1), (5 5, 5 6, 6 6, 5 5))";
        assert_eq!(parse_wkt(text), Err(WktError::TooManyRings { holes: 2 }));
    }

    #[rstest]
    fn polygon_without_hole_omits_second_ring() {
        let polygon = Geometry::Polygon(Polygon::new(
            line(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            Some(line(&[])),
        ));
        assert_eq!(to_wkt(&polygon), "POLYGON ((0.0 0.0, 1.0 1.0, 0.0 0.0))");
    }
}
