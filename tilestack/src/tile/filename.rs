//! Tile filename parsing and formatting.
//!
//! Tiles are stored as `<x>x<y>.jpg` inside their zoom level directory:
//! `-3x12.jpg`, `0x0.jpg`, `117x-4.jpg`. Both coordinates are decimal
//! integers and may carry a leading `-`; the separator is a literal `x`.
//! This naming is the read and write contract of the tile tree: the area
//! scanner parses it back into coordinates, and the store produces it when
//! writing composites.

use regex::Regex;
use std::sync::OnceLock;

use crate::coord::TileCoord;

/// Error parsing a tile filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Filename doesn't match the `<x>x<y>.jpg` pattern.
    InvalidPattern,
    /// X coordinate is out of range.
    InvalidX(String),
    /// Y coordinate is out of range.
    InvalidY(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidPattern => write!(f, "Filename doesn't match tile pattern"),
            ParseError::InvalidX(s) => write!(f, "Invalid x coordinate: {}", s),
            ParseError::InvalidY(s) => write!(f, "Invalid y coordinate: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Get the tile filename regex.
///
/// Pattern: `<x>x<y>.jpg` where both coordinates are signed decimal
/// integers. Anchored on both ends so names like `old-3x12.jpg` or
/// `3x12.jpg.bak` are rejected rather than partially matched.
fn tile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(-?\d+)x(-?\d+)\.jpg$").unwrap())
}

/// Parse a tile filename into its grid coordinate.
///
/// # Examples
///
/// ```
/// use tilestack::tile::parse_tile_filename;
///
/// let coord = parse_tile_filename("-3x12.jpg").unwrap();
/// assert_eq!(coord.x, -3);
/// assert_eq!(coord.y, 12);
/// ```
pub fn parse_tile_filename(filename: &str) -> Result<TileCoord, ParseError> {
    let captures = tile_pattern()
        .captures(filename)
        .ok_or(ParseError::InvalidPattern)?;

    let x_str = captures.get(1).unwrap().as_str();
    let x = x_str
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidX(x_str.to_string()))?;

    let y_str = captures.get(2).unwrap().as_str();
    let y = y_str
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidY(y_str.to_string()))?;

    Ok(TileCoord::new(x, y))
}

/// Format a coordinate as its on-disk tile filename.
pub fn tile_filename(coord: TileCoord) -> String {
    format!("{}x{}.jpg", coord.x, coord.y)
}
