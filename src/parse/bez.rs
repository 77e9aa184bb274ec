//! Parser for `.bez` patch files.
//!
//! The format is whitespace separated text:
//!
//! ```text
//! 2                                   <- number of patches
//! x y z  x y z  x y z  x y z          <- row 0 of patch 0 (curve u0)
//! x y z  x y z  x y z  x y z          <- row 1
//! x y z  x y z  x y z  x y z          <- row 2
//! x y z  x y z  x y z  x y z          <- row 3
//!
//! x y z  ...                          <- row 0 of patch 1
//! ```
//!
//! Blank lines are ignored everywhere. Row `k` of a patch holds the four
//! control points of curve `u_k`; column `j` across the four rows is curve
//! `v_j`.

use std::fmt::Write as _;
use std::num::{ParseFloatError, ParseIntError};
use std::path::Path;

use thiserror::Error;

use crate::geom::{BezierPatch, ControlGrid, PatchError, PatchSet, Point3};

/// Result type for `.bez` parsing.
pub type ParseResult<T> = Result<T, ParseError>;

const FIELDS_PER_ROW: usize = 12;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing patch count header")]
    MissingHeader,
    #[error("line {line}: invalid patch count header")]
    InvalidHeader {
        line: usize,
        #[source]
        source: ParseIntError,
    },
    #[error("line {line}: invalid number")]
    InvalidNumber {
        line: usize,
        #[source]
        source: ParseFloatError,
    },
    #[error("line {line}: expected 12 coordinates, found {found}")]
    WrongFieldCount { line: usize, found: usize },
    #[error("patch {patch} ends after {rows} of 4 rows")]
    IncompletePatch { patch: usize, rows: usize },
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Parses `.bez` text into a patch set, in file order.
///
/// A header count that disagrees with the number of patches found is logged
/// and otherwise ignored.
pub fn parse_str(input: &str) -> ParseResult<PatchSet> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (header_line, header) = lines.next().ok_or(ParseError::MissingHeader)?;
    let declared: usize = header
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|source| ParseError::InvalidHeader {
            line: header_line,
            source,
        })?;

    let mut patches = Vec::new();
    let mut grid: ControlGrid = [[Point3::ORIGIN; 4]; 4];
    let mut row = 0;

    for (line, text) in lines {
        grid[row] = parse_row(line, text)?;
        row += 1;
        if row == 4 {
            patches.push(BezierPatch::try_from_control_grid(grid)?);
            row = 0;
        }
    }

    if row != 0 {
        return Err(ParseError::IncompletePatch {
            patch: patches.len(),
            rows: row,
        });
    }

    if patches.len() != declared {
        log::warn!(
            "header declares {declared} patches, found {}",
            patches.len()
        );
    }
    log::debug!("parsed {} bezier patches", patches.len());

    Ok(PatchSet::new(patches))
}

/// Reads and parses a `.bez` file.
pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<PatchSet> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text)
}

/// Writes `patches` in `.bez` layout. [`parse_str`] reads the result back
/// to the same control points.
#[must_use]
pub fn write_bez(patches: &PatchSet) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", patches.len());
    for patch in patches {
        let _ = writeln!(out);
        for points in patch.control_grid() {
            let fields: Vec<String> = points
                .iter()
                .map(|p| format!("{:?} {:?} {:?}", p.x, p.y, p.z))
                .collect();
            let _ = writeln!(out, "{}", fields.join(" "));
        }
    }
    out
}

fn parse_row(line: usize, text: &str) -> ParseResult<[Point3; 4]> {
    let values = text
        .split_whitespace()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|source| ParseError::InvalidNumber { line, source })
        })
        .collect::<ParseResult<Vec<f64>>>()?;

    if values.len() != FIELDS_PER_ROW {
        return Err(ParseError::WrongFieldCount {
            line,
            found: values.len(),
        });
    }

    Ok(std::array::from_fn(|i| {
        Point3::new(values[3 * i], values[3 * i + 1], values[3 * i + 2])
    }))
}
