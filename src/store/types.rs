//! Types for talking to the remote grid store.
//!
//! Shapes follow the Sheets v4 `ValueRange` resource so the HTTP backend can
//! serialize them directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows of cells. Rows may be ragged and trailing cells may be absent.
pub type Grid = Vec<Vec<String>>;

/// Whether the outer sequence of a grid holds rows or columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MajorDimension {
    #[default]
    Rows,
    Columns,
}

impl MajorDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rows => "ROWS",
            Self::Columns => "COLUMNS",
        }
    }
}

/// A rectangular region of the store
///
/// Both parts are opaque keys; nothing in this crate parses the range grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeAddress {
    /// Spreadsheet id
    pub document: String,

    /// A1-style range such as `source!A:A`
    pub range: String,
}

impl RangeAddress {
    pub fn new(document: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            range: range.into(),
        }
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' in {}", self.range, self.document)
    }
}

/// Values read from or written to a range
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    #[serde(default)]
    pub major_dimension: MajorDimension,

    /// Omitted by the API when the range is empty
    #[serde(default)]
    pub values: Grid,
}

impl ValueRange {
    pub fn new(values: Grid, major_dimension: MajorDimension) -> Self {
        Self {
            range: None,
            major_dimension,
            values,
        }
    }

    /// Values arranged as rows regardless of the declared dimension
    pub fn into_rows(self) -> Grid {
        match self.major_dimension {
            MajorDimension::Rows => self.values,
            MajorDimension::Columns => transpose(&self.values),
        }
    }
}

/// Flip a grid between row-major and column-major
///
/// Gaps left by ragged input are filled with empty cells.
pub fn transpose(grid: &Grid) -> Grid {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    (0..width)
        .map(|i| {
            grid.iter()
                .map(|line| line.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}
