use serde::{Deserialize, Serialize};
use std::fmt;

/// A single decoded cell value. Decoders produce text for anything they
/// cannot prove is numeric; nothing downstream re-inspects the source format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Lossless textual form. Integral numbers render without a trailing `.0`
    /// so `45000.0` and `"45000"` agree.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Canonical two-dimensional grid of cell values, produced fresh by each
/// decode. Row 0 is a header only by convention until the caller confirms it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    rows: Vec<Vec<Cell>>,
    /// Advisory (row, column) coordinates of right-to-left text spans.
    /// Content is never altered; preview layers may use this for rendering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    rtl_cells: Vec<(usize, usize)>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        RawTable {
            rows,
            rtl_cells: Vec::new(),
        }
    }

    pub fn with_rtl_cells(rows: Vec<Vec<Cell>>, rtl_cells: Vec<(usize, usize)>) -> Self {
        RawTable { rows, rtl_cells }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the table, taken from row 0.
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.row(0)
    }

    /// Cells of one column, starting at `from_row`. Ragged rows shorter than
    /// `column` are skipped.
    pub fn column_values(&self, column: usize, from_row: usize) -> impl Iterator<Item = &Cell> {
        self.rows
            .iter()
            .skip(from_row)
            .filter_map(move |row| row.get(column))
    }

    pub fn rtl_cells(&self) -> &[(usize, usize)] {
        &self.rtl_cells
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
